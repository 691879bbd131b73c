//! Wire representation of a requested move.

use crate::{Piece, Square};
use serde::{Deserialize, Serialize};

/// A move as submitted by a client: origin, destination, and an optional
/// promotion piece.
///
/// The promotion field is only meaningful when a pawn reaches its far rank;
/// the rules engine validates it and rejects promotions to pawns or kings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveSpec {
    pub from: Square,
    pub to: Square,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<Piece>,
}

impl MoveSpec {
    /// Creates a plain move with no promotion.
    pub const fn new(from: Square, to: Square) -> MoveSpec {
        MoveSpec {
            from,
            to,
            promotion: None,
        }
    }

    /// Creates a move that promotes to the given piece.
    pub const fn promoting(from: Square, to: Square, piece: Piece) -> MoveSpec {
        MoveSpec {
            from,
            to,
            promotion: Some(piece),
        }
    }
}

impl std::fmt::Display for MoveSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(piece) = self.promotion {
            write!(f, "{}", piece.symbol(crate::Color::Black))?;
        }
        Ok(())
    }
}
