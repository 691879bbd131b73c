//! Draw tracking: the fifty-move counter, repetition buckets, and
//! insufficient material.

use crate::Board;
use chess_core::{Color, Piece, Square};
use std::collections::HashSet;

/// Number of half-moves without a pawn move or capture that forces a draw.
pub const FIFTY_MOVE_LIMIT: u32 = 50;

/// Tracks the forced-draw conditions that depend on game history.
///
/// Repetition is keyed on the serialized board and bucketed by how often a
/// configuration has been seen. Whenever the fifty-move counter resets the
/// buckets restart from the current position, since a pawn move or capture
/// makes earlier configurations unreachable.
#[derive(Debug, Clone)]
pub struct DrawTracker {
    fifty_counter: u32,
    seen_once: HashSet<String>,
    seen_twice: HashSet<String>,
    threefold: bool,
}

impl DrawTracker {
    /// Starts tracking from the given position.
    pub fn new(board: &Board) -> DrawTracker {
        let mut seen_once = HashSet::new();
        seen_once.insert(board.serialize());
        DrawTracker {
            fifty_counter: 0,
            seen_once,
            seen_twice: HashSet::new(),
            threefold: false,
        }
    }

    /// Updates the fifty-move counter. Called before the board mutates;
    /// `destination_occupied` refers to the pre-move board.
    pub fn update_fifty(&mut self, moved: Piece, destination_occupied: bool) {
        if moved == Piece::Pawn || destination_occupied {
            self.fifty_counter = 0;
        } else {
            self.fifty_counter += 1;
        }
    }

    /// Updates the repetition buckets with the post-move board. Called after
    /// [`DrawTracker::update_fifty`] so a reset restarts the buckets.
    pub fn update_repetition(&mut self, board: &Board) {
        let key = board.serialize();
        if self.fifty_counter == 0 {
            self.seen_once.clear();
            self.seen_twice.clear();
            self.seen_once.insert(key);
            return;
        }
        if self.seen_once.remove(&key) {
            self.seen_twice.insert(key);
        } else if self.seen_twice.remove(&key) {
            self.seen_once.clear();
            self.seen_twice.clear();
            self.threefold = true;
        } else {
            self.seen_once.insert(key);
        }
    }

    /// Reports whether the position is a forced draw.
    pub fn forced_draw(&self, board: &Board) -> bool {
        self.fifty_counter >= FIFTY_MOVE_LIMIT || self.threefold || insufficient_material(board)
    }

    #[cfg(test)]
    pub(crate) fn fifty_counter(&self) -> u32 {
        self.fifty_counter
    }
}

/// Checks for draw by insufficient material.
///
/// A draw when only kings, knights, and at most one bishop per side remain,
/// with fewer than four such pieces in total, or exactly four where both
/// bishops stand on same-colored squares. Any pawn, rook, queen, or extra
/// minor piece rules the draw out.
pub fn insufficient_material(board: &Board) -> bool {
    let mut bishops: [Option<Square>; 2] = [None, None];
    let mut counts: [u32; 2] = [0, 0];

    for sq in Square::all() {
        let Some((piece, color)) = board.get(sq) else {
            continue;
        };
        match piece {
            Piece::Bishop if bishops[color.index()].is_none() => {
                bishops[color.index()] = Some(sq);
                counts[color.index()] += 1;
            }
            Piece::King | Piece::Knight => {
                counts[color.index()] += 1;
            }
            _ => return false,
        }
        if counts[Color::White.index()] > 2 || counts[Color::Black.index()] > 2 {
            return false;
        }
    }

    if counts[0] + counts[1] < 4 {
        return true;
    }

    // four pieces left: a draw only with both bishops on same-colored squares
    match (bishops[0], bishops[1]) {
        (Some(white), Some(black)) => {
            (white.file() + white.rank()) % 2 == (black.file() + black.rank()) % 2
        }
        _ => false,
    }
}
