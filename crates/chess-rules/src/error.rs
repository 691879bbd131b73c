//! Error types for the rules engine.

use thiserror::Error;

/// Errors returned by the rules engine.
///
/// [`RulesError::InvalidMove`] rejects a single move and leaves the game
/// state untouched. The other variants indicate a corrupted board string and
/// are fatal to the call that observed them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RulesError {
    /// The submitted move cannot be played in the current state.
    #[error("invalid move: {0}")]
    InvalidMove(&'static str),
    /// A serialized board contained a symbol outside the recognized piece set.
    #[error("unknown piece symbol: {0:?}")]
    UnknownPieceSymbol(char),
    /// A serialized board did not contain exactly 64 symbols.
    #[error("malformed board: expected 64 symbols, got {0}")]
    MalformedBoard(usize),
}
