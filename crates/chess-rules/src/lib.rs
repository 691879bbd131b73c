//! Deterministic chess rules engine.
//!
//! The engine is pure: no clocks, no randomness, no I/O. [`GameState`] holds
//! one game and exposes a single mutating operation,
//! [`GameState::apply_move`], which validates, classifies, and applies a move
//! and recomputes the status and the legal-move set for the next player.
//! [`ClientView`] projects the state for transmission to clients.
//!
//! The building blocks are exposed for direct use:
//! - [`Board`] with its 64-symbol serialization and the move mutator
//! - [`attackers_of`] for attack detection
//! - [`legal_moves`] for move generation
//! - [`DrawTracker`] for the fifty-move, repetition, and material rules

mod attacks;
mod board;
mod draw;
mod error;
mod movegen;
mod state;
mod view;

pub use attacks::{attackers_of, is_attacked};
pub use board::{Board, MoveKind, PlayedMove, EMPTY_SYMBOL};
pub use draw::{insufficient_material, DrawTracker, FIFTY_MOVE_LIMIT};
pub use error::RulesError;
pub use movegen::{legal_moves, CastlingTracker};
pub use state::{GameState, GameStatus};
pub use view::{ClientView, MoveSet};
