//! Core types for chess.
//!
//! This crate provides the fundamental types shared by the rules engine and
//! the game server:
//! - [`Piece`] and [`Color`] for piece representation
//! - [`Square`] for board coordinates
//! - [`MoveSpec`] for moves as submitted over the wire

mod color;
mod mov;
mod piece;
mod square;

pub use color::Color;
pub use mov::MoveSpec;
pub use piece::Piece;
pub use square::Square;
