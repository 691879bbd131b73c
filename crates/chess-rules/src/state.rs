//! Game state orchestration.
//!
//! [`GameState`] owns the board and every auxiliary tracker, and exposes the
//! single mutating operation [`GameState::apply_move`]. A move is validated
//! and classified before anything mutates, so a rejected move leaves the
//! state untouched.

use crate::attacks::attackers_of;
use crate::board::{Board, MoveKind, PlayedMove};
use crate::draw::DrawTracker;
use crate::movegen::{legal_moves, CastlingTracker};
use crate::RulesError;
use chess_core::{Color, MoveSpec, Piece, Square};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Status of the game after the latest move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Normal,
    Check,
    Checkmate,
    Draw,
}

impl GameStatus {
    /// Returns true once no further moves can be played.
    pub fn is_over(self) -> bool {
        matches!(self, GameStatus::Checkmate | GameStatus::Draw)
    }
}

/// Complete state of one game.
#[derive(Debug, Clone)]
pub struct GameState {
    board: Board,
    to_move: Color,
    status: GameStatus,
    legal: BTreeMap<Square, Vec<Square>>,
    checkers: Vec<Square>,
    draw: DrawTracker,
    castling: CastlingTracker,
    /// Destination of the latest two-square pawn advance, if any.
    double_step: Option<Square>,
}

impl GameState {
    /// Creates a game in the standard starting position with the first
    /// legal-move set already computed.
    pub fn new() -> GameState {
        Self::from_parts(Board::start(), Color::White, CastlingTracker::standard())
    }

    /// Creates a game from an arbitrary position. Castling eligibility is
    /// inferred from piece placement.
    pub fn with_board(board: Board, to_move: Color) -> GameState {
        let castling = CastlingTracker::from_board(&board);
        Self::from_parts(board, to_move, castling)
    }

    fn from_parts(board: Board, to_move: Color, castling: CastlingTracker) -> GameState {
        let checkers = match board.king_square(to_move) {
            Some(king) => attackers_of(&board, king, to_move.opposite()),
            None => Vec::new(),
        };
        let draw = DrawTracker::new(&board);
        let (status, legal) = if draw.forced_draw(&board) {
            (GameStatus::Draw, BTreeMap::new())
        } else {
            let legal = legal_moves(&board, to_move, &checkers, None, &castling);
            let mut status = if checkers.is_empty() {
                GameStatus::Normal
            } else {
                GameStatus::Check
            };
            if legal.is_empty() {
                status = if status == GameStatus::Check {
                    GameStatus::Checkmate
                } else {
                    GameStatus::Draw
                };
            }
            (status, legal)
        };
        GameState {
            board,
            to_move,
            status,
            legal,
            checkers,
            draw,
            castling,
            double_step: None,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn to_move(&self) -> Color {
        self.to_move
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Legal moves for the color on move, keyed by origin square.
    pub fn legal_moves(&self) -> &BTreeMap<Square, Vec<Square>> {
        &self.legal
    }

    /// Squares of the pieces giving check, if any.
    pub fn checkers(&self) -> &[Square] {
        &self.checkers
    }

    /// The square of the checked king while the status is check or checkmate.
    pub fn checked_king(&self) -> Option<Square> {
        match self.status {
            GameStatus::Check | GameStatus::Checkmate => self.board.king_square(self.to_move),
            _ => None,
        }
    }

    /// Applies a move and recomputes status and legal moves.
    ///
    /// All validation happens before any mutation, so an `Err` leaves the
    /// state exactly as it was.
    pub fn apply_move(&mut self, mv: &MoveSpec) -> Result<(), RulesError> {
        let (piece, played) = self.classify(mv)?;
        let destination_occupied = self.board.get(played.to).is_some();

        self.draw.update_fifty(piece, destination_occupied);
        self.board.apply(&played);
        self.draw.update_repetition(&self.board);
        self.castling.record(&self.board, &played);
        self.double_step = (piece == Piece::Pawn
            && (played.to.rank() as i8 - played.from.rank() as i8).abs() == 2)
            .then_some(played.to);
        self.to_move = self.to_move.opposite();

        self.checkers = match self.board.king_square(self.to_move) {
            Some(king) => attackers_of(&self.board, king, self.to_move.opposite()),
            None => Vec::new(),
        };

        if self.draw.forced_draw(&self.board) {
            self.status = GameStatus::Draw;
            self.legal.clear();
            return Ok(());
        }

        self.status = if self.checkers.is_empty() {
            GameStatus::Normal
        } else {
            GameStatus::Check
        };
        self.legal = legal_moves(
            &self.board,
            self.to_move,
            &self.checkers,
            self.double_step,
            &self.castling,
        );
        if self.legal.is_empty() {
            self.status = if self.status == GameStatus::Check {
                GameStatus::Checkmate
            } else {
                GameStatus::Draw
            };
        }
        Ok(())
    }

    /// Validates a move against the current state and decides its kind.
    fn classify(&self, mv: &MoveSpec) -> Result<(Piece, PlayedMove), RulesError> {
        if self.status.is_over() {
            return Err(RulesError::InvalidMove("game has already ended"));
        }
        let Some((piece, color)) = self.board.get(mv.from) else {
            return Err(RulesError::InvalidMove("no piece on the origin square"));
        };
        if color != self.to_move {
            return Err(RulesError::InvalidMove("piece belongs to the opponent"));
        }
        if !self
            .legal
            .get(&mv.from)
            .is_some_and(|dests| dests.contains(&mv.to))
        {
            return Err(RulesError::InvalidMove("move is not legal in this position"));
        }

        let file_delta = (mv.to.file() as i8 - mv.from.file() as i8).abs();
        let rank_delta = (mv.to.rank() as i8 - mv.from.rank() as i8).abs();
        let enemy_pawn = Some((Piece::Pawn, color.opposite()));

        let kind = if piece == Piece::King && file_delta > 1 {
            MoveKind::Castling
        } else if piece == Piece::Pawn
            && file_delta == 1
            && rank_delta == 1
            && self.board.get(mv.to).is_none()
            && self
                .double_step
                .is_some_and(|d| self.board.get(d) == enemy_pawn)
            && self.board.get(Square::new(mv.to.file(), mv.from.rank())) == enemy_pawn
        {
            MoveKind::EnPassant
        } else if piece == Piece::Pawn && mv.to.rank() == color.promotion_rank() {
            match mv.promotion {
                Some(Piece::Pawn) | Some(Piece::King) => {
                    return Err(RulesError::InvalidMove("cannot promote to that piece"))
                }
                Some(replacement) => MoveKind::Promotion(replacement),
                None => {
                    return Err(RulesError::InvalidMove(
                        "promotion requires a replacement piece",
                    ))
                }
            }
        } else {
            MoveKind::Normal
        };

        if !matches!(kind, MoveKind::Promotion(_)) && mv.promotion.is_some() {
            return Err(RulesError::InvalidMove(
                "promotion piece supplied for a non-promoting move",
            ));
        }

        Ok((
            piece,
            PlayedMove {
                from: mv.from,
                to: mv.to,
                kind,
            },
        ))
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}
