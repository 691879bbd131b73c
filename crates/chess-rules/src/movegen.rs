//! Legal move generation.
//!
//! Each piece first gets its pseudo-legal destinations, which are then
//! filtered for king safety. Two strategies are used: while not in check,
//! non-king moves go through a cheap pin scan along the piece-to-king line;
//! king moves, castling transit squares, and every candidate while in check
//! are validated by replaying the move on a scratch board and re-running
//! attack detection.

use crate::attacks::{is_attacked, slides_along};
use crate::board::{castling_rook_start, MoveKind, PlayedMove};
use crate::Board;
use chess_core::{Color, Piece, Square};
use std::collections::BTreeMap;

const ROOK_DIRECTIONS: [(i8, i8); 4] = [(0, 1), (1, 0), (-1, 0), (0, -1)];
const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const QUEEN_DIRECTIONS: [(i8, i8); 8] = [
    (0, 1),
    (1, 0),
    (-1, 0),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];
const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

/// Tracks which kings and rooks still qualify for castling.
///
/// Rooks are tracked by their starting square; a rook leaves the tracker
/// when it moves or castles. The tracker is updated after the board, so it
/// inspects the post-move occupant of the destination square.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastlingTracker {
    king_moved: [bool; 2],
    rooks: [Vec<Square>; 2],
}

impl CastlingTracker {
    /// Tracker for the standard starting position.
    pub fn standard() -> CastlingTracker {
        CastlingTracker {
            king_moved: [false; 2],
            rooks: [
                vec![Square::new(0, 0), Square::new(7, 0)],
                vec![Square::new(0, 7), Square::new(7, 7)],
            ],
        }
    }

    /// Tracker for an arbitrary position: a king on its starting square
    /// counts as unmoved, and corner rooks count as castleable.
    pub fn from_board(board: &Board) -> CastlingTracker {
        let mut tracker = CastlingTracker {
            king_moved: [false; 2],
            rooks: [Vec::new(), Vec::new()],
        };
        for color in [Color::White, Color::Black] {
            let rank = match color {
                Color::White => 0,
                Color::Black => 7,
            };
            tracker.king_moved[color.index()] =
                board.get(Square::new(4, rank)) != Some((Piece::King, color));
            for file in [0, 7] {
                let sq = Square::new(file, rank);
                if board.get(sq) == Some((Piece::Rook, color)) {
                    tracker.rooks[color.index()].push(sq);
                }
            }
        }
        tracker
    }

    pub fn king_unmoved(&self, color: Color) -> bool {
        !self.king_moved[color.index()]
    }

    pub fn unmoved_rooks(&self, color: Color) -> &[Square] {
        &self.rooks[color.index()]
    }

    /// Records a move that was already applied to `board`.
    pub fn record(&mut self, board: &Board, mv: &PlayedMove) {
        let Some((piece, color)) = board.get(mv.to) else {
            return;
        };
        if piece == Piece::King {
            self.king_moved[color.index()] = true;
        }
        if mv.kind == MoveKind::Castling {
            let rook_start = castling_rook_start(mv.from, mv.to);
            self.rooks[color.index()].retain(|&sq| sq != rook_start);
        } else if piece == Piece::Rook {
            self.rooks[color.index()].retain(|&sq| sq != mv.from);
        }
    }
}

/// Computes all legal moves for `color` as an ordered origin-to-destinations
/// map. Origins with no legal moves are omitted.
pub fn legal_moves(
    board: &Board,
    color: Color,
    checkers: &[Square],
    double_step: Option<Square>,
    castling: &CastlingTracker,
) -> BTreeMap<Square, Vec<Square>> {
    let king = board.king_square(color);
    let mut result = BTreeMap::new();

    for (from, piece) in board.pieces(color) {
        let candidates = match piece {
            Piece::Pawn => pawn_moves(board, color, from, double_step),
            Piece::Knight => knight_moves(board, color, from),
            Piece::Bishop => slider_moves(board, color, from, &BISHOP_DIRECTIONS),
            Piece::Rook => slider_moves(board, color, from, &ROOK_DIRECTIONS),
            Piece::Queen => slider_moves(board, color, from, &QUEEN_DIRECTIONS),
            Piece::King => king_moves(board, color, from, castling),
        };

        let filtered: Vec<Square> = if !checkers.is_empty() {
            // in check every candidate must demonstrably resolve the check
            candidates
                .into_iter()
                .filter(|&to| !leaves_king_attacked(board, color, from, to))
                .collect()
        } else if piece == Piece::King {
            // king candidates are already simulated
            candidates
        } else if let Some(king) = king {
            candidates
                .into_iter()
                .filter(|&to| !exposes_own_king(board, color, from, to, king))
                .collect()
        } else {
            candidates
        };

        if !filtered.is_empty() {
            result.insert(from, filtered);
        }
    }

    result
}

/// Replays `from -> to` as a plain move on a scratch board and reports
/// whether the mover's king ends up attacked.
pub(crate) fn leaves_king_attacked(board: &Board, color: Color, from: Square, to: Square) -> bool {
    let mut scratch = board.clone();
    scratch.apply(&PlayedMove {
        from,
        to,
        kind: MoveKind::Normal,
    });
    match scratch.king_square(color) {
        Some(king) => is_attacked(&scratch, king, color.opposite()),
        None => false,
    }
}

/// Unit direction from `from` to `to` when they share a rank, file, or
/// diagonal; `None` otherwise.
fn aligned_direction(from: Square, to: Square) -> Option<(i8, i8)> {
    let df = to.file() as i8 - from.file() as i8;
    let dr = to.rank() as i8 - from.rank() as i8;
    if df == 0 && dr == 0 {
        None
    } else if df == 0 || dr == 0 || df.abs() == dr.abs() {
        Some((df.signum(), dr.signum()))
    } else {
        None
    }
}

/// Pin scan: reports whether moving `from -> to` would uncover a slider
/// attack on the mover's own king. Only used while not in check.
fn exposes_own_king(board: &Board, color: Color, from: Square, to: Square, king: Square) -> bool {
    let Some(dir) = aligned_direction(from, king) else {
        // not on a line with the king, so no pin to break
        return false;
    };

    // moving along the king line in either direction keeps the line blocked
    if let Some(move_dir) = aligned_direction(from, to) {
        if move_dir == dir || move_dir == (-dir.0, -dir.1) {
            return false;
        }
    }

    // another piece between this one and the king blocks any pin
    let mut sq = from;
    loop {
        let Some(next) = sq.offset(dir.0, dir.1) else {
            break;
        };
        sq = next;
        if sq == king {
            break;
        }
        if board.get(sq).is_some() {
            return false;
        }
    }

    // scan away from the king for a pinning slider
    let mut sq = from;
    while let Some(next) = sq.offset(-dir.0, -dir.1) {
        sq = next;
        if let Some((piece, c)) = board.get(sq) {
            return c != color && slides_along(piece, dir.0, dir.1);
        }
    }
    false
}

fn pawn_moves(board: &Board, color: Color, from: Square, double_step: Option<Square>) -> Vec<Square> {
    let mut moves = Vec::new();
    let dir = color.pawn_direction();
    let enemy_pawn = Some((Piece::Pawn, color.opposite()));

    for df in [1, -1] {
        let Some(dest) = from.offset(df, dir) else {
            continue;
        };
        // en passant: an empty landing square beside a pawn that just
        // advanced two squares
        let en_passant = board.get(dest).is_none()
            && from.offset(df, 0).is_some_and(|beside| {
                board.get(beside) == enemy_pawn
                    && double_step.is_some_and(|d| d.file() == beside.file())
            });
        let capture = matches!(board.get(dest), Some((_, c)) if c != color);
        if en_passant || capture {
            moves.push(dest);
        }
    }

    if let Some(one) = from.offset(0, dir) {
        if board.get(one).is_none() {
            moves.push(one);
            if from.rank() == color.pawn_start_rank() {
                if let Some(two) = from.offset(0, 2 * dir) {
                    if board.get(two).is_none() {
                        moves.push(two);
                    }
                }
            }
        }
    }

    moves
}

fn knight_moves(board: &Board, color: Color, from: Square) -> Vec<Square> {
    KNIGHT_OFFSETS
        .iter()
        .filter_map(|&(df, dr)| from.offset(df, dr))
        .filter(|&to| !matches!(board.get(to), Some((_, c)) if c == color))
        .collect()
}

fn slider_moves(board: &Board, color: Color, from: Square, directions: &[(i8, i8)]) -> Vec<Square> {
    let mut moves = Vec::new();
    for &(df, dr) in directions {
        let mut sq = from;
        while let Some(next) = sq.offset(df, dr) {
            sq = next;
            match board.get(sq) {
                None => moves.push(sq),
                Some((_, c)) => {
                    if c != color {
                        moves.push(sq);
                    }
                    break;
                }
            }
        }
    }
    moves
}

fn king_moves(board: &Board, color: Color, from: Square, castling: &CastlingTracker) -> Vec<Square> {
    let mut moves = Vec::new();

    for &(df, dr) in QUEEN_DIRECTIONS.iter() {
        let Some(to) = from.offset(df, dr) else {
            continue;
        };
        if matches!(board.get(to), Some((_, c)) if c == color) {
            continue;
        }
        if !leaves_king_attacked(board, color, from, to) {
            moves.push(to);
        }
    }

    if castling.king_unmoved(color) {
        for &rook_sq in castling.unmoved_rooks(color) {
            // the tracked square must still hold this side's rook
            if board.get(rook_sq) != Some((Piece::Rook, color)) {
                continue;
            }
            if rook_sq.rank() != from.rank() || rook_sq.file() == from.file() {
                continue;
            }
            let step: i8 = if rook_sq.file() > from.file() { 1 } else { -1 };

            // every square between the king and the rook must be empty and
            // safe for the king to stand on
            let mut clear = true;
            let mut file = from.file() as i8 + step;
            while file != rook_sq.file() as i8 {
                let sq = Square::new(file as u8, from.rank());
                if board.get(sq).is_some() || leaves_king_attacked(board, color, from, sq) {
                    clear = false;
                    break;
                }
                file += step;
            }

            if clear {
                if let Some(dest) =
                    Square::try_new(from.file() as i8 + 2 * step, from.rank() as i8)
                {
                    moves.push(dest);
                }
            }
        }
    }

    moves
}
