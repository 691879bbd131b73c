//! Attack detection.
//!
//! Attacks are found by scanning outward from the target square: the two
//! pawn-attack squares, the eight knight offsets, and the eight sliding rays
//! matched against rook, bishop, and queen orientations.

use crate::Board;
use chess_core::{Color, Piece, Square};

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

const RAY_DIRECTIONS: [(i8, i8); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

/// Returns the squares of all `attacker` pieces attacking `target`.
///
/// Pawns, knights, and sliding pieces are scanned; an adjacent enemy king is
/// not reported.
pub fn attackers_of(board: &Board, target: Square, attacker: Color) -> Vec<Square> {
    let mut found = Vec::new();

    // pawns attack diagonally against their advance direction
    let pawn_rank_offset = -attacker.pawn_direction();
    for file_offset in [-1, 1] {
        if let Some(sq) = target.offset(file_offset, pawn_rank_offset) {
            if board.get(sq) == Some((Piece::Pawn, attacker)) {
                found.push(sq);
            }
        }
    }

    for (df, dr) in KNIGHT_OFFSETS {
        if let Some(sq) = target.offset(df, dr) {
            if board.get(sq) == Some((Piece::Knight, attacker)) {
                found.push(sq);
            }
        }
    }

    for (df, dr) in RAY_DIRECTIONS {
        let mut sq = target;
        while let Some(next) = sq.offset(df, dr) {
            sq = next;
            match board.get(sq) {
                None => continue,
                Some((piece, color)) => {
                    if color == attacker && slides_along(piece, df, dr) {
                        found.push(sq);
                    }
                    break;
                }
            }
        }
    }

    found
}

/// Returns true when `target` is attacked by any `attacker` piece.
pub fn is_attacked(board: &Board, target: Square, attacker: Color) -> bool {
    !attackers_of(board, target, attacker).is_empty()
}

pub(crate) fn slides_along(piece: Piece, df: i8, dr: i8) -> bool {
    match piece {
        Piece::Queen => true,
        Piece::Rook => df == 0 || dr == 0,
        Piece::Bishop => df != 0 && dr != 0,
        _ => false,
    }
}
