//! Board representation and the move mutator.
//!
//! The board is a 64-slot mailbox indexed by [`Square`]. It serializes to a
//! fixed 64-symbol string (`'.'` for empty squares, FEN piece letters
//! otherwise) in square-index order from a1, which is also the key used for
//! repetition tracking.

use crate::RulesError;
use chess_core::{Color, Piece, Square};

/// Symbol used for an empty square in the serialized board.
pub const EMPTY_SYMBOL: char = '.';

/// The kind of a move, decided by the classifier before mutation.
///
/// A promotion always carries its replacement piece; the classifier rejects
/// promoting moves without one, so the mutator never has to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    Normal,
    EnPassant,
    Castling,
    Promotion(Piece),
}

/// A classified move, ready to be applied to a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayedMove {
    pub from: Square,
    pub to: Square,
    pub kind: MoveKind,
}

/// An 8x8 mailbox board.
#[derive(Clone, PartialEq, Eq)]
pub struct Board {
    squares: [Option<(Piece, Color)>; 64],
}

impl Board {
    /// Creates an empty board.
    pub fn empty() -> Board {
        Board {
            squares: [None; 64],
        }
    }

    /// Creates the standard starting position.
    pub fn start() -> Board {
        const BACK_RANK: [Piece; 8] = [
            Piece::Rook,
            Piece::Knight,
            Piece::Bishop,
            Piece::Queen,
            Piece::King,
            Piece::Bishop,
            Piece::Knight,
            Piece::Rook,
        ];
        let mut board = Board::empty();
        for file in 0..8 {
            let piece = BACK_RANK[file as usize];
            board.set(Square::new(file, 0), Some((piece, Color::White)));
            board.set(Square::new(file, 1), Some((Piece::Pawn, Color::White)));
            board.set(Square::new(file, 6), Some((Piece::Pawn, Color::Black)));
            board.set(Square::new(file, 7), Some((piece, Color::Black)));
        }
        board
    }

    /// Returns the occupant of a square.
    #[inline]
    pub fn get(&self, sq: Square) -> Option<(Piece, Color)> {
        self.squares[sq.index()]
    }

    /// Sets the occupant of a square.
    #[inline]
    pub fn set(&mut self, sq: Square, occupant: Option<(Piece, Color)>) {
        self.squares[sq.index()] = occupant;
    }

    /// Iterates over all pieces of the given color.
    pub fn pieces(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |sq| match self.get(sq) {
            Some((piece, c)) if c == color => Some((sq, piece)),
            _ => None,
        })
    }

    /// Finds the king of the given color.
    pub fn king_square(&self, color: Color) -> Option<Square> {
        Square::all().find(|&sq| self.get(sq) == Some((Piece::King, color)))
    }

    /// Serializes the board to 64 symbols in square-index order from a1.
    pub fn serialize(&self) -> String {
        Square::all()
            .map(|sq| match self.get(sq) {
                Some((piece, color)) => piece.symbol(color),
                None => EMPTY_SYMBOL,
            })
            .collect()
    }

    /// Parses a 64-symbol board string produced by [`Board::serialize`].
    pub fn parse(s: &str) -> Result<Board, RulesError> {
        let symbols: Vec<char> = s.chars().collect();
        if symbols.len() != 64 {
            return Err(RulesError::MalformedBoard(symbols.len()));
        }
        let mut board = Board::empty();
        for (i, &symbol) in symbols.iter().enumerate() {
            if symbol == EMPTY_SYMBOL {
                continue;
            }
            let (piece, color) =
                Piece::from_symbol(symbol).ok_or(RulesError::UnknownPieceSymbol(symbol))?;
            // index is in range because exactly 64 symbols were collected
            if let Some(sq) = Square::from_index(i as u8) {
                board.set(sq, Some((piece, color)));
            }
        }
        Ok(board)
    }

    /// Applies a classified move. The move is trusted; validation happens
    /// before classification.
    pub fn apply(&mut self, mv: &PlayedMove) {
        match mv.kind {
            MoveKind::Normal => {
                self.set(mv.to, self.get(mv.from));
                self.set(mv.from, None);
            }
            MoveKind::EnPassant => {
                self.set(mv.to, self.get(mv.from));
                self.set(mv.from, None);
                // the captured pawn sits beside the origin, not on the destination
                self.set(Square::new(mv.to.file(), mv.from.rank()), None);
            }
            MoveKind::Castling => {
                self.set(mv.to, self.get(mv.from));
                self.set(mv.from, None);

                let dir: i8 = if mv.to.file() > mv.from.file() { 1 } else { -1 };
                let rook_from = castling_rook_start(mv.from, mv.to);
                let rook_to = Square::new((mv.from.file() as i8 + dir) as u8, mv.to.rank());
                self.set(rook_to, self.get(rook_from));
                self.set(rook_from, None);
            }
            MoveKind::Promotion(piece) => {
                if let Some((_, color)) = self.get(mv.from) {
                    self.set(mv.to, Some((piece, color)));
                }
                self.set(mv.from, None);
            }
        }
    }
}

/// Finds the starting square of the rook involved in a castling move by
/// walking from the king's destination toward the board edge.
pub(crate) fn castling_rook_start(from: Square, to: Square) -> Square {
    let dir: i8 = if to.file() > from.file() { 1 } else { -1 };
    let mut file = to.file() as i8 + dir;
    while file != 0 && file != 7 {
        file += dir;
    }
    Square::new(file as u8, to.rank())
}

impl std::fmt::Debug for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // ranks printed top down, as seen from white's side
        for rank in (0..8).rev() {
            for file in 0..8 {
                let symbol = match self.get(Square::new(file, rank)) {
                    Some((piece, color)) => piece.symbol(color),
                    None => EMPTY_SYMBOL,
                };
                write!(f, "{}", symbol)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
