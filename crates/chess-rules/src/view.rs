//! Read-only projection of a game for connected players.

use crate::{GameState, GameStatus};
use chess_core::{Color, Square};
use serde::{Deserialize, Serialize};

/// Legal destinations for the piece on one origin square.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveSet {
    pub from: Square,
    pub to: Vec<Square>,
}

/// Everything a client needs to render the game.
///
/// The board is the fixed 64-symbol serialization, and legal moves are an
/// ordered list of origin/destinations pairs. The checked king square is
/// present only while the king is in check or checkmated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientView {
    pub board: String,
    pub to_move: Color,
    pub status: GameStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked_king: Option<Square>,
    pub legal_moves: Vec<MoveSet>,
}

impl From<&GameState> for ClientView {
    fn from(state: &GameState) -> ClientView {
        ClientView {
            board: state.board().serialize(),
            to_move: state.to_move(),
            status: state.status(),
            checked_king: state.checked_king(),
            legal_moves: state
                .legal_moves()
                .iter()
                .map(|(&from, to)| MoveSet {
                    from,
                    to: to.clone(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::MoveSpec;

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    #[test]
    fn view_of_a_new_game() {
        let state = GameState::new();
        let view = ClientView::from(&state);
        assert_eq!(view.board.len(), 64);
        assert_eq!(view.to_move, Color::White);
        assert_eq!(view.status, GameStatus::Normal);
        assert_eq!(view.checked_king, None);
        assert_eq!(view.legal_moves.len(), 10);
        // origins come out in square-index order
        assert_eq!(view.legal_moves[0].from, sq("b1"));
        assert_eq!(view.legal_moves[2].from, sq("a2"));
    }

    #[test]
    fn view_serializes_to_tagged_json() {
        let state = GameState::new();
        let json = serde_json::to_value(ClientView::from(&state)).unwrap();
        assert_eq!(json["status"], "normal");
        assert_eq!(json["to_move"], "White");
        assert!(json.get("checked_king").is_none());
        assert_eq!(json["board"].as_str().unwrap().len(), 64);
    }

    #[test]
    fn checked_king_appears_in_the_view() {
        let mut state = GameState::new();
        for (from, to) in [("e2", "e4"), ("f7", "f6"), ("d1", "h5")] {
            state
                .apply_move(&MoveSpec::new(sq(from), sq(to)))
                .unwrap();
        }
        let view = ClientView::from(&state);
        assert_eq!(view.status, GameStatus::Check);
        assert_eq!(view.checked_king, Some(sq("e8")));
        let round_trip: ClientView =
            serde_json::from_str(&serde_json::to_string(&view).unwrap()).unwrap();
        assert_eq!(round_trip, view);
    }
}
