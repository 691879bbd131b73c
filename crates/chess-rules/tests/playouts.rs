//! Randomized playouts checking that the engine never contradicts itself.

use chess_core::{MoveSpec, Piece};
use chess_rules::{attackers_of, Board, ClientView, GameState, GameStatus};
use proptest::prelude::*;

fn pick_move(state: &GameState, choice: prop::sample::Index) -> Option<MoveSpec> {
    let mut flat = Vec::new();
    for (&from, dests) in state.legal_moves() {
        for &to in dests {
            flat.push((from, to));
        }
    }
    if flat.is_empty() {
        return None;
    }
    let (from, to) = flat[choice.index(flat.len())];
    let promoting = state.board().get(from).map(|(piece, _)| piece) == Some(Piece::Pawn)
        && to.rank() == state.to_move().promotion_rank();
    Some(if promoting {
        MoveSpec::promoting(from, to, Piece::Queen)
    } else {
        MoveSpec::new(from, to)
    })
}

proptest! {
    #[test]
    fn random_playouts_keep_the_state_coherent(
        choices in proptest::collection::vec(any::<prop::sample::Index>(), 40),
    ) {
        let mut state = GameState::new();

        for choice in choices {
            if state.status().is_over() {
                break;
            }
            let mover = state.to_move();
            let mv = match pick_move(&state, choice) {
                Some(mv) => mv,
                None => break,
            };
            prop_assert!(state.apply_move(&mv).is_ok(), "listed move rejected: {mv}");

            // the mover never leaves their own king attacked
            if let Some(king) = state.board().king_square(mover) {
                prop_assert!(
                    attackers_of(state.board(), king, mover.opposite()).is_empty(),
                    "move {mv} left the mover's king attacked"
                );
            }

            // both kings survive every legal move
            prop_assert!(state.board().king_square(mover).is_some());
            prop_assert!(state.board().king_square(mover.opposite()).is_some());

            // status, checkers, and the legal-move set agree
            match state.status() {
                GameStatus::Normal => {
                    prop_assert!(state.checkers().is_empty());
                    prop_assert!(!state.legal_moves().is_empty());
                }
                GameStatus::Check => {
                    prop_assert!(!state.checkers().is_empty());
                    prop_assert!(!state.legal_moves().is_empty());
                }
                GameStatus::Checkmate => {
                    prop_assert!(!state.checkers().is_empty());
                    prop_assert!(state.legal_moves().is_empty());
                }
                GameStatus::Draw => {
                    prop_assert!(state.legal_moves().is_empty());
                }
            }

            // the serialized board parses back to the same position
            let parsed = Board::parse(&state.board().serialize()).unwrap();
            prop_assert!(parsed == *state.board());
        }

        // the final state projects to a consistent client view
        let view = ClientView::from(&state);
        prop_assert_eq!(view.board.len(), 64);
        prop_assert_eq!(view.to_move, state.to_move());
    }
}
