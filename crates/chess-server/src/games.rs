//! Active game tracking.
//!
//! One [`GameState`] per game, keyed by the lobby id the game started from.
//! The map lock serializes move processing per game, so each state only ever
//! sees one writer at a time.

use chess_core::MoveSpec;
use chess_rules::{ClientView, GameState, RulesError};
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("game not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Rules(#[from] RulesError),
}

/// Tracks all running games.
#[derive(Debug, Default)]
pub struct GameManager {
    games: Mutex<HashMap<String, GameState>>,
}

impl GameManager {
    pub fn new() -> GameManager {
        GameManager::default()
    }

    /// Starts a fresh game for a lobby and returns the initial view.
    pub fn create_game(&self, game_id: &str) -> ClientView {
        let state = GameState::new();
        let view = ClientView::from(&state);
        self.lock().insert(game_id.to_string(), state);
        view
    }

    /// Applies a move to the identified game and returns the updated view.
    pub fn process_move(&self, game_id: &str, mv: &MoveSpec) -> Result<ClientView, GameError> {
        let mut games = self.lock();
        let state = games
            .get_mut(game_id)
            .ok_or_else(|| GameError::NotFound(game_id.to_string()))?;
        state.apply_move(mv)?;
        Ok(ClientView::from(&*state))
    }

    /// Drops a game when a player leaves. Returns false when there was no
    /// such game.
    pub fn remove_game(&self, game_id: &str) -> bool {
        self.lock().remove(game_id).is_some()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, GameState>> {
        self.games.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::Square;
    use chess_rules::GameStatus;

    fn mv(from: &str, to: &str) -> MoveSpec {
        MoveSpec::new(
            Square::from_algebraic(from).unwrap(),
            Square::from_algebraic(to).unwrap(),
        )
    }

    #[test]
    fn create_process_and_remove() {
        let games = GameManager::new();
        let view = games.create_game("00001");
        assert_eq!(view.status, GameStatus::Normal);
        assert_eq!(view.legal_moves.len(), 10);

        let view = games.process_move("00001", &mv("e2", "e4")).unwrap();
        assert_eq!(view.board.len(), 64);
        assert_eq!(view.status, GameStatus::Normal);

        assert!(games.remove_game("00001"));
        assert!(!games.remove_game("00001"));
        assert!(matches!(
            games.process_move("00001", &mv("e7", "e5")),
            Err(GameError::NotFound(_))
        ));
    }

    #[test]
    fn unknown_game_is_reported() {
        let games = GameManager::new();
        assert_eq!(
            games.process_move("00009", &mv("e2", "e4")),
            Err(GameError::NotFound("00009".to_string()))
        );
    }

    #[test]
    fn rejected_moves_pass_the_rules_error_through() {
        let games = GameManager::new();
        games.create_game("00001");
        let err = games.process_move("00001", &mv("e2", "e5")).unwrap_err();
        assert!(matches!(err, GameError::Rules(RulesError::InvalidMove(_))));
        // the game survives a rejected move
        games.process_move("00001", &mv("e2", "e4")).unwrap();
    }
}
