//! Lobby tracking.
//!
//! A lobby holds up to two players, each with a ready flag. Players are
//! identified by their connection id. Both maps live behind one lock so a
//! player is never tracked in a lobby that no longer exists.

use std::collections::HashMap;
use std::sync::Mutex;

/// Connection id of a player.
pub type PlayerId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateLobbyStatus {
    Created,
    AlreadyInLobby,
    LobbyAlreadyExists,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinLobbyStatus {
    Joined,
    AlreadyInLobby,
    DoesNotExist,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyStatus {
    NotInLobby,
    PlayerReady,
    BothPlayersReady,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveStatus {
    NotInLobby,
    Removed,
    /// The creator left and the remaining player now owns the lobby.
    OwnerMoved,
}

#[derive(Debug, Clone, Default)]
struct Lobby {
    owner: Option<(PlayerId, bool)>,
    guest: Option<(PlayerId, bool)>,
}

#[derive(Debug, Default)]
struct Tracker {
    /// player -> lobby id
    players: HashMap<PlayerId, String>,
    lobbies: HashMap<String, Lobby>,
}

/// Tracks which players sit in which lobby, and their ready state.
#[derive(Debug, Default)]
pub struct PlayerLobbies {
    inner: Mutex<Tracker>,
}

impl PlayerLobbies {
    pub fn new() -> PlayerLobbies {
        PlayerLobbies::default()
    }

    /// Creates a lobby owned by `player`.
    pub fn create_lobby(&self, player: PlayerId, lobby_id: &str) -> CreateLobbyStatus {
        let mut inner = self.lock();
        if inner.players.contains_key(&player) {
            return CreateLobbyStatus::AlreadyInLobby;
        }
        if inner.lobbies.contains_key(lobby_id) {
            return CreateLobbyStatus::LobbyAlreadyExists;
        }
        inner.lobbies.insert(
            lobby_id.to_string(),
            Lobby {
                owner: Some((player, false)),
                guest: None,
            },
        );
        inner.players.insert(player, lobby_id.to_string());
        CreateLobbyStatus::Created
    }

    /// Adds `player` as the second player of an existing lobby.
    pub fn join_lobby(&self, lobby_id: &str, player: PlayerId) -> JoinLobbyStatus {
        let mut inner = self.lock();
        if inner.players.contains_key(&player) {
            return JoinLobbyStatus::AlreadyInLobby;
        }
        let Some(lobby) = inner.lobbies.get_mut(lobby_id) else {
            return JoinLobbyStatus::DoesNotExist;
        };
        if lobby.guest.is_some() {
            return JoinLobbyStatus::Full;
        }
        lobby.guest = Some((player, false));
        inner.players.insert(player, lobby_id.to_string());
        JoinLobbyStatus::Joined
    }

    /// Returns the lobby a player currently sits in.
    pub fn lobby_of(&self, player: PlayerId) -> Option<String> {
        self.lock().players.get(&player).cloned()
    }

    /// Marks `player` as ready and reports whether the whole lobby is.
    pub fn player_ready(&self, player: PlayerId) -> ReadyStatus {
        let mut inner = self.lock();
        let Some(lobby_id) = inner.players.get(&player).cloned() else {
            return ReadyStatus::NotInLobby;
        };
        let Some(lobby) = inner.lobbies.get_mut(&lobby_id) else {
            return ReadyStatus::NotInLobby;
        };
        match (&mut lobby.owner, &mut lobby.guest) {
            (Some(slot), _) | (_, Some(slot)) if slot.0 == player => slot.1 = true,
            _ => return ReadyStatus::NotInLobby,
        }
        let both = matches!(
            (&lobby.owner, &lobby.guest),
            (Some((_, true)), Some((_, true)))
        );
        if both {
            ReadyStatus::BothPlayersReady
        } else {
            ReadyStatus::PlayerReady
        }
    }

    /// Removes a disconnected player, promoting the remaining player to
    /// lobby owner when the creator left. Returns the affected lobby id.
    pub fn remove_disconnected(&self, player: PlayerId) -> (RemoveStatus, Option<String>) {
        let mut inner = self.lock();
        let Some(lobby_id) = inner.players.remove(&player) else {
            return (RemoveStatus::NotInLobby, None);
        };
        let Some(lobby) = inner.lobbies.get_mut(&lobby_id) else {
            return (RemoveStatus::Removed, None);
        };
        if lobby.owner.map(|(id, _)| id) == Some(player) {
            match lobby.guest.take() {
                Some((guest, _)) => {
                    lobby.owner = Some((guest, false));
                    return (RemoveStatus::OwnerMoved, Some(lobby_id));
                }
                None => {
                    inner.lobbies.remove(&lobby_id);
                    return (RemoveStatus::Removed, Some(lobby_id));
                }
            }
        }
        if lobby.guest.map(|(id, _)| id) == Some(player) {
            lobby.guest = None;
        }
        (RemoveStatus::Removed, Some(lobby_id))
    }

    /// Hands the lobby over to a game: when both players are ready, removes
    /// all lobby tracking and returns (owner, guest).
    pub fn game_ready(&self, lobby_id: &str) -> Option<(PlayerId, PlayerId)> {
        let mut inner = self.lock();
        let lobby = inner.lobbies.get(lobby_id)?;
        let (Some((owner, true)), Some((guest, true))) = (lobby.owner, lobby.guest) else {
            return None;
        };
        inner.players.remove(&owner);
        inner.players.remove(&guest);
        inner.lobbies.remove(lobby_id);
        Some((owner, guest))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tracker> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
