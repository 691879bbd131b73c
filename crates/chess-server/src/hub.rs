//! Message routing between connected players.
//!
//! The hub owns the lobby tracker, the code generator, and the game manager,
//! plus one outbound channel per connection. Each connection belongs to at
//! most one group, the lobby or game id it currently sits in, and group
//! sends fan out over the outbound channels. All hub entry points are
//! synchronous; the socket tasks in `main` drain the channels.

use crate::codes::LobbyCodes;
use crate::games::GameManager;
use crate::lobby::{
    CreateLobbyStatus, JoinLobbyStatus, PlayerId, PlayerLobbies, ReadyStatus, RemoveStatus,
};
use crate::protocol::{ClientRequest, ServerMessage};
use chess_rules::GameStatus;
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Error, Debug)]
pub enum HubError {
    #[error("malformed client frame: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error(transparent)]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),
}

#[derive(Debug)]
struct Peer {
    tx: UnboundedSender<ServerMessage>,
    /// Lobby or game id this connection currently belongs to.
    group: Option<String>,
}

/// Routes client requests to the session services and fans replies out to
/// the affected connections.
#[derive(Debug, Default)]
pub struct Hub {
    lobbies: PlayerLobbies,
    games: GameManager,
    codes: LobbyCodes,
    peers: Mutex<HashMap<PlayerId, Peer>>,
}

impl Hub {
    pub fn new() -> Hub {
        Hub::default()
    }

    /// Registers a freshly accepted connection and its outbound channel.
    pub fn register(&self, player: PlayerId, tx: UnboundedSender<ServerMessage>) {
        self.peers().insert(player, Peer { tx, group: None });
    }

    /// Routes one decoded client frame.
    pub fn handle(&self, player: PlayerId, request: ClientRequest) {
        match request {
            ClientRequest::CreateLobby => self.create_lobby(player),
            ClientRequest::JoinLobby { lobby } => self.join_lobby(player, &lobby),
            ClientRequest::ReadyUp => self.ready_up(player),
            ClientRequest::Move { game, mv } => self.process_move(player, &game, &mv),
            ClientRequest::OfferDraw { game } => {
                self.send_group_except(&game, player, ServerMessage::DrawOffered);
            }
            ClientRequest::ResolveDraw { game, accepted } => {
                self.resolve_draw(player, &game, accepted)
            }
            ClientRequest::Forfeit { game } => self.forfeit(player, &game),
        }
    }

    /// Cleans up after a dropped connection and notifies the player left
    /// behind, in a lobby or in a game.
    pub fn handle_disconnect(&self, player: PlayerId) {
        let group = match self.peers().remove(&player) {
            Some(peer) => peer.group,
            None => None,
        };
        let Some(group) = group else {
            return;
        };

        if self.games.remove_game(&group) {
            tracing::info!(player, game = %group, "player left a running game");
            self.send_group_except(&group, player, ServerMessage::GameEnded {
                reason: "Opponent left.".to_string(),
            });
            return;
        }

        match self.lobbies.remove_disconnected(player) {
            (RemoveStatus::OwnerMoved, Some(lobby)) => {
                self.send_group_except(
                    &lobby,
                    player,
                    ServerMessage::LobbyOwnerMoved { lobby: lobby.clone() },
                );
            }
            (RemoveStatus::Removed, Some(lobby)) => {
                self.send_group_except(&lobby, player, ServerMessage::Notice {
                    text: "Opponent left.".to_string(),
                });
            }
            _ => {}
        }
    }

    fn create_lobby(&self, player: PlayerId) {
        if self.lobbies.lobby_of(player).is_some() {
            self.notice(player, "You are already in lobby.");
            return;
        }
        let lobby = self.codes.next_code();
        match self.lobbies.create_lobby(player, &lobby) {
            CreateLobbyStatus::Created => {
                self.set_group(player, &lobby);
                tracing::info!(player, %lobby, "lobby created");
                self.send(player, ServerMessage::LobbyCreated { lobby });
            }
            CreateLobbyStatus::AlreadyInLobby => self.notice(player, "You are already in lobby."),
            CreateLobbyStatus::LobbyAlreadyExists => {
                tracing::warn!(player, %lobby, "generated code collided with a live lobby");
                self.notice(player, "Could not create lobby.");
            }
        }
    }

    fn join_lobby(&self, player: PlayerId, lobby: &str) {
        match self.lobbies.join_lobby(lobby, player) {
            JoinLobbyStatus::Joined => {
                // the creator was first in, so the creator plays White
                self.send_group(lobby, ServerMessage::LobbyReady {
                    lobby: lobby.to_string(),
                    color: chess_core::Color::White,
                });
                self.send(player, ServerMessage::LobbyReady {
                    lobby: lobby.to_string(),
                    color: chess_core::Color::Black,
                });
                self.set_group(player, lobby);
                tracing::info!(player, %lobby, "lobby filled");
            }
            JoinLobbyStatus::AlreadyInLobby => self.notice(player, "You are already in lobby."),
            JoinLobbyStatus::DoesNotExist => self.notice(player, "Lobby does not exist."),
            JoinLobbyStatus::Full => self.notice(player, "Lobby is full."),
        }
    }

    fn ready_up(&self, player: PlayerId) {
        let Some(lobby) = self.lobbies.lobby_of(player) else {
            tracing::warn!(player, "ready up outside a lobby");
            return;
        };
        match self.lobbies.player_ready(player) {
            ReadyStatus::PlayerReady => {
                self.send(player, ServerMessage::PlayerReady);
                self.send_group_except(&lobby, player, ServerMessage::OpponentReady);
            }
            ReadyStatus::BothPlayersReady => {
                let Some((owner, guest)) = self.lobbies.game_ready(&lobby) else {
                    tracing::warn!(%lobby, "both ready but the lobby handoff failed");
                    return;
                };
                let view = self.games.create_game(&lobby);
                tracing::info!(%lobby, owner, guest, "game started");
                // the lobby creator plays White and moves first
                self.send(owner, ServerMessage::YourMove {
                    game: lobby.clone(),
                    view: view.clone(),
                });
                self.send(guest, ServerMessage::BoardUpdate { game: lobby, view });
            }
            ReadyStatus::NotInLobby => {
                tracing::warn!(player, "ready up from an untracked player");
            }
        }
    }

    fn process_move(&self, player: PlayerId, game: &str, mv: &chess_core::MoveSpec) {
        let view = match self.games.process_move(game, mv) {
            Ok(view) => view,
            Err(err) => {
                self.send(player, ServerMessage::MoveRejected {
                    reason: err.to_string(),
                });
                return;
            }
        };

        let status = view.status;
        self.send(player, ServerMessage::BoardUpdate {
            game: game.to_string(),
            view: view.clone(),
        });
        self.send_group_except(game, player, ServerMessage::YourMove {
            game: game.to_string(),
            view,
        });

        match status {
            GameStatus::Checkmate => {
                self.games.remove_game(game);
                self.send_group(game, ServerMessage::GameEnded {
                    reason: "Checkmate".to_string(),
                });
            }
            GameStatus::Draw => {
                self.games.remove_game(game);
                self.send_group(game, ServerMessage::GameEnded {
                    reason: "Draw".to_string(),
                });
            }
            GameStatus::Check => self.send_group(game, ServerMessage::Notice {
                text: "Check".to_string(),
            }),
            GameStatus::Normal => {}
        }
    }

    fn resolve_draw(&self, player: PlayerId, game: &str, accepted: bool) {
        if accepted {
            self.games.remove_game(game);
            self.send_group(game, ServerMessage::GameEnded {
                reason: "Draw accepted".to_string(),
            });
        } else {
            self.send_group_except(game, player, ServerMessage::Notice {
                text: "Draw denied".to_string(),
            });
        }
    }

    fn forfeit(&self, player: PlayerId, game: &str) {
        self.games.remove_game(game);
        self.send(player, ServerMessage::GameEnded {
            reason: "You forfeited.".to_string(),
        });
        self.send_group_except(game, player, ServerMessage::GameEnded {
            reason: "Opponent forfeited.".to_string(),
        });
    }

    fn set_group(&self, player: PlayerId, group: &str) {
        if let Some(peer) = self.peers().get_mut(&player) {
            peer.group = Some(group.to_string());
        }
    }

    fn notice(&self, player: PlayerId, text: &str) {
        self.send(player, ServerMessage::Notice {
            text: text.to_string(),
        });
    }

    fn send(&self, player: PlayerId, message: ServerMessage) {
        if let Some(peer) = self.peers().get(&player) {
            // a closed channel means the connection is already going away
            let _ = peer.tx.send(message);
        }
    }

    fn send_group(&self, group: &str, message: ServerMessage) {
        for peer in self.peers().values() {
            if peer.group.as_deref() == Some(group) {
                let _ = peer.tx.send(message.clone());
            }
        }
    }

    fn send_group_except(&self, group: &str, except: PlayerId, message: ServerMessage) {
        for (player, peer) in self.peers().iter() {
            if *player != except && peer.group.as_deref() == Some(group) {
                let _ = peer.tx.send(message.clone());
            }
        }
    }

    fn peers(&self) -> std::sync::MutexGuard<'_, HashMap<PlayerId, Peer>> {
        self.peers.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::{Color, MoveSpec, Square};
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn connect(hub: &Hub, player: PlayerId) -> UnboundedReceiver<ServerMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        hub.register(player, tx);
        rx
    }

    fn drain(rx: &mut UnboundedReceiver<ServerMessage>) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        while let Ok(message) = rx.try_recv() {
            out.push(message);
        }
        out
    }

    fn start_game(hub: &Hub) -> (UnboundedReceiver<ServerMessage>, UnboundedReceiver<ServerMessage>) {
        let mut owner = connect(hub, 1);
        let mut guest = connect(hub, 2);
        hub.handle(1, ClientRequest::CreateLobby);
        hub.handle(
            2,
            ClientRequest::JoinLobby {
                lobby: "00001".to_string(),
            },
        );
        hub.handle(1, ClientRequest::ReadyUp);
        hub.handle(2, ClientRequest::ReadyUp);
        drain(&mut owner);
        drain(&mut guest);
        (owner, guest)
    }

    fn request_move(game: &str, from: &str, to: &str) -> ClientRequest {
        ClientRequest::Move {
            game: game.to_string(),
            mv: MoveSpec::new(
                Square::from_algebraic(from).unwrap(),
                Square::from_algebraic(to).unwrap(),
            ),
        }
    }

    #[test]
    fn lobby_handshake_assigns_colors() {
        let hub = Hub::new();
        let mut owner = connect(&hub, 1);
        let mut guest = connect(&hub, 2);

        hub.handle(1, ClientRequest::CreateLobby);
        assert_eq!(
            drain(&mut owner),
            vec![ServerMessage::LobbyCreated {
                lobby: "00001".to_string()
            }]
        );

        hub.handle(
            2,
            ClientRequest::JoinLobby {
                lobby: "00001".to_string(),
            },
        );
        assert_eq!(
            drain(&mut owner),
            vec![ServerMessage::LobbyReady {
                lobby: "00001".to_string(),
                color: Color::White,
            }]
        );
        assert_eq!(
            drain(&mut guest),
            vec![ServerMessage::LobbyReady {
                lobby: "00001".to_string(),
                color: Color::Black,
            }]
        );
    }

    #[test]
    fn join_failures_come_back_as_notices() {
        let hub = Hub::new();
        let mut guest = connect(&hub, 2);
        hub.handle(
            2,
            ClientRequest::JoinLobby {
                lobby: "99999".to_string(),
            },
        );
        assert_eq!(
            drain(&mut guest),
            vec![ServerMessage::Notice {
                text: "Lobby does not exist.".to_string()
            }]
        );
    }

    #[test]
    fn ready_handshake_starts_the_game() {
        let hub = Hub::new();
        let mut owner = connect(&hub, 1);
        let mut guest = connect(&hub, 2);
        hub.handle(1, ClientRequest::CreateLobby);
        hub.handle(
            2,
            ClientRequest::JoinLobby {
                lobby: "00001".to_string(),
            },
        );
        drain(&mut owner);
        drain(&mut guest);

        hub.handle(1, ClientRequest::ReadyUp);
        assert_eq!(drain(&mut owner), vec![ServerMessage::PlayerReady]);
        assert_eq!(drain(&mut guest), vec![ServerMessage::OpponentReady]);

        hub.handle(2, ClientRequest::ReadyUp);
        let owner_frames = drain(&mut owner);
        let guest_frames = drain(&mut guest);
        // the creator plays White and gets the first move
        assert!(matches!(
            owner_frames.as_slice(),
            [ServerMessage::YourMove { game, .. }] if game == "00001"
        ));
        assert!(matches!(
            guest_frames.as_slice(),
            [ServerMessage::BoardUpdate { game, .. }] if game == "00001"
        ));
    }

    #[test]
    fn moves_flow_to_both_players() {
        let hub = Hub::new();
        let (mut owner, mut guest) = start_game(&hub);

        hub.handle(1, request_move("00001", "e2", "e4"));
        let owner_frames = drain(&mut owner);
        let guest_frames = drain(&mut guest);
        assert!(matches!(
            owner_frames.as_slice(),
            [ServerMessage::BoardUpdate { .. }]
        ));
        assert!(matches!(
            guest_frames.as_slice(),
            [ServerMessage::YourMove { .. }]
        ));
    }

    #[test]
    fn illegal_moves_only_bounce_to_the_caller() {
        let hub = Hub::new();
        let (mut owner, mut guest) = start_game(&hub);

        hub.handle(1, request_move("00001", "e2", "e5"));
        assert!(matches!(
            drain(&mut owner).as_slice(),
            [ServerMessage::MoveRejected { .. }]
        ));
        assert!(drain(&mut guest).is_empty());
    }

    #[test]
    fn checkmate_ends_the_game_for_both_players() {
        let hub = Hub::new();
        let (mut owner, mut guest) = start_game(&hub);

        hub.handle(1, request_move("00001", "e2", "e4"));
        hub.handle(2, request_move("00001", "e7", "e5"));
        hub.handle(1, request_move("00001", "f1", "c4"));
        hub.handle(2, request_move("00001", "b8", "c6"));
        hub.handle(1, request_move("00001", "d1", "h5"));
        hub.handle(2, request_move("00001", "g8", "f6"));
        drain(&mut owner);
        drain(&mut guest);

        hub.handle(1, request_move("00001", "h5", "f7"));
        let owner_frames = drain(&mut owner);
        let guest_frames = drain(&mut guest);
        assert!(owner_frames.contains(&ServerMessage::GameEnded {
            reason: "Checkmate".to_string()
        }));
        assert!(guest_frames.contains(&ServerMessage::GameEnded {
            reason: "Checkmate".to_string()
        }));
        // the finished game is gone, later frames bounce
        hub.handle(2, request_move("00001", "e8", "f7"));
        assert!(matches!(
            drain(&mut guest).as_slice(),
            [ServerMessage::MoveRejected { .. }]
        ));
    }

    #[test]
    fn check_is_announced_to_the_group() {
        let hub = Hub::new();
        let (mut owner, mut guest) = start_game(&hub);

        hub.handle(1, request_move("00001", "e2", "e4"));
        hub.handle(2, request_move("00001", "f7", "f6"));
        drain(&mut owner);
        drain(&mut guest);

        hub.handle(1, request_move("00001", "d1", "h5"));
        let expected = ServerMessage::Notice {
            text: "Check".to_string(),
        };
        assert!(drain(&mut owner).contains(&expected));
        assert!(drain(&mut guest).contains(&expected));
    }

    #[test]
    fn draw_offers_and_resolution() {
        let hub = Hub::new();
        let (mut owner, mut guest) = start_game(&hub);

        hub.handle(1, ClientRequest::OfferDraw {
            game: "00001".to_string(),
        });
        assert!(drain(&mut owner).is_empty());
        assert_eq!(drain(&mut guest), vec![ServerMessage::DrawOffered]);

        hub.handle(2, ClientRequest::ResolveDraw {
            game: "00001".to_string(),
            accepted: false,
        });
        assert_eq!(
            drain(&mut owner),
            vec![ServerMessage::Notice {
                text: "Draw denied".to_string()
            }]
        );
        assert!(drain(&mut guest).is_empty());

        hub.handle(2, ClientRequest::ResolveDraw {
            game: "00001".to_string(),
            accepted: true,
        });
        let expected = ServerMessage::GameEnded {
            reason: "Draw accepted".to_string(),
        };
        assert_eq!(drain(&mut owner), vec![expected.clone()]);
        assert_eq!(drain(&mut guest), vec![expected]);
    }

    #[test]
    fn forfeit_notifies_both_sides() {
        let hub = Hub::new();
        let (mut owner, mut guest) = start_game(&hub);

        hub.handle(2, ClientRequest::Forfeit {
            game: "00001".to_string(),
        });
        assert_eq!(
            drain(&mut guest),
            vec![ServerMessage::GameEnded {
                reason: "You forfeited.".to_string()
            }]
        );
        assert_eq!(
            drain(&mut owner),
            vec![ServerMessage::GameEnded {
                reason: "Opponent forfeited.".to_string()
            }]
        );
    }

    #[test]
    fn disconnect_mid_game_ends_it_for_the_opponent() {
        let hub = Hub::new();
        let (_owner, mut guest) = start_game(&hub);

        hub.handle_disconnect(1);
        assert_eq!(
            drain(&mut guest),
            vec![ServerMessage::GameEnded {
                reason: "Opponent left.".to_string()
            }]
        );
    }

    #[test]
    fn disconnect_in_the_lobby_promotes_the_guest() {
        let hub = Hub::new();
        let mut owner = connect(&hub, 1);
        let mut guest = connect(&hub, 2);
        hub.handle(1, ClientRequest::CreateLobby);
        hub.handle(
            2,
            ClientRequest::JoinLobby {
                lobby: "00001".to_string(),
            },
        );
        drain(&mut owner);
        drain(&mut guest);

        hub.handle_disconnect(1);
        assert_eq!(
            drain(&mut guest),
            vec![ServerMessage::LobbyOwnerMoved {
                lobby: "00001".to_string()
            }]
        );
        // a new player can take the open seat
        let mut third = connect(&hub, 3);
        hub.handle(
            3,
            ClientRequest::JoinLobby {
                lobby: "00001".to_string(),
            },
        );
        assert!(matches!(
            drain(&mut third).as_slice(),
            [ServerMessage::LobbyReady { color: Color::Black, .. }]
        ));
    }
}
