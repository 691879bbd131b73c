//! Wire protocol between clients and the hub.
//!
//! Every frame is a tagged JSON object. Requests carry the game id so the
//! hub never has to guess which game a frame belongs to.

use chess_core::{Color, MoveSpec};
use chess_rules::ClientView;
use serde::{Deserialize, Serialize};

/// A frame sent by a client.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientRequest {
    CreateLobby,
    JoinLobby {
        lobby: String,
    },
    ReadyUp,
    Move {
        game: String,
        #[serde(rename = "move")]
        mv: MoveSpec,
    },
    OfferDraw {
        game: String,
    },
    ResolveDraw {
        game: String,
        accepted: bool,
    },
    Forfeit {
        game: String,
    },
}

/// A frame sent to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The caller now owns a fresh lobby.
    LobbyCreated { lobby: String },
    /// Both seats are taken; the receiver plays `color`.
    LobbyReady { lobby: String, color: Color },
    PlayerReady,
    OpponentReady,
    /// The receiver is to move in this position.
    YourMove { game: String, view: ClientView },
    /// The receiver waits while the opponent moves.
    BoardUpdate { game: String, view: ClientView },
    MoveRejected { reason: String },
    DrawOffered,
    /// The remaining player now owns the lobby.
    LobbyOwnerMoved { lobby: String },
    Notice { text: String },
    GameEnded { reason: String },
}
