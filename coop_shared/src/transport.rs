//! Matchmaking transport abstraction.
//!
//! The platform layer (lobby service, relay sockets) sits behind [`Transport`].
//! Slow operations are `async`; the host awaits them on spawned tasks and
//! posts the results back to its own sequencing point, so implementations never
//! touch session state directly.
//!
//! Membership changes arrive as [`TransportEvent`]s through whatever channel
//! the implementation was constructed with.

use std::fmt;

use async_trait::async_trait;

use crate::peer_id::PeerId;
use crate::session::{LobbyId, LobbyInfo};

/// Why a lobby operation failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The lobby no longer exists.
    DoesntExist,
    /// The lobby is full.
    Full,
    /// The owner or the service refused entry.
    NotAllowed,
    /// The service could not be reached.
    Unavailable,
    Other(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::DoesntExist => write!(f, "lobby doesn't exist"),
            TransportError::Full => write!(f, "lobby is full"),
            TransportError::NotAllowed => write!(f, "not allowed to enter"),
            TransportError::Unavailable => write!(f, "matchmaking service unavailable"),
            TransportError::Other(s) => write!(f, "{s}"),
        }
    }
}

impl std::error::Error for TransportError {}

/// Notification pushed by the transport outside of any request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    MemberJoined { lobby: LobbyId, peer: PeerId },
    MemberLeft { lobby: LobbyId, peer: PeerId },
    /// The owner changed a lobby data entry.
    DataChanged {
        lobby: LobbyId,
        key: String,
        value: String,
    },
    /// A line sent over the lobby's text channel.
    Chat {
        lobby: LobbyId,
        from: PeerId,
        text: String,
    },
}

/// Platform matchmaking service.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Id of the local player.
    fn local_peer(&self) -> PeerId;

    /// Display name of a player, as the platform knows it.
    fn peer_name(&self, peer: PeerId) -> String;

    async fn create_lobby(&self, max_members: u8) -> Result<LobbyInfo, TransportError>;

    async fn join_lobby(&self, lobby: LobbyId) -> Result<LobbyInfo, TransportError>;

    /// Requests the public lobby list. Filtering is up to the caller.
    async fn request_lobby_list(&self) -> Result<Vec<LobbyInfo>, TransportError>;

    fn leave_lobby(&self, lobby: LobbyId);

    fn set_lobby_data(&self, lobby: LobbyId, key: &str, value: &str);

    fn send_chat(&self, lobby: LobbyId, text: &str);

    /// Frees send/receive resources held for the current lobby.
    fn close_channels(&self);
}
