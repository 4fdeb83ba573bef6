//! `coop_shared`
//!
//! Session and entity-replication core shared by every peer.
//!
//! Design goals:
//! - One host context per process owns all state; nothing is global.
//! - Transport and content layers plug in through traits.
//! - No `unsafe`.

pub mod chat;
pub mod commands;
pub mod config;
pub mod entities;
pub mod entity_type;
pub mod event;
pub mod levels;
pub mod net;
pub mod peer_id;
pub mod session;
pub mod transport;

pub mod prelude {
    //! Commonly used exports.

    pub use crate::chat::{ChatLog, Feedback};
    pub use crate::commands::Commands;
    pub use crate::config::HostConfig;
    pub use crate::entities::{Entities, PeerSet, Replicated};
    pub use crate::entity_type::{Category, EntityType};
    pub use crate::event::SessionEvent;
    pub use crate::net::EntityHeader;
    pub use crate::peer_id::PeerId;
    pub use crate::session::{LobbyId, LobbyInfo, LobbyRules, Session, SessionState};
    pub use crate::transport::{Transport, TransportError, TransportEvent};
}
