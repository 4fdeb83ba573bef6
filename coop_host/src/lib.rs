//! `coop_host`
//!
//! Host-side systems:
//! - The host context and its sequencing loop
//! - Gameplay chat commands
//! - Entity providers
//! - In-memory loopback matchmaking for tests and local play

pub mod commands;
pub mod content;
pub mod game;
pub mod host;
pub mod loopback;

pub use host::{Host, HostEvent};
