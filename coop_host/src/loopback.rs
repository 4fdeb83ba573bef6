//! In-memory matchmaking service.
//!
//! Several hosts in one process share a [`LoopbackNetwork`]; each connects
//! with its own [`LoopbackTransport`]. Membership changes, data changes and
//! chat are pushed to the other members' host channels the moment they
//! happen, so a test can drive multi-peer scenarios deterministically.
//!
//! # Failure injection
//! [`LoopbackNetwork::fail_next_create`] and [`LoopbackNetwork::fail_next_join`]
//! make the next request of that kind fail with the given error.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use coop_shared::peer_id::PeerId;
use coop_shared::session::{LobbyId, LobbyInfo};
use coop_shared::transport::{Transport, TransportError, TransportEvent};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::host::HostEvent;

/// A lobby as the service stores it.
#[derive(Debug, Clone)]
struct Lobby {
    id: LobbyId,
    owner: PeerId,
    members: Vec<PeerId>,
    max_members: usize,
    data: HashMap<String, String>,
}

impl Lobby {
    fn new(id: LobbyId, owner: PeerId, max_members: u8) -> Self {
        Self {
            id,
            owner,
            members: vec![owner],
            max_members: (max_members as usize).max(1),
            data: HashMap::new(),
        }
    }

    fn is_full(&self) -> bool {
        self.members.len() >= self.max_members
    }

    fn is_member(&self, peer: PeerId) -> bool {
        self.members.contains(&peer)
    }

    /// Removes a member; ownership passes to the oldest remaining member.
    fn remove_member(&mut self, peer: PeerId) -> bool {
        let before = self.members.len();
        self.members.retain(|m| *m != peer);
        if self.members.len() == before {
            return false;
        }
        if self.owner == peer {
            if let Some(first) = self.members.first() {
                self.owner = *first;
            }
        }
        true
    }

    fn info(&self) -> LobbyInfo {
        LobbyInfo {
            id: self.id,
            owner: self.owner,
            members: self.members.clone(),
            data: self.data.clone(),
        }
    }
}

struct Peer {
    name: String,
    events: mpsc::UnboundedSender<HostEvent>,
}

#[derive(Default)]
struct NetworkState {
    lobbies: HashMap<LobbyId, Lobby>,
    peers: HashMap<PeerId, Peer>,
    fail_create: Option<TransportError>,
    fail_join: Option<TransportError>,
}

impl NetworkState {
    /// Sends an event to every member of `lobby` except `skip`.
    fn broadcast(&self, lobby: &Lobby, skip: Option<PeerId>, event: TransportEvent) {
        for member in lobby.members.iter().filter(|m| Some(**m) != skip) {
            if let Some(peer) = self.peers.get(member) {
                // a closed channel means that host is gone; nothing to notify
                let _ = peer.events.send(HostEvent::Transport(event.clone()));
            }
        }
    }

    fn unused_lobby_id(&self) -> LobbyId {
        loop {
            let id = LobbyId::new(rand::random::<u64>());
            if id.is_valid() && !self.lobbies.contains_key(&id) {
                return id;
            }
        }
    }
}

/// Shared matchmaking state.
#[derive(Default)]
pub struct LoopbackNetwork {
    state: Mutex<NetworkState>,
}

impl LoopbackNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn state(&self) -> MutexGuard<'_, NetworkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a player and returns its transport. Notifications for the
    /// player are sent to `events`.
    pub fn connect(
        self: &Arc<Self>,
        peer: PeerId,
        name: &str,
        events: mpsc::UnboundedSender<HostEvent>,
    ) -> LoopbackTransport {
        self.state().peers.insert(
            peer,
            Peer {
                name: name.to_string(),
                events,
            },
        );
        debug!(%peer, name, "Peer connected to loopback network");
        LoopbackTransport {
            network: Arc::clone(self),
            local: peer,
            channel_closes: AtomicUsize::new(0),
        }
    }

    pub fn fail_next_create(&self, error: TransportError) {
        self.state().fail_create = Some(error);
    }

    pub fn fail_next_join(&self, error: TransportError) {
        self.state().fail_join = Some(error);
    }

    /// Snapshot of a lobby.
    pub fn lobby(&self, id: LobbyId) -> Option<LobbyInfo> {
        self.state().lobbies.get(&id).map(Lobby::info)
    }

    pub fn lobby_count(&self) -> usize {
        self.state().lobbies.len()
    }

    /// Writes lobby data as if the owner had, bypassing the ownership check.
    pub fn set_lobby_data(&self, id: LobbyId, key: &str, value: &str) {
        let mut state = self.state();
        let Some(lobby) = state.lobbies.get_mut(&id) else {
            return;
        };
        lobby.data.insert(key.to_string(), value.to_string());
        let lobby = lobby.clone();
        state.broadcast(
            &lobby,
            None,
            TransportEvent::DataChanged {
                lobby: id,
                key: key.to_string(),
                value: value.to_string(),
            },
        );
    }

    /// Adds a lobby directly, e.g. one created by an incompatible build.
    pub fn insert_lobby(&self, owner: PeerId, data: &[(&str, &str)]) -> LobbyId {
        let mut state = self.state();
        let id = state.unused_lobby_id();
        let mut lobby = Lobby::new(id, owner, u8::MAX);
        lobby.data = data
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        state.lobbies.insert(id, lobby);
        id
    }

    fn leave(&self, id: LobbyId, peer: PeerId) {
        let mut state = self.state();
        let Some(lobby) = state.lobbies.get_mut(&id) else {
            return;
        };
        if !lobby.remove_member(peer) {
            return;
        }
        if lobby.members.is_empty() {
            state.lobbies.remove(&id);
            info!(lobby = %id, "Lobby closed");
            return;
        }
        let lobby = lobby.clone();
        state.broadcast(&lobby, None, TransportEvent::MemberLeft { lobby: id, peer });
    }
}

/// One player's view of the [`LoopbackNetwork`].
pub struct LoopbackTransport {
    network: Arc<LoopbackNetwork>,
    local: PeerId,
    channel_closes: AtomicUsize,
}

impl LoopbackTransport {
    /// How many times the host released its channels.
    pub fn channel_closes(&self) -> usize {
        self.channel_closes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    fn local_peer(&self) -> PeerId {
        self.local
    }

    fn peer_name(&self, peer: PeerId) -> String {
        self.network
            .state()
            .peers
            .get(&peer)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| peer.to_string())
    }

    async fn create_lobby(&self, max_members: u8) -> Result<LobbyInfo, TransportError> {
        tokio::task::yield_now().await;

        let mut state = self.network.state();
        if let Some(error) = state.fail_create.take() {
            return Err(error);
        }
        let id = state.unused_lobby_id();
        let lobby = Lobby::new(id, self.local, max_members);
        let info = lobby.info();
        state.lobbies.insert(id, lobby);
        info!(lobby = %id, owner = %self.local, "Lobby opened");
        Ok(info)
    }

    async fn join_lobby(&self, id: LobbyId) -> Result<LobbyInfo, TransportError> {
        tokio::task::yield_now().await;

        let mut state = self.network.state();
        if let Some(error) = state.fail_join.take() {
            return Err(error);
        }
        let local = self.local;
        let lobby = state.lobbies.get_mut(&id).ok_or(TransportError::DoesntExist)?;
        if lobby.is_member(local) {
            return Ok(lobby.info());
        }
        if lobby.is_full() {
            return Err(TransportError::Full);
        }
        lobby.members.push(local);

        let lobby = lobby.clone();
        state.broadcast(&lobby, Some(local), TransportEvent::MemberJoined { lobby: id, peer: local });
        Ok(lobby.info())
    }

    async fn request_lobby_list(&self) -> Result<Vec<LobbyInfo>, TransportError> {
        tokio::task::yield_now().await;

        let state = self.network.state();
        let mut lobbies: Vec<LobbyInfo> = state.lobbies.values().map(Lobby::info).collect();
        lobbies.sort_by_key(|l| l.id.as_u64());
        Ok(lobbies)
    }

    fn leave_lobby(&self, lobby: LobbyId) {
        self.network.leave(lobby, self.local);
    }

    fn set_lobby_data(&self, id: LobbyId, key: &str, value: &str) {
        let owner = self.network.state().lobbies.get(&id).map(|l| l.owner);
        if owner == Some(self.local) {
            self.network.set_lobby_data(id, key, value);
        }
    }

    fn send_chat(&self, id: LobbyId, text: &str) {
        let state = self.network.state();
        if let Some(lobby) = state.lobbies.get(&id).filter(|l| l.is_member(self.local)) {
            state.broadcast(
                lobby,
                None,
                TransportEvent::Chat {
                    lobby: id,
                    from: self.local,
                    text: text.to_string(),
                },
            );
        }
    }

    fn close_channels(&self) {
        self.channel_closes.fetch_add(1, Ordering::Relaxed);
    }
}
