//! Session (lobby) state machine.
//!
//! # States
//! - **Offline**: not in a lobby.
//! - **Creating**: a lobby was requested from the transport.
//! - **Joining**: entry into an existing lobby was requested.
//! - **Online**: inside a lobby, either as its owner or as a client.
//!
//! Fetching the public lobby list is an orthogonal flag; browsing does not
//! require being in a lobby.
//!
//! # Completions
//! Every request hands out a ticket stamped with the current epoch, and every
//! state-changing call bumps the epoch. A completion whose ticket no longer
//! matches arrived for an operation that was abandoned in the meantime (the
//! player left, or started another join) and is discarded.
//!
//! # Ownership
//! There is no owner migration. When the tracked owner leaves, the session
//! ends for everyone else.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::entities::PeerSet;
use crate::event::{EventQueue, SessionEvent};
use crate::levels;
use crate::peer_id::PeerId;
use crate::transport::TransportError;

/// Lobby data value for `true`.
pub const TRUE: &str = "True";
/// Lobby data value for `false`.
pub const FALSE: &str = "False";

pub fn encode_flag(value: bool) -> &'static str {
    if value {
        TRUE
    } else {
        FALSE
    }
}

/// Unique lobby identifier. Doubles as the code players share to join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LobbyId(u64);

impl LobbyId {
    pub const INVALID: LobbyId = LobbyId(0);

    pub fn new(id: u64) -> Self {
        LobbyId(id)
    }

    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Parses a lobby code copied from another player.
    pub fn parse_code(code: &str) -> Option<Self> {
        code.trim()
            .parse::<u64>()
            .ok()
            .map(LobbyId)
            .filter(LobbyId::is_valid)
    }
}

impl fmt::Display for LobbyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Snapshot of a lobby as reported by the transport.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LobbyInfo {
    pub id: LobbyId,
    pub owner: PeerId,
    pub members: Vec<PeerId>,
    pub data: HashMap<String, String>,
}

impl Default for LobbyId {
    fn default() -> Self {
        LobbyId::INVALID
    }
}

impl LobbyInfo {
    pub fn get_data(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(|s| s.as_str())
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }
}

bitflags::bitflags! {
    /// Boolean lobby rules, stored in lobby data as `"True"`/`"False"`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LobbyRules: u8 {
        const PVP = 1 << 0;
        const CHEATS = 1 << 1;
        const MODS = 1 << 2;
        const HEAL_BOSSES = 1 << 3;
    }
}

impl LobbyRules {
    /// Lobby data key of each rule.
    pub const KEYS: [(LobbyRules, &'static str); 4] = [
        (LobbyRules::PVP, "pvp"),
        (LobbyRules::CHEATS, "cheats"),
        (LobbyRules::MODS, "mods"),
        (LobbyRules::HEAL_BOSSES, "heal-bosses"),
    ];

    pub fn from_key(key: &str) -> Option<Self> {
        Self::KEYS.iter().find(|(_, k)| *k == key).map(|(r, _)| *r)
    }

    /// Reads the rules back out of lobby data. Missing keys count as off.
    pub fn from_data(data: &HashMap<String, String>) -> Self {
        let mut rules = LobbyRules::empty();
        for (rule, key) in Self::KEYS {
            rules.set(rule, data.get(key).map(String::as_str) == Some(TRUE));
        }
        rules
    }
}

/// Static session parameters, derived from the host config.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub lobby_name: String,
    pub marker_key: String,
    pub foreign_marker_keys: Vec<String>,
    pub default_rules: LobbyRules,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            lobby_name: "Player's Lobby".to_string(),
            marker_key: "coop".to_string(),
            foreign_marker_keys: vec!["mk_lobby".to_string()],
            default_rules: LobbyRules::PVP | LobbyRules::MODS | LobbyRules::HEAL_BOSSES,
        }
    }
}

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Offline,
    Creating,
    Joining(LobbyId),
    Online(LobbyId),
}

/// Ticket of an in-flight create or join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    epoch: u64,
}

/// Ticket of an in-flight lobby list request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    epoch: u64,
    generation: u64,
}

/// Result of applying a create or join completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The session is now online.
    Entered(LobbyId),
    /// The request failed and the session is offline again.
    Failed,
    /// The lobby was foreign and has already been left.
    Foreign(LobbyId),
    /// The ticket was outdated. `orphan` is a lobby the transport entered on
    /// our behalf that nobody wants anymore.
    Stale { orphan: Option<LobbyId> },
}

/// Side effects a leave asks of the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LeaveOutcome {
    /// Lobby whose transport resources must be released.
    pub lobby: Option<LobbyId>,
    /// The player should be sent back to the main menu.
    pub return_to_menu: bool,
}

impl LeaveOutcome {
    pub fn is_noop(&self) -> bool {
        self.lobby.is_none() && !self.return_to_menu
    }
}

/// Outcome of a join request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinStart {
    /// Already in the requested lobby; nothing happened.
    AlreadyInLobby,
    Started { ticket: Ticket, left: LeaveOutcome },
}

/// The one multiplayer session of a host.
pub struct Session {
    settings: SessionSettings,
    local: PeerId,
    state: SessionState,
    /// Last observed owner, kept to detect the owner's exit.
    owner: PeerId,
    is_owner: bool,
    members: Vec<PeerId>,
    data: HashMap<String, String>,
    fetching: bool,
    epoch: u64,
    fetch_generation: u64,
    /// Label of the current level.
    level: String,
    /// Data written locally that the transport has not seen yet.
    outbox: Vec<(String, String)>,
    events: EventQueue<SessionEvent>,
}

impl Session {
    pub fn new(local: PeerId, settings: SessionSettings) -> Self {
        Self {
            settings,
            local,
            state: SessionState::Offline,
            owner: PeerId::NIL,
            is_owner: false,
            members: Vec::new(),
            data: HashMap::new(),
            fetching: false,
            epoch: 0,
            fetch_generation: 0,
            level: levels::display_name(levels::MAIN_MENU).to_string(),
            outbox: Vec::new(),
            events: EventQueue::default(),
        }
    }

    // ─── Queries ───

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn local_peer(&self) -> PeerId {
        self.local
    }

    pub fn is_online(&self) -> bool {
        matches!(self.state, SessionState::Online(_))
    }

    pub fn is_offline(&self) -> bool {
        self.state == SessionState::Offline
    }

    pub fn is_creating(&self) -> bool {
        self.state == SessionState::Creating
    }

    pub fn is_joining(&self) -> bool {
        matches!(self.state, SessionState::Joining(_))
    }

    pub fn is_fetching(&self) -> bool {
        self.fetching
    }

    /// Lobby we are currently inside.
    pub fn lobby_id(&self) -> Option<LobbyId> {
        match self.state {
            SessionState::Online(id) => Some(id),
            _ => None,
        }
    }

    /// Code other players can use to join, if online.
    pub fn code(&self) -> Option<String> {
        self.lobby_id().map(|id| id.to_string())
    }

    pub fn owner(&self) -> PeerId {
        self.owner
    }

    /// Whether the local player owns the current lobby.
    pub fn is_owner(&self) -> bool {
        self.is_owner
    }

    pub fn members(&self) -> &[PeerId] {
        &self.members
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Whether a member has the given 32-bit account id.
    pub fn contains_account(&self, account_id: u32) -> bool {
        self.members.iter().any(|m| m.account_id() == account_id)
    }

    /// Member at `index`, clamped into the member list.
    pub fn member_at(&self, index: i64) -> Option<PeerId> {
        let last = self.members.len().checked_sub(1)?;
        let i = index.clamp(0, last as i64) as usize;
        self.members.get(i).copied()
    }

    /// Position of the local player in the member list.
    pub fn index_of_local(&self) -> usize {
        self.members.iter().position(|m| *m == self.local).unwrap_or(0)
    }

    pub fn data(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(|s| s.as_str())
    }

    pub fn all_data(&self) -> &HashMap<String, String> {
        &self.data
    }

    pub fn rules(&self) -> LobbyRules {
        LobbyRules::from_data(&self.data)
    }

    pub fn pvp_allowed(&self) -> bool {
        self.data("pvp") == Some(TRUE)
    }

    pub fn cheats_allowed(&self) -> bool {
        self.data("cheats") == Some(TRUE)
    }

    pub fn mods_allowed(&self) -> bool {
        self.data("mods") == Some(TRUE)
    }

    /// Whether bosses must be healed after a player dies.
    pub fn heal_bosses(&self) -> bool {
        self.data("heal-bosses") == Some(TRUE)
    }

    pub fn level(&self) -> &str {
        &self.level
    }

    /// Scales boss health by the number of players.
    ///
    /// Outside a lobby one extra player is assumed.
    pub fn scale_health(&self, health: f32, per_player: f32) -> f32 {
        let extra = match self.lobby_id() {
            Some(_) => self.members.len().saturating_sub(1).min(1),
            None => 1,
        } as f32;
        health * (1.0 + extra * per_player)
    }

    // ─── Create ───

    /// Starts creating a lobby. Returns `None` if a session exists or one is in progress.
    pub fn begin_create(&mut self) -> Option<Ticket> {
        if self.state != SessionState::Offline {
            debug!(state = ?self.state, "Ignoring create request");
            return None;
        }
        debug!("Creating a lobby...");

        self.epoch += 1;
        self.state = SessionState::Creating;
        Some(Ticket { epoch: self.epoch })
    }

    pub fn complete_create(
        &mut self,
        ticket: Ticket,
        result: Result<LobbyInfo, TransportError>,
    ) -> Applied {
        if ticket.epoch != self.epoch || self.state != SessionState::Creating {
            debug!(ticket = ticket.epoch, epoch = self.epoch, "Discarding stale create");
            return Applied::Stale {
                orphan: result.ok().map(|info| info.id),
            };
        }

        let info = match result {
            Ok(info) => info,
            Err(error) => {
                warn!(%error, "Couldn't create a lobby");
                self.state = SessionState::Offline;
                self.events.push(SessionEvent::CreateFailed { error });
                return Applied::Failed;
            }
        };

        let lobby = info.id;
        self.is_owner = true;
        if !self.enter(info) {
            return Applied::Foreign(lobby);
        }

        self.publish(&self.settings.marker_key.clone(), "true");
        self.publish("name", &self.settings.lobby_name.clone());
        self.publish("level", &self.level.clone());
        for (rule, key) in LobbyRules::KEYS {
            self.publish(key, encode_flag(self.settings.default_rules.contains(rule)));
        }

        info!(%lobby, "Lobby created");
        self.events.push(SessionEvent::Created { lobby });
        Applied::Entered(lobby)
    }

    // ─── Join ───

    /// Starts joining `target`, silently leaving the current lobby first.
    pub fn begin_join(&mut self, target: LobbyId) -> JoinStart {
        if self.lobby_id() == Some(target) {
            self.events.push(SessionEvent::AlreadyInLobby { lobby: target });
            return JoinStart::AlreadyInLobby;
        }
        debug!(%target, "Joining a lobby...");

        // leave the previous lobby, but stay in the current scene
        let left = self.leave(false);

        self.epoch += 1;
        self.state = SessionState::Joining(target);
        JoinStart::Started {
            ticket: Ticket { epoch: self.epoch },
            left,
        }
    }

    pub fn complete_join(
        &mut self,
        ticket: Ticket,
        result: Result<LobbyInfo, TransportError>,
    ) -> Applied {
        let target = match self.state {
            SessionState::Joining(target) if ticket.epoch == self.epoch => target,
            _ => {
                debug!(ticket = ticket.epoch, epoch = self.epoch, "Discarding stale join");
                return Applied::Stale {
                    orphan: result.ok().map(|info| info.id),
                };
            }
        };

        let info = match result {
            Ok(info) => info,
            Err(error) => {
                warn!(lobby = %target, %error, "Couldn't join a lobby");
                self.state = SessionState::Offline;
                self.events.push(SessionEvent::JoinFailed { lobby: target, error });
                return Applied::Failed;
            }
        };

        let lobby = info.id;
        self.is_owner = false;
        if !self.enter(info) {
            return Applied::Foreign(lobby);
        }

        info!(%lobby, owner = %self.owner, "Joined lobby");
        self.events.push(SessionEvent::Joined {
            lobby,
            owner: self.owner,
        });
        Applied::Entered(lobby)
    }

    /// Common entry path. Returns false if the lobby turned out to be foreign.
    fn enter(&mut self, info: LobbyInfo) -> bool {
        if info.owner.is_valid() {
            self.owner = info.owner;
        }
        if self.is_owner {
            self.owner = self.local;
        }

        self.state = SessionState::Online(info.id);
        self.members = info.members;
        self.data = info.data;

        let foreign = self
            .settings
            .foreign_marker_keys
            .iter()
            .any(|k| self.data.contains_key(k));
        if foreign {
            warn!(lobby = %info.id, "Entered a lobby of an incompatible build, leaving");
            self.leave(false);
            self.events.push(SessionEvent::ForeignLobby { lobby: info.id });
            return false;
        }
        true
    }

    // ─── Leave ───

    /// Leaves the lobby, or abandons the pending create/join. No-op when offline.
    ///
    /// If the local player is not the owner and `return_to_menu` is set, the
    /// outcome asks the host to load the main menu.
    pub fn leave(&mut self, return_to_menu: bool) -> LeaveOutcome {
        if self.state == SessionState::Offline {
            return LeaveOutcome::default();
        }
        debug!(state = ?self.state, "Leaving the lobby...");

        let lobby = self.lobby_id();
        let was_owner = self.is_owner;

        self.epoch += 1;
        self.state = SessionState::Offline;
        self.is_owner = false;
        self.members.clear();
        self.data.clear();
        self.outbox.clear();

        let outcome = LeaveOutcome {
            lobby,
            return_to_menu: lobby.is_some() && return_to_menu && !was_owner,
        };
        self.events.push(SessionEvent::Left {
            lobby,
            return_to_menu: outcome.return_to_menu,
        });
        outcome
    }

    // ─── Transport notifications ───

    pub fn on_member_joined(&mut self, lobby: LobbyId, peer: PeerId) {
        if self.lobby_id() != Some(lobby) {
            return;
        }
        if !self.members.contains(&peer) {
            self.members.push(peer);
        }
        debug!(%lobby, %peer, "Member joined");
        self.events.push(SessionEvent::MemberJoined { lobby, peer });
    }

    /// Returns the leave outcome when the departing member was the owner.
    pub fn on_member_left(&mut self, lobby: LobbyId, peer: PeerId) -> Option<LeaveOutcome> {
        if self.lobby_id() != Some(lobby) {
            return None;
        }
        self.members.retain(|m| *m != peer);
        debug!(%lobby, %peer, "Member left");
        self.events.push(SessionEvent::MemberLeft { lobby, peer });

        if peer == self.owner && peer != self.local {
            info!(%lobby, owner = %peer, "Lobby owner left");
            self.events.push(SessionEvent::OwnerLeft { lobby, owner: peer });
            return Some(self.leave(true));
        }
        None
    }

    /// Mirrors a data entry changed by the owner.
    pub fn on_data_changed(&mut self, lobby: LobbyId, key: &str, value: &str) {
        if self.lobby_id() == Some(lobby) {
            self.data.insert(key.to_string(), value.to_string());
        }
    }

    /// Records the level label and publishes it if we own the lobby.
    pub fn on_level_loaded(&mut self, scene: &str) {
        self.level = levels::display_name(scene).to_string();
        if self.is_online() && self.is_owner {
            self.publish("level", &self.level.clone());
        }
    }

    // ─── Lobby data ───

    /// Sets a lobby data entry. Only the owner of an online lobby may write.
    pub fn set_data(&mut self, key: &str, value: &str) -> bool {
        if !self.is_online() || !self.is_owner {
            debug!(key, "Only the lobby owner can change lobby data");
            return false;
        }
        self.publish(key, value);
        true
    }

    /// Turns the given rules on or off.
    pub fn set_rule(&mut self, rule: LobbyRules, on: bool) -> bool {
        if !self.is_online() || !self.is_owner {
            return false;
        }
        for (r, key) in LobbyRules::KEYS {
            if rule.contains(r) {
                self.publish(key, encode_flag(on));
            }
        }
        true
    }

    fn publish(&mut self, key: &str, value: &str) {
        self.data.insert(key.to_string(), value.to_string());
        self.outbox.push((key.to_string(), value.to_string()));
    }

    /// Data entries written since the last call, in write order.
    pub fn take_data_updates(&mut self) -> Vec<(String, String)> {
        std::mem::take(&mut self.outbox)
    }

    // ─── Lobby list ───

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.fetch_generation += 1;
        self.fetching = true;
        FetchTicket {
            epoch: self.epoch,
            generation: self.fetch_generation,
        }
    }

    /// Applies a list result. Returns the lobbies carrying our marker key, or
    /// `None` if the request failed or went stale.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<LobbyInfo>, TransportError>,
    ) -> Option<Vec<LobbyInfo>> {
        if ticket.generation != self.fetch_generation {
            debug!("Discarding superseded lobby list");
            return None;
        }
        self.fetching = false;

        if ticket.epoch != self.epoch {
            debug!("Discarding lobby list fetched before the session changed");
            return None;
        }

        let lobbies = match result {
            Ok(lobbies) => lobbies,
            Err(error) => {
                warn!(%error, "Couldn't fetch the lobby list");
                return None;
            }
        };

        let lobbies: Vec<LobbyInfo> = lobbies
            .into_iter()
            .filter(|l| l.has_key(&self.settings.marker_key))
            .filter(|l| !self.settings.foreign_marker_keys.iter().any(|k| l.has_key(k)))
            .collect();

        self.events.push(SessionEvent::LobbyList {
            lobbies: lobbies.clone(),
        });
        Some(lobbies)
    }

    /// Takes all events queued since the last call.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        self.events.drain()
    }
}

impl PeerSet for Session {
    fn contains_peer(&self, id: u64) -> bool {
        self.members.iter().any(|m| m.as_u64() == id)
    }
}
