//! Host context.
//!
//! One [`Host`] owns everything a player's process needs for multiplayer: the
//! session, the entity registry, the chat log and the command set. Nothing is
//! global, so several hosts can live side by side in one test.
//!
//! The host is also the only place where state changes. Transport requests run
//! on spawned tasks; their results come back as [`HostEvent`]s on the host's
//! channel together with the transport's own notifications, and are applied in
//! arrival order by [`Host::step`] or [`Host::settle`].

use std::sync::Arc;

use anyhow::Context as _;
use bytes::Bytes;
use coop_shared::chat::{colored, ChatLog, Feedback, GREEN, ORANGE, RED};
use coop_shared::commands::Commands;
use coop_shared::config::HostConfig;
use coop_shared::entities::{Entities, Replicated};
use coop_shared::entity_type::EntityType;
use coop_shared::event::{SessionEvent, Subscribers};
use coop_shared::levels;
use coop_shared::peer_id::PeerId;
use coop_shared::session::{
    Applied, FetchTicket, JoinStart, LeaveOutcome, LobbyId, LobbyInfo, Session, SessionState,
    Ticket,
};
use coop_shared::transport::{Transport, TransportError, TransportEvent};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::content::{self, World};
use crate::game::GameState;
use crate::loopback::LoopbackNetwork;

/// Everything that reaches the host from outside its own call stack.
#[derive(Debug)]
pub enum HostEvent {
    Created {
        ticket: Ticket,
        result: Result<LobbyInfo, TransportError>,
    },
    Joined {
        ticket: Ticket,
        result: Result<LobbyInfo, TransportError>,
    },
    LobbyList {
        ticket: FetchTicket,
        result: Result<Vec<LobbyInfo>, TransportError>,
    },
    Transport(TransportEvent),
}

/// Creates the channel a host and its transport share.
pub fn channel() -> (
    mpsc::UnboundedSender<HostEvent>,
    mpsc::UnboundedReceiver<HostEvent>,
) {
    mpsc::unbounded_channel()
}

/// State handed to chat commands.
pub struct Context {
    pub session: Session,
    pub entities: Entities,
    pub chat: ChatLog,
    pub game: GameState,
    pub transport: Arc<dyn Transport>,
    /// Objects spawned locally during this session.
    pub spawned: Vec<Box<dyn Replicated>>,
    /// Encoded headers of spawned objects, waiting to be sent to peers.
    pub outbound: Vec<Bytes>,
}

impl Context {
    /// Builds an object with a fresh network id.
    ///
    /// Returns `None` if the provider declined; the id is consumed anyway.
    pub fn spawn(&mut self, ty: EntityType) -> Option<u64> {
        let id = self.entities.next_id(&self.session);
        let entity = self.entities.get(id, ty)?;

        debug!(id, ?ty, "Spawned entity");
        self.outbound.push(entity.header().encode());
        self.spawned.push(entity);
        Some(id)
    }

    pub fn peer_name(&self, peer: PeerId) -> String {
        self.transport.peer_name(peer)
    }
}

impl Feedback for Context {
    fn receive(&mut self, line: &str) {
        self.chat.receive(line);
    }
}

/// A player's multiplayer context.
pub struct Host {
    config: HostConfig,
    commands: Commands<Context>,
    ctx: Context,
    world: Arc<World>,
    events_tx: mpsc::UnboundedSender<HostEvent>,
    events_rx: mpsc::UnboundedReceiver<HostEvent>,
    /// Requests whose completion has not been applied yet.
    in_flight: usize,
    subscribers: Subscribers<SessionEvent>,
    console_rx: Option<mpsc::Receiver<String>>,
    quit: bool,
}

impl Host {
    /// Creates a host over `transport`, which must report to `events_tx`.
    pub fn new(
        config: HostConfig,
        transport: Arc<dyn Transport>,
        events_tx: mpsc::UnboundedSender<HostEvent>,
        events_rx: mpsc::UnboundedReceiver<HostEvent>,
    ) -> anyhow::Result<Self> {
        let world = Arc::new(World::default());
        let mut entities = Entities::new();
        content::register_all(&mut entities, &world);
        entities
            .verify_complete(EntityType::ALL)
            .context("entity providers")?;

        let mut commands = Commands::new();
        crate::commands::register_all(&mut commands);

        let local = transport.local_peer();
        let session = Session::new(local, config.session_settings());
        info!(%local, name = %config.player_name, commands = commands.len(), "Host ready");

        Ok(Self {
            config,
            commands,
            ctx: Context {
                session,
                entities,
                chat: ChatLog::default(),
                game: GameState::default(),
                transport,
                spawned: Vec::new(),
                outbound: Vec::new(),
            },
            world,
            events_tx,
            events_rx,
            in_flight: 0,
            subscribers: Subscribers::default(),
            console_rx: None,
            quit: false,
        })
    }

    /// Creates a host connected to a loopback network.
    pub fn loopback(
        config: HostConfig,
        network: &Arc<LoopbackNetwork>,
        peer: PeerId,
    ) -> anyhow::Result<Self> {
        let (tx, rx) = channel();
        let transport = network.connect(peer, &config.player_name, tx.clone());
        Self::new(config, Arc::new(transport), tx, rx)
    }

    // ─── Accessors ───

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.ctx.session
    }

    pub fn entities(&self) -> &Entities {
        &self.ctx.entities
    }

    pub fn chat(&self) -> &ChatLog {
        &self.ctx.chat
    }

    pub fn game(&self) -> &GameState {
        &self.ctx.game
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.ctx
    }

    pub fn commands(&self) -> &Commands<Context> {
        &self.commands
    }

    pub fn local_peer(&self) -> PeerId {
        self.ctx.session.local_peer()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Takes the encoded headers of objects spawned since the last call.
    pub fn take_outbound(&mut self) -> Vec<Bytes> {
        std::mem::take(&mut self.ctx.outbound)
    }

    /// Boss health scaled by the number of players.
    pub fn scale_health(&self, health: f32) -> f32 {
        self.ctx
            .session
            .scale_health(health, self.config.boss_health_per_player)
    }

    pub fn subscribe<F>(&mut self, f: F)
    where
        F: FnMut(&SessionEvent) + Send + 'static,
    {
        self.subscribers.subscribe(f);
    }

    /// Sets the console input receiver.
    pub fn set_console_input(&mut self, rx: mpsc::Receiver<String>) {
        self.console_rx = Some(rx);
    }

    // ─── Session requests ───

    /// Asks the transport for a new lobby. Returns false if the session is busy.
    pub fn create_lobby(&mut self) -> bool {
        let Some(ticket) = self.ctx.session.begin_create() else {
            return false;
        };

        let transport = Arc::clone(&self.ctx.transport);
        let tx = self.events_tx.clone();
        let max_members = self.config.max_members;
        self.in_flight += 1;
        tokio::spawn(async move {
            let result = transport.create_lobby(max_members).await;
            let _ = tx.send(HostEvent::Created { ticket, result });
        });

        self.flush();
        true
    }

    /// Joins `lobby`, leaving the current one first. Returns false if already there.
    pub fn join_lobby(&mut self, lobby: LobbyId) -> bool {
        let (ticket, left) = match self.ctx.session.begin_join(lobby) {
            JoinStart::AlreadyInLobby => {
                self.flush();
                return false;
            }
            JoinStart::Started { ticket, left } => (ticket, left),
        };
        self.release(left);

        let transport = Arc::clone(&self.ctx.transport);
        let tx = self.events_tx.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            let result = transport.join_lobby(lobby).await;
            let _ = tx.send(HostEvent::Joined { ticket, result });
        });

        self.flush();
        true
    }

    /// Joins the lobby behind a code shared by another player.
    pub fn join_by_code(&mut self, code: &str) -> bool {
        match LobbyId::parse_code(code) {
            Some(lobby) => self.join_lobby(lobby),
            None => {
                self.ctx.receive(&colored(RED, "Failed to parse the lobby code."));
                false
            }
        }
    }

    pub fn leave_lobby(&mut self, return_to_menu: bool) {
        let outcome = self.ctx.session.leave(return_to_menu);
        self.release(outcome);
        self.flush();
    }

    /// Requests the public lobby list; the result arrives as [`SessionEvent::LobbyList`].
    pub fn fetch_lobbies(&mut self) {
        let ticket = self.ctx.session.begin_fetch();

        let transport = Arc::clone(&self.ctx.transport);
        let tx = self.events_tx.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            let result = transport.request_lobby_list().await;
            let _ = tx.send(HostEvent::LobbyList { ticket, result });
        });
    }

    // ─── Game notifications ───

    pub fn on_level_loaded(&mut self, scene: &str) {
        self.ctx.game.set_scene(scene);
        self.world.on_level_loaded(scene);

        if scene == levels::MAIN_MENU {
            self.on_main_menu_loaded();
            return;
        }
        self.ctx.session.on_level_loaded(scene);
        self.flush();
    }

    /// Leaving to the menu ends the session without another scene change.
    pub fn on_main_menu_loaded(&mut self) {
        self.ctx.session.on_level_loaded(levels::MAIN_MENU);
        self.leave_lobby(false);
    }

    // ─── Input ───

    /// Runs a chat line as a command, or sends it to the lobby if it is not one.
    pub fn submit(&mut self, line: &str) -> bool {
        let handled = self.commands.handle(line, &mut self.ctx);
        if !handled {
            if let Some(lobby) = self.ctx.session.lobby_id() {
                self.ctx.transport.send_chat(lobby, line.trim());
            }
        }
        self.flush();
        handled
    }

    /// Executes a console line. Lobby verbs are handled here; anything else
    /// goes through [`Host::submit`].
    pub fn exec_console(&mut self, line: &str) {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            [] => {}
            ["create"] => {
                if !self.create_lobby() {
                    self.ctx.receive(&colored(RED, "Leave the current lobby first."));
                }
            }
            ["join", code] => {
                self.join_by_code(code);
            }
            ["leave"] => self.leave_lobby(true),
            ["list"] => self.fetch_lobbies(),
            ["status"] => {
                let session = &self.ctx.session;
                let status = format!(
                    "{:?}, {} member(s), owner {}, level {}",
                    session.state(),
                    session.member_count(),
                    session.owner(),
                    session.level()
                );
                self.ctx.receive(&status);
            }
            ["quit" | "exit"] => {
                info!("Shutting down");
                self.quit = true;
            }
            _ => {
                self.submit(line);
            }
        }
    }

    /// Whether the console asked the process to exit.
    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    // ─── Sequencing ───

    /// Applies console input and every event that has already arrived.
    pub fn step(&mut self) {
        let lines: Vec<String> = if let Some(ref mut rx) = self.console_rx {
            let mut collected = Vec::new();
            while let Ok(line) = rx.try_recv() {
                collected.push(line);
            }
            collected
        } else {
            Vec::new()
        };
        for line in lines {
            self.exec_console(&line);
        }

        self.flush();
        // flush per event so feedback keeps arrival order
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply(event);
            self.flush();
        }
    }

    /// Steps until every request this host made has completed.
    pub async fn settle(&mut self) {
        self.step();
        while self.in_flight > 0 {
            let Some(event) = self.events_rx.recv().await else {
                break;
            };
            self.apply(event);
            self.flush();
            self.step();
        }
    }

    fn apply(&mut self, event: HostEvent) {
        match event {
            HostEvent::Created { ticket, result } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                let applied = self.ctx.session.complete_create(ticket, result);
                self.entered(applied);
            }
            HostEvent::Joined { ticket, result } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                let applied = self.ctx.session.complete_join(ticket, result);
                self.entered(applied);
            }
            HostEvent::LobbyList { ticket, result } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                self.ctx.session.complete_fetch(ticket, result);
            }
            HostEvent::Transport(event) => self.on_transport_event(event),
        }
    }

    fn entered(&mut self, applied: Applied) {
        match applied {
            Applied::Entered(lobby) => debug!(%lobby, "Session online"),
            Applied::Failed => {}
            Applied::Foreign(lobby) => self.release(LeaveOutcome {
                lobby: Some(lobby),
                return_to_menu: false,
            }),
            Applied::Stale { orphan: Some(lobby) } => {
                let state = self.ctx.session.state();
                let wanted =
                    state == SessionState::Online(lobby) || state == SessionState::Joining(lobby);
                if !wanted {
                    info!(%lobby, "Leaving lobby entered by an abandoned request");
                    self.ctx.transport.leave_lobby(lobby);
                }
            }
            Applied::Stale { orphan: None } => {}
        }
    }

    fn on_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::MemberJoined { lobby, peer } => {
                self.ctx.session.on_member_joined(lobby, peer);
            }
            TransportEvent::MemberLeft { lobby, peer } => {
                if let Some(outcome) = self.ctx.session.on_member_left(lobby, peer) {
                    self.release(outcome);
                }
            }
            TransportEvent::DataChanged { lobby, key, value } => {
                self.ctx.session.on_data_changed(lobby, &key, &value);
            }
            TransportEvent::Chat { lobby, from, text } => {
                if self.ctx.session.lobby_id() == Some(lobby) {
                    let name = self.ctx.peer_name(from);
                    self.ctx.chat.receive_from(from, &name, &text);
                }
            }
        }
    }

    /// Carries out the side effects of a leave.
    fn release(&mut self, outcome: LeaveOutcome) {
        if outcome.is_noop() {
            return;
        }
        if let Some(lobby) = outcome.lobby {
            info!(%lobby, "Releasing lobby resources");
            self.ctx.transport.leave_lobby(lobby);
            self.ctx.transport.close_channels();
        }
        self.ctx.entities.reset_ids();
        self.ctx.spawned.clear();
        self.ctx.outbound.clear();

        if outcome.return_to_menu {
            self.ctx.game.request_load(levels::MAIN_MENU);
        }
    }

    /// Pushes pending lobby data to the transport and reports session events.
    fn flush(&mut self) {
        if let Some(lobby) = self.ctx.session.lobby_id() {
            for (key, value) in self.ctx.session.take_data_updates() {
                self.ctx.transport.set_lobby_data(lobby, &key, &value);
            }
        }

        for event in self.ctx.session.drain_events() {
            if let Some(line) = self.describe(&event) {
                self.ctx.chat.receive(&line);
            }
            self.subscribers.fire(&event);
        }
    }

    fn describe(&self, event: &SessionEvent) -> Option<String> {
        let line = match event {
            SessionEvent::Created { lobby } => {
                colored(GREEN, &format!("Lobby created. Code: {lobby}"))
            }
            SessionEvent::Joined { owner, .. } => colored(
                GREEN,
                &format!("Joined the lobby of {}.", self.ctx.peer_name(*owner)),
            ),
            SessionEvent::CreateFailed { error } => {
                warn!(%error, "Lobby creation failed");
                colored(RED, &format!("Couldn't create a lobby: {error}."))
            }
            SessionEvent::JoinFailed { error, .. } => {
                colored(RED, &format!("Couldn't connect to the lobby: {error}."))
            }
            SessionEvent::AlreadyInLobby { .. } => {
                colored(ORANGE, "You are already in this lobby.")
            }
            SessionEvent::Left { lobby: Some(_), .. } => colored(ORANGE, "Left the lobby."),
            SessionEvent::Left { lobby: None, .. } => return None,
            SessionEvent::OwnerLeft { owner, .. } => colored(
                RED,
                &format!("{} closed the lobby.", self.ctx.peer_name(*owner)),
            ),
            SessionEvent::ForeignLobby { .. } => colored(
                RED,
                "This lobby was created by an incompatible build of the mod.",
            ),
            SessionEvent::MemberJoined { peer, .. } => colored(
                GREEN,
                &format!("{} joined.", self.ctx.peer_name(*peer)),
            ),
            SessionEvent::MemberLeft { peer, .. } => colored(
                ORANGE,
                &format!("{} left.", self.ctx.peer_name(*peer)),
            ),
            SessionEvent::LobbyList { lobbies } => {
                format!("Found {} lobbies.", lobbies.len())
            }
        };
        Some(line)
    }
}
