//! Helpers shared by the integration tests.

use std::sync::{Arc, Mutex};

use coop_host::loopback::LoopbackNetwork;
use coop_host::Host;
use coop_shared::config::HostConfig;
use coop_shared::event::SessionEvent;
use coop_shared::peer_id::PeerId;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_test_writer()
        .try_init();
}

pub fn peer(n: u32) -> PeerId {
    PeerId::from_account_id(n)
}

/// A host named `P<n>` with peer id `peer(n)` on `network`.
pub fn host(network: &Arc<LoopbackNetwork>, n: u32) -> anyhow::Result<Host> {
    let config = HostConfig {
        player_name: format!("P{n}"),
        ..HostConfig::default()
    };
    Host::loopback(config, network, peer(n))
}

/// Collects every session event a host fires.
#[derive(Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<SessionEvent>>>,
}

impl Recorder {
    pub fn attach(host: &mut Host) -> Self {
        let recorder = Self::default();
        let sink = Arc::clone(&recorder.events);
        host.subscribe(move |e| {
            if let Ok(mut events) = sink.lock() {
                events.push(e.clone());
            }
        });
        recorder
    }

    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn count(&self, pred: impl Fn(&SessionEvent) -> bool) -> usize {
        self.events().iter().filter(|e| pred(e)).count()
    }
}
