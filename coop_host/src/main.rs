//! Standalone host binary over the loopback network.
//!
//! Usage:
//!   cargo run -p coop_host --bin host -- [--name Player] [--tick-hz 60] [--config host.json]
//!
//! Console commands:
//!   create         - Create a lobby
//!   join <code>    - Join a lobby by its code
//!   leave          - Leave the lobby
//!   list           - Fetch public lobbies
//!   status         - Show session status
//!   quit           - Shutdown
//!   /<command>     - Chat command, `/help` lists them

use std::env;
use std::io::{BufRead, Write};

use anyhow::Context;
use coop_host::loopback::LoopbackNetwork;
use coop_host::Host;
use coop_shared::config::HostConfig;
use coop_shared::peer_id::PeerId;
use tokio::sync::mpsc;
use tracing::info;

fn parse_args() -> anyhow::Result<HostConfig> {
    let args: Vec<String> = env::args().collect();

    // the config file is the base; flags override it
    let mut cfg = match args.iter().position(|a| a == "--config") {
        Some(i) if i + 1 < args.len() => {
            let path = &args[i + 1];
            let text = std::fs::read_to_string(path).with_context(|| format!("read {path}"))?;
            HostConfig::from_json_str(&text).with_context(|| format!("parse {path}"))?
        }
        _ => HostConfig::default(),
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--name" if i + 1 < args.len() => {
                cfg.player_name = args[i + 1].clone();
                i += 2;
            }
            "--tick-hz" if i + 1 < args.len() => {
                cfg.tick_hz = args[i + 1].parse().unwrap_or(60);
                i += 2;
            }
            _ => i += 1,
        }
    }
    Ok(cfg)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cfg = parse_args()?;
    let tick_hz = cfg.tick_hz.max(1);
    info!(name = %cfg.player_name, tick_hz, "Starting host");

    let network = LoopbackNetwork::new();
    let local = PeerId::from_account_id(rand::random::<u32>().max(1));
    let mut host = Host::loopback(cfg, &network, local).context("create host")?;

    // Set up console input channel.
    let (console_tx, console_rx) = mpsc::channel::<String>(32);
    host.set_console_input(console_rx);

    // Spawn stdin reader thread.
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        loop {
            print!("> ");
            let _ = stdout.flush();
            let mut line = String::new();
            match stdin.lock().read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let line = line.trim().to_string();
            if !line.is_empty() && console_tx.blocking_send(line).is_err() {
                break;
            }
        }
    });

    println!("Host ready. Type 'create' to open a lobby, '/help' for commands, 'quit' to exit.");
    println!();

    let tick_interval = std::time::Duration::from_secs_f32(1.0 / tick_hz as f32);
    let mut next_tick = tokio::time::Instant::now();

    while !host.quit_requested() {
        host.step();

        // scenes load instantly here
        if let Some(scene) = host.context_mut().game.take_pending_load() {
            host.on_level_loaded(&scene);
        }

        for line in host.context_mut().chat.take_unread() {
            println!("{line}");
        }

        next_tick += tick_interval;
        tokio::time::sleep_until(next_tick).await;
    }

    host.leave_lobby(false);
    Ok(())
}
