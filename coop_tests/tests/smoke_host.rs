use coop_host::loopback::LoopbackNetwork;
use coop_tests::{host, init_tracing};

/// Smoke test: a host can step through console input without a session.
#[tokio::test]
async fn host_runs_console_lines() -> anyhow::Result<()> {
    init_tracing();
    let network = LoopbackNetwork::new();
    let mut host = host(&network, 1)?;

    let (tx, rx) = tokio::sync::mpsc::channel(8);
    host.set_console_input(rx);
    tx.send("status".to_string()).await?;
    tx.send("/help".to_string()).await?;
    tx.send("create".to_string()).await?;
    host.step();
    host.settle().await;

    assert!(host.session().is_online());
    assert!(host.chat().lines().any(|l| l.starts_with("Offline")));
    assert!(host.chat().lines().any(|l| l.starts_with("[14]/difficulty")));

    tx.send("quit".to_string()).await?;
    host.step();
    assert!(host.quit_requested());
    Ok(())
}

/// Smoke test: boss health scales with the lobby size, and offline counts as company.
#[tokio::test]
async fn boss_health_scales() -> anyhow::Result<()> {
    let network = LoopbackNetwork::new();
    let mut a = host(&network, 1)?;
    let mut b = host(&network, 2)?;
    let offline = a.scale_health(100.0);
    assert!(offline > 100.0);

    a.create_lobby();
    a.settle().await;
    assert_eq!(a.scale_health(100.0), 100.0);

    b.join_lobby(a.session().lobby_id().expect("online"));
    b.settle().await;
    a.step();
    assert_eq!(a.scale_health(100.0), offline);
    assert_eq!(b.scale_health(100.0), offline);
    Ok(())
}
