//! MIDI Router Daemon
//!
//! Runs unattended with no arguments: loads the configuration, binds every
//! MIDI port it can find, routes until interrupted and releases all ports
//! on the way out.

mod midi_io;
mod process;
mod settings;

use std::sync::Arc;

use anyhow::Context;
use midi_detect::{PortScanner, ScannerConfig};
use midi_mux::{
    restart_channel, run_restart_task, MidiTransport, PortManager, ProcessSupervisor,
    ReinitSignal, RunLoop,
};
use tracing::{info, warn};

use midi_io::MidirTransport;
use process::SysinfoSupervisor;

const CLIENT_NAME: &str = "midimux";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "midimux=debug,midi_mux=info,midi_detect=info,midi_protocol=info".into()
            }),
        )
        .init();

    info!("Starting midimux {}", env!("CARGO_PKG_VERSION"));

    let (config, source) = settings::load().context("loading configuration")?;
    info!("Configuration from {}", source);

    log_visible_ports();

    let signal = Arc::new(ReinitSignal::new());
    let (restart, requests) = restart_channel();
    let supervisor: Arc<dyn ProcessSupervisor> = Arc::new(SysinfoSupervisor::new());
    let restart_task = tokio::spawn(run_restart_task(
        requests,
        supervisor,
        config.restart.clone(),
    ));

    let transport: Arc<dyn MidiTransport> = Arc::new(MidirTransport::new(CLIENT_NAME));
    let mut manager = PortManager::new(config, transport, Arc::clone(&signal), restart)
        .context("invalid router configuration")?;
    manager.start();

    #[cfg(unix)]
    spawn_hangup_listener(Arc::clone(&signal))?;

    let manager = RunLoop::new(manager).run(shutdown_signal()).await;
    drop(manager);

    // The manager held the last restart handles; wait for a restart in flight
    if let Err(e) = restart_task.await {
        warn!("Restart task failed: {}", e);
    }

    info!("midimux stopped");
    Ok(())
}

/// Log every MIDI port the backend can see
fn log_visible_ports() {
    let scanner = PortScanner::with_config(ScannerConfig {
        client_name: format!("{}-scan", CLIENT_NAME),
        ..Default::default()
    });
    if let Err(e) = scanner.enumerate_ports() {
        warn!("Could not enumerate MIDI ports: {}", e);
    }
}

/// SIGHUP requests a reinit pass, like the emergency trigger does
#[cfg(unix)]
fn spawn_hangup_listener(signal: Arc<ReinitSignal>) -> anyhow::Result<()> {
    use tokio::signal::unix::{signal as unix_signal, SignalKind};

    let mut hangup = unix_signal(SignalKind::hangup()).context("installing SIGHUP handler")?;
    tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            info!("SIGHUP received, requesting reinit");
            signal.raise();
        }
    });
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Ctrl-C handler failed: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                warn!("SIGTERM handler failed: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
