//! Supervised process restart
//!
//! The emergency handler only posts a request; the restart itself runs on
//! a dedicated task so the quiescence delay never stalls a MIDI callback
//! thread. Requests are handled one at a time in arrival order.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::RestartConfig;
use crate::error::SupervisorError;

/// Process-supervision seam
pub trait ProcessSupervisor: Send + Sync {
    /// PIDs of every process whose name contains `name`
    fn find_processes(&self, name: &str) -> Vec<u32>;

    fn kill(&self, pid: u32) -> Result<(), SupervisorError>;

    /// Launch `executable`, returning its PID
    fn spawn(&self, executable: &Path) -> Result<u32, SupervisorError>;
}

/// Commands accepted by the restart task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorCommand {
    /// Kill every matching process, wait, relaunch
    RestartProcess,
}

/// Cloneable sender side used by the emergency handler
#[derive(Debug, Clone)]
pub struct RestartHandle {
    tx: mpsc::UnboundedSender<SupervisorCommand>,
}

impl RestartHandle {
    /// Queue a restart; returns false once the restart task has stopped
    pub fn request_restart(&self) -> bool {
        self.tx.send(SupervisorCommand::RestartProcess).is_ok()
    }
}

/// Create the request channel for [`run_restart_task`]
pub fn restart_channel() -> (RestartHandle, mpsc::UnboundedReceiver<SupervisorCommand>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (RestartHandle { tx }, rx)
}

/// What one restart did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartOutcome {
    pub killed: usize,
    pub spawned_pid: Option<u32>,
}

/// Run the restart task until every [`RestartHandle`] is dropped
pub async fn run_restart_task(
    mut rx: mpsc::UnboundedReceiver<SupervisorCommand>,
    supervisor: Arc<dyn ProcessSupervisor>,
    target: RestartConfig,
) {
    info!("Restart task starting for '{}'", target.process_name);

    while let Some(cmd) = rx.recv().await {
        match cmd {
            SupervisorCommand::RestartProcess => {
                let outcome = restart_process(&supervisor, &target).await;
                debug!("Restart finished: {:?}", outcome);
            }
        }
    }

    info!("Restart task shutting down");
}

/// Kill, wait the quiescence delay, relaunch
///
/// The delay is always observed, even when nothing was running: the old
/// process may still be releasing its ports.
pub async fn restart_process(
    supervisor: &Arc<dyn ProcessSupervisor>,
    target: &RestartConfig,
) -> RestartOutcome {
    info!("Restarting '{}'", target.process_name);

    let sup = Arc::clone(supervisor);
    let name = target.process_name.clone();
    let killed = match tokio::task::spawn_blocking(move || kill_all(sup.as_ref(), &name)).await {
        Ok(n) => n,
        Err(e) => {
            warn!("Kill phase for '{}' aborted: {}", target.process_name, e);
            0
        }
    };

    tokio::time::sleep(target.quiescence()).await;

    let sup = Arc::clone(supervisor);
    let executable = target.executable.clone();
    let spawned = tokio::task::spawn_blocking(move || sup.spawn(&executable)).await;
    let spawned_pid = match spawned {
        Ok(Ok(pid)) => {
            info!("Relaunched {} (pid {})", target.executable.display(), pid);
            Some(pid)
        }
        Ok(Err(e)) => {
            warn!("{}", e);
            None
        }
        Err(e) => {
            warn!("Spawn phase for '{}' aborted: {}", target.process_name, e);
            None
        }
    };

    RestartOutcome {
        killed,
        spawned_pid,
    }
}

/// Kill every process matching `name`; returns how many were killed
///
/// No match means the process is already stopped.
pub fn kill_all(supervisor: &dyn ProcessSupervisor, name: &str) -> usize {
    let pids = supervisor.find_processes(name);
    if pids.is_empty() {
        info!("No running process matches '{}'", name);
        return 0;
    }

    pids.into_iter()
        .filter(|&pid| {
            debug!("Killing '{}' (pid {})", name, pid);
            match supervisor.kill(pid) {
                Ok(()) => true,
                Err(e) => {
                    warn!("{}", e);
                    false
                }
            }
        })
        .count()
}
