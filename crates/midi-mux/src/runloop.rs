//! Top-level poll loop
//!
//! Polls the reinit signal at a fixed cadence and runs a pass on the
//! manager when one is requested. A pass runs inline on the loop, so a slow
//! pass delays the next tick instead of overlapping it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::info;

use crate::manager::PortManager;
use crate::signal::ReinitSignal;

pub struct RunLoop {
    manager: PortManager,
    signal: Arc<ReinitSignal>,
    poll_interval: Duration,
}

impl RunLoop {
    /// Wrap a started manager, polling at its configured interval
    pub fn new(manager: PortManager) -> Self {
        let signal = manager.reinit_signal();
        let poll_interval = manager.config().poll_interval();
        Self {
            manager,
            signal,
            poll_interval,
        }
    }

    pub fn manager(&self) -> &PortManager {
        &self.manager
    }

    /// Run a reinit pass if one is requested; returns whether one ran
    pub fn poll_once(&mut self) -> bool {
        match self.signal.try_begin() {
            Some(_pass) => {
                self.manager.reinitialize();
                true
            }
            None => false,
        }
    }

    /// Poll until `shutdown` resolves, then release every port
    pub async fn run<F>(mut self, shutdown: F) -> PortManager
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!("Run loop started (poll every {:?})", self.poll_interval);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                _ = ticker.tick() => {
                    self.poll_once();
                }
            }
        }

        self.manager.shutdown();
        self.manager
    }
}
