//! MIDI Routing Engine
//!
//! This crate routes MIDI between a fixed set of named ports, translating
//! messages per input port, and re-binds those ports on demand while the
//! process keeps running.
//!
//! # Architecture
//!
//! - **Handlers** ([`PortHandler`]): one per input port. Guitar Wing
//!   translation by static table, Voice FX note-to-CC bridge, guitar amp
//!   preset bridge with repeat suppression, and the emergency-control
//!   handler that raises reinit and restart requests.
//! - **Bindings** ([`InputBinding`], [`OutputBinding`]): open ports. Each
//!   input owns a dispatch slot its transport callback reads from, so
//!   handlers are swapped without reopening the port.
//! - **Port manager** ([`PortManager`]): opens ports by name, tolerates
//!   missing devices, attaches handlers whose ports are all present, and
//!   runs the reinit protocol.
//! - **Run loop** ([`RunLoop`]): polls the [`ReinitSignal`] and drives
//!   reinit passes, one at a time.
//! - **Restart task** ([`run_restart_task`]): kills and relaunches the
//!   supervised process off the MIDI callback threads.
//!
//! Hardware access goes through the [`MidiTransport`] and
//! [`ProcessSupervisor`] traits; `midi-sim` provides in-memory versions.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use midi_mux::{restart_channel, PortManager, ReinitSignal, RouterConfig, RunLoop};
//! # fn transport() -> Arc<dyn midi_mux::MidiTransport> { unimplemented!() }
//!
//! # async fn example() -> Result<(), midi_mux::MuxError> {
//! let (restart, _requests) = restart_channel();
//! let mut manager = PortManager::new(
//!     RouterConfig::default(),
//!     transport(),
//!     Arc::new(ReinitSignal::new()),
//!     restart,
//! )?;
//! manager.start();
//!
//! RunLoop::new(manager).run(async { /* wait for ctrl-c */ }).await;
//! # Ok(())
//! # }
//! ```

pub mod binding;
pub mod config;
pub mod error;
pub mod handler;
pub mod manager;
pub mod ports;
pub mod runloop;
pub mod signal;
pub mod supervisor;
pub mod translation;
pub mod transport;

pub use binding::{InputBinding, InputRoute, OutputBinding, SharedOutput};
pub use config::{
    EmergencyTriggers, GuitarAmpConfig, PortNames, RestartConfig, RouterConfig, VoiceFxConfig,
};
pub use error::{ConfigError, MuxError, SupervisorError, TransportError};
pub use handler::{
    EmergencyControl, GuitarAmpBridge, GuitarWing, HandlerKind, PortHandler, VoiceFxBridge,
};
pub use manager::PortManager;
pub use ports::{PortBinding, PortRole};
pub use runloop::RunLoop;
pub use signal::{ReinitPass, ReinitSignal};
pub use supervisor::{
    kill_all, restart_channel, restart_process, run_restart_task, ProcessSupervisor,
    RestartHandle, RestartOutcome, SupervisorCommand,
};
pub use translation::{
    rescale_fader, ActionTemplate, TranslationRule, TranslationTable, Trigger, GUITAR_WING_TABLE,
};
pub use transport::{InputCallback, InputConnection, MidiTransport, OutputConnection};

// Re-export protocol types used in this crate's API
pub use midi_protocol::{ClassifiedEvent, OutboundAction, PortDirection, StatusFamily};
