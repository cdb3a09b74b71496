//! MIDI Simulation Library
//!
//! This crate provides stand-ins for the hardware side of the router so the
//! routing and reinit logic can be tested without MIDI devices:
//!
//! - **VirtualTransport**: named devices that can be plugged and unplugged
//!   at runtime, injected input, and recorded output
//! - **VirtualSupervisor**: a fake process table that records every find,
//!   kill and spawn with the time it happened
//!
//! # Example
//!
//! ```rust
//! use midi_mux::MidiTransport;
//! use midi_sim::VirtualTransport;
//!
//! let transport = VirtualTransport::new();
//! transport.plug_output("Bus 3");
//!
//! let mut out = transport.open_output("Bus 3").unwrap();
//! out.send(&[0xB0, 56, 64]).unwrap();
//! assert_eq!(transport.sent("Bus 3"), vec![vec![0xB0, 56, 64]]);
//! ```

pub mod supervisor;
pub mod transport;

pub use supervisor::{SupervisorCall, VirtualSupervisor};
pub use transport::VirtualTransport;
