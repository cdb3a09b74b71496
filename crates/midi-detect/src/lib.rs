//! MIDI Port Detection Library
//!
//! This crate provides MIDI port enumeration and the by-name lookup used
//! when a configured port is opened. Control-surface hardware comes and
//! goes, so a missing port is reported as `None`, never as an error.
//!
//! # Example
//!
//! ```rust,no_run
//! use midi_detect::PortScanner;
//!
//! let scanner = PortScanner::new();
//! for port in scanner.enumerate_ports().unwrap() {
//!     println!("Found {} port: {}", port.direction.name(), port.name);
//! }
//! ```

pub mod error;
pub mod scanner;

pub use error::DetectError;
pub use scanner::{find_port, MidiPortInfo, PortScanner, ScannerConfig};
