//! Transport seam
//!
//! The router never talks to a MIDI backend directly. A [`MidiTransport`]
//! opens named ports; inputs deliver frames to a callback on a thread the
//! backend owns, outputs accept frames to send. The daemon provides a
//! `midir` implementation, `midi-sim` provides an in-memory one.

use crate::error::TransportError;

/// Called with `(timestamp_us, frame)` for every message on an input
pub type InputCallback = Box<dyn FnMut(u64, &[u8]) + Send + 'static>;

/// An open input port; callbacks stop once it is closed
pub trait InputConnection: Send {
    fn port_name(&self) -> &str;

    fn close(self: Box<Self>);
}

/// An open output port
pub trait OutputConnection: Send {
    fn port_name(&self) -> &str;

    /// Send one encoded frame
    fn send(&mut self, frame: &[u8]) -> Result<(), TransportError>;

    fn close(self: Box<Self>);
}

/// Opens ports by configured name
///
/// Opening fails when no matching device is present; callers treat that
/// as "unavailable", never as fatal.
pub trait MidiTransport: Send + Sync {
    fn open_input(
        &self,
        name: &str,
        callback: InputCallback,
    ) -> Result<Box<dyn InputConnection>, TransportError>;

    fn open_output(&self, name: &str) -> Result<Box<dyn OutputConnection>, TransportError>;
}
