//! MIDI Protocol Library
//!
//! This crate provides classification and encoding for the small subset of
//! MIDI used by the router: fixed-length, status-byte framed channel
//! messages of one to three bytes.
//!
//! - **Classification**: turns a raw frame into a [`ClassifiedEvent`]
//!   (status family, channel, data bytes). Never fails; short frames simply
//!   leave fields empty.
//! - **Encoding**: turns an [`OutboundAction`] into wire bytes, saturating
//!   every field into its legal range.
//!
//! # Example
//!
//! ```rust
//! use midi_protocol::{classify, OutboundAction, StatusFamily};
//!
//! let event = classify(&[0x96, 46, 127]);
//! assert_eq!(event.status_family, StatusFamily::NoteOn);
//! assert_eq!(event.human_channel(), Some(7));
//!
//! let bytes = OutboundAction::control_change(0, 56, 64).encode();
//! assert_eq!(bytes, vec![0xB0, 56, 64]);
//! ```

pub mod action;
pub mod error;
pub mod message;

pub use action::OutboundAction;
pub use error::ParseError;
pub use message::{classify, ClassifiedEvent, StatusFamily};

/// Highest value a MIDI data byte may carry
pub const DATA_MAX: u8 = 0x7F;

/// Highest 0-based wire channel
pub const CHANNEL_MAX: u8 = 0x0F;

/// Direction of a named port, as seen from this process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PortDirection {
    /// We receive messages on this port
    In,
    /// We send messages on this port
    Out,
}

impl PortDirection {
    /// Returns a human-readable name for the direction
    pub fn name(&self) -> &'static str {
        match self {
            PortDirection::In => "input",
            PortDirection::Out => "output",
        }
    }
}

/// Saturate an arbitrary computed value into the 0..=127 data range
pub fn clamp_data(value: i32) -> u8 {
    value.clamp(0, DATA_MAX as i32) as u8
}
