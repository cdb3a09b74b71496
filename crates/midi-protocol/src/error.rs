//! Error types for MIDI frame decoding

use thiserror::Error;

/// Errors that can occur while strictly decoding an outbound frame
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Frame carries no bytes at all
    #[error("empty frame")]
    Empty,

    /// Frame is shorter than its status byte requires
    #[error("truncated frame: need {needed} more bytes")]
    Truncated { needed: usize },

    /// Status byte is not one of the supported channel messages
    #[error("unsupported status byte: 0x{0:02X}")]
    UnsupportedStatus(u8),
}
