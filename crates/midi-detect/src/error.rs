//! Error types for MIDI port detection

use thiserror::Error;

/// Errors that can occur during detection
#[derive(Debug, Error)]
pub enum DetectError {
    /// The MIDI backend could not be initialised
    #[error("failed to initialise MIDI backend: {0}")]
    BackendInit(String),

    /// A port vanished between listing and naming it
    #[error("failed to read port name: {0}")]
    PortInfo(String),
}

#[cfg(feature = "midi-io")]
impl From<midir::InitError> for DetectError {
    fn from(e: midir::InitError) -> Self {
        DetectError::BackendInit(e.to_string())
    }
}

#[cfg(feature = "midi-io")]
impl From<midir::PortInfoError> for DetectError {
    fn from(e: midir::PortInfoError) -> Self {
        DetectError::PortInfo(e.to_string())
    }
}
