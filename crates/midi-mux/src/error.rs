//! Error types for the router

use thiserror::Error;

/// Errors raised by a transport backend
///
/// Any failure to open a port means "device absent" to the port manager:
/// it is logged at info level and the binding stays unbound.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// No port with a matching name is present
    #[error("port not found: {0}")]
    PortNotFound(String),

    /// The MIDI backend itself failed
    #[error("MIDI backend error: {0}")]
    Backend(String),

    /// Port is present but could not be connected
    #[error("failed to connect to {port}: {reason}")]
    ConnectFailed { port: String, reason: String },

    /// Sending a message failed
    #[error("send failed on {port}: {reason}")]
    SendFailed { port: String, reason: String },
}

/// Errors raised by the process supervisor
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SupervisorError {
    /// Signalling a process failed
    #[error("failed to kill pid {pid}: {reason}")]
    KillFailed { pid: u32, reason: String },

    /// Launching the executable failed
    #[error("failed to spawn {path}: {reason}")]
    SpawnFailed { path: String, reason: String },
}

/// Invalid router configuration
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Channel outside the range allowed for that field
    #[error("{field}: channel {value} out of range {min}..={max}")]
    ChannelOutOfRange {
        field: &'static str,
        value: u8,
        min: u8,
        max: u8,
    },

    /// Data value (pitch, controller) above 127
    #[error("{field}: value {value} exceeds 127")]
    DataOutOfRange { field: &'static str, value: u8 },

    /// Both emergency triggers share a pitch
    #[error("emergency reinit and restart triggers both use pitch {0}")]
    DuplicateEmergencyPitch(u8),

    /// A port name is blank
    #[error("port name for {0} is empty")]
    EmptyPortName(&'static str),

    /// Poll interval of zero
    #[error("poll interval must be non-zero")]
    ZeroPollInterval,
}

/// Errors that can occur in the router
#[derive(Debug, Error)]
pub enum MuxError {
    /// Transport error
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Supervisor error
    #[error("supervisor error: {0}")]
    Supervisor(#[from] SupervisorError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
