//! Router configuration
//!
//! One immutable structure holds every port name, trigger constant and
//! timing value. It is supplied once at startup and never reloaded.

use std::path::PathBuf;
use std::time::Duration;

use midi_protocol::{CHANNEL_MAX, DATA_MAX};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::ports::PortRole;

/// Names of the ports the router binds, by role
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PortNames {
    pub emergency_in: String,
    pub guitar_wing_in: String,
    pub voice_fx_in: String,
    pub ableton_out: String,
    pub guitar_amp_in: String,
    pub audio_interface_out: String,
}

impl PortNames {
    /// Configured name for a role
    pub fn name_for(&self, role: PortRole) -> &str {
        match role {
            PortRole::EmergencyIn => &self.emergency_in,
            PortRole::GuitarWingIn => &self.guitar_wing_in,
            PortRole::VoiceFxIn => &self.voice_fx_in,
            PortRole::GuitarAmpIn => &self.guitar_amp_in,
            PortRole::AbletonOut => &self.ableton_out,
            PortRole::AudioInterfaceOut => &self.audio_interface_out,
        }
    }
}

impl Default for PortNames {
    fn default() -> Self {
        Self {
            emergency_in: "Bus 1".to_string(),
            guitar_wing_in: "Livid Guitar Wing".to_string(),
            voice_fx_in: "Bus 2".to_string(),
            ableton_out: "Bus 3".to_string(),
            guitar_amp_in: "Bus 5 - GTR".to_string(),
            audio_interface_out: "Fast Track Ultra 8R".to_string(),
        }
    }
}

/// Emergency-control triggers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EmergencyTriggers {
    /// 1-based channel, as printed on the controller
    pub channel: u8,
    /// Pitch that requests port re-initialisation
    pub reinit_pitch: u8,
    /// Pitch that requests a restart of the supervised process
    pub restart_pitch: u8,
}

impl Default for EmergencyTriggers {
    fn default() -> Self {
        Self {
            channel: 7,
            reinit_pitch: 46,
            restart_pitch: 47,
        }
    }
}

/// Voice FX bridge settings (wire channels, 0-based)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct VoiceFxConfig {
    pub input_channel: u8,
    pub output_channel: u8,
    /// Pitch that sends the disable command instead of passing through
    pub disable_pitch: u8,
    pub disable_channel: u8,
    pub disable_controller: u8,
}

impl Default for VoiceFxConfig {
    fn default() -> Self {
        Self {
            input_channel: 0,
            output_channel: 5,
            disable_pitch: 35,
            disable_channel: 0,
            disable_controller: 20,
        }
    }
}

/// Guitar amp bridge settings (wire channels, 0-based)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GuitarAmpConfig {
    pub input_channel: u8,
    pub output_channel: u8,
}

impl Default for GuitarAmpConfig {
    fn default() -> Self {
        Self {
            input_channel: 1,
            output_channel: 3,
        }
    }
}

/// The external process restarted by the emergency trigger
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RestartConfig {
    /// Substring matched against running process names
    pub process_name: String,
    /// Executable launched after the quiescence delay
    pub executable: PathBuf,
    /// Wait between kill and relaunch, in milliseconds
    pub quiescence_ms: u64,
}

impl RestartConfig {
    pub fn quiescence(&self) -> Duration {
        Duration::from_millis(self.quiescence_ms)
    }
}

impl Default for RestartConfig {
    fn default() -> Self {
        Self {
            process_name: "Strobot".to_string(),
            executable: PathBuf::from("/Applications/Strobot/Strobot.app/Contents/MacOS/Strobot"),
            quiescence_ms: 2000,
        }
    }
}

/// Complete router configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RouterConfig {
    pub ports: PortNames,
    pub emergency: EmergencyTriggers,
    pub voice_fx: VoiceFxConfig,
    pub guitar_amp: GuitarAmpConfig,
    pub restart: RestartConfig,
    /// How often the run loop checks for a reinit request (ms)
    pub poll_interval_ms: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            ports: PortNames::default(),
            emergency: EmergencyTriggers::default(),
            voice_fx: VoiceFxConfig::default(),
            guitar_amp: GuitarAmpConfig::default(),
            restart: RestartConfig::default(),
            poll_interval_ms: 1000,
        }
    }
}

impl RouterConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Check every field is representable on the wire
    pub fn validate(&self) -> Result<(), ConfigError> {
        for role in PortRole::ALL {
            if self.ports.name_for(role).trim().is_empty() {
                return Err(ConfigError::EmptyPortName(role.label()));
            }
        }

        let e = &self.emergency;
        if !(1..=CHANNEL_MAX + 1).contains(&e.channel) {
            return Err(ConfigError::ChannelOutOfRange {
                field: "emergency.channel",
                value: e.channel,
                min: 1,
                max: CHANNEL_MAX + 1,
            });
        }
        data("emergency.reinit_pitch", e.reinit_pitch)?;
        data("emergency.restart_pitch", e.restart_pitch)?;
        if e.reinit_pitch == e.restart_pitch {
            return Err(ConfigError::DuplicateEmergencyPitch(e.reinit_pitch));
        }

        let v = &self.voice_fx;
        wire_channel("voice_fx.input_channel", v.input_channel)?;
        wire_channel("voice_fx.output_channel", v.output_channel)?;
        wire_channel("voice_fx.disable_channel", v.disable_channel)?;
        data("voice_fx.disable_pitch", v.disable_pitch)?;
        data("voice_fx.disable_controller", v.disable_controller)?;

        wire_channel("guitar_amp.input_channel", self.guitar_amp.input_channel)?;
        wire_channel("guitar_amp.output_channel", self.guitar_amp.output_channel)?;

        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(())
    }
}

fn wire_channel(field: &'static str, value: u8) -> Result<(), ConfigError> {
    if value > CHANNEL_MAX {
        return Err(ConfigError::ChannelOutOfRange {
            field,
            value,
            min: 0,
            max: CHANNEL_MAX,
        });
    }
    Ok(())
}

fn data(field: &'static str, value: u8) -> Result<(), ConfigError> {
    if value > DATA_MAX {
        return Err(ConfigError::DataOutOfRange { field, value });
    }
    Ok(())
}
