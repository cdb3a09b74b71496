//! MIDI port scanner
//!
//! This module provides MIDI port enumeration and name matching.

use midi_protocol::PortDirection;
use tracing::{debug, info};

use crate::error::DetectError;

/// Information about a MIDI port visible to the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiPortInfo {
    /// Port name as reported by the backend
    pub name: String,
    /// Whether we would read from or write to this port
    pub direction: PortDirection,
}

/// MIDI port scanner configuration
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Client name registered with the MIDI backend while scanning
    pub client_name: String,
    /// Skip ports whose name contains any of these patterns
    pub skip_patterns: Vec<String>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            client_name: "midimux-scan".to_string(),
            skip_patterns: vec![
                // ALSA's own announcement port
                "System:Announce".to_string(),
                "Midi Through".to_string(),
            ],
        }
    }
}

/// MIDI port scanner
pub struct PortScanner {
    config: ScannerConfig,
}

impl PortScanner {
    /// Create a new scanner with default configuration
    pub fn new() -> Self {
        Self {
            config: ScannerConfig::default(),
        }
    }

    /// Create a scanner with custom configuration
    pub fn with_config(config: ScannerConfig) -> Self {
        Self { config }
    }

    /// Enumerate every input and output port
    #[cfg(feature = "midi-io")]
    pub fn enumerate_ports(&self) -> Result<Vec<MidiPortInfo>, DetectError> {
        info!("Enumerating MIDI ports...");
        let mut result = self.enumerate_inputs()?;
        result.extend(self.enumerate_outputs()?);

        if result.is_empty() {
            info!("No MIDI ports found");
        } else {
            info!("Found {} MIDI port(s)", result.len());
            for port in &result {
                info!("  [{}] {}", port.direction.name(), port.name);
            }
        }

        Ok(result)
    }

    /// Enumerate input ports
    #[cfg(feature = "midi-io")]
    pub fn enumerate_inputs(&self) -> Result<Vec<MidiPortInfo>, DetectError> {
        let midi_in = midir::MidiInput::new(&self.config.client_name)?;
        let names = midi_in
            .ports()
            .iter()
            .filter_map(|p| match midi_in.port_name(p) {
                Ok(name) => Some(name),
                Err(e) => {
                    debug!("Skipping input port without a name: {}", e);
                    None
                }
            })
            .collect();
        Ok(self.collect(names, PortDirection::In))
    }

    /// Enumerate output ports
    #[cfg(feature = "midi-io")]
    pub fn enumerate_outputs(&self) -> Result<Vec<MidiPortInfo>, DetectError> {
        let midi_out = midir::MidiOutput::new(&self.config.client_name)?;
        let names = midi_out
            .ports()
            .iter()
            .filter_map(|p| match midi_out.port_name(p) {
                Ok(name) => Some(name),
                Err(e) => {
                    debug!("Skipping output port without a name: {}", e);
                    None
                }
            })
            .collect();
        Ok(self.collect(names, PortDirection::Out))
    }

    #[cfg_attr(not(feature = "midi-io"), allow(dead_code))]
    fn collect(&self, names: Vec<String>, direction: PortDirection) -> Vec<MidiPortInfo> {
        names
            .into_iter()
            .filter(|name| !self.should_skip_port(name))
            .map(|name| MidiPortInfo { name, direction })
            .collect()
    }

    /// Check if a port should be skipped
    #[cfg_attr(not(feature = "midi-io"), allow(dead_code))]
    fn should_skip_port(&self, name: &str) -> bool {
        self.config
            .skip_patterns
            .iter()
            .any(|pattern| name.contains(pattern.as_str()))
    }
}

impl Default for PortScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Find the index of the port matching `wanted`
///
/// An exact name wins; otherwise the first port whose name contains
/// `wanted` is chosen, since backends decorate names with client and port
/// numbers (`"Bus 1"` shows up as `"IAC Driver Bus 1"` on macOS).
pub fn find_port<'a, I>(names: I, wanted: &str) -> Option<usize>
where
    I: IntoIterator<Item = &'a str>,
{
    if wanted.is_empty() {
        return None;
    }

    let names: Vec<&str> = names.into_iter().collect();
    names
        .iter()
        .position(|name| *name == wanted)
        .or_else(|| names.iter().position(|name| name.contains(wanted)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_find_port_prefers_exact_match() {
        let names = ["IAC Driver Bus 1", "Bus 1"];
        assert_eq!(find_port(names, "Bus 1"), Some(1));
    }

    #[test]
    fn test_find_port_falls_back_to_substring() {
        let names = ["Midi Through:0", "Livid Guitar Wing:Livid Guitar Wing MIDI 1 24:0"];
        assert_eq!(find_port(names, "Livid Guitar Wing"), Some(1));
    }

    #[test]
    fn test_find_port_missing_device() {
        let names = ["IAC Driver Bus 2", "IAC Driver Bus 3"];
        assert_eq!(find_port(names, "Fast Track Ultra 8R"), None);
    }

    #[test]
    fn test_find_port_empty_name_never_matches() {
        assert_eq!(find_port(["anything"], ""), None);
    }

    #[test]
    fn test_skip_patterns() {
        let scanner = PortScanner::with_config(ScannerConfig {
            client_name: "test".to_string(),
            skip_patterns: vec!["Through".to_string()],
        });
        let ports = scanner.collect(
            vec!["Midi Through:0".to_string(), "Bus 3".to_string()],
            PortDirection::Out,
        );
        assert_eq!(
            ports,
            vec![MidiPortInfo {
                name: "Bus 3".to_string(),
                direction: PortDirection::Out,
            }]
        );
    }

    proptest! {
        #[test]
        fn found_port_always_contains_wanted(
            names in proptest::collection::vec("[a-zA-Z0-9 ]{0,12}", 0..6),
            wanted in "[a-zA-Z0-9 ]{1,4}",
        ) {
            if let Some(i) = find_port(names.iter().map(String::as_str), &wanted) {
                prop_assert!(names[i].contains(wanted.as_str()));
            } else {
                prop_assert!(names.iter().all(|n| !n.contains(wanted.as_str())));
            }
        }
    }
}
