//! Port roles and binding status

use midi_protocol::PortDirection;
use serde::{Deserialize, Serialize};

/// The logical port slots the router manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PortRole {
    /// Trigger source for reinit and process restart; never torn down once bound
    EmergencyIn,
    GuitarWingIn,
    VoiceFxIn,
    GuitarAmpIn,
    AbletonOut,
    AudioInterfaceOut,
}

impl PortRole {
    pub const ALL: [PortRole; 6] = [
        PortRole::EmergencyIn,
        PortRole::GuitarWingIn,
        PortRole::VoiceFxIn,
        PortRole::GuitarAmpIn,
        PortRole::AbletonOut,
        PortRole::AudioInterfaceOut,
    ];

    /// Roles rebuilt by every reinit pass
    pub const DYNAMIC: [PortRole; 5] = [
        PortRole::GuitarWingIn,
        PortRole::VoiceFxIn,
        PortRole::GuitarAmpIn,
        PortRole::AbletonOut,
        PortRole::AudioInterfaceOut,
    ];

    pub fn direction(&self) -> PortDirection {
        match self {
            PortRole::AbletonOut | PortRole::AudioInterfaceOut => PortDirection::Out,
            _ => PortDirection::In,
        }
    }

    /// Once bound, a permanent port survives every reinit pass
    pub fn is_permanent(&self) -> bool {
        matches!(self, PortRole::EmergencyIn)
    }

    pub fn label(&self) -> &'static str {
        match self {
            PortRole::EmergencyIn => "emergency control in",
            PortRole::GuitarWingIn => "guitar wing in",
            PortRole::VoiceFxIn => "voice fx in",
            PortRole::GuitarAmpIn => "guitar amp in",
            PortRole::AbletonOut => "ableton out",
            PortRole::AudioInterfaceOut => "audio interface out",
        }
    }
}

impl std::fmt::Display for PortRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Snapshot of one configured port
///
/// `available == false` is the normal state for a device that is not
/// plugged in, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortBinding {
    pub role: PortRole,
    pub name: String,
    pub direction: PortDirection,
    pub available: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_emergency_is_permanent() {
        for role in PortRole::ALL {
            assert_eq!(role.is_permanent(), !PortRole::DYNAMIC.contains(&role));
        }
        assert!(PortRole::EmergencyIn.is_permanent());
    }

    #[test]
    fn test_directions() {
        assert_eq!(PortRole::AbletonOut.direction(), PortDirection::Out);
        assert_eq!(PortRole::AudioInterfaceOut.direction(), PortDirection::Out);
        assert_eq!(PortRole::GuitarWingIn.direction(), PortDirection::In);
        assert_eq!(PortRole::EmergencyIn.direction(), PortDirection::In);
    }
}
