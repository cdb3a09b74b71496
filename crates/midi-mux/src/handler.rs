//! Per-port handlers
//!
//! Each input port gets exactly one handler, chosen when the port is bound.
//! A handler turns classified events into outbound actions for its output
//! port. [`EmergencyControl`] has no output: it only raises the reinit
//! signal or queues a process restart.

use std::sync::Arc;

use midi_protocol::{ClassifiedEvent, OutboundAction, StatusFamily};
use tracing::{debug, info, warn};

use crate::config::{EmergencyTriggers, GuitarAmpConfig, VoiceFxConfig};
use crate::ports::PortRole;
use crate::signal::ReinitSignal;
use crate::supervisor::RestartHandle;
use crate::translation::{TranslationTable, GUITAR_WING_TABLE};

/// The four handler variants, without their state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HandlerKind {
    EmergencyControl,
    GuitarWing,
    VoiceFx,
    GuitarAmp,
}

impl HandlerKind {
    pub const ALL: [HandlerKind; 4] = [
        HandlerKind::EmergencyControl,
        HandlerKind::GuitarWing,
        HandlerKind::VoiceFx,
        HandlerKind::GuitarAmp,
    ];

    /// Port the handler listens on
    pub fn input_role(&self) -> PortRole {
        match self {
            HandlerKind::EmergencyControl => PortRole::EmergencyIn,
            HandlerKind::GuitarWing => PortRole::GuitarWingIn,
            HandlerKind::VoiceFx => PortRole::VoiceFxIn,
            HandlerKind::GuitarAmp => PortRole::GuitarAmpIn,
        }
    }

    /// Port the handler sends to, if any
    pub fn output_role(&self) -> Option<PortRole> {
        match self {
            HandlerKind::EmergencyControl => None,
            HandlerKind::GuitarWing | HandlerKind::VoiceFx => Some(PortRole::AbletonOut),
            HandlerKind::GuitarAmp => Some(PortRole::AudioInterfaceOut),
        }
    }

    /// Every port that must be open before the handler can be attached
    pub fn required_roles(&self) -> impl Iterator<Item = PortRole> {
        std::iter::once(self.input_role()).chain(self.output_role())
    }

    pub fn name(&self) -> &'static str {
        match self {
            HandlerKind::EmergencyControl => "emergency control",
            HandlerKind::GuitarWing => "guitar wing",
            HandlerKind::VoiceFx => "voice fx",
            HandlerKind::GuitarAmp => "guitar amp",
        }
    }
}

impl std::fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Reinit and restart triggers
///
/// Both triggers are checked on every event; a frame matching one never
/// prevents the other from being tested.
#[derive(Debug, Clone)]
pub struct EmergencyControl {
    triggers: EmergencyTriggers,
    reinit: Arc<ReinitSignal>,
    restart: RestartHandle,
}

impl EmergencyControl {
    pub fn new(
        triggers: EmergencyTriggers,
        reinit: Arc<ReinitSignal>,
        restart: RestartHandle,
    ) -> Self {
        Self {
            triggers,
            reinit,
            restart,
        }
    }

    fn matches(&self, event: &ClassifiedEvent, pitch: u8) -> bool {
        event.status_family == StatusFamily::NoteOn
            && event.human_channel() == Some(self.triggers.channel)
            && event.data1 == Some(pitch)
            && matches!(event.data2, Some(v) if v != 0)
    }

    pub fn handle(&self, event: &ClassifiedEvent) {
        if self.matches(event, self.triggers.restart_pitch) {
            info!("Emergency trigger: restart requested");
            if !self.restart.request_restart() {
                warn!("Restart task is not running; restart request dropped");
            }
        }
        if self.matches(event, self.triggers.reinit_pitch) {
            info!("Emergency trigger: port reinit requested");
            self.reinit.raise();
        }
    }
}

/// Guitar Wing controller to Ableton, via a static table
#[derive(Debug, Clone, Copy)]
pub struct GuitarWing {
    table: &'static TranslationTable,
}

impl GuitarWing {
    pub fn new() -> Self {
        Self {
            table: &GUITAR_WING_TABLE,
        }
    }

    pub fn handle(&self, event: &ClassifiedEvent) -> Vec<OutboundAction> {
        self.table.translate(event)
    }
}

impl Default for GuitarWing {
    fn default() -> Self {
        Self::new()
    }
}

/// Voice FX notes to control changes
#[derive(Debug, Clone, Copy)]
pub struct VoiceFxBridge {
    config: VoiceFxConfig,
}

impl VoiceFxBridge {
    pub fn new(config: VoiceFxConfig) -> Self {
        Self { config }
    }

    pub fn handle(&self, event: &ClassifiedEvent) -> Vec<OutboundAction> {
        let c = &self.config;
        let Some(pitch) = event.data1 else {
            return Vec::new();
        };

        if event.is_on_channel(StatusFamily::NoteOn, c.input_channel) {
            if pitch == c.disable_pitch {
                return vec![OutboundAction::control_change(
                    c.disable_channel,
                    c.disable_controller,
                    0,
                )];
            }
            return match event.data2 {
                Some(velocity) => vec![OutboundAction::control_change(
                    c.output_channel,
                    pitch,
                    velocity,
                )],
                None => Vec::new(),
            };
        }

        if event.is_on_channel(StatusFamily::NoteOff, c.input_channel) {
            return vec![OutboundAction::control_change(c.output_channel, pitch, 0)];
        }

        Vec::new()
    }
}

/// Amp preset selection with repeat suppression
#[derive(Debug, Clone)]
pub struct GuitarAmpBridge {
    config: GuitarAmpConfig,
    current_preset: Option<u8>,
}

impl GuitarAmpBridge {
    pub fn new(config: GuitarAmpConfig) -> Self {
        Self {
            config,
            current_preset: None,
        }
    }

    /// Last preset number seen, whether or not it was forwarded
    pub fn current_preset(&self) -> Option<u8> {
        self.current_preset
    }

    pub fn handle(&mut self, event: &ClassifiedEvent) -> Vec<OutboundAction> {
        if !event.is_on_channel(StatusFamily::NoteOn, self.config.input_channel) {
            return Vec::new();
        }
        let Some(preset) = event.data1 else {
            return Vec::new();
        };

        let previous = self.current_preset.replace(preset);
        if previous == Some(preset) {
            debug!("Amp preset {} already selected", preset);
            return Vec::new();
        }

        vec![OutboundAction::program_change(
            self.config.output_channel,
            preset.saturating_sub(1),
        )]
    }
}

/// A handler bound to one input port
#[derive(Debug, Clone)]
pub enum PortHandler {
    EmergencyControl(EmergencyControl),
    GuitarWing(GuitarWing),
    VoiceFx(VoiceFxBridge),
    GuitarAmp(GuitarAmpBridge),
}

impl PortHandler {
    pub fn kind(&self) -> HandlerKind {
        match self {
            PortHandler::EmergencyControl(_) => HandlerKind::EmergencyControl,
            PortHandler::GuitarWing(_) => HandlerKind::GuitarWing,
            PortHandler::VoiceFx(_) => HandlerKind::VoiceFx,
            PortHandler::GuitarAmp(_) => HandlerKind::GuitarAmp,
        }
    }

    /// Consume one event, returning the actions to send in order
    pub fn handle(&mut self, event: &ClassifiedEvent) -> Vec<OutboundAction> {
        match self {
            PortHandler::EmergencyControl(h) => {
                h.handle(event);
                Vec::new()
            }
            PortHandler::GuitarWing(h) => h.handle(event),
            PortHandler::VoiceFx(h) => h.handle(event),
            PortHandler::GuitarAmp(h) => h.handle(event),
        }
    }

    /// Release handler state before its ports are closed
    pub fn teardown(&mut self) {
        if let PortHandler::GuitarAmp(h) = self {
            h.current_preset = None;
        }
        debug!("Handler '{}' torn down", self.kind());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supervisor::{restart_channel, SupervisorCommand};
    use midi_protocol::classify;

    fn amp() -> GuitarAmpBridge {
        GuitarAmpBridge::new(GuitarAmpConfig::default())
    }

    #[test]
    fn test_required_roles() {
        let roles: Vec<_> = HandlerKind::GuitarAmp.required_roles().collect();
        assert_eq!(roles, vec![PortRole::GuitarAmpIn, PortRole::AudioInterfaceOut]);

        let roles: Vec<_> = HandlerKind::EmergencyControl.required_roles().collect();
        assert_eq!(roles, vec![PortRole::EmergencyIn]);
    }

    #[test]
    fn test_amp_deduplicates_presets() {
        let mut amp = amp();
        let mut emitted = Vec::new();
        for pitch in [5u8, 5, 7, 7, 7, 3] {
            emitted.extend(amp.handle(&classify(&[0x91, pitch, 100])));
        }
        assert_eq!(
            emitted,
            vec![
                OutboundAction::program_change(3, 4),
                OutboundAction::program_change(3, 6),
                OutboundAction::program_change(3, 2),
            ]
        );
        assert_eq!(amp.current_preset(), Some(3));
    }

    #[test]
    fn test_amp_preset_zero_maps_to_program_zero() {
        let mut amp = amp();
        assert_eq!(
            amp.handle(&classify(&[0x91, 0, 100])),
            vec![OutboundAction::program_change(3, 0)]
        );
        assert_eq!(
            amp.handle(&classify(&[0x91, 1, 100])),
            vec![OutboundAction::program_change(3, 0)]
        );
    }

    #[test]
    fn test_amp_ignores_other_channels_and_families() {
        let mut amp = amp();
        assert!(amp.handle(&classify(&[0x90, 5, 100])).is_empty());
        assert!(amp.handle(&classify(&[0x81, 5, 0])).is_empty());
        assert!(amp.handle(&classify(&[0x91])).is_empty());
        assert_eq!(amp.current_preset(), None);
    }

    #[test]
    fn test_amp_teardown_forgets_preset() {
        let mut handler = PortHandler::GuitarAmp(amp());
        assert_eq!(handler.handle(&classify(&[0x91, 5, 1])).len(), 1);
        handler.teardown();
        assert_eq!(handler.handle(&classify(&[0x91, 5, 1])).len(), 1);
    }

    #[test]
    fn test_voice_fx_passthrough() {
        let fx = VoiceFxBridge::new(VoiceFxConfig::default());
        assert_eq!(
            fx.handle(&classify(&[0x90, 60, 90])),
            vec![OutboundAction::control_change(5, 60, 90)]
        );
        assert_eq!(
            fx.handle(&classify(&[0x80, 60, 64])),
            vec![OutboundAction::control_change(5, 60, 0)]
        );
    }

    #[test]
    fn test_voice_fx_disable_pitch() {
        let fx = VoiceFxBridge::new(VoiceFxConfig::default());
        assert_eq!(
            fx.handle(&classify(&[0x90, 35, 127])),
            vec![OutboundAction::control_change(0, 20, 0)]
        );
        // NoteOff for the disable pitch is a plain passthrough
        assert_eq!(
            fx.handle(&classify(&[0x80, 35, 0])),
            vec![OutboundAction::control_change(5, 35, 0)]
        );
    }

    #[test]
    fn test_voice_fx_ignores_other_input() {
        let fx = VoiceFxBridge::new(VoiceFxConfig::default());
        assert!(fx.handle(&classify(&[0x91, 60, 90])).is_empty());
        assert!(fx.handle(&classify(&[0xB0, 60, 90])).is_empty());
        assert!(fx.handle(&classify(&[0x90, 60])).is_empty());
        assert!(fx.handle(&classify(&[0xF8])).is_empty());
    }

    #[test]
    fn test_emergency_triggers_are_independent() {
        let signal = Arc::new(ReinitSignal::new());
        let (restart, mut rx) = restart_channel();
        let mut handler = PortHandler::EmergencyControl(EmergencyControl::new(
            EmergencyTriggers::default(),
            Arc::clone(&signal),
            restart,
        ));

        // channel 7 is wire channel 6
        assert!(handler.handle(&classify(&[0x96, 47, 127])).is_empty());
        assert_eq!(rx.try_recv().ok(), Some(SupervisorCommand::RestartProcess));
        assert!(!signal.is_raised());

        handler.handle(&classify(&[0x96, 46, 1]));
        assert!(signal.is_raised());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_emergency_ignores_non_matching() {
        let signal = Arc::new(ReinitSignal::new());
        let (restart, mut rx) = restart_channel();
        let emergency =
            EmergencyControl::new(EmergencyTriggers::default(), Arc::clone(&signal), restart);

        let frames: [&[u8]; 6] = [
            &[0x96, 46, 0],
            &[0x97, 46, 127],
            &[0x86, 46, 127],
            &[0x96, 46],
            &[0x96, 45, 127],
            &[0xF6, 46, 127],
        ];
        for frame in frames {
            emergency.handle(&classify(frame));
        }
        assert!(!signal.is_raised());
        assert!(rx.try_recv().is_err());
    }
}
