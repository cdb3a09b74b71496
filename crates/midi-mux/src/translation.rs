//! Static trigger-to-action tables
//!
//! A table maps a `(status family, data1)` trigger to an ordered list of
//! action templates. Most templates are fixed messages; a template may also
//! take its value from the incoming `data2`. Tables are compiled in and
//! never change at runtime, so the same trigger always yields the same
//! actions.

use midi_protocol::{clamp_data, ClassifiedEvent, OutboundAction, StatusFamily};

/// What a handler recognises: a status family plus its first data byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Trigger {
    pub family: StatusFamily,
    pub data1: u8,
}

impl Trigger {
    pub const fn note_on(pitch: u8) -> Self {
        Self {
            family: StatusFamily::NoteOn,
            data1: pitch,
        }
    }

    pub const fn note_off(pitch: u8) -> Self {
        Self {
            family: StatusFamily::NoteOff,
            data1: pitch,
        }
    }

    pub const fn control_change(controller: u8) -> Self {
        Self {
            family: StatusFamily::ControlChange,
            data1: controller,
        }
    }
}

/// One output produced by a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionTemplate {
    /// Emit this message unchanged
    Fixed(OutboundAction),
    /// Control change whose value is the incoming 0..=100 fader position
    /// rescaled to 0..=127
    RescaledFader { channel: u8, controller: u8 },
}

impl ActionTemplate {
    /// Instantiate against an event; `None` when required data is missing
    fn instantiate(&self, event: &ClassifiedEvent) -> Option<OutboundAction> {
        match *self {
            ActionTemplate::Fixed(action) => Some(action),
            ActionTemplate::RescaledFader {
                channel,
                controller,
            } => event.data2.map(|value| {
                OutboundAction::control_change(channel, controller, rescale_fader(value))
            }),
        }
    }
}

/// A trigger and the actions it produces, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslationRule {
    pub trigger: Trigger,
    pub actions: &'static [ActionTemplate],
}

/// An immutable rule set
#[derive(Debug, Clone, Copy)]
pub struct TranslationTable {
    rules: &'static [TranslationRule],
}

impl TranslationTable {
    pub const fn new(rules: &'static [TranslationRule]) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &'static [TranslationRule] {
        self.rules
    }

    /// Rule for a trigger, if any
    pub fn lookup(&self, trigger: Trigger) -> Option<&'static TranslationRule> {
        self.rules.iter().find(|rule| rule.trigger == trigger)
    }

    /// Translate an event to actions
    ///
    /// Events without `data1`, and triggers with no rule, produce nothing.
    /// A rule whose template needs `data2` produces nothing when it is
    /// absent.
    pub fn translate(&self, event: &ClassifiedEvent) -> Vec<OutboundAction> {
        let Some(data1) = event.data1 else {
            return Vec::new();
        };
        let trigger = Trigger {
            family: event.status_family,
            data1,
        };
        let Some(rule) = self.lookup(trigger) else {
            return Vec::new();
        };

        rule.actions
            .iter()
            .map(|template| template.instantiate(event))
            .collect::<Option<Vec<_>>>()
            .unwrap_or_default()
    }
}

/// Rescale a 0..=100 fader position to 0..=127
///
/// Rounds half up (50 -> 64) and saturates inputs above 100.
pub fn rescale_fader(value: u8) -> u8 {
    let scaled = (i32::from(value) * 127 + 50) / 100;
    clamp_data(scaled)
}

// Guitar Wing controls
const WING_BIG_ROUND_1: u8 = 36;
const WING_BIG_ROUND_2: u8 = 37;
const WING_BIG_ROUND_3: u8 = 38;
const WING_BIG_ROUND_4: u8 = 39;
const WING_SMALL_RECT_1: u8 = 42;
const WING_SMALL_RECT_2: u8 = 43;
const WING_SMALL_RECT_3: u8 = 44;
const WING_SMALL_RECT_4: u8 = 45;
const WING_BIG_FADER: u8 = 3;

const fn cc(channel: u8, controller: u8, value: u8) -> ActionTemplate {
    ActionTemplate::Fixed(OutboundAction::control_change(channel, controller, value))
}

const fn note_on(channel: u8, pitch: u8, velocity: u8) -> ActionTemplate {
    ActionTemplate::Fixed(OutboundAction::note_on(channel, pitch, velocity))
}

/// Guitar Wing controls to Ableton
///
/// The toggle (pitch 4), arrows and small switches have no mapping.
static GUITAR_WING_RULES: &[TranslationRule] = &[
    TranslationRule {
        trigger: Trigger::note_on(WING_BIG_ROUND_1),
        actions: &[cc(4, 13, 127)],
    },
    TranslationRule {
        trigger: Trigger::note_on(WING_BIG_ROUND_2),
        actions: &[cc(0, 16, 127), note_on(0, 44, 127)],
    },
    TranslationRule {
        trigger: Trigger::note_on(WING_BIG_ROUND_3),
        actions: &[cc(0, 16, 110), note_on(0, 44, 127)],
    },
    TranslationRule {
        trigger: Trigger::note_on(WING_BIG_ROUND_4),
        actions: &[cc(0, 52, 76)],
    },
    TranslationRule {
        trigger: Trigger::note_on(WING_SMALL_RECT_1),
        actions: &[cc(0, 16, 0)],
    },
    TranslationRule {
        trigger: Trigger::note_on(WING_SMALL_RECT_2),
        actions: &[cc(0, 16, 45)],
    },
    TranslationRule {
        trigger: Trigger::note_on(WING_SMALL_RECT_3),
        actions: &[cc(0, 16, 64)],
    },
    TranslationRule {
        trigger: Trigger::note_on(WING_SMALL_RECT_4),
        actions: &[cc(0, 16, 110)],
    },
    TranslationRule {
        trigger: Trigger::note_off(WING_BIG_ROUND_1),
        actions: &[cc(4, 13, 0)],
    },
    TranslationRule {
        trigger: Trigger::note_off(WING_BIG_ROUND_2),
        actions: &[note_on(0, 44, 127)],
    },
    TranslationRule {
        trigger: Trigger::note_off(WING_BIG_ROUND_3),
        actions: &[note_on(0, 44, 127)],
    },
    TranslationRule {
        trigger: Trigger::note_off(WING_BIG_ROUND_4),
        actions: &[cc(0, 52, 0)],
    },
    TranslationRule {
        trigger: Trigger::control_change(WING_BIG_FADER),
        actions: &[ActionTemplate::RescaledFader {
            channel: 0,
            controller: 56,
        }],
    },
];

pub static GUITAR_WING_TABLE: TranslationTable = TranslationTable::new(GUITAR_WING_RULES);

#[cfg(test)]
mod tests {
    use super::*;
    use midi_protocol::classify;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_rescale_fader_endpoints() {
        assert_eq!(rescale_fader(0), 0);
        assert_eq!(rescale_fader(100), 127);
        assert_eq!(rescale_fader(50), 64);
        assert_eq!(rescale_fader(1), 1);
    }

    #[test]
    fn test_rescale_fader_saturates() {
        assert_eq!(rescale_fader(101), 127);
        assert_eq!(rescale_fader(127), 127);
        assert_eq!(rescale_fader(255), 127);
    }

    #[test]
    fn test_guitar_wing_table_has_unique_triggers() {
        let triggers: HashSet<_> = GUITAR_WING_TABLE
            .rules()
            .iter()
            .map(|r| r.trigger)
            .collect();
        assert_eq!(triggers.len(), GUITAR_WING_TABLE.rules().len());
    }

    #[test]
    fn test_guitar_wing_table() {
        let cases: &[(&[u8], &[OutboundAction])] = &[
            (&[0x90, 36, 127], &[OutboundAction::control_change(4, 13, 127)]),
            (
                &[0x90, 37, 127],
                &[
                    OutboundAction::control_change(0, 16, 127),
                    OutboundAction::note_on(0, 44, 127),
                ],
            ),
            (
                &[0x90, 38, 127],
                &[
                    OutboundAction::control_change(0, 16, 110),
                    OutboundAction::note_on(0, 44, 127),
                ],
            ),
            (&[0x90, 39, 127], &[OutboundAction::control_change(0, 52, 76)]),
            (&[0x90, 42, 127], &[OutboundAction::control_change(0, 16, 0)]),
            (&[0x90, 43, 127], &[OutboundAction::control_change(0, 16, 45)]),
            (&[0x90, 44, 127], &[OutboundAction::control_change(0, 16, 64)]),
            (&[0x90, 45, 127], &[OutboundAction::control_change(0, 16, 110)]),
            (&[0x80, 36, 0], &[OutboundAction::control_change(4, 13, 0)]),
            (&[0x80, 37, 0], &[OutboundAction::note_on(0, 44, 127)]),
            (&[0x80, 38, 0], &[OutboundAction::note_on(0, 44, 127)]),
            (&[0x80, 39, 0], &[OutboundAction::control_change(0, 52, 0)]),
            (&[0x80, 42, 0], &[]),
            (&[0x90, 4, 127], &[]),
            (&[0x80, 4, 0], &[]),
            (&[0x90, 40, 127], &[]),
            (&[0xB0, 1, 90], &[]),
            (&[0xB0, 3, 0], &[OutboundAction::control_change(0, 56, 0)]),
            (&[0xB0, 3, 50], &[OutboundAction::control_change(0, 56, 64)]),
            (&[0xB0, 3, 100], &[OutboundAction::control_change(0, 56, 127)]),
        ];

        for (frame, expected) in cases {
            let actions = GUITAR_WING_TABLE.translate(&classify(frame));
            assert_eq!(&actions, expected, "frame {:02X?}", frame);
        }
    }

    #[test]
    fn test_fixed_rules_ignore_data2() {
        let a = GUITAR_WING_TABLE.translate(&classify(&[0x90, 36, 1]));
        let b = GUITAR_WING_TABLE.translate(&classify(&[0x90, 36, 127]));
        let c = GUITAR_WING_TABLE.translate(&classify(&[0x90, 36]));
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn test_fader_without_value_emits_nothing() {
        assert!(GUITAR_WING_TABLE
            .translate(&classify(&[0xB0, 3]))
            .is_empty());
    }

    #[test]
    fn test_short_frame_emits_nothing() {
        assert!(GUITAR_WING_TABLE.translate(&classify(&[0x90])).is_empty());
    }

    proptest! {
        #[test]
        fn rescale_is_monotonic_and_bounded(a in 0u8..=100, b in 0u8..=100) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(rescale_fader(lo) <= rescale_fader(hi));
            prop_assert!(rescale_fader(hi) <= 127);
        }

        #[test]
        fn translation_is_deterministic(frame in proptest::collection::vec(any::<u8>(), 0..=3)) {
            let event = classify(&frame);
            prop_assert_eq!(GUITAR_WING_TABLE.translate(&event), GUITAR_WING_TABLE.translate(&event));
        }
    }
}
