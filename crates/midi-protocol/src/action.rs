//! Outbound messages
//!
//! An [`OutboundAction`] is what a handler asks to be sent. Encoding
//! saturates channel to 0..=15 and every data field to 0..=127, so a value
//! computed out of range is clamped rather than wrapped into a neighbouring
//! status byte.

use crate::error::ParseError;
use crate::message::StatusFamily;
use crate::{CHANNEL_MAX, DATA_MAX};

/// A single message to emit on an output port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OutboundAction {
    NoteOn { channel: u8, pitch: u8, velocity: u8 },
    NoteOff { channel: u8, pitch: u8, velocity: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    ProgramChange { channel: u8, program: u8 },
}

impl OutboundAction {
    pub const fn note_on(channel: u8, pitch: u8, velocity: u8) -> Self {
        OutboundAction::NoteOn {
            channel,
            pitch,
            velocity,
        }
    }

    pub const fn note_off(channel: u8, pitch: u8, velocity: u8) -> Self {
        OutboundAction::NoteOff {
            channel,
            pitch,
            velocity,
        }
    }

    pub const fn control_change(channel: u8, controller: u8, value: u8) -> Self {
        OutboundAction::ControlChange {
            channel,
            controller,
            value,
        }
    }

    pub const fn program_change(channel: u8, program: u8) -> Self {
        OutboundAction::ProgramChange { channel, program }
    }

    /// Status family this action is sent as
    pub fn status_family(&self) -> StatusFamily {
        match self {
            OutboundAction::NoteOn { .. } => StatusFamily::NoteOn,
            OutboundAction::NoteOff { .. } => StatusFamily::NoteOff,
            OutboundAction::ControlChange { .. } => StatusFamily::ControlChange,
            OutboundAction::ProgramChange { .. } => StatusFamily::ProgramChange,
        }
    }

    /// 0-based wire channel (unclamped)
    pub fn channel(&self) -> u8 {
        match *self {
            OutboundAction::NoteOn { channel, .. }
            | OutboundAction::NoteOff { channel, .. }
            | OutboundAction::ControlChange { channel, .. }
            | OutboundAction::ProgramChange { channel, .. } => channel,
        }
    }

    /// Encode to wire bytes, saturating every field into range
    pub fn encode(&self) -> Vec<u8> {
        let status = |nibble: u8, channel: u8| nibble | channel.min(CHANNEL_MAX);
        let data = |value: u8| value.min(DATA_MAX);

        match *self {
            OutboundAction::NoteOn {
                channel,
                pitch,
                velocity,
            } => vec![status(0x90, channel), data(pitch), data(velocity)],
            OutboundAction::NoteOff {
                channel,
                pitch,
                velocity,
            } => vec![status(0x80, channel), data(pitch), data(velocity)],
            OutboundAction::ControlChange {
                channel,
                controller,
                value,
            } => vec![status(0xB0, channel), data(controller), data(value)],
            OutboundAction::ProgramChange { channel, program } => {
                vec![status(0xC0, channel), data(program)]
            }
        }
    }

    /// Strictly decode a frame produced by [`encode`](Self::encode)
    ///
    /// Used by the simulation layer to turn recorded output back into
    /// actions. Unlike classification this rejects anything it cannot
    /// represent.
    pub fn decode(frame: &[u8]) -> Result<Self, ParseError> {
        let &status = frame.first().ok_or(ParseError::Empty)?;
        let family = StatusFamily::from_status(status);
        let needed = family
            .data_len()
            .ok_or(ParseError::UnsupportedStatus(status))?;
        if frame.len() < needed + 1 {
            return Err(ParseError::Truncated {
                needed: needed + 1 - frame.len(),
            });
        }

        let channel = status & 0x0F;
        let d1 = frame[1];
        let action = match family {
            StatusFamily::NoteOn => Self::note_on(channel, d1, frame[2]),
            StatusFamily::NoteOff => Self::note_off(channel, d1, frame[2]),
            StatusFamily::ControlChange => Self::control_change(channel, d1, frame[2]),
            StatusFamily::ProgramChange => Self::program_change(channel, d1),
            StatusFamily::Other => return Err(ParseError::UnsupportedStatus(status)),
        };
        Ok(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_control_change() {
        assert_eq!(
            OutboundAction::control_change(4, 13, 127).encode(),
            vec![0xB4, 13, 127]
        );
    }

    #[test]
    fn test_encode_program_change_is_two_bytes() {
        assert_eq!(OutboundAction::program_change(3, 4).encode(), vec![0xC3, 4]);
    }

    #[test]
    fn test_encode_saturates_out_of_range_fields() {
        let bytes = OutboundAction::note_on(20, 200, 128).encode();
        assert_eq!(bytes, vec![0x9F, 127, 127]);
    }

    #[test]
    fn test_decode_rejects_short_and_system_frames() {
        assert_eq!(OutboundAction::decode(&[]), Err(ParseError::Empty));
        assert_eq!(
            OutboundAction::decode(&[0xB0, 1]),
            Err(ParseError::Truncated { needed: 1 })
        );
        assert_eq!(
            OutboundAction::decode(&[0xF8]),
            Err(ParseError::UnsupportedStatus(0xF8))
        );
        assert_eq!(
            OutboundAction::decode(&[0xE0, 0, 64]),
            Err(ParseError::UnsupportedStatus(0xE0))
        );
    }

    #[test]
    fn test_decode_note_off() {
        assert_eq!(
            OutboundAction::decode(&[0x82, 60, 0]),
            Ok(OutboundAction::note_off(2, 60, 0))
        );
    }

    proptest! {
        #[test]
        fn encoded_bytes_are_always_legal(channel: u8, a: u8, b: u8) {
            for action in [
                OutboundAction::note_on(channel, a, b),
                OutboundAction::note_off(channel, a, b),
                OutboundAction::control_change(channel, a, b),
                OutboundAction::program_change(channel, a),
            ] {
                let bytes = action.encode();
                prop_assert_eq!(bytes[0] & 0x0F, channel.min(15));
                prop_assert!(bytes[1..].iter().all(|&d| d <= 127));
                prop_assert_eq!(StatusFamily::from_status(bytes[0]), action.status_family());
            }
        }
    }
}
