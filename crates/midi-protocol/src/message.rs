//! Raw frame classification
//!
//! A frame is whatever the transport hands us: one to three bytes starting
//! with a status byte. Classification splits the status byte into a family
//! and a channel and picks out the data bytes that are present.

/// Category of a MIDI message, decoded from the status byte's high nibble
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StatusFamily {
    NoteOn,
    NoteOff,
    ControlChange,
    ProgramChange,
    /// System messages and channel messages the router does not act on
    Other,
}

impl StatusFamily {
    /// Decode a family from a full status byte (channel bits are ignored)
    pub fn from_status(status: u8) -> Self {
        if status >= 0xF0 {
            return StatusFamily::Other;
        }
        match status & 0xF0 {
            0x80 => StatusFamily::NoteOff,
            0x90 => StatusFamily::NoteOn,
            0xB0 => StatusFamily::ControlChange,
            0xC0 => StatusFamily::ProgramChange,
            _ => StatusFamily::Other,
        }
    }

    /// The high nibble used on the wire, if this is a routable family
    pub fn status_nibble(&self) -> Option<u8> {
        match self {
            StatusFamily::NoteOff => Some(0x80),
            StatusFamily::NoteOn => Some(0x90),
            StatusFamily::ControlChange => Some(0xB0),
            StatusFamily::ProgramChange => Some(0xC0),
            StatusFamily::Other => None,
        }
    }

    /// Number of data bytes that follow the status byte on the wire
    pub fn data_len(&self) -> Option<usize> {
        match self {
            StatusFamily::NoteOff | StatusFamily::NoteOn | StatusFamily::ControlChange => Some(2),
            StatusFamily::ProgramChange => Some(1),
            StatusFamily::Other => None,
        }
    }
}

/// A frame broken into its fields
///
/// Fields the frame was too short to carry are `None`. Handlers treat a
/// missing field as "no rule matches".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassifiedEvent {
    pub status_family: StatusFamily,
    /// 0-based wire channel; `None` for system messages
    pub channel: Option<u8>,
    pub data1: Option<u8>,
    pub data2: Option<u8>,
}

impl ClassifiedEvent {
    /// Channel as a human operator counts it (1..=16)
    pub fn human_channel(&self) -> Option<u8> {
        self.channel.map(|c| c + 1)
    }

    /// True when this is a channel message of `family` on 0-based `channel`
    pub fn is_on_channel(&self, family: StatusFamily, channel: u8) -> bool {
        self.status_family == family && self.channel == Some(channel)
    }
}

/// Classify a raw frame
///
/// Bytes beyond the third are ignored. An empty frame classifies as
/// [`StatusFamily::Other`] with every field empty.
pub fn classify(frame: &[u8]) -> ClassifiedEvent {
    let Some(&status) = frame.first() else {
        return ClassifiedEvent {
            status_family: StatusFamily::Other,
            channel: None,
            data1: None,
            data2: None,
        };
    };

    let channel = if status < 0xF0 {
        Some(status & 0x0F)
    } else {
        None
    };

    ClassifiedEvent {
        status_family: StatusFamily::from_status(status),
        channel,
        data1: frame.get(1).copied(),
        data2: frame.get(2).copied(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_classify_note_on() {
        let event = classify(&[0x96, 46, 100]);
        assert_eq!(event.status_family, StatusFamily::NoteOn);
        assert_eq!(event.channel, Some(6));
        assert_eq!(event.human_channel(), Some(7));
        assert_eq!(event.data1, Some(46));
        assert_eq!(event.data2, Some(100));
    }

    #[test]
    fn test_classify_program_change_has_no_data2() {
        let event = classify(&[0xC3, 4]);
        assert_eq!(event.status_family, StatusFamily::ProgramChange);
        assert_eq!(event.channel, Some(3));
        assert_eq!(event.data1, Some(4));
        assert_eq!(event.data2, None);
    }

    #[test]
    fn test_classify_system_message_has_no_channel() {
        let event = classify(&[0xF8]);
        assert_eq!(event.status_family, StatusFamily::Other);
        assert_eq!(event.channel, None);
        assert_eq!(event.data1, None);
    }

    #[test]
    fn test_classify_unrouted_channel_message() {
        // Pitch bend is a channel message we do not act on
        let event = classify(&[0xE2, 0, 64]);
        assert_eq!(event.status_family, StatusFamily::Other);
        assert_eq!(event.channel, Some(2));
    }

    #[test]
    fn test_classify_short_frame() {
        let event = classify(&[0xB0]);
        assert_eq!(event.status_family, StatusFamily::ControlChange);
        assert_eq!(event.data1, None);
        assert_eq!(event.data2, None);
    }

    #[test]
    fn test_classify_empty_frame() {
        let event = classify(&[]);
        assert_eq!(event.status_family, StatusFamily::Other);
        assert_eq!(event.channel, None);
    }

    #[test]
    fn test_family_round_trips_through_nibble() {
        for family in [
            StatusFamily::NoteOn,
            StatusFamily::NoteOff,
            StatusFamily::ControlChange,
            StatusFamily::ProgramChange,
        ] {
            let nibble = family.status_nibble().unwrap();
            assert_eq!(StatusFamily::from_status(nibble | 0x05), family);
        }
        assert_eq!(StatusFamily::Other.status_nibble(), None);
    }

    proptest! {
        #[test]
        fn channel_messages_keep_low_nibble(status in 0x80u8..0xF0, d1: u8, d2: u8, len in 1usize..=3) {
            let frame = [status, d1, d2];
            let event = classify(&frame[..len]);
            prop_assert_eq!(event.channel, Some(status & 0x0F));
            prop_assert_eq!(event.status_family, StatusFamily::from_status(status & 0xF0));
            prop_assert_eq!(event.data1.is_some(), len >= 2);
            prop_assert_eq!(event.data2.is_some(), len >= 3);
        }

        #[test]
        fn system_messages_have_no_channel(status in 0xF0u8..=0xFF, d1: u8, len in 1usize..=2) {
            let frame = [status, d1];
            let event = classify(&frame[..len]);
            prop_assert_eq!(event.channel, None);
            prop_assert_eq!(event.status_family, StatusFamily::Other);
        }

        #[test]
        fn data2_implies_data1(frame in proptest::collection::vec(any::<u8>(), 0..=3)) {
            let event = classify(&frame);
            if event.data2.is_some() {
                prop_assert!(event.data1.is_some());
            }
        }
    }
}
