//! Tagged view of the packed mapping id space
//!
//! Patches store plain `u32` ids. Code that needs to know *what* an id
//! refers to decodes it once into a [`MappingId`] and matches on it instead
//! of chaining range checks.

use crate::ids::*;
use crate::panel::{FIRST_BUTTON, LAST_BUTTON, LAST_POSSIBLE_KNOB};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-voice note event kind (second nibble of the `0x1xx` block)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteEventKind {
    Pitch,
    Gate,
    Velocity,
    Aftertouch,
    Retrig,
}

impl NoteEventKind {
    fn base(self) -> u32 {
        match self {
            Self::Pitch => MIDI_MONO_NOTE_JACK,
            Self::Gate => MIDI_MONO_GATE_JACK,
            Self::Velocity => MIDI_MONO_VEL_JACK,
            Self::Aftertouch => MIDI_MONO_AFTERTOUCH_JACK,
            Self::Retrig => MIDI_MONO_RETRIG_JACK,
        }
    }

    fn from_nibble(nibble: u32) -> Option<Self> {
        match nibble {
            0 => Some(Self::Pitch),
            1 => Some(Self::Gate),
            2 => Some(Self::Velocity),
            3 => Some(Self::Aftertouch),
            4 => Some(Self::Retrig),
            _ => None,
        }
    }
}

/// Supported MIDI clock subdivisions, in pulses of the 24 PPQN clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockDivision {
    /// Raw 24 PPQN clock
    Undivided,
    Div1,
    Div2,
    /// 32nd note
    Div3,
    /// 16th note
    Div6,
    /// 8th note
    Div12,
    /// Quarter note
    Div24,
    /// Half note
    Div48,
    /// Whole note
    Div96,
}

impl ClockDivision {
    pub const ALL: [ClockDivision; 9] = [
        Self::Undivided,
        Self::Div1,
        Self::Div2,
        Self::Div3,
        Self::Div6,
        Self::Div12,
        Self::Div24,
        Self::Div48,
        Self::Div96,
    ];

    /// Number of clock pulses per output tick (0 for undivided)
    pub fn pulses(self) -> u32 {
        match self {
            Self::Undivided => 0,
            Self::Div1 => 1,
            Self::Div2 => 2,
            Self::Div3 => 3,
            Self::Div6 => 6,
            Self::Div12 => 12,
            Self::Div24 => 24,
            Self::Div48 => 48,
            Self::Div96 => 96,
        }
    }

    pub fn from_pulses(pulses: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.pulses() == pulses)
    }
}

/// MIDI transport events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportEvent {
    Start,
    Stop,
    Continue,
}

/// Decoded form of a channel-stripped panel jack/knob id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MappingId {
    /// Panel knob or expander pot (0-43)
    PanelKnob { index: u8 },
    /// Expander button, indexed from the first button slot
    PanelButton { index: u8 },
    /// Per-voice note event, voice 0-7
    MidiNote { kind: NoteEventKind, voice: u8 },
    /// Control change 0-127
    MidiCc { cc: u8 },
    MidiPitchWheel,
    /// Gate held high while the note is pressed
    MidiGateNote { note: u8 },
    MidiClock { division: ClockDivision },
    Transport { event: TransportEvent },
}

impl MappingId {
    /// Decode a packed id. Channel bits are ignored.
    ///
    /// Returns `None` for ids in unused parts of the space (e.g. voice 8-15
    /// nibbles, clock divisions that have no dedicated jack).
    pub fn decode(panel_jack_id: u32) -> Option<Self> {
        let id = strip_midi_channel(panel_jack_id);

        if id <= LAST_POSSIBLE_KNOB {
            return Some(Self::PanelKnob { index: id as u8 });
        }
        if (FIRST_BUTTON..=LAST_BUTTON).contains(&id) {
            return Some(Self::PanelButton {
                index: (id - FIRST_BUTTON) as u8,
            });
        }

        match id & 0x700 {
            0x100 => {
                let voice = id & 0x0F;
                if voice >= MAX_MIDI_POLYPHONY {
                    return None;
                }
                let kind = NoteEventKind::from_nibble((id >> 4) & 0x0F)?;
                Some(Self::MidiNote {
                    kind,
                    voice: voice as u8,
                })
            }
            0x200 => match midi_cc(id)? {
                PITCH_BEND_CC => Some(Self::MidiPitchWheel),
                cc => Some(Self::MidiCc { cc: cc as u8 }),
            },
            0x300 => midi_gate(id).map(|note| Self::MidiGateNote { note: note as u8 }),
            0x400 => ClockDivision::from_pulses(id - MIDI_CLOCK_JACK)
                .map(|division| Self::MidiClock { division }),
            0x500 => match midi_transport(id)? {
                0 => Some(Self::Transport {
                    event: TransportEvent::Start,
                }),
                1 => Some(Self::Transport {
                    event: TransportEvent::Stop,
                }),
                _ => Some(Self::Transport {
                    event: TransportEvent::Continue,
                }),
            },
            _ => None,
        }
    }

    /// Whether every field lies inside its slot range
    pub fn is_valid(&self) -> bool {
        match *self {
            Self::PanelKnob { index } => index as u32 <= LAST_POSSIBLE_KNOB,
            Self::PanelButton { index } => FIRST_BUTTON + (index as u32) <= LAST_BUTTON,
            Self::MidiNote { voice, .. } => (voice as u32) < MAX_MIDI_POLYPHONY,
            Self::MidiCc { cc } => MIDI_CC0 + cc as u32 <= MIDI_CC127,
            Self::MidiGateNote { note } => MIDI_GATE_NOTE0 + note as u32 <= MIDI_GATE_NOTE127,
            Self::MidiPitchWheel | Self::MidiClock { .. } | Self::Transport { .. } => true,
        }
    }

    /// Pack into the omni (channel-less) id
    ///
    /// `None` when a field is out of range, e.g. voice 8 or knob 50, since
    /// the packed id would land in another slot.
    pub fn encode(self) -> Option<u32> {
        if !self.is_valid() {
            return None;
        }
        let id = match self {
            Self::PanelKnob { index } => index as u32,
            Self::PanelButton { index } => FIRST_BUTTON + index as u32,
            Self::MidiNote { kind, voice } => kind.base() + voice as u32,
            Self::MidiCc { cc } => MIDI_CC0 + cc as u32,
            Self::MidiPitchWheel => MIDI_PITCH_WHEEL_JACK,
            Self::MidiGateNote { note } => MIDI_GATE_NOTE0 + note as u32,
            Self::MidiClock { division } => MIDI_CLOCK_JACK + division.pulses(),
            Self::Transport { event } => match event {
                TransportEvent::Start => MIDI_START_JACK,
                TransportEvent::Stop => MIDI_STOP_JACK,
                TransportEvent::Continue => MIDI_CONTINUE_JACK,
            },
        };
        Some(id)
    }

    /// MIDI-derived (anything other than panel hardware)
    pub fn is_midi(&self) -> bool {
        !matches!(self, Self::PanelKnob { .. } | Self::PanelButton { .. })
    }

    /// Whether a MIDI channel can be attached to this id
    pub fn accepts_channel(&self) -> bool {
        matches!(
            self,
            Self::MidiNote { .. }
                | Self::MidiCc { .. }
                | Self::MidiPitchWheel
                | Self::MidiGateNote { .. }
        )
    }

    /// Poly channel 1-8 for per-voice note events
    pub fn polychan(&self) -> Option<u32> {
        match self {
            Self::MidiNote { voice, .. } => Some(*voice as u32 + 1),
            _ => None,
        }
    }
}

impl fmt::Display for MappingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PanelKnob { index } => write!(f, "Knob {}", index),
            Self::PanelButton { index } => write!(f, "Button {}", index),
            Self::MidiNote { kind, voice } => write!(f, "MIDI {:?} voice {}", kind, voice + 1),
            Self::MidiCc { cc } => write!(f, "MIDI CC {}", cc),
            Self::MidiPitchWheel => write!(f, "MIDI Pitch Wheel"),
            Self::MidiGateNote { note } => write!(f, "MIDI Gate Note {}", note),
            Self::MidiClock { division } => match division {
                ClockDivision::Undivided => write!(f, "MIDI Clock"),
                d => write!(f, "MIDI Clock /{}", d.pulses()),
            },
            Self::Transport { event } => write!(f, "MIDI {:?}", event),
        }
    }
}

/// A [`MappingId`] together with an optional MIDI channel (1-16)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChanneledId {
    pub id: MappingId,
    /// `None` = omni
    pub channel: Option<u8>,
}

impl ChanneledId {
    pub fn omni(id: MappingId) -> Self {
        Self { id, channel: None }
    }

    pub fn decode(panel_jack_id: u32) -> Option<Self> {
        let id = MappingId::decode(panel_jack_id)?;
        let channel = match midi_channel(panel_jack_id) {
            0 => None,
            ch => Some(ch as u8),
        };
        Some(Self { id, channel })
    }

    /// Channel is dropped for ids that cannot carry one
    pub fn encode(self) -> Option<u32> {
        let raw = self.id.encode()?;
        let id = match self.channel {
            Some(ch) if self.id.accepts_channel() => set_midi_channel(raw, ch as u32),
            _ => raw,
        };
        Some(id)
    }
}

impl fmt::Display for ChanneledId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.channel {
            Some(ch) => write!(f, "{} (ch {})", self.id, ch),
            None => write!(f, "{}", self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_panel() {
        assert_eq!(MappingId::decode(3), Some(MappingId::PanelKnob { index: 3 }));
        assert_eq!(MappingId::decode(43), Some(MappingId::PanelKnob { index: 43 }));
        assert_eq!(MappingId::decode(44), Some(MappingId::PanelButton { index: 0 }));
        assert_eq!(MappingId::decode(75), Some(MappingId::PanelButton { index: 31 }));
        assert_eq!(MappingId::decode(76), None);
    }

    #[test]
    fn test_decode_note_events() {
        assert_eq!(
            MappingId::decode(MIDI_MONO_NOTE_JACK),
            Some(MappingId::MidiNote {
                kind: NoteEventKind::Pitch,
                voice: 0
            })
        );
        assert_eq!(
            MappingId::decode(MIDI_RETRIG8_JACK),
            Some(MappingId::MidiNote {
                kind: NoteEventKind::Retrig,
                voice: 7
            })
        );
        assert_eq!(MappingId::decode(0x108), None);
        assert_eq!(MappingId::decode(0x150), None);
    }

    #[test]
    fn test_decode_cc_and_gates() {
        assert_eq!(MappingId::decode(MIDI_CC0 + 74), Some(MappingId::MidiCc { cc: 74 }));
        assert_eq!(MappingId::decode(MIDI_PITCH_WHEEL_JACK), Some(MappingId::MidiPitchWheel));
        assert_eq!(MappingId::decode(0x281), None);
        assert_eq!(
            MappingId::decode(MIDI_GATE_NOTE0 + 60),
            Some(MappingId::MidiGateNote { note: 60 })
        );
        assert_eq!(MappingId::decode(0x380), None);
    }

    #[test]
    fn test_decode_clock_and_transport() {
        assert_eq!(
            MappingId::decode(MIDI_CLOCK_JACK),
            Some(MappingId::MidiClock {
                division: ClockDivision::Undivided
            })
        );
        assert_eq!(
            MappingId::decode(MIDI_CLOCK_DIV24_JACK),
            Some(MappingId::MidiClock {
                division: ClockDivision::Div24
            })
        );
        assert_eq!(MappingId::decode(MIDI_CLOCK_JACK + 5), None);
        assert_eq!(
            MappingId::decode(MIDI_STOP_JACK),
            Some(MappingId::Transport {
                event: TransportEvent::Stop
            })
        );
        assert_eq!(MappingId::decode(0x503), None);
        assert_eq!(MappingId::decode(0x600), None);
    }

    #[test]
    fn test_encode_decode_all_valid_ids() {
        let mut checked = 0;
        for raw in 0..LAST_MIDI_JACK {
            if let Some(id) = MappingId::decode(raw) {
                assert_eq!(id.encode(), Some(raw), "id {:#x} did not re-encode", raw);
                checked += 1;
            }
        }
        // 76 panel + 40 note events + 129 CC + 128 gate notes + 9 clocks + 3 transport
        assert_eq!(checked, 76 + 40 + 129 + 128 + 9 + 3);
    }

    #[test]
    fn test_encode_rejects_out_of_range_fields() {
        // Would alias an expander button
        assert_eq!(MappingId::PanelKnob { index: 44 }.encode(), None);
        assert_eq!(MappingId::PanelKnob { index: 200 }.encode(), None);
        assert_eq!(MappingId::PanelButton { index: 31 }.encode(), Some(LAST_BUTTON));
        assert_eq!(MappingId::PanelButton { index: 32 }.encode(), None);
        // Voice 8-15 nibbles don't decode
        let voice9 = MappingId::MidiNote {
            kind: NoteEventKind::Gate,
            voice: 9,
        };
        assert!(!voice9.is_valid());
        assert_eq!(voice9.encode(), None);
        // Would alias the pitch wheel / gate note 0
        assert_eq!(MappingId::MidiCc { cc: 128 }.encode(), None);
        assert_eq!(MappingId::MidiGateNote { note: 128 }.encode(), None);

        let channeled = ChanneledId {
            id: voice9,
            channel: Some(1),
        };
        assert_eq!(channeled.encode(), None);
    }

    #[test]
    fn test_polychan_matches_packed() {
        for raw in MIDI_MONO_NOTE_JACK..MIDI_CC0 {
            if let Some(id) = MappingId::decode(raw) {
                assert_eq!(id.polychan(), polychan(raw));
            }
        }
    }

    #[test]
    fn test_channeled_id() {
        let id = ChanneledId {
            id: MappingId::MidiCc { cc: 1 },
            channel: Some(10),
        };
        let raw = id.encode().unwrap();
        assert_eq!(midi_channel(raw), 10);
        assert_eq!(ChanneledId::decode(raw), Some(id));

        let clock = ChanneledId {
            id: MappingId::MidiClock {
                division: ClockDivision::Div6,
            },
            channel: Some(3),
        };
        assert_eq!(clock.encode(), Some(MIDI_CLOCK_DIV6_JACK));
    }

    #[test]
    fn test_display() {
        assert_eq!(MappingId::MidiCc { cc: 7 }.to_string(), "MIDI CC 7");
        assert_eq!(
            ChanneledId::decode(set_midi_channel(MIDI_CC0 + 7, 2))
                .map(|id| id.to_string())
                .as_deref(),
            Some("MIDI CC 7 (ch 2)")
        );
        assert_eq!(
            MappingId::MidiClock {
                division: ClockDivision::Div12
            }
            .to_string(),
            "MIDI Clock /12"
        );
    }

    #[test]
    fn test_yaml_tagging() {
        let yaml = serde_yaml::to_string(&MappingId::MidiGateNote { note: 36 }).unwrap();
        assert!(yaml.contains("type: midi_gate_note"));
        let back: MappingId = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, MappingId::MidiGateNote { note: 36 });
    }
}
