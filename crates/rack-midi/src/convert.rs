//! Value conversion for MIDI-derived signals
//!
//! MIDI values arrive as 7-bit (CC, velocity, aftertouch), 14-bit signed
//! (pitch bend) or note numbers. The engine works in volts, so this module
//! handles the conversion:
//! - 7-bit values: 0 to `max_volts`
//! - Pitch bend: +/- `semitones` expressed in 1V/oct
//! - Notes: 1V/oct relative to a reference note
//!
//! The reference note and the lower bound of the per-voice id block are
//! calibration choices, kept together in [`MidiCalibration`].

use crate::ids::{polychan_from, MIDI_MONO_NOTE_JACK};
use crate::panel::LAST_POSSIBLE_KNOB;
use serde::{Deserialize, Serialize};

/// Note that produces 0V (C5 in the MIDI numbering used by the panel)
pub const DEFAULT_REFERENCE_NOTE: u8 = 60;

/// Convert a 7-bit MIDI value (0-127) to 0..`max_volts`
pub fn u7_to_volts(val: u8, max_volts: f32) -> f32 {
    val as f32 / (127.0 / max_volts)
}

/// Convert a 14-bit signed pitch bend to volts, where full deflection
/// equals `semitones`
pub fn s14_to_semitones(val: i16, semitones: f32) -> f32 {
    val as f32 / (8192.0 / (semitones / 12.0))
}

/// 1V/oct, with `DEFAULT_REFERENCE_NOTE` at 0V
pub fn note_to_volts(note: u8) -> f32 {
    MidiCalibration::default().note_to_volts(note)
}

/// Lower bound used when deciding whether an id belongs to the per-voice block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolyFloor {
    /// Only ids from the mono note jack (0x100) upward
    #[default]
    MonoNote,
    /// Any id past the last knob slot
    AfterLastKnob,
}

impl PolyFloor {
    /// Inclusive lower bound
    pub fn lowest_id(self) -> u32 {
        match self {
            Self::MonoNote => MIDI_MONO_NOTE_JACK,
            Self::AfterLastKnob => LAST_POSSIBLE_KNOB + 1,
        }
    }
}

/// Hardware calibration for MIDI conversions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiCalibration {
    /// Note number that maps to 0V
    pub reference_note: u8,
    /// Where the per-voice block starts for polyphony counting
    pub poly_floor: PolyFloor,
}

impl Default for MidiCalibration {
    fn default() -> Self {
        Self {
            reference_note: DEFAULT_REFERENCE_NOTE,
            poly_floor: PolyFloor::MonoNote,
        }
    }
}

impl MidiCalibration {
    pub fn note_to_volts(&self, note: u8) -> f32 {
        (note as f32 - self.reference_note as f32) / 12.0
    }

    /// Poly channel 1-8 of a per-voice id, using this calibration's floor
    pub fn polychan(&self, panel_jack_id: u32) -> Option<u32> {
        polychan_from(panel_jack_id, self.poly_floor.lowest_id())
    }
}
