//! Mapping identifier space for rack patches
//!
//! This crate provides:
//! - Panel knob/button id ranges
//! - Packed MIDI ids (per-voice notes, CC, gate-on-note, clock, transport)
//!   with channel bits, and the pure classifiers over them
//! - A tagged [`MappingId`] decode/encode pair over the packed space
//! - Numeric conversions (7-bit, pitch bend, note to volts) and their calibration
//!
//! # Id space
//!
//! ```text
//! 0..=43      panel knobs, then expander pots
//! 44..=75     expander buttons
//! 0x100       per-voice MIDI note events
//! 0x200       MIDI CC + pitch wheel
//! 0x300       MIDI gate-on-note
//! 0x400       MIDI clock (+ divisions)
//! 0x500       MIDI transport
//! 0x800 flag  channel in bits 12-15
//! ```
//!
//! Nothing here holds state; every function is a plain computation.

pub mod convert;
pub mod ids;
mod mapping_id;
pub mod panel;

pub use convert::{
    note_to_volts, s14_to_semitones, u7_to_volts, MidiCalibration, PolyFloor,
    DEFAULT_REFERENCE_NOTE,
};
pub use ids::{midi_channel, polychan, set_midi_channel, strip_midi_channel};
pub use mapping_id::{ChanneledId, ClockDivision, MappingId, NoteEventKind, TransportEvent};
