//! Packed MIDI mapping identifiers
//!
//! Every MIDI-derived signal that can be patched to a panel jack or knob is
//! addressed by a single `u32` in the same space as the panel controls.
//!
//! # Bit layout
//!
//! ```text
//! 0xCNnn
//!    N & 0b0111  event type (per-voice note events, CC, gate-note, clock, transport)
//!    N & 0b1000  0: omni, 1: MIDI channel given by C
//!   C            MIDI channel 0x0-0xF (channel 1-16)
//!
//! 0x1Kv  per-voice note events, K = kind (0 note, 1 gate, 2 vel, 3 aft, 4 retrig), v = voice 0-7
//! 0x2nn  CC 0x00-0x7F, 0x80 = pitch wheel
//! 0x3nn  gate held while note nn is pressed
//! 0x4dd  clock divided by dd pulses (24 PPQN), 0x400 = undivided
//! 0x50t  transport: 0 start, 1 stop, 2 continue
//! ```
//!
//! Clock and transport events never carry a channel.

pub const MIDI_MONO_NOTE_JACK: u32 = 0x100;
pub const MIDI_NOTE8_JACK: u32 = 0x107;

pub const MIDI_MONO_GATE_JACK: u32 = 0x110;
pub const MIDI_GATE8_JACK: u32 = 0x117;

pub const MIDI_MONO_VEL_JACK: u32 = 0x120;
pub const MIDI_VEL8_JACK: u32 = 0x127;

pub const MIDI_MONO_AFTERTOUCH_JACK: u32 = 0x130;
pub const MIDI_AFTERTOUCH8_JACK: u32 = 0x137;

pub const MIDI_MONO_RETRIG_JACK: u32 = 0x140;
pub const MIDI_RETRIG8_JACK: u32 = 0x147;

pub const MIDI_CC0: u32 = 0x200;
pub const MIDI_MOD_WHEEL_JACK: u32 = MIDI_CC0 + 1;
pub const MIDI_CC127: u32 = 0x27F;
pub const MIDI_PITCH_WHEEL_JACK: u32 = 0x280;

/// Note 0 (C-2) -> gate
pub const MIDI_GATE_NOTE0: u32 = 0x300;
/// Note 127 (G8) -> gate
pub const MIDI_GATE_NOTE127: u32 = 0x37F;

/// 24 PPQN clock, not divided
pub const MIDI_CLOCK_JACK: u32 = 0x400;
pub const MIDI_CLOCK_DIV1_JACK: u32 = MIDI_CLOCK_JACK + 1;
pub const MIDI_CLOCK_DIV2_JACK: u32 = MIDI_CLOCK_JACK + 2;
pub const MIDI_CLOCK_DIV3_JACK: u32 = MIDI_CLOCK_JACK + 3;
pub const MIDI_CLOCK_DIV6_JACK: u32 = MIDI_CLOCK_JACK + 6;
pub const MIDI_CLOCK_DIV12_JACK: u32 = MIDI_CLOCK_JACK + 12;
pub const MIDI_CLOCK_DIV24_JACK: u32 = MIDI_CLOCK_JACK + 24;
pub const MIDI_CLOCK_DIV48_JACK: u32 = MIDI_CLOCK_JACK + 48;
pub const MIDI_CLOCK_DIV96_JACK: u32 = MIDI_CLOCK_JACK + 96;

pub const MIDI_START_JACK: u32 = 0x500;
pub const MIDI_STOP_JACK: u32 = 0x501;
pub const MIDI_CONTINUE_JACK: u32 = 0x502;

pub const LAST_MIDI_JACK: u32 = MIDI_CONTINUE_JACK + 1;

/// Omni bit: when set, bits 12-15 carry the MIDI channel
pub const MIDI_CHANNEL_FLAG: u32 = 0x0800;

pub const MAX_MIDI_POLYPHONY: u32 = 8;
pub const NUM_MIDI_NOTES: usize = 128;
pub const NUM_MIDI_CCS: usize = 128;
/// CCs plus the pitch wheel
pub const NUM_MIDI_CCS_PW: usize = NUM_MIDI_CCS + 1;
pub const NUM_MIDI_CLOCK_JACKS: usize = (MIDI_CLOCK_DIV96_JACK - MIDI_CLOCK_JACK + 1) as usize;

/// CC index used for the pitch wheel in `midi_cc` results
pub const PITCH_BEND_CC: u32 = 128;

/// Clear the channel bits and the channel flag
pub const fn strip_midi_channel(panel_jack_id: u32) -> u32 {
    panel_jack_id & 0x07FF
}

/// Returns 0 for omni, or 1-16 for MIDI channel 1-16
pub const fn midi_channel(panel_jack_id: u32) -> u32 {
    if panel_jack_id & MIDI_CHANNEL_FLAG != 0 && strip_midi_channel(panel_jack_id) < MIDI_CLOCK_JACK {
        ((panel_jack_id >> 12) & 0xF) + 1
    } else {
        0
    }
}

/// `midi_chan`: 1-16 for a MIDI channel. Anything else gives the omni id.
pub const fn set_midi_channel(panel_jack_id: u32, midi_chan: u32) -> u32 {
    if midi_chan >= 1 && midi_chan <= 16 {
        strip_midi_channel(panel_jack_id) | MIDI_CHANNEL_FLAG | ((midi_chan - 1) << 12)
    } else {
        strip_midi_channel(panel_jack_id)
    }
}

/// Offset of `id` from `low` when it lies in `low..=high`
const fn between(id: u32, low: u32, high: u32) -> Option<u32> {
    if id >= low && id <= high {
        Some(id - low)
    } else {
        None
    }
}

/// Voice index (0-7) of a note pitch id
pub const fn midi_note_pitch(panel_jack_id: u32) -> Option<u32> {
    between(strip_midi_channel(panel_jack_id), MIDI_MONO_NOTE_JACK, MIDI_NOTE8_JACK)
}

/// Voice index (0-7) of a note gate id
pub const fn midi_note_gate(panel_jack_id: u32) -> Option<u32> {
    between(strip_midi_channel(panel_jack_id), MIDI_MONO_GATE_JACK, MIDI_GATE8_JACK)
}

/// Voice index (0-7) of a note velocity id
pub const fn midi_note_vel(panel_jack_id: u32) -> Option<u32> {
    between(strip_midi_channel(panel_jack_id), MIDI_MONO_VEL_JACK, MIDI_VEL8_JACK)
}

/// Voice index (0-7) of a note aftertouch id
pub const fn midi_note_aft(panel_jack_id: u32) -> Option<u32> {
    between(
        strip_midi_channel(panel_jack_id),
        MIDI_MONO_AFTERTOUCH_JACK,
        MIDI_AFTERTOUCH8_JACK,
    )
}

/// Voice index (0-7) of a note retrigger id
pub const fn midi_note_retrig(panel_jack_id: u32) -> Option<u32> {
    between(strip_midi_channel(panel_jack_id), MIDI_MONO_RETRIG_JACK, MIDI_RETRIG8_JACK)
}

/// Note number (0-127) of a gate-on-note id
pub const fn midi_gate(panel_jack_id: u32) -> Option<u32> {
    between(strip_midi_channel(panel_jack_id), MIDI_GATE_NOTE0, MIDI_GATE_NOTE127)
}

/// CC number (0-127), or [`PITCH_BEND_CC`] for the pitch wheel
pub const fn midi_cc(panel_jack_id: u32) -> Option<u32> {
    between(strip_midi_channel(panel_jack_id), MIDI_CC0, MIDI_PITCH_WHEEL_JACK)
}

/// `Some(0)` for the undivided clock
pub const fn midi_clk(panel_jack_id: u32) -> Option<u32> {
    if strip_midi_channel(panel_jack_id) == MIDI_CLOCK_JACK {
        Some(0)
    } else {
        None
    }
}

/// Offset from the divide-by-1 clock id (division amount minus one)
pub const fn midi_divclk(panel_jack_id: u32) -> Option<u32> {
    between(
        strip_midi_channel(panel_jack_id),
        MIDI_CLOCK_DIV1_JACK,
        MIDI_CLOCK_DIV96_JACK,
    )
}

/// 0 start, 1 stop, 2 continue
pub const fn midi_transport(panel_jack_id: u32) -> Option<u32> {
    between(strip_midi_channel(panel_jack_id), MIDI_START_JACK, MIDI_CONTINUE_JACK)
}

/// Returns 1-8 for the poly channel of a per-voice note event id
///
/// Voice nibbles above 7 are capped to the last voice.
pub const fn polychan(panel_jack_id: u32) -> Option<u32> {
    polychan_from(panel_jack_id, MIDI_MONO_NOTE_JACK)
}

/// [`polychan`] with an explicit inclusive lower bound for the per-voice block
pub const fn polychan_from(panel_jack_id: u32, floor: u32) -> Option<u32> {
    let id = strip_midi_channel(panel_jack_id);
    if id >= floor && id < MIDI_CC0 {
        let voice = if id & 0x0F < 7 { id & 0x0F } else { 7 };
        Some(voice + 1)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polychan() {
        assert_eq!(polychan(MIDI_MONO_NOTE_JACK), Some(1));
        assert_eq!(polychan(MIDI_MONO_NOTE_JACK + 1), Some(2));
        assert_eq!(polychan(MIDI_NOTE8_JACK), Some(8));
        assert_eq!(polychan(MIDI_MONO_RETRIG_JACK + 1), Some(2));
        assert_eq!(polychan(MIDI_RETRIG8_JACK), Some(8));
        // Voice nibble past 7 is capped
        assert_eq!(polychan(0x108), Some(8));
        assert_eq!(polychan(0x10F), Some(8));

        assert_eq!(polychan(MIDI_CC0), None);
        assert_eq!(polychan(3), None);
        assert_eq!(polychan(MIDI_CLOCK_JACK), None);
    }

    #[test]
    fn test_polychan_note_range() {
        for id in MIDI_MONO_NOTE_JACK..=MIDI_NOTE8_JACK {
            assert_eq!(polychan(id), Some((id & 0xF).min(7) + 1));
        }
    }

    #[test]
    fn test_polychan_ignores_channel() {
        let id = set_midi_channel(MIDI_MONO_GATE_JACK + 3, 10);
        assert_eq!(polychan(id), Some(4));
    }

    #[test]
    fn test_midi_channel_roundtrip() {
        for ch in 1..=16 {
            let id = set_midi_channel(MIDI_CC0 + 7, ch);
            assert_eq!(midi_channel(id), ch);
            assert_eq!(strip_midi_channel(id), MIDI_CC0 + 7);
        }
    }

    #[test]
    fn test_midi_channel_omni() {
        assert_eq!(midi_channel(set_midi_channel(MIDI_CC0, 0)), 0);
        assert_eq!(midi_channel(set_midi_channel(MIDI_CC0, 17)), 0);
        assert_eq!(set_midi_channel(MIDI_CC0 | 0x3800, 0), MIDI_CC0);
        assert_eq!(midi_channel(MIDI_GATE_NOTE0 + 60), 0);
    }

    #[test]
    fn test_channel_bits_layout() {
        assert_eq!(set_midi_channel(MIDI_CC0, 1), 0x0A00);
        assert_eq!(set_midi_channel(MIDI_CC0, 16), 0xFA00);
    }

    #[test]
    fn test_clock_has_no_channel() {
        let id = set_midi_channel(MIDI_CLOCK_DIV24_JACK, 5);
        assert_eq!(midi_channel(id), 0);
        let id = set_midi_channel(MIDI_STOP_JACK, 5);
        assert_eq!(midi_channel(id), 0);
    }

    #[test]
    fn test_note_event_classifiers() {
        assert_eq!(midi_note_pitch(MIDI_MONO_NOTE_JACK + 2), Some(2));
        assert_eq!(midi_note_pitch(MIDI_MONO_GATE_JACK), None);
        assert_eq!(midi_note_gate(MIDI_GATE8_JACK), Some(7));
        assert_eq!(midi_note_vel(MIDI_MONO_VEL_JACK), Some(0));
        assert_eq!(midi_note_aft(MIDI_MONO_AFTERTOUCH_JACK + 5), Some(5));
        assert_eq!(midi_note_retrig(MIDI_MONO_RETRIG_JACK + 1), Some(1));
        assert_eq!(midi_note_retrig(0x148), None);
    }

    #[test]
    fn test_cc_and_gate_classifiers() {
        assert_eq!(midi_cc(MIDI_CC0), Some(0));
        assert_eq!(midi_cc(MIDI_MOD_WHEEL_JACK), Some(1));
        assert_eq!(midi_cc(MIDI_CC127), Some(127));
        assert_eq!(midi_cc(MIDI_PITCH_WHEEL_JACK), Some(PITCH_BEND_CC));
        assert_eq!(midi_cc(0x281), None);
        assert_eq!(midi_cc(set_midi_channel(MIDI_CC0 + 74, 3)), Some(74));

        assert_eq!(midi_gate(MIDI_GATE_NOTE0 + 60), Some(60));
        assert_eq!(midi_gate(MIDI_GATE_NOTE127), Some(127));
        assert_eq!(midi_gate(MIDI_CC0), None);
    }

    #[test]
    fn test_clock_and_transport_classifiers() {
        assert_eq!(midi_clk(MIDI_CLOCK_JACK), Some(0));
        assert_eq!(midi_clk(MIDI_CLOCK_DIV1_JACK), None);
        assert_eq!(midi_divclk(MIDI_CLOCK_DIV1_JACK), Some(0));
        assert_eq!(midi_divclk(MIDI_CLOCK_DIV96_JACK), Some(95));
        assert_eq!(midi_divclk(MIDI_CLOCK_JACK), None);

        assert_eq!(midi_transport(MIDI_START_JACK), Some(0));
        assert_eq!(midi_transport(MIDI_CONTINUE_JACK), Some(2));
        assert_eq!(midi_transport(LAST_MIDI_JACK), None);
    }

    #[test]
    fn test_num_clock_jacks() {
        assert_eq!(NUM_MIDI_CLOCK_JACKS, 97);
    }
}
