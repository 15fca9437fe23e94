//! Patch mutation error types

use super::types::KnobSetId;
use thiserror::Error;

/// Validation failures from [`PatchData`](super::PatchData) mutations
///
/// A failed mutation leaves the patch unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    /// Knob set id past the allowed or existing range
    #[error("Knob set {set} out of range (max {max})")]
    KnobSetOutOfRange { set: KnobSetId, max: u32 },

    /// New knob sets must be appended directly after the last one
    #[error("Knob set {set} would leave a gap after the {count} existing set(s)")]
    KnobSetNotContiguous { set: u32, count: usize },

    /// Module id does not index a module in the patch
    #[error("Module {module_id} out of range ({count} modules)")]
    ModuleOutOfRange { module_id: u16, count: usize },

    /// Only MIDI CC and gate-note ids belong in the MIDI knob set
    #[error("Panel id {panel_knob_id:#x} cannot be mapped in the MIDI knob set")]
    NotMidiMappable { panel_knob_id: u16 },
}

/// Result type for patch mutations
pub type PatchResult<T> = Result<T, PatchError>;
