//! Patch data model
//!
//! - [`types`]: value types (jacks, mappings, cables, module state)
//! - [`PatchData`]: the store that owns them and keeps module ids consistent
//!
//! # Usage
//!
//! ```ignore
//! use rack_core::patch::{Jack, KnobSetId, MappedKnob, PatchData};
//!
//! let mut pd = PatchData::with_hub("My Patch");
//! let vco = pd.add_module("VCO");
//! pd.add_update_mapped_knob(KnobSetId::Index(0), MappedKnob::new(3, vco, 0))?;
//! pd.add_internal_cable(Jack::new(vco, 0), Jack::new(0, 1));
//! ```

mod data;
mod error;
pub mod types;

pub use data::{default_knob_set_name, PatchData, BLANK_SLUG, HUB_SLUG, MIDI_SET_NAME};
pub use error::{PatchError, PatchResult};
pub use types::{
    AliasName, CurveType, InternalCable, Jack, KnobSetId, MappedInputJack, MappedKnob,
    MappedKnobSet, MappedLight, MappedOutputJack, ModuleInitState, PolyMode, StaticParam,
    ALIAS_NAME_LEN, DESCRIPTION_LEN, MAX_KNOB_SETS, MIDI_KNOB_SET,
};
