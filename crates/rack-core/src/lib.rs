//! Rack Core - patch data model, YAML persistence and configuration
//!
//! A patch is a set of module instances (identified by position), the
//! cables between their jacks, the panel jacks/knobs/lights mapped onto
//! them, switchable knob sets, and MIDI settings. [`patch::PatchData`]
//! owns all of it; [`persist`] reads and writes it as YAML.

pub mod config;
pub mod patch;
pub mod persist;

pub use patch::{Jack, KnobSetId, MappedKnob, PatchData, PatchError, PatchResult};
pub use persist::{load_patch_file, patch_to_yaml, save_patch_file, yaml_to_patch, PatchLoadError};
