//! YAML persistence for patches
//!
//! - [`PatchNode`]: per-entity node conversion
//! - [`yaml_to_patch`] / [`patch_to_yaml`]: whole documents
//! - [`load_patch_file`] / [`save_patch_file`]: file helpers
//!
//! Loading is lenient. Malformed elements are skipped with a warning and
//! module references are taken as written; only a document without
//! `PatchData`/`patch_name` is rejected.

mod document;
mod error;
mod node;

pub use document::{
    load_patch_file, patch_to_yaml, save_patch_file, yaml_string_to_patch, yaml_to_patch,
};
pub use error::{NodeError, NodeResult, PatchLoadError, PatchSaveError};
pub use node::PatchNode;
