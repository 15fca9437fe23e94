//! Persistence error types

use std::path::PathBuf;
use thiserror::Error;

/// Failure converting one document node to an entity
#[derive(Error, Debug)]
pub enum NodeError {
    #[error("Expected a map node")]
    NotAMap,

    #[error("Invalid node: {0}")]
    Invalid(#[from] serde_yaml::Error),
}

pub type NodeResult<T> = Result<T, NodeError>;

/// Whole-document load failures
///
/// Any of these leaves the target patch untouched.
#[derive(Error, Debug)]
pub enum PatchLoadError {
    #[error("Failed to read patch file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Patch is not valid YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Patch document is empty")]
    EmptyDocument,

    #[error("Patch document has no PatchData")]
    MissingPatchData,

    #[error("PatchData has no patch_name")]
    MissingPatchName,
}

#[derive(Error, Debug)]
pub enum PatchSaveError {
    #[error("Failed to convert patch: {0}")]
    Node(#[from] NodeError),

    #[error("Failed to write YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
