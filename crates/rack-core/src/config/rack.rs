//! Rack-wide settings

use super::paths::default_rack_path;
use anyhow::{Context, Result};
use rack_midi::MidiCalibration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the rack config inside the rack directory
pub const CONFIG_FILENAME: &str = "rack.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RackConfig {
    /// Where patch files are looked up by name
    pub patch_dir: PathBuf,
    /// MIDI note reference and polyphony bounds
    pub calibration: MidiCalibration,
    /// Name given to new blank patches
    pub default_patch_name: String,
}

impl Default for RackConfig {
    fn default() -> Self {
        Self {
            patch_dir: default_rack_path().join("patches"),
            calibration: MidiCalibration::default(),
            default_patch_name: "Untitled Patch".to_string(),
        }
    }
}

impl RackConfig {
    /// Read the rack config
    ///
    /// A missing, unreadable or malformed file gives the defaults; a file
    /// that only sets some fields keeps the defaults for the rest.
    pub fn load(path: &Path) -> Self {
        log::info!("RackConfig::load: Loading from {:?}", path);

        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("RackConfig::load: No config file, using defaults");
                return Self::default();
            }
            Err(e) => {
                log::warn!("RackConfig::load: Failed to read {:?}: {}, using defaults", path, e);
                return Self::default();
            }
        };

        match serde_yaml::from_str::<Self>(&contents) {
            Ok(config) => {
                log::info!(
                    "RackConfig::load: Patches in {:?}, reference note {}",
                    config.patch_dir,
                    config.calibration.reference_note
                );
                config
            }
            Err(e) => {
                log::warn!("RackConfig::load: Invalid config: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Write the rack config, creating the rack directory if needed
    pub fn save(&self, path: &Path) -> Result<()> {
        log::info!("RackConfig::save: Saving to {:?}", path);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create rack directory: {:?}", parent))?;
        }

        let yaml = serde_yaml::to_string(self).context("Failed to serialize rack config")?;
        std::fs::write(path, yaml)
            .with_context(|| format!("Failed to write rack config: {:?}", path))?;
        Ok(())
    }

    /// Resolve a patch argument: existing paths as given, bare names inside `patch_dir`
    pub fn patch_path(&self, name: &str) -> PathBuf {
        let path = PathBuf::from(name);
        if path.exists() || path.components().count() > 1 {
            return path;
        }
        let with_ext = if path.extension().is_some() {
            path
        } else {
            path.with_extension("yml")
        };
        self.patch_dir.join(with_ext)
    }
}
