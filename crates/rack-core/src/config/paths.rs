//! Standard locations for rack patches and configuration

use std::path::PathBuf;

/// Get the default rack directory
///
/// Returns: `~/Documents/rack`
pub fn default_rack_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("rack")
}

/// Get the default path of a config file
///
/// Returns: `~/Documents/rack/{filename}`
pub fn default_config_path(filename: &str) -> PathBuf {
    default_rack_path().join(filename)
}
