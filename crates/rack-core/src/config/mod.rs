//! Configuration for rack tools
//!
//! - Rack directory paths
//! - [`RackConfig`]: patch directory and MIDI calibration, loaded and
//!   saved as YAML
//!
//! # Usage
//!
//! ```ignore
//! use rack_core::config::{default_config_path, RackConfig, CONFIG_FILENAME};
//!
//! let config = RackConfig::load(&default_config_path(CONFIG_FILENAME));
//! ```

mod paths;
mod rack;

pub use paths::{default_config_path, default_rack_path};
pub use rack::{RackConfig, CONFIG_FILENAME};
