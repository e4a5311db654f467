//! User configuration stored in `~/.commutemap/config.ini`.
//!
//! ```ini
//! [api]
//! base_url = http://localhost:8000
//! timeout_secs = 30
//! retry_count = 3
//!
//! [overlay]
//! min_zoom = 9
//! max_zoom = 15
//! fetch_mode = tile
//! fill_color = #FF6B6B
//!
//! [logging]
//! level = info
//! ```

mod error;
mod file;
mod keys;

use std::path::PathBuf;

pub use error::ConfigError;
pub use file::{ApiSettings, ConfigFile, LoggingSettings, OverlaySettings};
pub use keys::ConfigKey;

/// Name of the per-user configuration directory.
pub const CONFIG_DIR_NAME: &str = ".commutemap";

/// Name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// `~/.commutemap`, or `./.commutemap` when no home directory is known.
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Full path of the configuration file.
pub fn config_file_path() -> PathBuf {
    config_directory().join(CONFIG_FILE_NAME)
}
