//! The INI configuration file.

use std::path::{Path, PathBuf};

use ini::Ini;
use tracing::{debug, warn};

use super::error::ConfigError;
use super::keys::ConfigKey;
use super::{config_directory, config_file_path};
use crate::fetch::{DEFAULT_BASE_URL, DEFAULT_INITIAL_DELAY_MS, DEFAULT_RETRY_COUNT};
use crate::sync::{FetchMode, PaintStyle, DEFAULT_SOURCE_ID};
use crate::viewport::{DEFAULT_BOUNDS_THRESHOLD, DEFAULT_ZOOM_THRESHOLD};

/// `[api]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    pub retry_count: u32,
    pub initial_backoff_ms: u64,
    /// Administrative area filter applied to every request
    pub area_code: Option<String>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            retry_count: DEFAULT_RETRY_COUNT,
            initial_backoff_ms: DEFAULT_INITIAL_DELAY_MS,
            area_code: None,
        }
    }
}

/// `[overlay]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlaySettings {
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub zoom_threshold: f64,
    pub bounds_threshold: f64,
    pub cache_ttl_secs: u64,
    pub fetch_mode: FetchMode,
    pub visible: bool,
    pub source_id: String,
    pub paint: PaintStyle,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            min_zoom: 9,
            max_zoom: 15,
            zoom_threshold: DEFAULT_ZOOM_THRESHOLD,
            bounds_threshold: DEFAULT_BOUNDS_THRESHOLD,
            cache_ttl_secs: 300,
            fetch_mode: FetchMode::Tile,
            visible: true,
            source_id: DEFAULT_SOURCE_ID.to_string(),
            paint: PaintStyle::default(),
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: config_directory().join("logs"),
            level: "info".to_string(),
        }
    }
}

/// Parsed `config.ini`. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigFile {
    pub api: ApiSettings,
    pub overlay: OverlaySettings,
    pub logging: LoggingSettings,
}

impl ConfigFile {
    /// Loads `~/.commutemap/config.ini`, or defaults if it does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Loads the file at `path`, or defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|e| match e {
            ini::Error::Io(source) => ConfigError::Io {
                path: path.to_path_buf(),
                source,
            },
            ini::Error::Parse(e) => ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            },
        })?;

        Self::from_ini(&ini)
    }

    /// Parses config contents held in memory.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(contents).map_err(|e| ConfigError::Parse {
            path: PathBuf::from("<memory>"),
            message: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for (section, properties) in ini.iter() {
            let Some(section) = section else {
                continue;
            };
            for (key, value) in properties.iter() {
                match ConfigKey::lookup(section, key) {
                    Some(config_key) => config_key.set(&mut config, value)?,
                    None => warn!(section, key, "Ignoring unknown config key"),
                }
            }
        }

        Ok(config)
    }

    /// Writes the config to `~/.commutemap/config.ini`.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Writes the config to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        self.to_ini()
            .write_to_file(path)
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        debug!(path = %path.display(), "Config file saved");
        Ok(())
    }

    fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            let value = key.get(self);
            if !value.is_empty() {
                ini.with_section(Some(key.section()))
                    .set(key.key_name(), value);
            }
        }
        ini
    }
}
