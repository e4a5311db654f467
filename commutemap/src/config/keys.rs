//! Registry of settable configuration keys.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use tracing_subscriber::EnvFilter;
use url::Url;

use super::error::ConfigError;
use super::file::ConfigFile;
use crate::coord::MAX_ZOOM;
use crate::sync::FetchMode;

/// Every key that can appear in `config.ini`, addressed as `section.key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    ApiBaseUrl,
    ApiTimeoutSecs,
    ApiRetryCount,
    ApiInitialBackoffMs,
    ApiAreaCode,
    OverlayMinZoom,
    OverlayMaxZoom,
    OverlayZoomThreshold,
    OverlayBoundsThreshold,
    OverlayCacheTtlSecs,
    OverlayFetchMode,
    OverlayVisible,
    OverlaySourceId,
    OverlayFillColor,
    OverlayStrokeColor,
    OverlayOpacity,
    OverlayStrokeWidth,
    LoggingDirectory,
    LoggingLevel,
}

const ALL_KEYS: [ConfigKey; 19] = [
    ConfigKey::ApiBaseUrl,
    ConfigKey::ApiTimeoutSecs,
    ConfigKey::ApiRetryCount,
    ConfigKey::ApiInitialBackoffMs,
    ConfigKey::ApiAreaCode,
    ConfigKey::OverlayMinZoom,
    ConfigKey::OverlayMaxZoom,
    ConfigKey::OverlayZoomThreshold,
    ConfigKey::OverlayBoundsThreshold,
    ConfigKey::OverlayCacheTtlSecs,
    ConfigKey::OverlayFetchMode,
    ConfigKey::OverlayVisible,
    ConfigKey::OverlaySourceId,
    ConfigKey::OverlayFillColor,
    ConfigKey::OverlayStrokeColor,
    ConfigKey::OverlayOpacity,
    ConfigKey::OverlayStrokeWidth,
    ConfigKey::LoggingDirectory,
    ConfigKey::LoggingLevel,
];

impl ConfigKey {
    /// All keys in file order.
    pub fn all() -> &'static [ConfigKey] {
        &ALL_KEYS
    }

    /// Finds the key for a section and key name.
    pub fn lookup(section: &str, key: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|k| {
                k.section().eq_ignore_ascii_case(section) && k.key_name().eq_ignore_ascii_case(key)
            })
    }

    pub fn section(&self) -> &'static str {
        match self {
            Self::ApiBaseUrl
            | Self::ApiTimeoutSecs
            | Self::ApiRetryCount
            | Self::ApiInitialBackoffMs
            | Self::ApiAreaCode => "api",
            Self::LoggingDirectory | Self::LoggingLevel => "logging",
            _ => "overlay",
        }
    }

    pub fn key_name(&self) -> &'static str {
        match self {
            Self::ApiBaseUrl => "base_url",
            Self::ApiTimeoutSecs => "timeout_secs",
            Self::ApiRetryCount => "retry_count",
            Self::ApiInitialBackoffMs => "initial_backoff_ms",
            Self::ApiAreaCode => "area_code",
            Self::OverlayMinZoom => "min_zoom",
            Self::OverlayMaxZoom => "max_zoom",
            Self::OverlayZoomThreshold => "zoom_threshold",
            Self::OverlayBoundsThreshold => "bounds_threshold",
            Self::OverlayCacheTtlSecs => "cache_ttl_secs",
            Self::OverlayFetchMode => "fetch_mode",
            Self::OverlayVisible => "visible",
            Self::OverlaySourceId => "source_id",
            Self::OverlayFillColor => "fill_color",
            Self::OverlayStrokeColor => "stroke_color",
            Self::OverlayOpacity => "opacity",
            Self::OverlayStrokeWidth => "stroke_width",
            Self::LoggingDirectory => "directory",
            Self::LoggingLevel => "level",
        }
    }

    /// Full `section.key` name.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value as it would be written to the file. Empty when unset.
    pub fn get(&self, config: &ConfigFile) -> String {
        let api = &config.api;
        let overlay = &config.overlay;
        match self {
            Self::ApiBaseUrl => api.base_url.clone(),
            Self::ApiTimeoutSecs => api.timeout_secs.to_string(),
            Self::ApiRetryCount => api.retry_count.to_string(),
            Self::ApiInitialBackoffMs => api.initial_backoff_ms.to_string(),
            Self::ApiAreaCode => api.area_code.clone().unwrap_or_default(),
            Self::OverlayMinZoom => overlay.min_zoom.to_string(),
            Self::OverlayMaxZoom => overlay.max_zoom.to_string(),
            Self::OverlayZoomThreshold => overlay.zoom_threshold.to_string(),
            Self::OverlayBoundsThreshold => overlay.bounds_threshold.to_string(),
            Self::OverlayCacheTtlSecs => overlay.cache_ttl_secs.to_string(),
            Self::OverlayFetchMode => overlay.fetch_mode.to_string(),
            Self::OverlayVisible => overlay.visible.to_string(),
            Self::OverlaySourceId => overlay.source_id.clone(),
            Self::OverlayFillColor => overlay.paint.fill_color.clone(),
            Self::OverlayStrokeColor => overlay.paint.stroke_color.clone(),
            Self::OverlayOpacity => overlay.paint.opacity.to_string(),
            Self::OverlayStrokeWidth => overlay.paint.stroke_width.to_string(),
            Self::LoggingDirectory => config.logging.directory.display().to_string(),
            Self::LoggingLevel => config.logging.level.clone(),
        }
    }

    /// Validates `value` and stores it in `config`.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        let name = self.name();
        let api = &mut config.api;
        let overlay = &mut config.overlay;

        match self {
            Self::ApiBaseUrl => {
                let url = Url::parse(value)
                    .map_err(|e| ConfigError::invalid(&name, value, e.to_string()))?;
                if !matches!(url.scheme(), "http" | "https") {
                    return Err(ConfigError::invalid(&name, value, "expected an http or https URL"));
                }
                api.base_url = value.to_string();
            }
            Self::ApiTimeoutSecs => {
                let secs: u64 = parse_number(&name, value)?;
                if secs == 0 {
                    return Err(ConfigError::invalid(&name, value, "must be greater than zero"));
                }
                api.timeout_secs = secs;
            }
            Self::ApiRetryCount => api.retry_count = parse_number(&name, value)?,
            Self::ApiInitialBackoffMs => api.initial_backoff_ms = parse_number(&name, value)?,
            Self::ApiAreaCode => {
                api.area_code = (!value.is_empty()).then(|| value.to_string());
            }
            Self::OverlayMinZoom => overlay.min_zoom = parse_zoom(&name, value)?,
            Self::OverlayMaxZoom => overlay.max_zoom = parse_zoom(&name, value)?,
            Self::OverlayZoomThreshold => {
                overlay.zoom_threshold = parse_non_negative(&name, value)?
            }
            Self::OverlayBoundsThreshold => {
                overlay.bounds_threshold = parse_non_negative(&name, value)?
            }
            Self::OverlayCacheTtlSecs => overlay.cache_ttl_secs = parse_number(&name, value)?,
            Self::OverlayFetchMode => {
                overlay.fetch_mode =
                    FetchMode::from_str(value).map_err(|e| ConfigError::invalid(&name, value, e))?;
            }
            Self::OverlayVisible => overlay.visible = parse_bool(&name, value)?,
            Self::OverlaySourceId => {
                if value.is_empty() {
                    return Err(ConfigError::invalid(&name, value, "must not be empty"));
                }
                overlay.source_id = value.to_string();
            }
            Self::OverlayFillColor => overlay.paint.fill_color = parse_color(&name, value)?,
            Self::OverlayStrokeColor => overlay.paint.stroke_color = parse_color(&name, value)?,
            Self::OverlayOpacity => {
                let opacity = parse_non_negative(&name, value)?;
                if opacity > 1.0 {
                    return Err(ConfigError::invalid(&name, value, "must be between 0 and 1"));
                }
                overlay.paint.opacity = opacity;
            }
            Self::OverlayStrokeWidth => {
                overlay.paint.stroke_width = parse_non_negative(&name, value)?
            }
            Self::LoggingDirectory => {
                if value.is_empty() {
                    return Err(ConfigError::invalid(&name, value, "must not be empty"));
                }
                config.logging.directory = expand_tilde(value);
            }
            Self::LoggingLevel => {
                EnvFilter::try_new(value)
                    .map_err(|e| ConfigError::invalid(&name, value, e.to_string()))?;
                config.logging.level = value.to_string();
            }
        }
        Ok(())
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section(), self.key_name())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (section, key) = s
            .trim()
            .split_once('.')
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))?;
        Self::lookup(section, key).ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

fn parse_number<T: FromStr>(name: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| ConfigError::invalid(name, value, e.to_string()))
}

fn parse_zoom(name: &str, value: &str) -> Result<u8, ConfigError> {
    let zoom: u8 = parse_number(name, value)?;
    if zoom > MAX_ZOOM {
        return Err(ConfigError::invalid(
            name,
            value,
            format!("zoom must be at most {}", MAX_ZOOM),
        ));
    }
    Ok(zoom)
}

fn parse_non_negative(name: &str, value: &str) -> Result<f64, ConfigError> {
    let v: f64 = parse_number(name, value)?;
    if !v.is_finite() || v < 0.0 {
        return Err(ConfigError::invalid(name, value, "must be a non-negative number"));
    }
    Ok(v)
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(ConfigError::invalid(name, value, "expected true or false")),
    }
}

/// Accepts `#RGB` and `#RRGGBB`.
fn parse_color(name: &str, value: &str) -> Result<String, ConfigError> {
    let valid = value
        .strip_prefix('#')
        .is_some_and(|hex| {
            matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
        });
    if !valid {
        return Err(ConfigError::invalid(name, value, "expected a #RRGGBB color"));
    }
    Ok(value.to_ascii_uppercase())
}

fn expand_tilde(value: &str) -> PathBuf {
    match value.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(value)),
        None => PathBuf::from(value),
    }
}
