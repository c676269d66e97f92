//! Configuration file parser for ~/.config/little-lemon/config.toml.
//!
//! The file is optional and every key has a default. Keys that do not name
//! a `Config` field are ignored with a warning.
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::menu::{default_categories, DEFAULT_DEBOUNCE};

pub const DEFAULT_MENU_URL: &str =
    "https://raw.githubusercontent.com/Meta-Mobile-Developer-PC/Working-With-Data-API/main/capstone.json";
pub const DEFAULT_IMAGE_BASE_URL: &str =
    "https://github.com/Meta-Mobile-Developer-PC/Working-With-Data-API/blob/main/images";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid value for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote menu document, fetched only while the local cache is empty.
    pub menu_url: String,

    /// Folder that menu image references are resolved against.
    pub image_base_url: String,

    /// Known categories, in filter-bar and section order.
    pub categories: Vec<String>,

    /// Quiescence window for the search bar.
    pub search_debounce_ms: u64,

    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            menu_url: DEFAULT_MENU_URL.to_string(),
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
            categories: default_categories(),
            search_debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load and validate configuration from a TOML file.
    ///
    /// A missing or blank file gives `Config::default()`. Oversized files,
    /// malformed TOML and values that fail validation are errors.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = match std::fs::File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        let size = file.metadata()?.len();
        if size > Self::MAX_FILE_SIZE {
            return Err(ConfigError::TooLarge(format!(
                "{size} bytes (limit {})",
                Self::MAX_FILE_SIZE
            )));
        }

        // Bounded read: the file may grow after the size check
        let mut content = String::new();
        file.take(Self::MAX_FILE_SIZE).read_to_string(&mut content)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        for key in unknown_keys(&content) {
            tracing::warn!(key = %key, path = %path.display(), "Ignoring unknown config key");
        }

        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        tracing::info!(path = %path.display(), menu_url = %config.menu_url, "Loaded configuration");
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("menu_url", &self.menu_url),
            ("image_base_url", &self.image_base_url),
        ] {
            let parsed = url::Url::parse(value).map_err(|e| ConfigError::Invalid {
                key,
                reason: e.to_string(),
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::Invalid {
                    key,
                    reason: format!("unsupported scheme `{}`", parsed.scheme()),
                });
            }
        }

        if self.categories.is_empty() {
            return Err(ConfigError::Invalid {
                key: "categories",
                reason: "at least one category is required".to_string(),
            });
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "request_timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Top-level keys in `content` that are not `Config` fields.
///
/// Malformed TOML yields nothing here; the typed parse reports it.
fn unknown_keys(content: &str) -> Vec<String> {
    let Ok(raw) = content.parse::<toml::Table>() else {
        return Vec::new();
    };
    let known = match toml::Value::try_from(Config::default()) {
        Ok(toml::Value::Table(fields)) => fields,
        _ => return Vec::new(),
    };
    raw.keys()
        .filter(|key| !known.contains_key(key.as_str()))
        .cloned()
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
