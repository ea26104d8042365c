//! Configuration loading for the Cocoro Air client.
//!
//! Settings come from the `[cocoro_air]` section of a TOML file, then
//! environment variables override individual fields.
//!
//! ```toml
//! [cocoro_air]
//! device_id = "living-room"
//! url = "http://127.0.0.1:8080/cocoro/status"
//! auth_token = "token123"
//! timeout = 10
//! data_path = "data"
//!
//! [cocoro_air.paths]
//! pm25 = "air.pm25"
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Default values.
pub mod defaults {
    /// Configuration file looked up when no path is given.
    pub const CONFIG_FILE: &str = "config.toml";
    /// HTTP request timeout in seconds.
    pub const TIMEOUT_SECS: u64 = 10;
    pub const MANUFACTURER: &str = "Sharp";
    pub const MODEL: &str = "Cocoro Air";
    pub const DEVICE_NAME: &str = "Cocoro Air";
}

/// Environment variable names.
pub mod env_vars {
    pub const URL: &str = "COCORO_AIR_URL";
    pub const TOKEN: &str = "COCORO_AIR_TOKEN";
    pub const DEVICE_ID: &str = "COCORO_AIR_DEVICE_ID";
    /// Switches the CLI to JSON log output.
    pub const LOG_JSON: &str = "COCORO_AIR_LOG_JSON";
}

/// Connection and device settings for one Cocoro Air unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CocoroAirSettings {
    /// Stable device identifier, used as the unique id prefix of every entity
    #[serde(default)]
    pub device_id: String,
    /// Display name for the device registry
    #[serde(default)]
    pub name: Option<String>,
    /// Device model
    #[serde(default)]
    pub model: Option<String>,
    /// Firmware version, if known
    #[serde(default)]
    pub sw_version: Option<String>,
    /// Snapshot endpoint URL
    #[serde(default)]
    pub url: String,
    /// Bearer token sent with every request
    #[serde(default)]
    pub auth_token: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Dot-notation prefix applied to every field path (e.g. "data")
    #[serde(default)]
    pub data_path: Option<String>,
    /// Extra HTTP headers
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Per-field path overrides, keyed by field key
    #[serde(default)]
    pub paths: HashMap<String, String>,
}

fn default_timeout() -> u64 {
    defaults::TIMEOUT_SECS
}

impl Default for CocoroAirSettings {
    fn default() -> Self {
        Self {
            device_id: String::new(),
            name: None,
            model: None,
            sw_version: None,
            url: String::new(),
            auth_token: None,
            timeout: defaults::TIMEOUT_SECS,
            data_path: None,
            headers: HashMap::new(),
            paths: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TomlConfig {
    cocoro_air: Option<CocoroAirSettings>,
}

impl CocoroAirSettings {
    /// Parse settings from TOML text. A missing `[cocoro_air]` section
    /// yields the defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)?;
        Ok(config.cocoro_air.unwrap_or_default())
    }

    /// Load settings from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Io(format!("cannot read {}: {}", path.display(), e)))?;
        info!(category = "config", path = %path.display(), "Loading Cocoro Air config");
        Self::from_toml_str(&content)
    }

    /// Load settings from the file (if it exists), apply environment
    /// overrides and validate the result.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = if path.exists() {
            Self::from_file(path)?
        } else {
            debug!(category = "config", path = %path.display(), "Config file not found, using defaults");
            Self::default()
        };
        let settings = settings.with_overrides(|key| std::env::var(key).ok());
        settings.validate()?;
        Ok(settings)
    }

    /// Apply overrides looked up by environment variable name.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(env_vars::URL) {
            self.url = url;
        }
        if let Some(token) = lookup(env_vars::TOKEN) {
            self.auth_token = Some(token);
        }
        if let Some(device_id) = lookup(env_vars::DEVICE_ID) {
            self.device_id = device_id;
        }
        self
    }

    /// Check required fields.
    pub fn validate(&self) -> Result<()> {
        if self.device_id.trim().is_empty() {
            return Err(crate::config_err!("device_id must not be empty"));
        }
        if self.url.trim().is_empty() {
            return Err(crate::config_err!("url must not be empty"));
        }
        if self.timeout == 0 {
            return Err(crate::validation_err!("timeout must be greater than zero"));
        }
        Ok(())
    }

    /// Display name, falling back to the default device name.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(defaults::DEVICE_NAME)
    }
}
