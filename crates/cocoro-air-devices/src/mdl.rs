//! Value and device description types shared by the API client and the
//! sensor entities.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single reading reported by the device.
///
/// Serialized untagged, so a reading renders as a bare JSON number or
/// boolean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SensorValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
}

impl SensorValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            Self::Boolean(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Boolean(_) => "boolean",
        }
    }
}

impl From<i64> for SensorValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for SensorValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for SensorValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl std::fmt::Display for SensorValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Boolean(v) => write!(f, "{}", v),
            Self::Integer(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
        }
    }
}

/// Why a reported value cannot be shown by an entity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// A number was required
    #[error("expected a number, got {0}")]
    NotNumeric(&'static str),

    /// A boolean (or 0/1) was required
    #[error("expected a boolean, got {0}")]
    NotBoolean(String),

    /// Not a number, boolean or null
    #[error("unsupported value {0}")]
    Unsupported(String),
}

/// Physical device description attached to every entity of the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device identifiers as (domain, id) pairs
    #[serde(default)]
    pub identifiers: Vec<(String, String)>,
    /// Device name
    pub name: String,
    /// Device manufacturer
    #[serde(default)]
    pub manufacturer: Option<String>,
    /// Device model
    #[serde(default)]
    pub model: Option<String>,
    /// Firmware version
    #[serde(default)]
    pub sw_version: Option<String>,
}

impl DeviceInfo {
    /// Create device info identified by `device_id` within the `cocoro_air`
    /// domain.
    pub fn new(device_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            identifiers: vec![(crate::DOMAIN.to_string(), device_id.into())],
            name: name.into(),
            manufacturer: None,
            model: None,
            sw_version: None,
        }
    }

    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_sw_version(mut self, version: impl Into<String>) -> Self {
        self.sw_version = Some(version.into());
        self
    }
}
