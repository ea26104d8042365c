//! Contract between the sensor entities and the Cocoro Air API client.
//!
//! The client owns the vendor session and the network. Entities only call
//! [`CocoroAirApi::update`] to obtain a raw snapshot and
//! [`CocoroAirApi::get_sensor_data`] to normalize it.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mdl::{DeviceInfo, SensorValue, ValueError};

/// Result type for API client operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Error type for API client operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Client configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Communication error (unexpected status, rejected request)
    #[error("Communication error: {0}")]
    Communication(String),

    /// Snapshot could not be decoded or normalized
    #[error("Parse error: {0}")]
    Parse(String),

    /// Operation timeout
    #[error("Operation timeout after {0}ms")]
    Timeout(u64),

    /// Other error
    #[error("API error: {0}")]
    Other(#[from] anyhow::Error),
}

/// One poll's worth of raw device readings, as returned by the client.
pub type RawSnapshot = serde_json::Value;

/// The readings a Cocoro Air unit reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorField {
    Temperature,
    Humidity,
    WaterTank,
    Pm25,
    CleanedAirVolume,
    OdorLevel,
    DustLevel,
    CleanlinessLevel,
}

impl SensorField {
    /// Every field, in entity registration order.
    pub const ALL: [SensorField; 8] = [
        Self::Temperature,
        Self::Humidity,
        Self::WaterTank,
        Self::Pm25,
        Self::CleanedAirVolume,
        Self::OdorLevel,
        Self::DustLevel,
        Self::CleanlinessLevel,
    ];

    /// Key of the field in normalized sensor data; also the unique id suffix.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::WaterTank => "water_tank",
            Self::Pm25 => "pm25",
            Self::CleanedAirVolume => "cleaned_air_volume",
            Self::OdorLevel => "odor_level",
            Self::DustLevel => "dust_level",
            Self::CleanlinessLevel => "cleanliness_level",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }
}

impl std::fmt::Display for SensorField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Normalized readings. Each field holds its own outcome, so one bad field
/// does not hide the others.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorData {
    readings: HashMap<SensorField, Result<Option<SensorValue>, ValueError>>,
}

impl SensorData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: SensorField, value: Option<SensorValue>) -> Self {
        self.insert(field, value);
        self
    }

    /// Record a reading; `None` when the device reported null.
    pub fn insert(&mut self, field: SensorField, value: Option<SensorValue>) {
        self.readings.insert(field, Ok(value));
    }

    /// Record a field whose reported value could not be converted.
    pub fn reject(&mut self, field: SensorField, reason: ValueError) {
        self.readings.insert(field, Err(reason));
    }

    /// Look up a field. `None` means the key is absent, `Some(Ok(None))`
    /// means the device reported null.
    pub fn get(&self, field: SensorField) -> Option<Result<Option<SensorValue>, ValueError>> {
        self.readings.get(&field).cloned()
    }
}

/// API client for one Cocoro Air device.
#[async_trait]
pub trait CocoroAirApi: Send + Sync {
    /// Stable device identifier.
    fn device_id(&self) -> &str;

    /// Device registry description.
    fn device_info(&self) -> &DeviceInfo;

    /// Fetch the latest raw snapshot from the device.
    async fn update(&self) -> ApiResult<RawSnapshot>;

    /// Normalize a raw snapshot into per-field readings.
    fn get_sensor_data(&self, raw: &RawSnapshot) -> ApiResult<SensorData>;
}
