//! Polling field sensor.
//!
//! Every Cocoro Air entity has the same shape: it holds the shared API
//! client, re-fetches the snapshot on refresh and projects one field out of
//! it. A [`SensorDescriptor`] carries what differs between entities.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::api::{ApiError, CocoroAirApi, SensorField};
use crate::mdl::{DeviceInfo, SensorValue, ValueError};

/// Host platform an entity registers under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorPlatform {
    Sensor,
    BinarySensor,
}

impl SensorPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sensor => "sensor",
            Self::BinarySensor => "binary_sensor",
        }
    }
}

/// Device classification, which controls how hosts display a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorDeviceClass {
    Temperature,
    Humidity,
    /// Binary sensor: on means wet
    Moisture,
    Pm25,
}

impl SensorDeviceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Moisture => "moisture",
            Self::Pm25 => "pm25",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateClass {
    Measurement,
}

/// How a raw reading becomes the displayed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Display the raw value unchanged.
    Passthrough,
    /// Divide by `divisor` and round to the nearest integer, ties to even.
    Scaled { divisor: u32 },
}

impl Transform {
    /// Apply the transform. Scaling a non-numeric value is an error.
    pub fn apply(&self, raw: SensorValue) -> Result<SensorValue, ValueError> {
        match self {
            Self::Passthrough => Ok(raw),
            Self::Scaled { divisor } => {
                let value = raw.as_f64().ok_or(ValueError::NotNumeric(raw.type_name()))?;
                let scaled = (value / f64::from(*divisor)).round_ties_even();
                Ok(SensorValue::Integer(scaled as i64))
            }
        }
    }
}

/// Static configuration of one entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorDescriptor {
    pub field: SensorField,
    pub name: &'static str,
    pub platform: SensorPlatform,
    pub device_class: Option<SensorDeviceClass>,
    pub state_class: Option<StateClass>,
    pub unit: Option<&'static str>,
    pub icon: &'static str,
    pub transform: Transform,
}

/// Why a refresh cycle produced no new value.
#[derive(Debug, Error)]
pub enum RefreshError {
    /// The client failed to fetch or normalize the snapshot
    #[error(transparent)]
    Fetch(#[from] ApiError),

    /// The normalized data has no entry for the field
    #[error("Field '{0}' missing from sensor data")]
    MissingField(SensorField),

    /// The field holds a value the entity cannot display
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: SensorField, reason: ValueError },
}

/// Result of one refresh cycle.
#[derive(Debug)]
pub enum RefreshOutcome {
    /// The displayed value was replaced (possibly with null).
    Updated,
    /// The cycle failed; the previous value is still displayed.
    Retained(RefreshError),
}

impl RefreshOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, Self::Updated)
    }
}

/// Serializable view of an entity for hosts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityState {
    pub unique_id: String,
    pub name: String,
    pub platform: SensorPlatform,
    pub device_class: Option<SensorDeviceClass>,
    pub state_class: Option<StateClass>,
    pub unit_of_measurement: Option<String>,
    pub icon: String,
    pub state: Option<SensorValue>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// A sensor entity projecting one field of the shared device snapshot.
pub struct PollingFieldSensor {
    api: Arc<dyn CocoroAirApi>,
    descriptor: SensorDescriptor,
    device_id: String,
    unique_id: String,
    device_info: DeviceInfo,
    native_value: Option<SensorValue>,
    last_updated: Option<DateTime<Utc>>,
}

impl PollingFieldSensor {
    /// Create an entity. Device id and device info are read from the client
    /// once, here.
    pub fn new(api: Arc<dyn CocoroAirApi>, descriptor: SensorDescriptor) -> Self {
        let device_id = api.device_id().to_string();
        let unique_id = format!("{}_{}", device_id, descriptor.field.key());
        let device_info = api.device_info().clone();

        Self {
            api,
            descriptor,
            device_id,
            unique_id,
            device_info,
            native_value: None,
            last_updated: None,
        }
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }

    pub fn field(&self) -> SensorField {
        self.descriptor.field
    }

    pub fn key(&self) -> &'static str {
        self.descriptor.field.key()
    }

    pub fn platform(&self) -> SensorPlatform {
        self.descriptor.platform
    }

    pub fn device_class(&self) -> Option<SensorDeviceClass> {
        self.descriptor.device_class
    }

    pub fn state_class(&self) -> Option<StateClass> {
        self.descriptor.state_class
    }

    pub fn unit(&self) -> Option<&'static str> {
        self.descriptor.unit
    }

    pub fn icon(&self) -> &'static str {
        self.descriptor.icon
    }

    /// Entity names are relative to the device name.
    pub fn has_entity_name(&self) -> bool {
        true
    }

    pub fn descriptor(&self) -> &SensorDescriptor {
        &self.descriptor
    }

    pub fn device_info(&self) -> &DeviceInfo {
        &self.device_info
    }

    /// Currently displayed value.
    pub fn native_value(&self) -> Option<SensorValue> {
        self.native_value
    }

    /// Boolean view for binary sensors.
    pub fn is_on(&self) -> Option<bool> {
        self.native_value.and_then(|v| v.as_bool())
    }

    /// Time of the last successful refresh.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    /// Fetch the snapshot and compute this entity's value without touching
    /// the displayed value.
    pub async fn fetch(&self) -> Result<Option<SensorValue>, RefreshError> {
        let raw = self.api.update().await?;
        let data = self.api.get_sensor_data(&raw)?;
        let field = self.descriptor.field;

        let Some(raw_value) = data
            .get(field)
            .ok_or(RefreshError::MissingField(field))?
            .map_err(|reason| RefreshError::InvalidValue { field, reason })?
        else {
            return Ok(None);
        };

        self.descriptor
            .transform
            .apply(raw_value)
            .map(Some)
            .map_err(|reason| RefreshError::InvalidValue { field, reason })
    }

    /// Run one refresh cycle. Failures are logged and the previous value
    /// stays displayed.
    pub async fn refresh(&mut self) -> RefreshOutcome {
        match self.fetch().await {
            Ok(value) => {
                debug!(
                    device_id = %self.device_id,
                    sensor = self.key(),
                    value = ?value,
                    "Sensor updated"
                );
                self.native_value = value;
                self.last_updated = Some(Utc::now());
                RefreshOutcome::Updated
            }
            Err(e) => {
                warn!(
                    device_id = %self.device_id,
                    sensor = self.key(),
                    "Failed to update sensor data: {}",
                    e
                );
                RefreshOutcome::Retained(e)
            }
        }
    }

    pub fn state(&self) -> EntityState {
        EntityState {
            unique_id: self.unique_id.clone(),
            name: self.descriptor.name.to_string(),
            platform: self.descriptor.platform,
            device_class: self.descriptor.device_class,
            state_class: self.descriptor.state_class,
            unit_of_measurement: self.descriptor.unit.map(str::to_string),
            icon: self.descriptor.icon.to_string(),
            state: self.native_value,
            last_updated: self.last_updated,
        }
    }
}

impl std::fmt::Debug for PollingFieldSensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollingFieldSensor")
            .field("unique_id", &self.unique_id)
            .field("native_value", &self.native_value)
            .finish()
    }
}
