//! Sensor platform setup for a Cocoro Air device.

use std::sync::Arc;

use futures::future::join_all;
use tracing::info;

use crate::api::{CocoroAirApi, SensorField};
use crate::sensor::{
    PollingFieldSensor, RefreshOutcome, SensorDescriptor, SensorDeviceClass, SensorPlatform, StateClass, Transform,
};

pub const CELSIUS: &str = "°C";
pub const PERCENTAGE: &str = "%";
pub const MICROGRAMS_PER_CUBIC_METER: &str = "µg/m³";

/// Odor readings scale onto 0..=3.
pub const ODOR_LEVEL_DIVISOR: u32 = 33;
/// Dust readings scale onto 0..=4.
pub const DUST_LEVEL_DIVISOR: u32 = 25;
/// Cleanliness readings scale onto 0..=4.
pub const CLEANLINESS_LEVEL_DIVISOR: u32 = 25;

/// The eight entities of a Cocoro Air device, in registration order.
pub static SENSOR_DESCRIPTORS: [SensorDescriptor; 8] = [
    SensorDescriptor {
        field: SensorField::Temperature,
        name: "Temperature",
        platform: SensorPlatform::Sensor,
        device_class: Some(SensorDeviceClass::Temperature),
        state_class: Some(StateClass::Measurement),
        unit: Some(CELSIUS),
        icon: "mdi:thermometer",
        transform: Transform::Passthrough,
    },
    SensorDescriptor {
        field: SensorField::Humidity,
        name: "Humidity",
        platform: SensorPlatform::Sensor,
        device_class: Some(SensorDeviceClass::Humidity),
        state_class: Some(StateClass::Measurement),
        unit: Some(PERCENTAGE),
        icon: "mdi:water-percent",
        transform: Transform::Passthrough,
    },
    SensorDescriptor {
        field: SensorField::WaterTank,
        name: "Water tank",
        platform: SensorPlatform::BinarySensor,
        device_class: Some(SensorDeviceClass::Moisture),
        state_class: None,
        unit: None,
        icon: "mdi:water",
        transform: Transform::Passthrough,
    },
    SensorDescriptor {
        field: SensorField::Pm25,
        name: "PM2.5",
        platform: SensorPlatform::Sensor,
        device_class: Some(SensorDeviceClass::Pm25),
        state_class: Some(StateClass::Measurement),
        unit: Some(MICROGRAMS_PER_CUBIC_METER),
        icon: "mdi:air-filter",
        transform: Transform::Passthrough,
    },
    SensorDescriptor {
        field: SensorField::CleanedAirVolume,
        name: "Cleaned air volume",
        platform: SensorPlatform::Sensor,
        device_class: None,
        state_class: Some(StateClass::Measurement),
        unit: None,
        icon: "mdi:air-purifier",
        transform: Transform::Passthrough,
    },
    SensorDescriptor {
        field: SensorField::OdorLevel,
        name: "Odor level",
        platform: SensorPlatform::Sensor,
        device_class: None,
        state_class: Some(StateClass::Measurement),
        unit: None,
        icon: "mdi:scent",
        transform: Transform::Scaled {
            divisor: ODOR_LEVEL_DIVISOR,
        },
    },
    SensorDescriptor {
        field: SensorField::DustLevel,
        name: "Dust level",
        platform: SensorPlatform::Sensor,
        device_class: None,
        state_class: Some(StateClass::Measurement),
        unit: None,
        icon: "mdi:blur",
        transform: Transform::Scaled {
            divisor: DUST_LEVEL_DIVISOR,
        },
    },
    SensorDescriptor {
        field: SensorField::CleanlinessLevel,
        name: "Cleanliness level",
        platform: SensorPlatform::Sensor,
        device_class: None,
        state_class: Some(StateClass::Measurement),
        unit: None,
        icon: "mdi:air-purifier",
        transform: Transform::Scaled {
            divisor: CLEANLINESS_LEVEL_DIVISOR,
        },
    },
];

/// Build the eight entities sharing one API client.
pub fn build_sensors(api: Arc<dyn CocoroAirApi>) -> Vec<PollingFieldSensor> {
    SENSOR_DESCRIPTORS
        .iter()
        .map(|descriptor| PollingFieldSensor::new(api.clone(), *descriptor))
        .collect()
}

/// Set up the sensor platform: build the entities and hand them to the
/// host's registration callback.
pub fn setup_entry<F>(api: Arc<dyn CocoroAirApi>, add_entities: F)
where
    F: FnOnce(Vec<PollingFieldSensor>),
{
    let device_id = api.device_id().to_string();
    let sensors = build_sensors(api);
    info!(device_id = %device_id, count = sensors.len(), "Setting up Cocoro Air sensors");
    add_entities(sensors);
}

/// Refresh every entity once. The refreshes run concurrently on the
/// calling task; outcomes are returned in entity order.
pub async fn refresh_all(sensors: &mut [PollingFieldSensor]) -> Vec<RefreshOutcome> {
    join_all(sensors.iter_mut().map(|sensor| sensor.refresh())).await
}
