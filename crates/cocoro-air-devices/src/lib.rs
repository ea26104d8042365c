//! Cocoro Air sensor entities.
//!
//! This crate exposes the readings of a Cocoro Air air purifier/humidifier
//! as eight sensor entities.
//!
//! ## Features
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `http` | ✅ | HTTP snapshot client |
//!
//! ## Architecture
//!
//! - **CocoroAirApi**: client contract (device id, device info, snapshot fetch, normalization)
//! - **PollingFieldSensor**: one generic entity, configured by a `SensorDescriptor`
//! - **platform**: the eight descriptors and the setup routine
//! - **adapters**: client implementations
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cocoro_air_core::CocoroAirSettings;
//! use cocoro_air_devices::{platform, HttpCocoroAirApi};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = CocoroAirSettings::load("config.toml")?;
//! let api = Arc::new(HttpCocoroAirApi::from_settings(&settings)?);
//!
//! let mut sensors = platform::build_sensors(api);
//! platform::refresh_all(&mut sensors).await;
//! for sensor in &sensors {
//!     println!("{} = {:?}", sensor.unique_id(), sensor.native_value());
//! }
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod api;
pub mod mdl;
pub mod platform;
pub mod sensor;

/// Integration domain, used in device identifiers.
pub const DOMAIN: &str = "cocoro_air";

pub use api::{ApiError, ApiResult, CocoroAirApi, RawSnapshot, SensorData, SensorField};
pub use mdl::{DeviceInfo, SensorValue, ValueError};
pub use platform::{build_sensors, refresh_all, setup_entry, SENSOR_DESCRIPTORS};
pub use sensor::{
    EntityState, PollingFieldSensor, RefreshError, RefreshOutcome, SensorDescriptor,
    SensorDeviceClass, SensorPlatform, StateClass, Transform,
};

#[cfg(feature = "http")]
pub use adapters::HttpCocoroAirApi;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
