//! HTTP snapshot client.
//!
//! Polls a JSON endpoint for the device status, typically a local bridge
//! that already holds the vendor session, and maps fields out of the
//! response with dot-notation paths.
//!
//! ## Configuration
//!
//! ```toml
//! [cocoro_air]
//! device_id = "living-room"
//! url = "http://127.0.0.1:8080/cocoro/status"
//! auth_token = "token123"
//! data_path = "data"             # fields are read from $.data.<key>
//!
//! [cocoro_air.paths]
//! pm25 = "air.pm25"              # overrides data_path for one field
//! ```

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use cocoro_air_core::config::defaults;
use cocoro_air_core::CocoroAirSettings;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::api::{ApiError, ApiResult, CocoroAirApi, RawSnapshot, SensorData, SensorField};
use crate::mdl::{DeviceInfo, SensorValue, ValueError};

/// Cocoro Air client reading snapshots over HTTP.
pub struct HttpCocoroAirApi {
    device_id: String,
    device_info: DeviceInfo,
    url: String,
    auth_token: Option<String>,
    headers: HashMap<String, String>,
    timeout: Duration,
    paths: HashMap<SensorField, String>,
    client: Client,
}

impl HttpCocoroAirApi {
    /// Create a client from validated settings.
    pub fn from_settings(settings: &CocoroAirSettings) -> ApiResult<Self> {
        settings
            .validate()
            .map_err(|e| ApiError::Configuration(e.to_string()))?;

        let mut paths = HashMap::new();
        for field in SensorField::ALL {
            paths.insert(field, default_path(settings.data_path.as_deref(), field));
        }
        for (key, path) in &settings.paths {
            let field = SensorField::from_key(key).ok_or_else(|| {
                ApiError::Configuration(format!("Unknown sensor field in paths: {}", key))
            })?;
            paths.insert(field, path.clone());
        }

        let mut device_info = DeviceInfo::new(&settings.device_id, settings.display_name())
            .with_manufacturer(defaults::MANUFACTURER)
            .with_model(settings.model.as_deref().unwrap_or(defaults::MODEL));
        if let Some(version) = &settings.sw_version {
            device_info = device_info.with_sw_version(version);
        }

        let client = Client::builder()
            .build()
            .map_err(|e| ApiError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            device_id: settings.device_id.clone(),
            device_info,
            url: settings.url.clone(),
            auth_token: settings.auth_token.clone(),
            headers: settings.headers.clone(),
            timeout: Duration::from_secs(settings.timeout),
            paths,
            client,
        })
    }

    /// Path a field is read from.
    pub fn path(&self, field: SensorField) -> &str {
        self.paths.get(&field).map(String::as_str).unwrap_or(field.key())
    }
}

fn default_path(prefix: Option<&str>, field: SensorField) -> String {
    match prefix.map(|p| p.trim_start_matches("$.").trim_matches('.')) {
        Some(prefix) if !prefix.is_empty() => format!("{}.{}", prefix, field.key()),
        _ => field.key().to_string(),
    }
}

/// Walk a dot-notation path ("data.air.pm25", "items.0.value").
pub fn extract_by_path<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    let path = path.trim().trim_start_matches("$.");
    if path.is_empty() || path.ends_with('.') {
        return None;
    }

    let mut current = data;
    for part in path.split('.').map(str::trim).filter(|p| !p.is_empty()) {
        current = match current {
            Value::Object(map) => map.get(part)?,
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Convert a JSON value to a reading.
fn to_sensor_value(field: SensorField, value: &Value) -> Result<Option<SensorValue>, ValueError> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(SensorValue::Boolean(*b))),
        // Some firmware reports the tank as 0/1
        Value::Number(n) if field == SensorField::WaterTank => match n.as_f64() {
            Some(v) if v == 0.0 => Ok(Some(SensorValue::Boolean(false))),
            Some(v) if v == 1.0 => Ok(Some(SensorValue::Boolean(true))),
            _ => Err(ValueError::NotBoolean(n.to_string())),
        },
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(Some(SensorValue::Integer(i))),
            None => n
                .as_f64()
                .map(|f| Some(SensorValue::Float(f)))
                .ok_or_else(|| ValueError::Unsupported(n.to_string())),
        },
        other => Err(ValueError::Unsupported(other.to_string())),
    }
}

#[async_trait]
impl CocoroAirApi for HttpCocoroAirApi {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn device_info(&self) -> &DeviceInfo {
        &self.device_info
    }

    async fn update(&self) -> ApiResult<RawSnapshot> {
        let mut request = self.client.get(&self.url).timeout(self.timeout);

        for (key, value) in &self.headers {
            request = request.header(key, value);
        }
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout(self.timeout.as_millis() as u64)
            } else {
                ApiError::Connection(format!("HTTP request failed: {}", e))
            }
        })?;

        if !response.status().is_success() {
            return Err(ApiError::Communication(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let snapshot: Value = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(format!("JSON parse error: {}", e)))?;

        debug!(device_id = %self.device_id, "Fetched Cocoro Air snapshot");
        Ok(snapshot)
    }

    fn get_sensor_data(&self, raw: &RawSnapshot) -> ApiResult<SensorData> {
        if !raw.is_object() {
            return Err(ApiError::Parse(format!("Snapshot is not a JSON object: {}", raw)));
        }

        let mut data = SensorData::new();
        for field in SensorField::ALL {
            let Some(value) = extract_by_path(raw, self.path(field)) else {
                data.insert(field, None);
                continue;
            };
            match to_sensor_value(field, value) {
                Ok(value) => data.insert(field, value),
                Err(reason) => {
                    debug!(device_id = %self.device_id, sensor = field.key(), "Rejected value: {}", reason);
                    data.reject(field, reason);
                }
            }
        }
        Ok(data)
    }
}
