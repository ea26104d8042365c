//! Tests for the polling field sensors against a scripted API client

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cocoro_air_devices::{
    build_sensors, refresh_all, setup_entry, ApiError, ApiResult, CocoroAirApi, DeviceInfo,
    PollingFieldSensor, RawSnapshot, RefreshError, RefreshOutcome, SensorData, SensorField,
    SensorValue, ValueError, SENSOR_DESCRIPTORS,
};
use serde_json::{json, Value};

/// API client replaying scripted snapshots.
struct MockApi {
    device_id: String,
    device_info: DeviceInfo,
    responses: Mutex<VecDeque<ApiResult<RawSnapshot>>>,
    fixed: Option<RawSnapshot>,
}

impl MockApi {
    fn scripted(responses: Vec<ApiResult<RawSnapshot>>) -> Arc<Self> {
        Arc::new(Self {
            device_id: "dev42".to_string(),
            device_info: DeviceInfo::new("dev42", "Test purifier"),
            responses: Mutex::new(responses.into()),
            fixed: None,
        })
    }

    fn fixed(snapshot: Value) -> Arc<Self> {
        Arc::new(Self {
            device_id: "dev42".to_string(),
            device_info: DeviceInfo::new("dev42", "Test purifier"),
            responses: Mutex::new(VecDeque::new()),
            fixed: Some(snapshot),
        })
    }
}

#[async_trait]
impl CocoroAirApi for MockApi {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn device_info(&self) -> &DeviceInfo {
        &self.device_info
    }

    async fn update(&self) -> ApiResult<RawSnapshot> {
        if let Some(snapshot) = &self.fixed {
            return Ok(snapshot.clone());
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Connection("no scripted response".to_string())))
    }

    fn get_sensor_data(&self, raw: &RawSnapshot) -> ApiResult<SensorData> {
        let object = raw
            .as_object()
            .ok_or_else(|| ApiError::Parse("snapshot is not an object".to_string()))?;

        let mut data = SensorData::new();
        for (key, value) in object {
            let Some(field) = SensorField::from_key(key) else {
                continue;
            };
            match value {
                Value::Null => data.insert(field, None),
                Value::Bool(b) => data.insert(field, Some(SensorValue::Boolean(*b))),
                Value::Number(n) => data.insert(
                    field,
                    Some(match n.as_i64() {
                        Some(i) => SensorValue::Integer(i),
                        None => SensorValue::Float(n.as_f64().unwrap()),
                    }),
                ),
                other => data.reject(field, ValueError::Unsupported(other.to_string())),
            }
        }
        Ok(data)
    }
}

fn full_snapshot() -> Value {
    json!({
        "temperature": 21.5,
        "humidity": 48,
        "water_tank": true,
        "pm25": 7,
        "cleaned_air_volume": 1520,
        "odor_level": 99,
        "dust_level": 12,
        "cleanliness_level": null
    })
}

fn sensor_for(api: Arc<MockApi>, field: SensorField) -> PollingFieldSensor {
    build_sensors(api)
        .into_iter()
        .find(|s| s.field() == field)
        .unwrap()
}

#[test]
fn test_unique_ids_derive_from_device_id() {
    let sensors = build_sensors(MockApi::fixed(full_snapshot()));
    assert_eq!(sensors.len(), 8);

    let ids: Vec<&str> = sensors.iter().map(|s| s.unique_id()).collect();
    assert_eq!(
        ids,
        vec![
            "dev42_temperature",
            "dev42_humidity",
            "dev42_water_tank",
            "dev42_pm25",
            "dev42_cleaned_air_volume",
            "dev42_odor_level",
            "dev42_dust_level",
            "dev42_cleanliness_level",
        ]
    );

    for sensor in &sensors {
        assert_eq!(sensor.device_info().name, "Test purifier");
        assert!(sensor.has_entity_name());
        assert!(sensor.native_value().is_none());
    }
}

#[test]
fn test_setup_entry_registers_all_entities() {
    let mut registered = Vec::new();
    setup_entry(MockApi::fixed(full_snapshot()), |entities| {
        registered = entities;
    });

    assert_eq!(registered.len(), SENSOR_DESCRIPTORS.len());
    let names: Vec<&str> = registered.iter().map(|s| s.name()).collect();
    assert_eq!(names[0], "Temperature");
    assert_eq!(names[3], "PM2.5");
    assert_eq!(names[7], "Cleanliness level");
}

#[tokio::test]
async fn test_level_scaling() {
    let api = MockApi::fixed(full_snapshot());

    let mut odor = sensor_for(api.clone(), SensorField::OdorLevel);
    assert!(odor.refresh().await.is_updated());
    assert_eq!(odor.native_value(), Some(SensorValue::Integer(3)));

    let mut dust = sensor_for(api.clone(), SensorField::DustLevel);
    assert!(dust.refresh().await.is_updated());
    assert_eq!(dust.native_value(), Some(SensorValue::Integer(0)));

    let mut cleanliness = sensor_for(api, SensorField::CleanlinessLevel);
    assert!(cleanliness.refresh().await.is_updated());
    assert_eq!(cleanliness.native_value(), None);
}

#[tokio::test]
async fn test_passthrough_values() {
    let mut sensors = build_sensors(MockApi::fixed(full_snapshot()));
    let outcomes = refresh_all(&mut sensors).await;
    assert!(outcomes.iter().all(RefreshOutcome::is_updated));

    let values: Vec<Option<SensorValue>> = sensors.iter().map(|s| s.native_value()).collect();
    assert_eq!(
        values,
        vec![
            Some(SensorValue::Float(21.5)),
            Some(SensorValue::Integer(48)),
            Some(SensorValue::Boolean(true)),
            Some(SensorValue::Integer(7)),
            Some(SensorValue::Integer(1520)),
            Some(SensorValue::Integer(3)),
            Some(SensorValue::Integer(0)),
            None,
        ]
    );
    assert_eq!(sensors[2].is_on(), Some(true));
    assert!(sensors[0].last_updated().is_some());
}

#[tokio::test]
async fn test_failed_update_retains_previous_value() {
    let api = MockApi::scripted(vec![
        Ok(json!({"humidity": 55})),
        Err(ApiError::Connection("refused".to_string())),
    ]);
    let mut humidity = sensor_for(api, SensorField::Humidity);

    assert!(humidity.refresh().await.is_updated());
    assert_eq!(humidity.native_value(), Some(SensorValue::Integer(55)));
    let updated_at = humidity.last_updated();

    let outcome = humidity.refresh().await;
    assert!(matches!(
        outcome,
        RefreshOutcome::Retained(RefreshError::Fetch(ApiError::Connection(_)))
    ));
    assert_eq!(humidity.native_value(), Some(SensorValue::Integer(55)));
    assert_eq!(humidity.last_updated(), updated_at);
}

#[tokio::test]
async fn test_failure_before_first_success_stays_unknown() {
    let api = MockApi::scripted(vec![Err(ApiError::Timeout(10_000))]);
    let mut pm25 = sensor_for(api, SensorField::Pm25);

    assert!(!pm25.refresh().await.is_updated());
    assert_eq!(pm25.native_value(), None);
    assert!(pm25.last_updated().is_none());
}

#[tokio::test]
async fn test_parse_failure_retains_previous_value() {
    let api = MockApi::scripted(vec![Ok(json!({"pm25": 12})), Ok(json!("garbage"))]);
    let mut pm25 = sensor_for(api, SensorField::Pm25);

    pm25.refresh().await;
    let outcome = pm25.refresh().await;
    assert!(matches!(
        outcome,
        RefreshOutcome::Retained(RefreshError::Fetch(ApiError::Parse(_)))
    ));
    assert_eq!(pm25.native_value(), Some(SensorValue::Integer(12)));
}

#[tokio::test]
async fn test_missing_key_retains_but_null_clears() {
    let api = MockApi::scripted(vec![
        Ok(json!({"dust_level": 100})),
        Ok(json!({"humidity": 40})),
        Ok(json!({"dust_level": null})),
    ]);
    let mut dust = sensor_for(api, SensorField::DustLevel);

    dust.refresh().await;
    assert_eq!(dust.native_value(), Some(SensorValue::Integer(4)));

    let outcome = dust.refresh().await;
    assert!(matches!(
        outcome,
        RefreshOutcome::Retained(RefreshError::MissingField(SensorField::DustLevel))
    ));
    assert_eq!(dust.native_value(), Some(SensorValue::Integer(4)));

    assert!(dust.refresh().await.is_updated());
    assert_eq!(dust.native_value(), None);
}

#[tokio::test]
async fn test_non_numeric_level_is_rejected() {
    let api = MockApi::scripted(vec![Ok(json!({"odor_level": 66})), Ok(json!({"odor_level": true}))]);
    let mut odor = sensor_for(api, SensorField::OdorLevel);

    odor.refresh().await;
    assert_eq!(odor.native_value(), Some(SensorValue::Integer(2)));

    let outcome = odor.refresh().await;
    assert!(matches!(
        outcome,
        RefreshOutcome::Retained(RefreshError::InvalidValue { field: SensorField::OdorLevel, .. })
    ));
    assert_eq!(odor.native_value(), Some(SensorValue::Integer(2)));
}

#[tokio::test]
async fn test_bad_field_fails_only_its_own_entity() {
    let snapshot = json!({"temperature": 21.5, "humidity": "high"});
    let api = MockApi::scripted(vec![Ok(json!({"humidity": 45})), Ok(snapshot.clone()), Ok(snapshot)]);
    let mut sensors = build_sensors(api);

    assert!(sensors[1].refresh().await.is_updated());
    assert_eq!(sensors[1].native_value(), Some(SensorValue::Integer(45)));

    let outcome = sensors[1].refresh().await;
    assert!(matches!(
        outcome,
        RefreshOutcome::Retained(RefreshError::InvalidValue {
            field: SensorField::Humidity,
            reason: ValueError::Unsupported(_),
        })
    ));
    assert_eq!(sensors[1].native_value(), Some(SensorValue::Integer(45)));

    assert!(sensors[0].refresh().await.is_updated());
    assert_eq!(sensors[0].native_value(), Some(SensorValue::Float(21.5)));
}

#[tokio::test]
async fn test_identical_snapshots_are_idempotent() {
    let api = MockApi::scripted(vec![Ok(full_snapshot()), Ok(full_snapshot())]);
    let mut temperature = sensor_for(api, SensorField::Temperature);

    temperature.refresh().await;
    let first = temperature.native_value();
    temperature.refresh().await;

    assert_eq!(temperature.native_value(), first);
    assert_eq!(first, Some(SensorValue::Float(21.5)));
}

#[tokio::test]
async fn test_entities_do_not_share_values() {
    let api = MockApi::scripted(vec![Ok(json!({"temperature": 20, "humidity": 50}))]);
    let mut sensors = build_sensors(api);

    // Only the first refresh gets a snapshot; the second fails.
    assert!(sensors[0].refresh().await.is_updated());
    assert!(!sensors[1].refresh().await.is_updated());

    assert_eq!(sensors[0].native_value(), Some(SensorValue::Integer(20)));
    assert_eq!(sensors[1].native_value(), None);
}

#[tokio::test]
async fn test_state_serialization() {
    let mut pm25 = sensor_for(MockApi::fixed(full_snapshot()), SensorField::Pm25);
    pm25.refresh().await;

    let state = serde_json::to_value(pm25.state()).unwrap();
    assert_eq!(state["unique_id"], "dev42_pm25");
    assert_eq!(state["platform"], "sensor");
    assert_eq!(state["device_class"], "pm25");
    assert_eq!(state["state_class"], "measurement");
    assert_eq!(state["unit_of_measurement"], "µg/m³");
    assert_eq!(state["icon"], "mdi:air-filter");
    assert_eq!(state["state"], 7);
}
