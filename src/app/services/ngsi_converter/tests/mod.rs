//! Tests for the NGSI converter module
//!
//! Fixture helpers build raw payloads the way upstream brokers emit them.


use serde_json::{Value, json};

pub const METEO_PATH: &str = "/cagliari/edge/meteo";
pub const ENERGY_PATH: &str = "/cagliari/edge/energy";
pub const TEMP_SENSOR_ID: &str = "WeatherObserved:Edge-CFA703F4.Station01.TempSensor";

/// Build a raw NGSI payload
pub fn create_message(id: &str, service_path: &str, attributes: &[(&str, Value)]) -> String {
    let attributes: Vec<Value> = attributes
        .iter()
        .map(|(name, value)| json!({ "name": name, "value": value }))
        .collect();

    json!({
        "headers": [
            {"fiware-service": "tdm"},
            {"fiware-servicePath": service_path},
            {"timestamp": 1609459200}
        ],
        "body": {
            "id": id,
            "type": "WeatherObserved",
            "attributes": attributes
        }
    })
    .to_string()
}

/// A well-formed weather message at the given position
pub fn create_weather_message(id: &str, latitude: &str, longitude: &str) -> String {
    create_message(
        id,
        METEO_PATH,
        &[
            ("dateObserved", json!("2021-01-01T00:00:00Z")),
            ("location", json!({"type": "Point", "coordinates": [9.1, 39.2]})),
            ("latitude", json!(latitude)),
            ("longitude", json!(longitude)),
            ("timestamp", json!("1609459200")),
            ("temperature", json!("21.5")),
            ("relativeHumidity", json!(0.63)),
        ],
    )
}
