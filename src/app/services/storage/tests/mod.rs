//! Test suite for record sinks


use crate::app::services::test_support::{record, utc, weather_source};
use crate::models::Record;

/// Two timed records from one sensor and one untimed record from another
pub fn sample_records() -> Vec<Record> {
    let first = weather_source("Station01.TempSensor");
    let second = weather_source("Station02.TempSensor");
    vec![
        record(
            &first,
            Some(utc(2021, 3, 1, 10)),
            &[("humidity", 55.0), ("temperature", 21.5)],
        ),
        record(&first, Some(utc(2021, 3, 1, 11)), &[("temperature", 22.0)]),
        record(&second, None, &[("temperature", 19.0)]),
    ]
}
