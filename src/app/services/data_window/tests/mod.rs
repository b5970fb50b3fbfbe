//! Test utilities for the data window

use crate::app::models::SensorReading;
use crate::constants::SENSOR_COUNT;
use chrono::{Duration, NaiveDate};

mod window_tests;

/// Readings one minute apart; wind speed is the index, temperature cycles
/// through 0..5 so that sorting produces ties
pub fn create_readings(count: usize) -> Vec<SensorReading> {
    let start = NaiveDate::from_ymd_opt(2024, 7, 29)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();

    (0..count)
        .map(|i| {
            let mut values = [0.0; SENSOR_COUNT];
            values[0] = i as f64;
            values[2] = (i % 5) as f64 + 10.5;
            SensorReading::from_values(start + Duration::minutes(i as i64), "%H:%M:%S", values)
        })
        .collect()
}
