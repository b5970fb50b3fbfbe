//! Single-line record parsing for text exports
//!
//! Both parsers return `Ok(None)` for a line that parses but carries no
//! non-zero sensor value; those rows are treated as noise and dropped.

use chrono::{Duration, NaiveDateTime};

use super::column_mapping::ColumnMapping;
use super::field_parsers::{parse_sensor_value, parse_timestamp, split_loose_line};
use super::stats::LineError;
use crate::app::models::{SensorKey, SensorReading};
use crate::constants::{LOOSE_MIN_TOKENS, SENSOR_COUNT};

/// Parse a data row of a structured export
///
/// `line` must already be trimmed. Fields are tab-separated and the first
/// field is the absolute timestamp.
pub fn parse_structured_line(
    line: &str,
    line_number: usize,
    mapping: &ColumnMapping,
    time_format: &str,
) -> Result<Option<SensorReading>, LineError> {
    let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
    if fields.len() < mapping.header_width() {
        return Err(LineError::TooFewFields {
            line: line_number,
            found: fields.len(),
            expected: mapping.header_width(),
        });
    }

    let timestamp = parse_timestamp(fields[0], line_number)?;

    let values = SensorKey::ALL.map(|key| {
        mapping
            .get_index(key)
            .and_then(|index| fields.get(index))
            .map(|field| parse_sensor_value(field))
            .unwrap_or(0.0)
    });

    Ok(retain_nonzero(SensorReading::from_values(
        timestamp,
        time_format,
        values,
    )))
}

/// Parse a row of a loose TXT file
///
/// `position` is the zero-based index of the line among non-blank lines and
/// offsets the synthesized timestamp from `started_at` in minutes.
pub fn parse_loose_line(
    line: &str,
    line_number: usize,
    position: usize,
    started_at: NaiveDateTime,
    time_format: &str,
) -> Result<Option<SensorReading>, LineError> {
    let tokens = split_loose_line(line);
    if tokens.len() < LOOSE_MIN_TOKENS {
        return Err(LineError::TooFewTokens {
            line: line_number,
            found: tokens.len(),
            minimum: LOOSE_MIN_TOKENS,
        });
    }

    let mut values = [0.0; SENSOR_COUNT];
    for (slot, token) in values.iter_mut().zip(tokens.iter()) {
        *slot = parse_sensor_value(token);
    }

    let timestamp = started_at + Duration::minutes(position as i64);
    Ok(retain_nonzero(SensorReading::from_values(
        timestamp,
        time_format,
        values,
    )))
}

fn retain_nonzero(reading: SensorReading) -> Option<SensorReading> {
    reading.has_nonzero_value().then_some(reading)
}
