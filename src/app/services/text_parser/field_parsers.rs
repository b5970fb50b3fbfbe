//! Field parsing utilities for text exports
//!
//! Helpers for timestamps, sensor values and loose-line tokenization.

use super::stats::LineError;
use crate::constants::{LOOSE_SKIP_PREFIXES, TIMESTAMP_FORMATS};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Parse an absolute timestamp from the first column of a structured row
///
/// Accepts the formats in [`TIMESTAMP_FORMATS`], a bare date (midnight) and
/// RFC 3339 with an offset, which is reduced to its local clock value.
pub fn parse_timestamp(value: &str, line_number: usize) -> Result<NaiveDateTime, LineError> {
    let trimmed = value.trim();

    for format in TIMESTAMP_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(dt);
        }
    }

    if let Some(midnight) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight);
    }

    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.naive_local())
        .map_err(|_| LineError::InvalidTimestamp {
            line: line_number,
            value: trimmed.to_string(),
        })
}

/// Parse a sensor value from the leading number of a field
///
/// Trailing text such as a unit suffix is ignored (`"21.5C"` is `21.5`).
/// Defaults to `0.0` when the field does not start with a finite number.
pub fn parse_sensor_value(value: &str) -> f64 {
    numeric_prefix(value.trim())
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Longest prefix of the form `[sign] digits [. digits] [e [sign] digits]`
fn numeric_prefix(value: &str) -> &str {
    let bytes = value.as_bytes();
    let digits_from = |mut pos: usize| {
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        pos
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_end = digits_from(end);
    let mut has_digits = int_end > end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        has_digits |= frac_end > end + 1;
        end = frac_end;
    }
    if !has_digits {
        return "";
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }

    &value[..end]
}

/// Check whether a trimmed loose line is a comment or header marker
pub fn is_loose_skip_line(line: &str) -> bool {
    LOOSE_SKIP_PREFIXES
        .iter()
        .any(|prefix| line.starts_with(prefix))
}

/// Split a loose line on the first delimiter present, in priority order
/// comma, tab, whitespace run; empty tokens are dropped
pub fn split_loose_line(line: &str) -> Vec<&str> {
    let tokens: Vec<&str> = if line.contains(',') {
        line.split(',').map(str::trim).collect()
    } else if line.contains('\t') {
        line.split('\t').map(str::trim).collect()
    } else {
        line.split_whitespace().collect()
    };

    tokens.into_iter().filter(|t| !t.is_empty()).collect()
}
