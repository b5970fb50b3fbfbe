//! Data models for DataSense processing
//!
//! This module contains the core data structures for normalized sensor readings,
//! dataset summaries, library snapshots and the sensor unit map.

use crate::constants::{DEFAULT_TIME_FORMAT, DEFAULT_UNITS, NOT_AVAILABLE, SENSOR_COUNT};
use crate::{Error, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::str::FromStr;

// =============================================================================
// Sensor Keys
// =============================================================================

/// The fixed set of logical sensor fields carried by every reading
///
/// Serialized names match the channel names used by the logger exports and
/// the backend wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SensorKey {
    #[serde(rename = "NRG_40C_Anem")]
    WindSpeed,
    #[serde(rename = "NRG_200M_Vane")]
    WindDirection,
    #[serde(rename = "NRG_T60_Temp")]
    Temperature,
    #[serde(rename = "NRG_RH5X_Humi")]
    Humidity,
    #[serde(rename = "NRG_BP60_Baro")]
    Pressure,
    #[serde(rename = "Rain_Gauge")]
    Rainfall,
    #[serde(rename = "NRG_PVT1_PV_Temp")]
    PvTemperature,
    #[serde(rename = "PSM_c_Si_Isc_Soil")]
    SolarSoil,
    #[serde(rename = "PSM_c_Si_Isc_Clean")]
    SolarClean,
    #[serde(rename = "Average_12V_Battery")]
    Battery,
}

impl SensorKey {
    /// All sensor keys in positional order (the loose TXT column order)
    pub const ALL: [SensorKey; SENSOR_COUNT] = [
        SensorKey::WindSpeed,
        SensorKey::WindDirection,
        SensorKey::Temperature,
        SensorKey::Humidity,
        SensorKey::Pressure,
        SensorKey::Rainfall,
        SensorKey::PvTemperature,
        SensorKey::SolarSoil,
        SensorKey::SolarClean,
        SensorKey::Battery,
    ];

    /// Channel name used in exports and on the wire
    pub fn as_str(self) -> &'static str {
        match self {
            SensorKey::WindSpeed => "NRG_40C_Anem",
            SensorKey::WindDirection => "NRG_200M_Vane",
            SensorKey::Temperature => "NRG_T60_Temp",
            SensorKey::Humidity => "NRG_RH5X_Humi",
            SensorKey::Pressure => "NRG_BP60_Baro",
            SensorKey::Rainfall => "Rain_Gauge",
            SensorKey::PvTemperature => "NRG_PVT1_PV_Temp",
            SensorKey::SolarSoil => "PSM_c_Si_Isc_Soil",
            SensorKey::SolarClean => "PSM_c_Si_Isc_Clean",
            SensorKey::Battery => "Average_12V_Battery",
        }
    }

    /// Human-readable sensor name for reports
    pub fn display_name(self) -> &'static str {
        match self {
            SensorKey::WindSpeed => "Wind Speed",
            SensorKey::WindDirection => "Wind Direction",
            SensorKey::Temperature => "Temperature",
            SensorKey::Humidity => "Humidity",
            SensorKey::Pressure => "Pressure",
            SensorKey::Rainfall => "Rainfall",
            SensorKey::PvTemperature => "PV Temperature",
            SensorKey::SolarSoil => "Solar Current (Soiled)",
            SensorKey::SolarClean => "Solar Current (Clean)",
            SensorKey::Battery => "Battery Voltage",
        }
    }

    /// Position of this key in [`SensorKey::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Look up a key by its channel name
    pub fn from_name(name: &str) -> Option<Self> {
        SensorKey::ALL.into_iter().find(|key| key.as_str() == name)
    }
}

impl FromStr for SensorKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        SensorKey::from_name(trimmed)
            .or_else(|| {
                SensorKey::ALL.into_iter().find(|key| {
                    key.display_name()
                        .replace(' ', "_")
                        .eq_ignore_ascii_case(&trimmed.replace([' ', '-'], "_"))
                })
            })
            .ok_or_else(|| {
                Error::configuration(format!(
                    "Unknown sensor '{}': expected one of {}",
                    s,
                    SensorKey::ALL.map(|k| k.as_str()).join(", ")
                ))
            })
    }
}

impl std::fmt::Display for SensorKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Sensor Reading
// =============================================================================

/// One normalized time-series record
///
/// `time` is derived from `timestamp` once, at construction, and never
/// recomputed. Sensor values that were missing or unparseable in the source
/// are `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    #[serde(with = "naive_timestamp")]
    pub timestamp: NaiveDateTime,
    pub time: String,
    #[serde(rename = "NRG_40C_Anem", default)]
    pub wind_speed: f64,
    #[serde(rename = "NRG_200M_Vane", default)]
    pub wind_direction: f64,
    #[serde(rename = "NRG_T60_Temp", default)]
    pub temperature: f64,
    #[serde(rename = "NRG_RH5X_Humi", default)]
    pub humidity: f64,
    #[serde(rename = "NRG_BP60_Baro", default)]
    pub pressure: f64,
    #[serde(rename = "Rain_Gauge", default)]
    pub rainfall: f64,
    #[serde(rename = "NRG_PVT1_PV_Temp", default)]
    pub pv_temperature: f64,
    #[serde(rename = "PSM_c_Si_Isc_Soil", default)]
    pub solar_soil: f64,
    #[serde(rename = "PSM_c_Si_Isc_Clean", default)]
    pub solar_clean: f64,
    #[serde(rename = "Average_12V_Battery", default)]
    pub battery: f64,
}

/// Render a timestamp with a chrono format string
///
/// Returns `None` for an unknown specifier or one the naive timestamp cannot
/// supply, such as a time zone offset.
pub fn format_time(timestamp: &NaiveDateTime, time_format: &str) -> Option<String> {
    let items = StrftimeItems::new(time_format);
    if items.clone().any(|item| matches!(item, Item::Error)) {
        return None;
    }

    let mut time = String::new();
    write!(time, "{}", timestamp.format_with_items(items)).ok()?;
    Some(time)
}

impl SensorReading {
    /// Build a reading from positional values, deriving the display time
    ///
    /// A format that cannot render the timestamp falls back to `%H:%M:%S`.
    pub fn from_values(
        timestamp: NaiveDateTime,
        time_format: &str,
        values: [f64; SENSOR_COUNT],
    ) -> Self {
        let [
            wind_speed,
            wind_direction,
            temperature,
            humidity,
            pressure,
            rainfall,
            pv_temperature,
            solar_soil,
            solar_clean,
            battery,
        ] = values;

        Self {
            timestamp,
            time: format_time(&timestamp, time_format)
                .unwrap_or_else(|| timestamp.format(DEFAULT_TIME_FORMAT).to_string()),
            wind_speed,
            wind_direction,
            temperature,
            humidity,
            pressure,
            rainfall,
            pv_temperature,
            solar_soil,
            solar_clean,
            battery,
        }
    }

    /// Get the value of a sensor field
    pub fn value(&self, key: SensorKey) -> f64 {
        match key {
            SensorKey::WindSpeed => self.wind_speed,
            SensorKey::WindDirection => self.wind_direction,
            SensorKey::Temperature => self.temperature,
            SensorKey::Humidity => self.humidity,
            SensorKey::Pressure => self.pressure,
            SensorKey::Rainfall => self.rainfall,
            SensorKey::PvTemperature => self.pv_temperature,
            SensorKey::SolarSoil => self.solar_soil,
            SensorKey::SolarClean => self.solar_clean,
            SensorKey::Battery => self.battery,
        }
    }

    /// All sensor values in [`SensorKey::ALL`] order
    pub fn values(&self) -> [f64; SENSOR_COUNT] {
        SensorKey::ALL.map(|key| self.value(key))
    }

    /// Check whether at least one sensor field carries a non-zero value
    pub fn has_nonzero_value(&self) -> bool {
        self.values().iter().any(|v| *v != 0.0 && !v.is_nan())
    }

    /// Case-insensitive substring match against the string form of every field
    ///
    /// `needle` must already be lowercase.
    pub fn matches_search(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        if naive_timestamp::format(&self.timestamp)
            .to_lowercase()
            .contains(needle)
            || self.time.to_lowercase().contains(needle)
        {
            return true;
        }
        self.values()
            .iter()
            .any(|v| v.to_string().to_lowercase().contains(needle))
    }
}

// =============================================================================
// Dataset Summary
// =============================================================================

/// Summary metadata synthesized when files are unified
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatasetSummary {
    #[serde(alias = "total_records")]
    pub total_records: usize,
    #[serde(alias = "sensor_count")]
    pub sensor_count: usize,
    #[serde(alias = "file_count")]
    pub file_count: usize,
    #[serde(alias = "last_update")]
    pub last_update: String,
}

// =============================================================================
// Library Entries
// =============================================================================

/// Provenance of a library entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LibrarySource {
    #[default]
    #[serde(alias = "processed")]
    Local,
    Backend,
    Merged,
}

impl std::fmt::Display for LibrarySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LibrarySource::Local => "local",
            LibrarySource::Backend => "backend",
            LibrarySource::Merged => "merged",
        };
        f.write_str(name)
    }
}

/// A named dataset snapshot kept in the library index
///
/// The `data` payload is an independent copy; loading an entry replaces the
/// live dataset rather than referencing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub records: usize,
    #[serde(with = "utc_timestamp")]
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<SensorReading>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<DatasetSummary>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub source: LibrarySource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl LibraryEntry {
    /// Create a local entry without payload
    pub fn new(id: impl Into<String>, name: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            files: Vec::new(),
            records: 0,
            date,
            data: None,
            summary: None,
            tags: Vec::new(),
            source: LibrarySource::Local,
            size: None,
            processing_date: None,
            status: None,
        }
    }

    /// Check whether the entry carries a dataset payload
    pub fn has_payload(&self) -> bool {
        self.data.as_ref().is_some_and(|data| !data.is_empty())
    }

    /// Check whether the entry carries a tag (exact, case-sensitive)
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

// =============================================================================
// Sensor Unit Configuration
// =============================================================================

/// Display unit per sensor key; always holds exactly one entry per key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SensorUnitConfig {
    units: BTreeMap<SensorKey, String>,
}

impl SensorUnitConfig {
    /// The hardcoded default unit map
    pub fn defaults() -> Self {
        Self {
            units: DEFAULT_UNITS
                .iter()
                .map(|(key, unit)| (*key, unit.to_string()))
                .collect(),
        }
    }

    /// Parse a persisted unit map, ignoring unknown keys and filling gaps
    /// from the defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: HashMap<String, String> = serde_json::from_str(json)
            .map_err(|e| Error::serialization("Malformed sensor unit map", e))?;

        let mut config = Self::defaults();
        for (name, unit) in raw {
            if let Some(key) = SensorKey::from_name(&name) {
                config.units.insert(key, unit);
            }
        }
        Ok(config)
    }

    /// Serialize the unit map keyed by channel name
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::serialization("Unit map encoding", e))
    }

    /// Get the unit for a sensor key
    pub fn unit(&self, key: SensorKey) -> &str {
        self.units
            .get(&key)
            .map(String::as_str)
            .unwrap_or(NOT_AVAILABLE)
    }

    /// Set the unit for a sensor key
    pub fn set(&mut self, key: SensorKey, unit: impl Into<String>) {
        self.units.insert(key, unit.into());
    }

    /// Iterate over (key, unit) pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (SensorKey, &str)> {
        self.units.iter().map(|(key, unit)| (*key, unit.as_str()))
    }
}

impl Default for SensorUnitConfig {
    fn default() -> Self {
        Self::defaults()
    }
}

// =============================================================================
// Timestamp Serialization
// =============================================================================

/// Naive (source-clock) timestamps on the wire
///
/// Serialized as `YYYY-MM-DDTHH:MM:SS[.fff]`; deserialization also accepts a
/// space separator and RFC 3339 strings with an offset (the offset is dropped).
pub mod naive_timestamp {
    use chrono::{DateTime, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serializer};

    const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    pub fn format(timestamp: &NaiveDateTime) -> String {
        timestamp.format(WIRE_FORMAT).to_string()
    }

    pub fn parse(value: &str) -> Option<NaiveDateTime> {
        let trimmed = value.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Some(dt.naive_local());
        }
        NaiveDateTime::parse_from_str(trimmed, WIRE_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
    }

    pub fn serialize<S: Serializer>(
        timestamp: &NaiveDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(timestamp))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'")))
    }
}

/// UTC instants on the wire
///
/// Accepts RFC 3339 and offset-less ISO strings (treated as UTC), the two
/// shapes produced by the dashboard and the backend respectively.
pub mod utc_timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(value: &str) -> Option<DateTime<Utc>> {
        let trimmed = value.trim();
        DateTime::parse_from_rfc3339(trimmed)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| super::naive_timestamp::parse(trimmed).map(|naive| naive.and_utc()))
    }

    pub fn serialize<S: Serializer>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date '{raw}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn create_test_timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 7, 29)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    mod sensor_key_tests {
        use super::*;

        #[test]
        fn test_names_round_trip() {
            for key in SensorKey::ALL {
                assert_eq!(SensorKey::from_name(key.as_str()), Some(key));
            }
            assert_eq!(SensorKey::from_name("unknown"), None);
        }

        #[test]
        fn test_index_matches_positional_order() {
            for (position, key) in SensorKey::ALL.iter().enumerate() {
                assert_eq!(key.index(), position);
            }
        }

        #[test]
        fn test_from_str_accepts_display_names() {
            assert_eq!(
                "wind speed".parse::<SensorKey>().unwrap(),
                SensorKey::WindSpeed
            );
            assert_eq!(
                "Battery-Voltage".parse::<SensorKey>().unwrap(),
                SensorKey::Battery
            );
            assert_eq!(
                "Rain_Gauge".parse::<SensorKey>().unwrap(),
                SensorKey::Rainfall
            );
            assert!("bogus".parse::<SensorKey>().is_err());
        }
    }

    mod reading_tests {
        use super::*;

        #[test]
        fn test_from_values_derives_time() {
            let mut values = [0.0; SENSOR_COUNT];
            values[0] = 5.2;
            let reading = SensorReading::from_values(create_test_timestamp(), "%H:%M:%S", values);

            assert_eq!(reading.time, "00:00:00");
            assert_eq!(reading.wind_speed, 5.2);
            assert_eq!(reading.value(SensorKey::WindSpeed), 5.2);
            assert_eq!(reading.values(), values);
            assert!(reading.has_nonzero_value());
        }

        #[test]
        fn test_unrenderable_time_format_falls_back() {
            let timestamp = create_test_timestamp() + chrono::Duration::minutes(65);

            assert_eq!(format_time(&timestamp, "%Y %z"), None);
            assert_eq!(format_time(&timestamp, "%Q"), None);
            assert_eq!(format_time(&timestamp, "%d/%m %H:%M").as_deref(), Some("29/07 01:05"));

            for format in ["%Y %z", "%Q", "%:z"] {
                let reading = SensorReading::from_values(timestamp, format, [1.0; SENSOR_COUNT]);
                assert_eq!(reading.time, "01:05:00");
            }
        }

        #[test]
        fn test_all_zero_reading_has_no_value() {
            let reading =
                SensorReading::from_values(create_test_timestamp(), "%H:%M:%S", [0.0; 10]);
            assert!(!reading.has_nonzero_value());
        }

        #[test]
        fn test_matches_search() {
            let mut values = [0.0; SENSOR_COUNT];
            values[2] = 21.75;
            let reading = SensorReading::from_values(create_test_timestamp(), "%H:%M:%S", values);

            assert!(reading.matches_search(""));
            assert!(reading.matches_search("21.7"));
            assert!(reading.matches_search("2024-07"));
            assert!(reading.matches_search("00:00"));
            assert!(!reading.matches_search("99.9"));
        }

        #[test]
        fn test_wire_format_uses_channel_names() {
            let mut values = [0.0; SENSOR_COUNT];
            values[9] = 12.6;
            let reading = SensorReading::from_values(create_test_timestamp(), "%H:%M:%S", values);

            let json = serde_json::to_value(&reading).unwrap();
            assert_eq!(json["timestamp"], "2024-07-29T00:00:00");
            assert_eq!(json["Average_12V_Battery"], 12.6);

            let decoded: SensorReading = serde_json::from_value(json).unwrap();
            assert_eq!(decoded, reading);
        }

        #[test]
        fn test_deserialize_accepts_offset_timestamps_and_missing_fields() {
            let json = r#"{"timestamp":"2024-07-29T06:30:00.000Z","time":"06:30:00","NRG_T60_Temp":18.5}"#;
            let reading: SensorReading = serde_json::from_str(json).unwrap();

            assert_eq!(
                reading.timestamp,
                create_test_timestamp() + chrono::Duration::minutes(390)
            );
            assert_eq!(reading.temperature, 18.5);
            assert_eq!(reading.wind_speed, 0.0);
        }
    }

    mod library_entry_tests {
        use super::*;

        #[test]
        fn test_deserialize_dashboard_entry() {
            let json = r#"{
                "id": "1722211200000",
                "name": "Processed_Data_2024-07-29",
                "files": ["a.txt"],
                "records": 2,
                "date": "2024-07-29T00:00:00.000Z",
                "tags": ["TXT"],
                "source": "processed"
            }"#;
            let entry: LibraryEntry = serde_json::from_str(json).unwrap();

            assert_eq!(entry.source, LibrarySource::Local);
            assert_eq!(entry.date, Utc.with_ymd_and_hms(2024, 7, 29, 0, 0, 0).unwrap());
            assert!(entry.has_tag("TXT"));
            assert!(!entry.has_tag("txt"));
            assert!(!entry.has_payload());
        }

        #[test]
        fn test_deserialize_backend_style_date() {
            let json = r#"{"id":"backend-x","name":"x.rld","date":"2024-07-29T10:15:00.123456","source":"backend"}"#;
            let entry: LibraryEntry = serde_json::from_str(json).unwrap();

            assert_eq!(entry.source, LibrarySource::Backend);
            assert_eq!(entry.records, 0);
            assert!(entry.tags.is_empty());
        }
    }

    mod unit_config_tests {
        use super::*;

        #[test]
        fn test_defaults_cover_every_key() {
            let config = SensorUnitConfig::defaults();
            assert_eq!(config.iter().count(), SENSOR_COUNT);
            assert_eq!(config.unit(SensorKey::WindSpeed), "m/s");
            assert_eq!(config.unit(SensorKey::Battery), "V");
        }

        #[test]
        fn test_from_json_ignores_unknown_and_fills_missing() {
            let config =
                SensorUnitConfig::from_json(r#"{"NRG_40C_Anem":"km/h","Mystery":"x"}"#).unwrap();

            assert_eq!(config.unit(SensorKey::WindSpeed), "km/h");
            assert_eq!(config.unit(SensorKey::Humidity), "%");
            assert_eq!(config.iter().count(), SENSOR_COUNT);
        }

        #[test]
        fn test_from_json_rejects_malformed() {
            assert!(SensorUnitConfig::from_json("{not json").is_err());
        }

        #[test]
        fn test_json_round_trip() {
            let mut config = SensorUnitConfig::defaults();
            config.set(SensorKey::Pressure, "mbar");

            let json = config.to_json().unwrap();
            assert!(json.contains("\"NRG_BP60_Baro\":\"mbar\""));
            assert_eq!(SensorUnitConfig::from_json(&json).unwrap(), config);
        }
    }
}
