//! Application constants for DataSense
//!
//! This module contains the windowing limits, column matching rules, default
//! sensor units and storage names used throughout the application.

use crate::app::models::SensorKey;

// =============================================================================
// Windowing and Chart Limits
// =============================================================================

/// Number of records appended to the visible window per chunk load
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Maximum number of points handed to a chart after downsampling
pub const DEFAULT_MAX_CHART_POINTS: usize = 1000;

/// Number of sensor fields carried by every reading
pub const SENSOR_COUNT: usize = 10;

// =============================================================================
// Input Files
// =============================================================================

/// File extensions accepted for processing (lowercase, without dot)
pub const ACCEPTED_EXTENSIONS: &[&str] = &["txt", "rld"];

/// Extension of binary logger files that need backend conversion first
pub const BINARY_EXTENSION: &str = "rld";

/// Maximum number of files accepted in a single batch
pub const DEFAULT_MAX_FILES_PER_BATCH: usize = 10;

/// First token of the header line in structured (SymphoniePRO) exports
pub const STRUCTURED_HEADER_TOKEN: &str = "Timestamp";

/// Line prefixes ignored by the loose TXT parser
pub const LOOSE_SKIP_PREFIXES: &[&str] = &["#", "//", "Header"];

/// Minimum number of tokens for a loose TXT line to be considered data
pub const LOOSE_MIN_TOKENS: usize = 3;

/// Timestamp formats accepted in the first column of structured exports
pub const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

// =============================================================================
// Column Matching Rules
// =============================================================================

/// A structured-export column rule: a header matches when it contains both
/// the channel tag and the statistic tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRule {
    pub key: SensorKey,
    pub channel: &'static str,
    pub statistic: &'static str,
}

/// Ordered rule table used by the column mapper, one rule per sensor key
pub const COLUMN_RULES: [ColumnRule; SENSOR_COUNT] = [
    ColumnRule {
        key: SensorKey::WindSpeed,
        channel: "Ch1_Anem",
        statistic: "Avg_m/s",
    },
    ColumnRule {
        key: SensorKey::WindDirection,
        channel: "Ch13_Vane",
        statistic: "Avg_Deg",
    },
    ColumnRule {
        key: SensorKey::Temperature,
        channel: "Ch14_Analog",
        statistic: "Avg_C",
    },
    ColumnRule {
        key: SensorKey::Humidity,
        channel: "Ch16_Analog",
        statistic: "Avg_%RH",
    },
    ColumnRule {
        key: SensorKey::Pressure,
        channel: "Ch17_Analog",
        statistic: "Avg_hPa",
    },
    ColumnRule {
        key: SensorKey::Rainfall,
        channel: "Ch4_Total",
        statistic: "Sum_mm",
    },
    ColumnRule {
        key: SensorKey::PvTemperature,
        channel: "Ch21_Therm",
        statistic: "Avg_C",
    },
    ColumnRule {
        key: SensorKey::SolarSoil,
        channel: "Ch22_Analog",
        statistic: "Avg_A",
    },
    ColumnRule {
        key: SensorKey::SolarClean,
        channel: "Ch23_Analog",
        statistic: "Avg_A",
    },
    ColumnRule {
        key: SensorKey::Battery,
        channel: "Ch20_Analog",
        statistic: "Avg_V",
    },
];

// =============================================================================
// Sensor Units
// =============================================================================

/// Default display unit for each sensor key
pub const DEFAULT_UNITS: [(SensorKey, &str); SENSOR_COUNT] = [
    (SensorKey::WindSpeed, "m/s"),
    (SensorKey::WindDirection, "degrees"),
    (SensorKey::Temperature, "°C"),
    (SensorKey::Humidity, "%"),
    (SensorKey::Pressure, "hPa"),
    (SensorKey::Rainfall, "mm"),
    (SensorKey::PvTemperature, "°C"),
    (SensorKey::SolarSoil, "A"),
    (SensorKey::SolarClean, "A"),
    (SensorKey::Battery, "V"),
];

/// Placeholder shown when a unit or statistic is not available
pub const NOT_AVAILABLE: &str = "N/A";

// =============================================================================
// Persistence
// =============================================================================

/// Storage key of the JSON-serialized library index
pub const LIBRARY_STORAGE_KEY: &str = "datasenseLibraryFiles";

/// Storage key of the JSON-serialized sensor unit map
pub const UNITS_STORAGE_KEY: &str = "datasenseSensorUnits";

/// Library entries older than this many months are purged at load time
pub const LIBRARY_RETENTION_MONTHS: u32 = 12;

/// Tags attached to library entries created from a local batch
pub const DEFAULT_BATCH_TAGS: &[&str] = &["TXT", "Processed", "Environmental"];

/// Name prefix of library entries created from a local batch
pub const BATCH_ENTRY_PREFIX: &str = "Processed_Data_";

// =============================================================================
// Backend Service
// =============================================================================

/// Default base URL of the conversion/storage backend
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Default request timeout in seconds
pub const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 30;

/// Default interval between backend health probes in seconds
pub const DEFAULT_HEALTH_CHECK_INTERVAL_SECS: u64 = 30;

/// Backend API routes
pub mod routes {
    pub const HEALTH: &str = "/health";
    pub const DATA: &str = "/api/data";
    pub const FILES: &str = "/api/files";
    pub const PROCESS_RLD: &str = "/api/process-rld";
    pub const PROCESS_TXT: &str = "/api/process-txt";
    pub const CONVERT_RLD_TO_TXT: &str = "/api/convert-rld-to-txt";
}

// =============================================================================
// Display
// =============================================================================

/// Default format used to derive the display `time` string of a reading
pub const DEFAULT_TIME_FORMAT: &str = "%H:%M:%S";

/// Application name used for config and data directories
pub const APP_DIR_NAME: &str = "datasense";
