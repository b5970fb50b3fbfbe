//! Dataset export and report rows
//!
//! CSV and JSON writers use the same field names as the backend wire format,
//! so an exported file can be re-imported by anything that speaks it.

use serde::Serialize;
use std::io::Write;
use std::str::FromStr;
use tracing::debug;

use crate::app::models::{SensorKey, SensorReading, SensorUnitConfig};
use crate::app::services::statistics::DatasetStatistics;
use crate::constants::NOT_AVAILABLE;
use crate::{Error, Result};

/// Supported dataset export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(Error::configuration(format!(
                "Unknown export format '{}': expected csv or json",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Header row for CSV exports: `timestamp`, `time`, then every channel name
pub fn csv_header() -> Vec<&'static str> {
    let mut header = vec!["timestamp", "time"];
    header.extend(SensorKey::ALL.map(SensorKey::as_str));
    header
}

/// Write readings as CSV
///
/// The header is written even for an empty dataset.
pub fn write_csv<W: Write>(writer: W, readings: &[SensorReading]) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    csv_writer
        .write_record(csv_header())
        .map_err(|e| Error::csv_export("Failed to write header", e))?;

    for reading in readings {
        csv_writer
            .serialize(reading)
            .map_err(|e| Error::csv_export(format!("Failed to write record {}", reading.timestamp), e))?;
    }

    csv_writer
        .flush()
        .map_err(|e| Error::io("Failed to flush CSV output", e))?;
    debug!("Wrote {} records as CSV", readings.len());
    Ok(())
}

/// Write readings as a pretty-printed JSON array
pub fn write_json<W: Write>(mut writer: W, readings: &[SensorReading]) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, readings)
        .map_err(|e| Error::serialization("Failed to encode readings", e))?;
    writer
        .write_all(b"\n")
        .and_then(|_| writer.flush())
        .map_err(|e| Error::io("Failed to write JSON output", e))?;
    debug!("Wrote {} records as JSON", readings.len());
    Ok(())
}

/// Write readings in the chosen format
pub fn write_dataset<W: Write>(writer: W, readings: &[SensorReading], format: ExportFormat) -> Result<()> {
    match format {
        ExportFormat::Csv => write_csv(writer, readings),
        ExportFormat::Json => write_json(writer, readings),
    }
}

// =============================================================================
// Report Rows
// =============================================================================

/// One display row of the per-sensor summary report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub name: String,
    pub average: String,
    pub maximum: String,
    pub minimum: String,
    pub unit: String,
}

fn two_decimals(value: f64) -> String {
    format!("{:.2}", value)
}

/// Per-sensor report rows in [`SensorKey`] order
///
/// Values are formatted to two decimals; sensors without statistics show
/// `N/A` in every numeric column.
pub fn report_rows(stats: &DatasetStatistics, units: &SensorUnitConfig) -> Vec<ReportRow> {
    stats
        .iter()
        .map(|(key, sensor)| {
            let (average, maximum, minimum) = match sensor.available() {
                Some(summary) => (
                    two_decimals(summary.average),
                    two_decimals(summary.maximum),
                    two_decimals(summary.minimum),
                ),
                None => (
                    NOT_AVAILABLE.to_string(),
                    NOT_AVAILABLE.to_string(),
                    NOT_AVAILABLE.to_string(),
                ),
            };

            ReportRow {
                name: key.display_name().to_string(),
                average,
                maximum,
                minimum,
                unit: units.unit(key).to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_readings() -> Vec<SensorReading> {
        let start = NaiveDate::from_ymd_opt(2024, 7, 29)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        vec![
            SensorReading::from_values(start, "%H:%M:%S", [5.2, 180.0, 21.5, 60.0, 1013.0, 0.0, 30.0, 1.5, 1.6, 12.8]),
            SensorReading::from_values(
                start + chrono::Duration::minutes(10),
                "%H:%M:%S",
                [6.0, 190.0, 22.0, 58.0, 1012.0, 0.2, 31.0, 1.4, 1.7, 12.7],
            ),
        ]
    }

    #[test]
    fn test_csv_header_and_rows() {
        let mut buffer = Vec::new();
        write_csv(&mut buffer, &sample_readings()).unwrap();
        let output = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "timestamp,time,NRG_40C_Anem,NRG_200M_Vane,NRG_T60_Temp,NRG_RH5X_Humi,NRG_BP60_Baro,\
             Rain_Gauge,NRG_PVT1_PV_Temp,PSM_c_Si_Isc_Soil,PSM_c_Si_Isc_Clean,Average_12V_Battery"
        );
        assert!(lines[1].starts_with("2024-07-29T00:00:00,00:00:00,5.2,180.0,"));
        assert!(lines[2].starts_with("2024-07-29T00:10:00,00:10:00,6.0,"));
    }

    #[test]
    fn test_csv_empty_dataset_has_header() {
        let mut buffer = Vec::new();
        write_csv(&mut buffer, &[]).unwrap();
        let output = String::from_utf8(buffer).unwrap();
        assert_eq!(output.lines().count(), 1);
        assert!(output.starts_with("timestamp,time,"));
    }

    #[test]
    fn test_json_uses_wire_names() {
        let mut buffer = Vec::new();
        write_json(&mut buffer, &sample_readings()).unwrap();

        let parsed: Vec<SensorReading> = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(parsed, sample_readings());

        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value[0]["NRG_40C_Anem"], 5.2);
        assert_eq!(value[0]["time"], "00:00:00");
    }

    #[test]
    fn test_report_rows() {
        let stats = DatasetStatistics::compute(&sample_readings());
        let mut units = SensorUnitConfig::defaults();
        units.set(SensorKey::WindSpeed, "km/h");
        let rows = report_rows(&stats, &units);

        assert_eq!(rows.len(), 10);
        assert_eq!(
            rows[0],
            ReportRow {
                name: "Wind Speed".to_string(),
                average: "5.60".to_string(),
                maximum: "6.00".to_string(),
                minimum: "5.20".to_string(),
                unit: "km/h".to_string(),
            }
        );
        assert_eq!(rows[9].unit, "V");
    }

    #[test]
    fn test_report_rows_without_data() {
        let stats = DatasetStatistics::compute(&[]);
        let rows = report_rows(&stats, &SensorUnitConfig::defaults());
        assert!(rows.iter().all(|row| row.average == "N/A" && row.minimum == "N/A"));
        assert_eq!(rows[4].unit, "hPa");
    }

    #[test]
    fn test_export_format_parsing() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert!("pdf".parse::<ExportFormat>().is_err());
    }
}
