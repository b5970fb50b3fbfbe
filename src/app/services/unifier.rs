//! Dataset unification
//!
//! Concatenates per-file readings in input order and synthesizes the summary
//! metadata and the library snapshot for the batch.

use chrono::{DateTime, Local, Utc};
use tracing::info;

use crate::app::models::{DatasetSummary, LibraryEntry, LibrarySource, SensorReading};
use crate::app::services::text_parser::ParseResult;
use crate::constants::{BATCH_ENTRY_PREFIX, DEFAULT_BATCH_TAGS, DEFAULT_TIME_FORMAT, SENSOR_COUNT};

/// Readings of several files merged into one ordered dataset
#[derive(Debug, Clone, PartialEq)]
pub struct UnifiedDataset {
    /// Readings in file order, then source line order
    pub readings: Vec<SensorReading>,

    /// Contributing file names in input order
    pub files: Vec<String>,

    pub summary: DatasetSummary,
}

impl UnifiedDataset {
    /// Unify parse results, keeping input order
    ///
    /// Records are concatenated, not re-sorted by timestamp.
    pub fn from_results(results: Vec<ParseResult>) -> Self {
        Self::from_parts(
            results
                .into_iter()
                .map(|result| (result.file_name, result.readings)),
        )
    }

    /// Unify (file name, readings) pairs, keeping input order
    pub fn from_parts<I>(parts: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<SensorReading>)>,
    {
        let mut readings = Vec::new();
        let mut files = Vec::new();

        for (file_name, file_readings) in parts {
            readings.extend(file_readings);
            files.push(file_name);
        }

        let summary = DatasetSummary {
            total_records: readings.len(),
            sensor_count: SENSOR_COUNT,
            file_count: files.len(),
            last_update: Local::now().format(DEFAULT_TIME_FORMAT).to_string(),
        };

        info!(
            "Unified {} records from {} files",
            summary.total_records, summary.file_count
        );

        Self {
            readings,
            files,
            summary,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Build the library snapshot for this batch
    ///
    /// The entry carries an independent copy of the readings.
    pub fn to_library_entry(&self, now: DateTime<Utc>) -> LibraryEntry {
        LibraryEntry {
            id: now.timestamp_millis().to_string(),
            name: format!("{}{}", BATCH_ENTRY_PREFIX, now.format("%Y-%m-%d")),
            files: self.files.clone(),
            records: self.readings.len(),
            date: now,
            data: Some(self.readings.clone()),
            summary: Some(self.summary.clone()),
            tags: DEFAULT_BATCH_TAGS.iter().map(|t| t.to_string()).collect(),
            source: LibrarySource::Local,
            size: None,
            processing_date: None,
            status: None,
        }
    }
}
