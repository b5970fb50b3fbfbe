//! Core text export parser implementation
//!
//! This module handles file reading, format detection and dispatch to the
//! structured or loose line parsers.

use chrono::{Local, NaiveDateTime};
use std::path::Path;
use tracing::{debug, info, warn};

use super::column_mapping::ColumnMapping;
use super::detector::{FormatKind, detect_format};
use super::field_parsers::is_loose_skip_line;
use super::record_parser::{parse_loose_line, parse_structured_line};
use super::stats::{LineError, ParseResult, ParseStats};
use crate::Config;
use crate::app::models::SensorReading;
use crate::constants::DEFAULT_TIME_FORMAT;
use crate::{Error, Result};

/// Parser for SymphoniePRO and loose TXT exports
#[derive(Debug, Clone)]
pub struct TextFileParser {
    time_format: String,
}

impl Default for TextFileParser {
    fn default() -> Self {
        Self::new(DEFAULT_TIME_FORMAT)
    }
}

impl TextFileParser {
    /// Create a parser deriving display times with the given chrono format
    pub fn new(time_format: impl Into<String>) -> Self {
        Self {
            time_format: time_format.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.display.time_format.clone())
    }

    /// Read and parse a file from disk
    ///
    /// Invalid UTF-8 sequences are replaced rather than rejected; logger
    /// exports are not always clean UTF-8.
    pub async fn parse_file(&self, file_path: &Path) -> Result<ParseResult> {
        info!("Parsing text file: {}", file_path.display());

        let bytes = tokio::fs::read(file_path).await.map_err(|e| {
            Error::io(format!("Failed to read file {}", file_path.display()), e)
        })?;
        let content = String::from_utf8_lossy(&bytes);

        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_path.display().to_string());

        Ok(self.parse_content(&content, &file_name))
    }

    /// Parse in-memory content, synthesizing loose timestamps from now
    pub fn parse_content(&self, content: &str, file_name: &str) -> ParseResult {
        self.parse_content_at(content, file_name, Local::now().naive_local())
    }

    /// Parse in-memory content with an explicit start time for loose input
    pub fn parse_content_at(
        &self,
        content: &str,
        file_name: &str,
        started_at: NaiveDateTime,
    ) -> ParseResult {
        let format = detect_format(content, file_name);
        let mut stats = ParseStats::new();

        let readings = match format {
            FormatKind::Structured { header_line_index } => {
                self.parse_structured(content, header_line_index, &mut stats)
            }
            FormatKind::Loose => self.parse_loose(content, started_at, &mut stats),
        };

        if readings.is_empty() {
            warn!("No valid data found in {}", file_name);
        } else {
            info!(
                "Parsed {} readings from {} lines in {} ({} format)",
                stats.records_parsed,
                stats.total_lines,
                file_name,
                format.name()
            );
        }

        ParseResult {
            file_name: file_name.to_string(),
            format,
            readings,
            stats,
        }
    }

    fn parse_structured(
        &self,
        content: &str,
        header_line_index: usize,
        stats: &mut ParseStats,
    ) -> Vec<SensorReading> {
        let mut lines = content.lines().enumerate().skip(header_line_index);
        let Some((_, header_line)) = lines.next() else {
            return Vec::new();
        };

        let mapping = ColumnMapping::analyze(header_line.trim());
        stats.mapped_columns = mapping.mapped_count();
        debug!(
            "Column mapping: {} header columns, {} sensors resolved, missing {:?}",
            mapping.header_width(),
            mapping.mapped_count(),
            mapping.missing_keys()
        );

        let mut readings = Vec::new();
        for (index, raw) in lines {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            stats.total_lines += 1;

            match parse_structured_line(line, index + 1, &mapping, &self.time_format) {
                Ok(Some(reading)) => {
                    readings.push(reading);
                    stats.records_parsed += 1;
                }
                Ok(None) => stats.zero_rows_dropped += 1,
                Err(e) => {
                    if matches!(e, LineError::InvalidTimestamp { .. }) {
                        warn!("Skipping row: {}", e);
                    } else {
                        debug!("Skipping row: {}", e);
                    }
                    stats.record_error(e);
                }
            }
        }
        readings
    }

    fn parse_loose(
        &self,
        content: &str,
        started_at: NaiveDateTime,
        stats: &mut ParseStats,
    ) -> Vec<SensorReading> {
        let mut readings = Vec::new();
        let non_blank = content
            .lines()
            .enumerate()
            .map(|(index, raw)| (index, raw.trim()))
            .filter(|(_, line)| !line.is_empty());

        for (position, (index, line)) in non_blank.enumerate() {
            if is_loose_skip_line(line) {
                continue;
            }
            stats.total_lines += 1;

            match parse_loose_line(line, index + 1, position, started_at, &self.time_format) {
                Ok(Some(reading)) => {
                    readings.push(reading);
                    stats.records_parsed += 1;
                }
                Ok(None) => stats.zero_rows_dropped += 1,
                Err(e) => {
                    debug!("Skipping line: {}", e);
                    stats.record_error(e);
                }
            }
        }
        readings
    }
}
