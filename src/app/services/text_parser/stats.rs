//! Parsing statistics and result structures for text exports
//!
//! Line-level failures live here rather than in the crate error type: they
//! are recovered inside the parser and only reported through [`ParseStats`].

use super::detector::FormatKind;
use crate::app::models::SensorReading;
use crate::{Error, Result};

/// A recoverable failure on a single input line
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LineError {
    #[error("line {line}: {found} fields, header has {expected}")]
    TooFewFields {
        line: usize,
        found: usize,
        expected: usize,
    },

    #[error("line {line}: invalid timestamp '{value}'")]
    InvalidTimestamp { line: usize, value: String },

    #[error("line {line}: {found} tokens, at least {minimum} required")]
    TooFewTokens {
        line: usize,
        found: usize,
        minimum: usize,
    },
}

impl LineError {
    /// One-based line number within the file
    pub fn line(&self) -> usize {
        match self {
            LineError::TooFewFields { line, .. }
            | LineError::InvalidTimestamp { line, .. }
            | LineError::TooFewTokens { line, .. } => *line,
        }
    }
}

/// Parsing result with readings and statistics for one file
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Name of the parsed file
    pub file_name: String,

    /// Detected input format
    pub format: FormatKind,

    /// Retained readings in source line order
    pub readings: Vec<SensorReading>,

    /// Parsing statistics
    pub stats: ParseStats,
}

impl ParseResult {
    /// Check whether the file produced at least one reading
    pub fn has_data(&self) -> bool {
        !self.readings.is_empty()
    }

    /// Take the readings, failing when the file produced none
    pub fn into_readings(self) -> Result<Vec<SensorReading>> {
        if self.readings.is_empty() {
            return Err(Error::no_valid_data(self.file_name));
        }
        Ok(self.readings)
    }
}

/// Per-file parsing statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseStats {
    /// Candidate data lines seen (blank, comment and header lines excluded)
    pub total_lines: usize,

    /// Readings retained
    pub records_parsed: usize,

    /// Lines skipped because they failed to parse
    pub lines_skipped: usize,

    /// Lines that parsed but carried no non-zero sensor value
    pub zero_rows_dropped: usize,

    /// Sensor keys resolved to a header column (structured input only)
    pub mapped_columns: usize,

    /// Line errors for diagnostics
    pub errors: Vec<LineError>,
}

impl ParseStats {
    /// Create new empty statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a skipped line
    pub fn record_error(&mut self, error: LineError) {
        self.lines_skipped += 1;
        self.errors.push(error);
    }

    /// Calculate success rate as a percentage of candidate lines
    pub fn success_rate(&self) -> f64 {
        if self.total_lines == 0 {
            0.0
        } else {
            (self.records_parsed as f64 / self.total_lines as f64) * 100.0
        }
    }

    /// Check if parsing was mostly successful (>90% success rate)
    pub fn is_successful(&self) -> bool {
        self.success_rate() > 90.0
    }
}
