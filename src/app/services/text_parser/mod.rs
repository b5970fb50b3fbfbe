//! Text parser for data logger exports
//!
//! This module turns the raw text of a logger export into normalized
//! [`SensorReading`](crate::app::models::SensorReading) records. Two input
//! shapes are supported: tab-delimited SymphoniePRO exports with a
//! `Timestamp` header row, and loosely delimited TXT files without a header.
//!
//! ## Architecture
//!
//! - [`detector`] - Classifies content as structured or loose
//! - [`column_mapping`] - Resolves sensor keys to header columns (structured only)
//! - [`record_parser`] - Converts a single line into a reading
//! - [`field_parsers`] - Timestamp, numeric and delimiter helpers
//! - [`stats`] - Parse statistics, line errors and the parse result
//! - [`parser`] - File and content orchestration
//!
//! A malformed line never aborts a file. It is skipped, logged and counted in
//! [`ParseStats`]; callers decide what an empty result means.
//!
//! ## Usage
//!
//! ```rust
//! use datasense::app::services::text_parser::TextFileParser;
//!
//! let parser = TextFileParser::default();
//! let result = parser.parse_content("1.0,2.0,3.0\n", "loose.txt");
//!
//! assert_eq!(result.readings.len(), 1);
//! assert_eq!(result.readings[0].temperature, 3.0);
//! ```

pub mod column_mapping;
pub mod detector;
pub mod field_parsers;
pub mod parser;
pub mod record_parser;
pub mod stats;

#[cfg(test)]
pub mod tests;

// Re-export main types for easy access
pub use column_mapping::ColumnMapping;
pub use detector::{FormatKind, detect_format};
pub use parser::TextFileParser;
pub use stats::{LineError, ParseResult, ParseStats};
