//! DataSense Library
//!
//! A Rust library for turning meteorological data logger text exports into a
//! uniform sensor time series for charting, statistics and reporting.
//!
//! This library provides tools for:
//! - Detecting and parsing tab-delimited SymphoniePRO exports and loosely delimited TXT files
//! - Unifying records from several files into one ordered dataset
//! - Windowed access to large datasets (chunk loading, search, sort, chart downsampling)
//! - Per-sensor statistics with explicit "not applicable" results
//! - A persisted library of dataset snapshots and user-editable sensor units
//! - A thin HTTP client for the external conversion/storage backend

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod session;
    pub mod services {
        pub mod backend_client;
        pub mod data_window;
        pub mod export;
        pub mod statistics;
        pub mod storage;
        pub mod text_parser;
        pub mod unifier;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
    pub mod input;
}

// Re-export commonly used types
pub use app::models::{LibraryEntry, SensorKey, SensorReading};
pub use app::services::backend_client::BackendError;
pub use config::Config;

/// Result type alias for DataSense operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for file, backend, storage and configuration failures
///
/// Line-level parse failures are not represented here; they are recovered
/// inside the text parser and only show up in its statistics.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// A file produced zero valid records
    #[error("No valid data found in file '{file}'")]
    NoValidData { file: String },

    /// A file with an extension other than .txt or .rld
    #[error("Unsupported file format for '{file}'. Please use .rld or .txt files")]
    UnsupportedFile { file: String },

    /// Backend transport or service failure
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Configuration or persisted settings error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// JSON (de)serialization error
    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// CSV export error
    #[error("CSV export error: {message}")]
    CsvExport {
        message: String,
        #[source]
        source: csv::Error,
    },

    /// A batch was started while another one is still running
    #[error("A batch is already being processed")]
    BatchInProgress,

    /// Library entry lookup failed
    #[error("Library entry not found: {id}")]
    LibraryEntryNotFound { id: String },

    /// Processing interrupted
    #[error("Processing interrupted: {reason}")]
    ProcessingInterrupted { reason: String },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a "no valid data" file error
    pub fn no_valid_data(file: impl Into<String>) -> Self {
        Self::NoValidData { file: file.into() }
    }

    /// Create an unsupported file error
    pub fn unsupported_file(file: impl Into<String>) -> Self {
        Self::UnsupportedFile { file: file.into() }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a serialization error with context
    pub fn serialization(message: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            message: message.into(),
            source,
        }
    }

    /// Create a CSV export error with context
    pub fn csv_export(message: impl Into<String>, source: csv::Error) -> Self {
        Self::CsvExport {
            message: message.into(),
            source,
        }
    }

    /// Create a library entry not found error
    pub fn library_entry_not_found(id: impl Into<String>) -> Self {
        Self::LibraryEntryNotFound { id: id.into() }
    }

    /// Create a processing interrupted error
    pub fn processing_interrupted(reason: impl Into<String>) -> Self {
        Self::ProcessingInterrupted {
            reason: reason.into(),
        }
    }
}

// Automatic conversions from common error types
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization {
            message: "JSON processing failed".to_string(),
            source: error,
        }
    }
}

impl From<csv::Error> for Error {
    fn from(error: csv::Error) -> Self {
        Self::CsvExport {
            message: "CSV writing failed".to_string(),
            source: error,
        }
    }
}
