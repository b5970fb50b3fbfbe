//! Command-line argument definitions for DataSense
//!
//! This module defines the CLI interface using the clap derive API.

use crate::app::models::SensorKey;
use crate::app::services::export::ExportFormat;
use crate::{Error, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the DataSense environmental data tool
///
/// Parses data logger text exports, summarizes sensor statistics, exports
/// processed datasets and manages the local library of processed batches.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "datasense",
    version,
    about = "Parse, summarize and export meteorological data logger files",
    long_about = "Processes SymphoniePRO-style tab-delimited exports and loosely delimited \
                  sensor text files into a unified ten-sensor dataset. Binary .rld logger files \
                  are converted through the DataSense backend. Processed batches are kept in a \
                  local library with tags and one-year retention."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    ///
    /// TOML configuration file. If not specified, looks for
    /// <config dir>/datasense/config.toml
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        global = true,
        help = "Path to configuration file (TOML format)"
    )]
    pub config_file: Option<PathBuf>,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Suppress output (quiet mode)
    ///
    /// Only show errors. Overrides verbose settings.
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Parse files and print the dataset summary and sensor statistics
    Parse(ParseArgs),
    /// Parse files and write the unified dataset as CSV or JSON
    Export(ExportArgs),
    /// Manage the library of processed batches
    #[command(subcommand)]
    Library(LibraryCommand),
    /// Show or change sensor display units
    #[command(subcommand)]
    Units(UnitsCommand),
    /// Talk to the conversion backend
    #[command(subcommand)]
    Backend(BackendCommand),
}

/// Arguments for the parse command
#[derive(Debug, Clone, ClapArgs)]
pub struct ParseArgs {
    /// Files or directories to parse
    ///
    /// Directories are searched (non-recursively) for *.txt and *.rld files.
    #[arg(value_name = "PATHS", required = true)]
    pub paths: Vec<PathBuf>,

    /// Only keep records matching this search term
    #[arg(short = 's', long = "search", value_name = "TERM")]
    pub search: Option<String>,

    /// Print the wind direction distribution
    #[arg(long = "wind-rose")]
    pub wind_rose: bool,
}

/// Arguments for the export command
#[derive(Debug, Clone, ClapArgs)]
pub struct ExportArgs {
    /// Files or directories to parse
    #[arg(value_name = "PATHS", required = true)]
    pub paths: Vec<PathBuf>,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value = "csv")]
    pub format: OutputFormat,

    /// Output file; defaults to stdout
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Only export records matching this search term
    #[arg(short = 's', long = "search", value_name = "TERM")]
    pub search: Option<String>,

    /// Sort records by `timestamp` or a sensor name before exporting
    #[arg(long = "sort", value_name = "FIELD")]
    pub sort: Option<String>,

    /// Sort in descending order
    #[arg(long = "desc", requires = "sort")]
    pub descending: bool,
}

/// Export formats selectable on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Comma-separated values with a header row
    Csv,
    /// JSON array using backend field names
    Json,
}

impl From<OutputFormat> for ExportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Csv => ExportFormat::Csv,
            OutputFormat::Json => ExportFormat::Json,
        }
    }
}

/// Library subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum LibraryCommand {
    /// List library entries
    List {
        /// Case-insensitive search on name and tags
        #[arg(short = 's', long = "search", value_name = "TERM")]
        search: Option<String>,

        /// Only entries carrying this tag (repeatable)
        #[arg(short = 't', long = "tag", value_name = "TAG")]
        tags: Vec<String>,

        /// Merge the backend's stored files into the listing first
        #[arg(long = "refresh")]
        refresh: bool,
    },
    /// Load an entry and print its statistics
    Show { id: String },
    /// Remove an entry
    Remove { id: String },
    /// Add a tag to an entry
    Tag { id: String, tag: String },
    /// Remove a tag from an entry
    Untag { id: String, tag: String },
    /// Remove entries older than one year
    Cleanup {
        /// Only report what would be removed
        #[arg(long = "dry-run")]
        dry_run: bool,

        /// Do not ask for confirmation
        #[arg(short = 'y', long = "yes")]
        yes: bool,
    },
}

/// Unit subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum UnitsCommand {
    /// Print the unit of every sensor
    Show,
    /// Set the unit of one sensor
    Set {
        /// Channel name (e.g. NRG_40C_Anem) or display name (e.g. "Wind Speed")
        sensor: String,
        unit: String,
    },
    /// Restore the default units
    Reset,
}

/// Backend subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum BackendCommand {
    /// Check backend health
    Health {
        /// Keep probing on the configured interval and print status changes
        #[arg(short = 'w', long = "watch")]
        watch: bool,
    },
    /// List files stored by the backend
    Files,
    /// Delete a stored file
    Delete { name: String },
}

impl Args {
    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Check if we should show progress bars (not in quiet mode)
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }

    /// Validate arguments that clap cannot check on its own
    pub fn validate(&self) -> Result<()> {
        if let Some(config_file) = &self.config_file {
            if !config_file.exists() {
                return Err(Error::configuration(format!(
                    "Config file does not exist: {}",
                    config_file.display()
                )));
            }
        }

        match &self.command {
            Some(Commands::Parse(ParseArgs { paths, .. }))
            | Some(Commands::Export(ExportArgs { paths, .. })) => {
                for path in paths {
                    if !path.exists() {
                        return Err(Error::configuration(format!(
                            "Input path does not exist: {}",
                            path.display()
                        )));
                    }
                }
            }
            Some(Commands::Units(UnitsCommand::Set { sensor, .. })) => {
                sensor.parse::<SensorKey>()?;
            }
            _ => {}
        }

        Ok(())
    }
}
