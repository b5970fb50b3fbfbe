//! Command implementations for the DataSense CLI
//!
//! This module contains the command execution logic, progress reporting and
//! terminal output for the CLI interface.

use crate::app::models::{LibraryEntry, SensorKey};
use crate::app::services::backend_client::{BackendClient, BackendStatus, spawn_health_probe};
use crate::app::services::data_window::{SortDirection, SortKey};
use crate::app::services::export::ExportFormat;
use crate::app::services::statistics::{SensorStatistics, WindRoseBin};
use crate::app::session::{BatchReport, DashboardSession, FileInput, FileOutcome};
use crate::cli::args::{
    Args, BackendCommand, Commands, ExportArgs, LibraryCommand, ParseArgs, UnitsCommand,
};
use crate::cli::input::{collect_input_files, prompt_confirmation};
use crate::config::Config;
use crate::{Error, Result};
use chrono::Utc;
use colored::Colorize;
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

/// Main command runner for DataSense
///
/// Sets up logging, validates arguments, loads the layered configuration and
/// dispatches to the selected subcommand.
pub async fn run(args: Args) -> Result<()> {
    setup_logging(&args)?;

    info!("Starting DataSense");
    debug!("Command line arguments: {:?}", args);

    args.validate()?;

    let config = load_configuration(&args)?;
    debug!("Loaded configuration: {:?}", config);

    let Some(command) = args.command.clone() else {
        return Ok(());
    };

    match command {
        Commands::Parse(parse_args) => run_parse(&args, &config, parse_args).await,
        Commands::Export(export_args) => run_export(&args, &config, export_args).await,
        Commands::Library(library) => run_library(&config, library).await,
        Commands::Units(units) => run_units(&config, units),
        Commands::Backend(backend) => run_backend(&config, backend).await,
    }
}

/// Set up structured logging
fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("datasense={}", log_level)));

    if args.quiet {
        // Minimal logging for quiet mode
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
            .map_err(|e| Error::configuration(format!("Failed to initialize logging: {}", e)))?;
    } else {
        // Standard logging with uptime
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .map_err(|e| Error::configuration(format!("Failed to initialize logging: {}", e)))?;
    }

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Load configuration using layered approach (defaults -> file -> env)
fn load_configuration(args: &Args) -> Result<Config> {
    let config = Config::load(args.config_file.as_deref())?;
    info!(
        "Using data directory {} and backend {}",
        config.storage.data_dir.display(),
        config.backend.base_url
    );
    Ok(config)
}

// =============================================================================
// Parse / Export
// =============================================================================

async fn run_parse(args: &Args, config: &Config, parse_args: ParseArgs) -> Result<()> {
    let session = DashboardSession::open(config)?;
    let report = process_batch(args, &session, &parse_args.paths).await?;
    print_batch_report(&report);

    if report.total_records == 0 {
        return Ok(());
    }

    if let Some(search) = &parse_args.search {
        let matched = session.window().apply_filter(search);
        println!(
            "{} {} of {} records match '{}'",
            "Filter:".bright_white().bold(),
            matched,
            session.window().len(),
            search
        );
    }

    print_statistics(&session);

    if parse_args.wind_rose {
        print_wind_rose(&session.wind_rose());
    }

    Ok(())
}

async fn run_export(args: &Args, config: &Config, export_args: ExportArgs) -> Result<()> {
    let session = DashboardSession::open(config)?;
    let report = process_batch(args, &session, &export_args.paths).await?;
    if !args.quiet {
        eprintln!("{}", report.message);
    }

    if report.total_records == 0 {
        return Err(Error::no_valid_data(
            report
                .outcomes
                .iter()
                .map(FileOutcome::file_name)
                .collect::<Vec<_>>()
                .join(", "),
        ));
    }

    if let Some(search) = &export_args.search {
        session.window().apply_filter(search);
    }
    if let Some(field) = &export_args.sort {
        let key: SortKey = field.parse()?;
        let direction = if export_args.descending {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        session.window().apply_sort(key, direction);
    }

    let format = ExportFormat::from(export_args.format);
    let written = match &export_args.output {
        Some(path) => {
            let file = File::create(path)
                .map_err(|e| Error::io(format!("Failed to create {}", path.display()), e))?;
            let written = session.export(BufWriter::new(file), format)?;
            info!("Exported {} records to {}", written, path.display());
            written
        }
        None => session.export(io::stdout().lock(), format)?,
    };

    if !args.quiet {
        eprintln!(
            "{} {} records as {}",
            "Exported".bright_green().bold(),
            written,
            format
        );
    }
    Ok(())
}

/// Run a batch over the given paths with progress reporting
async fn process_batch(args: &Args, session: &DashboardSession, paths: &[PathBuf]) -> Result<BatchReport> {
    let start_time = Instant::now();
    let files = collect_input_files(paths)?;
    if files.is_empty() {
        return Err(Error::configuration(
            "No .txt or .rld files found in the given paths",
        ));
    }
    info!("Processing {} files", files.len());

    let progress_bar = if args.show_progress() && files.len() > 1 {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.set_message("Parsing...");
        Some(pb)
    } else {
        None
    };

    let inputs = files.into_iter().map(FileInput::from).collect();
    let report = session
        .process_files_with_progress(inputs, |outcome| {
            if let Some(pb) = &progress_bar {
                pb.inc(1);
                pb.set_message(outcome.file_name().to_string());
            }
        })
        .await?;

    if let Some(pb) = progress_bar {
        pb.finish_with_message(format!(
            "Done in {}",
            HumanDuration(start_time.elapsed())
        ));
    }

    Ok(report)
}

fn print_batch_report(report: &BatchReport) {
    println!();
    println!("{}", "Batch Summary".bright_green().bold());
    println!("{}", "=".repeat(60));

    for outcome in &report.outcomes {
        match outcome {
            FileOutcome::Processed {
                file_name,
                format,
                records,
                stats,
            } => println!(
                "  {} {} ({} format, {} records, {:.1}% of lines, {} all-zero rows dropped)",
                "✓".bright_green(),
                file_name.bright_cyan(),
                format.name(),
                records,
                stats.success_rate(),
                stats.zero_rows_dropped
            ),
            FileOutcome::Failed { file_name, error } => println!(
                "  {} {} {}",
                "✗".bright_red(),
                file_name.bright_cyan(),
                error.red()
            ),
        }
    }

    println!();
    if report.has_failures() {
        println!("{}", report.message.yellow());
    } else {
        println!("{}", report.message.bright_green());
    }
    if let Some(id) = &report.library_entry_id {
        println!("Total records: {}  Library entry: {}", report.total_records, id.bright_yellow());
    }
}

fn print_statistics(session: &DashboardSession) {
    let units = session.units();
    let stats = session.statistics();

    println!();
    println!("{}", "Sensor Statistics".bright_green().bold());
    println!(
        "  {:<24} {:>10} {:>10} {:>10} {:>10} {:>10}  {:<8} {}",
        "Sensor", "Average", "Min", "Max", "Median", "Latest", "Unit", "Level"
    );

    for (key, sensor) in stats.iter() {
        match sensor {
            SensorStatistics::Available(summary) => {
                let level = summary.level(summary.latest).to_string();
                println!(
                    "  {:<24} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10.2}  {:<8} {}",
                    key.display_name(),
                    summary.average,
                    summary.minimum,
                    summary.maximum,
                    summary.median,
                    summary.latest,
                    units.unit(key),
                    level.bright_black()
                );
            }
            SensorStatistics::NotApplicable => println!(
                "  {:<24} {:>10}",
                key.display_name(),
                crate::constants::NOT_AVAILABLE.bright_black()
            ),
        }
    }
}

fn print_wind_rose(bins: &[WindRoseBin]) {
    println!();
    println!("{}", "Wind Direction Distribution".bright_green().bold());
    for bin in bins {
        let bar = "#".repeat((bin.percentage / 2.0).round() as usize);
        println!(
            "  {:<3} {:>6} {:>6.1}%  {}",
            bin.sector.to_string(),
            bin.count,
            bin.percentage,
            bar.cyan()
        );
    }
}

// =============================================================================
// Library
// =============================================================================

async fn run_library(config: &Config, command: LibraryCommand) -> Result<()> {
    let session = DashboardSession::open(config)?;

    match command {
        LibraryCommand::List {
            search,
            tags,
            refresh,
        } => {
            if refresh {
                let merged = session.refresh_library_from_backend().await?;
                info!("Refreshed library with {} backend files", merged);
            }
            session.with_library(|library| {
                let entries = library.filter(search.as_deref().unwrap_or(""), &tags);
                print_library(&entries, library.len());
                let available = library.available_tags();
                if !available.is_empty() {
                    println!("Tags: {}", available.join(", ").bright_black());
                }
            });
        }
        LibraryCommand::Show { id } => {
            let count = session.load_library_entry(&id).await?;
            println!("Loaded {} records from {}", count, id.bright_yellow());
            print_statistics(&session);
        }
        LibraryCommand::Remove { id } => {
            let removed = session.with_library(|library| library.remove(&id))?;
            println!("Removed {} ({})", removed.name.bright_cyan(), id);
        }
        LibraryCommand::Tag { id, tag } => {
            session.with_library(|library| library.add_tag(&id, &tag))?;
            println!("Tagged {} with '{}'", id, tag);
        }
        LibraryCommand::Untag { id, tag } => {
            session.with_library(|library| library.remove_tag(&id, &tag))?;
            println!("Removed tag '{}' from {}", tag, id);
        }
        LibraryCommand::Cleanup { dry_run, yes } => {
            let now = Utc::now();
            let stats = session.with_library(|library| library.storage_stats(now));
            println!(
                "{} entries ({} records), {} older than one year ({} records)",
                stats.total_entries, stats.total_records, stats.old_entries, stats.old_records
            );

            if !stats.will_be_cleaned || dry_run {
                return Ok(());
            }
            if !yes && !prompt_confirmation("Remove old entries?", false)? {
                return Ok(());
            }

            let removed = session.with_library(|library| library.cleanup(now))?;
            println!("{} {} entries", "Removed".bright_green(), removed);
        }
    }

    Ok(())
}

fn print_library(entries: &[&LibraryEntry], total: usize) {
    println!(
        "{} ({} of {})",
        "Library".bright_green().bold(),
        entries.len(),
        total
    );
    for entry in entries {
        println!(
            "  {:<24} {:<32} {:>8} records  {}  {:<7} {}",
            entry.id.bright_yellow(),
            entry.name.bright_cyan(),
            entry.records,
            entry.date.format("%Y-%m-%d %H:%M"),
            entry.source.to_string(),
            entry.tags.join(", ").bright_black()
        );
    }
}

// =============================================================================
// Units
// =============================================================================

fn run_units(config: &Config, command: UnitsCommand) -> Result<()> {
    let session = DashboardSession::open(config)?;

    match command {
        UnitsCommand::Show => {}
        UnitsCommand::Set { sensor, unit } => {
            let key: SensorKey = sensor.parse()?;
            session.set_unit(key, &unit)?;
        }
        UnitsCommand::Reset => session.reset_units()?,
    }

    println!("{}", "Sensor Units".bright_green().bold());
    for (key, unit) in session.units().iter() {
        println!("  {:<24} {:<20} {}", key.display_name(), key.as_str().bright_black(), unit);
    }
    Ok(())
}

// =============================================================================
// Backend
// =============================================================================

async fn run_backend(config: &Config, command: BackendCommand) -> Result<()> {
    let client = BackendClient::from_config(config)?;

    match command {
        BackendCommand::Health { watch: true } => {
            watch_health(config, client).await;
        }
        BackendCommand::Health { watch: false } => {
            let health = client.health().await?;
            let status = if health.is_healthy() {
                health.status.bright_green()
            } else {
                health.status.yellow()
            };
            println!("Backend {} is {}", client.base_url(), status);
            if let Some(version) = health.version {
                println!("Version: {}", version);
            }
        }
        BackendCommand::Files => {
            let files = client.list_files().await?;
            println!("{} ({})", "Backend Files".bright_green().bold(), files.len());
            for file in files {
                println!(
                    "  {:<32} {:>8} records {:>10} bytes  {}",
                    file.filename.bright_cyan(),
                    file.records_added,
                    file.file_size,
                    file.processing_date.unwrap_or_default()
                );
            }
        }
        BackendCommand::Delete { name } => {
            client.delete_file(&name).await?;
            println!("Deleted {} from backend", name.bright_cyan());
        }
    }

    Ok(())
}

/// Print backend status changes until interrupted
async fn watch_health(config: &Config, client: BackendClient) {
    let interval = config.backend.health_check_interval();
    println!(
        "Watching {} every {}s (Ctrl+C to stop)",
        client.base_url().bright_cyan(),
        interval.as_secs()
    );

    let (mut status, probe) = spawn_health_probe(client, interval);
    while status.changed().await.is_ok() {
        let line = match &*status.borrow() {
            BackendStatus::Connecting => "connecting".yellow(),
            BackendStatus::Online => "online".bright_green(),
            BackendStatus::Offline { reason } => format!("offline ({})", reason).as_str().red(),
        };
        println!("[{}] Backend is {}", Utc::now().format("%H:%M:%S"), line);
    }
    probe.abort();
}

/// Render an error and its source chain for the terminal
///
/// A cause whose text is already part of the previous message is skipped.
pub fn error_report(error: &dyn std::error::Error) -> String {
    let mut report = format!("Error: {}", error);
    let mut previous = error.to_string();
    let mut source = error.source();

    while let Some(cause) = source {
        let text = cause.to_string();
        if !previous.contains(&text) {
            report.push_str(&format!("\n  Caused by: {}", text));
        }
        previous = text;
        source = cause.source();
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_report_includes_causes() {
        let error = Error::io(
            "Failed to read site.txt",
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        );
        assert_eq!(
            error_report(&error),
            "Error: I/O error: Failed to read site.txt\n  Caused by: no such file"
        );
    }

    #[test]
    fn test_error_report_skips_repeated_cause() {
        let error = Error::from(crate::BackendError::Api {
            status: 500,
            message: "boom".to_string(),
        });
        assert_eq!(error_report(&error), "Error: Backend error (500): boom");

        let error = Error::configuration("window.chunk_size must be greater than 0");
        assert_eq!(
            error_report(&error),
            "Error: Configuration error: window.chunk_size must be greater than 0"
        );
    }
}

