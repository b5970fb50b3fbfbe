//! Dashboard session: the explicit context object tying the services together
//!
//! A session owns the live [`DataWindow`], the persisted library index and
//! unit settings, and an optional backend client. Multi-file batches run
//! sequentially in input order; one failing file never aborts its siblings.

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::app::models::{LibraryEntry, SensorKey, SensorUnitConfig};
use crate::app::services::backend_client::{BackendClient, BackendStatus, spawn_health_probe};
use crate::app::services::data_window::DataWindow;
use crate::app::services::export::{self, ExportFormat, ReportRow};
use crate::app::services::statistics::{DatasetStatistics, WindRoseBin, wind_rose};
use crate::app::services::storage::{JsonFileStore, KeyValueStore, LibraryIndex, UnitSettings};
use crate::app::services::text_parser::{FormatKind, ParseResult, ParseStats, TextFileParser};
use crate::app::services::unifier::UnifiedDataset;
use crate::constants::{ACCEPTED_EXTENSIONS, BINARY_EXTENSION};
use crate::{Config, Error, Result};

// =============================================================================
// Batch Types
// =============================================================================

/// One file handed to a batch
#[derive(Debug, Clone)]
pub enum FileInput {
    /// Read from disk when the batch reaches it
    Path(PathBuf),

    /// Already in memory (uploads, tests)
    Bytes { name: String, contents: Vec<u8> },
}

impl FileInput {
    pub fn bytes(name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        FileInput::Bytes {
            name: name.into(),
            contents: contents.into(),
        }
    }

    /// File name without directories
    pub fn name(&self) -> String {
        match self {
            FileInput::Path(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            FileInput::Bytes { name, .. } => name.clone(),
        }
    }

    fn extension(&self) -> Option<String> {
        Path::new(&self.name())
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
    }

    async fn read(self) -> Result<Vec<u8>> {
        match self {
            FileInput::Path(path) => tokio::fs::read(&path)
                .await
                .map_err(|e| Error::io(format!("Failed to read file {}", path.display()), e)),
            FileInput::Bytes { contents, .. } => Ok(contents),
        }
    }
}

impl From<PathBuf> for FileInput {
    fn from(path: PathBuf) -> Self {
        FileInput::Path(path)
    }
}

/// Result of one file in a batch
#[derive(Debug, Clone)]
pub enum FileOutcome {
    Processed {
        file_name: String,
        format: FormatKind,
        records: usize,
        stats: ParseStats,
    },
    Failed {
        file_name: String,
        error: String,
    },
}

impl FileOutcome {
    pub fn file_name(&self) -> &str {
        match self {
            FileOutcome::Processed { file_name, .. } | FileOutcome::Failed { file_name, .. } => {
                file_name
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FileOutcome::Processed { .. })
    }
}

/// Summary of a whole batch
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// Per-file outcomes in input order
    pub outcomes: Vec<FileOutcome>,

    /// Records in the unified dataset
    pub total_records: usize,

    /// Library entry created or updated for the batch
    pub library_entry_id: Option<String>,

    /// Combined human-readable status line
    pub message: String,
}

impl BatchReport {
    fn new(outcomes: Vec<FileOutcome>, total_records: usize, library_entry_id: Option<String>) -> Self {
        let message = status_message(&outcomes);
        Self {
            outcomes,
            total_records,
            library_entry_id,
            message,
        }
    }

    pub fn processed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.processed_count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed_count() > 0
    }
}

fn status_message(outcomes: &[FileOutcome]) -> String {
    let processed = outcomes.iter().filter(|o| o.is_success()).count();
    let failures: Vec<String> = outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            FileOutcome::Failed { file_name, error } => Some(format!("{}: {}", file_name, error)),
            FileOutcome::Processed { .. } => None,
        })
        .collect();

    let mut message = format!("Processed {} files successfully", processed);
    if !failures.is_empty() {
        message.push_str(&format!(
            ". {} files failed: {}",
            failures.len(),
            failures.join(", ")
        ));
    }
    message
}

/// Clears the processing flag when a batch ends
struct ProcessingGuard<'a>(&'a AtomicBool);

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// =============================================================================
// Session
// =============================================================================

/// Caller-owned dashboard state
#[derive(Debug)]
pub struct DashboardSession {
    window: DataWindow,
    library: Mutex<LibraryIndex>,
    units: RwLock<UnitSettings>,
    backend: Option<BackendClient>,
    health_check_interval: Duration,
    parser: TextFileParser,
    max_files_per_batch: usize,
    is_processing: AtomicBool,
}

impl DashboardSession {
    /// Open a session backed by JSON files in the configured data directory
    ///
    /// A backend URL that cannot be turned into a client is logged and the
    /// session runs local-only.
    pub fn open(config: &Config) -> Result<Self> {
        let store: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::new(&config.storage.data_dir));
        let backend = match BackendClient::from_config(config) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("Backend disabled: {}", e);
                None
            }
        };
        Self::new(config, store, backend)
    }

    /// Create a session over an explicit store and backend
    pub fn new(
        config: &Config,
        store: Arc<dyn KeyValueStore>,
        backend: Option<BackendClient>,
    ) -> Result<Self> {
        let library = LibraryIndex::load(store.clone(), Utc::now())?;
        let units = UnitSettings::load(store)?;

        Ok(Self {
            window: DataWindow::from_config(config),
            library: Mutex::new(library),
            units: RwLock::new(units),
            backend,
            health_check_interval: config.backend.health_check_interval(),
            parser: TextFileParser::from_config(config),
            max_files_per_batch: config.processing.max_files_per_batch.max(1),
            is_processing: AtomicBool::new(false),
        })
    }

    pub fn window(&self) -> &DataWindow {
        &self.window
    }

    pub fn backend(&self) -> Option<&BackendClient> {
        self.backend.as_ref()
    }

    /// Start re-probing backend health on the configured interval
    ///
    /// Returns `None` when the session runs without a backend. Dropping the
    /// receiver stops the probe after its next tick.
    pub fn watch_backend(&self) -> Option<(watch::Receiver<BackendStatus>, JoinHandle<()>)> {
        let client = self.backend.clone()?;
        debug!(
            "Probing backend health every {}s",
            self.health_check_interval.as_secs()
        );
        Some(spawn_health_probe(client, self.health_check_interval))
    }

    /// Whether a batch is currently running
    pub fn is_processing(&self) -> bool {
        self.is_processing.load(Ordering::Acquire)
    }

    /// Process a batch of files; see [`Self::process_files_with_progress`]
    pub async fn process_files(&self, inputs: Vec<FileInput>) -> Result<BatchReport> {
        self.process_files_with_progress(inputs, |_| {}).await
    }

    /// Process a batch of files sequentially, reporting each outcome
    ///
    /// Inputs beyond the per-batch limit are dropped with a warning. The
    /// live dataset and the library are only touched when at least one
    /// file succeeded.
    pub async fn process_files_with_progress<F>(
        &self,
        mut inputs: Vec<FileInput>,
        mut on_file: F,
    ) -> Result<BatchReport>
    where
        F: FnMut(&FileOutcome),
    {
        if self
            .is_processing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::BatchInProgress);
        }
        let _guard = ProcessingGuard(&self.is_processing);

        if inputs.len() > self.max_files_per_batch {
            warn!(
                "Batch of {} files exceeds the limit of {}, ignoring the rest",
                inputs.len(),
                self.max_files_per_batch
            );
            inputs.truncate(self.max_files_per_batch);
        }

        info!("Processing batch of {} files", inputs.len());
        let mut outcomes = Vec::with_capacity(inputs.len());
        let mut results = Vec::new();

        for input in inputs {
            let file_name = input.name();
            let outcome = match self.process_one(input).await {
                Ok(result) => {
                    let outcome = FileOutcome::Processed {
                        file_name: file_name.clone(),
                        format: result.format,
                        records: result.readings.len(),
                        stats: result.stats.clone(),
                    };
                    results.push(result);
                    outcome
                }
                Err(e) => {
                    error!("Failed to process {}: {}", file_name, e);
                    FileOutcome::Failed {
                        file_name,
                        error: e.to_string(),
                    }
                }
            };
            on_file(&outcome);
            outcomes.push(outcome);
        }

        if results.is_empty() {
            return Ok(BatchReport::new(outcomes, 0, None));
        }

        let unified = UnifiedDataset::from_results(results);
        let entry = unified.to_library_entry(Utc::now());
        let total_records = unified.readings.len();
        self.window.initialize(unified.readings);
        let entry_id = self.library.lock().add(entry)?;

        let report = BatchReport::new(outcomes, total_records, Some(entry_id));
        info!("{}", report.message);
        Ok(report)
    }

    async fn process_one(&self, input: FileInput) -> Result<ParseResult> {
        let file_name = input.name();
        let extension = input.extension().unwrap_or_default();
        if !ACCEPTED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(Error::unsupported_file(file_name));
        }

        let bytes = input.read().await?;
        let (parse_name, content) = if extension == BINARY_EXTENSION {
            let backend = self.backend.as_ref().ok_or_else(|| {
                Error::configuration(format!(
                    "No backend configured to convert binary file '{}'",
                    file_name
                ))
            })?;
            debug!("Converting {} through the backend", file_name);
            let text = backend.convert_binary_to_text(&file_name, bytes).await?;
            let stem = Path::new(&file_name)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| file_name.clone());
            (format!("{}.txt", stem), text)
        } else {
            (file_name, String::from_utf8_lossy(&bytes).into_owned())
        };

        let result = self.parser.parse_content(&content, &parse_name);
        if !result.has_data() {
            return Err(Error::no_valid_data(parse_name));
        }
        Ok(result)
    }

    // =========================================================================
    // Library
    // =========================================================================

    /// Snapshot of all library entries
    pub fn library_entries(&self) -> Vec<LibraryEntry> {
        self.library.lock().entries().to_vec()
    }

    /// Run a closure with mutable access to the library index
    pub fn with_library<R>(&self, f: impl FnOnce(&mut LibraryIndex) -> R) -> R {
        f(&mut self.library.lock())
    }

    /// Replace the live dataset with a library entry's records
    ///
    /// Entries without a stored payload are loaded from the backend's current
    /// data. Returns the number of records loaded.
    pub async fn load_library_entry(&self, id: &str) -> Result<usize> {
        let entry = self
            .library
            .lock()
            .get(id)
            .cloned()
            .ok_or_else(|| Error::library_entry_not_found(id))?;

        let readings = match entry.data {
            Some(data) if !data.is_empty() => data,
            _ => {
                let backend = self.backend.as_ref().ok_or_else(|| {
                    Error::configuration(format!(
                        "Library entry '{}' has no stored data and no backend is configured",
                        entry.name
                    ))
                })?;
                info!("Loading {} from backend", entry.name);
                backend.fetch_current_data().await?
            }
        };

        let count = readings.len();
        self.window.initialize(readings);
        info!("Loaded {} records from library entry {}", count, entry.name);
        Ok(count)
    }

    /// Merge the backend's file list into the library
    ///
    /// An unavailable backend leaves the library local-only; returns the
    /// number of backend files seen.
    pub async fn refresh_library_from_backend(&self) -> Result<usize> {
        let Some(backend) = self.backend.as_ref() else {
            debug!("No backend configured, library stays local");
            return Ok(0);
        };

        let files = match backend.list_files().await {
            Ok(files) => files,
            Err(e) => {
                warn!("Backend unavailable, using local library only: {}", e);
                return Ok(0);
            }
        };

        self.library.lock().merge_backend_files(&files, Utc::now())?;
        info!("Merged {} backend files into library", files.len());
        Ok(files.len())
    }

    // =========================================================================
    // Units, Statistics, Export
    // =========================================================================

    pub fn units(&self) -> SensorUnitConfig {
        self.units.read().units().clone()
    }

    pub fn set_unit(&self, key: SensorKey, unit: &str) -> Result<()> {
        self.units.write().set_unit(key, unit)
    }

    pub fn reset_units(&self) -> Result<()> {
        self.units.write().reset_to_defaults()
    }

    /// Statistics over the full live dataset
    pub fn statistics(&self) -> DatasetStatistics {
        self.window.with_dataset(DatasetStatistics::compute)
    }

    pub fn wind_rose(&self) -> Vec<WindRoseBin> {
        self.window.with_dataset(wind_rose)
    }

    /// Report rows with the current units
    pub fn report(&self) -> Vec<ReportRow> {
        export::report_rows(&self.statistics(), self.units.read().units())
    }

    /// Export the filtered set in display order
    pub fn export<W: std::io::Write>(&self, writer: W, format: ExportFormat) -> Result<usize> {
        let readings = self.window.filtered();
        export::write_dataset(writer, &readings, format)?;
        Ok(readings.len())
    }
}
