//! The windowed data access layer
//!
//! The window keeps the full dataset plus the indices of the currently
//! filtered (and possibly sorted) subset. The visible prefix is the first
//! `(cursor + 1) * chunk_size` filtered records.

use parking_lot::RwLock;
use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

use super::sampling::downsample;
use crate::Config;
use crate::app::models::{SensorKey, SensorReading};
use crate::constants::{DEFAULT_CHUNK_SIZE, DEFAULT_MAX_CHART_POINTS};

/// Field a window can be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Timestamp,
    Sensor(SensorKey),
}

impl std::str::FromStr for SortKey {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim() {
            "timestamp" | "time" => Ok(SortKey::Timestamp),
            other => other.parse::<SensorKey>().map(SortKey::Sensor),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Outcome of a chunk load request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkLoad {
    /// A chunk was appended to the visible prefix
    Loaded { visible: usize, has_more: bool },

    /// The visible prefix already covers the filtered set
    Exhausted,

    /// Another load was in progress; this call was ignored
    Busy,
}

/// Point-in-time description of the window state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSnapshot {
    pub total: usize,
    pub filtered: usize,
    pub visible: usize,
    pub chunk_cursor: usize,
    pub search: String,
    pub sort: Option<(SortKey, SortDirection)>,
}

#[derive(Debug, Default)]
struct WindowState {
    dataset: Vec<SensorReading>,
    /// Indices into `dataset`, in display order
    filtered: Vec<usize>,
    chunk_cursor: usize,
    search: String,
    sort: Option<(SortKey, SortDirection)>,
}

impl WindowState {
    fn visible_len(&self, chunk_size: usize) -> usize {
        self.chunk_cursor
            .saturating_add(1)
            .saturating_mul(chunk_size)
            .min(self.filtered.len())
    }

    fn recompute_filter(&mut self) {
        let needle = self.search.to_lowercase();
        self.filtered = self
            .dataset
            .iter()
            .enumerate()
            .filter(|(_, reading)| reading.matches_search(&needle))
            .map(|(index, _)| index)
            .collect();

        if let Some((key, direction)) = self.sort {
            self.sort_filtered(key, direction);
        }
    }

    fn sort_filtered(&mut self, key: SortKey, direction: SortDirection) {
        let dataset = &self.dataset;
        // Ties fall back to input position, whatever order a previous sort left
        self.filtered.sort_by(|a, b| {
            let ordering = compare(&dataset[*a], &dataset[*b], key);
            let ordering = match direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            };
            ordering.then(a.cmp(b))
        });
    }

    fn visible(&self, chunk_size: usize) -> Vec<SensorReading> {
        self.filtered[..self.visible_len(chunk_size)]
            .iter()
            .map(|index| self.dataset[*index].clone())
            .collect()
    }
}

fn compare(a: &SensorReading, b: &SensorReading, key: SortKey) -> CmpOrdering {
    match key {
        SortKey::Timestamp => a.timestamp.cmp(&b.timestamp),
        SortKey::Sensor(sensor) => a.value(sensor).total_cmp(&b.value(sensor)),
    }
}

/// Clears the loading flag when a chunk load finishes
struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owner of the live dataset and its bounded views
#[derive(Debug)]
pub struct DataWindow {
    chunk_size: usize,
    max_chart_points: usize,
    loading: AtomicBool,
    state: RwLock<WindowState>,
}

impl Default for DataWindow {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_MAX_CHART_POINTS)
    }
}

impl DataWindow {
    /// Create an empty window; zero limits are raised to one
    pub fn new(chunk_size: usize, max_chart_points: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            max_chart_points: max_chart_points.max(1),
            loading: AtomicBool::new(false),
            state: RwLock::new(WindowState::default()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.window.chunk_size, config.window.max_chart_points)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn max_chart_points(&self) -> usize {
        self.max_chart_points
    }

    /// Replace the dataset and reset filter, sort and cursor
    ///
    /// The first chunk becomes visible.
    pub fn initialize(&self, dataset: Vec<SensorReading>) {
        let mut state = self.state.write();
        let total = dataset.len();
        *state = WindowState {
            filtered: (0..total).collect(),
            dataset,
            ..WindowState::default()
        };
        debug!(
            "Window initialized with {} records, {} visible",
            total,
            state.visible_len(self.chunk_size)
        );
    }

    /// Drop the dataset
    pub fn clear(&self) {
        self.initialize(Vec::new());
    }

    /// Append the next chunk of the filtered set to the visible prefix
    ///
    /// A call made while another load is running returns [`ChunkLoad::Busy`]
    /// and changes nothing.
    pub fn load_next_chunk(&self) -> ChunkLoad {
        if self
            .loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Chunk load already in progress, ignoring request");
            return ChunkLoad::Busy;
        }
        let _guard = LoadingGuard(&self.loading);

        let mut state = self.state.write();
        if state.visible_len(self.chunk_size) >= state.filtered.len() {
            return ChunkLoad::Exhausted;
        }

        state.chunk_cursor += 1;
        let visible = state.visible_len(self.chunk_size);
        ChunkLoad::Loaded {
            visible,
            has_more: visible < state.filtered.len(),
        }
    }

    /// Whether a chunk load is currently running
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// Filter the full dataset by a case-insensitive substring
    ///
    /// Matches against the string form of every field. An empty term matches
    /// everything. The cursor resets so only the first chunk of matches is
    /// visible; an active sort is reapplied to the new subset.
    pub fn apply_filter(&self, search_term: &str) -> usize {
        let mut state = self.state.write();
        state.search = search_term.trim().to_string();
        state.recompute_filter();
        state.chunk_cursor = 0;

        debug!(
            "Filter '{}' matched {} of {} records",
            state.search,
            state.filtered.len(),
            state.dataset.len()
        );
        state.filtered.len()
    }

    /// Stable-sort the filtered set
    ///
    /// The visible length is kept and re-sliced from the sorted set.
    pub fn apply_sort(&self, key: SortKey, direction: SortDirection) {
        let mut state = self.state.write();
        state.sort = Some((key, direction));
        state.sort_filtered(key, direction);
    }

    /// Visible prefix downsampled to the chart point limit
    pub fn chart_series(&self) -> Vec<SensorReading> {
        let visible = self.visible();
        downsample(&visible, self.max_chart_points)
    }

    /// Clone of the visible prefix
    pub fn visible(&self) -> Vec<SensorReading> {
        self.state.read().visible(self.chunk_size)
    }

    /// Clone of the whole filtered set in display order
    pub fn filtered(&self) -> Vec<SensorReading> {
        let state = self.state.read();
        state
            .filtered
            .iter()
            .map(|index| state.dataset[*index].clone())
            .collect()
    }

    /// Run a closure over the full, unfiltered dataset
    pub fn with_dataset<R>(&self, f: impl FnOnce(&[SensorReading]) -> R) -> R {
        f(&self.state.read().dataset)
    }

    /// Whether any records are loaded
    pub fn has_data(&self) -> bool {
        !self.state.read().dataset.is_empty()
    }

    pub fn len(&self) -> usize {
        self.state.read().dataset.len()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_data()
    }

    pub fn visible_len(&self) -> usize {
        self.state.read().visible_len(self.chunk_size)
    }

    /// Whether more filtered records remain beyond the visible prefix
    pub fn has_more(&self) -> bool {
        let state = self.state.read();
        state.visible_len(self.chunk_size) < state.filtered.len()
    }

    pub fn snapshot(&self) -> WindowSnapshot {
        let state = self.state.read();
        WindowSnapshot {
            total: state.dataset.len(),
            filtered: state.filtered.len(),
            visible: state.visible_len(self.chunk_size),
            chunk_cursor: state.chunk_cursor,
            search: state.search.clone(),
            sort: state.sort,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_while_loading_is_ignored() {
        let window = DataWindow::new(2, 10);
        window.initialize(super::super::tests::create_readings(5));

        window.loading.store(true, Ordering::Release);
        assert_eq!(window.load_next_chunk(), ChunkLoad::Busy);
        assert_eq!(window.visible_len(), 2);

        window.loading.store(false, Ordering::Release);
        assert_eq!(
            window.load_next_chunk(),
            ChunkLoad::Loaded {
                visible: 4,
                has_more: true
            }
        );
        assert!(!window.is_loading());
    }
}
