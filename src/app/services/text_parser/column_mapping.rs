//! Column mapping for structured exports
//!
//! Header tokens follow the `Ch<N>_<Type>_<height>_<Stat>_<Unit>` convention.
//! Each sensor key is resolved by the ordered rule table in
//! [`COLUMN_RULES`](crate::constants::COLUMN_RULES).

use crate::app::models::SensorKey;
use crate::constants::{COLUMN_RULES, ColumnRule, SENSOR_COUNT};

/// Sensor key to column index mapping for one header row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    /// Column index per sensor key, in [`SensorKey::ALL`] order
    indices: [Option<usize>; SENSOR_COUNT],

    /// Number of tab-delimited tokens in the header
    header_width: usize,
}

impl ColumnMapping {
    /// Analyze a tab-delimited header line using the default rule table
    pub fn analyze(header_line: &str) -> Self {
        Self::analyze_with_rules(header_line, &COLUMN_RULES)
    }

    /// Analyze a header line with an explicit rule table
    ///
    /// For each rule the first header token containing both the channel and
    /// the statistic tag wins. Keys without a matching token stay absent.
    pub fn analyze_with_rules(header_line: &str, rules: &[ColumnRule]) -> Self {
        let headers: Vec<&str> = header_line.split('\t').map(str::trim).collect();
        let mut indices = [None; SENSOR_COUNT];

        for rule in rules {
            let slot = &mut indices[rule.key.index()];
            if slot.is_some() {
                continue;
            }
            *slot = headers
                .iter()
                .position(|h| h.contains(rule.channel) && h.contains(rule.statistic));
        }

        Self {
            indices,
            header_width: headers.len(),
        }
    }

    /// Get the column index for a sensor key, `None` when absent
    pub fn get_index(&self, key: SensorKey) -> Option<usize> {
        self.indices[key.index()]
    }

    /// Number of columns in the header row
    pub fn header_width(&self) -> usize {
        self.header_width
    }

    /// Number of sensor keys resolved to a column
    pub fn mapped_count(&self) -> usize {
        self.indices.iter().filter(|i| i.is_some()).count()
    }

    /// Sensor keys that could not be resolved
    pub fn missing_keys(&self) -> Vec<SensorKey> {
        SensorKey::ALL
            .into_iter()
            .filter(|key| self.get_index(*key).is_none())
            .collect()
    }
}
