//! Per-sensor statistics over a dataset
//!
//! A sensor with no qualifying values reports [`SensorStatistics::NotApplicable`]
//! instead of zero or NaN so "no data" stays distinguishable from "zero".

use serde::Serialize;
use std::collections::BTreeMap;

use crate::app::models::{SensorKey, SensorReading};

/// Aggregates for one sensor field
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    pub average: f64,
    pub minimum: f64,
    pub maximum: f64,
    /// Upper median for even counts
    pub median: f64,
    /// Last qualifying value in dataset order
    pub latest: f64,
    pub reading_count: usize,
}

impl SummaryStats {
    /// Classify a value by its position inside the observed range
    ///
    /// A degenerate range (all values equal) classifies as moderate.
    pub fn level(&self, value: f64) -> SensorLevel {
        let range = self.maximum - self.minimum;
        if range <= 0.0 || !range.is_finite() {
            return SensorLevel::Moderate;
        }

        let position = (value - self.minimum) / range;
        if position <= 0.25 {
            SensorLevel::Low
        } else if position <= 0.75 {
            SensorLevel::Moderate
        } else {
            SensorLevel::High
        }
    }
}

/// Statistics result for one sensor
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SensorStatistics {
    Available(SummaryStats),
    NotApplicable,
}

impl SensorStatistics {
    pub fn available(&self) -> Option<&SummaryStats> {
        match self {
            SensorStatistics::Available(stats) => Some(stats),
            SensorStatistics::NotApplicable => None,
        }
    }

    pub fn is_applicable(&self) -> bool {
        matches!(self, SensorStatistics::Available(_))
    }
}

/// Position of a value inside a sensor's observed range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SensorLevel {
    Low,
    Moderate,
    High,
}

impl std::fmt::Display for SensorLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SensorLevel::Low => "LOW",
            SensorLevel::Moderate => "MODERATE",
            SensorLevel::High => "HIGH",
        };
        f.write_str(name)
    }
}

/// Statistics for every sensor field of a dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetStatistics {
    sensors: BTreeMap<SensorKey, SensorStatistics>,
}

impl DatasetStatistics {
    /// Compute statistics for every sensor key
    pub fn compute(readings: &[SensorReading]) -> Self {
        let sensors = SensorKey::ALL
            .into_iter()
            .map(|key| (key, compute_sensor(readings, key)))
            .collect();
        Self { sensors }
    }

    pub fn get(&self, key: SensorKey) -> SensorStatistics {
        self.sensors
            .get(&key)
            .copied()
            .unwrap_or(SensorStatistics::NotApplicable)
    }

    /// Iterate in [`SensorKey`] order
    pub fn iter(&self) -> impl Iterator<Item = (SensorKey, SensorStatistics)> + '_ {
        self.sensors.iter().map(|(key, stats)| (*key, *stats))
    }
}

/// Compute statistics for one sensor over finite values
pub fn compute_sensor(readings: &[SensorReading], key: SensorKey) -> SensorStatistics {
    let values: Vec<f64> = readings
        .iter()
        .map(|reading| reading.value(key))
        .filter(|value| value.is_finite())
        .collect();

    let Some(&latest) = values.last() else {
        return SensorStatistics::NotApplicable;
    };

    let mut sorted = values.clone();
    sorted.sort_by(f64::total_cmp);

    let sum: f64 = values.iter().sum();
    SensorStatistics::Available(SummaryStats {
        average: sum / values.len() as f64,
        minimum: sorted[0],
        maximum: sorted[sorted.len() - 1],
        median: sorted[sorted.len() / 2],
        latest,
        reading_count: values.len(),
    })
}

// =============================================================================
// Wind Rose
// =============================================================================

/// Eight 45° compass sectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CompassSector {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl CompassSector {
    pub const ALL: [CompassSector; 8] = [
        CompassSector::N,
        CompassSector::NE,
        CompassSector::E,
        CompassSector::SE,
        CompassSector::S,
        CompassSector::SW,
        CompassSector::W,
        CompassSector::NW,
    ];

    /// Sector containing a direction in degrees
    ///
    /// North covers `[337.5, 360)` and `[0, 22.5)`; values outside 0..360 are
    /// taken as-is, so anything below 22.5 or at/above 337.5 is north.
    pub fn from_degrees(direction: f64) -> Self {
        if !(22.5..337.5).contains(&direction) {
            return CompassSector::N;
        }
        let index = ((direction - 22.5) / 45.0).floor() as usize + 1;
        CompassSector::ALL[index.min(7)]
    }

    /// Inclusive lower and exclusive upper bound in degrees
    pub fn range(self) -> (f64, f64) {
        match self {
            CompassSector::N => (337.5, 22.5),
            other => {
                let start = 22.5 + 45.0 * (other as usize - 1) as f64;
                (start, start + 45.0)
            }
        }
    }
}

impl std::fmt::Display for CompassSector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// One wind rose sector
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindRoseBin {
    pub sector: CompassSector,
    pub count: usize,
    /// Share of all direction readings, 0 when there are none
    pub percentage: f64,
}

/// Bin wind direction readings into the eight compass sectors
pub fn wind_rose(readings: &[SensorReading]) -> Vec<WindRoseBin> {
    let mut counts = [0usize; 8];
    let mut total = 0usize;

    for reading in readings {
        let direction = reading.wind_direction;
        if !direction.is_finite() {
            continue;
        }
        counts[CompassSector::from_degrees(direction) as usize] += 1;
        total += 1;
    }

    CompassSector::ALL
        .into_iter()
        .zip(counts)
        .map(|(sector, count)| WindRoseBin {
            sector,
            count,
            percentage: if total == 0 {
                0.0
            } else {
                count as f64 / total as f64 * 100.0
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SENSOR_COUNT;
    use chrono::NaiveDate;

    fn readings_with(key: SensorKey, values: &[f64]) -> Vec<SensorReading> {
        let timestamp = NaiveDate::from_ymd_opt(2024, 7, 29)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        values
            .iter()
            .map(|v| {
                let mut row = [0.0; SENSOR_COUNT];
                row[key.index()] = *v;
                SensorReading::from_values(timestamp, "%H:%M:%S", row)
            })
            .collect()
    }

    #[test]
    fn test_basic_aggregates() {
        let readings = readings_with(SensorKey::Temperature, &[18.0, 22.0, 20.0, 16.0]);
        let stats = compute_sensor(&readings, SensorKey::Temperature);
        let stats = stats.available().unwrap();

        assert_eq!(stats.average, 19.0);
        assert_eq!(stats.minimum, 16.0);
        assert_eq!(stats.maximum, 22.0);
        assert_eq!(stats.median, 20.0);
        assert_eq!(stats.latest, 16.0);
        assert_eq!(stats.reading_count, 4);
    }

    #[test]
    fn test_empty_dataset_is_not_applicable() {
        let stats = DatasetStatistics::compute(&[]);
        for (_, sensor) in stats.iter() {
            assert_eq!(sensor, SensorStatistics::NotApplicable);
        }
    }

    #[test]
    fn test_zero_values_are_counted() {
        // Zero is a value, not a missing reading
        let readings = readings_with(SensorKey::WindSpeed, &[3.0, 1.0]);
        let stats = DatasetStatistics::compute(&readings);
        let rain = stats.get(SensorKey::Rainfall);

        assert_eq!(rain.available().unwrap().maximum, 0.0);
        assert_eq!(rain.available().unwrap().reading_count, 2);
    }

    #[test]
    fn test_non_finite_values_are_ignored() {
        let mut readings = readings_with(SensorKey::Humidity, &[50.0, 60.0]);
        readings[1].humidity = f64::NAN;
        let stats = compute_sensor(&readings, SensorKey::Humidity);

        assert_eq!(stats.available().unwrap().reading_count, 1);
        assert_eq!(stats.available().unwrap().latest, 50.0);
    }

    #[test]
    fn test_level_classification() {
        let readings = readings_with(SensorKey::Pressure, &[1000.0, 1040.0]);
        let stats = compute_sensor(&readings, SensorKey::Pressure);
        let stats = stats.available().unwrap();

        assert_eq!(stats.level(1010.0), SensorLevel::Low);
        assert_eq!(stats.level(1020.0), SensorLevel::Moderate);
        assert_eq!(stats.level(1030.0), SensorLevel::Moderate);
        assert_eq!(stats.level(1031.0), SensorLevel::High);
    }

    #[test]
    fn test_level_with_flat_range() {
        let readings = readings_with(SensorKey::Battery, &[12.6, 12.6]);
        let stats = compute_sensor(&readings, SensorKey::Battery);
        assert_eq!(
            stats.available().unwrap().level(12.6),
            SensorLevel::Moderate
        );
    }

    #[test]
    fn test_compass_sectors() {
        assert_eq!(CompassSector::from_degrees(0.0), CompassSector::N);
        assert_eq!(CompassSector::from_degrees(22.4), CompassSector::N);
        assert_eq!(CompassSector::from_degrees(22.5), CompassSector::NE);
        assert_eq!(CompassSector::from_degrees(90.0), CompassSector::E);
        assert_eq!(CompassSector::from_degrees(180.0), CompassSector::S);
        assert_eq!(CompassSector::from_degrees(337.4), CompassSector::NW);
        assert_eq!(CompassSector::from_degrees(337.5), CompassSector::N);
        assert_eq!(CompassSector::from_degrees(360.0), CompassSector::N);
        assert_eq!(CompassSector::W.range(), (247.5, 292.5));
    }

    #[test]
    fn test_wind_rose_distribution() {
        let readings = readings_with(SensorKey::WindDirection, &[10.0, 350.0, 95.0, 200.0]);
        let rose = wind_rose(&readings);

        assert_eq!(rose.len(), 8);
        assert_eq!(rose[0].sector, CompassSector::N);
        assert_eq!(rose[0].count, 2);
        assert_eq!(rose[0].percentage, 50.0);
        assert_eq!(rose[2].count, 1);
        assert_eq!(rose[4].count, 1);
        assert_eq!(rose.iter().map(|b| b.count).sum::<usize>(), 4);
    }

    #[test]
    fn test_wind_rose_empty() {
        let rose = wind_rose(&[]);
        assert!(rose.iter().all(|b| b.count == 0 && b.percentage == 0.0));
    }
}
