//! Tests for chunk loading, filtering, sorting and chart series

use super::*;
use crate::app::models::SensorKey;
use crate::app::services::data_window::{ChunkLoad, DataWindow, SortDirection, SortKey};

#[test]
fn test_initialize_shows_first_chunk() {
    let window = DataWindow::new(500, 1000);
    window.initialize(create_readings(1200));

    assert!(window.has_data());
    assert_eq!(window.len(), 1200);
    assert_eq!(window.visible_len(), 500);
    assert!(window.has_more());
    assert_eq!(window.visible()[499].wind_speed, 499.0);
}

#[test]
fn test_empty_window() {
    let window = DataWindow::default();

    assert!(!window.has_data());
    assert!(window.visible().is_empty());
    assert!(window.chart_series().is_empty());
    assert_eq!(window.load_next_chunk(), ChunkLoad::Exhausted);
}

#[test]
fn test_chunk_loading_is_monotonic_prefix() {
    let window = DataWindow::new(500, 1000);
    let readings = create_readings(1200);
    window.initialize(readings.clone());

    let mut previous = window.visible_len();
    loop {
        match window.load_next_chunk() {
            ChunkLoad::Loaded { visible, has_more } => {
                assert!(visible > previous);
                assert_eq!(has_more, visible < 1200);
                previous = visible;
                assert_eq!(window.visible(), readings[..visible].to_vec());
            }
            ChunkLoad::Exhausted => break,
            ChunkLoad::Busy => panic!("no concurrent loads in this test"),
        }
    }

    assert_eq!(previous, 1200);
    assert_eq!(window.load_next_chunk(), ChunkLoad::Exhausted);
    assert_eq!(window.visible_len(), 1200);
}

#[test]
fn test_concurrent_loads_never_double_load() {
    let window = DataWindow::new(10, 1000);
    window.initialize(create_readings(1000));

    let outcomes: Vec<ChunkLoad> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| (0..20).map(|_| window.load_next_chunk()).collect::<Vec<_>>()))
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    });

    let loaded = outcomes
        .iter()
        .filter(|o| matches!(o, ChunkLoad::Loaded { .. }))
        .count();
    assert_eq!(window.visible_len(), ((loaded + 1) * 10).min(1000));
    assert_eq!(window.snapshot().chunk_cursor, loaded);
    assert!(!window.is_loading());
}

#[test]
fn test_filter_searches_full_dataset() {
    let window = DataWindow::new(5, 1000);
    window.initialize(create_readings(100));

    // Record 77 is outside the visible prefix but must be found
    let matches = window.apply_filter("77");
    assert_eq!(matches, 1);
    assert_eq!(window.visible()[0].wind_speed, 77.0);
}

#[test]
fn test_filter_matches_timestamp_and_time() {
    let window = DataWindow::new(500, 1000);
    window.initialize(create_readings(100));

    assert_eq!(window.apply_filter("00:59:00"), 1);
    assert_eq!(window.apply_filter("2024-07-29T01:"), 40);
    assert_eq!(window.apply_filter("NOTHING"), 0);
    assert!(window.visible().is_empty());
}

#[test]
fn test_filter_resets_cursor_and_is_idempotent() {
    let window = DataWindow::new(5, 1000);
    window.initialize(create_readings(100));
    window.load_next_chunk();
    window.load_next_chunk();
    assert_eq!(window.visible_len(), 15);

    window.apply_filter("10.5");
    let first = window.visible();
    assert_eq!(window.snapshot().chunk_cursor, 0);
    assert_eq!(first.len(), 5);

    window.apply_filter("10.5");
    assert_eq!(window.visible(), first);
    assert_eq!(window.filtered().len(), 20);
}

#[test]
fn test_empty_filter_restores_everything() {
    let window = DataWindow::new(5, 1000);
    window.initialize(create_readings(30));

    window.apply_filter("12.5");
    assert_eq!(window.filtered().len(), 6);
    assert_eq!(window.apply_filter(""), 30);
}

#[test]
fn test_sort_is_stable() {
    let window = DataWindow::new(500, 1000);
    window.initialize(create_readings(20));

    window.apply_sort(SortKey::Sensor(SensorKey::Temperature), SortDirection::Ascending);
    let sorted = window.visible();
    let temps: Vec<f64> = sorted.iter().map(|r| r.temperature).collect();
    assert!(temps.windows(2).all(|w| w[0] <= w[1]));

    // Ties keep input order: speeds within the first group are 0, 5, 10, 15
    let first_group: Vec<f64> = sorted[..4].iter().map(|r| r.wind_speed).collect();
    assert_eq!(first_group, vec![0.0, 5.0, 10.0, 15.0]);

    window.apply_sort(SortKey::Sensor(SensorKey::Temperature), SortDirection::Descending);
    let sorted = window.visible();
    assert_eq!(sorted[0].temperature, 14.5);
    let first_group: Vec<f64> = sorted[..4].iter().map(|r| r.wind_speed).collect();
    assert_eq!(first_group, vec![4.0, 9.0, 14.0, 19.0]);
}

#[test]
fn test_sort_ties_ignore_previous_sort() {
    let mut readings = create_readings(3);
    // (wind speed, temperature): a = (1, 2), b = (2, 1), c = (1, 1)
    for (reading, (speed, temp)) in readings.iter_mut().zip([(1.0, 2.0), (2.0, 1.0), (1.0, 1.0)]) {
        reading.wind_speed = speed;
        reading.temperature = temp;
    }

    let window = DataWindow::new(500, 1000);
    window.initialize(readings.clone());
    window.apply_sort(SortKey::Sensor(SensorKey::Temperature), SortDirection::Ascending);
    window.apply_sort(SortKey::Sensor(SensorKey::WindSpeed), SortDirection::Ascending);
    let after_two_sorts = window.visible();

    assert_eq!(
        after_two_sorts,
        vec![readings[0].clone(), readings[2].clone(), readings[1].clone()]
    );

    window.apply_filter("");
    assert_eq!(window.visible(), after_two_sorts);

    window.apply_sort(SortKey::Sensor(SensorKey::WindSpeed), SortDirection::Descending);
    assert_eq!(
        window.visible(),
        vec![readings[1].clone(), readings[0].clone(), readings[2].clone()]
    );
}

#[test]
fn test_sort_keeps_visible_length_and_survives_filter() {
    let window = DataWindow::new(5, 1000);
    window.initialize(create_readings(50));
    window.load_next_chunk();

    window.apply_sort(SortKey::Timestamp, SortDirection::Descending);
    assert_eq!(window.visible_len(), 10);
    assert_eq!(window.visible()[0].wind_speed, 49.0);

    window.apply_filter("10.5");
    let visible = window.visible();
    assert_eq!(visible.len(), 5);
    assert_eq!(visible[0].wind_speed, 45.0);
}

#[test]
fn test_chart_series_is_bounded() {
    let window = DataWindow::new(5000, 1000);
    window.initialize(create_readings(4500));

    let series = window.chart_series();
    assert!(series.len() <= 1000);
    // stride = ceil(4500 / 1000) = 5
    assert_eq!(series[1].wind_speed, 5.0);
    assert_eq!(series, window.chart_series());
}

#[test]
fn test_chart_series_small_dataset_unchanged() {
    let window = DataWindow::default();
    window.initialize(create_readings(300));
    assert_eq!(window.chart_series(), window.visible());
}

#[test]
fn test_sort_key_from_str() {
    assert_eq!("timestamp".parse::<SortKey>().unwrap(), SortKey::Timestamp);
    assert_eq!(
        "NRG_T60_Temp".parse::<SortKey>().unwrap(),
        SortKey::Sensor(SensorKey::Temperature)
    );
    assert!("nope".parse::<SortKey>().is_err());
}
