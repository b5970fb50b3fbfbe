//! Tests for header column mapping

use super::*;
use crate::app::models::SensorKey;
use crate::app::services::text_parser::ColumnMapping;
use crate::constants::ColumnRule;

#[test]
fn test_full_header_maps_every_sensor() {
    let mapping = ColumnMapping::analyze(FULL_HEADER);

    assert_eq!(mapping.header_width(), 12);
    assert_eq!(mapping.mapped_count(), 10);
    for (key, expected) in SensorKey::ALL.iter().zip(FULL_HEADER_INDICES) {
        assert_eq!(mapping.get_index(*key), Some(expected), "{:?}", key);
    }
    assert!(mapping.missing_keys().is_empty());
}

#[test]
fn test_statistic_tag_must_match() {
    // SD column listed before the average must not be picked
    let mapping = ColumnMapping::analyze("Timestamp\tCh1_Anem_80m_SD_m/s\tCh1_Anem_80m_Avg_m/s");
    assert_eq!(mapping.get_index(SensorKey::WindSpeed), Some(2));
}

#[test]
fn test_first_match_wins() {
    let mapping =
        ColumnMapping::analyze("Timestamp\tCh1_Anem_80m_Avg_m/s\tCh1_Anem_60m_Avg_m/s");
    assert_eq!(mapping.get_index(SensorKey::WindSpeed), Some(1));
}

#[test]
fn test_unmatched_keys_are_absent() {
    let mapping = ColumnMapping::analyze("Timestamp\tCh1_Anem_0.00m_N_Avg_m/s");

    assert_eq!(mapping.mapped_count(), 1);
    assert_eq!(mapping.get_index(SensorKey::Temperature), None);
    assert_eq!(mapping.missing_keys().len(), 9);
}

#[test]
fn test_custom_rule_table() {
    let rules = [ColumnRule {
        key: SensorKey::Battery,
        channel: "Batt",
        statistic: "Min",
    }];
    let mapping = ColumnMapping::analyze_with_rules("Timestamp\tBatt_Avg\tBatt_Min", &rules);

    assert_eq!(mapping.get_index(SensorKey::Battery), Some(2));
    assert_eq!(mapping.mapped_count(), 1);
}
