//! Test utilities for the text parser
//!
//! Shared fixtures for structured and loose exports.

use chrono::{NaiveDate, NaiveDateTime};
use std::io::Write;
use tempfile::NamedTempFile;

mod column_mapping_tests;

/// Header with one column per sensor key, in rule order, plus a few
/// unrelated statistics columns
pub const FULL_HEADER: &str = "Timestamp\tCh1_Anem_80.00m_N_Avg_m/s\tCh1_Anem_80.00m_N_SD_m/s\tCh13_Vane_78.00m_N_Avg_Deg\tCh14_Analog_2.00m_N_Avg_C\tCh16_Analog_2.00m_N_Avg_%RH\tCh17_Analog_2.00m_N_Avg_hPa\tCh4_Total_1.00m_N_Sum_mm\tCh21_Therm_2.00m_N_Avg_C\tCh22_Analog_2.00m_N_Avg_A\tCh23_Analog_2.00m_N_Avg_A\tCh20_Analog_N_Avg_V";

/// Column index of each sensor key in [`FULL_HEADER`], in `SensorKey::ALL` order
pub const FULL_HEADER_INDICES: [usize; 10] = [1, 3, 4, 5, 6, 7, 8, 9, 10, 11];

/// A structured export with a preamble, two data rows and an all-zero row
pub fn create_structured_export() -> String {
    format!(
        "Site Number:\t0042\nSite Description:\tTest Mast\n\n{}\n\
2024-07-29 00:00:00\t5.2\t0.4\t270\t18.5\t65\t1013.2\t0\t22.1\t0.8\t0.9\t12.6\n\
2024-07-29 00:10:00\t6.1\t0.5\t280\t18.2\t66\t1013.0\t0.2\t21.9\t0.7\t0.85\t12.5\n\
2024-07-29 00:20:00\t0\t0\t0\t0\t0\t0\t0\t0\t0\t0\t0\n",
        FULL_HEADER
    )
}

/// A loose TXT export with comments, a header marker and mixed delimiters
pub fn create_loose_export() -> String {
    r#"# exported by logger
Header line
1.5,180,20.1,55,1012
2.5	190	20.3	56	1011

// trailing note
3.5 200 20.5
"#
    .to_string()
}

pub fn parse_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 7, 29)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

/// Helper to create a temporary file with given content
pub fn create_temp_file(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    write!(temp_file, "{}", content).unwrap();
    temp_file
}
