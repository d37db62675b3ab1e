//! Output module for audience exports and reports
//!
//! This module handles:
//! - Writing segment exports in the ad platform's CSV upload format
//! - Loading and printing audience statistics

mod csv_export;
pub mod stats;

pub use csv_export::{
    export_audience, export_file_name, format_row, write_audience_csv, AudienceExporter,
    ExportError, ExportResult, CSV_COLUMNS, DEFAULT_MIN_EXPORT_SIZE,
};
pub use stats::{format_statistics, load_statistics, print_statistics, AudienceStatistics};
