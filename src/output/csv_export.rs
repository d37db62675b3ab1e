//! Advertising audience CSV export
//!
//! The ad platform's audience upload expects a fixed seven-column layout:
//! `phone,email,ok,vk,vid,gaid,idfa`. Only the `vk` column is filled; every
//! other column is an empty string. Rows are `\n` terminated UTF-8.

use crate::audience::{AccountId, Segment};
use crate::storage::{AudienceStore, StorageError};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Column order of the upload format
pub const CSV_COLUMNS: [&str; 7] = ["phone", "email", "ok", "vk", "vid", "gaid", "idfa"];

/// Smallest audience the ad platform accepts
pub const DEFAULT_MIN_EXPORT_SIZE: usize = 100;

/// Errors that can occur while exporting an audience
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Segment '{segment}' has {count} accounts, at least {min_size} are required")]
    MinimumSize {
        segment: Segment,
        count: usize,
        min_size: usize,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;

/// Writes segment exports into one directory
#[derive(Debug, Clone)]
pub struct AudienceExporter {
    out_dir: PathBuf,
    min_size: usize,
}

impl AudienceExporter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            min_size: DEFAULT_MIN_EXPORT_SIZE,
        }
    }

    pub fn with_min_size(mut self, min_size: usize) -> Self {
        self.min_size = min_size;
        self
    }

    /// Path the given segment is exported to
    pub fn path_for(&self, segment: Segment) -> PathBuf {
        self.out_dir.join(export_file_name(segment))
    }

    /// Exports a segment to CSV
    ///
    /// The segment size is checked before any file is opened, so a refused
    /// export leaves the file system untouched. Rows are written to a
    /// temporary file that is renamed into place only once complete.
    ///
    /// # Returns
    ///
    /// * `Ok(PathBuf)` - Path of the written file
    /// * `Err(ExportError::MinimumSize)` - Segment is too small
    pub fn export(&self, store: &dyn AudienceStore, segment: Segment) -> ExportResult<PathBuf> {
        let ids = store.export_segment(segment)?;

        if ids.len() < self.min_size {
            tracing::warn!(
                "Refusing to export segment {}: {} accounts, minimum is {}",
                segment,
                ids.len(),
                self.min_size
            );
            return Err(ExportError::MinimumSize {
                segment,
                count: ids.len(),
                min_size: self.min_size,
            });
        }

        fs::create_dir_all(&self.out_dir)?;
        let path = self.path_for(segment);
        let partial = path.with_extension("csv.partial");

        let written = File::create(&partial)
            .and_then(|file| write_audience_csv(BufWriter::new(file), &ids))
            .and_then(|_| fs::rename(&partial, &path));

        if let Err(e) = written {
            let _ = fs::remove_file(&partial);
            return Err(e.into());
        }

        tracing::info!(
            "Exported {} accounts of segment {} to {}",
            ids.len(),
            segment,
            path.display()
        );
        Ok(path)
    }
}

/// File name used for a segment export
pub fn export_file_name(segment: Segment) -> String {
    format!("vk_audience_{}.csv", segment.file_stem())
}

/// Formats one data row: the id in the `vk` column, all else empty
pub fn format_row(id: AccountId) -> String {
    CSV_COLUMNS
        .iter()
        .map(|column| {
            if *column == "vk" {
                id.to_string()
            } else {
                String::new()
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Writes the header and one row per id
pub fn write_audience_csv<W: Write>(mut writer: W, ids: &[AccountId]) -> io::Result<()> {
    writer.write_all(CSV_COLUMNS.join(",").as_bytes())?;
    writer.write_all(b"\n")?;

    for id in ids {
        writer.write_all(format_row(*id).as_bytes())?;
        writer.write_all(b"\n")?;
    }

    writer.flush()
}

/// Exports a segment from the store into `out_dir`
pub fn export_audience(
    store: &dyn AudienceStore,
    segment: Segment,
    min_size: usize,
    out_dir: &Path,
) -> ExportResult<PathBuf> {
    AudienceExporter::new(out_dir)
        .with_min_size(min_size)
        .export(store, segment)
}
