use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Context, Result};
use crate::records::Row;
use crate::utils::{next_available_path, snapshot_timestamp_slug};

use super::RowSink;

/// Writes every dataset to its own timestamped CSV file under one directory.
pub struct CsvSnapshotSink {
    dir: PathBuf,
    last_written: Option<PathBuf>,
}

impl CsvSnapshotSink {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).with_context(|| {
            format!("Failed to create snapshot directory {}", dir.display())
        })?;
        Ok(Self {
            dir,
            last_written: None,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn last_written(&self) -> Option<&Path> {
        self.last_written.as_deref()
    }
}

impl RowSink for CsvSnapshotSink {
    fn render(&mut self, rows: &[Row]) -> Result<()> {
        let stem = format!("{}_hisstock", snapshot_timestamp_slug());
        let path = next_available_path(&self.dir, &stem, "csv");
        write_rows_csv(&path, rows)?;
        log::info!("Saved {} rows to {}", rows.len(), path.display());
        self.last_written = Some(path);
        Ok(())
    }
}

/// Persist rows with a header line, even when the dataset is empty.
pub fn write_rows_csv(path: &Path, rows: &[Row]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to create CSV file {}", path.display()))?;

    writer.write_record(Row::HEADERS)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
