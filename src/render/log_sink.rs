use log::{debug, info};

use crate::error::Result;
use crate::records::Row;

use super::RowSink;

/// Headless sink: one summary line per dataset, one debug line per row.
pub struct LogSink {
    table_id: String,
}

impl LogSink {
    pub fn new(table_id: impl Into<String>) -> Self {
        Self {
            table_id: table_id.into(),
        }
    }
}

impl RowSink for LogSink {
    fn render(&mut self, rows: &[Row]) -> Result<()> {
        let with_credit = rows
            .iter()
            .filter(|row| row.financeused != 0.0 || row.bearishused != 0.0)
            .count();
        info!(
            "#{}: {} rows ({} with credit data)",
            self.table_id,
            rows.len(),
            with_credit
        );
        for row in rows {
            debug!("#{} {}", self.table_id, row.display_cells().join(" | "));
        }
        Ok(())
    }
}
