use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::Result;
use crate::records::Row;

use super::RowSink;

#[derive(Debug, Default)]
struct Shown {
    rows: Vec<Row>,
    renders: usize,
}

/// Keeps the most recent dataset in memory. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    shown: Arc<Mutex<Shown>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows from the latest render call.
    pub fn rows(&self) -> Vec<Row> {
        self.lock().rows.clone()
    }

    pub fn render_count(&self) -> usize {
        self.lock().renders
    }

    fn lock(&self) -> MutexGuard<'_, Shown> {
        self.shown
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RowSink for MemorySink {
    fn render(&mut self, rows: &[Row]) -> Result<()> {
        let mut shown = self.lock();
        shown.rows = rows.to_vec();
        shown.renders += 1;
        Ok(())
    }
}
