use crate::error::Result;
use crate::records::Row;

pub mod csv_snapshot;
pub mod log_sink;
pub mod memory;
pub mod table;
pub mod terminal;

pub use csv_snapshot::CsvSnapshotSink;
pub use log_sink::LogSink;
pub use memory::MemorySink;
pub use table::{build_row_table, TableSink};
pub use terminal::AlternateScreen;

/// Destination for the merged table.
///
/// Every call hands over the complete dataset for the current cycle; a sink must
/// replace whatever it showed before instead of appending to it.
pub trait RowSink {
    fn render(&mut self, rows: &[Row]) -> Result<()>;
}

impl<T: RowSink + ?Sized> RowSink for Box<T> {
    fn render(&mut self, rows: &[Row]) -> Result<()> {
        (**self).render(rows)
    }
}

/// Forwards each dataset to several sinks.
///
/// A failing sink does not stop the remaining ones; the first error is returned
/// after all sinks have been given the rows.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Box<dyn RowSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl RowSink + 'static) -> Self {
        self.push(sink);
        self
    }

    pub fn push(&mut self, sink: impl RowSink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl RowSink for FanoutSink {
    fn render(&mut self, rows: &[Row]) -> Result<()> {
        let mut first_error = None;
        for sink in &mut self.sinks {
            if let Err(err) = sink.render(rows) {
                log::error!("Sink failed to render {} rows: {}", rows.len(), err);
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
