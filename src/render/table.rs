use std::io::Stdout;

use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::Constraint,
    style::{Modifier, Style},
    widgets::{Block, Borders, Cell, Row as TableRow, Table},
    Terminal,
};

use crate::error::Result;
use crate::records::Row;
use crate::utils::{current_human_timestamp, display_width};

use super::terminal::AlternateScreen;
use super::RowSink;

const COLUMN_SPACING: u16 = 2;

/// Build the stock detail table widget for `rows`.
pub fn build_row_table<'a>(rows: &[Row], title: impl Into<String>) -> Table<'a> {
    let cells: Vec<[String; 9]> = rows.iter().map(Row::display_cells).collect();
    let widths = column_widths(&cells);

    let header = TableRow::new(Row::HEADERS.iter().map(|label| Cell::from(*label)))
        .style(Style::default().add_modifier(Modifier::BOLD));
    let body = cells.into_iter().map(TableRow::new);

    Table::new(body, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title.into()))
        .column_spacing(COLUMN_SPACING)
}

/// Size each column to its widest cell, header included.
fn column_widths(cells: &[[String; 9]]) -> Vec<Constraint> {
    Row::HEADERS
        .iter()
        .enumerate()
        .map(|(column, header)| {
            let widest = cells
                .iter()
                .map(|row| display_width(&row[column]))
                .chain(std::iter::once(display_width(header)))
                .max()
                .unwrap_or(0);
            Constraint::Length(u16::try_from(widest).unwrap_or(u16::MAX))
        })
        .collect()
}

/// Terminal rendition of the stock detail table. Each render redraws the whole frame.
pub struct TableSink<B: Backend> {
    terminal: Terminal<B>,
    table_id: String,
    screen: Option<AlternateScreen>,
}

impl<B: Backend> TableSink<B> {
    pub fn new(terminal: Terminal<B>, table_id: impl Into<String>) -> Self {
        Self {
            terminal,
            table_id: table_id.into(),
            screen: None,
        }
    }

    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    pub fn terminal_mut(&mut self) -> &mut Terminal<B> {
        &mut self.terminal
    }

    fn title(&self, rows: usize) -> String {
        format!(
            " #{} | {} rows | updated {} ",
            self.table_id,
            rows,
            current_human_timestamp()
        )
    }
}

impl TableSink<CrosstermBackend<Stdout>> {
    /// Draw on stdout's alternate screen until the sink is dropped.
    pub fn stdout(table_id: impl Into<String>) -> Result<Self> {
        let (screen, terminal) = AlternateScreen::enter()?;
        let mut sink = Self::new(terminal, table_id);
        sink.terminal.clear()?;
        sink.screen = Some(screen);
        Ok(sink)
    }
}

impl<B: Backend> RowSink for TableSink<B> {
    fn render(&mut self, rows: &[Row]) -> Result<()> {
        let table = build_row_table(rows, self.title(rows.len()));
        // Full repaint: anything else written to the terminal since the last frame is wiped.
        self.terminal.clear()?;
        self.terminal.draw(|frame| {
            frame.render_widget(table, frame.size());
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::buffer::Cell as BufferCell;

    fn row(label: &str, financeused: f64) -> Row {
        Row {
            date: "20150605".to_string(),
            stockidnm: label.to_string(),
            open: 140.0,
            high: 142.0,
            low: 139.0,
            close: 141.0,
            volume: 12_345_678,
            financeused,
            bearishused: 0.0,
        }
    }

    fn screen_text(sink: &TableSink<TestBackend>) -> String {
        let buffer = sink.terminal().backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content
            .chunks(width)
            .map(|line| line.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn draws_headers_and_rows() {
        let terminal = Terminal::new(TestBackend::new(140, 8)).unwrap();
        let mut sink = TableSink::new(terminal, "stockdetail_table");

        sink.render(&[row("2330-TSMC", 12.34)]).unwrap();
        let text = screen_text(&sink);

        assert!(text.contains("#stockdetail_table | 1 rows"), "{text}");
        assert!(text.contains("financeused"), "{text}");
        assert!(text.contains("2330-TSMC"), "{text}");
        assert!(text.contains("12345678"), "{text}");
        assert!(text.contains("12.34"), "{text}");
    }

    #[test]
    fn later_render_replaces_previous_rows() {
        let terminal = Terminal::new(TestBackend::new(140, 8)).unwrap();
        let mut sink = TableSink::new(terminal, "stockdetail_table");

        sink.render(&[row("2330-TSMC", 0.0)]).unwrap();
        sink.render(&[row("2317-HonHai", 0.0)]).unwrap();
        let text = screen_text(&sink);

        assert!(text.contains("2317-HonHai"), "{text}");
        assert!(!text.contains("2330-TSMC"), "{text}");
    }

    #[test]
    fn render_wipes_foreign_output() {
        let terminal = Terminal::new(TestBackend::new(140, 8)).unwrap();
        let mut sink = TableSink::new(terminal, "stockdetail_table");
        sink.render(&[row("2330-TSMC", 0.0)]).unwrap();

        let mut stray = BufferCell::default();
        stray.set_symbol("~");
        sink.terminal_mut()
            .backend_mut()
            .draw(std::iter::once((120, 5, &stray)))
            .unwrap();
        assert!(screen_text(&sink).contains('~'));

        sink.render(&[row("2330-TSMC", 0.0)]).unwrap();
        let text = screen_text(&sink);
        assert!(!text.contains('~'), "{text}");
        assert!(text.contains("2330-TSMC"), "{text}");
    }

    #[test]
    fn widths_follow_widest_cell() {
        let cells = vec![row("2330-台積電", 0.0).display_cells()];
        let widths = column_widths(&cells);
        assert_eq!(widths[0], Constraint::Length(8));
        assert_eq!(widths[1], Constraint::Length(11));
        assert_eq!(widths[7], Constraint::Length("financeused".len() as u16));
    }
}
