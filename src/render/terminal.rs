use std::io::{self, Stdout};

use crossterm::{cursor, execute, terminal};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::error::Result;

/// RAII guard that keeps the table on the alternate screen while the process runs.
///
/// Raw mode stays off so Ctrl-C still reaches the process as a signal.
pub struct AlternateScreen {
    restored: bool,
}

impl AlternateScreen {
    /// Enter the alternate screen, hide the cursor, and return a terminal drawing to stdout.
    pub fn enter() -> Result<(Self, Terminal<CrosstermBackend<Stdout>>)> {
        let mut stdout = io::stdout();
        execute!(stdout, terminal::EnterAlternateScreen, cursor::Hide)?;
        let guard = Self { restored: false };
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok((guard, terminal))
    }

    /// Restore the terminal once, regardless of how many times it is called.
    pub fn restore(&mut self) -> Result<()> {
        if !self.restored {
            execute!(io::stdout(), cursor::Show, terminal::LeaveAlternateScreen)?;
            self.restored = true;
        }
        Ok(())
    }
}

impl Drop for AlternateScreen {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}
