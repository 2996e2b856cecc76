use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::config::{Config, DEFAULT_CONFIG_PATH};
use crate::logging::{LogOutput, DEFAULT_LOG_FILE};

#[derive(Debug, Clone, Parser)]
#[command(name = "hisstock-board")]
#[command(about = "Periodically fetches historical stock and credit data and shows the merged table")]
#[command(version)]
pub struct Cli {
    /// JSON config file; builtin settings are used when it cannot be found
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Run a single refresh cycle and exit
    #[arg(long)]
    pub once: bool,

    /// Do not draw the terminal table, only log and write snapshots
    #[arg(long)]
    pub headless: bool,

    /// Write a CSV snapshot of every rendered dataset into this directory
    #[arg(long, value_name = "DIR")]
    pub csv_dir: Option<PathBuf>,

    /// Override the refresh interval from the config file
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_secs: Option<u64>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    pub verbose: bool,

    /// Log file used while the table is on screen
    #[arg(long, value_name = "PATH", default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,
}

impl Cli {
    /// Apply command-line overrides on top of a loaded config.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(dir) = &self.csv_dir {
            config.render.csv_dir = Some(dir.clone());
        }
        if let Some(secs) = self.interval_secs {
            config.refresh_interval = Duration::from_secs(secs);
        }
    }

    /// Whether this run draws the terminal table. A single cycle would vanish with the
    /// alternate screen, so `--once` never does.
    pub fn draws_table(&self) -> bool {
        !(self.headless || self.once)
    }

    /// Logs may only reach the terminal when the table is not drawn on it.
    pub fn log_output(&self) -> LogOutput {
        if self.draws_table() {
            LogOutput::File(self.log_file.clone())
        } else {
            LogOutput::Stderr
        }
    }
}
