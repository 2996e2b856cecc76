use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use env_logger::{Builder, Env, Target};

use crate::error::{AppError, Context, Result};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Log file used while the table owns the terminal.
pub const DEFAULT_LOG_FILE: &str = "logs/hisstock-board.log";

/// Where log records are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOutput {
    Stderr,
    /// Appended to this file, so nothing is printed over the table.
    File(PathBuf),
}

/// Install the global logger.
pub fn init_logging(verbose: bool, output: &LogOutput) -> Result<()> {
    let default_filter = if verbose { "debug" } else { DEFAULT_LOG_FILTER };
    let mut builder = Builder::from_env(Env::default().default_filter_or(default_filter));
    builder.format_timestamp_secs();

    match output {
        LogOutput::Stderr => {
            builder.target(Target::Stderr);
        }
        LogOutput::File(path) => {
            builder.target(Target::Pipe(Box::new(open_log_file(path)?)));
        }
    }

    builder
        .try_init()
        .map_err(|err| AppError::message(format!("failed to initialise logging: {err}")))
}

/// Open `path` for appending, creating missing parent directories.
pub fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create log directory {}", parent.display()))?;
    }
    Ok(OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?)
}
