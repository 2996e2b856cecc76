use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;

use crate::error::{AppError, Result};

pub mod loader;
pub mod validator;
pub mod watcher;

pub use loader::{load_config, load_or_builtin, parse_config, resolve_config_path};
pub use validator::validate_config;
pub use watcher::ConfigWatcher;

pub const DEFAULT_CONFIG_PATH: &str = "assets/configs/hisstock.json";
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/handler/api/hisstock_list/";
pub const DEFAULT_ALGORITHM: &str = "StockProfile0+";
pub const DEFAULT_TABLE_ID: &str = "stockdetail_table";
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Market the history handler should read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarketOpt {
    #[default]
    Twse,
    Otc,
}

impl MarketOpt {
    pub fn as_str(self) -> &'static str {
        match self {
            MarketOpt::Twse => "twse",
            MarketOpt::Otc => "otc",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "twse" => Ok(MarketOpt::Twse),
            "otc" => Ok(MarketOpt::Otc),
            other => Err(AppError::config(format!(
                "query.opt must be `twse` or `otc`, found `{other}`"
            ))),
        }
    }
}

impl fmt::Display for MarketOpt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Query string sent with every `hisstock_list` request.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryConfig {
    pub opt: MarketOpt,
    pub starttime: NaiveDate,
    pub endtime: NaiveDate,
    pub stockids: Vec<String>,
    pub traderids: Vec<String>,
    pub algorithm: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    pub endpoint: String,
    pub query: QueryConfig,
    pub headers: HashMap<String, String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub table_id: String,
    pub csv_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub fetch: FetchConfig,
    pub refresh_interval: Duration,
    pub render: RenderConfig,
}

impl Config {
    /// Settings matching the dashboard's stock profile page.
    pub fn builtin() -> Self {
        Config {
            fetch: FetchConfig {
                endpoint: DEFAULT_ENDPOINT.to_string(),
                query: QueryConfig {
                    opt: MarketOpt::Twse,
                    starttime: builtin_date(2015, 5, 1),
                    endtime: builtin_date(2015, 6, 5),
                    stockids: Vec::new(),
                    traderids: Vec::new(),
                    algorithm: DEFAULT_ALGORITHM.to_string(),
                },
                headers: HashMap::new(),
                timeout: DEFAULT_REQUEST_TIMEOUT,
            },
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            render: RenderConfig {
                table_id: DEFAULT_TABLE_ID.to_string(),
                csv_dir: None,
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::builtin()
    }
}

fn builtin_date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}
