use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::{AppError, Context, Result};
use crate::utils::parse_calendar_date;

use super::{Config, MarketOpt};

/// Candidate locations for `path`: as given, next to the executable, then under the working directory.
pub fn resolve_config_path(path: &Path) -> Option<PathBuf> {
    let mut search_paths = vec![path.to_path_buf()];
    if path.is_relative() {
        if let Some(dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            search_paths.push(dir.join(path));
        }
        if let Ok(cwd) = std::env::current_dir() {
            search_paths.push(cwd.join(path));
        }
    }

    search_paths.into_iter().find(|candidate| candidate.is_file())
}

/// Read a JSON config file and merge it over the builtin defaults.
///
/// The result is not validated; callers validate once any overrides are applied.
pub fn load_config(path: &Path) -> Result<Config> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read config JSON at {}", path.display()))?;

    parse_config(&json).map_err(|err| match err {
        AppError::Json(inner) => AppError::config(format!(
            "failed to parse config JSON at {}: {inner}",
            path.display()
        )),
        other => other,
    })
}

/// Load the config at `path` when one can be found, falling back to the builtin settings.
pub fn load_or_builtin(path: &Path) -> Result<(Config, Option<PathBuf>)> {
    match resolve_config_path(path) {
        Some(found) => {
            let config = load_config(&found)?;
            log::info!("Loaded configuration from {}", found.display());
            Ok((config, Some(found)))
        }
        None => {
            log::info!(
                "No config file at {}; using builtin settings",
                path.display()
            );
            Ok((Config::builtin(), None))
        }
    }
}

/// Parse a config document. Absent fields keep their builtin values.
pub fn parse_config(json: &str) -> Result<Config> {
    let raw: RawConfig = serde_json::from_str(json)?;
    raw.apply(Config::builtin())
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    endpoint: Option<String>,
    #[serde(default)]
    query: RawQuery,
    headers: Option<HashMap<String, String>>,
    refresh_interval_secs: Option<u64>,
    request_timeout_secs: Option<u64>,
    #[serde(default)]
    render: RawRender,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawQuery {
    opt: Option<String>,
    starttime: Option<String>,
    endtime: Option<String>,
    stockids: Option<RawIdList>,
    traderids: Option<RawIdList>,
    algorithm: Option<String>,
}

/// Id lists may be written as a JSON array or as the comma-joined query form.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawIdList {
    List(Vec<String>),
    Joined(String),
}

impl RawIdList {
    fn into_ids(self) -> Vec<String> {
        let ids: Vec<String> = match self {
            RawIdList::List(ids) => ids,
            RawIdList::Joined(joined) => joined.split(',').map(str::to_string).collect(),
        };
        ids.into_iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect()
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawRender {
    table_id: Option<String>,
    csv_dir: Option<PathBuf>,
}

impl RawConfig {
    fn apply(self, mut config: Config) -> Result<Config> {
        if let Some(endpoint) = self.endpoint {
            config.fetch.endpoint = endpoint.trim().to_string();
        }
        if let Some(headers) = self.headers {
            config.fetch.headers = headers;
        }
        if let Some(secs) = self.refresh_interval_secs {
            config.refresh_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = self.request_timeout_secs {
            config.fetch.timeout = Duration::from_secs(secs);
        }

        let query = &mut config.fetch.query;
        if let Some(opt) = self.query.opt {
            query.opt = MarketOpt::parse(&opt)?;
        }
        if let Some(start) = self.query.starttime {
            query.starttime = parse_query_date("query.starttime", &start)?;
        }
        if let Some(end) = self.query.endtime {
            query.endtime = parse_query_date("query.endtime", &end)?;
        }
        if let Some(ids) = self.query.stockids {
            query.stockids = ids.into_ids();
        }
        if let Some(ids) = self.query.traderids {
            query.traderids = ids.into_ids();
        }
        if let Some(algorithm) = self.query.algorithm {
            query.algorithm = algorithm;
        }

        if let Some(table_id) = self.render.table_id {
            config.render.table_id = table_id.trim().to_string();
        }
        config.render.csv_dir = self.render.csv_dir;

        Ok(config)
    }
}

fn parse_query_date(field: &str, value: &str) -> Result<NaiveDate> {
    parse_calendar_date(value).ok_or_else(|| {
        AppError::config(format!(
            "{field} must be a date like 2015/05/01, found `{value}`"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_builtin() {
        let config = parse_config("{}").expect("empty config parses");
        assert_eq!(config, Config::builtin());
    }

    #[test]
    fn overrides_selected_fields() {
        let config = parse_config(
            r#"{
                "endpoint": "http://stocks.internal:9000/handler/api/hisstock_list/",
                "query": {
                    "opt": "otc",
                    "starttime": "2015-05-01",
                    "endtime": "20150605",
                    "stockids": "2330, 2317,,",
                    "traderids": ["1440"]
                },
                "refresh_interval_secs": 60,
                "render": { "csv_dir": "out" }
            }"#,
        )
        .expect("config parses");

        assert_eq!(
            config.fetch.endpoint,
            "http://stocks.internal:9000/handler/api/hisstock_list/"
        );
        assert_eq!(config.fetch.query.opt, MarketOpt::Otc);
        assert_eq!(config.fetch.query.stockids, vec!["2330", "2317"]);
        assert_eq!(config.fetch.query.traderids, vec!["1440"]);
        assert_eq!(config.fetch.query.algorithm, "StockProfile0+");
        assert_eq!(
            config.fetch.query.endtime,
            NaiveDate::from_ymd_opt(2015, 6, 5).unwrap()
        );
        assert_eq!(config.refresh_interval, Duration::from_secs(60));
        assert_eq!(config.render.csv_dir, Some(PathBuf::from("out")));
        assert_eq!(config.render.table_id, "stockdetail_table");
    }

    #[test]
    fn rejects_bad_dates_and_unknown_keys() {
        let err = parse_config(r#"{ "query": { "starttime": "soon" } }"#).unwrap_err();
        assert!(err.to_string().contains("query.starttime"), "{err}");

        assert!(parse_config(r#"{ "refresh": 10 }"#).is_err());
    }

    #[test]
    fn parsing_leaves_range_checks_to_validation() {
        let config = parse_config(r#"{ "refresh_interval_secs": 0 }"#).expect("document parses");
        assert_eq!(config.refresh_interval, Duration::ZERO);
        assert!(crate::config::validate_config(&config).is_err());
    }

    #[test]
    fn loads_shipped_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(super::super::DEFAULT_CONFIG_PATH);
        let config = load_config(&path).expect("shipped config loads");
        assert_eq!(config, Config::builtin());
    }

    #[test]
    fn missing_file_falls_back_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let (config, found) =
            load_or_builtin(&dir.path().join("absent.json")).expect("fallback succeeds");
        assert!(found.is_none());
        assert_eq!(config, Config::builtin());
    }
}
