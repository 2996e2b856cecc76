use std::time::Duration;

use reqwest::Url;

use crate::error::{AppError, Result};

use super::{Config, FetchConfig, QueryConfig, RenderConfig};

const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Validate a merged configuration and surface every problem at once.
pub fn validate_config(config: &Config) -> Result<()> {
    let mut issues = Vec::new();

    validate_fetch(&config.fetch, &mut issues);
    validate_render(&config.render, &mut issues);

    if config.refresh_interval < MIN_INTERVAL {
        issues.push("refresh_interval_secs must be at least 1".to_string());
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(AppError::config(format!(
            "\n  - {}",
            issues.join("\n  - ")
        )))
    }
}

fn validate_fetch(fetch: &FetchConfig, issues: &mut Vec<String>) {
    match Url::parse(&fetch.endpoint) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            if url.query().is_some() {
                issues.push(
                    "endpoint must not carry a query string; use the `query` section".to_string(),
                );
            }
        }
        Ok(url) => issues.push(format!(
            "endpoint scheme `{}` is not supported, use http or https",
            url.scheme()
        )),
        Err(err) => issues.push(format!("endpoint `{}` is not a URL: {err}", fetch.endpoint)),
    }

    if fetch.timeout < MIN_INTERVAL {
        issues.push("request_timeout_secs must be at least 1".to_string());
    }

    for name in fetch.headers.keys() {
        if name.trim().is_empty() {
            issues.push("headers must not contain an empty name".to_string());
        }
    }

    validate_query(&fetch.query, issues);
}

fn validate_query(query: &QueryConfig, issues: &mut Vec<String>) {
    if query.starttime > query.endtime {
        issues.push(format!(
            "query.starttime {} is after query.endtime {}",
            query.starttime, query.endtime
        ));
    }

    for (field, ids) in [("stockids", &query.stockids), ("traderids", &query.traderids)] {
        if ids.iter().any(|id| id.trim().is_empty() || id.contains(',')) {
            issues.push(format!(
                "query.{field} entries must be non-empty and must not contain commas"
            ));
        }
    }
}

fn validate_render(render: &RenderConfig, issues: &mut Vec<String>) {
    if render.table_id.trim().is_empty() {
        issues.push("render.table_id must not be empty".to_string());
    }
}
