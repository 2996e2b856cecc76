use std::collections::HashMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CACHE_CONTROL};
use reqwest::Url;

use crate::config::{FetchConfig, QueryConfig};
use crate::error::{AppError, Context};

use super::FetchResult;

/// Date layout the history handler expects in `starttime`/`endtime`.
pub const QUERY_DATE_FORMAT: &str = "%Y/%m/%d";

#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub url: Url,
    pub query: Vec<(&'static str, String)>,
    pub headers: HeaderMap,
}

impl PreparedRequest {
    /// Full URL including the encoded query string, as it will be sent.
    pub fn full_url(&self) -> Url {
        let mut url = self.url.clone();
        url.query_pairs_mut()
            .extend_pairs(self.query.iter().map(|(key, value)| (*key, value.as_str())));
        url
    }
}

pub fn prepare_request(config: &FetchConfig) -> FetchResult<PreparedRequest> {
    let url = Url::parse(&config.endpoint)
        .with_context(|| format!("Invalid endpoint URL: {}", config.endpoint))?;

    let query = query_pairs(&config.query);

    let mut headers = build_headers(&config.headers)?;
    // Responses must never come from an intermediate cache; each cycle wants fresh data.
    headers
        .entry(CACHE_CONTROL)
        .or_insert(HeaderValue::from_static("no-cache"));
    headers
        .entry(ACCEPT)
        .or_insert(HeaderValue::from_static("application/json"));

    Ok(PreparedRequest {
        url,
        query,
        headers,
    })
}

/// Render the query parameters in the order the handler documents them.
pub fn query_pairs(query: &QueryConfig) -> Vec<(&'static str, String)> {
    vec![
        ("opt", query.opt.as_str().to_string()),
        (
            "starttime",
            query.starttime.format(QUERY_DATE_FORMAT).to_string(),
        ),
        ("endtime", query.endtime.format(QUERY_DATE_FORMAT).to_string()),
        ("stockids", query.stockids.join(",")),
        ("traderids", query.traderids.join(",")),
        ("algorithm", query.algorithm.clone()),
    ]
}

/// Replace `${NAME}` placeholders in a header value with environment variables.
pub fn expand_env_vars(value: &str) -> FetchResult<String> {
    let mut expanded = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(open) = rest.find("${") {
        expanded.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];
        let close = after_open.find('}').ok_or_else(|| {
            AppError::message(format!("Unterminated `${{` placeholder in header value `{value}`"))
        })?;
        let name = &after_open[..close];
        if name.is_empty() {
            return Err(AppError::message(format!(
                "Empty `${{}}` placeholder in header value `{value}`"
            )));
        }

        let resolved = std::env::var(name)
            .with_context(|| format!("Header placeholder ${{{name}}} refers to an unset variable"))?;
        expanded.push_str(&resolved);
        rest = &after_open[close + 1..];
    }

    expanded.push_str(rest);
    Ok(expanded)
}

fn build_headers(configured: &HashMap<String, String>) -> FetchResult<HeaderMap> {
    configured
        .iter()
        .map(|(name, raw)| -> FetchResult<(HeaderName, HeaderValue)> {
            let header = HeaderName::from_bytes(name.trim().as_bytes())
                .with_context(|| format!("`{name}` is not a valid header name"))?;
            let value = HeaderValue::from_str(&expand_env_vars(raw)?)
                .with_context(|| format!("header `{name}` has a value that cannot be sent"))?;
            Ok((header, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn builtin_request_matches_dashboard_url() {
        let request = prepare_request(&Config::builtin().fetch).expect("request prepares");
        assert_eq!(
            request.full_url().as_str(),
            "http://127.0.0.1:8000/handler/api/hisstock_list/?opt=twse&starttime=2015%2F05%2F01&endtime=2015%2F06%2F05&stockids=&traderids=&algorithm=StockProfile0%2B"
        );
        assert_eq!(request.headers[CACHE_CONTROL], "no-cache");
    }

    #[test]
    fn joins_id_lists() {
        let mut config = Config::builtin().fetch;
        config.query.stockids = vec!["2330".to_string(), "2317".to_string()];
        config.query.traderids = vec!["1440".to_string()];

        let pairs = query_pairs(&config.query);
        assert!(pairs.contains(&("stockids", "2330,2317".to_string())));
        assert!(pairs.contains(&("traderids", "1440".to_string())));
    }

    #[test]
    fn expands_header_placeholders() {
        std::env::set_var("HISSTOCK_TEST_TOKEN", "abc123");
        let mut config = Config::builtin().fetch;
        config.headers.insert(
            "X-Session".to_string(),
            "token=${HISSTOCK_TEST_TOKEN}".to_string(),
        );

        let request = prepare_request(&config).expect("request prepares");
        assert_eq!(request.headers["x-session"], "token=abc123");
    }

    #[test]
    fn rejects_unterminated_placeholder() {
        assert!(expand_env_vars("Bearer ${TOKEN").is_err());
        assert!(expand_env_vars("Bearer ${}").is_err());
        assert_eq!(expand_env_vars("plain $value").unwrap(), "plain $value");
    }
}
