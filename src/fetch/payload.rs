use chrono::NaiveDate;
use serde::Deserialize;

use super::decode::{deserialize_date, deserialize_label, deserialize_number};
use super::FetchResult;

/// Body of a `hisstock_list` response.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct HisStockPayload {
    #[serde(default)]
    pub stockitem: Vec<StockSeries>,
    #[serde(default)]
    pub credititem: Vec<CreditSeries>,
}

/// Daily price/volume history for one stock.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StockSeries {
    #[serde(deserialize_with = "deserialize_label")]
    pub stockid: String,
    #[serde(default, deserialize_with = "deserialize_label")]
    pub stocknm: String,
    #[serde(default)]
    pub datalist: Vec<StockObservation>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StockObservation {
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
    #[serde(deserialize_with = "deserialize_number")]
    pub open: f64,
    #[serde(deserialize_with = "deserialize_number")]
    pub high: f64,
    #[serde(deserialize_with = "deserialize_number")]
    pub low: f64,
    #[serde(deserialize_with = "deserialize_number")]
    pub close: f64,
    #[serde(deserialize_with = "deserialize_number")]
    pub volume: f64,
}

/// Daily margin-trading usage ratios for one stock.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CreditSeries {
    #[serde(deserialize_with = "deserialize_label")]
    pub stockid: String,
    #[serde(default, deserialize_with = "deserialize_label")]
    pub stocknm: String,
    #[serde(default)]
    pub datalist: Vec<CreditObservation>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CreditObservation {
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
    #[serde(deserialize_with = "deserialize_number")]
    pub financeused: f64,
    #[serde(deserialize_with = "deserialize_number")]
    pub bearishused: f64,
}

impl StockSeries {
    /// Most recent observation, or `None` when the series is empty.
    pub fn last_observation(&self) -> Option<&StockObservation> {
        self.datalist.last()
    }
}

impl CreditSeries {
    pub fn last_observation(&self) -> Option<&CreditObservation> {
        self.datalist.last()
    }
}

pub fn decode_payload(body: &str) -> FetchResult<HisStockPayload> {
    Ok(serde_json::from_str(body)?)
}
