use chrono::NaiveDate;
use serde::Serialize;

use crate::fetch::{CreditObservation, StockObservation};

/// Date layout of [`Row::date`].
pub const ROW_DATE_FORMAT: &str = "%Y%m%d";

/// One line of the stock detail table: the latest quote of a stock joined with
/// its margin-trading usage for the same day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub date: String,
    pub stockidnm: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    pub financeused: f64,
    pub bearishused: f64,
}

impl Row {
    pub const HEADERS: [&'static str; 9] = [
        "date",
        "stockidnm",
        "open",
        "high",
        "low",
        "close",
        "volume",
        "financeused",
        "bearishused",
    ];

    /// Build a row from a stock's latest observation with credit fields zeroed.
    pub fn from_stock(stockid: &str, stocknm: &str, observation: &StockObservation) -> Self {
        Self {
            date: format_row_date(observation.date),
            stockidnm: stock_label(stockid, stocknm),
            open: round2(observation.open),
            high: round2(observation.high),
            low: round2(observation.low),
            close: round2(observation.close),
            volume: round_volume(observation.volume),
            financeused: 0.0,
            bearishused: 0.0,
        }
    }

    pub fn apply_credit(&mut self, observation: &CreditObservation) {
        self.financeused = round2(observation.financeused);
        self.bearishused = round2(observation.bearishused);
    }

    /// Cells in [`Row::HEADERS`] order, formatted for display.
    pub fn display_cells(&self) -> [String; 9] {
        [
            self.date.clone(),
            self.stockidnm.clone(),
            format!("{:.2}", self.open),
            format!("{:.2}", self.high),
            format!("{:.2}", self.low),
            format!("{:.2}", self.close),
            self.volume.to_string(),
            format!("{:.2}", self.financeused),
            format!("{:.2}", self.bearishused),
        ]
    }
}

/// Round the exact binary value to two decimals, ties away from zero.
///
/// `0.015` is stored as `0.01499..` and therefore rounds down, matching how the
/// dashboard formatted these figures.
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let magnitude = value.abs();
    // Multiples of 1/8 are the only values that can sit exactly on a tie; scaling them is exact.
    let rounded = if (magnitude * 8.0).fract() == 0.0 {
        (magnitude * 100.0).round() / 100.0
    } else {
        format!("{magnitude:.2}").parse::<f64>().unwrap_or(magnitude)
    };
    rounded.copysign(value)
}

fn round_volume(volume: f64) -> i64 {
    volume.round() as i64
}

pub fn format_row_date(date: NaiveDate) -> String {
    date.format(ROW_DATE_FORMAT).to_string()
}

/// Combined identifier shown in the table, e.g. `2330-TSMC`.
pub fn stock_label(stockid: &str, stocknm: &str) -> String {
    format!("{stockid}-{stocknm}")
}
