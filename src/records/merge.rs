use std::collections::HashMap;

use crate::fetch::HisStockPayload;

use super::row::{format_row_date, stock_label, Row};

/// Rows produced from one payload plus counts of entries that did not contribute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOutcome {
    pub rows: Vec<Row>,
    /// Stock series with no observations.
    pub skipped_stock: usize,
    /// Credit series with no observations.
    pub skipped_credit: usize,
    /// Credit series whose date and label matched no row.
    pub unmatched_credit: usize,
}

/// Join the latest stock quotes with the latest credit ratios.
///
/// Rows keep the order of `stockitem`. A credit entry updates the first row with
/// the same date and `stockid-stocknm` label and never creates a row of its own.
pub fn merge_payload(payload: &HisStockPayload) -> MergeOutcome {
    let mut outcome = MergeOutcome::default();

    for series in &payload.stockitem {
        let Some(observation) = series.last_observation() else {
            log::warn!(
                "Skipping stock {}-{}: no observations",
                series.stockid,
                series.stocknm
            );
            outcome.skipped_stock += 1;
            continue;
        };
        outcome
            .rows
            .push(Row::from_stock(&series.stockid, &series.stocknm, observation));
    }

    let mut index: HashMap<(String, String), usize> = HashMap::with_capacity(outcome.rows.len());
    for (position, row) in outcome.rows.iter().enumerate() {
        index
            .entry((row.date.clone(), row.stockidnm.clone()))
            .or_insert(position);
    }

    for series in &payload.credititem {
        let Some(observation) = series.last_observation() else {
            log::warn!(
                "Skipping credit {}-{}: no observations",
                series.stockid,
                series.stocknm
            );
            outcome.skipped_credit += 1;
            continue;
        };

        let key = (
            format_row_date(observation.date),
            stock_label(&series.stockid, &series.stocknm),
        );
        match index.get(&key) {
            Some(&position) => outcome.rows[position].apply_credit(observation),
            None => {
                log::debug!("No stock row for credit {} on {}", key.1, key.0);
                outcome.unmatched_credit += 1;
            }
        }
    }

    outcome
}
