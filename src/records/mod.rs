pub mod merge;
pub mod row;

pub use merge::{merge_payload, MergeOutcome};
pub use row::{format_row_date, round2, stock_label, Row};
