pub mod file;
pub mod text;
pub mod time;

pub use file::next_available_path;
pub use text::{display_width, truncate_for_log};
pub use time::{current_human_timestamp, parse_calendar_date, snapshot_timestamp_slug};
