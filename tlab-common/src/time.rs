//! Timestamp utilities

use chrono::{DateTime, Local, Utc};

/// Format of the `created_at` cell in label spreadsheets
pub const SHEET_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current local time formatted for a spreadsheet cell
pub fn sheet_timestamp() -> String {
    Local::now().format(SHEET_TIMESTAMP_FORMAT).to_string()
}
