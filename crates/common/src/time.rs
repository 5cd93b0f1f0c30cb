use chrono::{DateTime, Utc};

/// Timestamp layout used in relay headers and audit lines.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a UTC instant as `YYYY-MM-DD HH:MM:SS`.
pub fn format_utc(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}
