//! Response timestamps in India Standard Time.

use chrono::{DateTime, FixedOffset, Utc};

/// UTC+05:30.
const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// Format like `2024-07-28 22:30:10.103368+05:30`.
pub fn format_ist(at: DateTime<Utc>) -> String {
    match FixedOffset::east_opt(IST_OFFSET_SECS) {
        Some(ist) => at
            .with_timezone(&ist)
            .format("%Y-%m-%d %H:%M:%S%.6f%:z")
            .to_string(),
        None => at.to_rfc3339(),
    }
}

pub fn now_ist() -> String {
    format_ist(Utc::now())
}
