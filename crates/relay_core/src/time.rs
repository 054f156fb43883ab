use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::Timestamp;

pub const DEFAULT_DISPLAY_TZ: Tz = chrono_tz::Asia::Kolkata;

/// Display pattern, e.g. `Mon, Jan 2 3:04 PM`.
const DISPLAY_PATTERN: &str = "%a, %b %-d %-I:%M %p";

/// Render a publish time in `tz`. Out-of-range timestamps render as the raw
/// number so a post is never dropped over its date.
pub fn format_publish_time(timestamp: Timestamp, tz: Tz) -> String {
    match DateTime::<Utc>::from_timestamp(timestamp, 0) {
        Some(utc) => utc.with_timezone(&tz).format(DISPLAY_PATTERN).to_string(),
        None => timestamp.to_string(),
    }
}
