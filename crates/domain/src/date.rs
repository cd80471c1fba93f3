use chrono::prelude::*;
use chrono_tz::Tz;

/// Formats a timestamp in millis the way it is shown to users in mails,
/// e.g. "Monday, 12 February 2024 at 14:30 (Europe/Oslo)"
pub fn format_datetime(ts_millis: i64, tz: &Tz) -> String {
    let utc: DateTime<Utc> = Utc
        .timestamp_millis_opt(ts_millis)
        .earliest()
        .unwrap_or_default();
    let local = utc.with_timezone(tz);
    format!("{} ({})", local.format("%A, %-d %B %Y at %H:%M"), tz.name())
}
