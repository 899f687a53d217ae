//! Timing for repeated pipeline runs.

use chrono::{Duration as ChronoDuration, NaiveDateTime, NaiveTime};
use std::time::Duration;

/// Parse a wall-clock time of day such as `08:00`.
pub fn parse_time_of_day(raw: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|e| format!("expected HH:MM, got '{}': {}", raw, e))
}

/// Wait from `now` until the next occurrence of `at`. An exact match runs immediately;
/// a time already passed today rolls over to tomorrow.
pub fn delay_until(now: NaiveDateTime, at: NaiveTime) -> Duration {
    let mut next = now.date().and_time(at);
    if next < now {
        next += ChronoDuration::days(1);
    }
    (next - now).to_std().unwrap_or_default()
}
