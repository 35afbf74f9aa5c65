//! Timestamp formatting for the CLI's log output.

use time::OffsetDateTime;

/// Returns a formatted [`String`] with the current time, local if available, UTC otherwise.
#[must_use]
#[inline]
pub fn current_time() -> String {
    let time = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    format!(
        "{}-{:02}-{:02} {:02}:{:02}:{:02}",
        time.year(),
        time.month() as u8,
        time.day(),
        time.hour(),
        time.minute(),
        time.second()
    )
}
