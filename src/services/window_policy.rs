//! Rolling visibility window for entries (§4.6).

use chrono::{Duration, Local};

const WINDOW_DAYS: i64 = 7;

/// Inclusive lower bound on entry dates for read paths: `today_local - 7
/// days`. Writes are never filtered by this; only reads. Deliberately the
/// device's local calendar day, not the Clock's UTC timestamp: a client
/// near a day boundary expects "the last week" to match its own calendar,
/// not the server's.
pub fn entry_lower_bound() -> String {
    let cutoff = Local::now().date_naive() - Duration::days(WINDOW_DAYS);
    cutoff.format("%Y-%m-%d").to_string()
}
