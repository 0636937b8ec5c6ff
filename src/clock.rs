//! Canonical, non-decreasing UTC clock.

use chrono::Utc;
use std::sync::Mutex;

/// 19-character-base ISO-8601 timestamp with a literal trailing `Z`
/// (`YYYY-MM-DDTHH:MM:SSZ`), no fractional seconds. Callers compare these
/// strings directly, so the format must never change shape.
pub fn format_timestamp(dt: chrono::DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Produces non-decreasing canonical timestamps within one process.
///
/// If system time moves backward between calls, the previously issued
/// value is returned instead of a smaller one.
pub struct Clock {
    last: Mutex<String>,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            last: Mutex::new(format_timestamp(Utc::now())),
        }
    }

    /// Returns the current canonical timestamp, never smaller than the
    /// last value this clock returned.
    pub fn now(&self) -> String {
        let candidate = format_timestamp(Utc::now());
        let mut last = self.last.lock().unwrap();
        if candidate.as_str() > last.as_str() {
            *last = candidate.clone();
            candidate
        } else {
            last.clone()
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
