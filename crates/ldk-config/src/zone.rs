use chrono::{DateTime, Local, NaiveDateTime, Utc};
use chrono_tz::Tz;

/// Wall clock the shop lives in. Trigger times, weekdays and export file
/// dates are all read off this clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocalZone {
    /// Operating-system local time.
    System,
    Named(Tz),
}

impl LocalZone {
    /// `"local"` (or empty) selects the system zone; anything else must be an
    /// IANA name. Unknown names fall back to the system zone.
    pub fn parse(raw: &str) -> Self {
        let t = raw.trim();
        if t.is_empty() || t.eq_ignore_ascii_case("local") {
            return LocalZone::System;
        }
        match t.parse::<Tz>() {
            Ok(tz) => LocalZone::Named(tz),
            Err(_) => {
                tracing::warn!(timezone = t, "unknown timezone in settings; using system local time");
                LocalZone::System
            }
        }
    }

    pub fn wall_clock(&self, now: DateTime<Utc>) -> NaiveDateTime {
        match self {
            LocalZone::System => now.with_timezone(&Local).naive_local(),
            LocalZone::Named(tz) => now.with_timezone(tz).naive_local(),
        }
    }
}
