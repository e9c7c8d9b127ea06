use chrono::{DateTime, Datelike, Duration, NaiveDateTime, Utc};
use ldk_schemas::{ReminderRow, ValidationError};

use crate::{ChannelSchedule, ChannelVerdict, IdleReason};

/// Exact-minute match of the wall clock against the configured time, plus
/// the weekday gate when the channel has one.
pub fn trigger_matches(schedule: &ChannelSchedule, wall: NaiveDateTime) -> bool {
    if wall.format("%H:%M").to_string() != schedule.trigger_time.trim() {
        return false;
    }
    match &schedule.weekdays {
        None => true,
        Some(days) => {
            let wd = wall.weekday().num_days_from_monday() as u8;
            days.contains(&wd)
        }
    }
}

/// The instant a persisted marker suppresses reminders until, if it is
/// still in the future. Unparseable markers are ignored.
pub fn active_snooze(raw: Option<&str>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let text = raw?.trim();
    if text.is_empty() {
        return None;
    }
    match DateTime::parse_from_rfc3339(text) {
        Ok(t) => {
            let until = t.with_timezone(&Utc);
            (now < until).then_some(until)
        }
        Err(err) => {
            tracing::warn!(marker = text, %err, "malformed snooze marker ignored");
            None
        }
    }
}

/// Orders whose NOT_ORDERED status is at least this old qualify.
pub fn mkl_cutoff(now: DateTime<Utc>, staleness_days: i64) -> DateTime<Utc> {
    Duration::try_days(staleness_days)
        .and_then(|d| now.checked_sub_signed(d))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

pub fn is_stale(changed_at: DateTime<Utc>, now: DateTime<Utc>, staleness_days: i64) -> bool {
    changed_at <= mkl_cutoff(now, staleness_days)
}

/// Narrow NOT_ORDERED candidates to those the channel reminds about.
pub fn qualifying_rows(
    schedule: &ChannelSchedule,
    candidates: Vec<ReminderRow>,
    now: DateTime<Utc>,
) -> Vec<ReminderRow> {
    match schedule.staleness_days {
        None => candidates,
        Some(days) => candidates
            .into_iter()
            .filter(|r| is_stale(r.status_changed_at, now, days))
            .collect(),
    }
}

/// Evaluate one channel at one tick.
///
/// `candidates` are the channel's NOT_ORDERED orders; `snooze_raw` is the
/// persisted marker text. Calling this again at the same minute with the
/// same inputs yields the same verdict.
pub fn evaluate_channel(
    schedule: &ChannelSchedule,
    now: DateTime<Utc>,
    wall: NaiveDateTime,
    snooze_raw: Option<&str>,
    candidates: Vec<ReminderRow>,
) -> ChannelVerdict {
    if !schedule.enabled {
        return ChannelVerdict::Idle(IdleReason::Disabled);
    }
    if !trigger_matches(schedule, wall) {
        return ChannelVerdict::Idle(IdleReason::NotTriggerMinute);
    }
    if let Some(until) = active_snooze(snooze_raw, now) {
        return ChannelVerdict::Snoozed { until };
    }
    let rows = qualifying_rows(schedule, candidates, now);
    if rows.is_empty() {
        return ChannelVerdict::Idle(IdleReason::NoQualifyingOrders);
    }
    ChannelVerdict::Due(rows)
}

/// `now + minutes`, rejecting non-positive or unrepresentable durations.
pub fn snooze_until(now: DateTime<Utc>, minutes: i64) -> Result<DateTime<Utc>, ValidationError> {
    if minutes <= 0 {
        return Err(ValidationError::NonPositiveSnooze { minutes });
    }
    Duration::try_minutes(minutes)
        .and_then(|d| now.checked_add_signed(d))
        .ok_or(ValidationError::SnoozeOutOfRange { minutes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use ldk_schemas::ReminderChannel;

    fn wall(y: i32, m: u32, d: u32, hh: u32, mm: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(hh, mm, 0)
            .unwrap()
    }

    fn meridian(days: Vec<u8>) -> ChannelSchedule {
        ChannelSchedule {
            channel: ReminderChannel::Meridian,
            enabled: true,
            trigger_time: "10:30".into(),
            weekdays: Some(days),
            staleness_days: None,
        }
    }

    #[test]
    fn trigger_needs_exact_minute_and_weekday() {
        // 2025-06-02 is a Monday.
        let s = meridian(vec![0, 2]);
        assert!(trigger_matches(&s, wall(2025, 6, 2, 10, 30)));
        assert!(!trigger_matches(&s, wall(2025, 6, 2, 10, 31)));
        assert!(!trigger_matches(&s, wall(2025, 6, 3, 10, 30)));
        assert!(trigger_matches(&s, wall(2025, 6, 4, 10, 30)));
        // Seconds within the minute do not matter.
        let w = wall(2025, 6, 2, 10, 30) + Duration::seconds(59);
        assert!(trigger_matches(&s, w));
    }

    #[test]
    fn empty_weekday_set_never_fires() {
        assert!(!trigger_matches(&meridian(vec![]), wall(2025, 6, 2, 10, 30)));
    }

    #[test]
    fn snooze_marker_interpretation() {
        let now = Utc.with_ymd_and_hms(2025, 6, 2, 10, 0, 0).unwrap();
        assert_eq!(active_snooze(None, now), None);
        assert_eq!(active_snooze(Some(""), now), None);
        assert_eq!(active_snooze(Some("not a time"), now), None);
        assert_eq!(active_snooze(Some("2025-06-02T09:59:00Z"), now), None);
        // Expiry instant itself is no longer covered.
        assert_eq!(active_snooze(Some("2025-06-02T10:00:00Z"), now), None);
        assert_eq!(
            active_snooze(Some("2025-06-02T13:15:00+03:00"), now),
            Some(Utc.with_ymd_and_hms(2025, 6, 2, 10, 15, 0).unwrap())
        );
    }

    #[test]
    fn staleness_boundary_is_inclusive() {
        let now = Utc.with_ymd_and_hms(2025, 6, 10, 9, 0, 0).unwrap();
        assert!(is_stale(now - Duration::days(3), now, 3));
        assert!(!is_stale(now - Duration::days(3) + Duration::seconds(1), now, 3));
    }

    #[test]
    fn snooze_duration_must_be_positive() {
        let now = Utc.with_ymd_and_hms(2025, 6, 2, 10, 0, 0).unwrap();
        assert_eq!(
            snooze_until(now, 0),
            Err(ValidationError::NonPositiveSnooze { minutes: 0 })
        );
        assert_eq!(
            snooze_until(now, 15).unwrap(),
            Utc.with_ymd_and_hms(2025, 6, 2, 10, 15, 0).unwrap()
        );
        assert!(snooze_until(now, i64::MAX).is_err());
    }
}
