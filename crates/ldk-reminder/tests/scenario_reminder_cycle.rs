//! Scenario: one channel across a day of ticks.
//!
//! - Due at the trigger minute, idle the next minute, due again at the same
//!   minute the next day.
//! - Re-evaluating the same minute gives the same verdict (dismissal is not
//!   remembered).
//! - A snooze taken at T for D suppresses every tick in (T, T+D) and
//!   evaluation resumes at T+D.

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use ldk_config::Settings;
use ldk_reminder::*;
use ldk_schemas::{ReminderChannel, ReminderRow};

fn row(id: i64, changed_at: DateTime<Utc>) -> ReminderRow {
    ReminderRow {
        order_id: id,
        label: format!("Order #{id}"),
        detail: None,
        status: "NOT_ORDERED".into(),
        status_changed_at: changed_at,
    }
}

// The wall clock equals UTC in these scenarios.
fn wall(now: DateTime<Utc>) -> NaiveDateTime {
    now.naive_utc()
}

fn mkl_settings() -> Settings {
    Settings {
        mkl_reminder_enabled: true,
        mkl_time: "18:00".into(),
        mkl_staleness_days: 2,
        ..Settings::default()
    }
}

#[test]
fn fires_once_per_day_at_the_trigger_minute() {
    let s = mkl_settings();
    let sched = ChannelSchedule::from_settings(ReminderChannel::Mkl, &s);
    let t = Utc.with_ymd_and_hms(2025, 6, 10, 18, 0, 0).unwrap();
    let old = row(1, t - Duration::days(5));

    let v1 = evaluate_channel(&sched, t, wall(t), None, vec![old.clone()]);
    assert_eq!(v1, ChannelVerdict::Due(vec![old.clone()]));

    // Dismissed, then same minute again: still due.
    let v2 = evaluate_channel(&sched, t + Duration::seconds(30), wall(t + Duration::seconds(30)), None, vec![old.clone()]);
    assert!(v2.is_due());

    let next = t + Duration::minutes(1);
    assert_eq!(
        evaluate_channel(&sched, next, wall(next), None, vec![old.clone()]),
        ChannelVerdict::Idle(IdleReason::NotTriggerMinute)
    );

    let tomorrow = t + Duration::days(1);
    assert!(evaluate_channel(&sched, tomorrow, wall(tomorrow), None, vec![old]).is_due());
}

#[test]
fn fresh_mkl_orders_do_not_qualify() {
    let s = mkl_settings();
    let sched = ChannelSchedule::from_settings(ReminderChannel::Mkl, &s);
    let t = Utc.with_ymd_and_hms(2025, 6, 10, 18, 0, 0).unwrap();

    let fresh = row(2, t - Duration::hours(5));
    assert_eq!(
        evaluate_channel(&sched, t, wall(t), None, vec![fresh]),
        ChannelVerdict::Idle(IdleReason::NoQualifyingOrders)
    );
}

#[test]
fn snooze_window_suppresses_then_resumes() {
    let s = Settings {
        meridian_reminder_enabled: true,
        meridian_time: "10:00".into(),
        meridian_days: (0..=6).collect(),
        ..Settings::default()
    };
    let mut sched = ChannelSchedule::from_settings(ReminderChannel::Meridian, &s);
    let t = Utc.with_ymd_and_hms(2025, 6, 10, 10, 0, 0).unwrap();
    let rows = vec![row(7, t)];

    assert!(evaluate_channel(&sched, t, wall(t), None, rows.clone()).is_due());

    let until = snooze_until(t, 15).unwrap();
    let marker = until.to_rfc3339();

    // Every minute of (T, T+D): move the trigger along with the clock so
    // only the snooze can suppress.
    for m in 1..15 {
        let now = t + Duration::minutes(m);
        sched.trigger_time = now.format("%H:%M").to_string();
        assert_eq!(
            evaluate_channel(&sched, now, wall(now), Some(&marker), rows.clone()),
            ChannelVerdict::Snoozed { until },
            "minute {m}"
        );
    }

    let at_end = t + Duration::minutes(15);
    sched.trigger_time = at_end.format("%H:%M").to_string();
    assert!(evaluate_channel(&sched, at_end, wall(at_end), Some(&marker), rows).is_due());
}

#[test]
fn disabled_channel_is_idle() {
    let sched = ChannelSchedule::from_settings(ReminderChannel::Meridian, &Settings::default());
    let t = Utc.with_ymd_and_hms(2025, 6, 10, 9, 0, 0).unwrap();
    assert_eq!(
        evaluate_channel(&sched, t, wall(t), None, vec![row(1, t)]),
        ChannelVerdict::Idle(IdleReason::Disabled)
    );
}

#[test]
fn due_reminder_carries_channel_snooze_options() {
    let t = Utc.with_ymd_and_hms(2025, 6, 10, 9, 0, 0).unwrap();
    let due = DueReminder::new(ReminderChannel::Mkl, vec![row(1, t)], NotificationCue::Beep);
    let minutes: Vec<i64> = due.snooze_options.iter().map(|o| o.minutes).collect();
    assert_eq!(minutes, vec![24 * 60, 3 * 24 * 60]);

    let json = serde_json::to_value(&due).unwrap();
    assert_eq!(json["channel"], "MKL");
    assert_eq!(json["cue"]["kind"], "beep");
}

#[test]
fn responses_parse_from_json() {
    let r: ReminderResponse = serde_json::from_str(r#"{"action":"snooze","minutes":30}"#).unwrap();
    assert_eq!(r, ReminderResponse::Snooze { minutes: 30 });
    let r: ReminderResponse = serde_json::from_str(r#"{"action":"mark_ordered"}"#).unwrap();
    assert_eq!(r, ReminderResponse::MarkOrdered);
}
