//! Scenario: the reminder tick publishes due reminders on the bus and
//! keeps running; aborting the task stops it.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use ldk_config::Settings;
use ldk_daemon::state::{self, BusMsg};
use ldk_runtime::{Desk, ManualClock};
use ldk_schemas::ReminderChannel;

#[tokio::test]
async fn tick_publishes_due_reminder_and_stops_on_abort() -> anyhow::Result<()> {
    let pool = ldk_db::connect_memory().await?;
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 9, 2, 9, 30, 0).unwrap()));
    let desk = Desk::new(pool, clock);
    desk.create_meridian_order().await?;

    let settings = Settings {
        timezone: "UTC".into(),
        meridian_reminder_enabled: true,
        meridian_days: (0..=6).collect(),
        meridian_time: "09:30".into(),
        ..Settings::default()
    };
    let st = Arc::new(state::AppState::new(desk, settings, None));
    let mut rx = st.bus.subscribe();

    let handle = state::spawn_reminder_tick(Arc::clone(&st), Duration::from_millis(20));

    let msg = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await??;
    match msg {
        BusMsg::Reminder(d) => assert_eq!(d.channel, ReminderChannel::Meridian),
        other => panic!("unexpected bus message: {other:?}"),
    }

    handle.abort();
    assert!(handle.await.unwrap_err().is_cancelled());
    Ok(())
}

#[tokio::test]
async fn tick_once_counts_nothing_when_disabled() -> anyhow::Result<()> {
    let pool = ldk_db::connect_memory().await?;
    let desk = Desk::with_system_clock(pool);
    desk.create_meridian_order().await?;
    let st = state::AppState::new(desk, Settings::default(), None);
    assert_eq!(state::reminder_tick_once(&st).await?, 0);
    Ok(())
}
