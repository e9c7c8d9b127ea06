//! Scenario: the desk end to end against an in-memory store.
//!
//! - MKL sph -1.30 is stored as -1.25, NOT_ORDERED.
//! - Meridian titles follow max id; the export lists both items of one
//!   product under a single block.
//! - Bulk mark ordered on MKL stamps every NOT_ORDERED order with the same
//!   instant.
//! - Reminders: due at the trigger minute, suppressed while snoozed,
//!   resumed afterwards, and silenced by mark-ordered.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use ldk_config::Settings;
use ldk_reminder::ReminderResponse;
use ldk_runtime::{Desk, ManualClock, ResponseOutcome};
use ldk_schemas::{
    Catalog, MeridianItemInput, MklFilter, MklOrderInput, MklStatus, ReminderChannel,
    ValidationError,
};

fn mkl_input(fio: &str, sph: f64) -> MklOrderInput {
    MklOrderInput {
        fio: fio.into(),
        phone: "8 (900) 111-22-33".into(),
        product_name: "Biofinity".into(),
        sph: Some(sph),
        qty: 1,
        ..MklOrderInput::default()
    }
}

async fn desk_at(start: chrono::DateTime<Utc>) -> anyhow::Result<(Desk, Arc<ManualClock>)> {
    let pool = ldk_db::connect_memory().await?;
    let clock = Arc::new(ManualClock::new(start));
    Ok((Desk::new(pool, clock.clone()), clock))
}

fn utc_settings() -> Settings {
    Settings {
        timezone: "UTC".into(),
        ..Settings::default()
    }
}

#[tokio::test]
async fn orders_export_and_bulk_mark() -> anyhow::Result<()> {
    let t0 = Utc.with_ymd_and_hms(2025, 9, 1, 8, 0, 0).unwrap();
    let (desk, clock) = desk_at(t0).await?;

    let o = desk.create_mkl_order(&mkl_input("Орлова", -1.30)).await?;
    assert_eq!(o.sph, -1.25);
    assert_eq!(o.status, MklStatus::NotOrdered);
    assert_eq!(o.phone_digits, "89001112233");

    let m1 = desk.create_meridian_order().await?;
    assert_eq!(m1.title, "Order #1");
    let m2 = desk.create_meridian_order().await?;
    assert_eq!(m2.title, "Order #2");

    for qty in [2, 3] {
        desk.add_meridian_item(
            m1.id,
            &MeridianItemInput {
                product_name: "Ortho-K".into(),
                sph: Some(-2.0),
                qty,
                ..MeridianItemInput::default()
            },
        )
        .await?;
    }

    let dir = tempfile::tempdir()?;
    let settings = Settings {
        export_directory: dir.path().to_path_buf(),
        ..utc_settings()
    };
    let out = desk.export_unordered(Catalog::Meridian, &settings).await?;
    assert_eq!(out.path, dir.path().join("MERIDIAN_01.09.25.txt"));
    let text = std::fs::read_to_string(&out.path)?;
    assert_eq!(
        text,
        "Ortho-K\nSph: -2.00 Количество: 2\nSph: -2.00 Количество: 3\n"
    );

    desk.create_mkl_order(&mkl_input("Белов", 1.0)).await?;
    clock.advance(Duration::hours(2));
    let marked = desk.bulk_mark_ordered(ReminderChannel::Mkl).await?;
    assert_eq!(marked, 2);

    let all = desk.list_mkl_orders(&MklFilter::default()).await?;
    assert!(all.iter().all(|o| o.status == MklStatus::Ordered));
    assert!(all.iter().all(|o| o.status_changed_at == t0 + Duration::hours(2)));
    Ok(())
}

#[tokio::test]
async fn validation_errors_write_nothing() -> anyhow::Result<()> {
    let (desk, _clock) = desk_at(Utc::now()).await?;

    let mut bad = mkl_input("", -1.0);
    bad.fio = "   ".into();
    let err = desk.create_mkl_order(&bad).await.unwrap_err();
    assert_eq!(
        err.downcast_ref::<ValidationError>(),
        Some(&ValidationError::MissingField("fio"))
    );
    assert!(desk.list_mkl_orders(&MklFilter::default()).await?.is_empty());

    let err = desk.snooze(ReminderChannel::Meridian, 0).await.unwrap_err();
    assert!(err.downcast_ref::<ValidationError>().is_some());
    Ok(())
}

#[tokio::test]
async fn meridian_reminder_snooze_and_resolve() -> anyhow::Result<()> {
    // 2025-09-01 is a Monday.
    let t = Utc.with_ymd_and_hms(2025, 9, 1, 11, 0, 0).unwrap();
    let (desk, clock) = desk_at(t).await?;
    let mut settings = Settings {
        meridian_reminder_enabled: true,
        meridian_days: vec![0],
        meridian_time: "11:00".into(),
        ..utc_settings()
    };

    // Nothing pending yet.
    assert!(desk.evaluate_reminders(&settings).await?.is_empty());

    let order = desk.create_meridian_order().await?;
    let due = desk.evaluate_reminders(&settings).await?;
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].channel, ReminderChannel::Meridian);
    assert_eq!(due[0].rows[0].order_id, order.id);
    assert_eq!(due[0].rows[0].label, "Order #1");

    // Dismiss: fires again at the same minute.
    let out = desk
        .apply_response(ReminderChannel::Meridian, ReminderResponse::Dismiss)
        .await?;
    assert_eq!(out, ResponseOutcome::Dismissed);
    assert_eq!(desk.evaluate_reminders(&settings).await?.len(), 1);

    let out = desk
        .apply_response(ReminderChannel::Meridian, ReminderResponse::Snooze { minutes: 15 })
        .await?;
    assert_eq!(
        out,
        ResponseOutcome::Snoozed {
            until: t + Duration::minutes(15)
        }
    );

    // Inside the window, even at a matching minute.
    clock.set(t + Duration::minutes(14));
    settings.meridian_time = "11:14".into();
    assert!(desk.evaluate_reminders(&settings).await?.is_empty());

    clock.set(t + Duration::minutes(15));
    settings.meridian_time = "11:15".into();
    assert_eq!(desk.evaluate_reminders(&settings).await?.len(), 1);

    let out = desk
        .apply_response(ReminderChannel::Meridian, ReminderResponse::MarkOrdered)
        .await?;
    assert_eq!(out, ResponseOutcome::MarkedOrdered { rows: 1 });
    assert!(desk.evaluate_reminders(&settings).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn mkl_reminder_waits_for_staleness() -> anyhow::Result<()> {
    let t = Utc.with_ymd_and_hms(2025, 9, 1, 18, 0, 0).unwrap();
    let (desk, clock) = desk_at(t).await?;
    let settings = Settings {
        mkl_reminder_enabled: true,
        mkl_time: "18:00".into(),
        mkl_staleness_days: 3,
        ..utc_settings()
    };

    desk.create_mkl_order(&mkl_input("Кузнецов", -3.0)).await?;
    assert!(desk.evaluate_reminders(&settings).await?.is_empty());

    clock.set(t + Duration::days(3));
    let due = desk.evaluate_reminders(&settings).await?;
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].rows[0].label, "Кузнецов");
    assert_eq!(due[0].rows[0].detail.as_deref(), Some("Biofinity"));

    // Corrupt marker: treated as no snooze.
    ldk_db::put_notify_state(desk.pool(), "mkl_snooze_until", "yesterday-ish").await?;
    assert_eq!(desk.evaluate_reminders(&settings).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn unreadable_meridian_row_does_not_hide_mkl_reminder() -> anyhow::Result<()> {
    let t = Utc.with_ymd_and_hms(2025, 9, 1, 10, 0, 0).unwrap();
    let (desk, clock) = desk_at(t - Duration::days(5)).await?;
    desk.create_mkl_order(&mkl_input("Зайцева", -2.0)).await?;
    clock.set(t);

    sqlx::query(
        "insert into meridian_orders (title, status, status_changed_at) values ('Order #1', 'NOT_ORDERED', 'garbage')",
    )
    .execute(desk.pool())
    .await?;

    let settings = Settings {
        meridian_reminder_enabled: true,
        meridian_days: vec![0],
        meridian_time: "10:00".into(),
        mkl_reminder_enabled: true,
        mkl_time: "10:00".into(),
        mkl_staleness_days: 3,
        ..utc_settings()
    };

    let due = desk.evaluate_reminders(&settings).await?;
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].channel, ReminderChannel::Mkl);
    assert_eq!(due[0].rows[0].label, "Зайцева");

    // The failing channel still reports its error when checked on its own.
    assert!(desk.check_channel(ReminderChannel::Meridian, &settings).await.is_err());
    Ok(())
}
