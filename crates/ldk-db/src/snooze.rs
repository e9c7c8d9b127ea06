//! Flat key/value state. Snooze markers are stored as RFC 3339 text and
//! interpreted by the reminder evaluator, not here.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use ldk_schemas::ReminderChannel;
use sqlx::SqlitePool;

pub async fn get_notify_state(pool: &SqlitePool, key: &str) -> Result<Option<String>> {
    let row: Option<(Option<String>,)> =
        sqlx::query_as("select value from notify_state where key = ?1")
            .bind(key)
            .fetch_optional(pool)
            .await
            .context("get_notify_state failed")?;
    Ok(row.and_then(|(v,)| v))
}

/// Upsert.
pub async fn put_notify_state(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        r#"
        insert into notify_state (key, value) values (?1, ?2)
        on conflict(key) do update set value = excluded.value
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await
    .context("put_notify_state failed")?;
    Ok(())
}

/// Raw marker text for a channel, if any was ever written.
pub async fn get_snooze_raw(pool: &SqlitePool, channel: ReminderChannel) -> Result<Option<String>> {
    get_notify_state(pool, channel.snooze_key()).await
}

pub async fn put_snooze_until(
    pool: &SqlitePool,
    channel: ReminderChannel,
    until: DateTime<Utc>,
) -> Result<()> {
    let text = until.to_rfc3339_opts(SecondsFormat::Secs, true);
    put_notify_state(pool, channel.snooze_key(), &text).await
}
