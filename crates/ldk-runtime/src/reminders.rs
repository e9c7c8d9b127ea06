//! Reminder side of the desk: evaluate both channels, snooze, bulk mark
//! ordered and the dialog response step.

use anyhow::Result;
use chrono::{DateTime, Utc};
use ldk_config::Settings;
use ldk_reminder::{
    evaluate_channel, notification_cue, snooze_until, ChannelSchedule, ChannelVerdict, DueReminder,
    ReminderResponse,
};
use ldk_schemas::{LifecycleStatus, ReminderChannel, ReminderRow};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::desk::Desk;

/// Verdict for one channel together with the inputs it was computed from.
#[derive(Debug, Clone)]
pub struct ChannelCheck {
    pub channel: ReminderChannel,
    pub now: DateTime<Utc>,
    pub verdict: ChannelVerdict,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ResponseOutcome {
    Snoozed { until: DateTime<Utc> },
    MarkedOrdered { rows: u64 },
    Dismissed,
}

async fn candidates(pool: &SqlitePool, channel: ReminderChannel) -> Result<Vec<ReminderRow>> {
    Ok(match channel {
        ReminderChannel::Meridian => ldk_db::meridian_not_ordered(pool)
            .await?
            .into_iter()
            .map(|o| ReminderRow {
                order_id: o.id,
                label: o.title,
                detail: None,
                status: o.status.as_str().to_string(),
                status_changed_at: o.status_changed_at,
            })
            .collect(),
        ReminderChannel::Mkl => ldk_db::mkl_not_ordered(pool)
            .await?
            .into_iter()
            .map(|o| ReminderRow {
                order_id: o.id,
                label: o.fio,
                detail: Some(o.product_name),
                status: o.status.as_str().to_string(),
                status_changed_at: o.status_changed_at,
            })
            .collect(),
    })
}

async fn bulk_mark(pool: &SqlitePool, channel: ReminderChannel, now: DateTime<Utc>) -> Result<u64> {
    match channel {
        ReminderChannel::Meridian => ldk_db::bulk_mark_meridian_ordered(pool, now).await,
        ReminderChannel::Mkl => ldk_db::bulk_mark_mkl_ordered(pool, now).await,
    }
}

impl Desk {
    async fn check_unlocked(&self, channel: ReminderChannel, settings: &Settings) -> Result<ChannelCheck> {
        let now = self.now();
        let wall = settings.zone().wall_clock(now);
        let schedule = ChannelSchedule::from_settings(channel, settings);

        // Cheap exits first so an idle minute does not touch the store.
        if !schedule.enabled || !ldk_reminder::trigger_matches(&schedule, wall) {
            let verdict = evaluate_channel(&schedule, now, wall, None, Vec::new());
            return Ok(ChannelCheck { channel, now, verdict });
        }

        let raw = ldk_db::get_snooze_raw(&self.pool, channel).await?;
        let rows = candidates(&self.pool, channel).await?;
        let verdict = evaluate_channel(&schedule, now, wall, raw.as_deref(), rows);
        Ok(ChannelCheck { channel, now, verdict })
    }

    /// Verdict for a single channel at the current instant.
    pub async fn check_channel(&self, channel: ReminderChannel, settings: &Settings) -> Result<ChannelCheck> {
        let _g = self.lock().await;
        self.check_unlocked(channel, settings).await
    }

    /// Evaluate both channels independently; zero, one or two reminders.
    ///
    /// A channel whose store read fails is logged and skipped; the other
    /// channel is still evaluated and returned.
    pub async fn evaluate_reminders(&self, settings: &Settings) -> Result<Vec<DueReminder>> {
        let _g = self.lock().await;
        let mut due = Vec::new();
        for channel in ReminderChannel::ALL {
            let check = match self.check_unlocked(channel, settings).await {
                Ok(check) => check,
                Err(err) => {
                    tracing::error!(
                        channel = channel.as_str(),
                        error = %format!("{err:#}"),
                        "reminder evaluation failed; channel skipped"
                    );
                    continue;
                }
            };
            match check.verdict {
                ChannelVerdict::Due(rows) => {
                    tracing::info!(channel = channel.as_str(), rows = rows.len(), "reminder due");
                    due.push(DueReminder::new(channel, rows, notification_cue(&settings.sound)));
                }
                ChannelVerdict::Snoozed { until } => {
                    tracing::debug!(channel = channel.as_str(), %until, "reminder snoozed");
                }
                ChannelVerdict::Idle(reason) => {
                    tracing::trace!(channel = channel.as_str(), ?reason, "reminder idle");
                }
            }
        }
        Ok(due)
    }

    /// Suppress `channel` until `now + minutes`. Last write wins.
    pub async fn snooze(&self, channel: ReminderChannel, minutes: i64) -> Result<DateTime<Utc>> {
        let _g = self.lock().await;
        let until = snooze_until(self.now(), minutes)?;
        ldk_db::put_snooze_until(&self.pool, channel, until).await?;
        tracing::info!(channel = channel.as_str(), %until, "reminder snoozed");
        Ok(until)
    }

    /// Every NOT_ORDERED order of the channel becomes ORDERED, stamped with
    /// one shared `now`.
    pub async fn bulk_mark_ordered(&self, channel: ReminderChannel) -> Result<u64> {
        let _g = self.lock().await;
        bulk_mark(&self.pool, channel, self.now()).await
    }

    /// Apply the operator's choice from the reminder dialog.
    pub async fn apply_response(
        &self,
        channel: ReminderChannel,
        response: ReminderResponse,
    ) -> Result<ResponseOutcome> {
        match response {
            ReminderResponse::Snooze { minutes } => {
                let until = self.snooze(channel, minutes).await?;
                Ok(ResponseOutcome::Snoozed { until })
            }
            ReminderResponse::MarkOrdered => {
                let rows = self.bulk_mark_ordered(channel).await?;
                Ok(ResponseOutcome::MarkedOrdered { rows })
            }
            ReminderResponse::Dismiss => {
                tracing::info!(channel = channel.as_str(), "reminder dismissed");
                Ok(ResponseOutcome::Dismissed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::clock::ManualClock;

    #[tokio::test]
    async fn queued_snooze_reads_the_clock_after_taking_the_gate() {
        let t = Utc.with_ymd_and_hms(2025, 9, 1, 9, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(t));
        let pool = ldk_db::connect_memory().await.unwrap();
        let desk = Arc::new(Desk::new(pool, clock.clone()));

        let held = desk.lock().await;
        let queued = {
            let desk = desk.clone();
            tokio::spawn(async move { desk.snooze(ReminderChannel::Mkl, 15).await })
        };
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
        clock.advance(Duration::hours(1));
        drop(held);

        let until = queued.await.unwrap().unwrap();
        assert_eq!(until, t + Duration::hours(1) + Duration::minutes(15));
    }
}
