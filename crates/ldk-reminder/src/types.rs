use std::path::PathBuf;

use chrono::{DateTime, Utc};
use ldk_config::Settings;
use ldk_schemas::{ReminderChannel, ReminderRow, SnoozeOption};
use serde::{Deserialize, Serialize};

/// Per-channel view of the settings, rebuilt on every tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelSchedule {
    pub channel: ReminderChannel,
    pub enabled: bool,
    /// "HH:MM" as configured; compared verbatim.
    pub trigger_time: String,
    /// Weekdays (0 = Monday) the channel may fire on. `None` = every day.
    pub weekdays: Option<Vec<u8>>,
    /// Minimum age of a NOT_ORDERED status before an order qualifies.
    /// `None` = no age threshold.
    pub staleness_days: Option<i64>,
}

impl ChannelSchedule {
    pub fn from_settings(channel: ReminderChannel, s: &Settings) -> Self {
        match channel {
            ReminderChannel::Meridian => Self {
                channel,
                enabled: s.meridian_reminder_enabled,
                trigger_time: s.meridian_time.clone(),
                weekdays: Some(s.meridian_days.clone()),
                staleness_days: None,
            },
            ReminderChannel::Mkl => Self {
                channel,
                enabled: s.mkl_reminder_enabled,
                trigger_time: s.mkl_time.clone(),
                weekdays: None,
                staleness_days: Some(s.mkl_staleness_days),
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdleReason {
    Disabled,
    NotTriggerMinute,
    NoQualifyingOrders,
}

/// Outcome of evaluating one channel at one tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChannelVerdict {
    Idle(IdleReason),
    Snoozed { until: DateTime<Utc> },
    Due(Vec<ReminderRow>),
}

impl ChannelVerdict {
    pub fn is_due(&self) -> bool {
        matches!(self, ChannelVerdict::Due(_))
    }
}

/// How the UI should announce a due reminder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum NotificationCue {
    Beep,
    Alias(String),
    File(PathBuf),
}

/// A reminder ready to be shown: the qualifying rows (newest first), the
/// snooze choices the dialog offers and the sound cue.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DueReminder {
    pub channel: ReminderChannel,
    pub rows: Vec<ReminderRow>,
    pub snooze_options: Vec<SnoozeOption>,
    pub cue: NotificationCue,
}

impl DueReminder {
    pub fn new(channel: ReminderChannel, rows: Vec<ReminderRow>, cue: NotificationCue) -> Self {
        Self {
            channel,
            rows,
            snooze_options: channel.snooze_options().to_vec(),
            cue,
        }
    }
}

/// What the operator chose in the reminder dialog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ReminderResponse {
    Snooze { minutes: i64 },
    MarkOrdered,
    Dismiss,
}
