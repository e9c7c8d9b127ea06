//! Shared runtime state for ldk-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. The background tasks
//! spawned here (heartbeat, reminder tick) return their `JoinHandle` so
//! `main.rs` can stop them on shutdown.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use ldk_config::Settings;
use ldk_reminder::DueReminder;
use ldk_runtime::Desk;
use serde::Serialize;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

// ---------------------------------------------------------------------------
// BusMsg — SSE event bus payload
// ---------------------------------------------------------------------------

/// Messages broadcast over the internal event bus and surfaced as SSE events.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusMsg {
    Heartbeat { ts_millis: i64 },
    Reminder(DueReminder),
    LogLine { level: String, msg: String },
}

// ---------------------------------------------------------------------------
// BuildInfo
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    /// Broadcast bus for SSE.
    pub bus: broadcast::Sender<BusMsg>,
    pub build: BuildInfo,
    /// All store access goes through the desk.
    pub desk: Arc<Desk>,
    /// Current settings; the tick reads a fresh copy every minute.
    pub settings: Arc<RwLock<Settings>>,
    /// Where settings updates are persisted. `None` keeps them in memory.
    pub settings_path: Option<PathBuf>,
}

impl AppState {
    pub fn new(desk: Desk, settings: Settings, settings_path: Option<PathBuf>) -> Self {
        let (bus, _rx) = broadcast::channel::<BusMsg>(1024);
        Self {
            bus,
            build: BuildInfo {
                service: "ldk-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            desk: Arc::new(desk),
            settings: Arc::new(RwLock::new(settings)),
            settings_path,
        }
    }

    pub async fn settings_snapshot(&self) -> Settings {
        self.settings.read().await.clone()
    }
}

// ---------------------------------------------------------------------------
// Background tasks
// ---------------------------------------------------------------------------

/// Spawn a background task that emits a heartbeat SSE every `interval`.
pub fn spawn_heartbeat(bus: broadcast::Sender<BusMsg>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let ts = chrono::Utc::now().timestamp_millis();
            let _ = bus.send(BusMsg::Heartbeat { ts_millis: ts });
        }
    })
}

/// One reminder evaluation: read settings, evaluate both channels and
/// publish every due reminder on the bus. Returns how many were published.
pub async fn reminder_tick_once(state: &AppState) -> anyhow::Result<usize> {
    let settings = state.settings_snapshot().await;
    let due = state.desk.evaluate_reminders(&settings).await?;
    let n = due.len();
    for d in due {
        let _ = state.bus.send(BusMsg::Reminder(d));
    }
    Ok(n)
}

/// Spawn the periodic reminder tick.
///
/// Ticks that fall behind are skipped, not replayed: a trigger minute that
/// passes while the process is suspended is missed for that day. A failing
/// evaluation is logged and published as a log line; the loop keeps going.
pub fn spawn_reminder_tick(state: Arc<AppState>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if let Err(err) = reminder_tick_once(&state).await {
                tracing::error!(error = %format!("{err:#}"), "reminder tick failed");
                let _ = state.bus.send(BusMsg::LogLine {
                    level: "ERROR".to_string(),
                    msg: format!("reminder tick failed: {err:#}"),
                });
            }
        }
    })
}
