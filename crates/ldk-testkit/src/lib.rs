//! ldk-testkit
//!
//! Fixtures shared by the cross-crate scenarios: a desk over an in-memory
//! (or temp-file) store driven by a manual clock, a settings builder, and a
//! JSON seed format for populating orders.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use ldk_config::Settings;
use ldk_runtime::{Desk, ManualClock};
use ldk_schemas::{MeridianItemInput, MeridianStatus, MklOrderInput, MklStatus};
use serde::Deserialize;
use sqlx::SqlitePool;
use tempfile::TempDir;

/// A desk plus the clock that drives it and a scratch directory for
/// exports.
pub struct TestDesk {
    pub desk: Arc<Desk>,
    pub clock: Arc<ManualClock>,
    pub scratch: TempDir,
}

impl TestDesk {
    /// In-memory store starting at `start`.
    pub async fn in_memory(start: DateTime<Utc>) -> Result<Self> {
        let pool = ldk_db::connect_memory().await?;
        Self::with_pool(pool, start)
    }

    /// File-backed store under `dir`; a second `on_file` over the same
    /// directory sees the first one's writes.
    pub async fn on_file(dir: &Path, start: DateTime<Utc>) -> Result<Self> {
        let url = format!("sqlite://{}?mode=rwc", dir.join("desk.db").display());
        let pool = ldk_db::connect(&url).await?;
        ldk_db::migrate(&pool).await?;
        Self::with_pool(pool, start)
    }

    fn with_pool(pool: SqlitePool, start: DateTime<Utc>) -> Result<Self> {
        let clock = Arc::new(ManualClock::new(start));
        let desk = Arc::new(Desk::new(pool, clock.clone()));
        let scratch = tempfile::tempdir().context("create scratch dir failed")?;
        Ok(Self {
            desk,
            clock,
            scratch,
        })
    }

    pub fn export_dir(&self) -> PathBuf {
        self.scratch.path().to_path_buf()
    }

    /// UTC settings exporting into the scratch directory.
    pub fn settings(&self) -> SettingsBuilder {
        SettingsBuilder::new().export_directory(self.export_dir())
    }

    pub async fn close(self) {
        self.desk.pool().close().await;
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Fluent settings for tests. Starts from defaults with the wall clock in
/// UTC so trigger minutes line up with `DateTime<Utc>` fixtures.
#[derive(Debug, Clone)]
pub struct SettingsBuilder(Settings);

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self(Settings {
            timezone: "UTC".to_string(),
            ..Settings::default()
        })
    }

    pub fn meridian(mut self, time: &str, days: &[u8]) -> Self {
        self.0.meridian_reminder_enabled = true;
        self.0.meridian_time = time.to_string();
        self.0.meridian_days = days.to_vec();
        self
    }

    pub fn mkl(mut self, time: &str, staleness_days: i64) -> Self {
        self.0.mkl_reminder_enabled = true;
        self.0.mkl_time = time.to_string();
        self.0.mkl_staleness_days = staleness_days;
        self
    }

    pub fn export_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.0.export_directory = dir.into();
        self
    }

    pub fn timezone(mut self, tz: &str) -> Self {
        self.0.timezone = tz.to_string();
        self
    }

    pub fn build(self) -> Settings {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

pub fn mkl_input(fio: &str, product: &str, sph: f64, qty: i64) -> MklOrderInput {
    MklOrderInput {
        fio: fio.to_string(),
        phone: "8 900 000-00-00".to_string(),
        product_name: product.to_string(),
        sph: Some(sph),
        qty,
        ..MklOrderInput::default()
    }
}

pub fn meridian_item(product: &str, qty: i64) -> MeridianItemInput {
    MeridianItemInput {
        product_name: product.to_string(),
        qty,
        ..MeridianItemInput::default()
    }
}

// ---------------------------------------------------------------------------
// Seed files
// ---------------------------------------------------------------------------

/// JSON seed: MKL orders (optionally aged and moved to a status) and
/// Meridian orders with their items.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub mkl: Vec<SeedMkl>,
    #[serde(default)]
    pub meridian: Vec<SeedMeridian>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedMkl {
    #[serde(flatten)]
    pub input: MklOrderInput,
    /// Created this many days before the clock's current time.
    #[serde(default)]
    pub age_days: i64,
    #[serde(default)]
    pub status: Option<MklStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedMeridian {
    #[serde(default)]
    pub status: Option<MeridianStatus>,
    #[serde(default)]
    pub items: Vec<MeridianItemInput>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub mkl_orders: usize,
    pub meridian_orders: usize,
    pub meridian_items: usize,
}

pub fn parse_seed(json: &str) -> Result<Seed> {
    serde_json::from_str(json).context("parse seed json failed")
}

pub fn load_seed(path: &Path) -> Result<Seed> {
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("read seed failed: {}", path.display()))?;
    parse_seed(&s)
}

/// Apply a seed through the desk. The clock is rewound for aged rows and
/// restored afterwards.
pub async fn apply_seed(t: &TestDesk, seed: &Seed) -> Result<SeedReport> {
    use ldk_runtime::Clock;

    let now = t.clock.now();
    let mut report = SeedReport::default();

    for m in &seed.mkl {
        t.clock.set(now - Duration::days(m.age_days));
        let o = t.desk.create_mkl_order(&m.input).await?;
        if let Some(st) = m.status {
            t.desk.set_mkl_status(o.id, st).await?;
        }
        report.mkl_orders += 1;
    }
    t.clock.set(now);

    for m in &seed.meridian {
        let o = t.desk.create_meridian_order().await?;
        for item in &m.items {
            t.desk.add_meridian_item(o.id, item).await?;
            report.meridian_items += 1;
        }
        if let Some(st) = m.status {
            t.desk.set_meridian_status(o.id, st).await?;
        }
        report.meridian_orders += 1;
    }

    Ok(report)
}
