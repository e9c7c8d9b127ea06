//! ldk-config
//!
//! The Settings collaborator: defaults, layered loading, corrupted-file
//! recovery, atomic save and the wall-clock zone.
//!
//! # Recovery rules
//!
//! - Missing file: defaults are written (atomically) and returned.
//! - Unparseable file: it is renamed to `<file>.bak_<YYYYMMDD_HHMMSS>`,
//!   defaults are written and returned. Never fatal.
//! - Unknown keys: reported as a warning, never fatal.

use anyhow::{Context, Result};
use chrono::NaiveTime;
use ldk_schemas::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

mod layering;
mod zone;

pub use layering::{report_unused_keys, UnusedKeyReport, CONSUMED_POINTERS};
pub use zone::LocalZone;

pub const ENV_SETTINGS_PATH: &str = "LDK_SETTINGS_PATH";
pub const DEFAULT_SETTINGS_FILE: &str = "settings.yaml";

pub const STALENESS_DAYS_MIN: i64 = 1;
pub const STALENESS_DAYS_MAX: i64 = 60;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub meridian_reminder_enabled: bool,
    /// Weekdays, 0 = Monday .. 6 = Sunday. Out-of-range entries are
    /// dropped on load instead of failing the whole file.
    #[serde(deserialize_with = "lenient_weekdays")]
    pub meridian_days: Vec<u8>,
    /// "HH:MM", compared verbatim against the wall clock.
    pub meridian_time: String,
    pub mkl_reminder_enabled: bool,
    pub mkl_staleness_days: i64,
    pub mkl_time: String,
    pub export_directory: PathBuf,
    /// "local" or an IANA zone name.
    pub timezone: String,
    pub sound: SoundSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundMode {
    Alias,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundSettings {
    pub enabled: bool,
    pub mode: SoundMode,
    pub alias: String,
    pub file: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            meridian_reminder_enabled: false,
            meridian_days: Vec::new(),
            meridian_time: "09:00".to_string(),
            mkl_reminder_enabled: false,
            mkl_staleness_days: 3,
            mkl_time: "09:00".to_string(),
            export_directory: user_desktop_path(),
            timezone: "local".to_string(),
            sound: SoundSettings {
                enabled: true,
                mode: SoundMode::Alias,
                alias: "SystemAsterisk".to_string(),
                file: String::new(),
            },
        }
    }
}

impl Settings {
    pub fn zone(&self) -> LocalZone {
        LocalZone::parse(&self.timezone)
    }

    /// Bring loaded values into their documented ranges. Lenient: used on
    /// load, where a hand-edited file must never be fatal.
    pub fn sanitize(mut self) -> Self {
        let clamped = self
            .mkl_staleness_days
            .clamp(STALENESS_DAYS_MIN, STALENESS_DAYS_MAX);
        if clamped != self.mkl_staleness_days {
            warn!(
                from = self.mkl_staleness_days,
                to = clamped,
                "mkl_staleness_days out of range; clamped"
            );
            self.mkl_staleness_days = clamped;
        }

        let mut days: Vec<u8> = self.meridian_days.iter().copied().filter(|d| *d <= 6).collect();
        days.sort_unstable();
        days.dedup();
        self.meridian_days = days;

        for (key, t) in [("meridian_time", &self.meridian_time), ("mkl_time", &self.mkl_time)] {
            if parse_trigger_time(t).is_none() {
                warn!(key, value = %t, "trigger time is not HH:MM; that reminder will never fire");
            }
        }
        self
    }

    /// Strict check for settings submitted by the UI.
    pub fn validate(self) -> Result<Self, ValidationError> {
        for t in [&self.meridian_time, &self.mkl_time] {
            if parse_trigger_time(t).is_none() {
                return Err(ValidationError::BadTriggerTime(t.clone()));
            }
        }
        Ok(self.sanitize())
    }
}

fn lenient_weekdays<'de, D>(de: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Vec::<i64>::deserialize(de)?;
    let mut days = Vec::with_capacity(raw.len());
    for d in raw {
        match u8::try_from(d).ok().filter(|d| *d <= 6) {
            Some(day) => days.push(day),
            None => warn!(day = d, "meridian_days entry out of range; dropped"),
        }
    }
    Ok(days)
}

/// `Some` for a well-formed zero-padded "HH:MM".
pub fn parse_trigger_time(s: &str) -> Option<NaiveTime> {
    let t = s.trim();
    if t.len() != 5 {
        return None;
    }
    NaiveTime::parse_from_str(t, "%H:%M").ok()
}

/// Desktop on Windows/macOS, working directory elsewhere.
pub fn user_desktop_path() -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    if cfg!(any(target_os = "windows", target_os = "macos")) {
        let home = std::env::var_os("USERPROFILE").or_else(|| std::env::var_os("HOME"));
        if let Some(h) = home {
            return PathBuf::from(h).join("Desktop");
        }
    }
    cwd
}

pub fn settings_path_from_env() -> PathBuf {
    std::env::var_os(ENV_SETTINGS_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE))
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// File existed and parsed.
    Loaded,
    /// File was missing; defaults were written.
    Created,
    /// File was corrupt; it was moved aside and defaults were written.
    Recovered { backup: PathBuf },
}

#[derive(Debug, Clone)]
pub struct LoadedSettings {
    pub settings: Settings,
    pub settings_hash: String,
    pub canonical_json: String,
    pub unused: UnusedKeyReport,
    pub outcome: LoadOutcome,
}

fn defaults_document() -> Result<Value> {
    serde_json::to_value(Settings::default()).context("serialize default settings failed")
}

/// Layer YAML/JSON documents over the defaults. Fails on unparseable input
/// or ill-typed values; callers decide whether that is recoverable.
pub fn load_settings_from_strings(docs: &[&str]) -> Result<LoadedSettings> {
    let merged = layering::merge_yaml_layers(defaults_document()?, docs)?;
    let unused = report_unused_keys(&merged);

    let settings: Settings =
        serde_json::from_value(merged.clone()).context("settings have the wrong shape")?;
    let settings = settings.sanitize();

    let canonical_json = layering::canonicalize_json(&serde_json::to_value(&settings)?)?;
    let settings_hash = layering::sha256_hex(canonical_json.as_bytes());

    Ok(LoadedSettings {
        settings,
        settings_hash,
        canonical_json,
        unused,
        outcome: LoadOutcome::Loaded,
    })
}

/// Load the settings file, creating or recovering it as needed.
///
/// Only an unreadable (not missing, not corrupt) file is an error.
pub fn load_or_init(path: &Path) -> Result<LoadedSettings> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => Some(raw),
        Err(e) if e.kind() == ErrorKind::NotFound => None,
        Err(e) => {
            return Err(anyhow::Error::new(e))
                .with_context(|| format!("failed to read settings: {}", path.display()))
        }
    };

    let Some(raw) = raw else {
        let mut loaded = load_settings_from_strings(&[])?;
        persist_defaults(path, &loaded.settings);
        loaded.outcome = LoadOutcome::Created;
        info!(path = %path.display(), "settings file created with defaults");
        return Ok(loaded);
    };

    match load_settings_from_strings(&[raw.as_str()]) {
        Ok(loaded) => {
            if !loaded.unused.is_clean() {
                warn!(
                    keys = ?loaded.unused.unused_leaf_pointers,
                    "settings contain keys nothing reads"
                );
            }
            info!(path = %path.display(), settings_hash = %loaded.settings_hash, "settings loaded");
            Ok(loaded)
        }
        Err(err) => {
            let backup = backup_path(path);
            warn!(
                path = %path.display(),
                backup = %backup.display(),
                error = %format!("{err:#}"),
                "settings file corrupt; moving aside and using defaults"
            );
            if let Err(e) = fs::rename(path, &backup) {
                warn!(error = %e, "could not move corrupt settings aside");
            }
            let mut loaded = load_settings_from_strings(&[])?;
            persist_defaults(path, &loaded.settings);
            loaded.outcome = LoadOutcome::Recovered { backup };
            Ok(loaded)
        }
    }
}

fn persist_defaults(path: &Path, settings: &Settings) {
    if let Err(e) = save_settings(path, settings) {
        warn!(path = %path.display(), error = %format!("{e:#}"), "could not write default settings");
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".bak_{stamp}"));
    PathBuf::from(name)
}

/// Atomic save: write `<file>.tmp`, then rename over the target.
pub fn save_settings(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create settings dir failed: {}", parent.display()))?;
    }
    let yaml = serde_yaml::to_string(settings).context("serialize settings failed")?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, yaml).with_context(|| format!("write settings failed: {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("replace settings failed: {}", path.display()))?;
    Ok(())
}
