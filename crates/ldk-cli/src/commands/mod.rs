//! Command handler modules for the `ldk` CLI.
//!
//! Shared utilities used by multiple command paths live here.

pub mod orders;
pub mod remind;

use anyhow::Result;
use ldk_config::{LoadOutcome, LoadedSettings};
use ldk_runtime::Desk;
use ldk_schemas::Catalog;

/// Settings from `LDK_SETTINGS_PATH`, created or recovered as needed.
pub fn load_settings() -> Result<LoadedSettings> {
    let path = ldk_config::settings_path_from_env();
    let loaded = ldk_config::load_or_init(&path)?;
    if let LoadOutcome::Recovered { backup } = &loaded.outcome {
        eprintln!("WARN: settings were corrupt; moved to {}", backup.display());
    }
    Ok(loaded)
}

/// Desk over the migrated store named by `LDK_DATABASE_URL`.
pub async fn open_desk() -> Result<Desk> {
    let pool = ldk_db::connect_from_env().await?;
    ldk_db::migrate(&pool).await?;
    tracing::debug!("store ready");
    Ok(Desk::with_system_clock(pool))
}

// ---------------------------------------------------------------------------
// settings show
// ---------------------------------------------------------------------------

pub fn settings_show() -> Result<()> {
    let loaded = load_settings()?;
    println!("settings_hash={}", loaded.settings_hash);
    for p in &loaded.unused.unused_leaf_pointers {
        eprintln!("  unused={}", p);
    }
    println!("{}", loaded.canonical_json);
    Ok(())
}

// ---------------------------------------------------------------------------
// export
// ---------------------------------------------------------------------------

pub async fn export(catalog: &str) -> Result<()> {
    let catalog = Catalog::parse(catalog)?;
    let settings = load_settings()?.settings;
    let desk = open_desk().await?;

    let out = desk.export_unordered(catalog, &settings).await?;
    if out.fell_back {
        eprintln!("WARN: export directory unusable; wrote to working directory");
    }
    println!("export_path={}", out.path.display());
    println!("rows={} groups={}", out.rows, out.groups);
    Ok(())
}
