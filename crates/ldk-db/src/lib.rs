//! ldk-db
//!
//! The Order Store: durable CRUD for clients, product catalogs, MKL orders,
//! Meridian orders + items and the snooze key/value map, on SQLite.
//!
//! # Invariants
//!
//! - Status is only ever written by `set_*_status`, `bulk_mark_*_ordered`
//!   and creation. Field edits never touch status or its timestamp.
//! - Deleting a Meridian order deletes its items in the same transaction.
//! - Mutations that address a missing row fail with [`NotFound`] and write
//!   nothing.

use std::str::FromStr;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

mod catalog;
mod meridian;
mod mkl;
mod snooze;

pub use catalog::{
    delete_client, delete_product, fetch_client, insert_client, insert_product, list_clients,
    list_products, rename_product, update_client,
};
pub use meridian::{
    bulk_mark_meridian_ordered, delete_meridian_item, delete_meridian_order, fetch_meridian_item,
    fetch_meridian_order, insert_meridian_item, insert_meridian_order, list_meridian_items,
    list_meridian_orders, meridian_export_rows, meridian_not_ordered, set_meridian_status,
    update_meridian_item,
};
pub use mkl::{
    bulk_mark_mkl_ordered, delete_mkl_order, fetch_mkl_order, insert_mkl_order, list_mkl_orders,
    mkl_export_rows, mkl_not_ordered, set_mkl_status, update_mkl_order,
};
pub use snooze::{get_notify_state, get_snooze_raw, put_notify_state, put_snooze_until};

pub use ldk_schemas::NotFound;

pub const ENV_DB_URL: &str = "LDK_DATABASE_URL";
pub const DEFAULT_DB_URL: &str = "sqlite://data.db?mode=rwc";

/// Connect using `LDK_DATABASE_URL`, falling back to `data.db` in the
/// working directory.
pub async fn connect_from_env() -> Result<SqlitePool> {
    let url = std::env::var(ENV_DB_URL).unwrap_or_else(|_| DEFAULT_DB_URL.to_string());
    connect(&url).await
}

pub async fn connect(url: &str) -> Result<SqlitePool> {
    let opts = SqliteConnectOptions::from_str(url)
        .with_context(|| format!("invalid sqlite url: {url}"))?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(opts)
        .await
        .context("failed to open sqlite database")?;

    Ok(pool)
}

/// Fresh, migrated in-memory store. A single connection, so every query
/// sees the same database.
pub async fn connect_memory() -> Result<SqlitePool> {
    let opts = SqliteConnectOptions::from_str("sqlite::memory:")
        .context("invalid in-memory sqlite url")?
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(opts)
        .await
        .context("failed to open in-memory sqlite")?;

    migrate(&pool).await?;
    Ok(pool)
}

/// Run embedded SQLx migrations.
pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("db migrate failed")?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct DbStatus {
    pub ok: bool,
    pub has_orders_tables: bool,
}

/// Simple status query (connectivity + schema presence).
pub async fn status(pool: &SqlitePool) -> Result<DbStatus> {
    let (one,): (i64,) = sqlx::query_as("select 1")
        .fetch_one(pool)
        .await
        .context("status connectivity query failed")?;

    let (n,): (i64,) = sqlx::query_as(
        r#"
        select count(*)
        from sqlite_master
        where type = 'table' and name in ('mkl_orders', 'meridian_orders', 'meridian_items')
        "#,
    )
    .fetch_one(pool)
    .await
    .context("status table-exists query failed")?;

    Ok(DbStatus {
        ok: one == 1,
        has_orders_tables: n == 3,
    })
}

/// Lowercased, trimmed search text; `None` when blank.
pub(crate) fn normalize_query(q: Option<&str>) -> Option<String> {
    q.map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty())
}
