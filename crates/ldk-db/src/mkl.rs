//! MKL orders: one row per order, four-state lifecycle.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use ldk_schemas::{
    ExportExtra, ExportRow, LifecycleStatus, MklFilter, MklOrder, MklOrderDraft, MklStatus,
    NotFound, StatusStamp,
};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use crate::normalize_query;

const COLUMNS: &str =
    "id, fio, phone, product, sph, cyl, ax, bc, qty, status, status_changed_at, comment";

fn order_from_row(row: &SqliteRow) -> Result<MklOrder> {
    let status: String = row.try_get("status")?;
    Ok(MklOrder {
        id: row.try_get("id")?,
        fio: row.try_get("fio")?,
        phone_digits: row.try_get("phone")?,
        product_name: row.try_get("product")?,
        sph: row.try_get("sph")?,
        cyl: row.try_get("cyl")?,
        ax: row.try_get("ax")?,
        bc: row.try_get("bc")?,
        qty: row.try_get("qty")?,
        status: MklStatus::parse(&status)?,
        status_changed_at: row.try_get("status_changed_at")?,
        comment: row.try_get("comment")?,
    })
}

/// New orders always start NOT_ORDERED, stamped `now`.
pub async fn insert_mkl_order(
    pool: &SqlitePool,
    draft: &MklOrderDraft,
    now: DateTime<Utc>,
) -> Result<MklOrder> {
    let stamp = StatusStamp::<MklStatus>::initial(now);
    let id = sqlx::query(
        r#"
        insert into mkl_orders
            (fio, phone, product, sph, cyl, ax, bc, qty, status, status_changed_at, comment)
        values (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(&draft.fio)
    .bind(&draft.phone_digits)
    .bind(&draft.product_name)
    .bind(draft.sph)
    .bind(draft.cyl)
    .bind(draft.ax)
    .bind(draft.bc)
    .bind(draft.qty)
    .bind(stamp.status.as_str())
    .bind(stamp.changed_at)
    .bind(&draft.comment)
    .execute(pool)
    .await
    .context("insert_mkl_order failed")?
    .last_insert_rowid();

    fetch_mkl_order(pool, id).await
}

pub async fn fetch_mkl_order(pool: &SqlitePool, id: i64) -> Result<MklOrder> {
    let sql = format!("select {COLUMNS} from mkl_orders where id = ?1");
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("fetch_mkl_order failed")?
        .ok_or(NotFound::new("mkl order", id))?;
    order_from_row(&row)
}

/// Replace the editable fields. Status and its timestamp are untouched.
pub async fn update_mkl_order(pool: &SqlitePool, id: i64, draft: &MklOrderDraft) -> Result<MklOrder> {
    let res = sqlx::query(
        r#"
        update mkl_orders
        set fio = ?1, phone = ?2, product = ?3, sph = ?4, cyl = ?5,
            ax = ?6, bc = ?7, qty = ?8, comment = ?9
        where id = ?10
        "#,
    )
    .bind(&draft.fio)
    .bind(&draft.phone_digits)
    .bind(&draft.product_name)
    .bind(draft.sph)
    .bind(draft.cyl)
    .bind(draft.ax)
    .bind(draft.bc)
    .bind(draft.qty)
    .bind(&draft.comment)
    .bind(id)
    .execute(pool)
    .await
    .context("update_mkl_order failed")?;

    if res.rows_affected() == 0 {
        return Err(NotFound::new("mkl order", id).into());
    }
    fetch_mkl_order(pool, id).await
}

pub async fn delete_mkl_order(pool: &SqlitePool, id: i64) -> Result<()> {
    let res = sqlx::query("delete from mkl_orders where id = ?1")
        .bind(id)
        .execute(pool)
        .await
        .context("delete_mkl_order failed")?;
    if res.rows_affected() == 0 {
        return Err(NotFound::new("mkl order", id).into());
    }
    Ok(())
}

/// Persist a stamp produced by [`StatusStamp::transition`].
pub async fn set_mkl_status(
    pool: &SqlitePool,
    id: i64,
    stamp: StatusStamp<MklStatus>,
) -> Result<MklOrder> {
    let res = sqlx::query("update mkl_orders set status = ?1, status_changed_at = ?2 where id = ?3")
        .bind(stamp.status.as_str())
        .bind(stamp.changed_at)
        .bind(id)
        .execute(pool)
        .await
        .context("set_mkl_status failed")?;
    if res.rows_affected() == 0 {
        return Err(NotFound::new("mkl order", id).into());
    }
    fetch_mkl_order(pool, id).await
}

/// Every NOT_ORDERED order becomes ORDERED with one shared timestamp.
/// Returns how many rows changed.
pub async fn bulk_mark_mkl_ordered(pool: &SqlitePool, now: DateTime<Utc>) -> Result<u64> {
    // Every matched row sits at INITIAL, so they all share one transition.
    let from = MklStatus::INITIAL;
    let to = StatusStamp::<MklStatus>::initial(now).transition(MklStatus::Ordered, now);

    let mut tx = pool.begin().await.context("bulk_mark_mkl_ordered begin failed")?;

    let res = sqlx::query(
        "update mkl_orders set status = ?1, status_changed_at = ?2 where status = ?3",
    )
    .bind(to.status.as_str())
    .bind(to.changed_at)
    .bind(from.as_str())
    .execute(&mut *tx)
    .await
    .context("bulk_mark_mkl_ordered failed")?;

    tx.commit().await.context("bulk_mark_mkl_ordered commit failed")?;
    tracing::info!(catalog = "mkl", rows = res.rows_affected(), "bulk marked ordered");
    Ok(res.rows_affected())
}

/// Unfulfilled orders, newest first.
pub async fn mkl_not_ordered(pool: &SqlitePool) -> Result<Vec<MklOrder>> {
    let sql = format!("select {COLUMNS} from mkl_orders where status = ?1 order by id desc");
    let rows = sqlx::query(&sql)
        .bind(MklStatus::NotOrdered.as_str())
        .fetch_all(pool)
        .await
        .context("mkl_not_ordered failed")?;
    rows.iter().map(order_from_row).collect()
}

/// Export selection: unfulfilled orders in insertion order.
pub async fn mkl_export_rows(pool: &SqlitePool) -> Result<Vec<ExportRow>> {
    let sql = format!("select {COLUMNS} from mkl_orders where status = ?1 order by id asc");
    let rows = sqlx::query(&sql)
        .bind(MklStatus::NotOrdered.as_str())
        .fetch_all(pool)
        .await
        .context("mkl_export_rows failed")?;

    rows.iter()
        .map(|r| {
            let o = order_from_row(r)?;
            Ok(ExportRow {
                product_name: o.product_name,
                sph: Some(o.sph),
                cyl: o.cyl,
                ax: o.ax,
                extra: o.bc.map(ExportExtra::BaseCurve),
                qty: o.qty,
            })
        })
        .collect()
}

/// Newest first, optionally narrowed by status and a case-insensitive
/// substring over customer name, phone digits and product.
pub async fn list_mkl_orders(pool: &SqlitePool, filter: &MklFilter) -> Result<Vec<MklOrder>> {
    let rows = match filter.status {
        Some(st) => {
            let sql = format!("select {COLUMNS} from mkl_orders where status = ?1 order by id desc");
            sqlx::query(&sql).bind(st.as_str()).fetch_all(pool).await
        }
        None => {
            let sql = format!("select {COLUMNS} from mkl_orders order by id desc");
            sqlx::query(&sql).fetch_all(pool).await
        }
    }
    .context("list_mkl_orders failed")?;

    let orders = rows.iter().map(order_from_row).collect::<Result<Vec<_>>>()?;

    Ok(match normalize_query(filter.query.as_deref()) {
        None => orders,
        Some(q) => orders
            .into_iter()
            .filter(|o| {
                o.fio.to_lowercase().contains(&q)
                    || o.phone_digits.contains(&q)
                    || o.product_name.to_lowercase().contains(&q)
            })
            .collect(),
    })
}
