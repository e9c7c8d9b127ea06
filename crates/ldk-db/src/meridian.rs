//! Meridian orders: a titled header with a two-state lifecycle and any
//! number of line items.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use ldk_schemas::{
    ExportExtra, ExportRow, LifecycleStatus, MeridianFilter, MeridianItem, MeridianItemDraft,
    MeridianOrder, MeridianOrderSummary, MeridianStatus, NotFound, StatusStamp,
};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

fn order_from_row(row: &SqliteRow) -> Result<MeridianOrder> {
    let status: String = row.try_get("status")?;
    Ok(MeridianOrder {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        status: MeridianStatus::parse(&status)?,
        status_changed_at: row.try_get("status_changed_at")?,
    })
}

fn item_from_row(row: &SqliteRow) -> Result<MeridianItem> {
    Ok(MeridianItem {
        id: row.try_get("id")?,
        order_id: row.try_get("order_id")?,
        product_name: row.try_get("product")?,
        sph: row.try_get("sph")?,
        cyl: row.try_get("cyl")?,
        ax: row.try_get("ax")?,
        diameter: row.try_get("d")?,
        qty: row.try_get("qty")?,
    })
}

/// Create an empty order titled `Order #<max id + 1>`. Title allocation
/// and insert share one transaction.
pub async fn insert_meridian_order(pool: &SqlitePool, now: DateTime<Utc>) -> Result<MeridianOrder> {
    let stamp = StatusStamp::<MeridianStatus>::initial(now);
    let mut tx = pool.begin().await.context("insert_meridian_order begin failed")?;

    let (max_id,): (Option<i64>,) = sqlx::query_as("select max(id) from meridian_orders")
        .fetch_one(&mut *tx)
        .await
        .context("insert_meridian_order max(id) failed")?;
    let title = format!("Order #{}", max_id.unwrap_or(0) + 1);

    let id = sqlx::query(
        "insert into meridian_orders (title, status, status_changed_at) values (?1, ?2, ?3)",
    )
    .bind(&title)
    .bind(stamp.status.as_str())
    .bind(stamp.changed_at)
    .execute(&mut *tx)
    .await
    .context("insert_meridian_order failed")?
    .last_insert_rowid();

    tx.commit().await.context("insert_meridian_order commit failed")?;

    Ok(MeridianOrder {
        id,
        title,
        status: stamp.status,
        status_changed_at: stamp.changed_at,
    })
}

pub async fn fetch_meridian_order(pool: &SqlitePool, id: i64) -> Result<MeridianOrder> {
    let row = sqlx::query("select id, title, status, status_changed_at from meridian_orders where id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("fetch_meridian_order failed")?
        .ok_or(NotFound::new("meridian order", id))?;
    order_from_row(&row)
}

/// Removes the order and all of its items atomically.
pub async fn delete_meridian_order(pool: &SqlitePool, id: i64) -> Result<()> {
    let mut tx = pool.begin().await.context("delete_meridian_order begin failed")?;

    sqlx::query("delete from meridian_items where order_id = ?1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("delete_meridian_order items failed")?;

    let res = sqlx::query("delete from meridian_orders where id = ?1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("delete_meridian_order failed")?;

    if res.rows_affected() == 0 {
        // Dropping `tx` rolls back.
        return Err(NotFound::new("meridian order", id).into());
    }

    tx.commit().await.context("delete_meridian_order commit failed")?;
    Ok(())
}

/// Persist a stamp produced by [`StatusStamp::transition`].
pub async fn set_meridian_status(
    pool: &SqlitePool,
    id: i64,
    stamp: StatusStamp<MeridianStatus>,
) -> Result<MeridianOrder> {
    let res = sqlx::query(
        "update meridian_orders set status = ?1, status_changed_at = ?2 where id = ?3",
    )
    .bind(stamp.status.as_str())
    .bind(stamp.changed_at)
    .bind(id)
    .execute(pool)
    .await
    .context("set_meridian_status failed")?;
    if res.rows_affected() == 0 {
        return Err(NotFound::new("meridian order", id).into());
    }
    fetch_meridian_order(pool, id).await
}

pub async fn bulk_mark_meridian_ordered(pool: &SqlitePool, now: DateTime<Utc>) -> Result<u64> {
    let from = MeridianStatus::INITIAL;
    let to = StatusStamp::<MeridianStatus>::initial(now).transition(MeridianStatus::Ordered, now);

    let mut tx = pool
        .begin()
        .await
        .context("bulk_mark_meridian_ordered begin failed")?;

    let res = sqlx::query(
        "update meridian_orders set status = ?1, status_changed_at = ?2 where status = ?3",
    )
    .bind(to.status.as_str())
    .bind(to.changed_at)
    .bind(from.as_str())
    .execute(&mut *tx)
    .await
    .context("bulk_mark_meridian_ordered failed")?;

    tx.commit()
        .await
        .context("bulk_mark_meridian_ordered commit failed")?;
    tracing::info!(catalog = "meridian", rows = res.rows_affected(), "bulk marked ordered");
    Ok(res.rows_affected())
}

/// Unfulfilled orders, newest first.
pub async fn meridian_not_ordered(pool: &SqlitePool) -> Result<Vec<MeridianOrder>> {
    let rows = sqlx::query(
        r#"
        select id, title, status, status_changed_at
        from meridian_orders
        where status = ?1
        order by id desc
        "#,
    )
    .bind(MeridianStatus::NotOrdered.as_str())
    .fetch_all(pool)
    .await
    .context("meridian_not_ordered failed")?;
    rows.iter().map(order_from_row).collect()
}

/// Headers with their item counts, newest first.
pub async fn list_meridian_orders(
    pool: &SqlitePool,
    filter: &MeridianFilter,
) -> Result<Vec<MeridianOrderSummary>> {
    let rows = sqlx::query(
        r#"
        select o.id, o.title, o.status, o.status_changed_at,
               (select count(*) from meridian_items i where i.order_id = o.id) as item_count
        from meridian_orders o
        where ?1 is null or o.status = ?1
        order by o.id desc
        "#,
    )
    .bind(filter.status.map(|s| s.as_str()))
    .fetch_all(pool)
    .await
    .context("list_meridian_orders failed")?;

    rows.iter()
        .map(|r| {
            Ok(MeridianOrderSummary {
                order: order_from_row(r)?,
                item_count: r.try_get("item_count")?,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

const ITEM_COLUMNS: &str = "id, order_id, product, sph, cyl, ax, d, qty";

async fn ensure_order_exists(pool: &SqlitePool, order_id: i64) -> Result<()> {
    let (n,): (i64,) = sqlx::query_as("select count(*) from meridian_orders where id = ?1")
        .bind(order_id)
        .fetch_one(pool)
        .await
        .context("meridian order lookup failed")?;
    if n == 0 {
        return Err(NotFound::new("meridian order", order_id).into());
    }
    Ok(())
}

/// Adding an item does not change the order's status.
pub async fn insert_meridian_item(
    pool: &SqlitePool,
    order_id: i64,
    draft: &MeridianItemDraft,
) -> Result<MeridianItem> {
    ensure_order_exists(pool, order_id).await?;

    let id = sqlx::query(
        r#"
        insert into meridian_items (order_id, product, sph, cyl, ax, d, qty)
        values (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(order_id)
    .bind(&draft.product_name)
    .bind(draft.sph)
    .bind(draft.cyl)
    .bind(draft.ax)
    .bind(draft.diameter)
    .bind(draft.qty)
    .execute(pool)
    .await
    .context("insert_meridian_item failed")?
    .last_insert_rowid();

    fetch_meridian_item(pool, id).await
}

pub async fn fetch_meridian_item(pool: &SqlitePool, id: i64) -> Result<MeridianItem> {
    let sql = format!("select {ITEM_COLUMNS} from meridian_items where id = ?1");
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("fetch_meridian_item failed")?
        .ok_or(NotFound::new("meridian item", id))?;
    item_from_row(&row)
}

pub async fn update_meridian_item(
    pool: &SqlitePool,
    id: i64,
    draft: &MeridianItemDraft,
) -> Result<MeridianItem> {
    let res = sqlx::query(
        r#"
        update meridian_items
        set product = ?1, sph = ?2, cyl = ?3, ax = ?4, d = ?5, qty = ?6
        where id = ?7
        "#,
    )
    .bind(&draft.product_name)
    .bind(draft.sph)
    .bind(draft.cyl)
    .bind(draft.ax)
    .bind(draft.diameter)
    .bind(draft.qty)
    .bind(id)
    .execute(pool)
    .await
    .context("update_meridian_item failed")?;
    if res.rows_affected() == 0 {
        return Err(NotFound::new("meridian item", id).into());
    }
    fetch_meridian_item(pool, id).await
}

pub async fn delete_meridian_item(pool: &SqlitePool, id: i64) -> Result<()> {
    let res = sqlx::query("delete from meridian_items where id = ?1")
        .bind(id)
        .execute(pool)
        .await
        .context("delete_meridian_item failed")?;
    if res.rows_affected() == 0 {
        return Err(NotFound::new("meridian item", id).into());
    }
    Ok(())
}

/// Items of one order in insertion order.
pub async fn list_meridian_items(pool: &SqlitePool, order_id: i64) -> Result<Vec<MeridianItem>> {
    ensure_order_exists(pool, order_id).await?;

    let sql = format!("select {ITEM_COLUMNS} from meridian_items where order_id = ?1 order by id asc");
    let rows = sqlx::query(&sql)
        .bind(order_id)
        .fetch_all(pool)
        .await
        .context("list_meridian_items failed")?;
    rows.iter().map(item_from_row).collect()
}

/// Export selection: every item of every unfulfilled order, by order then
/// item insertion order.
pub async fn meridian_export_rows(pool: &SqlitePool) -> Result<Vec<ExportRow>> {
    let rows = sqlx::query(
        r#"
        select i.id, i.order_id, i.product, i.sph, i.cyl, i.ax, i.d, i.qty
        from meridian_items i
        join meridian_orders o on o.id = i.order_id
        where o.status = ?1
        order by o.id asc, i.id asc
        "#,
    )
    .bind(MeridianStatus::NotOrdered.as_str())
    .fetch_all(pool)
    .await
    .context("meridian_export_rows failed")?;

    rows.iter()
        .map(|r| {
            let it = item_from_row(r)?;
            Ok(ExportRow {
                product_name: it.product_name,
                sph: it.sph,
                cyl: it.cyl,
                ax: it.ax,
                extra: it.diameter.map(ExportExtra::Diameter),
                qty: it.qty,
            })
        })
        .collect()
}
