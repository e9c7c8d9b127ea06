//! Clients and the two product suggestion catalogs.

use anyhow::{Context, Result};
use ldk_schemas::{Catalog, Client, ClientDraft, NotFound, ProductEntry};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use crate::normalize_query;

fn client_from_row(row: &SqliteRow) -> Result<Client> {
    Ok(Client {
        id: row.try_get("id")?,
        full_name: row.try_get("full_name")?,
        phone_digits: row.try_get("phone")?,
    })
}

/// Newest first. A non-blank `query` matches the lowercased name or the
/// phone digits as a substring.
pub async fn list_clients(pool: &SqlitePool, query: Option<&str>) -> Result<Vec<Client>> {
    let rows = sqlx::query("select id, full_name, phone from clients order by id desc")
        .fetch_all(pool)
        .await
        .context("list_clients failed")?;

    let clients = rows.iter().map(client_from_row).collect::<Result<Vec<_>>>()?;

    Ok(match normalize_query(query) {
        None => clients,
        Some(q) => clients
            .into_iter()
            .filter(|c| c.full_name.to_lowercase().contains(&q) || c.phone_digits.contains(&q))
            .collect(),
    })
}

pub async fn fetch_client(pool: &SqlitePool, id: i64) -> Result<Client> {
    let row = sqlx::query("select id, full_name, phone from clients where id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("fetch_client failed")?
        .ok_or(NotFound::new("client", id))?;
    client_from_row(&row)
}

pub async fn insert_client(pool: &SqlitePool, draft: &ClientDraft) -> Result<Client> {
    let id = sqlx::query("insert into clients (full_name, phone) values (?1, ?2)")
        .bind(&draft.full_name)
        .bind(&draft.phone_digits)
        .execute(pool)
        .await
        .context("insert_client failed")?
        .last_insert_rowid();

    Ok(Client {
        id,
        full_name: draft.full_name.clone(),
        phone_digits: draft.phone_digits.clone(),
    })
}

pub async fn update_client(pool: &SqlitePool, id: i64, draft: &ClientDraft) -> Result<Client> {
    let res = sqlx::query("update clients set full_name = ?1, phone = ?2 where id = ?3")
        .bind(&draft.full_name)
        .bind(&draft.phone_digits)
        .bind(id)
        .execute(pool)
        .await
        .context("update_client failed")?;
    if res.rows_affected() == 0 {
        return Err(NotFound::new("client", id).into());
    }
    Ok(Client {
        id,
        full_name: draft.full_name.clone(),
        phone_digits: draft.phone_digits.clone(),
    })
}

/// Orders keep their own copy of name/phone, so nothing cascades.
pub async fn delete_client(pool: &SqlitePool, id: i64) -> Result<()> {
    let res = sqlx::query("delete from clients where id = ?1")
        .bind(id)
        .execute(pool)
        .await
        .context("delete_client failed")?;
    if res.rows_affected() == 0 {
        return Err(NotFound::new("client", id).into());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

fn products_table(catalog: Catalog) -> &'static str {
    match catalog {
        Catalog::Mkl => "products_mkl",
        Catalog::Meridian => "products_meridian",
    }
}

/// Newest first.
pub async fn list_products(pool: &SqlitePool, catalog: Catalog) -> Result<Vec<ProductEntry>> {
    let sql = format!("select id, name from {} order by id desc", products_table(catalog));
    let rows = sqlx::query(&sql)
        .fetch_all(pool)
        .await
        .context("list_products failed")?;

    rows.iter()
        .map(|r| {
            Ok(ProductEntry {
                id: r.try_get("id")?,
                name: r.try_get("name")?,
            })
        })
        .collect()
}

pub async fn insert_product(pool: &SqlitePool, catalog: Catalog, name: &str) -> Result<ProductEntry> {
    let sql = format!("insert into {} (name) values (?1)", products_table(catalog));
    let id = sqlx::query(&sql)
        .bind(name)
        .execute(pool)
        .await
        .context("insert_product failed")?
        .last_insert_rowid();
    Ok(ProductEntry {
        id,
        name: name.to_string(),
    })
}

pub async fn rename_product(
    pool: &SqlitePool,
    catalog: Catalog,
    id: i64,
    name: &str,
) -> Result<ProductEntry> {
    let sql = format!("update {} set name = ?1 where id = ?2", products_table(catalog));
    let res = sqlx::query(&sql)
        .bind(name)
        .bind(id)
        .execute(pool)
        .await
        .context("rename_product failed")?;
    if res.rows_affected() == 0 {
        return Err(NotFound::new("product", id).into());
    }
    Ok(ProductEntry {
        id,
        name: name.to_string(),
    })
}

/// Orders copy the product name by value; deleting a suggestion never
/// touches them.
pub async fn delete_product(pool: &SqlitePool, catalog: Catalog, id: i64) -> Result<()> {
    let sql = format!("delete from {} where id = ?1", products_table(catalog));
    let res = sqlx::query(&sql)
        .bind(id)
        .execute(pool)
        .await
        .context("delete_product failed")?;
    if res.rows_affected() == 0 {
        return Err(NotFound::new("product", id).into());
    }
    Ok(())
}
