//! Scenario: MKL order lifecycle in the store.
//!
//! # Invariants under test
//!
//! - New orders start NOT_ORDERED with the creation time as their stamp.
//! - Field edits leave status and its timestamp untouched.
//! - Any status may move to any status; each move refreshes the stamp.
//! - Bulk mark touches only NOT_ORDERED rows and reports the count.
//! - Missing ids surface as `NotFound`.

use chrono::{Duration, TimeZone, Utc};
use ldk_schemas::{LifecycleStatus, MklFilter, MklOrderDraft, MklStatus, NotFound, StatusStamp};

fn draft(fio: &str, product: &str) -> MklOrderDraft {
    MklOrderDraft {
        fio: fio.to_string(),
        phone_digits: "89001234567".to_string(),
        product_name: product.to_string(),
        sph: -2.5,
        cyl: Some(-0.75),
        ax: Some(90),
        bc: Some(8.6),
        qty: 2,
        comment: String::new(),
    }
}

#[tokio::test]
async fn create_edit_and_move_status() -> anyhow::Result<()> {
    let pool = ldk_db::connect_memory().await?;
    let t0 = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();

    let o = ldk_db::insert_mkl_order(&pool, &draft("Иванов", "Acuvue Oasys"), t0).await?;
    assert_eq!(o.status, MklStatus::NotOrdered);
    assert_eq!(o.status_changed_at, t0);
    assert_eq!(o.bc, Some(8.6));

    let mut edited = draft("Иванов И.", "Acuvue Oasys");
    edited.qty = 4;
    let e = ldk_db::update_mkl_order(&pool, o.id, &edited).await?;
    assert_eq!(e.fio, "Иванов И.");
    assert_eq!(e.qty, 4);
    assert_eq!(e.status, MklStatus::NotOrdered);
    assert_eq!(e.status_changed_at, t0);

    let t1 = t0 + Duration::hours(3);
    let d = ldk_db::set_mkl_status(&pool, o.id, o.stamp().transition(MklStatus::Delivered, t1)).await?;
    assert_eq!(d.status, MklStatus::Delivered);
    assert_eq!(d.status_changed_at, t1);

    // Backwards moves are allowed.
    let t2 = t1 + Duration::hours(1);
    let back = ldk_db::set_mkl_status(&pool, o.id, d.stamp().transition(MklStatus::NotOrdered, t2)).await?;
    assert_eq!(back.status, MklStatus::NotOrdered);
    assert_eq!(back.status_changed_at, t2);
    Ok(())
}

#[tokio::test]
async fn bulk_mark_only_touches_not_ordered() -> anyhow::Result<()> {
    let pool = ldk_db::connect_memory().await?;
    let t0 = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();

    let a = ldk_db::insert_mkl_order(&pool, &draft("A", "X"), t0).await?;
    let b = ldk_db::insert_mkl_order(&pool, &draft("B", "Y"), t0).await?;
    let c = ldk_db::insert_mkl_order(&pool, &draft("C", "Z"), t0).await?;
    ldk_db::set_mkl_status(&pool, c.id, c.stamp().transition(MklStatus::Called, t0)).await?;

    let t1 = t0 + Duration::days(1);
    assert_eq!(ldk_db::bulk_mark_mkl_ordered(&pool, t1).await?, 2);

    for id in [a.id, b.id] {
        let o = ldk_db::fetch_mkl_order(&pool, id).await?;
        assert_eq!(o.status, MklStatus::Ordered);
        assert_eq!(o.status_changed_at, t1);
    }
    let c = ldk_db::fetch_mkl_order(&pool, c.id).await?;
    assert_eq!(c.status, MklStatus::Called);
    assert_eq!(c.status_changed_at, t0);

    assert_eq!(ldk_db::bulk_mark_mkl_ordered(&pool, t1).await?, 0);
    assert!(ldk_db::mkl_not_ordered(&pool).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn listing_filters_by_status_and_query() -> anyhow::Result<()> {
    let pool = ldk_db::connect_memory().await?;
    let t0 = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();

    let a = ldk_db::insert_mkl_order(&pool, &draft("Петров", "Biofinity"), t0).await?;
    let b = ldk_db::insert_mkl_order(&pool, &draft("Сидорова", "Air Optix"), t0).await?;
    ldk_db::set_mkl_status(&pool, a.id, a.stamp().transition(MklStatus::Ordered, t0)).await?;

    let all = ldk_db::list_mkl_orders(&pool, &MklFilter::default()).await?;
    assert_eq!(all.iter().map(|o| o.id).collect::<Vec<_>>(), vec![b.id, a.id]);

    let ordered = ldk_db::list_mkl_orders(
        &pool,
        &MklFilter {
            status: Some(MklStatus::Ordered),
            query: None,
        },
    )
    .await?;
    assert_eq!(ordered.len(), 1);
    assert_eq!(ordered[0].id, a.id);

    let q = ldk_db::list_mkl_orders(
        &pool,
        &MklFilter {
            status: None,
            query: Some("  сидор ".to_string()),
        },
    )
    .await?;
    assert_eq!(q.len(), 1);
    assert_eq!(q[0].id, b.id);

    let by_product = ldk_db::list_mkl_orders(
        &pool,
        &MklFilter {
            status: None,
            query: Some("BIOFIN".to_string()),
        },
    )
    .await?;
    assert_eq!(by_product.len(), 1);
    Ok(())
}

#[tokio::test]
async fn export_rows_are_unfulfilled_in_insertion_order() -> anyhow::Result<()> {
    let pool = ldk_db::connect_memory().await?;
    let t0 = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();

    let mut no_extra = draft("A", "First");
    no_extra.bc = None;
    ldk_db::insert_mkl_order(&pool, &no_extra, t0).await?;
    let skip = ldk_db::insert_mkl_order(&pool, &draft("B", "Skipped"), t0).await?;
    ldk_db::insert_mkl_order(&pool, &draft("C", "Third"), t0).await?;
    ldk_db::set_mkl_status(&pool, skip.id, skip.stamp().transition(MklStatus::Ordered, t0)).await?;

    let rows = ldk_db::mkl_export_rows(&pool).await?;
    let names: Vec<_> = rows.iter().map(|r| r.product_name.as_str()).collect();
    assert_eq!(names, vec!["First", "Third"]);
    assert_eq!(rows[0].extra, None);
    assert_eq!(rows[0].sph, Some(-2.5));
    Ok(())
}

#[tokio::test]
async fn missing_ids_are_not_found() -> anyhow::Result<()> {
    let pool = ldk_db::connect_memory().await?;
    let now = Utc::now();

    let err = ldk_db::set_mkl_status(&pool, 999, StatusStamp { status: MklStatus::Ordered, changed_at: now })
        .await
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<NotFound>(),
        Some(&NotFound::new("mkl order", 999))
    );
    assert!(ldk_db::delete_mkl_order(&pool, 999).await.is_err());
    assert!(ldk_db::update_mkl_order(&pool, 999, &draft("A", "B")).await.is_err());
    Ok(())
}

#[tokio::test]
async fn check_constraints_reject_out_of_range_rows() -> anyhow::Result<()> {
    let pool = ldk_db::connect_memory().await?;

    let bad_status = sqlx::query(
        r#"insert into mkl_orders (fio, phone, product, sph, qty, status, status_changed_at)
           values ('x', '1', 'p', 0.0, 1, 'LOST', '2025-01-01T00:00:00Z')"#,
    )
    .execute(&pool)
    .await;
    assert!(bad_status.is_err());

    let bad_qty = sqlx::query(
        r#"insert into mkl_orders (fio, phone, product, sph, qty, status, status_changed_at)
           values ('x', '1', 'p', 0.0, 21, 'NOT_ORDERED', '2025-01-01T00:00:00Z')"#,
    )
    .execute(&pool)
    .await;
    assert!(bad_qty.is_err());
    Ok(())
}

#[tokio::test]
async fn every_status_pair_round_trips_through_the_store() -> anyhow::Result<()> {
    let pool = ldk_db::connect_memory().await?;
    let t0 = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
    let o = ldk_db::insert_mkl_order(&pool, &draft("Пары", "Biofinity"), t0).await?;

    let mut now = t0;
    for &from in MklStatus::all() {
        for &to in MklStatus::all() {
            now += Duration::minutes(1);
            let reset = StatusStamp { status: from, changed_at: now };
            let cur = ldk_db::set_mkl_status(&pool, o.id, reset).await?;
            assert_eq!(cur.status, from);

            now += Duration::minutes(1);
            let next = ldk_db::set_mkl_status(&pool, o.id, cur.stamp().transition(to, now))
                .await?;
            assert_eq!(next.status, to, "{from:?} -> {to:?}");
            assert_eq!(next.status_changed_at, now, "{from:?} -> {to:?} must restamp");
        }
    }
    Ok(())
}
