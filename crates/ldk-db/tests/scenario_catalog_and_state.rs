//! Scenario: clients, product suggestions and the notify_state map.

use chrono::{TimeZone, Utc};
use ldk_schemas::{Catalog, ClientDraft, NotFound, ReminderChannel};

#[tokio::test]
async fn client_crud_and_search() -> anyhow::Result<()> {
    let pool = ldk_db::connect_memory().await?;

    let a = ldk_db::insert_client(
        &pool,
        &ClientDraft {
            full_name: "Анна Смирнова".to_string(),
            phone_digits: "89161112233".to_string(),
        },
    )
    .await?;
    let b = ldk_db::insert_client(
        &pool,
        &ClientDraft {
            full_name: "Борис Котов".to_string(),
            phone_digits: "89035556677".to_string(),
        },
    )
    .await?;

    let all = ldk_db::list_clients(&pool, None).await?;
    assert_eq!(all.iter().map(|c| c.id).collect::<Vec<_>>(), vec![b.id, a.id]);

    let by_name = ldk_db::list_clients(&pool, Some("АННА")).await?;
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].id, a.id);

    let by_phone = ldk_db::list_clients(&pool, Some("5556")).await?;
    assert_eq!(by_phone[0].id, b.id);

    let updated = ldk_db::update_client(
        &pool,
        a.id,
        &ClientDraft {
            full_name: "Анна С.".to_string(),
            phone_digits: "89161112233".to_string(),
        },
    )
    .await?;
    assert_eq!(ldk_db::fetch_client(&pool, a.id).await?, updated);

    ldk_db::delete_client(&pool, a.id).await?;
    let err = ldk_db::fetch_client(&pool, a.id).await.unwrap_err();
    assert!(err.downcast_ref::<NotFound>().is_some());
    Ok(())
}

#[tokio::test]
async fn product_catalogs_are_independent() -> anyhow::Result<()> {
    let pool = ldk_db::connect_memory().await?;

    let m = ldk_db::insert_product(&pool, Catalog::Mkl, "Biofinity").await?;
    ldk_db::insert_product(&pool, Catalog::Meridian, "Ortho-K").await?;

    let mkl = ldk_db::list_products(&pool, Catalog::Mkl).await?;
    assert_eq!(mkl.len(), 1);
    assert_eq!(mkl[0].name, "Biofinity");

    ldk_db::rename_product(&pool, Catalog::Mkl, m.id, "Biofinity Toric").await?;
    assert_eq!(ldk_db::list_products(&pool, Catalog::Mkl).await?[0].name, "Biofinity Toric");

    ldk_db::delete_product(&pool, Catalog::Mkl, m.id).await?;
    assert!(ldk_db::list_products(&pool, Catalog::Mkl).await?.is_empty());
    assert_eq!(ldk_db::list_products(&pool, Catalog::Meridian).await?.len(), 1);
    assert!(ldk_db::delete_product(&pool, Catalog::Mkl, m.id).await.is_err());
    Ok(())
}

#[tokio::test]
async fn snooze_markers_upsert_per_channel() -> anyhow::Result<()> {
    let pool = ldk_db::connect_memory().await?;

    assert_eq!(ldk_db::get_snooze_raw(&pool, ReminderChannel::Mkl).await?, None);

    let t = Utc.with_ymd_and_hms(2025, 5, 6, 18, 30, 0).unwrap();
    ldk_db::put_snooze_until(&pool, ReminderChannel::Mkl, t).await?;
    ldk_db::put_snooze_until(&pool, ReminderChannel::Mkl, t).await?;
    assert_eq!(
        ldk_db::get_snooze_raw(&pool, ReminderChannel::Mkl).await?.as_deref(),
        Some("2025-05-06T18:30:00Z")
    );
    assert_eq!(ldk_db::get_snooze_raw(&pool, ReminderChannel::Meridian).await?, None);

    ldk_db::put_notify_state(&pool, "meridian_snooze_until", "garbage").await?;
    assert_eq!(
        ldk_db::get_notify_state(&pool, "meridian_snooze_until").await?.as_deref(),
        Some("garbage")
    );

    let st = ldk_db::status(&pool).await?;
    assert!(st.ok && st.has_orders_tables);
    Ok(())
}

#[tokio::test]
async fn file_database_survives_reconnect() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let url = format!("sqlite://{}", dir.path().join("data.db").display());

    let pool = ldk_db::connect(&url).await?;
    ldk_db::migrate(&pool).await?;
    ldk_db::insert_product(&pool, Catalog::Meridian, "Persisted").await?;
    pool.close().await;

    let pool = ldk_db::connect(&url).await?;
    ldk_db::migrate(&pool).await?;
    let names: Vec<_> = ldk_db::list_products(&pool, Catalog::Meridian)
        .await?
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["Persisted".to_string()]);
    Ok(())
}
