//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p shipment-store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use chrono::{Duration, Utc};
use common::{DriverId, HubId, OrderKey, Version};
use domain::{RouteHints, Shipment, ShipmentStatus, plan_segments};
use shipment_store::{PostgresShipmentStore, ShipmentQuery, ShipmentStore, StoreError};
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_shipments_table.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and an empty table
async fn get_test_store() -> PostgresShipmentStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE shipments")
        .execute(&pool)
        .await
        .unwrap();

    PostgresShipmentStore::new(pool)
}

fn new_shipment(order_key: &str) -> Shipment {
    let route = vec![HubId::from("H1"), HubId::from("H2"), HubId::from("H3")];
    let segments = plan_segments(
        &route,
        &RouteHints::parse(r#"[{"distanceM": 900, "durationMin": 12}]"#),
    )
    .unwrap();
    Shipment::create(
        OrderKey::from(order_key),
        route[0].clone(),
        route[2].clone(),
        segments,
        Some("it".to_string()),
        Utc::now(),
    )
    .unwrap()
}

#[tokio::test]
async fn save_and_find_roundtrip() {
    let store = get_test_store().await;
    let saved = store.save(new_shipment("ORD-1")).await.unwrap();
    assert_eq!(saved.version(), Version::first());

    let by_id = store.find_by_id(saved.id()).await.unwrap().unwrap();
    assert_eq!(by_id.id(), saved.id());
    assert_eq!(by_id.version(), Version::first());
    assert_eq!(by_id.total_segments(), 2);
    assert_eq!(by_id.total_estimated_duration_min(), 12);

    let by_key = store
        .find_by_order_key(&OrderKey::from("ORD-1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_key.id(), saved.id());
    assert!(
        store
            .exists_by_order_key(&OrderKey::from("ORD-1"))
            .await
            .unwrap()
    );
    assert!(
        !store
            .exists_by_order_key(&OrderKey::from("ORD-2"))
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn update_increments_version() {
    let store = get_test_store().await;
    let mut shipment = store.save(new_shipment("ORD-1")).await.unwrap();

    let now = Utc::now();
    shipment
        .assign_segment_driver(0, DriverId::from("drv-1"), now)
        .unwrap();
    shipment.depart_segment(0, now).unwrap();
    let saved = store.save(shipment).await.unwrap();
    assert_eq!(saved.version(), Version::new(2));

    let loaded = store.find_by_id(saved.id()).await.unwrap().unwrap();
    assert_eq!(loaded.status(), ShipmentStatus::InProgress);
    assert_eq!(loaded.version(), Version::new(2));
}

#[tokio::test]
async fn stale_update_is_a_conflict() {
    let store = get_test_store().await;
    let saved = store.save(new_shipment("ORD-1")).await.unwrap();

    let mut first = saved.clone();
    first.fail(Utc::now()).unwrap();
    store.save(first).await.unwrap();

    let mut stale = saved.clone();
    stale
        .assign_segment_driver(0, DriverId::from("drv-late"), Utc::now())
        .unwrap();
    let err = store.save(stale).await.unwrap_err();

    assert!(matches!(err, StoreError::ConcurrencyConflict { .. }));
    let stored = store.find_by_id(saved.id()).await.unwrap().unwrap();
    assert_eq!(stored.status(), ShipmentStatus::Failed);
    assert!(!stored.segment(0).unwrap().has_driver());
}

#[tokio::test]
async fn duplicate_order_key_is_rejected() {
    let store = get_test_store().await;
    store.save(new_shipment("ORD-1")).await.unwrap();

    let err = store.save(new_shipment("ORD-1")).await.unwrap_err();
    assert!(matches!(err, StoreError::DuplicateOrderKey(_)));
}

#[tokio::test]
async fn resaving_a_new_shipment_twice_is_a_conflict() {
    let store = get_test_store().await;
    let shipment = new_shipment("ORD-1");
    store.save(shipment.clone()).await.unwrap();

    let err = store.save(shipment).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::ConcurrencyConflict { actual, .. } if actual == Version::first()
    ));
}

#[tokio::test]
async fn list_filters_status_and_pages() {
    let store = get_test_store().await;

    let mut ids = Vec::new();
    for i in 0..4 {
        let mut shipment = new_shipment(&format!("ORD-{i}"));
        // Distinct creation times keep the ordering deterministic
        shipment = Shipment::create(
            shipment.order_key().clone(),
            shipment.origin_hub().clone(),
            shipment.destination_hub().clone(),
            shipment.segments().to_vec(),
            None,
            Utc::now() + Duration::seconds(i),
        )
        .unwrap();
        ids.push(store.save(shipment).await.unwrap().id());
    }

    let mut cancelled = store.find_by_id(ids[0]).await.unwrap().unwrap();
    cancelled.fail(Utc::now()).unwrap();
    store.save(cancelled).await.unwrap();

    let mut deleted = store.find_by_id(ids[1]).await.unwrap().unwrap();
    deleted.mark_deleted(Some("admin".to_string()), Utc::now()).unwrap();
    store.save(deleted).await.unwrap();

    let page = store.list(ShipmentQuery::new().limit(1)).await.unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].id(), ids[3]);
    assert!(page.has_more());

    let failed = store
        .list(ShipmentQuery::for_status(ShipmentStatus::Failed))
        .await
        .unwrap();
    assert_eq!(failed.total, 1);
    assert_eq!(failed.items[0].id(), ids[0]);

    let everything = store
        .list(ShipmentQuery::new().include_deleted())
        .await
        .unwrap();
    assert_eq!(everything.total, 4);
}

#[tokio::test]
async fn list_with_offset_past_i64_range_is_empty() {
    let store = get_test_store().await;
    store.save(new_shipment("ORD-FAR")).await.unwrap();

    let page = store
        .list(ShipmentQuery::new().offset(usize::MAX))
        .await
        .unwrap();

    assert!(page.items.is_empty());
    assert!(!page.has_more());
}
