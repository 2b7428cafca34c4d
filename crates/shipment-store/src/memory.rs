use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderKey, ShipmentId, Version};
use domain::Shipment;
use tokio::sync::RwLock;

use crate::{Page, Result, ShipmentQuery, StoreError, store::ShipmentStore};

#[derive(Default)]
struct Records {
    shipments: HashMap<ShipmentId, Shipment>,
    order_keys: HashMap<OrderKey, ShipmentId>,
}

/// In-memory shipment store for tests and embedding.
///
/// Enforces the same version and order-key rules as the PostgreSQL store.
#[derive(Clone, Default)]
pub struct InMemoryShipmentStore {
    records: Arc<RwLock<Records>>,
}

impl InMemoryShipmentStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored shipments, deleted ones included.
    pub async fn shipment_count(&self) -> usize {
        self.records.read().await.shipments.len()
    }

    /// Clears all shipments.
    pub async fn clear(&self) {
        let mut records = self.records.write().await;
        records.shipments.clear();
        records.order_keys.clear();
    }
}

#[async_trait]
impl ShipmentStore for InMemoryShipmentStore {
    async fn save(&self, mut shipment: Shipment) -> Result<Shipment> {
        let id = shipment.id();
        let expected = shipment.version();

        let mut records = self.records.write().await;

        let actual = records
            .shipments
            .get(&id)
            .map(Shipment::version)
            .unwrap_or(Version::initial());

        if actual != expected {
            return Err(StoreError::ConcurrencyConflict {
                shipment_id: id,
                expected,
                actual,
            });
        }

        if let Some(owner) = records.order_keys.get(shipment.order_key())
            && *owner != id
        {
            return Err(StoreError::DuplicateOrderKey(shipment.order_key().clone()));
        }

        shipment.set_version(expected.next());
        records
            .order_keys
            .insert(shipment.order_key().clone(), id);
        records.shipments.insert(id, shipment.clone());

        tracing::debug!(shipment_id = %id, version = %shipment.version(), "shipment saved");
        Ok(shipment)
    }

    async fn find_by_id(&self, id: ShipmentId) -> Result<Option<Shipment>> {
        Ok(self.records.read().await.shipments.get(&id).cloned())
    }

    async fn find_by_order_key(&self, order_key: &OrderKey) -> Result<Option<Shipment>> {
        let records = self.records.read().await;
        Ok(records
            .order_keys
            .get(order_key)
            .and_then(|id| records.shipments.get(id))
            .cloned())
    }

    async fn exists_by_order_key(&self, order_key: &OrderKey) -> Result<bool> {
        Ok(self.records.read().await.order_keys.contains_key(order_key))
    }

    async fn list(&self, query: ShipmentQuery) -> Result<Page<Shipment>> {
        let records = self.records.read().await;
        let mut matches: Vec<&Shipment> = records
            .shipments
            .values()
            .filter(|s| query.include_deleted || !s.is_deleted())
            .filter(|s| query.status.is_none_or(|status| s.status() == status))
            .collect();

        matches.sort_by(|a, b| {
            b.audit()
                .created_at
                .cmp(&a.audit().created_at)
                .then_with(|| b.id().as_uuid().cmp(&a.id().as_uuid()))
        });

        let limit = query.effective_limit();
        Ok(Page {
            total: matches.len(),
            items: matches
                .into_iter()
                .skip(query.offset)
                .take(limit)
                .cloned()
                .collect(),
            offset: query.offset,
            limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use common::{DriverId, HubId};
    use domain::{RouteHints, ShipmentStatus, plan_segments};

    use super::*;
    use crate::ShipmentStoreExt;

    fn new_shipment(order_key: &str) -> Shipment {
        new_shipment_at(order_key, Utc::now())
    }

    fn new_shipment_at(order_key: &str, at: chrono::DateTime<Utc>) -> Shipment {
        let route = vec![HubId::from("H1"), HubId::from("H2")];
        let segments = plan_segments(&route, &RouteHints::none()).unwrap();
        Shipment::create(
            OrderKey::from(order_key),
            route[0].clone(),
            route[1].clone(),
            segments,
            None,
            at,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn save_new_shipment_sets_first_version() {
        let store = InMemoryShipmentStore::new();
        let saved = store.save(new_shipment("ORD-1")).await.unwrap();

        assert_eq!(saved.version(), Version::first());
        assert_eq!(store.shipment_count().await, 1);
        assert!(
            store
                .exists_by_order_key(&OrderKey::from("ORD-1"))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn save_increments_version() {
        let store = InMemoryShipmentStore::new();
        let mut shipment = store.save(new_shipment("ORD-1")).await.unwrap();

        shipment
            .assign_segment_driver(0, DriverId::from("drv-1"), Utc::now())
            .unwrap();
        let saved = store.save(shipment).await.unwrap();

        assert_eq!(saved.version(), Version::new(2));
        let loaded = store.find_by_id(saved.id()).await.unwrap().unwrap();
        assert_eq!(loaded, saved);
    }

    #[tokio::test]
    async fn stale_save_is_rejected_and_record_unchanged() {
        let store = InMemoryShipmentStore::new();
        let saved = store.save(new_shipment("ORD-1")).await.unwrap();

        let mut first = saved.clone();
        let mut second = saved.clone();
        first
            .assign_segment_driver(0, DriverId::from("drv-a"), Utc::now())
            .unwrap();
        second
            .assign_segment_driver(0, DriverId::from("drv-b"), Utc::now())
            .unwrap();

        store.save(first).await.unwrap();
        let err = store.save(second).await.unwrap_err();

        assert!(matches!(
            err,
            StoreError::ConcurrencyConflict {
                expected,
                actual,
                ..
            } if expected == Version::first() && actual == Version::new(2)
        ));
        assert!(err.is_retryable());

        let stored = store.find_by_id(saved.id()).await.unwrap().unwrap();
        assert_eq!(
            stored.segment(0).unwrap().driver_id(),
            Some(&DriverId::from("drv-a"))
        );
    }

    #[tokio::test]
    async fn duplicate_order_key_is_rejected() {
        let store = InMemoryShipmentStore::new();
        store.save(new_shipment("ORD-1")).await.unwrap();

        let err = store.save(new_shipment("ORD-1")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateOrderKey(_)));
        assert_eq!(store.shipment_count().await, 1);
    }

    #[tokio::test]
    async fn find_by_order_key() {
        let store = InMemoryShipmentStore::new();
        let saved = store.save(new_shipment("ORD-7")).await.unwrap();

        let found = store
            .find_by_order_key(&OrderKey::from("ORD-7"))
            .await
            .unwrap();
        assert_eq!(found.map(|s| s.id()), Some(saved.id()));
        assert!(
            store
                .find_by_order_key(&OrderKey::from("ORD-8"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn list_newest_first_with_paging() {
        let store = InMemoryShipmentStore::new();
        let base = Utc::now();
        for i in 0..5 {
            store
                .save(new_shipment_at(
                    &format!("ORD-{i}"),
                    base + Duration::seconds(i),
                ))
                .await
                .unwrap();
        }

        let page = store
            .list(ShipmentQuery::new().offset(1).limit(2))
            .await
            .unwrap();
        let keys: Vec<_> = page
            .items
            .iter()
            .map(|s| s.order_key().to_string())
            .collect();

        assert_eq!(keys, vec!["ORD-3", "ORD-2"]);
        assert_eq!(page.total, 5);
        assert!(page.has_more());
    }

    #[tokio::test]
    async fn list_filters_status_and_deleted() {
        let store = InMemoryShipmentStore::new();
        let keep = store.save(new_shipment("ORD-1")).await.unwrap();
        let mut failed = store.save(new_shipment("ORD-2")).await.unwrap();
        failed.fail(Utc::now()).unwrap();
        store.save(failed).await.unwrap();
        let mut deleted = store.save(new_shipment("ORD-3")).await.unwrap();
        deleted.mark_deleted(None, Utc::now()).unwrap();
        let deleted = store.save(deleted).await.unwrap();

        let created = store
            .list(ShipmentQuery::for_status(ShipmentStatus::Created))
            .await
            .unwrap();
        assert_eq!(created.items.len(), 1);
        assert_eq!(created.items[0].id(), keep.id());

        let all = store.list(ShipmentQuery::new()).await.unwrap();
        assert_eq!(all.total, 2);

        let with_deleted = store
            .list(ShipmentQuery::new().include_deleted())
            .await
            .unwrap();
        assert_eq!(with_deleted.total, 3);

        assert!(matches!(
            store.load_active(deleted.id()).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(store.load_active(keep.id()).await.is_ok());
    }
}
