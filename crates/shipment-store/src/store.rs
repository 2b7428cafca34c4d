use async_trait::async_trait;
use common::{OrderKey, ShipmentId};
use domain::Shipment;

use crate::{Page, Result, ShipmentQuery, StoreError};

/// Core trait for shipment persistence.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait ShipmentStore: Send + Sync {
    /// Saves a shipment.
    ///
    /// The shipment's version must equal the stored version (0 for a new
    /// shipment), otherwise the save fails with `ConcurrencyConflict` and the
    /// stored record is unchanged. A new shipment whose order key is taken
    /// fails with `DuplicateOrderKey`.
    ///
    /// Returns the shipment at its new version.
    async fn save(&self, shipment: Shipment) -> Result<Shipment>;

    /// Retrieves a shipment by id, including soft-deleted ones.
    async fn find_by_id(&self, id: ShipmentId) -> Result<Option<Shipment>>;

    /// Retrieves the shipment created for an order, including soft-deleted ones.
    async fn find_by_order_key(&self, order_key: &OrderKey) -> Result<Option<Shipment>>;

    /// Returns true if any shipment, deleted or not, holds the order key.
    async fn exists_by_order_key(&self, order_key: &OrderKey) -> Result<bool>;

    /// Lists shipments, newest first.
    async fn list(&self, query: ShipmentQuery) -> Result<Page<Shipment>>;
}

/// Extension trait providing convenience methods for shipment stores.
#[async_trait]
pub trait ShipmentStoreExt: ShipmentStore {
    /// Loads a shipment that exists and is not soft-deleted.
    async fn load_active(&self, id: ShipmentId) -> Result<Shipment> {
        match self.find_by_id(id).await? {
            Some(shipment) if !shipment.is_deleted() => Ok(shipment),
            _ => Err(StoreError::NotFound(id)),
        }
    }
}

impl<T: ShipmentStore + ?Sized> ShipmentStoreExt for T {}
