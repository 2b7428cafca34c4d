//! Driver assignment client trait and in-memory implementation.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use common::{DriverId, ShipmentId};
use tokio::sync::RwLock;

use crate::error::{DeliveryError, Result};

/// Answer of the driver service to a driver request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverAssignment {
    /// A driver was reserved for the shipment.
    Assigned {
        driver_id: DriverId,
        driver_name: Option<String>,
    },

    /// No driver is available right now.
    Unavailable { reason: Option<String> },
}

/// Trait for the external driver assignment service.
///
/// Every call may fail independently; the orchestrator decides which
/// failures are fatal.
#[async_trait]
pub trait DriverAssignmentClient: Send + Sync {
    /// Requests a driver scoped to a shipment.
    async fn request_driver(&self, shipment_id: ShipmentId) -> Result<DriverAssignment>;

    /// Tells a driver their segment is done.
    async fn notify_complete(
        &self,
        driver_id: &DriverId,
        actual_duration_min: Option<i64>,
    ) -> Result<()>;

    /// Tells a driver their segment was cancelled.
    async fn notify_cancel(&self, driver_id: &DriverId) -> Result<()>;
}

#[derive(Debug, Default)]
struct InMemoryDriverState {
    next_id: u32,
    requests: Vec<ShipmentId>,
    completions: Vec<(DriverId, Option<i64>)>,
    cancellations: Vec<DriverId>,
    unavailable: bool,
    fail_on_request: bool,
    fail_on_complete: bool,
    fail_cancel_for: HashSet<DriverId>,
}

/// In-memory driver service for testing.
///
/// Hands out sequential driver ids (`DRV-0001`, `DRV-0002`, ...) and
/// records every notice it receives.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDriverClient {
    state: Arc<RwLock<InMemoryDriverState>>,
}

impl InMemoryDriverClient {
    /// Creates a new in-memory driver client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes requests answer "no driver available".
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.write().await.unavailable = unavailable;
    }

    /// Makes requests fail with a service error.
    pub async fn set_fail_on_request(&self, fail: bool) {
        self.state.write().await.fail_on_request = fail;
    }

    /// Makes completion notices fail.
    pub async fn set_fail_on_complete(&self, fail: bool) {
        self.state.write().await.fail_on_complete = fail;
    }

    /// Makes cancel notices to one driver fail.
    pub async fn fail_cancel_for(&self, driver_id: DriverId) {
        self.state.write().await.fail_cancel_for.insert(driver_id);
    }

    /// Returns the number of driver requests received.
    pub async fn request_count(&self) -> usize {
        self.state.read().await.requests.len()
    }

    /// Returns the completion notices received, in order.
    pub async fn completions(&self) -> Vec<(DriverId, Option<i64>)> {
        self.state.read().await.completions.clone()
    }

    /// Returns the drivers that received a cancel notice, in order.
    pub async fn cancellations(&self) -> Vec<DriverId> {
        self.state.read().await.cancellations.clone()
    }
}

#[async_trait]
impl DriverAssignmentClient for InMemoryDriverClient {
    async fn request_driver(&self, shipment_id: ShipmentId) -> Result<DriverAssignment> {
        let mut state = self.state.write().await;
        state.requests.push(shipment_id);

        if state.fail_on_request {
            return Err(DeliveryError::DriverService(
                "Driver service unavailable".to_string(),
            ));
        }

        if state.unavailable {
            return Ok(DriverAssignment::Unavailable {
                reason: Some("No driver available".to_string()),
            });
        }

        state.next_id += 1;
        Ok(DriverAssignment::Assigned {
            driver_id: DriverId::new(format!("DRV-{:04}", state.next_id)),
            driver_name: Some(format!("Driver {}", state.next_id)),
        })
    }

    async fn notify_complete(
        &self,
        driver_id: &DriverId,
        actual_duration_min: Option<i64>,
    ) -> Result<()> {
        let mut state = self.state.write().await;

        if state.fail_on_complete {
            return Err(DeliveryError::DriverService(format!(
                "Completion notice to {driver_id} rejected"
            )));
        }

        state
            .completions
            .push((driver_id.clone(), actual_duration_min));
        Ok(())
    }

    async fn notify_cancel(&self, driver_id: &DriverId) -> Result<()> {
        let mut state = self.state.write().await;

        if state.fail_cancel_for.contains(driver_id) {
            return Err(DeliveryError::DriverService(format!(
                "Cancel notice to {driver_id} rejected"
            )));
        }

        state.cancellations.push(driver_id.clone());
        Ok(())
    }
}
