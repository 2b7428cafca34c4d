//! Delivery error types.

use common::{OrderKey, ShipmentId};
use domain::{ErrorKind, ShipmentError};
use shipment_store::StoreError;
use thiserror::Error;

/// Errors that can occur during delivery orchestration.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Shipment not found, or soft-deleted.
    #[error("Shipment not found: {0}")]
    ShipmentNotFound(ShipmentId),

    /// A shipment already exists for the order.
    #[error("A shipment already exists for order {0}")]
    DuplicateShipment(OrderKey),

    /// A shipment or segment rule was violated.
    #[error("Shipment error: {0}")]
    Shipment(#[from] ShipmentError),

    /// Store error.
    #[error("Store error: {0}")]
    Store(StoreError),

    /// Driver assignment service error.
    #[error("Driver service error: {0}")]
    DriverService(String),

    /// Event publication error.
    #[error("Event publish error: {0}")]
    Publish(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Tracing subscriber could not be installed.
    #[error("Telemetry error: {0}")]
    Telemetry(String),
}

impl From<StoreError> for DeliveryError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound(id) => DeliveryError::ShipmentNotFound(id),
            StoreError::DuplicateOrderKey(key) => DeliveryError::DuplicateShipment(key),
            other => DeliveryError::Store(other),
        }
    }
}

impl DeliveryError {
    /// Returns the coarse category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DeliveryError::ShipmentNotFound(_) => ErrorKind::NotFound,
            DeliveryError::DuplicateShipment(_) => ErrorKind::Conflict,
            DeliveryError::Shipment(e) => e.kind(),
            DeliveryError::Store(e) => e.kind(),
            DeliveryError::DriverService(_) | DeliveryError::Publish(_) => {
                ErrorKind::ExternalCollaborator
            }
            DeliveryError::Config(_) | DeliveryError::Telemetry(_) => ErrorKind::Internal,
        }
    }

    /// Returns true if reloading and retrying the trigger may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DeliveryError::Store(e) if e.is_retryable())
    }
}

/// Convenience type alias for delivery results.
pub type Result<T> = std::result::Result<T, DeliveryError>;

#[cfg(test)]
mod tests {
    use common::Version;

    use super::*;

    #[test]
    fn test_store_errors_are_translated() {
        let id = ShipmentId::new();
        assert!(matches!(
            DeliveryError::from(StoreError::NotFound(id)),
            DeliveryError::ShipmentNotFound(found) if found == id
        ));
        assert!(matches!(
            DeliveryError::from(StoreError::DuplicateOrderKey(OrderKey::from("ORD-1"))),
            DeliveryError::DuplicateShipment(_)
        ));
    }

    #[test]
    fn test_kinds_and_retryability() {
        let conflict = DeliveryError::from(StoreError::ConcurrencyConflict {
            shipment_id: ShipmentId::new(),
            expected: Version::first(),
            actual: Version::new(2),
        });
        assert_eq!(conflict.kind(), ErrorKind::Conflict);
        assert!(conflict.is_retryable());

        let invalid = DeliveryError::from(ShipmentError::SegmentNotReady {
            index: 2,
            blocking: 0,
        });
        assert_eq!(invalid.kind(), ErrorKind::InvalidTransition);
        assert!(!invalid.is_retryable());

        assert_eq!(
            DeliveryError::DriverService("down".into()).kind(),
            ErrorKind::ExternalCollaborator
        );
    }
}
