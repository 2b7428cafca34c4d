use common::{OrderKey, ShipmentId, Version};
use domain::ErrorKind;
use thiserror::Error;

/// Errors that can occur when interacting with the shipment store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The saved shipment was loaded at a version that is no longer current.
    #[error(
        "Concurrency conflict for shipment {shipment_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        shipment_id: ShipmentId,
        expected: Version,
        actual: Version,
    },

    /// Another shipment already exists for the order key.
    #[error("A shipment already exists for order {0}")]
    DuplicateOrderKey(OrderKey),

    /// The shipment was not found.
    #[error("Shipment not found: {0}")]
    NotFound(ShipmentId),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Returns the coarse category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::ConcurrencyConflict { .. } | StoreError::DuplicateOrderKey(_) => {
                ErrorKind::Conflict
            }
            StoreError::NotFound(_) => ErrorKind::NotFound,
            StoreError::Database(_) | StoreError::Migration(_) | StoreError::Serialization(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Returns true if reloading and retrying the operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::ConcurrencyConflict { .. })
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
