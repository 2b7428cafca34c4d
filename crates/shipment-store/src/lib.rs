//! Persistence gateway for shipments.
//!
//! Shipments are saved whole, with an optimistic-concurrency version that
//! the store checks and increments on every save.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryShipmentStore;
pub use postgres::PostgresShipmentStore;
pub use query::{Page, ShipmentQuery};
pub use store::{ShipmentStore, ShipmentStoreExt};
