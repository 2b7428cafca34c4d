//! Shared identifier types for the hub delivery workspace.

mod types;

pub use types::{DriverId, HubId, OrderKey, ShipmentId, Version};
