//! Shipment commands.

use common::{DriverId, HubId, OrderKey, ShipmentId};

use super::RouteHints;

/// Command to create a shipment for an order.
#[derive(Debug, Clone)]
pub struct CreateShipment {
    /// Business key of the originating order.
    pub order_key: OrderKey,

    pub origin_hub: HubId,

    pub destination_hub: HubId,

    /// Ordered hubs from origin to destination, inclusive.
    pub route: Vec<HubId>,

    /// Per-leg estimates, possibly empty.
    pub route_hints: RouteHints,

    pub created_by: Option<String>,
}

impl CreateShipment {
    /// Creates a command for the given order and route.
    pub fn new(
        order_key: impl Into<OrderKey>,
        origin_hub: impl Into<HubId>,
        destination_hub: impl Into<HubId>,
        route: Vec<HubId>,
    ) -> Self {
        Self {
            order_key: order_key.into(),
            origin_hub: origin_hub.into(),
            destination_hub: destination_hub.into(),
            route,
            route_hints: RouteHints::none(),
            created_by: None,
        }
    }

    /// Creates a command whose route is only origin and destination.
    pub fn direct(
        order_key: impl Into<OrderKey>,
        origin_hub: impl Into<HubId>,
        destination_hub: impl Into<HubId>,
    ) -> Self {
        let origin_hub = origin_hub.into();
        let destination_hub = destination_hub.into();
        let route = vec![origin_hub.clone(), destination_hub.clone()];
        Self::new(order_key, origin_hub, destination_hub, route)
    }

    pub fn with_hints(mut self, route_hints: RouteHints) -> Self {
        self.route_hints = route_hints;
        self
    }

    pub fn created_by(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = Some(created_by.into());
        self
    }
}

/// Command to request a driver for a segment and depart it.
#[derive(Debug, Clone)]
pub struct AssignSegmentDriver {
    pub shipment_id: ShipmentId,
    pub segment_index: usize,
}

impl AssignSegmentDriver {
    pub fn new(shipment_id: ShipmentId, segment_index: usize) -> Self {
        Self {
            shipment_id,
            segment_index,
        }
    }
}

/// Command to depart a segment directly.
#[derive(Debug, Clone)]
pub struct DepartSegment {
    pub shipment_id: ShipmentId,
    pub segment_index: usize,

    /// Driver to bind first when the segment has none yet.
    pub driver_id: Option<DriverId>,
}

impl DepartSegment {
    pub fn new(shipment_id: ShipmentId, segment_index: usize) -> Self {
        Self {
            shipment_id,
            segment_index,
            driver_id: None,
        }
    }

    pub fn with_driver(mut self, driver_id: impl Into<DriverId>) -> Self {
        self.driver_id = Some(driver_id.into());
        self
    }
}

/// Command to record a segment's arrival.
#[derive(Debug, Clone)]
pub struct ArriveSegment {
    pub shipment_id: ShipmentId,
    pub segment_index: usize,
}

impl ArriveSegment {
    pub fn new(shipment_id: ShipmentId, segment_index: usize) -> Self {
        Self {
            shipment_id,
            segment_index,
        }
    }
}

/// Command to cancel a shipment.
#[derive(Debug, Clone)]
pub struct CancelShipment {
    pub shipment_id: ShipmentId,

    /// Free-form reason, logged only.
    pub reason: Option<String>,
}

impl CancelShipment {
    pub fn new(shipment_id: ShipmentId) -> Self {
        Self {
            shipment_id,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}
