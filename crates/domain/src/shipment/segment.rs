//! A single leg between two hubs.

use chrono::{DateTime, Utc};
use common::{DriverId, HubId};
use serde::{Deserialize, Serialize};

use super::{SegmentStatus, ShipmentError};

/// One directed leg of a shipment.
///
/// Segments are values: every transition returns a new `Segment` and leaves
/// the receiver untouched. Only the owning [`Shipment`](super::Shipment)
/// swaps the new value in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    sequence: usize,
    from_hub: HubId,
    to_hub: HubId,
    estimated_distance_m: Option<u64>,
    estimated_duration_min: Option<u64>,
    driver_id: Option<DriverId>,
    departed_at: Option<DateTime<Utc>>,
    arrived_at: Option<DateTime<Utc>>,
    actual_duration_min: Option<i64>,
    status: SegmentStatus,
}

impl Segment {
    /// Creates a pending segment with no driver and no timestamps.
    pub fn create(
        sequence: usize,
        from_hub: HubId,
        to_hub: HubId,
        estimated_distance_m: Option<u64>,
        estimated_duration_min: Option<u64>,
    ) -> Self {
        Self {
            sequence,
            from_hub,
            to_hub,
            estimated_distance_m,
            estimated_duration_min,
            driver_id: None,
            departed_at: None,
            arrived_at: None,
            actual_duration_min: None,
            status: SegmentStatus::Pending,
        }
    }

    /// Binds a driver. Only allowed from `Pending`.
    pub fn assign_driver(&self, driver_id: DriverId) -> Result<Self, ShipmentError> {
        if !self.status.can_assign() {
            return Err(ShipmentError::SegmentCannotAssign {
                sequence: self.sequence,
                status: self.status,
            });
        }

        Ok(Self {
            driver_id: Some(driver_id),
            status: SegmentStatus::Assigned,
            ..self.clone()
        })
    }

    /// Leaves the origin hub. Only allowed from `Assigned`.
    pub fn depart(&self, at: DateTime<Utc>) -> Result<Self, ShipmentError> {
        if self.status.can_depart() {
            return Ok(Self {
                departed_at: Some(at),
                status: SegmentStatus::InTransit,
                ..self.clone()
            });
        }

        match self.status {
            SegmentStatus::Pending => Err(ShipmentError::DriverNotAssigned {
                sequence: self.sequence,
            }),
            status => Err(ShipmentError::SegmentAlreadyDeparted {
                sequence: self.sequence,
                status,
            }),
        }
    }

    /// Reaches the destination hub. Only allowed from `InTransit`.
    ///
    /// Records the actual duration in whole minutes since departure.
    pub fn arrive(&self, at: DateTime<Utc>) -> Result<Self, ShipmentError> {
        if self.status.can_arrive() {
            return Ok(Self {
                arrived_at: Some(at),
                actual_duration_min: self.departed_at.map(|d| (at - d).num_minutes()),
                status: SegmentStatus::Arrived,
                ..self.clone()
            });
        }

        match self.status {
            SegmentStatus::Pending | SegmentStatus::Assigned => {
                Err(ShipmentError::SegmentNotDeparted {
                    sequence: self.sequence,
                    status: self.status,
                })
            }
            SegmentStatus::Arrived => Err(ShipmentError::SegmentAlreadyArrived {
                sequence: self.sequence,
            }),
            status => Err(ShipmentError::InvalidSegmentTransition {
                sequence: self.sequence,
                status,
                action: "arrive",
            }),
        }
    }

    /// Forces the segment to `Failed`. Terminal segments are rejected.
    pub fn fail(&self) -> Result<Self, ShipmentError> {
        if self.status.is_terminal() {
            return Err(ShipmentError::InvalidSegmentTransition {
                sequence: self.sequence,
                status: self.status,
                action: "fail",
            });
        }

        Ok(Self {
            status: SegmentStatus::Failed,
            ..self.clone()
        })
    }
}

// Query methods
impl Segment {
    pub fn sequence(&self) -> usize {
        self.sequence
    }

    pub fn from_hub(&self) -> &HubId {
        &self.from_hub
    }

    pub fn to_hub(&self) -> &HubId {
        &self.to_hub
    }

    pub fn estimated_distance_m(&self) -> Option<u64> {
        self.estimated_distance_m
    }

    pub fn estimated_duration_min(&self) -> Option<u64> {
        self.estimated_duration_min
    }

    pub fn driver_id(&self) -> Option<&DriverId> {
        self.driver_id.as_ref()
    }

    pub fn departed_at(&self) -> Option<DateTime<Utc>> {
        self.departed_at
    }

    pub fn arrived_at(&self) -> Option<DateTime<Utc>> {
        self.arrived_at
    }

    /// Minutes between departure and arrival, once arrived.
    pub fn actual_duration_min(&self) -> Option<i64> {
        self.actual_duration_min
    }

    pub fn status(&self) -> SegmentStatus {
        self.status
    }

    pub fn has_driver(&self) -> bool {
        self.driver_id.is_some()
    }

    /// True once the segment has arrived.
    pub fn is_completed(&self) -> bool {
        self.status == SegmentStatus::Arrived
    }

    pub fn is_pending(&self) -> bool {
        self.status == SegmentStatus::Pending
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
