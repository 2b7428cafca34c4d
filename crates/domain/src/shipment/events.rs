//! Shipment domain events.

use chrono::{DateTime, Utc};
use common::{DriverId, HubId, OrderKey, ShipmentId};
use serde::{Deserialize, Serialize};

use crate::event::DomainEvent;

use super::{Segment, Shipment};

/// Lifecycle facts published for downstream consumers (tracking, routing).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ShipmentEvent {
    /// Shipment was created with its planned segments.
    ShipmentCreated(ShipmentCreatedData),

    /// A segment left its origin hub.
    SegmentDeparted(SegmentDepartedData),

    /// A segment reached its destination hub.
    SegmentArrived(SegmentArrivedData),

    /// Every segment arrived.
    ShipmentCompleted(ShipmentCompletedData),

    /// Shipment was cancelled and its open segments failed.
    ShipmentCancelled(ShipmentCancelledData),
}

impl DomainEvent for ShipmentEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ShipmentEvent::ShipmentCreated(_) => "ShipmentCreated",
            ShipmentEvent::SegmentDeparted(_) => "SegmentDeparted",
            ShipmentEvent::SegmentArrived(_) => "SegmentArrived",
            ShipmentEvent::ShipmentCompleted(_) => "ShipmentCompleted",
            ShipmentEvent::ShipmentCancelled(_) => "ShipmentCancelled",
        }
    }
}

impl ShipmentEvent {
    /// Returns the shipment the event belongs to.
    pub fn shipment_id(&self) -> ShipmentId {
        match self {
            ShipmentEvent::ShipmentCreated(data) => data.shipment_id,
            ShipmentEvent::SegmentDeparted(data) => data.shipment_id,
            ShipmentEvent::SegmentArrived(data) => data.shipment_id,
            ShipmentEvent::ShipmentCompleted(data) => data.shipment_id,
            ShipmentEvent::ShipmentCancelled(data) => data.shipment_id,
        }
    }
}

/// Data for ShipmentCreated event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentCreatedData {
    pub shipment_id: ShipmentId,
    pub order_key: OrderKey,
    pub origin_hub: HubId,
    pub destination_hub: HubId,
    pub total_segments: usize,
    pub total_estimated_duration_min: u64,
    pub created_at: DateTime<Utc>,
}

/// Data for SegmentDeparted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentDepartedData {
    pub shipment_id: ShipmentId,
    pub order_key: OrderKey,
    pub sequence: usize,
    pub total_segments: usize,
    pub from_hub: HubId,
    pub to_hub: HubId,
    pub driver_id: Option<DriverId>,
    pub departed_at: DateTime<Utc>,
}

/// Data for SegmentArrived event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentArrivedData {
    pub shipment_id: ShipmentId,
    pub order_key: OrderKey,
    pub sequence: usize,
    pub total_segments: usize,
    pub from_hub: HubId,
    pub to_hub: HubId,
    pub driver_id: Option<DriverId>,
    pub arrived_at: DateTime<Utc>,
    pub actual_duration_min: Option<i64>,

    /// Index of the next segment still waiting to depart, if any.
    pub next_segment: Option<usize>,
}

/// Data for ShipmentCompleted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentCompletedData {
    pub shipment_id: ShipmentId,
    pub order_key: OrderKey,
    pub destination_hub: HubId,
    pub completed_at: DateTime<Utc>,
    pub total_estimated_duration_min: u64,
    pub total_actual_duration_min: Option<i64>,
}

/// Data for ShipmentCancelled event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentCancelledData {
    pub shipment_id: ShipmentId,
    pub order_key: OrderKey,

    /// Sequences of the segments forced to FAILED.
    pub failed_segments: Vec<usize>,
    pub cancelled_at: DateTime<Utc>,
}

// Constructors used by the aggregate
impl ShipmentEvent {
    pub(crate) fn shipment_created(shipment: &Shipment) -> Self {
        ShipmentEvent::ShipmentCreated(ShipmentCreatedData {
            shipment_id: shipment.id(),
            order_key: shipment.order_key().clone(),
            origin_hub: shipment.origin_hub().clone(),
            destination_hub: shipment.destination_hub().clone(),
            total_segments: shipment.total_segments(),
            total_estimated_duration_min: shipment.total_estimated_duration_min(),
            created_at: shipment.audit().created_at,
        })
    }

    pub(crate) fn segment_departed(
        shipment: &Shipment,
        segment: &Segment,
        departed_at: DateTime<Utc>,
    ) -> Self {
        ShipmentEvent::SegmentDeparted(SegmentDepartedData {
            shipment_id: shipment.id(),
            order_key: shipment.order_key().clone(),
            sequence: segment.sequence(),
            total_segments: shipment.total_segments(),
            from_hub: segment.from_hub().clone(),
            to_hub: segment.to_hub().clone(),
            driver_id: segment.driver_id().cloned(),
            departed_at,
        })
    }

    pub(crate) fn segment_arrived(
        shipment: &Shipment,
        segment: &Segment,
        arrived_at: DateTime<Utc>,
    ) -> Self {
        ShipmentEvent::SegmentArrived(SegmentArrivedData {
            shipment_id: shipment.id(),
            order_key: shipment.order_key().clone(),
            sequence: segment.sequence(),
            total_segments: shipment.total_segments(),
            from_hub: segment.from_hub().clone(),
            to_hub: segment.to_hub().clone(),
            driver_id: segment.driver_id().cloned(),
            arrived_at,
            actual_duration_min: segment.actual_duration_min(),
            next_segment: shipment.next_pending_index(),
        })
    }

    pub(crate) fn shipment_completed(shipment: &Shipment, completed_at: DateTime<Utc>) -> Self {
        ShipmentEvent::ShipmentCompleted(ShipmentCompletedData {
            shipment_id: shipment.id(),
            order_key: shipment.order_key().clone(),
            destination_hub: shipment.destination_hub().clone(),
            completed_at,
            total_estimated_duration_min: shipment.total_estimated_duration_min(),
            total_actual_duration_min: shipment.total_actual_duration_min(),
        })
    }

    pub(crate) fn shipment_cancelled(
        shipment: &Shipment,
        failed_segments: Vec<usize>,
        cancelled_at: DateTime<Utc>,
    ) -> Self {
        ShipmentEvent::ShipmentCancelled(ShipmentCancelledData {
            shipment_id: shipment.id(),
            order_key: shipment.order_key().clone(),
            failed_segments,
            cancelled_at,
        })
    }
}
