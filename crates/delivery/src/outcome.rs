//! Structured results of orchestrator entry points.
//!
//! Each outcome carries the core transition result plus a report of the
//! best-effort side effects (driver notices, event publication) that ran
//! after the shipment was saved.

use chrono::{DateTime, Utc};
use common::{DriverId, OrderKey, ShipmentId};
use domain::ShipmentStatus;
use serde::Serialize;

/// Delivery status of one published event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    pub event_type: &'static str,
    pub delivered: bool,
    pub error: Option<String>,
}

impl PublishReport {
    pub fn delivered(event_type: &'static str) -> Self {
        Self {
            event_type,
            delivered: true,
            error: None,
        }
    }

    pub fn failed(event_type: &'static str, error: impl Into<String>) -> Self {
        Self {
            event_type,
            delivered: false,
            error: Some(error.into()),
        }
    }
}

/// Which notice was sent to a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NoticeKind {
    Completion,
    Cancellation,
}

/// Whether a driver notice went through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NoticeStatus {
    Delivered,
    Failed { reason: String },
}

/// Best-effort notice sent to the driver of one segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverNotice {
    pub segment_index: usize,
    pub driver_id: DriverId,
    pub kind: NoticeKind,
    pub status: NoticeStatus,
}

impl DriverNotice {
    pub fn is_delivered(&self) -> bool {
        self.status == NoticeStatus::Delivered
    }
}

/// Result of creating a shipment.
#[derive(Debug, Clone, Serialize)]
pub struct CreateOutcome {
    pub shipment_id: ShipmentId,
    pub order_key: OrderKey,
    pub status: ShipmentStatus,
    pub total_segments: usize,
    pub total_estimated_duration_min: u64,
    pub published: Vec<PublishReport>,
}

/// Business result of an assign-driver request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentStatus {
    /// A driver was bound and the segment departed.
    Assigned,

    /// The segment already had a driver; nothing changed.
    AlreadyAssigned,

    /// No driver could be obtained; nothing changed.
    Failed,
}

/// Result of requesting a driver for a segment.
///
/// `AlreadyAssigned` and `Failed` are expected business outcomes, not errors.
#[derive(Debug, Clone, Serialize)]
pub struct AssignmentOutcome {
    pub shipment_id: ShipmentId,
    pub segment_index: usize,
    pub status: AssignmentStatus,
    pub driver_id: Option<DriverId>,
    pub driver_name: Option<String>,
    pub shipment_status: ShipmentStatus,
    pub message: String,
    pub published: Vec<PublishReport>,
}

impl AssignmentOutcome {
    /// True only when a new driver was bound by this call.
    pub fn is_success(&self) -> bool {
        self.status == AssignmentStatus::Assigned
    }
}

/// Result of departing a segment directly.
#[derive(Debug, Clone, Serialize)]
pub struct DepartureOutcome {
    pub shipment_id: ShipmentId,
    pub segment_index: usize,
    pub driver_id: Option<DriverId>,
    pub departed_at: DateTime<Utc>,
    pub shipment_status: ShipmentStatus,
    pub published: Vec<PublishReport>,
}

/// Result of recording an arrival.
#[derive(Debug, Clone, Serialize)]
pub struct ArrivalOutcome {
    pub shipment_id: ShipmentId,
    pub segment_index: usize,
    pub arrived_at: DateTime<Utc>,
    pub actual_duration_min: Option<i64>,
    pub shipment_status: ShipmentStatus,
    pub shipment_completed: bool,
    pub next_segment: Option<usize>,

    /// Completion notice to the segment's driver, if it had one.
    pub completion_notice: Option<DriverNotice>,
    pub published: Vec<PublishReport>,
}

/// Result of cancelling a shipment.
#[derive(Debug, Clone, Serialize)]
pub struct CancelOutcome {
    pub shipment_id: ShipmentId,
    pub order_key: OrderKey,
    pub shipment_status: ShipmentStatus,

    /// Segments forced to FAILED.
    pub failed_segments: Vec<usize>,

    /// One cancel notice per released driver.
    pub notices: Vec<DriverNotice>,
    pub published: Vec<PublishReport>,
}

impl CancelOutcome {
    /// Notices that could not be delivered.
    pub fn failed_notices(&self) -> impl Iterator<Item = &DriverNotice> {
        self.notices.iter().filter(|n| !n.is_delivered())
    }
}
