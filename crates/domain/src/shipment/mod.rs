//! Shipment aggregate, its segments, and related types.

mod aggregate;
mod commands;
mod events;
mod route;
mod segment;
mod state;

pub use aggregate::{AuditTrail, Shipment};
pub use commands::*;
pub use events::{
    SegmentArrivedData, SegmentDepartedData, ShipmentCancelledData, ShipmentCompletedData,
    ShipmentCreatedData, ShipmentEvent,
};
pub use route::{LegHint, RouteHints, plan_segments};
pub use segment::Segment;
pub use state::{SegmentStatus, ShipmentStatus};

use common::{DriverId, ShipmentId};
use thiserror::Error;

use crate::error::ErrorKind;

/// Errors raised by shipment and segment rules.
///
/// Every error leaves the aggregate untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShipmentError {
    /// The originating order key is blank.
    #[error("Order key is required")]
    OrderKeyRequired,

    /// A hub id is blank.
    #[error("{role} hub is required")]
    HubRequired { role: &'static str },

    /// A route needs at least an origin and a destination.
    #[error("Route must contain at least 2 hubs, got {hubs}")]
    RouteTooShort { hubs: usize },

    /// The route does not start at the origin or end at the destination.
    #[error("Route {end} is {actual}, expected {expected}")]
    RouteEndpointMismatch {
        end: &'static str,
        expected: String,
        actual: String,
    },

    /// A shipment needs at least one segment.
    #[error("Shipment has no segments")]
    NoSegments,

    /// Segments must be numbered 0..N-1 in order.
    #[error("Segment at position {position} has sequence {sequence}")]
    SegmentSequenceMismatch { position: usize, sequence: usize },

    /// The segment index is outside the shipment.
    #[error("Invalid segment index {index} (shipment has {total} segments)")]
    InvalidSegmentIndex { index: usize, total: usize },

    /// The segment already has a driver.
    #[error("Segment {index} already has driver {driver_id}")]
    DriverAlreadyAssigned { index: usize, driver_id: DriverId },

    /// A driver can only be bound to a pending segment.
    #[error("Segment {sequence} cannot be assigned from {status} status")]
    SegmentCannotAssign {
        sequence: usize,
        status: SegmentStatus,
    },

    /// The segment has no driver to depart with.
    #[error("Segment {sequence} has no driver assigned")]
    DriverNotAssigned { sequence: usize },

    /// A lower segment has not arrived yet.
    #[error("Segment {index} cannot depart before segment {blocking} has arrived")]
    SegmentNotReady { index: usize, blocking: usize },

    /// The segment already left (or can no longer leave).
    #[error("Segment {sequence} cannot depart from {status} status")]
    SegmentAlreadyDeparted {
        sequence: usize,
        status: SegmentStatus,
    },

    /// The segment has not departed yet.
    #[error("Segment {sequence} has not departed (status {status})")]
    SegmentNotDeparted {
        sequence: usize,
        status: SegmentStatus,
    },

    /// The segment already arrived.
    #[error("Segment {sequence} has already arrived")]
    SegmentAlreadyArrived { sequence: usize },

    /// Any other illegal segment transition.
    #[error("Segment {sequence} cannot {action} from {status} status")]
    InvalidSegmentTransition {
        sequence: usize,
        status: SegmentStatus,
        action: &'static str,
    },

    /// The shipment is completed and accepts no further transitions.
    #[error("Shipment {0} is already completed")]
    ShipmentAlreadyCompleted(ShipmentId),

    /// The shipment has failed and accepts no further transitions.
    #[error("Shipment {0} has already failed")]
    ShipmentAlreadyFailed(ShipmentId),

    /// The shipment is already soft-deleted.
    #[error("Shipment {0} is already deleted")]
    AlreadyDeleted(ShipmentId),
}

impl ShipmentError {
    /// Returns the coarse category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ShipmentError::OrderKeyRequired
            | ShipmentError::HubRequired { .. }
            | ShipmentError::RouteTooShort { .. }
            | ShipmentError::RouteEndpointMismatch { .. }
            | ShipmentError::NoSegments
            | ShipmentError::SegmentSequenceMismatch { .. } => ErrorKind::Validation,
            ShipmentError::InvalidSegmentIndex { .. } => ErrorKind::NotFound,
            ShipmentError::DriverAlreadyAssigned { .. } | ShipmentError::AlreadyDeleted(_) => {
                ErrorKind::Conflict
            }
            ShipmentError::SegmentCannotAssign { .. }
            | ShipmentError::DriverNotAssigned { .. }
            | ShipmentError::SegmentNotReady { .. }
            | ShipmentError::SegmentAlreadyDeparted { .. }
            | ShipmentError::SegmentNotDeparted { .. }
            | ShipmentError::SegmentAlreadyArrived { .. }
            | ShipmentError::InvalidSegmentTransition { .. }
            | ShipmentError::ShipmentAlreadyCompleted(_)
            | ShipmentError::ShipmentAlreadyFailed(_) => ErrorKind::InvalidTransition,
        }
    }
}
