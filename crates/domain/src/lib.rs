//! Domain layer for hub deliveries.
//!
//! This crate provides:
//! - the `Segment` value type and its state machine
//! - the `Shipment` aggregate root that owns ordered segments
//! - lenient route-hint parsing and segment planning
//! - commands, domain events, and the error taxonomy

pub mod error;
pub mod event;
pub mod shipment;

pub use error::ErrorKind;
pub use event::DomainEvent;
pub use shipment::{
    ArriveSegment, AssignSegmentDriver, AuditTrail, CancelShipment, CreateShipment,
    DepartSegment, LegHint, RouteHints, Segment, SegmentArrivedData, SegmentDepartedData,
    SegmentStatus, Shipment, ShipmentCancelledData, ShipmentCompletedData, ShipmentCreatedData,
    ShipmentError, ShipmentEvent, ShipmentStatus, plan_segments,
};
