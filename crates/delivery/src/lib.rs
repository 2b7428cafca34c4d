//! Orchestration of hub deliveries.
//!
//! The orchestrator turns one external trigger into one atomic shipment
//! mutation plus best-effort side effects:
//! 1. create a shipment from an ordered hub route
//! 2. request a driver for a segment and depart it
//! 3. depart a segment with a supplied driver
//! 4. record an arrival, notifying the driver and completing the shipment
//! 5. cancel a shipment, releasing every bound driver
//!
//! Driver and event collaborators may fail independently. Their failures are
//! reported in the returned outcome and never corrupt the stored shipment.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod outcome;
pub mod publisher;
pub mod services;
pub mod telemetry;

pub use config::{DeliveryConfig, LogFormat};
pub use error::{DeliveryError, Result};
pub use orchestrator::ShipmentOrchestrator;
pub use outcome::{
    ArrivalOutcome, AssignmentOutcome, AssignmentStatus, CancelOutcome, CreateOutcome,
    DepartureOutcome, DriverNotice, NoticeKind, NoticeStatus, PublishReport,
};
pub use publisher::{EventPublisher, InMemoryEventPublisher, TracingEventPublisher};
pub use services::{
    DriverAssignment, DriverAssignmentClient, HttpDriverClient, InMemoryDriverClient,
};
