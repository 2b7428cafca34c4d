//! Shipment and segment state machines.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a single leg.
///
/// ```text
/// Pending ──► Assigned ──► InTransit ──► Arrived
///    │           │            │
///    └───────────┴────────────┴──► Failed
/// ```
///
/// `Failed` is only reached when the whole shipment fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SegmentStatus {
    /// Created, no driver yet.
    #[default]
    Pending,

    /// Driver bound, not yet departed.
    Assigned,

    /// Departed from the origin hub.
    InTransit,

    /// Arrived at the destination hub (terminal).
    Arrived,

    /// Forced to fail with its shipment (terminal).
    Failed,
}

impl SegmentStatus {
    /// Returns true if a driver can be bound in this status.
    pub fn can_assign(&self) -> bool {
        matches!(self, SegmentStatus::Pending)
    }

    /// Returns true if the segment can depart in this status.
    pub fn can_depart(&self) -> bool {
        matches!(self, SegmentStatus::Assigned)
    }

    /// Returns true if the segment can arrive in this status.
    pub fn can_arrive(&self) -> bool {
        matches!(self, SegmentStatus::InTransit)
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SegmentStatus::Arrived | SegmentStatus::Failed)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentStatus::Pending => "PENDING",
            SegmentStatus::Assigned => "ASSIGNED",
            SegmentStatus::InTransit => "IN_TRANSIT",
            SegmentStatus::Arrived => "ARRIVED",
            SegmentStatus::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for SegmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle status of a shipment.
///
/// ```text
/// Created ──► InProgress ──► Completed
///    │            │
///    └────────────┴──► Failed
/// ```
///
/// `WaitingDriver` exists so records written by older deployments still
/// deserialize. No operation produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    /// Created, no segment has departed yet.
    #[default]
    Created,

    /// Legacy status kept for stored records.
    WaitingDriver,

    /// At least one segment has departed.
    InProgress,

    /// Every segment arrived (terminal).
    Completed,

    /// Cancelled or failed (terminal).
    Failed,
}

impl ShipmentStatus {
    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ShipmentStatus::Completed | ShipmentStatus::Failed)
    }

    /// Returns true if the shipment is moving.
    pub fn is_in_progress(&self) -> bool {
        matches!(self, ShipmentStatus::InProgress)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::Created => "CREATED",
            ShipmentStatus::WaitingDriver => "WAITING_DRIVER",
            ShipmentStatus::InProgress => "IN_PROGRESS",
            ShipmentStatus::Completed => "COMPLETED",
            ShipmentStatus::Failed => "FAILED",
        }
    }

    /// Parses a status name produced by [`ShipmentStatus::as_str`].
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "CREATED" => Some(ShipmentStatus::Created),
            "WAITING_DRIVER" => Some(ShipmentStatus::WaitingDriver),
            "IN_PROGRESS" => Some(ShipmentStatus::InProgress),
            "COMPLETED" => Some(ShipmentStatus::Completed),
            "FAILED" => Some(ShipmentStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_SEGMENT: [SegmentStatus; 5] = [
        SegmentStatus::Pending,
        SegmentStatus::Assigned,
        SegmentStatus::InTransit,
        SegmentStatus::Arrived,
        SegmentStatus::Failed,
    ];

    const ALL_SHIPMENT: [ShipmentStatus; 5] = [
        ShipmentStatus::Created,
        ShipmentStatus::WaitingDriver,
        ShipmentStatus::InProgress,
        ShipmentStatus::Completed,
        ShipmentStatus::Failed,
    ];

    #[test]
    fn test_default_statuses() {
        assert_eq!(SegmentStatus::default(), SegmentStatus::Pending);
        assert_eq!(ShipmentStatus::default(), ShipmentStatus::Created);
    }

    #[test]
    fn test_only_pending_can_assign() {
        let assignable: Vec<_> = ALL_SEGMENT.iter().filter(|s| s.can_assign()).collect();
        assert_eq!(assignable, vec![&SegmentStatus::Pending]);
    }

    #[test]
    fn test_only_assigned_can_depart() {
        let departable: Vec<_> = ALL_SEGMENT.iter().filter(|s| s.can_depart()).collect();
        assert_eq!(departable, vec![&SegmentStatus::Assigned]);
    }

    #[test]
    fn test_only_in_transit_can_arrive() {
        let arrivable: Vec<_> = ALL_SEGMENT.iter().filter(|s| s.can_arrive()).collect();
        assert_eq!(arrivable, vec![&SegmentStatus::InTransit]);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!SegmentStatus::InTransit.is_terminal());
        assert!(SegmentStatus::Arrived.is_terminal());
        assert!(SegmentStatus::Failed.is_terminal());
        assert!(!ShipmentStatus::InProgress.is_terminal());
        assert!(ShipmentStatus::Completed.is_terminal());
        assert!(ShipmentStatus::Failed.is_terminal());
    }

    #[test]
    fn test_status_names_parse_back() {
        for status in ALL_SHIPMENT {
            assert_eq!(ShipmentStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ShipmentStatus::parse("DONE"), None);
    }

    #[test]
    fn test_serialized_names_match_display() {
        for status in ALL_SHIPMENT {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{status}\""));
        }
        for status in ALL_SEGMENT {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{status}\""));
        }
    }
}
