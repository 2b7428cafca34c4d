//! Shipment aggregate implementation.

use chrono::{DateTime, Utc};
use common::{DriverId, HubId, OrderKey, ShipmentId, Version};
use serde::{Deserialize, Serialize};

use super::{Segment, ShipmentError, ShipmentEvent, ShipmentStatus};

/// Creation, update and soft-delete bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrail {
    pub created_at: DateTime<Utc>,
    pub created_by: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<String>,
    pub is_deleted: bool,
}

impl AuditTrail {
    fn new(created_by: Option<String>, at: DateTime<Utc>) -> Self {
        Self {
            created_at: at,
            created_by,
            updated_at: at,
            deleted_at: None,
            deleted_by: None,
            is_deleted: false,
        }
    }
}

/// Shipment aggregate root.
///
/// Owns an ordered, densely numbered list of segments. Shipment status is
/// derived from segment statuses: it completes exactly when every segment
/// has arrived, and `fail` overrides everything.
///
/// Every command validates first and only then writes, so a returned error
/// always means the aggregate is unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    id: ShipmentId,

    /// Current version for optimistic concurrency.
    #[serde(default)]
    version: Version,

    order_key: OrderKey,
    origin_hub: HubId,
    destination_hub: HubId,
    segments: Vec<Segment>,
    status: ShipmentStatus,

    /// Last departed segment. Advisory only; ordering is checked against
    /// segment statuses.
    current_segment_index: usize,

    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    total_estimated_duration_min: u64,
    total_actual_duration_min: Option<i64>,
    audit: AuditTrail,
}

impl Shipment {
    /// Creates a shipment in `Created` status from planned segments.
    pub fn create(
        order_key: OrderKey,
        origin_hub: HubId,
        destination_hub: HubId,
        segments: Vec<Segment>,
        created_by: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<Self, ShipmentError> {
        if order_key.is_blank() {
            return Err(ShipmentError::OrderKeyRequired);
        }
        if origin_hub.is_blank() {
            return Err(ShipmentError::HubRequired { role: "Origin" });
        }
        if destination_hub.is_blank() {
            return Err(ShipmentError::HubRequired {
                role: "Destination",
            });
        }

        let (Some(first), Some(last)) = (segments.first(), segments.last()) else {
            return Err(ShipmentError::NoSegments);
        };
        if first.from_hub() != &origin_hub {
            return Err(ShipmentError::RouteEndpointMismatch {
                end: "start",
                expected: origin_hub.to_string(),
                actual: first.from_hub().to_string(),
            });
        }
        if last.to_hub() != &destination_hub {
            return Err(ShipmentError::RouteEndpointMismatch {
                end: "end",
                expected: destination_hub.to_string(),
                actual: last.to_hub().to_string(),
            });
        }

        for (position, segment) in segments.iter().enumerate() {
            if segment.sequence() != position {
                return Err(ShipmentError::SegmentSequenceMismatch {
                    position,
                    sequence: segment.sequence(),
                });
            }
            if !segment.is_pending() {
                return Err(ShipmentError::SegmentCannotAssign {
                    sequence: position,
                    status: segment.status(),
                });
            }
        }

        let total_estimated_duration_min = segments
            .iter()
            .filter_map(Segment::estimated_duration_min)
            .fold(0u64, u64::saturating_add);

        Ok(Self {
            id: ShipmentId::new(),
            version: Version::initial(),
            order_key,
            origin_hub,
            destination_hub,
            segments,
            status: ShipmentStatus::Created,
            current_segment_index: 0,
            started_at: None,
            completed_at: None,
            total_estimated_duration_min,
            total_actual_duration_min: None,
            audit: AuditTrail::new(created_by, at),
        })
    }

    /// Returns the event announcing this shipment's creation.
    pub fn creation_event(&self) -> ShipmentEvent {
        ShipmentEvent::shipment_created(self)
    }

    /// Sets the version. Called by the store after a successful save.
    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }
}

// Query methods
impl Shipment {
    pub fn id(&self) -> ShipmentId {
        self.id
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn order_key(&self) -> &OrderKey {
        &self.order_key
    }

    pub fn origin_hub(&self) -> &HubId {
        &self.origin_hub
    }

    pub fn destination_hub(&self) -> &HubId {
        &self.destination_hub
    }

    pub fn status(&self) -> ShipmentStatus {
        self.status
    }

    pub fn current_segment_index(&self) -> usize {
        self.current_segment_index
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Sum of segment estimates; missing estimates count as zero.
    pub fn total_estimated_duration_min(&self) -> u64 {
        self.total_estimated_duration_min
    }

    /// Minutes from first departure to completion, once completed.
    pub fn total_actual_duration_min(&self) -> Option<i64> {
        self.total_actual_duration_min
    }

    pub fn audit(&self) -> &AuditTrail {
        &self.audit
    }

    pub fn is_deleted(&self) -> bool {
        self.audit.is_deleted
    }

    /// Returns all segments in order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns a segment by index, failing when out of range.
    pub fn segment(&self, index: usize) -> Result<&Segment, ShipmentError> {
        self.segments
            .get(index)
            .ok_or(ShipmentError::InvalidSegmentIndex {
                index,
                total: self.segments.len(),
            })
    }

    pub fn total_segments(&self) -> usize {
        self.segments.len()
    }

    pub fn completed_segments(&self) -> usize {
        self.segments.iter().filter(|s| s.is_completed()).count()
    }

    /// Returns the segment at the current index.
    pub fn current_segment(&self) -> Option<&Segment> {
        self.segments.get(self.current_segment_index)
    }

    /// Returns the first pending segment by index.
    pub fn next_pending_segment(&self) -> Option<&Segment> {
        self.segments.iter().find(|s| s.is_pending())
    }

    /// Returns the index of the first pending segment.
    pub fn next_pending_index(&self) -> Option<usize> {
        self.next_pending_segment().map(Segment::sequence)
    }

    pub fn has_next_segment(&self) -> bool {
        self.next_pending_segment().is_some()
    }

    pub fn all_segments_completed(&self) -> bool {
        self.segments.iter().all(Segment::is_completed)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn is_in_progress(&self) -> bool {
        self.status.is_in_progress()
    }

    /// Reference ids of the form `<shipment id>-segment-<n>`.
    pub fn segment_ids(&self) -> Vec<String> {
        self.segments
            .iter()
            .map(|s| format!("{}-segment-{}", self.id, s.sequence()))
            .collect()
    }

    /// Drivers bound to segments that have not arrived, with their index.
    pub fn active_drivers(&self) -> Vec<(usize, DriverId)> {
        self.segments
            .iter()
            .filter(|s| !s.is_completed())
            .filter_map(|s| s.driver_id().map(|d| (s.sequence(), d.clone())))
            .collect()
    }

    /// Checks that the segment at `index` could depart now: the shipment is
    /// not terminal, the index exists, and every lower segment has arrived.
    pub fn check_departure_ready(&self, index: usize) -> Result<&Segment, ShipmentError> {
        self.ensure_active()?;
        let segment = self.segment(index)?;

        if let Some(blocking) = self.segments[..index].iter().find(|s| !s.is_completed()) {
            return Err(ShipmentError::SegmentNotReady {
                index,
                blocking: blocking.sequence(),
            });
        }

        Ok(segment)
    }

    fn ensure_active(&self) -> Result<(), ShipmentError> {
        match self.status {
            ShipmentStatus::Completed => Err(ShipmentError::ShipmentAlreadyCompleted(self.id)),
            ShipmentStatus::Failed => Err(ShipmentError::ShipmentAlreadyFailed(self.id)),
            _ => Ok(()),
        }
    }
}

// Command methods
impl Shipment {
    /// Binds a driver to a pending segment.
    pub fn assign_segment_driver(
        &mut self,
        index: usize,
        driver_id: DriverId,
        at: DateTime<Utc>,
    ) -> Result<(), ShipmentError> {
        self.ensure_active()?;
        let segment = self.segment(index)?;

        if let Some(existing) = segment.driver_id() {
            return Err(ShipmentError::DriverAlreadyAssigned {
                index,
                driver_id: existing.clone(),
            });
        }

        let assigned = segment.assign_driver(driver_id)?;
        self.segments[index] = assigned;
        self.audit.updated_at = at;
        Ok(())
    }

    /// Departs an assigned segment whose predecessors have all arrived.
    ///
    /// The first departure starts the shipment.
    pub fn depart_segment(
        &mut self,
        index: usize,
        at: DateTime<Utc>,
    ) -> Result<ShipmentEvent, ShipmentError> {
        let departed = self.check_departure_ready(index)?.depart(at)?;

        self.segments[index] = departed;
        self.current_segment_index = index;
        self.status = ShipmentStatus::InProgress;
        if self.started_at.is_none() {
            self.started_at = Some(at);
        }
        self.audit.updated_at = at;

        Ok(ShipmentEvent::segment_departed(
            self,
            &self.segments[index],
            at,
        ))
    }

    /// Marks an in-transit segment as arrived.
    ///
    /// Completes the shipment when this was the last open segment.
    pub fn arrive_segment(
        &mut self,
        index: usize,
        at: DateTime<Utc>,
    ) -> Result<Vec<ShipmentEvent>, ShipmentError> {
        self.ensure_active()?;
        let arrived = self.segment(index)?.arrive(at)?;

        self.segments[index] = arrived;
        self.audit.updated_at = at;

        let mut events = vec![ShipmentEvent::segment_arrived(
            self,
            &self.segments[index],
            at,
        )];

        if self.all_segments_completed() {
            self.status = ShipmentStatus::Completed;
            self.completed_at = Some(at);
            self.total_actual_duration_min = self.started_at.map(|s| (at - s).num_minutes());
            events.push(ShipmentEvent::shipment_completed(self, at));
        }

        Ok(events)
    }

    /// Fails the shipment and every segment that is not yet terminal.
    pub fn fail(&mut self, at: DateTime<Utc>) -> Result<ShipmentEvent, ShipmentError> {
        self.ensure_active()?;

        let mut segments = Vec::with_capacity(self.segments.len());
        let mut failed = Vec::new();
        for segment in &self.segments {
            if segment.is_terminal() {
                segments.push(segment.clone());
            } else {
                failed.push(segment.sequence());
                segments.push(segment.fail()?);
            }
        }

        self.segments = segments;
        self.status = ShipmentStatus::Failed;
        self.completed_at = Some(at);
        self.audit.updated_at = at;

        Ok(ShipmentEvent::shipment_cancelled(self, failed, at))
    }

    /// Soft-deletes the shipment. Administrative only.
    pub fn mark_deleted(
        &mut self,
        deleted_by: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), ShipmentError> {
        if self.audit.is_deleted {
            return Err(ShipmentError::AlreadyDeleted(self.id));
        }

        self.audit.is_deleted = true;
        self.audit.deleted_at = Some(at);
        self.audit.deleted_by = deleted_by;
        self.audit.updated_at = at;
        Ok(())
    }
}
