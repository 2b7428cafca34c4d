//! Shipment orchestrator driving segments through their lifecycle.

use chrono::Utc;
use common::{DriverId, OrderKey, ShipmentId};
use domain::{
    ArriveSegment, AssignSegmentDriver, CancelShipment, CreateShipment, DepartSegment,
    DomainEvent, Shipment, ShipmentEvent, plan_segments,
};
use futures_util::future::join_all;
use shipment_store::{Page, ShipmentQuery, ShipmentStore, ShipmentStoreExt};

use crate::error::{DeliveryError, Result};
use crate::outcome::{
    ArrivalOutcome, AssignmentOutcome, AssignmentStatus, CancelOutcome, CreateOutcome,
    DepartureOutcome, DriverNotice, NoticeKind, NoticeStatus, PublishReport,
};
use crate::publisher::EventPublisher;
use crate::services::driver::{DriverAssignment, DriverAssignmentClient};

/// Orchestrates shipment workflows across the store and collaborators.
///
/// Each entry point loads the shipment, applies its transitions in memory,
/// saves once, and only then runs best-effort side effects. The orchestrator
/// keeps no state between calls; concurrent updates to one shipment are
/// serialized by the store's version check.
pub struct ShipmentOrchestrator<S, D, P>
where
    S: ShipmentStore,
    D: DriverAssignmentClient,
    P: EventPublisher,
{
    store: S,
    drivers: D,
    publisher: P,
}

impl<S, D, P> ShipmentOrchestrator<S, D, P>
where
    S: ShipmentStore,
    D: DriverAssignmentClient,
    P: EventPublisher,
{
    /// Creates a new orchestrator.
    pub fn new(store: S, drivers: D, publisher: P) -> Self {
        Self {
            store,
            drivers,
            publisher,
        }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates a shipment for an order from an ordered hub route.
    ///
    /// Fails with `DuplicateShipment` if the order already has one.
    #[tracing::instrument(skip(self, command), fields(order_key = %command.order_key))]
    pub async fn create_shipment(&self, command: CreateShipment) -> Result<CreateOutcome> {
        if self.store.exists_by_order_key(&command.order_key).await? {
            tracing::warn!("shipment already exists for order");
            return Err(DeliveryError::DuplicateShipment(command.order_key));
        }

        let segments = plan_segments(&command.route, &command.route_hints)?;
        let shipment = Shipment::create(
            command.order_key,
            command.origin_hub,
            command.destination_hub,
            segments,
            command.created_by,
            Utc::now(),
        )?;

        let shipment = self.store.save(shipment).await?;

        metrics::counter!("shipments_created_total").increment(1);
        tracing::info!(
            shipment_id = %shipment.id(),
            segments = shipment.total_segments(),
            "shipment created"
        );

        let published = self.publish_all(vec![shipment.creation_event()]).await;

        Ok(CreateOutcome {
            shipment_id: shipment.id(),
            order_key: shipment.order_key().clone(),
            status: shipment.status(),
            total_segments: shipment.total_segments(),
            total_estimated_duration_min: shipment.total_estimated_duration_min(),
            published,
        })
    }

    /// Requests a driver for a segment, then binds and departs it.
    ///
    /// A segment that already has a driver, an unavailable driver, or a
    /// failing driver service all yield a non-fatal outcome with the stored
    /// shipment untouched. Rule violations are returned as errors before the
    /// driver service is contacted.
    #[tracing::instrument(
        skip(self, command),
        fields(shipment_id = %command.shipment_id, segment = command.segment_index)
    )]
    pub async fn assign_driver_for_segment(
        &self,
        command: AssignSegmentDriver,
    ) -> Result<AssignmentOutcome> {
        let AssignSegmentDriver {
            shipment_id,
            segment_index: index,
        } = command;
        let mut shipment = self.load(shipment_id).await?;

        if let Some(driver_id) = shipment.segment(index)?.driver_id() {
            tracing::warn!(%driver_id, "segment already has a driver");
            return Ok(AssignmentOutcome {
                shipment_id,
                segment_index: index,
                status: AssignmentStatus::AlreadyAssigned,
                driver_id: Some(driver_id.clone()),
                driver_name: None,
                shipment_status: shipment.status(),
                message: format!("Segment {index} already has driver {driver_id}"),
                published: Vec::new(),
            });
        }

        shipment.check_departure_ready(index)?;

        let (driver_id, driver_name) = match self.drivers.request_driver(shipment_id).await {
            Ok(DriverAssignment::Assigned {
                driver_id,
                driver_name,
            }) => (driver_id, driver_name),
            Ok(DriverAssignment::Unavailable { reason }) => {
                metrics::counter!("driver_assignment_failures_total", "reason" => "unavailable")
                    .increment(1);
                let message = reason.unwrap_or_else(|| "No driver available".to_string());
                tracing::warn!(%message, "no driver available");
                return Ok(Self::assignment_failed(&shipment, index, message));
            }
            Err(e) => {
                metrics::counter!("driver_assignment_failures_total", "reason" => "error")
                    .increment(1);
                tracing::error!(error = %e, "driver request failed");
                return Ok(Self::assignment_failed(
                    &shipment,
                    index,
                    format!("Driver request failed: {e}"),
                ));
            }
        };

        let now = Utc::now();
        let departed = shipment
            .assign_segment_driver(index, driver_id.clone(), now)
            .and_then(|()| shipment.depart_segment(index, now));
        let event = match departed {
            Ok(event) => event,
            Err(e) => {
                self.release_driver(index, &driver_id).await;
                return Err(e.into());
            }
        };

        let shipment = match self.store.save(shipment).await {
            Ok(saved) => saved,
            Err(e) => {
                self.release_driver(index, &driver_id).await;
                return Err(e.into());
            }
        };

        metrics::counter!("segment_departures_total").increment(1);
        tracing::info!(%driver_id, "driver assigned and segment departed");

        let published = self.publish_all(vec![event]).await;

        Ok(AssignmentOutcome {
            shipment_id,
            segment_index: index,
            status: AssignmentStatus::Assigned,
            message: format!("Driver {driver_id} assigned to segment {index}"),
            driver_id: Some(driver_id),
            driver_name,
            shipment_status: shipment.status(),
            published,
        })
    }

    /// Departs a segment, binding the supplied driver first if it has none.
    #[tracing::instrument(
        skip(self, command),
        fields(shipment_id = %command.shipment_id, segment = command.segment_index)
    )]
    pub async fn depart_segment(&self, command: DepartSegment) -> Result<DepartureOutcome> {
        let DepartSegment {
            shipment_id,
            segment_index: index,
            driver_id,
        } = command;
        let mut shipment = self.load(shipment_id).await?;
        let now = Utc::now();

        if !shipment.segment(index)?.has_driver()
            && let Some(driver_id) = driver_id
        {
            shipment.assign_segment_driver(index, driver_id, now)?;
        }

        let event = shipment.depart_segment(index, now)?;
        let shipment = self.store.save(shipment).await?;

        metrics::counter!("segment_departures_total").increment(1);
        tracing::info!("segment departed");

        let published = self.publish_all(vec![event]).await;

        Ok(DepartureOutcome {
            shipment_id,
            segment_index: index,
            driver_id: shipment.segment(index)?.driver_id().cloned(),
            departed_at: now,
            shipment_status: shipment.status(),
            published,
        })
    }

    /// Records a segment's arrival.
    ///
    /// The driver's completion notice is best-effort: a failure is logged
    /// and reported but never undoes the arrival.
    #[tracing::instrument(
        skip(self, command),
        fields(shipment_id = %command.shipment_id, segment = command.segment_index)
    )]
    pub async fn arrive_segment(&self, command: ArriveSegment) -> Result<ArrivalOutcome> {
        let ArriveSegment {
            shipment_id,
            segment_index: index,
        } = command;
        let mut shipment = self.load(shipment_id).await?;
        let now = Utc::now();

        let events = shipment.arrive_segment(index, now)?;
        let shipment = self.store.save(shipment).await?;

        metrics::counter!("segment_arrivals_total").increment(1);
        tracing::info!("segment arrived");

        let (arrival, completion): (Vec<_>, Vec<_>) = events
            .into_iter()
            .partition(|e| matches!(e, ShipmentEvent::SegmentArrived(_)));
        let mut published = self.publish_all(arrival).await;

        let segment = shipment.segment(index)?;
        let completion_notice = match segment.driver_id() {
            Some(driver_id) => Some(
                self.send_notice(index, driver_id, NoticeKind::Completion, || {
                    self.drivers
                        .notify_complete(driver_id, segment.actual_duration_min())
                })
                .await,
            ),
            None => None,
        };

        let shipment_completed = !completion.is_empty();
        if shipment_completed {
            metrics::counter!("shipments_completed_total").increment(1);
            if let Some(minutes) = shipment.total_actual_duration_min() {
                metrics::histogram!("shipment_actual_duration_minutes").record(minutes as f64);
            }
            tracing::info!(
                total_actual_duration_min = shipment.total_actual_duration_min(),
                "shipment completed"
            );
            published.extend(self.publish_all(completion).await);
        }

        Ok(ArrivalOutcome {
            shipment_id,
            segment_index: index,
            arrived_at: now,
            actual_duration_min: segment.actual_duration_min(),
            shipment_status: shipment.status(),
            shipment_completed,
            next_segment: shipment.next_pending_index(),
            completion_notice,
            published,
        })
    }

    /// Cancels a shipment, failing every open segment.
    ///
    /// Every bound driver whose segment has not arrived gets a cancel
    /// notice. Notice failures are collected and reported; the remaining
    /// notices are still sent.
    #[tracing::instrument(skip(self, command), fields(shipment_id = %command.shipment_id))]
    pub async fn cancel_shipment(&self, command: CancelShipment) -> Result<CancelOutcome> {
        let shipment_id = command.shipment_id;
        let mut shipment = self.load(shipment_id).await?;

        let drivers = shipment.active_drivers();
        let event = shipment.fail(Utc::now())?;

        let notices = join_all(drivers.iter().map(|(index, driver_id)| {
            self.send_notice(*index, driver_id, NoticeKind::Cancellation, || {
                self.drivers.notify_cancel(driver_id)
            })
        }))
        .await;

        let shipment = self.store.save(shipment).await?;

        metrics::counter!("shipments_cancelled_total").increment(1);
        tracing::info!(
            reason = command.reason.as_deref().unwrap_or("unspecified"),
            notices = notices.len(),
            "shipment cancelled"
        );

        let failed_segments = match &event {
            ShipmentEvent::ShipmentCancelled(data) => data.failed_segments.clone(),
            _ => Vec::new(),
        };
        let published = self.publish_all(vec![event]).await;

        Ok(CancelOutcome {
            shipment_id,
            order_key: shipment.order_key().clone(),
            shipment_status: shipment.status(),
            failed_segments,
            notices,
            published,
        })
    }

    /// Soft-deletes a shipment. Administrative only.
    #[tracing::instrument(skip(self))]
    pub async fn soft_delete(
        &self,
        shipment_id: ShipmentId,
        deleted_by: Option<String>,
    ) -> Result<Shipment> {
        let mut shipment = self
            .store
            .find_by_id(shipment_id)
            .await?
            .ok_or(DeliveryError::ShipmentNotFound(shipment_id))?;

        shipment.mark_deleted(deleted_by, Utc::now())?;
        let shipment = self.store.save(shipment).await?;

        tracing::info!("shipment soft-deleted");
        Ok(shipment)
    }

    /// Returns a live shipment by id.
    pub async fn get_shipment(&self, shipment_id: ShipmentId) -> Result<Shipment> {
        self.load(shipment_id).await
    }

    /// Returns the live shipment created for an order, if any.
    pub async fn find_by_order_key(&self, order_key: &OrderKey) -> Result<Option<Shipment>> {
        Ok(self
            .store
            .find_by_order_key(order_key)
            .await?
            .filter(|s| !s.is_deleted()))
    }

    /// Lists shipments, newest first.
    pub async fn list_shipments(&self, query: ShipmentQuery) -> Result<Page<Shipment>> {
        Ok(self.store.list(query).await?)
    }

    async fn load(&self, shipment_id: ShipmentId) -> Result<Shipment> {
        Ok(self.store.load_active(shipment_id).await?)
    }

    fn assignment_failed(shipment: &Shipment, index: usize, message: String) -> AssignmentOutcome {
        AssignmentOutcome {
            shipment_id: shipment.id(),
            segment_index: index,
            status: AssignmentStatus::Failed,
            driver_id: None,
            driver_name: None,
            shipment_status: shipment.status(),
            message,
            published: Vec::new(),
        }
    }

    /// Hands back a driver obtained for a step that did not go through.
    async fn release_driver(&self, index: usize, driver_id: &DriverId) {
        tracing::warn!(%driver_id, segment = index, "releasing driver after failed departure");
        self.send_notice(index, driver_id, NoticeKind::Cancellation, || {
            self.drivers.notify_cancel(driver_id)
        })
        .await;
    }

    async fn send_notice<F, Fut>(
        &self,
        index: usize,
        driver_id: &DriverId,
        kind: NoticeKind,
        send: F,
    ) -> DriverNotice
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let status = match send().await {
            Ok(()) => NoticeStatus::Delivered,
            Err(e) => {
                metrics::counter!("driver_notice_failures_total").increment(1);
                tracing::error!(%driver_id, segment = index, ?kind, error = %e, "driver notice failed");
                NoticeStatus::Failed {
                    reason: e.to_string(),
                }
            }
        };

        DriverNotice {
            segment_index: index,
            driver_id: driver_id.clone(),
            kind,
            status,
        }
    }

    async fn publish_all(&self, events: Vec<ShipmentEvent>) -> Vec<PublishReport> {
        let mut reports = Vec::with_capacity(events.len());
        for event in events {
            let event_type = event.event_type();
            match self.publisher.publish(&event).await {
                Ok(()) => reports.push(PublishReport::delivered(event_type)),
                Err(e) => {
                    metrics::counter!("event_publish_failures_total").increment(1);
                    tracing::error!(event_type, error = %e, "event publish failed");
                    reports.push(PublishReport::failed(event_type, e.to_string()));
                }
            }
        }
        reports
    }
}
