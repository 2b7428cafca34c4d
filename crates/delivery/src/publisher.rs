//! Event publisher trait and implementations.

use std::sync::Arc;

use async_trait::async_trait;
use domain::{DomainEvent, ShipmentEvent};
use tokio::sync::RwLock;

use crate::error::{DeliveryError, Result};

/// Trait for emitting shipment lifecycle events to downstream consumers.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes one event.
    async fn publish(&self, event: &ShipmentEvent) -> Result<()>;
}

/// Publisher that writes each event as a structured tracing record.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventPublisher;

#[async_trait]
impl EventPublisher for TracingEventPublisher {
    async fn publish(&self, event: &ShipmentEvent) -> Result<()> {
        let payload =
            serde_json::to_string(event).map_err(|e| DeliveryError::Publish(e.to_string()))?;
        tracing::info!(
            target: "delivery::events",
            event_type = event.event_type(),
            shipment_id = %event.shipment_id(),
            payload = %payload,
            "shipment event"
        );
        Ok(())
    }
}

#[derive(Debug, Default)]
struct InMemoryPublisherState {
    events: Vec<ShipmentEvent>,
    fail_on_publish: bool,
}

/// In-memory publisher for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventPublisher {
    state: Arc<RwLock<InMemoryPublisherState>>,
}

impl InMemoryEventPublisher {
    /// Creates a new in-memory publisher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the publisher to reject every event.
    pub async fn set_fail_on_publish(&self, fail: bool) {
        self.state.write().await.fail_on_publish = fail;
    }

    /// Returns all published events in order.
    pub async fn events(&self) -> Vec<ShipmentEvent> {
        self.state.read().await.events.clone()
    }

    /// Returns the type names of all published events in order.
    pub async fn event_types(&self) -> Vec<&'static str> {
        self.state
            .read()
            .await
            .events
            .iter()
            .map(|e| e.event_type())
            .collect()
    }

    /// Forgets all published events.
    pub async fn clear(&self) {
        self.state.write().await.events.clear();
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventPublisher {
    async fn publish(&self, event: &ShipmentEvent) -> Result<()> {
        let mut state = self.state.write().await;

        if state.fail_on_publish {
            return Err(DeliveryError::Publish("Event bus unavailable".to_string()));
        }

        state.events.push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use common::{HubId, OrderKey};
    use domain::{RouteHints, Shipment, plan_segments};

    use super::*;

    fn created_event() -> ShipmentEvent {
        let route = vec![HubId::from("H1"), HubId::from("H2")];
        let segments = plan_segments(&route, &RouteHints::none()).unwrap();
        Shipment::create(
            OrderKey::from("ORD-1"),
            route[0].clone(),
            route[1].clone(),
            segments,
            None,
            Utc::now(),
        )
        .unwrap()
        .creation_event()
    }

    #[tokio::test]
    async fn test_records_events_in_order() {
        let publisher = InMemoryEventPublisher::new();
        publisher.publish(&created_event()).await.unwrap();
        publisher.publish(&created_event()).await.unwrap();

        assert_eq!(
            publisher.event_types().await,
            vec!["ShipmentCreated", "ShipmentCreated"]
        );
    }

    #[tokio::test]
    async fn test_fail_on_publish() {
        let publisher = InMemoryEventPublisher::new();
        publisher.set_fail_on_publish(true).await;

        let result = publisher.publish(&created_event()).await;
        assert!(matches!(result, Err(DeliveryError::Publish(_))));
        assert!(publisher.events().await.is_empty());
    }

    #[tokio::test]
    async fn test_tracing_publisher_accepts_events() {
        assert!(
            TracingEventPublisher
                .publish(&created_event())
                .await
                .is_ok()
        );
    }
}
