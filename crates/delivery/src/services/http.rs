//! HTTP client for the driver assignment service.

use std::time::Duration;

use async_trait::async_trait;
use common::{DriverId, ShipmentId};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::DeliveryConfig;
use crate::error::{DeliveryError, Result};

use super::driver::{DriverAssignment, DriverAssignmentClient};

const ASSIGN_PATH: &str = "v1/hub-drivers/internal/assignments";
const DRIVERS_PATH: &str = "v1/hub-drivers/internal/drivers";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AssignRequest {
    hub_delivery_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignResponse {
    success: bool,
    driver_id: Option<String>,
    driver_name: Option<String>,
    message: Option<String>,
}

impl From<AssignResponse> for DriverAssignment {
    fn from(response: AssignResponse) -> Self {
        match response.driver_id {
            Some(driver_id) if response.success && !driver_id.trim().is_empty() => {
                DriverAssignment::Assigned {
                    driver_id: DriverId::new(driver_id),
                    driver_name: response.driver_name,
                }
            }
            _ => DriverAssignment::Unavailable {
                reason: response.message,
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompleteRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    actual_duration_min: Option<i64>,
}

/// Driver assignment client speaking JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpDriverClient {
    client: Client,
    base_url: String,
}

impl HttpDriverClient {
    /// Creates a client for the service at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DeliveryError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Creates a client from the delivery configuration.
    pub fn from_config(config: &DeliveryConfig) -> Result<Self> {
        Self::new(
            config.driver_service_url.clone(),
            config.driver_request_timeout,
        )
    }

    fn assign_url(&self) -> String {
        format!("{}/{}", self.base_url, ASSIGN_PATH)
    }

    fn driver_url(&self, driver_id: &DriverId, action: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.base_url,
            DRIVERS_PATH,
            urlencoding::encode(driver_id.as_str()),
            action
        )
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(DeliveryError::DriverService(format!(
            "Driver service returned {status}: {body}"
        )))
    }
}

fn transport_error(e: reqwest::Error) -> DeliveryError {
    DeliveryError::DriverService(format!("Driver service request failed: {e}"))
}

#[async_trait]
impl DriverAssignmentClient for HttpDriverClient {
    async fn request_driver(&self, shipment_id: ShipmentId) -> Result<DriverAssignment> {
        let response = self
            .client
            .post(self.assign_url())
            .json(&AssignRequest {
                hub_delivery_id: shipment_id.as_uuid(),
            })
            .send()
            .await
            .map_err(transport_error)?;

        let body: AssignResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(transport_error)?;

        tracing::debug!(%shipment_id, success = body.success, "driver service answered");
        Ok(body.into())
    }

    async fn notify_complete(
        &self,
        driver_id: &DriverId,
        actual_duration_min: Option<i64>,
    ) -> Result<()> {
        let response = self
            .client
            .post(self.driver_url(driver_id, "complete"))
            .json(&CompleteRequest {
                actual_duration_min,
            })
            .send()
            .await
            .map_err(transport_error)?;

        Self::check(response).await.map(|_| ())
    }

    async fn notify_cancel(&self, driver_id: &DriverId) -> Result<()> {
        let response = self
            .client
            .post(self.driver_url(driver_id, "cancel"))
            .send()
            .await
            .map_err(transport_error)?;

        Self::check(response).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> HttpDriverClient {
        HttpDriverClient::new("http://drivers.local:8080/", Duration::from_millis(500)).unwrap()
    }

    #[test]
    fn test_urls_are_built_from_base() {
        let client = client();
        assert_eq!(
            client.assign_url(),
            "http://drivers.local:8080/v1/hub-drivers/internal/assignments"
        );
        assert_eq!(
            client.driver_url(&DriverId::from("DRV 7/b"), "cancel"),
            "http://drivers.local:8080/v1/hub-drivers/internal/drivers/DRV%207%2Fb/cancel"
        );
    }

    #[test]
    fn test_assign_request_body() {
        let id = Uuid::new_v4();
        let json = serde_json::to_value(AssignRequest {
            hub_delivery_id: id,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "hubDeliveryId": id.to_string() }));
    }

    #[test]
    fn test_assign_response_mapping() {
        let assigned: AssignResponse = serde_json::from_str(
            r#"{"success": true, "driverId": "DRV-1", "driverName": "Kim"}"#,
        )
        .unwrap();
        assert_eq!(
            DriverAssignment::from(assigned),
            DriverAssignment::Assigned {
                driver_id: DriverId::from("DRV-1"),
                driver_name: Some("Kim".to_string()),
            }
        );

        let none: AssignResponse =
            serde_json::from_str(r#"{"success": false, "message": "no drivers"}"#).unwrap();
        assert_eq!(
            DriverAssignment::from(none),
            DriverAssignment::Unavailable {
                reason: Some("no drivers".to_string())
            }
        );

        let missing_id: AssignResponse = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(matches!(
            DriverAssignment::from(missing_id),
            DriverAssignment::Unavailable { .. }
        ));
    }

    #[test]
    fn test_complete_request_omits_missing_duration() {
        let json = serde_json::to_value(CompleteRequest {
            actual_duration_min: None,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({}));

        let json = serde_json::to_value(CompleteRequest {
            actual_duration_min: Some(18),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "actualDurationMin": 18 }));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_a_collaborator_error() {
        let client =
            HttpDriverClient::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap();
        let err = client.request_driver(ShipmentId::new()).await.unwrap_err();
        assert!(matches!(err, DeliveryError::DriverService(_)));
    }
}
