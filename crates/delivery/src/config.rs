//! Runtime configuration loaded from environment variables.

use std::time::Duration;

use shipment_store::PostgresShipmentStore;

use crate::error::{DeliveryError, Result};

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,

    /// One JSON object per line.
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Delivery service configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `DATABASE_URL`: PostgreSQL connection string (optional, in-memory store when unset)
/// - `DRIVER_SERVICE_URL`: base URL of the driver service (default: `"http://localhost:19094"`)
/// - `DRIVER_REQUEST_TIMEOUT_MS`: per-request timeout (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `pretty` or `json` (default: `pretty`)
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    pub database_url: Option<String>,
    pub driver_service_url: String,
    pub driver_request_timeout: Duration,
    pub log_level: String,
    pub log_format: LogFormat,
}

const DEFAULT_DRIVER_SERVICE_URL: &str = "http://localhost:19094";
const DEFAULT_DRIVER_TIMEOUT_MS: u64 = 3000;

impl DeliveryConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            driver_service_url: lookup("DRIVER_SERVICE_URL")
                .unwrap_or_else(|| DEFAULT_DRIVER_SERVICE_URL.to_string()),
            driver_request_timeout: Duration::from_millis(
                lookup("DRIVER_REQUEST_TIMEOUT_MS")
                    .and_then(|ms| ms.parse().ok())
                    .unwrap_or(DEFAULT_DRIVER_TIMEOUT_MS),
            ),
            log_level: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            log_format: lookup("LOG_FORMAT")
                .map(|f| LogFormat::parse(&f))
                .unwrap_or_default(),
        }
    }
}

impl DeliveryConfig {
    /// Connects to `DATABASE_URL` and applies pending migrations.
    pub async fn connect_store(&self) -> Result<PostgresShipmentStore> {
        let url = self
            .database_url
            .as_deref()
            .ok_or_else(|| DeliveryError::Config("DATABASE_URL is not set".to_string()))?;

        let store = PostgresShipmentStore::connect(url).await?;
        store.run_migrations().await?;
        tracing::info!("connected to shipment database");
        Ok(store)
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> DeliveryConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        DeliveryConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = DeliveryConfig::default();
        assert_eq!(config.database_url, None);
        assert_eq!(config.driver_service_url, "http://localhost:19094");
        assert_eq!(config.driver_request_timeout, Duration::from_millis(3000));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_values_from_environment() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/delivery"),
            ("DRIVER_SERVICE_URL", "http://drivers:8080"),
            ("DRIVER_REQUEST_TIMEOUT_MS", "750"),
            ("RUST_LOG", "delivery=debug"),
            ("LOG_FORMAT", "JSON"),
        ]);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/delivery")
        );
        assert_eq!(config.driver_service_url, "http://drivers:8080");
        assert_eq!(config.driver_request_timeout, Duration::from_millis(750));
        assert_eq!(config.log_level, "delivery=debug");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[tokio::test]
    async fn test_connect_store_requires_database_url() {
        let result = DeliveryConfig::default().connect_store().await;
        assert!(matches!(result, Err(DeliveryError::Config(_))));
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let config = config_from(&[
            ("DATABASE_URL", "  "),
            ("DRIVER_REQUEST_TIMEOUT_MS", "soon"),
            ("LOG_FORMAT", "yaml"),
        ]);
        assert_eq!(config.database_url, None);
        assert_eq!(config.driver_request_timeout, Duration::from_millis(3000));
        assert_eq!(config.log_format, LogFormat::Pretty);
    }
}
