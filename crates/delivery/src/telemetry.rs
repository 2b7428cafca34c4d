//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{DeliveryConfig, LogFormat};
use crate::error::{DeliveryError, Result};

/// Builds the env filter, preferring `RUST_LOG` from the process
/// environment over the configured level.
pub fn env_filter(config: &DeliveryConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
}

/// Installs the global tracing subscriber.
///
/// Fails if a global subscriber is already set.
pub fn init_tracing(config: &DeliveryConfig) -> Result<()> {
    let registry = tracing_subscriber::registry().with(env_filter(config));

    let installed = match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };

    installed.map_err(|e| DeliveryError::Telemetry(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_install_is_rejected() {
        let config = DeliveryConfig {
            log_format: LogFormat::Json,
            ..DeliveryConfig::default()
        };

        let _ = init_tracing(&config);
        assert!(matches!(
            init_tracing(&config),
            Err(DeliveryError::Telemetry(_))
        ));
    }
}
