//! # Gateway Telemetry
//!
//! Observability bootstrap for processes hosting a Quorum-Gateway.
//!
//! ## Components
//!
//! - Structured logs: pretty for development, JSON for log shippers
//! - Distributed traces: OTLP export (`otlp` feature)
//! - Metrics: Prometheus text rendering of the gateway counters
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gateway_telemetry::{TelemetryConfig, init_telemetry};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = TelemetryConfig::from_env();
//!     let _guard = init_telemetry(config).await.expect("Failed to init telemetry");
//!     // Gateway events are now logged and, if configured, exported
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | unset | OTLP collector endpoint |
//! | `OTEL_SERVICE_NAME` | `quorum-gateway` | Service name in logs and traces |
//! | `GW_LOG_LEVEL` | `info` | Log filter (falls back to `RUST_LOG`) |
//! | `GW_JSON_LOGS` | `false` | JSON output (`true` inside containers) |
//! | `GW_CONSOLE_OUTPUT` | `true` | Write logs to stdout |

#![warn(missing_docs)]

mod config;
mod metrics;
mod tracing_setup;

pub use config::{TelemetryConfig, DEFAULT_SERVICE_NAME};
pub use metrics::render_metrics;
pub use tracing_setup::TracingGuard;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// OTLP pipeline could not be built
    #[error("Failed to initialize OpenTelemetry tracer: {0}")]
    TracerInit(String),

    /// A global subscriber is already installed
    #[error("Failed to install tracing subscriber: {0}")]
    SubscriberInit(String),

    /// Metric families could not be encoded
    #[error("Failed to render Prometheus metrics: {0}")]
    MetricsInit(String),

    /// Invalid configuration (bad filter directive)
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Install logging and, when configured, span export.
///
/// Returns a guard that must be held for the lifetime of the application.
/// When dropped, pending spans are flushed. Call from inside a Tokio runtime
/// when an OTLP endpoint is configured.
pub async fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let tracing = tracing_setup::init_tracing(&config)?;
    Ok(TelemetryGuard {
        _tracing: tracing,
        service_name: config.service_name,
    })
}

/// Guard that keeps telemetry active. Drop to flush and shutdown.
pub struct TelemetryGuard {
    _tracing: TracingGuard,
    service_name: String,
}

impl TelemetryGuard {
    /// Service name the subscriber was installed for.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry...");
    }
}
