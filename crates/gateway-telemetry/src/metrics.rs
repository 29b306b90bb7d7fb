//! Prometheus exposition for the gateway's counters.
//!
//! Counters are registered in the default registry by `gateway-core` when
//! its `metrics` feature is on; this module only renders them.

use prometheus::{Encoder, TextEncoder};

use crate::TelemetryError;

/// Render every metric in the default registry in the text exposition format.
pub fn render_metrics() -> Result<String, TelemetryError> {
    let families = prometheus::gather();
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
