//! Prometheus metrics recorder and `/metrics` rendering.

use metrics_exporter_prometheus::{
    BuildError, Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder,
};
use tracing::info;
use wsrelay_core::metrics::MESSAGE_SIZE_BYTES;

/// Message-size histogram buckets: 64 bytes doubling up to 32 KiB.
pub fn message_size_buckets() -> Vec<f64> {
    (0..10).map(|i| 64.0 * f64::from(1u32 << i)).collect()
}

fn builder() -> Result<PrometheusBuilder, BuildError> {
    PrometheusBuilder::new().set_buckets_for_metric(
        Matcher::Full(MESSAGE_SIZE_BYTES.to_owned()),
        &message_size_buckets(),
    )
}

/// Build a recorder without installing it globally.
pub fn build_recorder() -> Result<PrometheusRecorder, BuildError> {
    Ok(builder()?.build_recorder())
}

/// Install the Prometheus recorder as the global `metrics` recorder.
///
/// Returns the handle used to render the `/metrics` endpoint. Fails if a
/// global recorder is already installed.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = builder()?.install_recorder()?;
    info!("prometheus metrics recorder installed");
    Ok(handle)
}

/// Render Prometheus text format from a recorder handle.
pub fn render(handle: &PrometheusHandle) -> String {
    handle.render()
}
