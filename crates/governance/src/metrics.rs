//! Metrics implementation using Prometheus.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use recordops_core::{Error, Result};

/// Initialize Prometheus recorder and return the handle.
pub fn setup_metrics_recorder() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| Error::internal(format!("Failed to install Prometheus recorder: {}", e)))?;

    tracing::info!("Prometheus metrics recorder initialized");
    Ok(handle)
}

/// Records removed by a class purge or a retention drain.
pub fn track_records_deleted(class_name: &str, count: usize) {
    metrics::counter!("records_deleted_total", "class" => class_name.to_string())
        .increment(count as u64);
}

/// Files removed by a retention sweep.
pub fn track_files_deleted(strategy: &str, count: usize) {
    metrics::counter!("files_deleted_total", "strategy" => strategy.to_string())
        .increment(count as u64);
}

/// Rows saved by a replace-all import.
pub fn track_records_imported(class_name: &str, count: usize) {
    metrics::counter!("records_imported_total", "class" => class_name.to_string())
        .increment(count as u64);
}
