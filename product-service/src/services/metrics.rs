//! Prometheus metrics for product-service.

use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the global Prometheus recorder. Safe to call more than once;
/// only the first call installs.
pub fn init_metrics() {
    METRICS_HANDLE.get_or_init(|| match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => handle,
        Err(e) => {
            tracing::warn!("Prometheus recorder not installed: {}", e);
            PrometheusBuilder::new().build_recorder().handle()
        }
    });
}

/// Get metrics output in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

/// Counts documents actually written by `operation` (`insert`, `update`,
/// `delete`). A write that matched nothing records nothing.
pub fn record_product_write(operation: &'static str, documents: u64) {
    if documents == 0 {
        return;
    }
    counter!("products_written_total", "operation" => operation).increment(documents);
}
