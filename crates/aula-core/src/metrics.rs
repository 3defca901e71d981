//! Prometheus metrics helpers for the AULA pipeline.
//!
//! Ingestion is a one-shot synchronous batch job, so there is no scrape
//! endpoint: the binary installs the recorder at startup and renders the
//! accumulated metrics once at exit.
//!
//! # Metric Naming Conventions
//!
//! - Prefix: `ingest_`
//! - Suffix: unit or type (`_total`, `_bytes`)

use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus metrics recorder.
///
/// Returns `None` if a recorder is already installed (e.g. in tests).
/// The returned handle renders the accumulated metrics as Prometheus text.
pub fn try_init_metrics() -> Option<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder().ok()?;
    register_common_metrics();
    Some(handle)
}

/// Register descriptions for the metrics emitted by the pipeline.
fn register_common_metrics() {
    describe_counter!("ingest_batches_total", "Capture batches committed");
    describe_counter!(
        "ingest_batches_skipped_total",
        "Placeholder batches skipped by the size threshold"
    );
    describe_counter!("ingest_events_total", "Event payloads decoded and committed");
    describe_counter!("ingest_bytes_total", "Raw batch bytes read");
    describe_gauge!("ingest_running", "1 while an ingestion run is active");
}
