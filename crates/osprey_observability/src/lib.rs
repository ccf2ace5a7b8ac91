//! Observability setup: structured logging and the Prometheus metrics
//! endpoint.
//!
//! The partition state engine increments `osprey_logtail_entries_total`
//! (labelled by entry kind) through the `metrics` facade; installing the
//! exporter here makes per-entry apply throughput scrapable at the
//! well-known `/metrics` path.

use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber with structured logging.
pub fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,osprey=debug"));

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

/// Install the Prometheus metrics exporter and register descriptions
/// for the engine's counters. Returns once the HTTP listener is up.
pub fn init_metrics(listen_addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    let addr: std::net::SocketAddr = listen_addr.parse()?;
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    metrics::describe_counter!(
        "osprey_logtail_entries_total",
        "Log-tail entries applied to partition state, by entry kind"
    );
    tracing::info!("Prometheus metrics endpoint on http://{}/metrics", addr);
    Ok(())
}

/// Record snapshot-facade gauge readings for one partition.
pub fn record_partition_gauges(rows: usize, blocks: usize, pk_entries: usize) {
    metrics::gauge!("osprey_partition_row_versions").set(rows as f64);
    metrics::gauge!("osprey_partition_blocks").set(blocks as f64);
    metrics::gauge!("osprey_partition_pk_entries").set(pk_entries as f64);
}
