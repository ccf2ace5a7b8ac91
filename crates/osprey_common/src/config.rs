use serde::{Deserialize, Serialize};

/// Configuration for a compute node's partition state engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionEngineConfig {
    /// Bounded capacity of the per-partition log-tail entry channel.
    #[serde(default = "default_logtail_channel_capacity")]
    pub logtail_channel_capacity: usize,
    /// How long the applier waits for the next entry before re-checking
    /// its shutdown signal, in milliseconds.
    #[serde(default = "default_applier_poll_interval_ms")]
    pub applier_poll_interval_ms: u64,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

fn default_logtail_channel_capacity() -> usize {
    1024
}

fn default_applier_poll_interval_ms() -> u64 {
    100
}

impl Default for PartitionEngineConfig {
    fn default() -> Self {
        Self {
            logtail_channel_capacity: default_logtail_channel_capacity(),
            applier_poll_interval_ms: default_applier_poll_interval_ms(),
            metrics: MetricsConfig::default(),
        }
    }
}

/// Prometheus metrics endpoint configuration. When `listen_addr` is set,
/// the host installs an HTTP exporter there.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub listen_addr: String,
}

impl MetricsConfig {
    /// Returns true when a metrics listen address is configured.
    pub fn is_enabled(&self) -> bool {
        !self.listen_addr.is_empty()
    }
}
