//! Logging setup for the binary and a `metrics` facade recorder.

#[cfg(feature = "telemetry")]
use std::time::Duration;

#[cfg(feature = "telemetry")]
use matcher::RecommendMetrics;

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` wins over `level` when set. Returns an error when a subscriber
/// is already installed.
#[cfg(feature = "cli")]
pub fn init_tracing(level: &str, json: bool) -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow::anyhow!("tracing subscriber: {e}"))
}

/// Forwards engine observations to whatever `metrics` recorder the
/// application installed.
///
/// Emits `harmonix_recommend_total`, `harmonix_recommend_latency_seconds`,
/// `harmonix_recommend_hits`, `harmonix_training_total{outcome}`,
/// `harmonix_training_latency_seconds` and `harmonix_catalog_size`.
#[cfg(feature = "telemetry")]
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsRecorder;

#[cfg(feature = "telemetry")]
impl RecommendMetrics for MetricsRecorder {
    fn record_recommend(&self, latency: Duration, hit_count: usize) {
        metrics::counter!("harmonix_recommend_total").increment(1);
        metrics::histogram!("harmonix_recommend_latency_seconds").record(latency.as_secs_f64());
        metrics::histogram!("harmonix_recommend_hits").record(hit_count as f64);
    }

    fn record_training(&self, latency: Duration, dataset_size: usize, success: bool) {
        let outcome = if success { "success" } else { "failure" };
        metrics::counter!("harmonix_training_total", "outcome" => outcome).increment(1);
        metrics::histogram!("harmonix_training_latency_seconds").record(latency.as_secs_f64());
        if success {
            metrics::gauge!("harmonix_catalog_size").set(dataset_size as f64);
        }
    }
}
