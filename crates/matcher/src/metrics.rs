// Metrics hooks for the recommendation engine.
//
// Each `Recommender` owns an optional observer installed with
// `Recommender::with_metrics`; there is no process-wide recorder, so two
// engines in one process report independently. The root crate ships an
// implementation backed by the `metrics` facade.
use std::time::Duration;

/// Observer for engine operations.
pub trait RecommendMetrics: Send + Sync {
    /// A recommend call finished with `hit_count` results.
    fn record_recommend(&self, latency: Duration, hit_count: usize);

    /// A training run finished. `dataset_size` is the catalog size the run
    /// saw (zero when the catalog could not be read).
    fn record_training(&self, latency: Duration, dataset_size: usize, success: bool);
}
