//! Point-in-time report on the engine and its retrain schedule.

use chrono::{DateTime, Utc};
use matcher::Recommender;
use serde::Serialize;

use crate::schedule::MonthlyRetrain;

/// What `harmonix status` prints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceStatus {
    pub model_loaded: bool,
    pub model_version: Option<String>,
    pub trained_at: Option<DateTime<Utc>>,
    pub dataset_size: Option<usize>,
    /// `None` when the schedule is disabled.
    pub next_retrain: Option<DateTime<Utc>>,
}

impl ServiceStatus {
    pub fn collect(
        engine: &Recommender,
        schedule: Option<&MonthlyRetrain>,
        now: DateTime<Utc>,
    ) -> Self {
        let snapshot = engine.snapshot();
        let metadata = snapshot.as_ref().map(|s| s.metadata());
        Self {
            model_loaded: snapshot.is_some(),
            model_version: metadata.map(|m| m.model_version.clone()),
            trained_at: metadata.map(|m| m.trained_at),
            dataset_size: metadata.map(|m| m.dataset_size),
            next_retrain: schedule.and_then(|s| s.next_run(now)),
        }
    }
}
