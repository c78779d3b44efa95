//! Monthly background retraining.
//!
//! [`MonthlyRetrain::run`] wakes up every `check_interval`, and on the
//! configured day of the month retrains the engine from its catalog once.
//! Training runs on tokio's blocking pool and is awaited before the next
//! check, so the loop never overlaps its own runs. A failed run is logged
//! and retried on the next check of the same day.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use catalog::CatalogSource;
use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use matcher::Recommender;
use thiserror::Error;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("day_of_month must be between 1 and 28 (got {0})")]
    InvalidDay(u32),
    #[error("check interval must be non-zero")]
    ZeroInterval,
}

/// Retrain on one fixed day of every month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthlyRetrain {
    day_of_month: u32,
    check_interval: Duration,
}

impl MonthlyRetrain {
    pub fn new(day_of_month: u32, check_interval: Duration) -> Result<Self, ScheduleError> {
        if !(1..=28).contains(&day_of_month) {
            return Err(ScheduleError::InvalidDay(day_of_month));
        }
        if check_interval.is_zero() {
            return Err(ScheduleError::ZeroInterval);
        }
        Ok(Self {
            day_of_month,
            check_interval,
        })
    }

    pub fn day_of_month(&self) -> u32 {
        self.day_of_month
    }

    pub fn check_interval(&self) -> Duration {
        self.check_interval
    }

    /// Due when `now` falls on the configured day and no run succeeded on
    /// that date yet.
    pub fn is_due(&self, now: DateTime<Utc>, last_success: Option<NaiveDate>) -> bool {
        now.day() == self.day_of_month && last_success != Some(now.date_naive())
    }

    /// Midnight UTC of the next configured day strictly after `now`'s date.
    ///
    /// On the configured day itself this already points at next month, even
    /// though the loop keeps retrying today until a run succeeds. `None` only
    /// past the end of chrono's calendar.
    pub fn next_run(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let today = now.date_naive();
        let this_month = today.with_day(self.day_of_month)?;
        let date = if this_month > today {
            this_month
        } else {
            this_month.checked_add_months(Months::new(1))?
        };
        Some(date.and_hms_opt(0, 0, 0)?.and_utc())
    }

    /// Runs until `shutdown` resolves.
    pub async fn run<F>(
        self,
        engine: Arc<Recommender>,
        source: Arc<dyn CatalogSource>,
        shutdown: F,
    ) where
        F: Future<Output = ()>,
    {
        self.run_with_clock(engine, source, shutdown, Utc::now).await
    }

    /// [`MonthlyRetrain::run`] with an injectable clock.
    pub async fn run_with_clock<F, C>(
        self,
        engine: Arc<Recommender>,
        source: Arc<dyn CatalogSource>,
        shutdown: F,
        clock: C,
    ) where
        F: Future<Output = ()>,
        C: Fn() -> DateTime<Utc>,
    {
        info!(
            day_of_month = self.day_of_month,
            check_interval_secs = self.check_interval.as_secs(),
            "retrain_schedule_started"
        );
        let mut ticker = tokio::time::interval(self.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        let mut last_success: Option<NaiveDate> = None;
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {}
            }

            let now = clock();
            if !self.is_due(now, last_success) {
                continue;
            }

            let engine = Arc::clone(&engine);
            let source = Arc::clone(&source);
            match tokio::task::spawn_blocking(move || engine.train_from(source.as_ref())).await {
                Ok(Ok(outcome)) => {
                    last_success = Some(now.date_naive());
                    info!(
                        model_version = %outcome.model_version,
                        dataset_size = outcome.dataset_size,
                        avg_similarity = outcome.avg_similarity,
                        "scheduled_retrain_success"
                    );
                }
                Ok(Err(err)) => warn!(error = %err, "scheduled_retrain_failure"),
                Err(err) => warn!(error = %err, "scheduled_retrain_aborted"),
            }
        }
        info!("retrain_schedule_stopped");
    }
}
