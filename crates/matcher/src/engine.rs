use std::sync::{Arc, Mutex, RwLock, TryLockError};
use std::time::Instant;

use catalog::{CatalogSource, ProducerRecord};
use encoder::Vocabulary;
use index::{ModelSnapshot, SnapshotStore};
use tracing::{info, warn, Level};
use trainer::{train, TrainingOutcome};

use crate::assist::{constrain_to_vocabulary, QueryTranslator};
use crate::metrics::RecommendMetrics;
use crate::resolve::resolve;
use crate::types::{EngineConfig, EngineError, RecommendQuery, Recommendation};


/// Serves recommendations from the live snapshot and retrains it on demand.
///
/// Readers clone an `Arc` to the current snapshot and resolve against it
/// without holding any lock, so a training run that swaps in a new snapshot
/// never blocks or tears an in-flight request. Only one training run may be
/// active at a time.
pub struct Recommender {
    config: EngineConfig,
    current: RwLock<Option<Arc<ModelSnapshot>>>,
    training: Mutex<()>,
    store: Option<SnapshotStore>,
    metrics: Option<Arc<dyn RecommendMetrics>>,
}

impl Recommender {
    /// An engine with no model and no persistence.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            config,
            current: RwLock::new(None),
            training: Mutex::new(()),
            store: None,
            metrics: None,
        })
    }

    /// An engine that persists every trained snapshot to `store`. Nothing is
    /// loaded; call [`Recommender::reload`] or use [`Recommender::open`].
    pub fn with_store(config: EngineConfig, store: SnapshotStore) -> Result<Self, EngineError> {
        let mut engine = Self::new(config)?;
        engine.store = Some(store);
        Ok(engine)
    }

    /// Like [`Recommender::with_store`], then loads the persisted snapshot if
    /// there is one. An unreadable snapshot is logged and the engine starts
    /// without a model.
    pub fn open(config: EngineConfig, store: SnapshotStore) -> Result<Self, EngineError> {
        let engine = Self::with_store(config, store)?;
        if let Err(err) = engine.reload() {
            warn!(error = %err, "snapshot_load_failure");
        }
        Ok(engine)
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn RecommendMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replaces the live snapshot with the persisted one. Returns `false`
    /// (and leaves the live snapshot alone) when nothing is persisted or no
    /// store is attached.
    pub fn reload(&self) -> Result<bool, EngineError> {
        let Some(store) = &self.store else {
            return Ok(false);
        };
        match store.load()? {
            Some(snapshot) => {
                self.install(Arc::new(snapshot));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// The snapshot currently serving requests.
    pub fn snapshot(&self) -> Option<Arc<ModelSnapshot>> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn is_trained(&self) -> bool {
        self.snapshot().is_some()
    }

    /// Tag lists known to the live model.
    pub fn vocabulary(&self) -> Option<Vocabulary> {
        self.snapshot().map(|s| s.vocabulary().clone())
    }

    /// Trains on `catalog`, persists the result, then makes it live.
    ///
    /// On any failure the previous snapshot keeps serving. Fails fast with
    /// [`EngineError::TrainingInProgress`] when another run is active.
    pub fn train(&self, catalog: &[ProducerRecord]) -> Result<TrainingOutcome, EngineError> {
        let _guard = self.training_guard()?;
        let start = Instant::now();
        let result = self.train_locked(catalog);
        self.record_training(start, catalog.len(), result.is_ok());
        result
    }

    /// Reads the full catalog from `source` and trains on it.
    pub fn train_from(&self, source: &dyn CatalogSource) -> Result<TrainingOutcome, EngineError> {
        let _guard = self.training_guard()?;
        let start = Instant::now();
        let catalog = match source.producers() {
            Ok(catalog) => catalog,
            Err(err) => {
                warn!(error = %err, "catalog_read_failure");
                self.record_training(start, 0, false);
                return Err(EngineError::TrainingFailed(format!(
                    "catalog unavailable: {err}"
                )));
            }
        };
        let result = self.train_locked(&catalog);
        self.record_training(start, catalog.len(), result.is_ok());
        result
    }

    fn training_guard(&self) -> Result<std::sync::MutexGuard<'_, ()>, EngineError> {
        match self.training.try_lock() {
            Ok(guard) => Ok(guard),
            Err(TryLockError::WouldBlock) => Err(EngineError::TrainingInProgress),
            // A panicked run left nothing half-installed; the guard protects no data.
            Err(TryLockError::Poisoned(poisoned)) => Ok(poisoned.into_inner()),
        }
    }

    fn train_locked(&self, catalog: &[ProducerRecord]) -> Result<TrainingOutcome, EngineError> {
        let trained = train(catalog, &self.config.training)?;
        if let Some(store) = &self.store {
            if let Err(err) = store.save(&trained.snapshot) {
                warn!(error = %err, "snapshot_persist_failure");
                return Err(EngineError::TrainingFailed(format!(
                    "could not persist snapshot: {err}"
                )));
            }
        }
        self.install(Arc::new(trained.snapshot));
        Ok(trained.outcome)
    }

    fn install(&self, snapshot: Arc<ModelSnapshot>) {
        let version = snapshot.metadata().model_version.clone();
        match self.current.write() {
            Ok(mut guard) => *guard = Some(snapshot),
            Err(poisoned) => *poisoned.into_inner() = Some(snapshot),
        }
        info!(model_version = %version, "snapshot_installed");
    }

    fn record_training(&self, start: Instant, dataset_size: usize, success: bool) {
        if let Some(metrics) = &self.metrics {
            metrics.record_training(start.elapsed(), dataset_size, success);
        }
    }

    /// Ranks producers for a structured query.
    ///
    /// `query.top_n` overrides the configured default. Returns
    /// [`EngineError::NoModelLoaded`] before the first training run; an
    /// empty list means the model is live but nothing passed the genre gate.
    pub fn recommend(&self, query: &RecommendQuery) -> Result<Vec<Recommendation>, EngineError> {
        let span = tracing::span!(
            Level::INFO,
            "matcher.recommend",
            genres = query.genres.len(),
            top_n = query.top_n.unwrap_or(self.config.top_n)
        );
        let _guard = span.enter();
        let start = Instant::now();

        let snapshot = self.snapshot().ok_or(EngineError::NoModelLoaded)?;
        let top_n = query.top_n.unwrap_or(self.config.top_n);
        let hits = resolve(&snapshot, query, top_n);

        let latency = start.elapsed();
        if let Some(metrics) = &self.metrics {
            metrics.record_recommend(latency, hits.len());
        }
        info!(
            model_version = %snapshot.metadata().model_version,
            hits = hits.len(),
            elapsed_micros = latency.as_micros() as u64,
            "recommend_complete"
        );
        Ok(hits)
    }

    /// Translates free text into a query over the live vocabulary, then
    /// recommends. Text that names no known genre or skill yields an empty
    /// result.
    pub async fn recommend_text(
        &self,
        text: &str,
        translator: &dyn QueryTranslator,
    ) -> Result<Vec<Recommendation>, EngineError> {
        let snapshot = self.snapshot().ok_or(EngineError::NoModelLoaded)?;
        let vocabulary = snapshot.vocabulary();
        let raw = translator
            .translate(text, vocabulary)
            .await
            .map_err(|e| EngineError::Translation(e.to_string()))?;
        let query = constrain_to_vocabulary(raw, vocabulary);
        if query.genres.is_empty() && query.skills.is_empty() {
            info!("query_translation_empty");
            return Ok(Vec::new());
        }
        self.recommend(&query)
    }
}
