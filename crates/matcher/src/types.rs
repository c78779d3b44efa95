use catalog::normalize_tags;
use index::IndexError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use trainer::{TrainingConfig, TrainingError};

/// Results returned when neither the query nor the engine config says
/// otherwise.
pub const DEFAULT_TOP_N: usize = 3;

/// A structured recommendation request.
///
/// Missing lists deserialize as empty. `top_n` overrides the engine default
/// for this request only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendQuery {
    pub genres: Vec<String>,
    pub skills: Vec<String>,
    pub tools: Vec<String>,
    pub experience: Option<String>,
    pub top_n: Option<usize>,
}

impl RecommendQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres = genres.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skills = skills.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_experience(mut self, experience: impl Into<String>) -> Self {
        self.experience = Some(experience.into());
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = Some(top_n);
        self
    }

    /// Trimmed, de-duplicated copy. Request order of genres is preserved
    /// because matching genres are reported in that order.
    pub fn normalized(&self) -> Self {
        Self {
            genres: normalize_tags(&self.genres),
            skills: normalize_tags(&self.skills),
            tools: normalize_tags(&self.tools),
            experience: self
                .experience
                .as_deref()
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string),
            top_n: self.top_n,
        }
    }
}

/// One ranked producer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub producer_id: String,
    pub name: String,
    /// `cosine × (1 + matched / requested)`, in `[0, 2]`.
    pub score: f32,
    /// Requested genres the producer declares, in request order.
    pub matching_genres: Vec<String>,
}

/// Engine-level settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub training: TrainingConfig,
    /// Default number of recommendations per request.
    pub top_n: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            training: TrainingConfig::default(),
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_training(mut self, training: TrainingConfig) -> Self {
        self.training = training;
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.top_n == 0 {
            return Err(EngineError::InvalidConfig("top_n must be >= 1".into()));
        }
        self.training
            .validate()
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))
    }
}

/// Errors surfaced by the recommendation engine.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// No snapshot has been trained or loaded yet.
    #[error("no model loaded; train the recommender first")]
    NoModelLoaded,

    #[error("not enough producers to train a model: {count} available, minimum {required}")]
    InsufficientData { count: usize, required: usize },

    #[error("training failed: {0}")]
    TrainingFailed(String),

    /// Another training run holds the training guard.
    #[error("a training run is already in progress")]
    TrainingInProgress,

    #[error("invalid engine config: {0}")]
    InvalidConfig(String),

    #[error("query translation failed: {0}")]
    Translation(String),

    #[error("snapshot store error: {0}")]
    Store(#[from] IndexError),
}

impl From<TrainingError> for EngineError {
    fn from(err: TrainingError) -> Self {
        match err {
            TrainingError::InsufficientData { count, required } => {
                EngineError::InsufficientData { count, required }
            }
            TrainingError::TrainingFailed(msg) => EngineError::TrainingFailed(msg),
            TrainingError::InvalidConfig(msg) => EngineError::InvalidConfig(msg),
        }
    }
}
