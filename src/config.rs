//! YAML configuration for the recommender.
//!
//! Every section is optional and falls back to its defaults; the loaded file
//! is validated as a whole before anything is built from it.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//!
//! encoder:
//!   genre_weight: 2.0
//!   skill_weight: 2.0
//!   tool_weight: 1.0
//!   experience_weight: 1.0
//!
//! training:
//!   min_catalog_size: 5
//!   n_neighbors: 11
//!   use_parallel: false
//!
//! store:
//!   backend: "directory"
//!   path: "./model"
//!   model_key: "producer_recommender_model.bin"
//!   metadata_key: "model_metadata.json"
//!   compression: "zstd"
//!   compression_level: 3
//!
//! recommend:
//!   top_n: 3
//!
//! schedule:
//!   enabled: true
//!   day_of_month: 1
//!   check_interval_secs: 3600
//!
//! logging:
//!   level: "info"
//!   json: false
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use encoder::FeatureWeights;
use index::{
    BackendConfig, CompressionCodec, CompressionConfig, StoreConfig, DEFAULT_METADATA_KEY,
    DEFAULT_MODEL_KEY,
};
use matcher::{EngineConfig, DEFAULT_TOP_N};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use trainer::TrainingConfig;

use crate::schedule::MonthlyRetrain;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RecommenderConfig {
    /// Configuration format version
    pub version: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub encoder: EncoderYamlConfig,

    #[serde(default)]
    pub training: TrainingYamlConfig,

    #[serde(default)]
    pub store: StoreYamlConfig,

    #[serde(default)]
    pub recommend: RecommendYamlConfig,

    #[serde(default)]
    pub schedule: ScheduleYamlConfig,

    #[serde(default)]
    pub logging: LoggingYamlConfig,
}

impl RecommenderConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: RecommenderConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.encoder.validate()?;
        self.training.validate()?;
        self.store.validate()?;
        self.recommend.validate()?;
        self.schedule.validate()?;
        Ok(())
    }

    pub fn weights(&self) -> FeatureWeights {
        FeatureWeights::new()
            .with_genre(self.encoder.genre_weight)
            .with_skill(self.encoder.skill_weight)
            .with_tool(self.encoder.tool_weight)
            .with_experience(self.encoder.experience_weight)
    }

    pub fn engine_config(&self) -> EngineConfig {
        let training = TrainingConfig::new()
            .with_min_catalog_size(self.training.min_catalog_size)
            .with_n_neighbors(self.training.n_neighbors)
            .with_weights(self.weights())
            .with_parallel(self.training.use_parallel);
        EngineConfig::new()
            .with_training(training)
            .with_top_n(self.recommend.top_n)
    }

    pub fn store_config(&self) -> StoreConfig {
        self.store.to_store_config()
    }

    /// The retrain schedule, or `None` when disabled.
    pub fn retrain_schedule(&self) -> Option<MonthlyRetrain> {
        if !self.schedule.enabled {
            return None;
        }
        MonthlyRetrain::new(
            self.schedule.day_of_month,
            Duration::from_secs(self.schedule.check_interval_secs),
        )
        .ok()
    }
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            encoder: EncoderYamlConfig::default(),
            training: TrainingYamlConfig::default(),
            store: StoreYamlConfig::default(),
            recommend: RecommendYamlConfig::default(),
            schedule: ScheduleYamlConfig::default(),
            logging: LoggingYamlConfig::default(),
        }
    }
}

/// Per-segment feature weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderYamlConfig {
    #[serde(default = "default_genre_weight")]
    pub genre_weight: f32,
    #[serde(default = "default_skill_weight")]
    pub skill_weight: f32,
    #[serde(default = "default_tool_weight")]
    pub tool_weight: f32,
    #[serde(default = "default_experience_weight")]
    pub experience_weight: f32,
}

impl EncoderYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        FeatureWeights::new()
            .with_genre(self.genre_weight)
            .with_skill(self.skill_weight)
            .with_tool(self.tool_weight)
            .with_experience(self.experience_weight)
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("encoder: {e}")))
    }
}

impl Default for EncoderYamlConfig {
    fn default() -> Self {
        let weights = FeatureWeights::default();
        Self {
            genre_weight: weights.genre,
            skill_weight: weights.skill,
            tool_weight: weights.tool,
            experience_weight: weights.experience,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingYamlConfig {
    #[serde(default = "default_min_catalog_size")]
    pub min_catalog_size: usize,
    #[serde(default = "default_n_neighbors")]
    pub n_neighbors: usize,
    #[serde(default)]
    pub use_parallel: bool,
}

impl TrainingYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.min_catalog_size == 0 {
            return Err(ConfigLoadError::Validation(
                "training.min_catalog_size must be >= 1".to_string(),
            ));
        }
        if self.n_neighbors < 2 {
            return Err(ConfigLoadError::Validation(
                "training.n_neighbors must be >= 2".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for TrainingYamlConfig {
    fn default() -> Self {
        Self {
            min_catalog_size: default_min_catalog_size(),
            n_neighbors: default_n_neighbors(),
            use_parallel: false,
        }
    }
}

/// Snapshot store YAML configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreYamlConfig {
    /// `in_memory`, `directory` or `redb`.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Model directory (`directory`) or database file (`redb`).
    #[serde(default = "default_store_path")]
    pub path: Option<PathBuf>,

    #[serde(default = "default_model_key")]
    pub model_key: String,

    #[serde(default = "default_metadata_key")]
    pub metadata_key: String,

    /// `zstd` or `none`.
    #[serde(default = "default_compression")]
    pub compression: String,

    #[serde(default = "default_compression_level")]
    pub compression_level: i32,
}

impl StoreYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        let valid_backends = ["in_memory", "directory", "redb"];
        if !valid_backends.contains(&self.backend.as_str()) {
            return Err(ConfigLoadError::Validation(format!(
                "store.backend must be one of: {valid_backends:?}"
            )));
        }
        if self.backend != "in_memory" && self.path.is_none() {
            return Err(ConfigLoadError::Validation(format!(
                "store.path is required when backend is '{}'",
                self.backend
            )));
        }

        let valid_codecs = ["zstd", "none"];
        if !valid_codecs.contains(&self.compression.as_str()) {
            return Err(ConfigLoadError::Validation(format!(
                "store.compression must be one of: {valid_codecs:?}"
            )));
        }
        if self.compression == "zstd" && !(1..=22).contains(&self.compression_level) {
            return Err(ConfigLoadError::Validation(
                "store.compression_level must be between 1 and 22".to_string(),
            ));
        }

        self.to_store_config()
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("store: {e}")))
    }

    fn to_store_config(&self) -> StoreConfig {
        let backend = match (self.backend.as_str(), &self.path) {
            ("directory", Some(path)) => BackendConfig::directory(path.clone()),
            ("redb", Some(path)) => BackendConfig::redb(path.clone()),
            _ => BackendConfig::in_memory(),
        };
        let codec = match self.compression.as_str() {
            "none" => CompressionCodec::None,
            _ => CompressionCodec::Zstd,
        };
        StoreConfig::new()
            .with_backend(backend)
            .with_compression(CompressionConfig::new(codec, self.compression_level))
            .with_keys(self.model_key.clone(), self.metadata_key.clone())
    }
}

impl Default for StoreYamlConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_store_path(),
            model_key: default_model_key(),
            metadata_key: default_metadata_key(),
            compression: default_compression(),
            compression_level: default_compression_level(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendYamlConfig {
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl RecommendYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.top_n == 0 {
            return Err(ConfigLoadError::Validation(
                "recommend.top_n must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for RecommendYamlConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
        }
    }
}

/// Monthly retrain YAML configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleYamlConfig {
    #[serde(default = "true_value")]
    pub enabled: bool,

    /// Capped at 28 so every month has the day.
    #[serde(default = "default_day_of_month")]
    pub day_of_month: u32,

    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,
}

impl ScheduleYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if !(1..=28).contains(&self.day_of_month) {
            return Err(ConfigLoadError::Validation(
                "schedule.day_of_month must be between 1 and 28".to_string(),
            ));
        }
        if self.check_interval_secs == 0 {
            return Err(ConfigLoadError::Validation(
                "schedule.check_interval_secs must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ScheduleYamlConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            day_of_month: default_day_of_month(),
            check_interval_secs: default_check_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingYamlConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingYamlConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn true_value() -> bool {
    true
}
fn default_genre_weight() -> f32 {
    FeatureWeights::default().genre
}
fn default_skill_weight() -> f32 {
    FeatureWeights::default().skill
}
fn default_tool_weight() -> f32 {
    FeatureWeights::default().tool
}
fn default_experience_weight() -> f32 {
    FeatureWeights::default().experience
}
fn default_min_catalog_size() -> usize {
    TrainingConfig::default().min_catalog_size
}
fn default_n_neighbors() -> usize {
    TrainingConfig::default().n_neighbors
}
fn default_backend() -> String {
    "directory".to_string()
}
fn default_store_path() -> Option<PathBuf> {
    Some(PathBuf::from("./model"))
}
fn default_model_key() -> String {
    DEFAULT_MODEL_KEY.to_string()
}
fn default_metadata_key() -> String {
    DEFAULT_METADATA_KEY.to_string()
}
fn default_compression() -> String {
    "zstd".to_string()
}
fn default_compression_level() -> i32 {
    3
}
fn default_top_n() -> usize {
    DEFAULT_TOP_N
}
fn default_day_of_month() -> u32 {
    1
}
fn default_check_interval_secs() -> u64 {
    3600
}
fn default_log_level() -> String {
    "info".to_string()
}
