//! Serializable run configuration and content-addressed run IDs.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use selectlab_core::config::{ConfigError, Constraints, FeeModel, SimConfig};
use selectlab_core::feed::{CandidateProvider, MomentumProvider, ProviderChain};
use selectlab_core::market::Timeframe;
use selectlab_core::strategy::{VariantConfig, VariantError};

/// Unique identifier for a run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum RunConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("at least one variant is required")]
    NoVariants,

    #[error("duplicate variant id '{0}'")]
    DuplicateVariantId(String),

    #[error("universe must not be empty")]
    EmptyUniverse,

    #[error("at least one timeframe is required")]
    NoTimeframes,

    #[error("start_date {start} is after end_date {end}")]
    BadDateRange { start: NaiveDate, end: NaiveDate },

    #[error("at least one feed provider is required")]
    NoFeedProviders,

    #[error(transparent)]
    Engine(#[from] ConfigError),

    #[error("variant '{id}': {source}")]
    Variant { id: String, source: VariantError },
}

/// One named strategy variant in the comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantSpec {
    pub id: String,
    pub policy: VariantConfig,
}

/// A candidate feed provider in the fallback chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum FeedConfig {
    /// Deterministic trailing-return ranker (offline stand-in for AI feeds).
    Momentum { lookback: usize },
}

impl FeedConfig {
    fn build(&self) -> Box<dyn CandidateProvider> {
        match *self {
            FeedConfig::Momentum { lookback } => Box::new(MomentumProvider::new(lookback)),
        }
    }
}

/// Where bars come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum DataConfig {
    /// Seeded random-walk fixture data.
    Synthetic { seed: u64, days: usize },
    /// One CSV per symbol (`<dir>/<SYMBOL>.csv`, date/open/high/low/close/volume).
    Csv { dir: PathBuf },
}

/// Top-level `[run]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSection {
    pub initial_capital: f64,
    pub universe: Vec<String>,
    pub timeframes: Vec<Timeframe>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
    /// Override the per-timeframe annualization factor for Sharpe ratios.
    #[serde(default)]
    pub annualization: Option<f64>,
}

fn default_max_candidates() -> usize {
    10
}

/// Serializable configuration for a complete comparison run.
///
/// Captures everything needed to reproduce the run; two identical configs
/// hash to the same `RunId` and can share cached results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub run: RunSection,
    #[serde(default)]
    pub constraints: Constraints,
    #[serde(default)]
    pub fees: FeeModel,
    pub variants: Vec<VariantSpec>,
    pub feed: Vec<FeedConfig>,
    pub data: DataConfig,
}

impl RunConfig {
    pub fn from_path(path: &Path) -> Result<Self, RunConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, RunConfigError> {
        let config: RunConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RunConfigError> {
        if self.variants.is_empty() {
            return Err(RunConfigError::NoVariants);
        }
        let mut seen = std::collections::BTreeSet::new();
        for spec in &self.variants {
            if !seen.insert(&spec.id) {
                return Err(RunConfigError::DuplicateVariantId(spec.id.clone()));
            }
            spec.policy
                .build()
                .map_err(|source| RunConfigError::Variant {
                    id: spec.id.clone(),
                    source,
                })?;
        }
        if self.run.universe.is_empty() {
            return Err(RunConfigError::EmptyUniverse);
        }
        if self.run.timeframes.is_empty() {
            return Err(RunConfigError::NoTimeframes);
        }
        if self.feed.is_empty() {
            return Err(RunConfigError::NoFeedProviders);
        }
        if let (Some(start), Some(end)) = (self.run.start_date, self.run.end_date) {
            if start > end {
                return Err(RunConfigError::BadDateRange { start, end });
            }
        }
        self.to_sim_config().validate()?;
        Ok(())
    }

    /// Deterministic content hash of this configuration.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_string(self).expect("RunConfig serialization failed");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }

    /// Content hash of the (sorted) universe, for candidate cache keys.
    pub fn universe_hash(&self) -> String {
        let mut sorted = self.run.universe.clone();
        sorted.sort();
        blake3::hash(sorted.join("\n").as_bytes()).to_hex().to_string()
    }

    /// The engine-level configuration this run implies.
    pub fn to_sim_config(&self) -> SimConfig {
        SimConfig {
            initial_capital: self.run.initial_capital,
            constraints: self.constraints.clone(),
            fees: self.fees,
            max_candidates: self.run.max_candidates,
        }
    }

    /// Build the feed fallback chain in configured priority order.
    pub fn build_feed(&self) -> ProviderChain {
        ProviderChain::new(self.feed.iter().map(FeedConfig::build).collect())
    }

    /// Annualization factor for a timeframe (config override or the default).
    pub fn annualization(&self, timeframe: Timeframe) -> f64 {
        self.run
            .annualization
            .unwrap_or_else(|| timeframe.default_annualization())
    }
}
