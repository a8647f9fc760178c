//! Strategy variants — pluggable selection policies under comparison.
//!
//! A variant is a pure decision function: given the as-of market view, the
//! ranked candidates for the date, and its own ledger, it returns desired
//! target weights. It mutates nothing and sees nothing beyond the view it is
//! handed; the loop enforces that boundary by construction (the trait has no
//! access to the series, the feed, or other variants' ledgers).

pub mod confidence;
pub mod threshold;
pub mod top_k;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Candidate, Ledger};
use crate::market::MarketView;

pub use confidence::ConfidenceWeighted;
pub use threshold::ScoreThreshold;
pub use top_k::TopKEqualWeight;

/// Desired portfolio expressed as symbol → fraction of equity.
///
/// Weights are clamped non-negative on insert; symbols absent from the map
/// are targets of zero (the allocator will sell them down).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetWeights {
    weights: BTreeMap<String, f64>,
}

impl TargetWeights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, symbol: impl Into<String>, weight: f64) {
        self.weights.insert(symbol.into(), weight.max(0.0));
    }

    pub fn get(&self, symbol: &str) -> f64 {
        self.weights.get(symbol).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(s, &w)| (s.as_str(), w))
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.weights.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }
}

/// One selection policy under comparison.
pub trait StrategyVariant: Send + Sync {
    fn name(&self) -> &str;

    /// Decide desired target weights for this step.
    fn decide(
        &self,
        view: &MarketView<'_>,
        candidates: &[Candidate],
        ledger: &Ledger,
    ) -> TargetWeights;
}

#[derive(Debug, Error)]
pub enum VariantError {
    #[error("variant parameter out of range: {0}")]
    BadParameter(String),
}

/// Serializable variant configuration — the registry of named policies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VariantConfig {
    /// Equal weight across the top K candidates by score.
    TopKEqualWeight { k: usize, total_exposure: f64 },

    /// Weights proportional to candidate confidence scores.
    ConfidenceWeighted { max_names: usize, total_exposure: f64 },

    /// Equal weight across candidates at or above a minimum score.
    ScoreThreshold {
        min_score: f64,
        max_names: usize,
        total_exposure: f64,
    },
}

impl VariantConfig {
    /// Build the policy this config describes.
    pub fn build(&self) -> Result<Box<dyn StrategyVariant>, VariantError> {
        match *self {
            VariantConfig::TopKEqualWeight { k, total_exposure } => {
                check_exposure(total_exposure)?;
                if k == 0 {
                    return Err(VariantError::BadParameter("k must be at least 1".into()));
                }
                Ok(Box::new(TopKEqualWeight::new(k, total_exposure)))
            }
            VariantConfig::ConfidenceWeighted {
                max_names,
                total_exposure,
            } => {
                check_exposure(total_exposure)?;
                if max_names == 0 {
                    return Err(VariantError::BadParameter(
                        "max_names must be at least 1".into(),
                    ));
                }
                Ok(Box::new(ConfidenceWeighted::new(max_names, total_exposure)))
            }
            VariantConfig::ScoreThreshold {
                min_score,
                max_names,
                total_exposure,
            } => {
                check_exposure(total_exposure)?;
                if !(0.0..=100.0).contains(&min_score) {
                    return Err(VariantError::BadParameter(format!(
                        "min_score must be within 0..=100, got {min_score}"
                    )));
                }
                if max_names == 0 {
                    return Err(VariantError::BadParameter(
                        "max_names must be at least 1".into(),
                    ));
                }
                Ok(Box::new(ScoreThreshold::new(min_score, max_names, total_exposure)))
            }
        }
    }
}

fn check_exposure(total_exposure: f64) -> Result<(), VariantError> {
    if !(0.0..=1.0).contains(&total_exposure) || !total_exposure.is_finite() {
        return Err(VariantError::BadParameter(format!(
            "total_exposure must be within 0..=1, got {total_exposure}"
        )));
    }
    Ok(())
}

/// A variant with the identity it is compared under.
pub struct NamedVariant {
    pub id: String,
    pub policy: Box<dyn StrategyVariant>,
}

/// Build named variants from (id, config) pairs, sorted by id.
///
/// The sort fixes the per-step iteration order, which the determinism
/// guarantee depends on.
pub fn build_variants(
    specs: &[(String, VariantConfig)],
) -> Result<Vec<NamedVariant>, VariantError> {
    let mut variants = specs
        .iter()
        .map(|(id, config)| {
            Ok(NamedVariant {
                id: id.clone(),
                policy: config.build()?,
            })
        })
        .collect::<Result<Vec<_>, VariantError>>()?;
    variants.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(variants)
}
