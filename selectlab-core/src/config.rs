//! Simulation configuration: allocation constraints, fee model, loop settings.
//!
//! Configuration is an explicit immutable value passed into each component at
//! construction. Validation happens once, before the first simulated date;
//! a bad value is fatal up front rather than a surprise mid-run.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be within {lo}..={hi}, got {value}")]
    OutOfRange {
        field: &'static str,
        lo: f64,
        hi: f64,
        value: f64,
    },

    #[error("initial capital must be positive, got {0}")]
    NonPositiveCapital(f64),

    #[error("max_open_positions must be at least 1")]
    ZeroPositionCap,

    #[error("{0}")]
    Invalid(String),
}

/// Allocation constraints applied to every variant's desired positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Constraints {
    /// Cap on per-symbol exposure as a fraction of current equity.
    pub max_position_pct: f64,
    /// Cap on the number of simultaneously open positions.
    pub max_open_positions: usize,
    /// Fraction of equity always held back as cash.
    pub min_cash_reserve_pct: f64,
    /// Optional liquidity cap: a single fill may not exceed this fraction of
    /// the fill bar's volume.
    pub max_trade_pct_of_volume: Option<f64>,
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            max_position_pct: 0.30,
            max_open_positions: 10,
            min_cash_reserve_pct: 0.0,
            max_trade_pct_of_volume: None,
        }
    }
}

impl Constraints {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_fraction("max_position_pct", self.max_position_pct)?;
        check_fraction("min_cash_reserve_pct", self.min_cash_reserve_pct)?;
        if self.max_open_positions == 0 {
            return Err(ConfigError::ZeroPositionCap);
        }
        if let Some(cap) = self.max_trade_pct_of_volume {
            check_fraction("max_trade_pct_of_volume", cap)?;
            if cap == 0.0 {
                return Err(ConfigError::Invalid(
                    "max_trade_pct_of_volume of 0 would defer every fill forever".into(),
                ));
            }
        }
        Ok(())
    }
}

fn check_fraction(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) || !value.is_finite() {
        return Err(ConfigError::OutOfRange {
            field,
            lo: 0.0,
            hi: 1.0,
            value,
        });
    }
    Ok(())
}

/// Per-fill fee model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeeModel {
    /// No transaction costs.
    None,
    /// Fixed basis points of fill notional, charged on every fill
    /// (1 bp = 0.01%).
    FixedBps { bps: f64 },
}

impl FeeModel {
    pub fn fee_for(&self, notional: f64) -> f64 {
        match self {
            FeeModel::None => 0.0,
            FeeModel::FixedBps { bps } => notional.abs() * bps / 10_000.0,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let FeeModel::FixedBps { bps } = self {
            if !bps.is_finite() || *bps < 0.0 || *bps > 10_000.0 {
                return Err(ConfigError::OutOfRange {
                    field: "fee_bps",
                    lo: 0.0,
                    hi: 10_000.0,
                    value: *bps,
                });
            }
        }
        Ok(())
    }
}

impl Default for FeeModel {
    fn default() -> Self {
        FeeModel::None
    }
}

/// Settings for one simulation loop run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    pub initial_capital: f64,
    pub constraints: Constraints,
    #[serde(default)]
    pub fees: FeeModel,
    /// Suggestions per date are truncated to this many, best score first.
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
}

fn default_max_candidates() -> usize {
    10
}

impl SimConfig {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            initial_capital,
            constraints: Constraints::default(),
            fees: FeeModel::None,
            max_candidates: default_max_candidates(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(ConfigError::NonPositiveCapital(self.initial_capital));
        }
        if self.max_candidates == 0 {
            return Err(ConfigError::Invalid(
                "max_candidates of 0 disables every strategy".into(),
            ));
        }
        self.constraints.validate()?;
        self.fees.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_constraints_are_valid() {
        Constraints::default().validate().unwrap();
    }

    #[test]
    fn rejects_position_pct_above_one() {
        let constraints = Constraints {
            max_position_pct: 1.5,
            ..Constraints::default()
        };
        assert!(matches!(
            constraints.validate(),
            Err(ConfigError::OutOfRange { field: "max_position_pct", .. })
        ));
    }

    #[test]
    fn rejects_zero_position_cap() {
        let constraints = Constraints {
            max_open_positions: 0,
            ..Constraints::default()
        };
        assert!(matches!(constraints.validate(), Err(ConfigError::ZeroPositionCap)));
    }

    #[test]
    fn rejects_zero_volume_cap() {
        let constraints = Constraints {
            max_trade_pct_of_volume: Some(0.0),
            ..Constraints::default()
        };
        assert!(constraints.validate().is_err());
    }

    #[test]
    fn fee_model_charges_bps_on_notional() {
        let fees = FeeModel::FixedBps { bps: 10.0 };
        assert!((fees.fee_for(10_000.0) - 10.0).abs() < 1e-10);
        assert_eq!(FeeModel::None.fee_for(10_000.0), 0.0);
    }

    #[test]
    fn sim_config_rejects_non_positive_capital() {
        let mut config = SimConfig::new(0.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositiveCapital(_))
        ));
        config.initial_capital = -5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn fee_model_toml_roundtrip() {
        let fees = FeeModel::FixedBps { bps: 5.0 };
        let json = serde_json::to_string(&fees).unwrap();
        assert!(json.contains("fixed_bps"));
        let deser: FeeModel = serde_json::from_str(&json).unwrap();
        assert_eq!(fees, deser);
    }
}
