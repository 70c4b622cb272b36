//! Deployment-level planner configuration.
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::constants::{DEFAULT_BATTLE_WEIGHT, DEFAULT_MAX_EXPANSIONS, DEFAULT_TIME_BUDGET_MS};
use crate::cost::{LAMBDA_CONVENTION, LambdaConvention};

/// Errors raised when planner configuration invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("battle_weight must be finite and positive (got {0})")]
    BattleWeight(f64),
    #[error("{field} must be at least {min} (got {value})")]
    MinViolation {
        field: &'static str,
        min: u64,
        value: u64,
    },
    #[error("config JSON invalid: {0}")]
    Parse(String),
}

/// Tunables shared by every request a deployment serves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Distance-equivalent cost of one battle (`K`).
    #[serde(default = "PlannerConfig::default_battle_weight")]
    pub battle_weight: f64,
    #[serde(default = "PlannerConfig::default_lambda_convention")]
    pub lambda_convention: LambdaConvention,
    /// States popped before the search is abandoned.
    #[serde(default = "PlannerConfig::default_max_expansions")]
    pub max_expansions: usize,
    /// Per-request wall-clock budget.
    #[serde(default = "PlannerConfig::default_time_budget_ms")]
    pub time_budget_ms: u64,
}

impl PlannerConfig {
    const fn default_battle_weight() -> f64 {
        DEFAULT_BATTLE_WEIGHT
    }

    const fn default_lambda_convention() -> LambdaConvention {
        LAMBDA_CONVENTION
    }

    const fn default_max_expansions() -> usize {
        DEFAULT_MAX_EXPANSIONS
    }

    const fn default_time_budget_ms() -> u64 {
        DEFAULT_TIME_BUDGET_MS
    }

    /// Parse and validate a JSON config. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a value is out of range.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// # Errors
    ///
    /// Returns the first invariant violation found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.battle_weight.is_finite() || self.battle_weight <= 0.0 {
            return Err(ConfigError::BattleWeight(self.battle_weight));
        }
        if self.max_expansions == 0 {
            return Err(ConfigError::MinViolation {
                field: "max_expansions",
                min: 1,
                value: 0,
            });
        }
        if self.time_budget_ms == 0 {
            return Err(ConfigError::MinViolation {
                field: "time_budget_ms",
                min: 1,
                value: 0,
            });
        }
        Ok(())
    }

    #[must_use]
    pub const fn time_budget(&self) -> Duration {
        Duration::from_millis(self.time_budget_ms)
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            battle_weight: Self::default_battle_weight(),
            lambda_convention: Self::default_lambda_convention(),
            max_expansions: Self::default_max_expansions(),
            time_budget_ms: Self::default_time_budget_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert_eq!(PlannerConfig::default().validate(), Ok(()));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg = PlannerConfig::from_json(r#"{"battle_weight": 4.5}"#).unwrap();
        assert!((cfg.battle_weight - 4.5).abs() < f64::EPSILON);
        assert_eq!(cfg.lambda_convention, LambdaConvention::EncounterWeight);
        assert_eq!(cfg.time_budget(), Duration::from_millis(DEFAULT_TIME_BUDGET_MS));
    }

    #[test]
    fn rejects_bad_values() {
        assert_eq!(
            PlannerConfig::from_json(r#"{"battle_weight": 0}"#),
            Err(ConfigError::BattleWeight(0.0))
        );
        assert!(matches!(
            PlannerConfig::from_json(r#"{"max_expansions": 0}"#),
            Err(ConfigError::MinViolation {
                field: "max_expansions",
                ..
            })
        ));
        assert!(matches!(
            PlannerConfig::from_json("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn convention_is_configurable() {
        let cfg =
            PlannerConfig::from_json(r#"{"lambda_convention": "distance_weight"}"#).unwrap();
        assert_eq!(cfg.lambda_convention, LambdaConvention::DistanceWeight);
    }
}
