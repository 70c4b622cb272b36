//! Linear cost model trading travel distance against battle count.
//!
//! Lambda is a single number in `[0, 1]`. Two framings of it exist in the
//! product; the optimizer fixes one through [`LambdaConvention`]. Under the
//! default [`LambdaConvention::EncounterWeight`]:
//!
//! ```text
//! travel_cost(d) = (1 - lambda) * d
//! battle_cost()  = lambda * K
//! ```
//!
//! where `K` is [`crate::PlannerConfig::battle_weight`], the distance
//! equivalent of one battle.
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_LAMBDA;
use crate::numbers::{non_negative_finite, u32_to_f64};

/// Which side of the trade-off lambda weights.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LambdaConvention {
    /// Lambda weights battles, `1 - lambda` weights distance.
    #[default]
    EncounterWeight,
    /// Lambda weights distance, `1 - lambda` weights battles.
    DistanceWeight,
}

/// The convention deployments get unless their config says otherwise.
pub const LAMBDA_CONVENTION: LambdaConvention = LambdaConvention::EncounterWeight;

/// Per-request cost model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    travel_weight: f64,
    battle_cost: f64,
}

impl CostModel {
    /// Build a cost model. A non-finite lambda falls back to the default and
    /// anything outside `[0, 1]` is clamped; requests are validated before
    /// they get here.
    #[must_use]
    pub fn new(lambda: f64, battle_weight: f64, convention: LambdaConvention) -> Self {
        let lambda = if lambda.is_finite() {
            lambda.clamp(0.0, 1.0)
        } else {
            DEFAULT_LAMBDA
        };
        let battle_weight = non_negative_finite(battle_weight);
        let (travel_weight, battle_share) = match convention {
            LambdaConvention::EncounterWeight => (1.0 - lambda, lambda),
            LambdaConvention::DistanceWeight => (lambda, 1.0 - lambda),
        };
        Self {
            travel_weight,
            battle_cost: battle_share * battle_weight,
        }
    }

    #[must_use]
    pub fn travel_cost(&self, distance: f64) -> f64 {
        self.travel_weight * non_negative_finite(distance)
    }

    /// Cost of one battle.
    #[must_use]
    pub const fn battle_cost(&self) -> f64 {
        self.battle_cost
    }

    /// Cost of a batch of `count` identical battles.
    #[must_use]
    pub fn battles_cost(&self, count: u32) -> f64 {
        self.battle_cost * u32_to_f64(count)
    }

    /// Split the cost of a plan into its travel and battle parts.
    #[must_use]
    pub fn breakdown(&self, total_distance: f64, total_battles: u32) -> CostBreakdown {
        CostBreakdown {
            travel: self.travel_cost(total_distance),
            battles: self.battles_cost(total_battles),
        }
    }
}

/// Travel and battle contributions to a plan's cost.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub travel: f64,
    pub battles: f64,
}

impl CostBreakdown {
    #[must_use]
    pub fn total(&self) -> f64 {
        self.travel + self.battles
    }

    /// Fraction of the total attributable to travel; zero for a free plan.
    #[must_use]
    pub fn travel_share(&self) -> f64 {
        let total = self.total();
        if total <= f64::EPSILON {
            0.0
        } else {
            self.travel / total
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const K: f64 = 10.0;

    #[test]
    fn lambda_zero_makes_battles_free() {
        let model = CostModel::new(0.0, K, LambdaConvention::EncounterWeight);
        assert!((model.travel_cost(10.0) - 10.0).abs() < f64::EPSILON);
        assert!(model.battle_cost().abs() < f64::EPSILON);
    }

    #[test]
    fn lambda_one_makes_travel_free() {
        let model = CostModel::new(1.0, K, LambdaConvention::EncounterWeight);
        assert!(model.travel_cost(25.0).abs() < f64::EPSILON);
        assert!((model.battles_cost(3) - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn distance_convention_swaps_weights() {
        let model = CostModel::new(0.25, K, LambdaConvention::DistanceWeight);
        assert!((model.travel_cost(8.0) - 2.0).abs() < f64::EPSILON);
        assert!((model.battle_cost() - 7.5).abs() < f64::EPSILON);
    }

    #[test]
    fn out_of_range_inputs_are_sanitized() {
        let model = CostModel::new(4.0, K, LambdaConvention::EncounterWeight);
        assert!(model.travel_cost(10.0).abs() < f64::EPSILON);
        let model = CostModel::new(f64::NAN, -1.0, LambdaConvention::EncounterWeight);
        assert!(model.battle_cost().abs() < f64::EPSILON);
        assert!(model.travel_cost(-5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn breakdown_reports_travel_share() {
        let model = CostModel::new(0.5, K, LambdaConvention::EncounterWeight);
        let split = model.breakdown(20.0, 2);
        assert!((split.travel - 10.0).abs() < f64::EPSILON);
        assert!((split.battles - 10.0).abs() < f64::EPSILON);
        assert!((split.travel_share() - 0.5).abs() < f64::EPSILON);
        assert!(CostBreakdown::default().travel_share().abs() < f64::EPSILON);
    }
}
