//! Response projection of a search outcome.
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::numbers::round_to;
use crate::planner::{Action, SearchOutcome};
use crate::stats::{EvVector, Stat};

/// One step of a rendered plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlanStep {
    Travel {
        to: String,
        distance: f64,
    },
    Battle {
        zone: String,
        target_pokemon: String,
        count: u32,
        stat_focus: Stat,
        gained_evs: EvVector,
    },
}

/// Successful optimizer response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub path: Vec<PlanStep>,
    pub total_distance: f64,
    pub total_encounters: u32,
    pub final_stats: EvVector,
    pub total_cost: f64,
}

impl Plan {
    /// Project a search outcome onto catalog names.
    ///
    /// Consecutive batches against the same species in the same zone are merged
    /// into one step.
    #[must_use]
    pub fn render(catalog: &Catalog, outcome: &SearchOutcome) -> Self {
        let mut path: Vec<PlanStep> = Vec::with_capacity(outcome.actions.len());
        let mut total_distance = 0.0;
        let mut total_encounters = 0_u32;

        for action in &outcome.actions {
            match *action {
                Action::Travel { to, distance } => {
                    total_distance += distance;
                    path.push(PlanStep::Travel {
                        to: catalog.zone(to).name.clone(),
                        distance,
                    });
                }
                Action::Battle {
                    zone,
                    species,
                    count,
                    delta,
                } => {
                    total_encounters = total_encounters.saturating_add(count);
                    let zone_name = &catalog.zone(zone).name;
                    let species_name = &catalog.species(species).name;
                    if let Some(PlanStep::Battle {
                        zone: last_zone,
                        target_pokemon,
                        count: last_count,
                        stat_focus,
                        gained_evs,
                    }) = path.last_mut()
                        && last_zone.as_str() == zone_name.as_str()
                        && target_pokemon.as_str() == species_name.as_str()
                    {
                        *last_count = last_count.saturating_add(count);
                        *gained_evs = gained_evs.saturating_add(&delta);
                        *stat_focus = stat_focus_of(gained_evs);
                        continue;
                    }
                    path.push(PlanStep::Battle {
                        zone: zone_name.clone(),
                        target_pokemon: species_name.clone(),
                        count,
                        stat_focus: stat_focus_of(&delta),
                        gained_evs: delta,
                    });
                }
            }
        }

        Self {
            path,
            total_distance,
            total_encounters,
            final_stats: outcome.final_evs,
            total_cost: round_to(outcome.total_cost, 6),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }
}

/// Stat with the largest gain; ties go to the earliest stat.
#[must_use]
pub fn stat_focus_of(gained: &EvVector) -> Stat {
    let mut focus = Stat::Hp;
    for (stat, value) in gained.iter() {
        if value > gained.get(focus) {
            focus = stat;
        }
    }
    focus
}
