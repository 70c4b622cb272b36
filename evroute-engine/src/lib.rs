//! EV Route Engine
//!
//! Platform-agnostic optimizer that plans travel and battle sequences for
//! effort value training. The crate has no I/O of its own: catalogs arrive
//! through a [`CatalogLoader`] and results leave as serde-friendly values.

pub mod accumulator;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod cost;
pub mod error;
pub mod modifiers;
pub mod numbers;
pub mod plan;
pub mod planner;
pub mod request;
pub mod stats;

use std::sync::Arc;

pub use accumulator::{BattleOutcome, apply, apply_repeated, batch_size};
pub use catalog::{
    AdjacencyExport, Catalog, CatalogData, CatalogError, EdgeDef, EncounterDef, SpeciesDef,
    SpeciesId, ZoneDef, ZoneFilter, ZoneId, normalize_zone_name,
};
pub use config::{ConfigError, PlannerConfig};
pub use cost::{CostBreakdown, CostModel, LambdaConvention};
pub use error::{ErrorBody, ErrorResponse, PlanError};
pub use modifiers::{HeldItem, Modifiers};
pub use plan::{Plan, PlanStep};
pub use planner::{Action, Planner, SearchControl, SearchOutcome, SearchProblem, SearchStats};
pub use request::{OptimizeRequest, ValidatedRequest};
pub use stats::{EvVector, Stat, StatMap};

/// Source of raw catalog documents.
/// Hosts provide their own (file system, embedded asset, network).
pub trait CatalogLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the raw catalog document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be read or parsed.
    fn load_catalog_data(&self) -> Result<CatalogData, Self::Error>;
}

/// Loader for the Kanto catalog compiled into the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticCatalogLoader;

impl CatalogLoader for StaticCatalogLoader {
    type Error = CatalogError;

    fn load_catalog_data(&self) -> Result<CatalogData, Self::Error> {
        serde_json::from_str(catalog::DEFAULT_CATALOG_DATA)
            .map_err(|e| CatalogError::Parse(e.to_string()))
    }
}

/// A plan together with the work it took to find.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanOutcome {
    pub plan: Plan,
    pub stats: SearchStats,
}

/// Request-level facade over one shared catalog snapshot.
///
/// Cloning is cheap and every clone may serve requests from its own thread.
#[derive(Debug, Clone)]
pub struct Optimizer {
    catalog: Arc<Catalog>,
    config: PlannerConfig,
}

impl Optimizer {
    #[must_use]
    pub const fn new(catalog: Arc<Catalog>, config: PlannerConfig) -> Self {
        Self { catalog, config }
    }

    /// Build an optimizer from whatever catalog the loader provides.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::CatalogUnavailable`] if loading or validation fails.
    pub fn from_loader<L: CatalogLoader>(
        loader: &L,
        config: PlannerConfig,
    ) -> Result<Self, PlanError> {
        let data = loader
            .load_catalog_data()
            .map_err(|e| PlanError::CatalogUnavailable(e.to_string()))?;
        let catalog = Catalog::from_data(data)?;
        Ok(Self::new(Arc::new(catalog), config))
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn shared_catalog(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub const fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Plan with the configured time budget.
    ///
    /// # Errors
    ///
    /// Returns any [`PlanError`]; a partial plan is never returned.
    pub fn optimize(&self, request: &OptimizeRequest) -> Result<Plan, PlanError> {
        self.optimize_with(request, &SearchControl::new())
            .map(|outcome| outcome.plan)
    }

    /// Plan under caller-supplied stop conditions. A control without a
    /// deadline gets the configured time budget.
    ///
    /// # Errors
    ///
    /// Returns any [`PlanError`]; a partial plan is never returned.
    pub fn optimize_with(
        &self,
        request: &OptimizeRequest,
        control: &SearchControl,
    ) -> Result<PlanOutcome, PlanError> {
        let valid = request.validate(&self.catalog)?;
        let control = if control.deadline().is_some() {
            control.clone()
        } else {
            control.clone().with_timeout(self.config.time_budget())
        };
        let problem = SearchProblem {
            start: valid.start,
            current: valid.current,
            target: valid.target,
            filter: valid.filter,
            modifiers: valid.modifiers,
            lambda: valid.lambda,
        };
        self.check_reachable_yields(&problem)?;

        let outcome = Planner::new(&self.catalog, &self.config).search(&problem, &control)?;
        let plan = Plan::render(&self.catalog, &outcome);
        log::info!(
            "plan for {}: {} steps, distance {}, {} encounters",
            request.pokemon_name,
            plan.path.len(),
            plan.total_distance,
            plan.total_encounters
        );
        Ok(PlanOutcome {
            plan,
            stats: outcome.stats,
        })
    }

    /// Read-only adjacency view of the catalog.
    #[must_use]
    pub fn adjacency(&self) -> AdjacencyExport {
        self.catalog.adjacency()
    }

    /// Fail fast when some stat below target has no yielding species in any
    /// zone the player can reach.
    fn check_reachable_yields(&self, problem: &SearchProblem) -> Result<(), PlanError> {
        let gap = problem.current.gap_to(&problem.target);
        if gap.is_zero() {
            return Ok(());
        }
        let distances = self.catalog.distances_from(problem.start, &problem.filter);
        let mut fed = [false; constants::STAT_COUNT];
        for (zone, _) in distances
            .iter()
            .enumerate()
            .filter(|(_, d)| d.is_some())
        {
            for slot in &self.catalog.zone(ZoneId(zone)).encounters {
                for stat in self.catalog.species(slot.species).evs.nonzero_stats() {
                    fed[stat.index()] = true;
                }
            }
        }
        let starved: Vec<&str> = gap
            .nonzero_stats()
            .filter(|stat| !fed[stat.index()])
            .map(Stat::label)
            .collect();
        if starved.is_empty() {
            return Ok(());
        }
        log::debug!("pre-check: no reachable species yields {starved:?}");
        Err(PlanError::NoFeasiblePlan(format!(
            "no reachable species yields {}",
            starved.join(", ")
        )))
    }
}
