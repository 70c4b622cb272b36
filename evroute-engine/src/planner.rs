//! Uniform-cost search over `(zone, EV vector)` states.
//!
//! Successors are one travel per usable outgoing edge and, per encounterable
//! species that still makes progress, a single battle plus the batch that runs
//! to the next breakpoint. The batch folds the battles up to the first needed
//! stat closing into one transition; the single battle keeps plans that switch
//! species mid-batch reachable.
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::accumulator::{apply_repeated, batch_size};
use crate::catalog::{Catalog, SpeciesId, ZoneFilter, ZoneId};
use crate::config::PlannerConfig;
use crate::constants::CANCEL_CHECK_INTERVAL;
use crate::cost::CostModel;
use crate::error::PlanError;
use crate::modifiers::Modifiers;
use crate::stats::EvVector;

/// Cooperative stop conditions for one search.
#[derive(Debug, Clone, Default)]
pub struct SearchControl {
    deadline: Option<Instant>,
    cancel: Option<Arc<AtomicBool>>,
}

impl SearchControl {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            deadline: None,
            cancel: None,
        }
    }

    #[must_use]
    pub const fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    #[must_use]
    pub fn with_timeout(self, budget: Duration) -> Self {
        self.with_deadline(Instant::now() + budget)
    }

    /// Share a flag another thread can raise to stop the search.
    #[must_use]
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    fn flag_raised(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(AtomicOrdering::Relaxed))
    }

    fn past_deadline(&self) -> bool {
        self.deadline.is_some_and(|at| Instant::now() >= at)
    }
}

/// One transition of a plan, before rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Travel {
        to: ZoneId,
        distance: f64,
    },
    Battle {
        zone: ZoneId,
        species: SpeciesId,
        count: u32,
        delta: EvVector,
    },
}

/// Work done by one search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    pub expanded: usize,
    pub pushed: usize,
    pub elapsed_ms: u64,
}

/// Cheapest action sequence found by the planner.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub actions: Vec<Action>,
    pub final_evs: EvVector,
    pub total_cost: f64,
    pub stats: SearchStats,
}

/// Inputs the search needs, already resolved against the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchProblem {
    pub start: ZoneId,
    pub current: EvVector,
    pub target: EvVector,
    pub filter: ZoneFilter,
    pub modifiers: Modifiers,
    pub lambda: f64,
}

/// Dijkstra planner bound to one catalog snapshot.
pub struct Planner<'a> {
    catalog: &'a Catalog,
    config: &'a PlannerConfig,
}

struct Node {
    zone: ZoneId,
    evs: EvVector,
    parent: Option<usize>,
    action: Option<Action>,
}

#[derive(Debug, Clone, Copy)]
struct FrontierEntry {
    cost: f64,
    actions: u32,
    seq: u64,
    node: usize,
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FrontierEntry {}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrontierEntry {
    // BinaryHeap is a max-heap: reverse every key so the cheapest, shortest,
    // oldest entry pops first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.actions.cmp(&self.actions))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

fn improves(candidate: (f64, u32), known: Option<&(f64, u32)>) -> bool {
    known.is_none_or(|&(cost, actions)| {
        candidate
            .0
            .total_cmp(&cost)
            .then(candidate.1.cmp(&actions))
            .is_lt()
    })
}

impl<'a> Planner<'a> {
    #[must_use]
    pub const fn new(catalog: &'a Catalog, config: &'a PlannerConfig) -> Self {
        Self { catalog, config }
    }

    /// Run the search.
    ///
    /// # Errors
    ///
    /// [`PlanError::NoFeasiblePlan`] when the frontier empties without reaching
    /// the target, [`PlanError::Cancelled`] when the control fires or the
    /// expansion budget runs out.
    pub fn search(
        &self,
        problem: &SearchProblem,
        control: &SearchControl,
    ) -> Result<SearchOutcome, PlanError> {
        let started = Instant::now();
        let cost = CostModel::new(
            problem.lambda,
            self.config.battle_weight,
            self.config.lambda_convention,
        );

        let mut nodes = vec![Node {
            zone: problem.start,
            evs: problem.current,
            parent: None,
            action: None,
        }];
        let mut best: HashMap<(ZoneId, EvVector), (f64, u32)> = HashMap::new();
        let mut closed: HashSet<(ZoneId, EvVector)> = HashSet::new();
        let mut frontier = BinaryHeap::new();
        let mut seq = 0_u64;
        let mut stats = SearchStats::default();

        best.insert((problem.start, problem.current), (0.0, 0));
        frontier.push(FrontierEntry {
            cost: 0.0,
            actions: 0,
            seq,
            node: 0,
        });
        stats.pushed = 1;

        while let Some(entry) = frontier.pop() {
            if control.flag_raised() {
                return Err(abandon("cancel flag raised", stats, started));
            }
            if stats.expanded % CANCEL_CHECK_INTERVAL == 0 && control.past_deadline() {
                return Err(abandon("time budget exhausted", stats, started));
            }

            let (zone, evs) = (nodes[entry.node].zone, nodes[entry.node].evs);
            if !closed.insert((zone, evs)) {
                continue;
            }
            stats.expanded += 1;

            if evs.dominates(&problem.target) {
                stats.elapsed_ms = elapsed_ms(started);
                log::debug!(
                    "search finished: cost {:.3}, {} expanded, {} pushed, {} ms",
                    entry.cost,
                    stats.expanded,
                    stats.pushed,
                    stats.elapsed_ms
                );
                return Ok(SearchOutcome {
                    actions: reconstruct(&nodes, entry.node),
                    final_evs: evs,
                    total_cost: entry.cost,
                    stats,
                });
            }

            if stats.expanded >= self.config.max_expansions {
                return Err(abandon("expansion budget exhausted", stats, started));
            }

            let mut successors: Vec<(ZoneId, EvVector, f64, Action)> = Vec::new();
            let here = self.catalog.zone(zone);
            for edge in &here.edges {
                if !problem.filter.allows(edge.to) {
                    continue;
                }
                successors.push((
                    edge.to,
                    evs,
                    cost.travel_cost(edge.distance),
                    Action::Travel {
                        to: edge.to,
                        distance: edge.distance,
                    },
                ));
            }
            let mut tried: Vec<SpeciesId> = Vec::with_capacity(here.encounters.len());
            for slot in &here.encounters {
                if tried.contains(&slot.species) {
                    continue;
                }
                tried.push(slot.species);
                let species_yield = self.catalog.species(slot.species).evs;
                let batch = batch_size(&evs, &problem.target, &species_yield, &problem.modifiers);
                if batch == 0 {
                    continue;
                }
                // A lone battle lets another species finish what this one started.
                let counts: &[u32] = if batch == 1 { &[1] } else { &[1, batch] };
                for &count in counts {
                    let outcome = apply_repeated(&evs, &species_yield, &problem.modifiers, count);
                    if outcome.is_noop() {
                        continue;
                    }
                    successors.push((
                        zone,
                        outcome.evs,
                        cost.battles_cost(count),
                        Action::Battle {
                            zone,
                            species: slot.species,
                            count,
                            delta: outcome.delta,
                        },
                    ));
                }
            }

            for (next_zone, next_evs, step_cost, action) in successors {
                let key = (next_zone, next_evs);
                if closed.contains(&key) {
                    continue;
                }
                let rank = (entry.cost + step_cost, entry.actions + 1);
                if !improves(rank, best.get(&key)) {
                    continue;
                }
                best.insert(key, rank);
                nodes.push(Node {
                    zone: next_zone,
                    evs: next_evs,
                    parent: Some(entry.node),
                    action: Some(action),
                });
                seq += 1;
                frontier.push(FrontierEntry {
                    cost: rank.0,
                    actions: rank.1,
                    seq,
                    node: nodes.len() - 1,
                });
                stats.pushed += 1;
            }
        }

        stats.elapsed_ms = elapsed_ms(started);
        log::debug!(
            "search exhausted: {} expanded, {} pushed",
            stats.expanded,
            stats.pushed
        );
        Err(PlanError::NoFeasiblePlan(format!(
            "target {} is not reachable from {}",
            problem.target,
            self.catalog.zone(problem.start).name
        )))
    }
}

fn abandon(reason: &str, mut stats: SearchStats, started: Instant) -> PlanError {
    stats.elapsed_ms = elapsed_ms(started);
    log::warn!(
        "search abandoned ({reason}) after {} expanded, {} pushed, {} ms",
        stats.expanded,
        stats.pushed,
        stats.elapsed_ms
    );
    PlanError::Cancelled(format!(
        "{reason} after {} expanded states",
        stats.expanded
    ))
}

fn reconstruct(nodes: &[Node], mut idx: usize) -> Vec<Action> {
    let mut actions = Vec::new();
    while let Some(action) = nodes[idx].action {
        actions.push(action);
        match nodes[idx].parent {
            Some(parent) => idx = parent,
            None => break,
        }
    }
    actions.reverse();
    actions
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
