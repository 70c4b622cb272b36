//! EV accumulation under the per-stat and total caps.
//!
//! A battle's nominal yield is scaled by the held item and Pokérus before any
//! cap is applied. The remaining total budget is shared across stats and is
//! handed out greedily in canonical stat order, so the same inputs always
//! produce the same split.
use serde::{Deserialize, Serialize};

use crate::constants::{MAX_STAT_EV, MAX_TOTAL_EV, STAT_COUNT};
use crate::modifiers::Modifiers;
use crate::numbers::saturating_u32_to_u16;
use crate::stats::{EvVector, Stat};

/// Result of applying one or more battles to an EV vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleOutcome {
    /// EVs after the battles.
    pub evs: EvVector,
    /// What the battles actually added, after caps.
    pub delta: EvVector,
}

impl BattleOutcome {
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.delta.is_zero()
    }
}

/// Per-stat yield of one battle after modifiers, before caps.
#[must_use]
pub fn raw_yield(species_yield: &EvVector, modifiers: &Modifiers) -> [u32; STAT_COUNT] {
    let mut raw = [0_u32; STAT_COUNT];
    for stat in Stat::ALL {
        raw[stat.index()] =
            u32::from(species_yield.get(stat)) * u32::from(modifiers.multiplier(stat));
    }
    raw
}

/// EVs that can still be gained before the total cap.
#[must_use]
pub fn remaining_total(current: &EvVector) -> u32 {
    u32::from(MAX_TOTAL_EV).saturating_sub(u32::from(current.total()))
}

/// EVs that can still be gained on `stat` before its per-stat cap.
#[must_use]
pub fn stat_room(current: &EvVector, stat: Stat) -> u32 {
    u32::from(MAX_STAT_EV.saturating_sub(current.get(stat)))
}

/// Apply a single battle against a species with the given yield.
#[must_use]
pub fn apply(current: &EvVector, species_yield: &EvVector, modifiers: &Modifiers) -> BattleOutcome {
    let raw = raw_yield(species_yield, modifiers);
    apply_raw(current, &raw)
}

fn apply_raw(current: &EvVector, raw: &[u32; STAT_COUNT]) -> BattleOutcome {
    let mut budget = remaining_total(current);
    let mut evs = *current;
    let mut delta = EvVector::zero();
    for stat in Stat::ALL {
        let gained = raw[stat.index()]
            .min(stat_room(current, stat))
            .min(budget);
        budget -= gained;
        let gained = saturating_u32_to_u16(gained);
        delta.set(stat, gained);
        evs.set(stat, current.get(stat) + gained);
    }
    BattleOutcome { evs, delta }
}

/// Apply `count` identical battles one after another.
///
/// The fold keeps the greedy budget split of each individual battle, which
/// differs from scaling the yield by `count` once the total cap binds.
#[must_use]
pub fn apply_repeated(
    current: &EvVector,
    species_yield: &EvVector,
    modifiers: &Modifiers,
    count: u32,
) -> BattleOutcome {
    let raw = raw_yield(species_yield, modifiers);
    let mut evs = *current;
    for _ in 0..count {
        let step = apply_raw(&evs, &raw);
        if step.is_noop() {
            break;
        }
        evs = step.evs;
    }
    BattleOutcome {
        evs,
        delta: delta_between(current, &evs),
    }
}

fn delta_between(before: &EvVector, after: &EvVector) -> EvVector {
    let mut delta = EvVector::zero();
    for stat in Stat::ALL {
        delta.set(stat, after.get(stat).saturating_sub(before.get(stat)));
    }
    delta
}

/// Number of consecutive battles against one species before the EV vector
/// reaches its next breakpoint. Zero means the species is useless from here.
///
/// A breakpoint is the first needed stat the species feeds reaching its
/// target, or the total budget running out, whichever comes first. Further
/// battles against the same species are a separate batch.
#[must_use]
pub fn batch_size(
    current: &EvVector,
    target: &EvVector,
    species_yield: &EvVector,
    modifiers: &Modifiers,
) -> u32 {
    let raw = raw_yield(species_yield, modifiers);
    let gap = current.gap_to(target);

    let first = apply_raw(current, &raw);
    let makes_progress = Stat::ALL
        .iter()
        .any(|&stat| gap.get(stat) > 0 && first.delta.get(stat) > 0);
    if !makes_progress {
        return 0;
    }

    let first_closed = Stat::ALL
        .iter()
        .filter(|&&stat| gap.get(stat) > 0 && raw[stat.index()] > 0)
        .map(|&stat| u32::from(gap.get(stat)).div_ceil(raw[stat.index()]))
        .min()
        .unwrap_or(0);

    match battles_until_budget_spent(current, &raw) {
        Some(exhaust) => first_closed.min(exhaust),
        None => first_closed,
    }
}

/// Smallest battle count after which the total budget is fully consumed,
/// or `None` if per-stat caps stop consumption first.
///
/// Ignoring the total cap, stat `s` absorbs `min(n * raw_s, room_s)` after
/// `n` battles. That sum is piecewise linear in `n` with a kink wherever a
/// stat reaches its own cap, so each linear segment is solved directly.
fn battles_until_budget_spent(current: &EvVector, raw: &[u32; STAT_COUNT]) -> Option<u32> {
    let budget = remaining_total(current);
    if budget == 0 {
        return Some(0);
    }

    let mut breakpoints: Vec<(u32, Stat)> = Stat::ALL
        .iter()
        .filter(|&&stat| raw[stat.index()] > 0 && stat_room(current, stat) > 0)
        .map(|&stat| {
            (
                stat_room(current, stat).div_ceil(raw[stat.index()]),
                stat,
            )
        })
        .collect();
    breakpoints.sort_unstable();

    let mut rate: u32 = breakpoints.iter().map(|&(_, stat)| raw[stat.index()]).sum();
    let mut absorbed_capped = 0_u32;
    let mut segment_start = 0_u32;
    for (cap_at, stat) in breakpoints {
        // Within [segment_start, cap_at) every remaining stat is still uncapped.
        if rate > 0 {
            let needed = budget.saturating_sub(absorbed_capped);
            let n = needed.div_ceil(rate).max(segment_start);
            if n < cap_at {
                return Some(n.max(1));
            }
        }
        absorbed_capped += stat_room(current, stat);
        rate -= raw[stat.index()];
        segment_start = cap_at;
        if absorbed_capped >= budget {
            return Some(cap_at.max(1));
        }
    }
    None
}
