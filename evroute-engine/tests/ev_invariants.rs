use evroute_engine::accumulator::{apply, apply_repeated, batch_size};
use evroute_engine::constants::{MAX_STAT_EV, MAX_TOTAL_EV};
use evroute_engine::{EvVector, HeldItem, Modifiers, Stat};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

const SAMPLE_SIZE: usize = 20_000;

fn random_current(rng: &mut SmallRng) -> EvVector {
    let mut evs = EvVector::zero();
    let mut budget = MAX_TOTAL_EV;
    for stat in Stat::ALL {
        let value = rng.gen_range(0..=MAX_STAT_EV.min(budget));
        budget -= value;
        evs.set(stat, value);
    }
    evs
}

fn random_yield(rng: &mut SmallRng) -> EvVector {
    let mut evs = EvVector::zero();
    for stat in Stat::ALL {
        if rng.gen_bool(0.4) {
            evs.set(stat, rng.gen_range(0..=3));
        }
    }
    evs
}

fn random_modifiers(rng: &mut SmallRng) -> Modifiers {
    let item = match rng.gen_range(0..3) {
        0 => HeldItem::None,
        1 => HeldItem::MachoBrace,
        _ => HeldItem::PowerItem(Stat::ALL[rng.gen_range(0..Stat::ALL.len())]),
    };
    Modifiers::new(item, rng.gen_bool(0.3))
}

#[test]
fn every_battle_respects_the_caps() {
    let mut rng = SmallRng::seed_from_u64(0x00E5_0EF5);
    for _ in 0..SAMPLE_SIZE {
        let current = random_current(&mut rng);
        let species_yield = random_yield(&mut rng);
        let modifiers = random_modifiers(&mut rng);
        let out = apply(&current, &species_yield, &modifiers);
        assert!(
            out.evs.within_caps(),
            "caps broken: {current} + {species_yield} -> {}",
            out.evs
        );
        assert_eq!(out.evs, current.saturating_add(&out.delta));
        for (stat, gained) in out.delta.iter() {
            let raw = species_yield.get(stat) * modifiers.multiplier(stat);
            assert!(gained <= raw, "{stat} gained {gained} from raw {raw}");
        }
    }
}

#[test]
fn batches_respect_the_caps() {
    let mut rng = SmallRng::seed_from_u64(42);
    for _ in 0..SAMPLE_SIZE / 4 {
        let current = random_current(&mut rng);
        let target = random_current(&mut rng);
        let species_yield = random_yield(&mut rng);
        let modifiers = random_modifiers(&mut rng);
        let count = batch_size(&current, &target, &species_yield, &modifiers);
        let out = apply_repeated(&current, &species_yield, &modifiers, count);
        assert!(out.evs.within_caps());
        assert!(out.evs.dominates(&current));
        if count > 0 {
            assert!(!out.is_noop(), "batch of {count} made no progress");
        }
    }
}

#[test]
fn capped_yield_is_idempotent() {
    let mut rng = SmallRng::seed_from_u64(7);
    for _ in 0..1_000 {
        let stat = Stat::ALL[rng.gen_range(0..Stat::ALL.len())];
        let current = EvVector::single(stat, MAX_STAT_EV);
        let species_yield = EvVector::single(stat, rng.gen_range(1..=3));
        let out = apply(&current, &species_yield, &random_modifiers(&mut rng));
        assert!(out.is_noop());
        assert_eq!(out.evs, current);
    }

    let full = EvVector::new([252, 252, 6, 0, 0, 0]);
    let out = apply(&full, &EvVector::new([1, 1, 1, 1, 1, 1]), &Modifiers::default());
    assert!(out.is_noop());
    assert_eq!(out.evs, full);
}
