//! Stats and the capped effort value vector.
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::constants::{MAX_STAT_EV, MAX_TOTAL_EV, STAT_COUNT};

/// One of the six trainable stats, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stat {
    #[serde(rename = "HP")]
    Hp,
    Attack,
    Defense,
    #[serde(rename = "Special Attack")]
    SpecialAttack,
    #[serde(rename = "Special Defense")]
    SpecialDefense,
    Speed,
}

impl Stat {
    /// Canonical order. Budget sharing under the total cap walks stats in this order.
    pub const ALL: [Self; STAT_COUNT] = [
        Self::Hp,
        Self::Attack,
        Self::Defense,
        Self::SpecialAttack,
        Self::SpecialDefense,
        Self::Speed,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Hp => 0,
            Self::Attack => 1,
            Self::Defense => 2,
            Self::SpecialAttack => 3,
            Self::SpecialDefense => 4,
            Self::Speed => 5,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Hp => "HP",
            Self::Attack => "Attack",
            Self::Defense => "Defense",
            Self::SpecialAttack => "Special Attack",
            Self::SpecialDefense => "Special Defense",
            Self::Speed => "Speed",
        }
    }

    /// Parse a stat from its display label or the snake-case column name
    /// used by catalog exports (`sp_attack`, `ev_speed`, ...).
    #[must_use]
    pub fn from_label(raw: &str) -> Option<Self> {
        let key = raw
            .trim()
            .trim_start_matches("ev_")
            .to_ascii_lowercase()
            .replace(['_', '.'], " ");
        match key.split_whitespace().collect::<Vec<_>>().join(" ").as_str() {
            "hp" => Some(Self::Hp),
            "attack" | "atk" => Some(Self::Attack),
            "defense" | "def" => Some(Self::Defense),
            "special attack" | "sp attack" | "spa" => Some(Self::SpecialAttack),
            "special defense" | "sp defense" | "spd" => Some(Self::SpecialDefense),
            "speed" | "spe" => Some(Self::Speed),
            _ => None,
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Wire shape for anything keyed by stat. Missing keys default to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(bound(deserialize = "T: Deserialize<'de> + Default"))]
pub struct StatMap<T> {
    #[serde(rename = "HP", alias = "hp", default)]
    pub hp: T,
    #[serde(rename = "Attack", alias = "attack", default)]
    pub attack: T,
    #[serde(rename = "Defense", alias = "defense", default)]
    pub defense: T,
    #[serde(rename = "Special Attack", alias = "sp_attack", default)]
    pub special_attack: T,
    #[serde(rename = "Special Defense", alias = "sp_defense", default)]
    pub special_defense: T,
    #[serde(rename = "Speed", alias = "speed", default)]
    pub speed: T,
}

impl<T: Copy> StatMap<T> {
    #[must_use]
    pub const fn to_array(&self) -> [T; STAT_COUNT] {
        [
            self.hp,
            self.attack,
            self.defense,
            self.special_attack,
            self.special_defense,
            self.speed,
        ]
    }

    #[must_use]
    pub const fn from_array(values: [T; STAT_COUNT]) -> Self {
        Self {
            hp: values[0],
            attack: values[1],
            defense: values[2],
            special_attack: values[3],
            special_defense: values[4],
            speed: values[5],
        }
    }
}

/// Violations of the per-stat and total EV caps.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum EvCapError {
    #[error("{stat} EVs must be at most {max} (got {value})")]
    StatOverCap { stat: Stat, max: u16, value: u16 },
    #[error("total EVs must be at most {max} (got {total})")]
    TotalOverCap { max: u16, total: u16 },
}

/// Six effort values in canonical stat order.
///
/// Every vector that represents a Pokémon's EVs satisfies the caps; yield
/// vectors reuse the type and are only bounded per stat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "StatMap<u16>", into = "StatMap<u16>")]
pub struct EvVector([u16; STAT_COUNT]);

impl EvVector {
    #[must_use]
    pub const fn zero() -> Self {
        Self([0; STAT_COUNT])
    }

    #[must_use]
    pub const fn new(values: [u16; STAT_COUNT]) -> Self {
        Self(values)
    }

    /// A vector with a single non-zero stat.
    #[must_use]
    pub const fn single(stat: Stat, value: u16) -> Self {
        let mut values = [0; STAT_COUNT];
        values[stat.index()] = value;
        Self(values)
    }

    #[must_use]
    pub const fn get(&self, stat: Stat) -> u16 {
        self.0[stat.index()]
    }

    pub fn set(&mut self, stat: Stat, value: u16) {
        self.0[stat.index()] = value;
    }

    #[must_use]
    pub const fn with(mut self, stat: Stat, value: u16) -> Self {
        self.0[stat.index()] = value;
        self
    }

    #[must_use]
    pub const fn values(&self) -> [u16; STAT_COUNT] {
        self.0
    }

    #[must_use]
    pub fn total(&self) -> u16 {
        self.0.iter().sum()
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&v| v == 0)
    }

    /// True when every stat is at least the matching stat of `floor`.
    #[must_use]
    pub fn dominates(&self, floor: &Self) -> bool {
        self.0.iter().zip(floor.0.iter()).all(|(have, want)| have >= want)
    }

    /// Per-stat shortfall toward `target`; stats already at or above target are zero.
    #[must_use]
    pub fn gap_to(&self, target: &Self) -> Self {
        let mut gap = [0; STAT_COUNT];
        for (idx, slot) in gap.iter_mut().enumerate() {
            *slot = target.0[idx].saturating_sub(self.0[idx]);
        }
        Self(gap)
    }

    /// Component-wise sum, saturating at `u16::MAX`. Callers are responsible for caps.
    #[must_use]
    pub fn saturating_add(&self, other: &Self) -> Self {
        let mut sum = self.0;
        for (idx, slot) in sum.iter_mut().enumerate() {
            *slot = slot.saturating_add(other.0[idx]);
        }
        Self(sum)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Stat, u16)> + '_ {
        Stat::ALL.iter().map(move |&stat| (stat, self.get(stat)))
    }

    /// Stats with a non-zero value, in canonical order.
    pub fn nonzero_stats(&self) -> impl Iterator<Item = Stat> + '_ {
        self.iter().filter(|&(_, v)| v > 0).map(|(stat, _)| stat)
    }

    /// Checks the per-stat and total caps.
    ///
    /// # Errors
    ///
    /// Returns the first cap violation found, per-stat caps first.
    pub fn check_caps(&self) -> Result<(), EvCapError> {
        for (stat, value) in self.iter() {
            if value > MAX_STAT_EV {
                return Err(EvCapError::StatOverCap {
                    stat,
                    max: MAX_STAT_EV,
                    value,
                });
            }
        }
        let total = self.total();
        if total > MAX_TOTAL_EV {
            return Err(EvCapError::TotalOverCap {
                max: MAX_TOTAL_EV,
                total,
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn within_caps(&self) -> bool {
        self.check_caps().is_ok()
    }
}

impl From<StatMap<u16>> for EvVector {
    fn from(map: StatMap<u16>) -> Self {
        Self(map.to_array())
    }
}

impl From<EvVector> for StatMap<u16> {
    fn from(vector: EvVector) -> Self {
        Self::from_array(vector.0)
    }
}

impl fmt::Display for EvVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .filter(|&(_, v)| v > 0)
            .map(|(stat, v)| format!("{stat} {v}"))
            .collect();
        if parts.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&parts.join(", "))
        }
    }
}
