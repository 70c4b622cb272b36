//! Held items and status effects that scale EV yield.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::constants::{DOUBLING_MULTIPLIER, STAT_COUNT};
use crate::stats::Stat;

/// Item held by the trained Pokémon during battles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeldItem {
    #[default]
    None,
    /// Doubles the yield of every stat.
    MachoBrace,
    /// Doubles the yield of exactly one stat.
    PowerItem(Stat),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown held item: {0}")]
pub struct UnknownHeldItem(pub String);

const POWER_ITEMS: [(&str, Stat); STAT_COUNT] = [
    ("power weight", Stat::Hp),
    ("power bracer", Stat::Attack),
    ("power belt", Stat::Defense),
    ("power lens", Stat::SpecialAttack),
    ("power band", Stat::SpecialDefense),
    ("power anklet", Stat::Speed),
];

impl HeldItem {
    /// Multiplier this item applies to `stat`.
    #[must_use]
    pub const fn multiplier(self, stat: Stat) -> u16 {
        match self {
            Self::None => 1,
            Self::MachoBrace => DOUBLING_MULTIPLIER,
            Self::PowerItem(boosted) => {
                if boosted.index() == stat.index() {
                    DOUBLING_MULTIPLIER
                } else {
                    1
                }
            }
        }
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::MachoBrace => "Macho Brace",
            Self::PowerItem(stat) => match stat {
                Stat::Hp => "Power Weight",
                Stat::Attack => "Power Bracer",
                Stat::Defense => "Power Belt",
                Stat::SpecialAttack => "Power Lens",
                Stat::SpecialDefense => "Power Band",
                Stat::Speed => "Power Anklet",
            },
        }
    }

    /// Resolve the optional item name carried by a request. `None` and the
    /// empty string both mean no item.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownHeldItem`] if the name is not a recognised item.
    pub fn from_request(name: Option<&str>) -> Result<Self, UnknownHeldItem> {
        match name.map(str::trim) {
            None | Some("") => Ok(Self::None),
            Some(raw) => raw.parse(),
        }
    }
}

impl FromStr for HeldItem {
    type Err = UnknownHeldItem;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let key = raw
            .trim()
            .to_ascii_lowercase()
            .replace(['_', '-'], " ");
        let key = key.split_whitespace().collect::<Vec<_>>().join(" ");
        if key == "none" {
            return Ok(Self::None);
        }
        if key == "macho brace" {
            return Ok(Self::MachoBrace);
        }
        POWER_ITEMS
            .iter()
            .find(|(name, _)| *name == key)
            .map(|&(_, stat)| Self::PowerItem(stat))
            .ok_or_else(|| UnknownHeldItem(raw.to_string()))
    }
}

impl fmt::Display for HeldItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Everything that scales a battle's EV yield.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub held_item: HeldItem,
    /// Pokérus doubles all yields and stacks with the held item.
    #[serde(default)]
    pub has_status_doubler: bool,
}

impl Modifiers {
    #[must_use]
    pub const fn new(held_item: HeldItem, has_status_doubler: bool) -> Self {
        Self {
            held_item,
            has_status_doubler,
        }
    }

    #[must_use]
    pub const fn status_multiplier(&self) -> u16 {
        if self.has_status_doubler {
            DOUBLING_MULTIPLIER
        } else {
            1
        }
    }

    /// Combined multiplier for one stat.
    #[must_use]
    pub const fn multiplier(&self, stat: Stat) -> u16 {
        self.held_item.multiplier(stat) * self.status_multiplier()
    }
}
