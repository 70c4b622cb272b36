//! Optimization request wire format and validation against a catalog.
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, SpeciesId, ZoneFilter, ZoneId};
use crate::constants::{DEFAULT_LAMBDA, MAX_POKEMON_LEVEL, MAX_STAT_EV, MIN_POKEMON_LEVEL};
use crate::error::PlanError;
use crate::modifiers::{HeldItem, Modifiers};
use crate::stats::{EvVector, Stat, StatMap};

/// Request as received from the form layer.
///
/// EV maps are read as signed integers so that negative or oversized values
/// reach validation and are reported, rather than failing deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeRequest {
    pub pokemon_name: String,
    #[serde(default = "OptimizeRequest::default_level")]
    pub pokemon_level: i64,
    pub start_zone: String,
    #[serde(default)]
    pub accessible_zones: Vec<String>,
    #[serde(default)]
    pub current_evs: StatMap<i64>,
    #[serde(default)]
    pub target_evs: StatMap<i64>,
    #[serde(default)]
    pub held_item: Option<String>,
    #[serde(default)]
    pub has_pokerus: bool,
    #[serde(default = "OptimizeRequest::default_lambda")]
    pub lambda_penalty: f64,
}

/// A request whose names resolved and whose numbers are in range.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub species: SpeciesId,
    pub level: u8,
    pub start: ZoneId,
    pub filter: ZoneFilter,
    pub current: EvVector,
    pub target: EvVector,
    pub modifiers: Modifiers,
    pub lambda: f64,
}

impl OptimizeRequest {
    const fn default_level() -> i64 {
        50
    }

    const fn default_lambda() -> f64 {
        DEFAULT_LAMBDA
    }

    /// Resolve names and check every numeric bound.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidRequest`] describing the first problem found.
    pub fn validate(&self, catalog: &Catalog) -> Result<ValidatedRequest, PlanError> {
        let species = catalog.species_id(&self.pokemon_name).ok_or_else(|| {
            PlanError::InvalidRequest(format!("unknown pokemon: {}", self.pokemon_name))
        })?;

        let level = u8::try_from(self.pokemon_level)
            .ok()
            .filter(|lvl| (MIN_POKEMON_LEVEL..=MAX_POKEMON_LEVEL).contains(lvl))
            .ok_or_else(|| {
                PlanError::InvalidRequest(format!(
                    "pokemon_level must be in {MIN_POKEMON_LEVEL}..={MAX_POKEMON_LEVEL} (got {})",
                    self.pokemon_level
                ))
            })?;

        let start = catalog.zone_id(&self.start_zone).ok_or_else(|| {
            PlanError::InvalidRequest(format!("unknown start zone: {}", self.start_zone))
        })?;

        let mut allowed = Vec::with_capacity(self.accessible_zones.len());
        for name in &self.accessible_zones {
            let id = catalog
                .zone_id(name)
                .ok_or_else(|| PlanError::InvalidRequest(format!("unknown zone: {name}")))?;
            allowed.push(id);
        }
        // The player is standing in the start zone whether or not it was listed.
        let filter = ZoneFilter::only(catalog, &allowed).including(start);

        let current = ev_vector("current_evs", &self.current_evs)?;
        let target = ev_vector("target_evs", &self.target_evs)?;

        let held_item = HeldItem::from_request(self.held_item.as_deref())
            .map_err(|e| PlanError::InvalidRequest(e.to_string()))?;

        if !self.lambda_penalty.is_finite() || !(0.0..=1.0).contains(&self.lambda_penalty) {
            return Err(PlanError::InvalidRequest(format!(
                "lambda_penalty must be in [0, 1] (got {})",
                self.lambda_penalty
            )));
        }

        log::debug!(
            "request accepted: {} from {} toward {target}",
            catalog.species(species).name,
            catalog.zone(start).name
        );

        Ok(ValidatedRequest {
            species,
            level,
            start,
            filter,
            current,
            target,
            modifiers: Modifiers::new(held_item, self.has_pokerus),
            lambda: self.lambda_penalty,
        })
    }
}

fn ev_vector(field: &str, raw: &StatMap<i64>) -> Result<EvVector, PlanError> {
    let mut evs = EvVector::zero();
    for (stat, value) in Stat::ALL.iter().zip(raw.to_array()) {
        let value = u16::try_from(value)
            .ok()
            .filter(|v| *v <= MAX_STAT_EV)
            .ok_or_else(|| {
                PlanError::InvalidRequest(format!(
                    "{field}.{stat} must be in 0..={MAX_STAT_EV} (got {value})"
                ))
            })?;
        evs.set(*stat, value);
    }
    evs.check_caps()
        .map_err(|e| PlanError::InvalidRequest(format!("{field}: {e}")))?;
    Ok(evs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::from_json(
            r#"{
                "zones": [
                    {"name": "Route 1", "edges": [{"to": "Mt. Moon", "distance": 3}]},
                    {"name": "Mt. Moon", "encounters": [{"species": "Zubat"}]}
                ],
                "species": [{"name": "Zubat", "evs": {"Speed": 1}}]
            }"#,
        )
        .unwrap()
    }

    fn request() -> OptimizeRequest {
        serde_json::from_value(serde_json::json!({
            "pokemon_name": "zubat",
            "pokemon_level": 12,
            "start_zone": "route_1",
            "accessible_zones": ["mt moon"],
            "current_evs": {"Speed": 4},
            "target_evs": {"Speed": 10, "HP": 0},
            "held_item": "Power Anklet",
            "has_pokerus": true,
            "lambda_penalty": 0.25
        }))
        .unwrap()
    }

    #[test]
    fn resolves_names_and_modifiers() {
        let cat = catalog();
        let valid = request().validate(&cat).unwrap();
        assert_eq!(valid.level, 12);
        assert_eq!(valid.start, cat.zone_id("Route 1").unwrap());
        assert!(valid.filter.allows(valid.start));
        assert!(valid.filter.allows(cat.zone_id("Mt. Moon").unwrap()));
        assert_eq!(valid.current, EvVector::single(Stat::Speed, 4));
        assert_eq!(valid.modifiers.multiplier(Stat::Speed), 4);
        assert!((valid.lambda - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_optional_fields_take_defaults() {
        let req: OptimizeRequest = serde_json::from_str(
            r#"{"pokemon_name": "Zubat", "start_zone": "Route 1"}"#,
        )
        .unwrap();
        let valid = req.validate(&catalog()).unwrap();
        assert!(valid.current.is_zero() && valid.target.is_zero());
        assert!(!valid.filter.is_restricted());
        assert!((valid.lambda - DEFAULT_LAMBDA).abs() < f64::EPSILON);
    }

    fn rejects(mutate: impl FnOnce(&mut OptimizeRequest)) -> String {
        let mut req = request();
        mutate(&mut req);
        match req.validate(&catalog()) {
            Err(PlanError::InvalidRequest(msg)) => msg,
            other => panic!("expected InvalidRequest, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_names() {
        assert!(rejects(|r| r.pokemon_name = "Mew".into()).contains("unknown pokemon"));
        assert!(rejects(|r| r.start_zone = "Atlantis".into()).contains("start zone"));
        assert!(rejects(|r| r.accessible_zones.push("Nowhere".into())).contains("Nowhere"));
        assert!(rejects(|r| r.held_item = Some("Lucky Egg".into())).contains("held item"));
    }

    #[test]
    fn rejects_out_of_range_numbers() {
        assert!(rejects(|r| r.pokemon_level = 0).contains("pokemon_level"));
        assert!(rejects(|r| r.pokemon_level = 101).contains("pokemon_level"));
        assert!(rejects(|r| r.lambda_penalty = 1.5).contains("lambda_penalty"));
        assert!(rejects(|r| r.lambda_penalty = f64::NAN).contains("lambda_penalty"));
        assert!(rejects(|r| r.current_evs.hp = -1).contains("current_evs.HP"));
        assert!(rejects(|r| r.target_evs.speed = 253).contains("target_evs.Speed"));
        let msg = rejects(|r| {
            r.target_evs.hp = 252;
            r.target_evs.attack = 252;
            r.target_evs.speed = 10;
        });
        assert!(msg.contains("total"));
    }
}
