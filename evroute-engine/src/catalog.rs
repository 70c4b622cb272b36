//! Immutable zone graph and species snapshot.
//!
//! The catalog is built once from JSON, validated, and then only read. Zones
//! and species live in flat arenas addressed by [`ZoneId`] and [`SpeciesId`],
//! so a single `Arc<Catalog>` can back any number of concurrent searches.
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap, HashMap};
use std::hash::Hasher;
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use twox_hash::XxHash64;

use crate::constants::{MAX_STAT_EV, STAT_COUNT};
use crate::numbers::{round_to, u32_to_f64, u64_to_f64};
use crate::stats::{EvVector, Stat, StatMap};

pub(crate) const DEFAULT_CATALOG_DATA: &str = include_str!("../assets/kanto.json");

static EMBEDDED_CATALOG: OnceLock<Result<Arc<Catalog>, CatalogError>> = OnceLock::new();

static ZONE_NAME_NOISE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"[\s._]").ok());

/// Index of a zone inside a [`Catalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZoneId(pub usize);

/// Index of a species inside a [`Catalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpeciesId(pub usize);

/// Errors raised while building a catalog snapshot.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CatalogError {
    #[error("catalog JSON invalid: {0}")]
    Parse(String),
    #[error("duplicate zone name: {0}")]
    DuplicateZone(String),
    #[error("duplicate species name: {0}")]
    DuplicateSpecies(String),
    #[error("zone {from} has an edge to unknown zone {to}")]
    UnknownEdgeTarget { from: String, to: String },
    #[error("zone {zone} lists unknown species {species}")]
    UnknownSpecies { zone: String, species: String },
    #[error("edge {from} -> {to} has invalid distance {distance}")]
    InvalidDistance {
        from: String,
        to: String,
        distance: f64,
    },
    #[error("species {species} yields {value} {stat} EVs (max {max})")]
    YieldOverCap {
        species: String,
        stat: Stat,
        value: u16,
        max: u16,
    },
    #[error("catalog source unavailable: {0}")]
    Source(String),
}

// Wire format ---------------------------------------------------------------

/// Raw catalog document as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CatalogData {
    #[serde(default)]
    pub zones: Vec<ZoneDef>,
    #[serde(default)]
    pub species: Vec<SpeciesDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneDef {
    pub name: String,
    #[serde(default)]
    pub edges: Vec<EdgeDef>,
    #[serde(default)]
    pub encounters: Vec<EncounterDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeDef {
    pub to: String,
    pub distance: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterDef {
    pub species: String,
    /// Relative encounter rate. Informational only.
    #[serde(default = "default_weight")]
    pub weight: u32,
}

const fn default_weight() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pokedex_number: Option<u16>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,
    #[serde(default)]
    pub evs: EvVector,
}

// Snapshot ------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub to: ZoneId,
    pub distance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Encounter {
    pub species: SpeciesId,
    pub weight: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub name: String,
    pub edges: SmallVec<[Edge; 4]>,
    pub encounters: SmallVec<[Encounter; 8]>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Species {
    pub name: String,
    pub pokedex_number: Option<u16>,
    pub types: Vec<String>,
    pub evs: EvVector,
}

/// Validated, read-only catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    zones: Vec<Zone>,
    species: Vec<Species>,
    zone_index: HashMap<String, ZoneId>,
    species_index: HashMap<String, SpeciesId>,
    fingerprint: u64,
}

/// Normalize a zone name for lookup: drop whitespace, dots and underscores,
/// then lowercase. `"Mt. Moon"` and `"mt_moon"` both become `"mtmoon"`.
#[must_use]
pub fn normalize_zone_name(raw: &str) -> String {
    ZONE_NAME_NOISE.as_ref().map_or_else(
        || {
            raw.chars()
                .filter(|c| !c.is_whitespace() && *c != '.' && *c != '_')
                .collect::<String>()
                .to_lowercase()
        },
        |re| re.replace_all(raw, "").to_lowercase(),
    )
}

fn species_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

impl Catalog {
    /// Validate raw data and build the snapshot.
    ///
    /// # Errors
    ///
    /// Returns the first structural problem found: duplicate names, dangling
    /// edges or encounter entries, bad distances, or yields over the stat cap.
    pub fn from_data(data: CatalogData) -> Result<Self, CatalogError> {
        let fingerprint = fingerprint_of(&data);

        let mut species_index = HashMap::with_capacity(data.species.len());
        let mut species = Vec::with_capacity(data.species.len());
        for def in data.species {
            for (stat, value) in def.evs.iter() {
                if value > MAX_STAT_EV {
                    return Err(CatalogError::YieldOverCap {
                        species: def.name,
                        stat,
                        value,
                        max: MAX_STAT_EV,
                    });
                }
            }
            let id = SpeciesId(species.len());
            if species_index.insert(species_key(&def.name), id).is_some() {
                return Err(CatalogError::DuplicateSpecies(def.name));
            }
            species.push(Species {
                name: def.name,
                pokedex_number: def.pokedex_number,
                types: def.types,
                evs: def.evs,
            });
        }

        let mut zone_index = HashMap::with_capacity(data.zones.len());
        for (idx, def) in data.zones.iter().enumerate() {
            if zone_index
                .insert(normalize_zone_name(&def.name), ZoneId(idx))
                .is_some()
            {
                return Err(CatalogError::DuplicateZone(def.name.clone()));
            }
        }

        let mut zones = Vec::with_capacity(data.zones.len());
        for def in data.zones {
            let mut edges = SmallVec::new();
            for edge in &def.edges {
                if !edge.distance.is_finite() || edge.distance < 0.0 {
                    return Err(CatalogError::InvalidDistance {
                        from: def.name.clone(),
                        to: edge.to.clone(),
                        distance: edge.distance,
                    });
                }
                let Some(&to) = zone_index.get(&normalize_zone_name(&edge.to)) else {
                    return Err(CatalogError::UnknownEdgeTarget {
                        from: def.name.clone(),
                        to: edge.to.clone(),
                    });
                };
                edges.push(Edge {
                    to,
                    distance: edge.distance,
                });
            }
            let mut encounters = SmallVec::new();
            for slot in &def.encounters {
                let Some(&species_id) = species_index.get(&species_key(&slot.species)) else {
                    return Err(CatalogError::UnknownSpecies {
                        zone: def.name.clone(),
                        species: slot.species.clone(),
                    });
                };
                encounters.push(Encounter {
                    species: species_id,
                    weight: slot.weight,
                });
            }
            zones.push(Zone {
                name: def.name,
                edges,
                encounters,
            });
        }

        log::info!(
            "catalog loaded: {} zones, {} species, fingerprint {fingerprint:016x}",
            zones.len(),
            species.len()
        );

        Ok(Self {
            zones,
            species,
            zone_index,
            species_index,
            fingerprint,
        })
    }

    /// Parse and validate a catalog document.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Parse`] for malformed JSON, or any validation
    /// error from [`Catalog::from_data`].
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let data: CatalogData =
            serde_json::from_str(json).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Self::from_data(data)
    }

    /// The Kanto catalog bundled with the crate, parsed once per process.
    ///
    /// # Errors
    ///
    /// Returns an error only if the bundled asset is corrupt.
    pub fn embedded() -> Result<Arc<Self>, CatalogError> {
        EMBEDDED_CATALOG
            .get_or_init(|| Self::from_json(DEFAULT_CATALOG_DATA).map(Arc::new))
            .clone()
    }

    /// Rebuild the wire document. Order matches the source document.
    #[must_use]
    pub fn to_data(&self) -> CatalogData {
        CatalogData {
            zones: self
                .zones
                .iter()
                .map(|zone| ZoneDef {
                    name: zone.name.clone(),
                    edges: zone
                        .edges
                        .iter()
                        .map(|edge| EdgeDef {
                            to: self.zone(edge.to).name.clone(),
                            distance: edge.distance,
                        })
                        .collect(),
                    encounters: zone
                        .encounters
                        .iter()
                        .map(|slot| EncounterDef {
                            species: self.species(slot.species).name.clone(),
                            weight: slot.weight,
                        })
                        .collect(),
                })
                .collect(),
            species: self
                .species
                .iter()
                .map(|s| SpeciesDef {
                    name: s.name.clone(),
                    pokedex_number: s.pokedex_number,
                    types: s.types.clone(),
                    evs: s.evs,
                })
                .collect(),
        }
    }

    #[must_use]
    pub const fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    #[must_use]
    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    #[must_use]
    pub fn species_count(&self) -> usize {
        self.species.len()
    }

    /// # Panics
    ///
    /// Panics if `id` did not come from this catalog.
    #[must_use]
    pub fn zone(&self, id: ZoneId) -> &Zone {
        &self.zones[id.0]
    }

    /// # Panics
    ///
    /// Panics if `id` did not come from this catalog.
    #[must_use]
    pub fn species(&self, id: SpeciesId) -> &Species {
        &self.species[id.0]
    }

    pub fn zones(&self) -> impl Iterator<Item = (ZoneId, &Zone)> {
        self.zones.iter().enumerate().map(|(idx, z)| (ZoneId(idx), z))
    }

    pub fn all_species(&self) -> impl Iterator<Item = (SpeciesId, &Species)> {
        self.species
            .iter()
            .enumerate()
            .map(|(idx, s)| (SpeciesId(idx), s))
    }

    /// Look a zone up by name, tolerating spacing, punctuation and case.
    #[must_use]
    pub fn zone_id(&self, name: &str) -> Option<ZoneId> {
        self.zone_index.get(&normalize_zone_name(name)).copied()
    }

    /// Look a species up by name, case-insensitively.
    #[must_use]
    pub fn species_id(&self, name: &str) -> Option<SpeciesId> {
        self.species_index.get(&species_key(name)).copied()
    }

    /// Zones whose encounter table lists `species`, in catalog order.
    #[must_use]
    pub fn zones_for_species(&self, species: SpeciesId) -> Vec<ZoneId> {
        self.zones()
            .filter(|(_, zone)| zone.encounters.iter().any(|e| e.species == species))
            .map(|(id, _)| id)
            .collect()
    }

    /// Encounter-weighted average EVs per battle in a zone. Informational only.
    #[must_use]
    pub fn average_yield(&self, zone: ZoneId) -> [f64; STAT_COUNT] {
        let zone = self.zone(zone);
        let total_weight: u64 = zone.encounters.iter().map(|e| u64::from(e.weight)).sum();
        let mut avg = [0.0; STAT_COUNT];
        if total_weight == 0 {
            return avg;
        }
        for slot in &zone.encounters {
            let share = u32_to_f64(slot.weight) / u64_to_f64(total_weight);
            let evs = self.species(slot.species).evs;
            for stat in Stat::ALL {
                avg[stat.index()] += f64::from(evs.get(stat)) * share;
            }
        }
        avg
    }

    /// Shortest travel distance from `start` to every zone, using only zones
    /// the filter allows. `None` marks unreachable zones.
    #[must_use]
    pub fn distances_from(&self, start: ZoneId, filter: &ZoneFilter) -> Vec<Option<f64>> {
        let mut best: Vec<Option<f64>> = vec![None; self.zones.len()];
        let mut heap = BinaryHeap::new();
        best[start.0] = Some(0.0);
        heap.push(DistanceEntry {
            distance: 0.0,
            zone: start,
        });
        while let Some(DistanceEntry { distance, zone }) = heap.pop() {
            if best[zone.0].is_some_and(|known| distance > known) {
                continue;
            }
            for edge in &self.zone(zone).edges {
                if !filter.allows(edge.to) {
                    continue;
                }
                let next = distance + edge.distance;
                if best[edge.to.0].is_none_or(|known| next < known) {
                    best[edge.to.0] = Some(next);
                    heap.push(DistanceEntry {
                        distance: next,
                        zone: edge.to,
                    });
                }
            }
        }
        best
    }

    /// Read-only adjacency view for visualization collaborators.
    #[must_use]
    pub fn adjacency(&self) -> AdjacencyExport {
        let zones = self
            .zones()
            .map(|(id, zone)| {
                let average = self.average_yield(id).map(|v| round_to(v, 3));
                let view = ZoneView {
                    edges: zone
                        .edges
                        .iter()
                        .map(|edge| EdgeDef {
                            to: self.zone(edge.to).name.clone(),
                            distance: edge.distance,
                        })
                        .collect(),
                    species: zone
                        .encounters
                        .iter()
                        .map(|slot| {
                            let species = self.species(slot.species);
                            SpeciesView {
                                name: species.name.clone(),
                                weight: slot.weight,
                                evs: species.evs,
                            }
                        })
                        .collect(),
                    average_yield: StatMap::from_array(average),
                };
                (zone.name.clone(), view)
            })
            .collect();
        AdjacencyExport {
            fingerprint: format!("{:016x}", self.fingerprint),
            zones,
        }
    }
}

/// Restricts which zones travel may enter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ZoneFilter {
    allowed: Option<Vec<bool>>,
}

impl ZoneFilter {
    /// Every zone is usable.
    #[must_use]
    pub const fn unrestricted() -> Self {
        Self { allowed: None }
    }

    /// Only the listed zones are usable. An empty list means no restriction.
    #[must_use]
    pub fn only(catalog: &Catalog, zones: &[ZoneId]) -> Self {
        if zones.is_empty() {
            return Self::unrestricted();
        }
        let mut allowed = vec![false; catalog.zone_count()];
        for zone in zones {
            if let Some(slot) = allowed.get_mut(zone.0) {
                *slot = true;
            }
        }
        Self {
            allowed: Some(allowed),
        }
    }

    /// Make sure `zone` is usable even if the list omitted it.
    #[must_use]
    pub fn including(mut self, zone: ZoneId) -> Self {
        if let Some(allowed) = self.allowed.as_mut()
            && let Some(slot) = allowed.get_mut(zone.0)
        {
            *slot = true;
        }
        self
    }

    #[must_use]
    pub fn allows(&self, zone: ZoneId) -> bool {
        self.allowed
            .as_ref()
            .is_none_or(|allowed| allowed.get(zone.0).copied().unwrap_or(false))
    }

    #[must_use]
    pub const fn is_restricted(&self) -> bool {
        self.allowed.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesView {
    pub name: String,
    pub weight: u32,
    pub evs: EvVector,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneView {
    pub edges: Vec<EdgeDef>,
    pub species: Vec<SpeciesView>,
    pub average_yield: StatMap<f64>,
}

/// `zone -> {edges, species}` export of the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjacencyExport {
    pub fingerprint: String,
    pub zones: BTreeMap<String, ZoneView>,
}

fn fingerprint_of(data: &CatalogData) -> u64 {
    let bytes = serde_json::to_vec(data).unwrap_or_default();
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(&bytes);
    hasher.finish()
}

#[derive(Debug, Clone, Copy)]
struct DistanceEntry {
    distance: f64,
    zone: ZoneId,
}

impl PartialEq for DistanceEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DistanceEntry {}

impl PartialOrd for DistanceEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DistanceEntry {
    // Reversed so the max-heap pops the nearest zone first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.zone.cmp(&self.zone))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_zone_json() -> &'static str {
        r#"{
            "zones": [
                {"name": "A", "edges": [{"to": "B", "distance": 10}]},
                {"name": "B", "edges": [{"to": "A", "distance": 10}],
                 "encounters": [{"species": "Rattata", "weight": 3}, {"species": "Pidgey", "weight": 1}]}
            ],
            "species": [
                {"name": "Rattata", "evs": {"Speed": 1}},
                {"name": "Pidgey", "evs": {"Speed": 1, "HP": 2}}
            ]
        }"#
    }

    #[test]
    fn builds_indexes_and_derived_views() {
        let catalog = Catalog::from_json(two_zone_json()).unwrap();
        assert_eq!(catalog.zone_count(), 2);
        let b = catalog.zone_id("b").unwrap();
        let rattata = catalog.species_id("RATTATA").unwrap();
        assert_eq!(catalog.zones_for_species(rattata), vec![b]);
        let avg = catalog.average_yield(b);
        assert!((avg[Stat::Speed.index()] - 1.0).abs() < 1e-9);
        assert!((avg[Stat::Hp.index()] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn average_yield_handles_huge_weights() {
        let json = format!(
            r#"{{
                "zones": [{{"name": "A", "encounters": [
                    {{"species": "Rattata", "weight": {max}}},
                    {{"species": "Pidgey", "weight": {max}}}
                ]}}],
                "species": [
                    {{"name": "Rattata", "evs": {{"Speed": 1}}}},
                    {{"name": "Pidgey", "evs": {{"Speed": 1, "HP": 2}}}}
                ]
            }}"#,
            max = u32::MAX
        );
        let catalog = Catalog::from_json(&json).unwrap();
        let avg = catalog.average_yield(catalog.zone_id("A").unwrap());
        assert!((avg[Stat::Speed.index()] - 1.0).abs() < 1e-9);
        assert!((avg[Stat::Hp.index()] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn zone_names_normalize() {
        assert_eq!(normalize_zone_name("Mt. Moon"), "mtmoon");
        assert_eq!(normalize_zone_name(" Route 1 "), "route1");
        assert_eq!(normalize_zone_name("Route16_East"), "route16east");
    }

    #[test]
    fn rejects_dangling_edges_and_unknown_species() {
        let dangling = r#"{"zones": [{"name": "A", "edges": [{"to": "Nowhere", "distance": 1}]}]}"#;
        assert!(matches!(
            Catalog::from_json(dangling),
            Err(CatalogError::UnknownEdgeTarget { .. })
        ));
        let unknown = r#"{"zones": [{"name": "A", "encounters": [{"species": "Missingno"}]}]}"#;
        assert!(matches!(
            Catalog::from_json(unknown),
            Err(CatalogError::UnknownSpecies { .. })
        ));
    }

    #[test]
    fn rejects_bad_distances_and_duplicates() {
        let negative = r#"{"zones": [{"name": "A", "edges": [{"to": "A", "distance": -1}]}]}"#;
        assert!(matches!(
            Catalog::from_json(negative),
            Err(CatalogError::InvalidDistance { .. })
        ));
        let dup = r#"{"zones": [{"name": "Route 1"}, {"name": "Route1"}]}"#;
        assert_eq!(
            Catalog::from_json(dup).unwrap_err(),
            CatalogError::DuplicateZone("Route1".to_string())
        );
        assert!(matches!(
            Catalog::from_json("[]"),
            Err(CatalogError::Parse(_))
        ));
    }

    #[test]
    fn distances_respect_filter() {
        let catalog = Catalog::from_json(two_zone_json()).unwrap();
        let a = catalog.zone_id("A").unwrap();
        let b = catalog.zone_id("B").unwrap();
        let open = catalog.distances_from(a, &ZoneFilter::unrestricted());
        assert_eq!(open[b.0], Some(10.0));
        let closed = catalog.distances_from(a, &ZoneFilter::only(&catalog, &[a]));
        assert_eq!(closed[b.0], None);
        assert_eq!(closed[a.0], Some(0.0));
    }

    #[test]
    fn filter_can_force_include_start() {
        let catalog = Catalog::from_json(two_zone_json()).unwrap();
        let a = catalog.zone_id("A").unwrap();
        let b = catalog.zone_id("B").unwrap();
        let filter = ZoneFilter::only(&catalog, &[b]).including(a);
        assert!(filter.allows(a) && filter.allows(b));
        assert!(!ZoneFilter::only(&catalog, &[b]).allows(a));
        assert!(ZoneFilter::only(&catalog, &[]).allows(a));
    }

    #[test]
    fn adjacency_export_lists_edges_species_and_fingerprint() {
        let catalog = Catalog::from_json(two_zone_json()).unwrap();
        let export = catalog.adjacency();
        let b = &export.zones["B"];
        assert_eq!(b.edges[0].to, "A");
        assert_eq!(b.species.len(), 2);
        assert_eq!(export.fingerprint.len(), 16);
        let again = Catalog::from_data(catalog.to_data()).unwrap();
        assert_eq!(again.fingerprint(), catalog.fingerprint());
    }

    #[test]
    fn bundled_catalog_loads() {
        let catalog = Catalog::embedded().unwrap();
        assert!(catalog.zone_count() > 10);
        assert!(catalog.zone_id("Pallet Town").is_some());
        assert!(catalog.species_id("Pikachu").is_some());
    }
}
