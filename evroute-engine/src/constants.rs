//! Centralized caps and tuning constants for the EV route optimizer.
//!
//! The EV caps mirror the Generation III rules. The cost defaults are the
//! values `PlannerConfig` falls back to when a deployment does not override
//! them.

// EV caps ------------------------------------------------------------------
/// Maximum effort value a single stat can hold.
pub const MAX_STAT_EV: u16 = 252;
/// Maximum effort value summed over all six stats.
pub const MAX_TOTAL_EV: u16 = 510;
/// Number of stats carried by an EV vector.
pub const STAT_COUNT: usize = 6;

// Modifiers ----------------------------------------------------------------
/// Multiplier applied by Macho Brace, the Power items, and Pokérus.
pub const DOUBLING_MULTIPLIER: u16 = 2;

// Cost model ---------------------------------------------------------------
/// Distance-equivalent cost of a single battle (the constant `K`).
pub const DEFAULT_BATTLE_WEIGHT: f64 = 10.0;
/// Lambda used when a caller does not express a preference.
pub const DEFAULT_LAMBDA: f64 = 0.5;

// Search limits ------------------------------------------------------------
/// Upper bound on popped states before the search gives up.
pub const DEFAULT_MAX_EXPANSIONS: usize = 2_000_000;
/// Wall-clock budget for one request, in milliseconds.
pub const DEFAULT_TIME_BUDGET_MS: u64 = 5_000;
/// How many pops happen between deadline checks.
pub(crate) const CANCEL_CHECK_INTERVAL: usize = 256;

// Request bounds -----------------------------------------------------------
pub const MIN_POKEMON_LEVEL: u8 = 1;
pub const MAX_POKEMON_LEVEL: u8 = 100;

// Environment --------------------------------------------------------------
/// Environment variable the CLI consults for a catalog path.
pub const CATALOG_ENV_VAR: &str = "EVROUTE_CATALOG";
