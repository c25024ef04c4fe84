//! Engine-level constants that are not part of the tunable catalog.
//!
//! Balance values (prices, odds, timings) live in `assets/catalog.json`;
//! only storage keys and fixed bookkeeping values belong here.

/// Storage key used for the single session snapshot.
pub const DEFAULT_SAVE_KEY: &str = "pigClickerSave";

/// Upper bound on auto-clickers a farm can own.
pub(crate) const MAX_AUTO_CLICKERS: u32 = 1;

/// Percent scale used by the ribbon roll.
pub(crate) const PERCENT_SCALE: f64 = 100.0;

/// Seed used by `GameEngine::new_farm` callers that do not care about reproducibility.
pub const DEFAULT_SEED: u64 = 0x0050_1C5E;

// Logging targets ----------------------------------------------------------
pub(crate) const LOG_TARGET_FARM: &str = "pigfarm::farm";
pub(crate) const LOG_TARGET_SAVE: &str = "pigfarm::save";
pub(crate) const LOG_TARGET_ACHIEVEMENTS: &str = "pigfarm::achievements";
