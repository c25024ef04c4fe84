//! Deterministic pricing and value formulas.
use crate::catalog::{GameCatalog, PigKind};
use crate::numbers::{floor_f64_to_u64, powi_level, u64_to_f64};
use crate::state::LiveState;

/// Purchase price of a pig. Kills do not affect cost.
#[must_use]
pub fn pig_cost(catalog: &GameCatalog, kind: PigKind) -> u64 {
    catalog.pig_type(kind).base_cost
}

/// Starting value of a freshly bought pig: base value plus one per prior harvest of that kind.
#[must_use]
pub fn pig_start_value(catalog: &GameCatalog, state: &LiveState, kind: PigKind) -> u64 {
    catalog
        .pig_type(kind)
        .base_start_value
        .saturating_add(state.kills(kind))
}

#[must_use]
pub fn pig_click_value(catalog: &GameCatalog, kind: PigKind) -> u64 {
    catalog.pig_type(kind).base_click_value
}

/// Cost of the next ribbon tier, or `None` once the ladder is exhausted.
#[must_use]
pub fn ribbon_upgrade_cost(catalog: &GameCatalog, level: u32) -> Option<u64> {
    if catalog.ribbon.base_chance.saturating_add(level) >= catalog.ribbon.max_chance {
        return None;
    }
    catalog.ribbon.upgrade_costs.get(level as usize).copied()
}

/// `floor(upgrade_base_cost * multiplier^level)`.
#[must_use]
pub fn auto_clicker_upgrade_cost(catalog: &GameCatalog, level: u32) -> u64 {
    let cfg = &catalog.auto_clicker;
    let scaled = u64_to_f64(cfg.upgrade_base_cost) * powi_level(cfg.upgrade_cost_multiplier, level);
    floor_f64_to_u64(scaled)
}

/// `max(min_speed, floor(base_speed / speed_multiplier^level))`.
#[must_use]
pub fn auto_clicker_interval(catalog: &GameCatalog, level: u32) -> u64 {
    let cfg = &catalog.auto_clicker;
    let scaled = u64_to_f64(cfg.base_speed_ms) / powi_level(cfg.speed_multiplier, level);
    floor_f64_to_u64(scaled).max(cfg.min_speed_ms)
}

/// `floor(current_value * bonus_percent / 100)`.
#[must_use]
pub fn ribbon_bonus(catalog: &GameCatalog, current_value: u64) -> u64 {
    let bonus = u128::from(current_value) * u128::from(catalog.ribbon.bonus_percent) / 100;
    u64::try_from(bonus).unwrap_or(u64::MAX)
}
