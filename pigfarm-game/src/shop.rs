//! Shop listing and harvest labels derived from the farm's current state.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::{GameCatalog, HarvestTier, PigKind};
use crate::farm::Farm;
use crate::numbers::format_compact;
use crate::pricing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShopItem {
    Pig(PigKind),
    AutoClicker,
    AutoClickerUpgrade,
    RibbonUpgrade,
}

/// One purchasable line in the shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopEntry {
    pub item: ShopItem,
    pub label: String,
    /// `None` once the item is maxed out.
    pub cost: Option<u64>,
    /// Whether the purchase rules allow buying right now, ignoring funds.
    pub available: bool,
    pub affordable: bool,
    pub detail: String,
}

/// Every shop entry, pigs first in shop order.
#[must_use]
pub fn listing<R: Rng>(farm: &Farm<R>) -> Vec<ShopEntry> {
    let catalog = farm.catalog();
    let state = farm.state();
    let coins = state.coins;
    let mut entries = Vec::with_capacity(PigKind::ALL.len() + 3);

    for (kind, def) in catalog.pig_types() {
        let cost = pricing::pig_cost(catalog, kind);
        let kills = state.kills(kind);
        let start = pricing::pig_start_value(catalog, state, kind);
        entries.push(ShopEntry {
            item: ShopItem::Pig(kind),
            label: format!("{} {}", def.emoji, def.name),
            cost: Some(cost),
            available: !state.has_pig(),
            affordable: coins >= cost,
            detail: format!(
                "Starts at {} (+{} kill bonus), +{}/click, {} killed",
                format_compact(start),
                kills,
                def.base_click_value,
                kills
            ),
        });
    }

    let auto = &catalog.auto_clicker;
    entries.push(ShopEntry {
        item: ShopItem::AutoClicker,
        label: "Auto-Clicker".to_string(),
        cost: Some(auto.base_cost),
        available: !state.owns_auto_clicker(),
        affordable: coins >= auto.base_cost,
        detail: format!("Clicks every {:.1}s", seconds(auto.base_speed_ms)),
    });

    let level = state.auto_clicker_upgrade_level;
    let upgrade_cost = pricing::auto_clicker_upgrade_cost(catalog, level);
    let next_interval = pricing::auto_clicker_interval(catalog, level.saturating_add(1));
    entries.push(ShopEntry {
        item: ShopItem::AutoClickerUpgrade,
        label: "Auto-Clicker Upgrade".to_string(),
        cost: Some(upgrade_cost),
        available: state.owns_auto_clicker(),
        affordable: coins >= upgrade_cost,
        detail: format!(
            "Level {level}: {:.1}s -> {:.1}s",
            seconds(state.auto_clicker_interval_ms),
            seconds(next_interval)
        ),
    });

    let ribbon_level = state.ribbon_level(catalog.ribbon.base_chance);
    let ribbon_cost = pricing::ribbon_upgrade_cost(catalog, ribbon_level);
    let chance = state.ribbon_chance_percent;
    entries.push(ShopEntry {
        item: ShopItem::RibbonUpgrade,
        label: "Ribbon Chance".to_string(),
        cost: ribbon_cost,
        available: ribbon_cost.is_some(),
        affordable: ribbon_cost.is_some_and(|cost| coins >= cost),
        detail: if ribbon_cost.is_some() {
            format!("{chance}% -> {}% per click", chance + 1)
        } else {
            format!("Maxed at {chance}%")
        },
    });

    entries
}

fn seconds(ms: u64) -> f64 {
    crate::numbers::u64_to_f64(ms) / 1_000.0
}

/// Highest tier whose threshold the value reaches. Falls back to the lowest tier.
#[must_use]
pub fn harvest_tier(catalog: &GameCatalog, value: u64) -> &HarvestTier {
    let tiers = catalog.harvest_tiers();
    tiers
        .iter()
        .find(|tier| value >= tier.min_value)
        .unwrap_or_else(|| &tiers[tiers.len() - 1])
}
