use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::{GameCatalog, PigKind};

/// The pig currently occupying the slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentPig {
    #[serde(rename = "type")]
    pub kind: PigKind,
    pub value: u64,
    #[serde(default)]
    pub ribbons: u32,
}

impl CurrentPig {
    #[must_use]
    pub const fn new(kind: PigKind, value: u64) -> Self {
        Self {
            kind,
            value,
            ribbons: 0,
        }
    }
}

/// Mutable session state. Mutated only through [`crate::Farm`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveState {
    pub coins: u64,
    pub pigs_raised: u64,
    pub pigs_harvested: u64,
    pub total_clicks: u64,
    pub ribbons_won: u64,
    pub ribbon_chance_percent: u32,
    pub current_pig: Option<CurrentPig>,
    pub auto_clicker_count: u32,
    pub auto_clicker_upgrade_level: u32,
    pub auto_clicker_interval_ms: u64,
    pub kill_count_by_type: BTreeMap<PigKind, u64>,
    pub music_muted: bool,
    pub achievement_unlocked: BTreeMap<String, bool>,
}

impl LiveState {
    /// Start-of-game state for the given catalog.
    #[must_use]
    pub fn fresh(catalog: &GameCatalog) -> Self {
        Self {
            coins: 0,
            pigs_raised: 0,
            pigs_harvested: 0,
            total_clicks: 0,
            ribbons_won: 0,
            ribbon_chance_percent: catalog.ribbon.base_chance,
            current_pig: None,
            auto_clicker_count: 0,
            auto_clicker_upgrade_level: 0,
            auto_clicker_interval_ms: catalog.auto_clicker.base_speed_ms,
            kill_count_by_type: PigKind::ALL.into_iter().map(|k| (k, 0)).collect(),
            music_muted: false,
            achievement_unlocked: catalog
                .achievements()
                .iter()
                .map(|a| (a.id.clone(), false))
                .collect(),
        }
    }

    /// Lifetime harvests of a pig kind.
    #[must_use]
    pub fn kills(&self, kind: PigKind) -> u64 {
        self.kill_count_by_type.get(&kind).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn is_unlocked(&self, id: &str) -> bool {
        self.achievement_unlocked.get(id).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn unlocked_count(&self) -> usize {
        self.achievement_unlocked.values().filter(|v| **v).count()
    }

    #[must_use]
    pub const fn owns_auto_clicker(&self) -> bool {
        self.auto_clicker_count > 0
    }

    #[must_use]
    pub const fn has_pig(&self) -> bool {
        self.current_pig.is_some()
    }

    /// Ribbon upgrade tier already purchased, zero-indexed.
    #[must_use]
    pub const fn ribbon_level(&self, base_chance: u32) -> u32 {
        self.ribbon_chance_percent.saturating_sub(base_chance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_has_defaults() {
        let catalog = GameCatalog::load_from_static().unwrap();
        let state = LiveState::fresh(&catalog);
        assert_eq!(state.coins, 0);
        assert_eq!(state.ribbon_chance_percent, 1);
        assert_eq!(state.auto_clicker_interval_ms, 2_000);
        assert!(state.current_pig.is_none());
        assert_eq!(state.kill_count_by_type.len(), 7);
        assert!(PigKind::ALL.iter().all(|k| state.kills(*k) == 0));
        assert_eq!(state.achievement_unlocked.len(), 16);
        assert_eq!(state.unlocked_count(), 0);
        assert!(!state.owns_auto_clicker());
        assert_eq!(state.ribbon_level(1), 0);
    }

    #[test]
    fn current_pig_serializes_kind_as_type() {
        let pig = CurrentPig::new(PigKind::Prize, 25);
        let json = serde_json::to_value(&pig).unwrap();
        assert_eq!(json["type"], "prize");
        assert_eq!(json["value"], 25);
        assert_eq!(json["ribbons"], 0);
    }
}
