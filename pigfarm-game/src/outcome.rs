//! Results reported back to the host after each engine operation.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{AchievementDef, PigKind};

/// Business-rule rejection. Never fatal; the host decides how to surface it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum Rejection {
    #[error("not enough coins: need {needed}, have {available}")]
    InsufficientFunds { needed: u64, available: u64 },
    #[error("a pig is already being raised")]
    SlotOccupied,
    #[error("there is no pig to work with")]
    NoActivePig,
    #[error("auto-clicker already owned; upgrade it instead")]
    AlreadyOwned,
    #[error("buy an auto-clicker first")]
    NotOwned,
    #[error("already at maximum")]
    Maxed,
}

/// Who triggered a click. Automatic clicks are economically identical to manual ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClickSource {
    Manual,
    Automatic,
}

impl ClickSource {
    /// Hosts only vibrate on manual clicks.
    #[must_use]
    pub const fn wants_haptics(self) -> bool {
        matches!(self, Self::Manual)
    }
}

/// Instruction to the host's tick source after a purchase changes cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickDirective {
    Restart { interval_ms: u64 },
}

/// Newly unlocked achievement, copied out of the catalog for presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementUnlock {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
}

impl From<&AchievementDef> for AchievementUnlock {
    fn from(def: &AchievementDef) -> Self {
        Self {
            id: def.id.clone(),
            name: def.name.clone(),
            description: def.description.clone(),
            icon: def.icon.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RibbonAward {
    pub bonus: u64,
    /// Ribbons on the current pig after this award.
    pub pig_ribbons: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickOutcome {
    pub source: ClickSource,
    pub value_delta: u64,
    pub pig_value: u64,
    pub total_clicks: u64,
    pub ribbon: Option<RibbonAward>,
    pub unlocked: Vec<AchievementUnlock>,
}

impl ClickOutcome {
    #[must_use]
    pub const fn ribbon_triggered(&self) -> bool {
        self.ribbon.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Purchase {
    Pig { kind: PigKind, start_value: u64 },
    AutoClicker,
    AutoClickerUpgrade { level: u32 },
    RibbonUpgrade { chance_percent: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOutcome {
    pub purchase: Purchase,
    pub cost: u64,
    pub coins_left: u64,
    pub tick: Option<TickDirective>,
    pub unlocked: Vec<AchievementUnlock>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestOutcome {
    pub kind: PigKind,
    pub coins_earned: u64,
    /// Kill count of this kind before the harvest, i.e. the bonus baked into this pig.
    pub slaughter_bonus_applied: u64,
    pub ribbons: u32,
    pub tier_label: String,
    pub unlocked: Vec<AchievementUnlock>,
}
