//! Achievement evaluation against the live state.
use log::info;

use crate::catalog::{AchievementDef, Requirement};
use crate::constants::LOG_TARGET_ACHIEVEMENTS;
use crate::outcome::AchievementUnlock;
use crate::state::LiveState;

/// Whether a requirement holds for the given state.
///
/// `PigType` is instantaneous: it only holds while a pig of that kind is live.
#[must_use]
pub fn requirement_met(requirement: &Requirement, state: &LiveState) -> bool {
    let (current, target) = progress(requirement, state);
    current >= target
}

/// Progress toward a requirement as `(current, target)`.
#[must_use]
pub fn progress(requirement: &Requirement, state: &LiveState) -> (u64, u64) {
    match requirement {
        Requirement::Clicks { value } => (state.total_clicks, *value),
        Requirement::Harvested { value } => (state.pigs_harvested, *value),
        Requirement::Ribbons { value } => (state.ribbons_won, *value),
        Requirement::Coins { value } => (state.coins, *value),
        Requirement::AutoClickers { value } => {
            (u64::from(state.auto_clicker_count), u64::from(*value))
        }
        Requirement::AutoClickerUpgrades { value } => (
            u64::from(state.auto_clicker_upgrade_level),
            u64::from(*value),
        ),
        Requirement::PigKills { subtype, value } => (state.kills(*subtype), *value),
        Requirement::PigType { value } => {
            let owned = state
                .current_pig
                .as_ref()
                .is_some_and(|pig| pig.kind == *value);
            (u64::from(owned), 1)
        }
    }
}

/// Mark every newly satisfied achievement as unlocked, returning them in catalog order.
///
/// Unlocks are one-way; running this twice without a state change yields nothing new.
pub fn evaluate(catalog: &[AchievementDef], state: &mut LiveState) -> Vec<AchievementUnlock> {
    let mut unlocked = Vec::new();
    for def in catalog {
        if state.is_unlocked(&def.id) || !requirement_met(&def.requirement, state) {
            continue;
        }
        state.achievement_unlocked.insert(def.id.clone(), true);
        info!(target: LOG_TARGET_ACHIEVEMENTS, "achievement unlocked: {}", def.id);
        unlocked.push(AchievementUnlock::from(def));
    }
    unlocked
}
