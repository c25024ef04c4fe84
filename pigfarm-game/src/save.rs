//! Snapshot encoding and tolerant decoding of persisted farm state.
use log::warn;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::catalog::{GameCatalog, PigKind};
use crate::constants::LOG_TARGET_SAVE;
use crate::numbers::floor_f64_to_u64;
use crate::state::{CurrentPig, LiveState};

type Object = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("failed to encode snapshot: {0}")]
    Encode(String),
    #[error("snapshot is not valid JSON: {0}")]
    Corrupt(String),
    #[error("snapshot is not a JSON object")]
    NotAnObject,
}

/// Serialize the live state with its camelCase keys.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode(state: &LiveState) -> Result<String, SnapshotError> {
    serde_json::to_string(state).map_err(|err| SnapshotError::Encode(err.to_string()))
}

/// Decode a snapshot, falling back to defaults key by key.
///
/// Older saves used `ribbonChance`, `autoClickers`, `autoClickerUpgrades`,
/// `autoClickerSpeed` and `pigKills`; those are read when the current key is absent.
///
/// # Errors
///
/// Only when the text is not JSON or not a JSON object.
pub fn decode(text: &str, catalog: &GameCatalog) -> Result<LiveState, SnapshotError> {
    let value: Value =
        serde_json::from_str(text).map_err(|err| SnapshotError::Corrupt(err.to_string()))?;
    let Value::Object(obj) = value else {
        return Err(SnapshotError::NotAnObject);
    };

    let mut state = LiveState::fresh(catalog);
    if let Some(coins) = count(&obj, &["coins"]) {
        state.coins = coins;
    }
    if let Some(raised) = count(&obj, &["pigsRaised"]) {
        state.pigs_raised = raised;
    }
    if let Some(harvested) = count(&obj, &["pigsHarvested"]) {
        state.pigs_harvested = harvested;
    }
    if let Some(clicks) = count(&obj, &["totalClicks"]) {
        state.total_clicks = clicks;
    }
    if let Some(ribbons) = count(&obj, &["ribbonsWon"]) {
        state.ribbons_won = ribbons;
    }
    if let Some(chance) = small(&obj, &["ribbonChancePercent", "ribbonChance"]) {
        state.ribbon_chance_percent = chance;
    }
    if let Some(count) = small(&obj, &["autoClickerCount", "autoClickers"]) {
        state.auto_clicker_count = count;
    }
    if let Some(level) = small(&obj, &["autoClickerUpgradeLevel", "autoClickerUpgrades"]) {
        state.auto_clicker_upgrade_level = level;
    }
    if let Some(interval) = count(&obj, &["autoClickerIntervalMs", "autoClickerSpeed"]) {
        state.auto_clicker_interval_ms = interval;
    }
    if let Some(muted) = typed::<bool>(&obj, &["musicMuted"]) {
        state.music_muted = muted;
    }

    state.current_pig = current_pig(&obj);
    read_kill_counts(&obj, &mut state);
    read_unlocks(&obj, catalog, &mut state);
    Ok(state)
}

fn lookup<'a>(obj: &'a Object, keys: &[&'static str]) -> Option<(&'static str, &'a Value)> {
    keys.iter()
        .find_map(|key| obj.get(*key).map(|value| (*key, value)))
}

fn typed<T: DeserializeOwned>(obj: &Object, keys: &[&'static str]) -> Option<T> {
    let (key, value) = lookup(obj, keys)?;
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            warn!(target: LOG_TARGET_SAVE, "ignoring malformed `{key}`: {err}");
            None
        }
    }
}

/// Non-negative number; fractional values are floored.
fn number(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(floor_f64_to_u64)),
        _ => None,
    }
}

fn count(obj: &Object, keys: &[&'static str]) -> Option<u64> {
    let (key, value) = lookup(obj, keys)?;
    let parsed = number(value);
    if parsed.is_none() {
        warn!(target: LOG_TARGET_SAVE, "ignoring malformed `{key}`: {value}");
    }
    parsed
}

fn small(obj: &Object, keys: &[&'static str]) -> Option<u32> {
    count(obj, keys).map(|n| u32::try_from(n).unwrap_or(u32::MAX))
}

fn current_pig(obj: &Object) -> Option<CurrentPig> {
    let (_, value) = lookup(obj, &["currentPig"])?;
    let pig = match value {
        Value::Null => return None,
        Value::Object(pig) => pig,
        other => {
            warn!(target: LOG_TARGET_SAVE, "ignoring malformed `currentPig`: {other}");
            return None;
        }
    };

    let kind = pig
        .get("type")
        .and_then(Value::as_str)
        .and_then(|raw| raw.parse::<PigKind>().ok());
    let value = pig.get("value").and_then(number);
    let (Some(kind), Some(value)) = (kind, value) else {
        warn!(target: LOG_TARGET_SAVE, "dropping unreadable current pig");
        return None;
    };
    let ribbons = pig
        .get("ribbons")
        .and_then(number)
        .map_or(0, |n| u32::try_from(n).unwrap_or(u32::MAX));
    Some(CurrentPig {
        kind,
        value,
        ribbons,
    })
}

fn read_kill_counts(obj: &Object, state: &mut LiveState) {
    let Some((key, value)) = lookup(obj, &["killCountByType", "pigKills"]) else {
        return;
    };
    let Value::Object(entries) = value else {
        warn!(target: LOG_TARGET_SAVE, "ignoring malformed `{key}`");
        return;
    };
    for (raw_kind, raw_count) in entries {
        let Ok(kind) = raw_kind.parse::<PigKind>() else {
            warn!(target: LOG_TARGET_SAVE, "dropping kills for unknown pig `{raw_kind}`");
            continue;
        };
        match number(raw_count) {
            Some(kills) => {
                state.kill_count_by_type.insert(kind, kills);
            }
            None => warn!(target: LOG_TARGET_SAVE, "ignoring malformed kill count for {kind}"),
        }
    }
}

fn read_unlocks(obj: &Object, catalog: &GameCatalog, state: &mut LiveState) {
    let Some((_, value)) = lookup(obj, &["achievementUnlocked"]) else {
        return;
    };
    let Value::Object(entries) = value else {
        warn!(target: LOG_TARGET_SAVE, "ignoring malformed `achievementUnlocked`");
        return;
    };
    for (id, flag) in entries {
        if catalog.achievement(id).is_none() {
            continue;
        }
        if let Some(unlocked) = flag.as_bool() {
            state.achievement_unlocked.insert(id.clone(), unlocked);
        }
    }
}
