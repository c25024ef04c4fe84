use std::cell::RefCell;
use std::collections::HashMap;
use std::convert::Infallible;

use pigfarm_game::{
    ClickSource, DEFAULT_SAVE_KEY, FarmStorage, GameEngine, PigKind, StaticCatalog, decode,
    encode,
};
use serde_json::{Value, json};

#[derive(Default)]
struct MapStorage {
    saves: RefCell<HashMap<String, String>>,
}

impl FarmStorage for MapStorage {
    type Error = Infallible;

    fn write_snapshot(&self, key: &str, snapshot: &str) -> Result<(), Self::Error> {
        self.saves
            .borrow_mut()
            .insert(key.to_string(), snapshot.to_string());
        Ok(())
    }

    fn read_snapshot(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.saves.borrow().get(key).cloned())
    }

    fn delete_snapshot(&self, key: &str) -> Result<(), Self::Error> {
        self.saves.borrow_mut().remove(key);
        Ok(())
    }
}

#[test]
fn session_survives_a_restart() {
    let engine = GameEngine::new(StaticCatalog, MapStorage::default());
    let mut farm = engine.new_farm(11).unwrap();
    for _ in 0..3 {
        farm.buy_pig(PigKind::Runt).unwrap();
        for _ in 0..40 {
            farm.click_pig(ClickSource::Manual).unwrap();
        }
        farm.kill_pig().unwrap();
    }
    farm.buy_auto_clicker().unwrap();
    farm.toggle_music();
    assert!(engine.autosave(DEFAULT_SAVE_KEY, &farm));

    let restored = engine.load_farm(DEFAULT_SAVE_KEY, 12).unwrap();
    assert_eq!(restored.state(), farm.state());
    assert_eq!(restored.tick_interval_ms(), Some(2_000));
    assert!(restored.state().music_muted);
    assert_eq!(restored.state().kills(PigKind::Runt), 3);
}

#[test]
fn legacy_browser_save_loads_and_is_sanitized() {
    let storage = MapStorage::default();
    let legacy = json!({
        "coins": 1234,
        "pigsRaised": 9,
        "pigsHarvested": 8,
        "totalClicks": 400,
        "ribbonsWon": 3,
        "ribbonChance": 14,
        "currentPig": {"type": "farm", "value": 57, "ribbons": 1},
        "autoClickers": 2,
        "autoClickerUpgrades": 2,
        "autoClickerSpeed": 5,
        "pigKills": {"runt": 5, "piglet": 3},
        "musicMuted": true
    });
    storage
        .write_snapshot(DEFAULT_SAVE_KEY, &legacy.to_string())
        .unwrap();

    let engine = GameEngine::new(StaticCatalog, storage);
    let farm = engine.load_farm(DEFAULT_SAVE_KEY, 1).unwrap();
    let state = farm.state();
    assert_eq!(state.coins, 1_234);
    assert_eq!(state.ribbon_chance_percent, 10);
    assert_eq!(state.auto_clicker_count, 1);
    assert_eq!(state.auto_clicker_interval_ms, 1_280);
    assert_eq!(state.kills(PigKind::Piglet), 3);
    assert_eq!(state.kills(PigKind::Royal), 0);
    assert_eq!(state.current_pig.as_ref().map(|p| p.value), Some(57));
    assert_eq!(state.unlocked_count(), 0);
}

#[test]
fn saved_snapshot_uses_current_key_names() {
    let engine = GameEngine::new(StaticCatalog, MapStorage::default());
    let mut farm = engine.new_farm(3).unwrap();
    farm.buy_pig(PigKind::Runt).unwrap();
    engine.save_farm("slot", &farm).unwrap();

    let text = engine.storage().read_snapshot("slot").unwrap().unwrap();
    let value: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["currentPig"]["type"], "runt");
    assert_eq!(value["ribbonChancePercent"], 1);
    assert!(value.get("ribbonChance").is_none());
    assert!(value.get("pigKills").is_none());
}

#[test]
fn encode_decode_is_lossless_for_a_played_state() {
    let engine = GameEngine::new(StaticCatalog, MapStorage::default());
    let mut farm = engine.new_farm(21).unwrap();
    farm.buy_pig(PigKind::Runt).unwrap();
    for _ in 0..10 {
        farm.click_pig(ClickSource::Manual).unwrap();
    }
    let text = encode(farm.state()).unwrap();
    let decoded = decode(&text, farm.catalog()).unwrap();
    assert_eq!(&decoded, farm.state());
}
