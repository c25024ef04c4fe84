//! The progression engine: purchase gating, value accrual, ribbons and harvests.
use log::{debug, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::sync::Arc;

use crate::achievements;
use crate::catalog::{GameCatalog, PigKind};
use crate::constants::{LOG_TARGET_FARM, MAX_AUTO_CLICKERS, PERCENT_SCALE};
use crate::outcome::{
    AchievementUnlock, ClickOutcome, ClickSource, HarvestOutcome, Purchase, PurchaseOutcome,
    Rejection, RibbonAward, TickDirective,
};
use crate::pricing;
use crate::shop;
use crate::state::{CurrentPig, LiveState};

/// One farm session: the catalog, the live state and the injected random source.
#[derive(Debug, Clone)]
pub struct Farm<R = ChaCha20Rng> {
    catalog: Arc<GameCatalog>,
    state: LiveState,
    rng: R,
}

impl Farm<ChaCha20Rng> {
    /// Fresh farm with a deterministic `ChaCha20` stream.
    #[must_use]
    pub fn seeded(catalog: Arc<GameCatalog>, seed: u64) -> Self {
        Self::new(catalog, ChaCha20Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> Farm<R> {
    #[must_use]
    pub fn new(catalog: Arc<GameCatalog>, rng: R) -> Self {
        let state = LiveState::fresh(&catalog);
        Self {
            catalog,
            state,
            rng,
        }
    }

    /// Resume from a restored state, repairing fields that drifted outside their bounds.
    #[must_use]
    pub fn from_state(catalog: Arc<GameCatalog>, state: LiveState, rng: R) -> Self {
        let mut farm = Self {
            catalog,
            state,
            rng,
        };
        farm.sanitize();
        farm
    }

    fn sanitize(&mut self) {
        let ribbon = &self.catalog.ribbon;
        let chance = self
            .state
            .ribbon_chance_percent
            .clamp(ribbon.base_chance, ribbon.max_chance);
        if chance != self.state.ribbon_chance_percent {
            warn!(
                target: LOG_TARGET_FARM,
                "ribbon chance {}% out of range, clamped to {chance}%",
                self.state.ribbon_chance_percent
            );
            self.state.ribbon_chance_percent = chance;
        }

        if self.state.auto_clicker_count > MAX_AUTO_CLICKERS {
            warn!(
                target: LOG_TARGET_FARM,
                "auto-clicker count {} clamped to {MAX_AUTO_CLICKERS}",
                self.state.auto_clicker_count
            );
            self.state.auto_clicker_count = MAX_AUTO_CLICKERS;
        }

        let interval =
            pricing::auto_clicker_interval(&self.catalog, self.state.auto_clicker_upgrade_level);
        if interval != self.state.auto_clicker_interval_ms {
            debug!(
                target: LOG_TARGET_FARM,
                "auto-clicker interval {}ms recomputed as {interval}ms",
                self.state.auto_clicker_interval_ms
            );
            self.state.auto_clicker_interval_ms = interval;
        }

        for kind in PigKind::ALL {
            self.state.kill_count_by_type.entry(kind).or_insert(0);
        }
        for def in self.catalog.achievements() {
            self.state
                .achievement_unlocked
                .entry(def.id.clone())
                .or_insert(false);
        }
    }

    #[must_use]
    pub const fn state(&self) -> &LiveState {
        &self.state
    }

    #[must_use]
    pub fn catalog(&self) -> &GameCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn shared_catalog(&self) -> Arc<GameCatalog> {
        Arc::clone(&self.catalog)
    }

    /// Consume the farm, keeping only its state.
    #[must_use]
    pub fn into_state(self) -> LiveState {
        self.state
    }

    /// Current tick interval while the auto-clicker is owned.
    #[must_use]
    pub const fn tick_interval_ms(&self) -> Option<u64> {
        if self.state.owns_auto_clicker() {
            Some(self.state.auto_clicker_interval_ms)
        } else {
            None
        }
    }

    fn debit(&mut self, cost: u64) -> Result<(), Rejection> {
        let remaining =
            self.state
                .coins
                .checked_sub(cost)
                .ok_or(Rejection::InsufficientFunds {
                    needed: cost,
                    available: self.state.coins,
                })?;
        self.state.coins = remaining;
        Ok(())
    }

    /// Buy a pig into the empty slot.
    ///
    /// # Errors
    ///
    /// `SlotOccupied` while a pig is live (checked first), `InsufficientFunds` otherwise.
    pub fn buy_pig(&mut self, kind: PigKind) -> Result<PurchaseOutcome, Rejection> {
        if self.state.has_pig() {
            return Err(Rejection::SlotOccupied);
        }
        let cost = pricing::pig_cost(&self.catalog, kind);
        self.debit(cost)?;

        let start_value = pricing::pig_start_value(&self.catalog, &self.state, kind);
        self.state.pigs_raised += 1;
        self.state.current_pig = Some(CurrentPig::new(kind, start_value));
        debug!(target: LOG_TARGET_FARM, "bought {kind} pig for {cost} (starts at {start_value})");

        Ok(self.purchase_outcome(Purchase::Pig { kind, start_value }, cost, None))
    }

    /// Click the live pig, rolling for a ribbon.
    ///
    /// # Errors
    ///
    /// `NoActivePig` when the slot is empty.
    pub fn click_pig(&mut self, source: ClickSource) -> Result<ClickOutcome, Rejection> {
        let kind = self
            .state
            .current_pig
            .as_ref()
            .map(|pig| pig.kind)
            .ok_or(Rejection::NoActivePig)?;
        let delta = pricing::pig_click_value(&self.catalog, kind);

        if let Some(pig) = self.state.current_pig.as_mut() {
            pig.value = pig.value.saturating_add(delta);
        }
        self.state.total_clicks += 1;

        let roll = self.rng.r#gen::<f64>() * PERCENT_SCALE;
        let ribbon = if roll < f64::from(self.state.ribbon_chance_percent) {
            self.award_ribbon()
        } else {
            None
        };

        let pig_value = self.state.current_pig.as_ref().map_or(0, |pig| pig.value);
        let unlocked = self.evaluate_achievements();
        Ok(ClickOutcome {
            source,
            value_delta: delta,
            pig_value,
            total_clicks: self.state.total_clicks,
            ribbon,
            unlocked,
        })
    }

    fn award_ribbon(&mut self) -> Option<RibbonAward> {
        let pig = self.state.current_pig.as_mut()?;
        let bonus = pricing::ribbon_bonus(&self.catalog, pig.value);
        pig.ribbons += 1;
        pig.value = pig.value.saturating_add(bonus);
        let pig_ribbons = pig.ribbons;
        self.state.ribbons_won += 1;
        debug!(target: LOG_TARGET_FARM, "ribbon awarded, bonus {bonus}");
        Some(RibbonAward { bonus, pig_ribbons })
    }

    /// Tick callback for the auto-clicker. Does nothing unless owned and a pig is live.
    pub fn auto_tick(&mut self) -> Option<ClickOutcome> {
        if !self.state.owns_auto_clicker() {
            return None;
        }
        self.click_pig(ClickSource::Automatic).ok()
    }

    /// Harvest the live pig for coins.
    ///
    /// # Errors
    ///
    /// `NoActivePig` when the slot is empty.
    pub fn kill_pig(&mut self) -> Result<HarvestOutcome, Rejection> {
        let pig = self.state.current_pig.take().ok_or(Rejection::NoActivePig)?;
        let previous_kills = self.state.kills(pig.kind);

        self.state.coins = self.state.coins.saturating_add(pig.value);
        self.state.pigs_harvested += 1;
        self.state
            .kill_count_by_type
            .insert(pig.kind, previous_kills + 1);

        let tier_label = shop::harvest_tier(&self.catalog, pig.value).label.clone();
        debug!(
            target: LOG_TARGET_FARM,
            "harvested {} pig for {} (slaughter bonus {previous_kills})",
            pig.kind,
            pig.value
        );

        let unlocked = self.evaluate_achievements();
        Ok(HarvestOutcome {
            kind: pig.kind,
            coins_earned: pig.value,
            slaughter_bonus_applied: previous_kills,
            ribbons: pig.ribbons,
            tier_label,
            unlocked,
        })
    }

    /// Buy the single auto-clicker.
    ///
    /// # Errors
    ///
    /// `AlreadyOwned` if one is owned (checked first), `InsufficientFunds` otherwise.
    pub fn buy_auto_clicker(&mut self) -> Result<PurchaseOutcome, Rejection> {
        if self.state.auto_clicker_count >= MAX_AUTO_CLICKERS {
            return Err(Rejection::AlreadyOwned);
        }
        let cost = self.catalog.auto_clicker.base_cost;
        self.debit(cost)?;
        self.state.auto_clicker_count = MAX_AUTO_CLICKERS;
        let interval_ms = self.state.auto_clicker_interval_ms;
        debug!(target: LOG_TARGET_FARM, "auto-clicker bought, ticking every {interval_ms}ms");

        Ok(self.purchase_outcome(
            Purchase::AutoClicker,
            cost,
            Some(TickDirective::Restart { interval_ms }),
        ))
    }

    /// Speed up the owned auto-clicker by one level.
    ///
    /// # Errors
    ///
    /// `NotOwned` without an auto-clicker (checked first), `Maxed` once the level counter is
    /// exhausted, `InsufficientFunds` otherwise.
    pub fn upgrade_auto_clicker(&mut self) -> Result<PurchaseOutcome, Rejection> {
        if !self.state.owns_auto_clicker() {
            return Err(Rejection::NotOwned);
        }
        let current = self.state.auto_clicker_upgrade_level;
        let level = current.checked_add(1).ok_or(Rejection::Maxed)?;
        let cost = pricing::auto_clicker_upgrade_cost(&self.catalog, current);
        self.debit(cost)?;

        self.state.auto_clicker_upgrade_level = level;
        let interval_ms = pricing::auto_clicker_interval(&self.catalog, level);
        self.state.auto_clicker_interval_ms = interval_ms;
        debug!(target: LOG_TARGET_FARM, "auto-clicker level {level}, ticking every {interval_ms}ms");

        Ok(self.purchase_outcome(
            Purchase::AutoClickerUpgrade { level },
            cost,
            Some(TickDirective::Restart { interval_ms }),
        ))
    }

    /// Raise the ribbon chance by one percentage point.
    ///
    /// # Errors
    ///
    /// `Maxed` once the ladder is exhausted (checked first), `InsufficientFunds` otherwise.
    pub fn buy_ribbon_upgrade(&mut self) -> Result<PurchaseOutcome, Rejection> {
        let level = self
            .state
            .ribbon_level(self.catalog.ribbon.base_chance);
        let cost = pricing::ribbon_upgrade_cost(&self.catalog, level).ok_or(Rejection::Maxed)?;
        self.debit(cost)?;

        self.state.ribbon_chance_percent += 1;
        let chance_percent = self.state.ribbon_chance_percent;
        debug!(target: LOG_TARGET_FARM, "ribbon chance raised to {chance_percent}%");

        Ok(self.purchase_outcome(Purchase::RibbonUpgrade { chance_percent }, cost, None))
    }

    /// Flip the persisted music preference, returning the new muted flag.
    pub fn toggle_music(&mut self) -> bool {
        self.state.music_muted = !self.state.music_muted;
        self.state.music_muted
    }

    /// Unlock every newly satisfied achievement. Idempotent.
    pub fn evaluate_achievements(&mut self) -> Vec<AchievementUnlock> {
        achievements::evaluate(self.catalog.achievements(), &mut self.state)
    }

    fn purchase_outcome(
        &mut self,
        purchase: Purchase,
        cost: u64,
        tick: Option<TickDirective>,
    ) -> PurchaseOutcome {
        let unlocked = self.evaluate_achievements();
        PurchaseOutcome {
            purchase,
            cost,
            coins_left: self.state.coins,
            tick,
            unlocked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    fn catalog() -> Arc<GameCatalog> {
        GameCatalog::shared_static().unwrap()
    }

    /// Rolls ~99.99 on every draw, so no ribbon ever triggers.
    fn never_ribbon() -> StepRng {
        StepRng::new(u64::MAX, 0)
    }

    /// Rolls 0.0 on every draw, so every click wins a ribbon.
    fn always_ribbon() -> StepRng {
        StepRng::new(0, 0)
    }

    #[test]
    fn runt_lifecycle_scenario() {
        let mut farm = Farm::new(catalog(), never_ribbon());
        let bought = farm.buy_pig(PigKind::Runt).unwrap();
        assert_eq!(bought.cost, 0);
        assert_eq!(
            farm.state().current_pig,
            Some(CurrentPig {
                kind: PigKind::Runt,
                value: 1,
                ribbons: 0
            })
        );

        let click = farm.click_pig(ClickSource::Manual).unwrap();
        assert_eq!(click.value_delta, 1);
        assert_eq!(click.pig_value, 2);
        assert!(!click.ribbon_triggered());
        assert_eq!(farm.state().total_clicks, 1);
        assert_eq!(click.unlocked.len(), 1);
        assert_eq!(click.unlocked[0].id, "firstClick");

        let harvest = farm.kill_pig().unwrap();
        assert_eq!(harvest.coins_earned, 2);
        assert_eq!(harvest.slaughter_bonus_applied, 0);
        assert_eq!(farm.state().coins, 2);
        assert_eq!(farm.state().pigs_harvested, 1);
        assert_eq!(farm.state().kills(PigKind::Runt), 1);
        assert!(farm.state().current_pig.is_none());
        assert_eq!(harvest.unlocked[0].id, "firstHarvest");
    }

    #[test]
    fn slaughter_bonus_raises_next_start_value() {
        let mut farm = Farm::new(catalog(), never_ribbon());
        farm.buy_pig(PigKind::Runt).unwrap();
        farm.kill_pig().unwrap();
        let again = farm.buy_pig(PigKind::Runt).unwrap();
        assert_eq!(
            again.purchase,
            Purchase::Pig {
                kind: PigKind::Runt,
                start_value: 2
            }
        );
        let harvest = farm.kill_pig().unwrap();
        assert_eq!(harvest.slaughter_bonus_applied, 1);
        assert_eq!(farm.state().kills(PigKind::Runt), 2);
    }

    #[test]
    fn occupied_slot_wins_over_funds() {
        let mut farm = Farm::new(catalog(), never_ribbon());
        farm.buy_pig(PigKind::Runt).unwrap();
        assert_eq!(farm.buy_pig(PigKind::Legendary), Err(Rejection::SlotOccupied));
        assert_eq!(farm.buy_pig(PigKind::Runt), Err(Rejection::SlotOccupied));
        assert_eq!(farm.state().pigs_raised, 1);
    }

    #[test]
    fn unaffordable_pig_leaves_state_untouched() {
        let mut farm = Farm::new(catalog(), never_ribbon());
        let before = farm.state().clone();
        assert_eq!(
            farm.buy_pig(PigKind::Piglet),
            Err(Rejection::InsufficientFunds {
                needed: 25,
                available: 0
            })
        );
        assert_eq!(farm.state(), &before);
    }

    #[test]
    fn empty_slot_rejects_click_and_harvest() {
        let mut farm = Farm::new(catalog(), never_ribbon());
        assert_eq!(
            farm.click_pig(ClickSource::Manual),
            Err(Rejection::NoActivePig)
        );
        assert_eq!(farm.kill_pig(), Err(Rejection::NoActivePig));
        assert_eq!(farm.state().total_clicks, 0);
    }

    #[test]
    fn ribbon_adds_quarter_of_value() {
        let mut farm = Farm::new(catalog(), always_ribbon());
        let mut state = farm.state().clone();
        state.current_pig = Some(CurrentPig::new(PigKind::Farm, 97));
        farm = Farm::from_state(farm.shared_catalog(), state, always_ribbon());

        let click = farm.click_pig(ClickSource::Automatic).unwrap();
        let ribbon = click.ribbon.unwrap();
        assert_eq!(ribbon.bonus, 25);
        assert_eq!(ribbon.pig_ribbons, 1);
        assert_eq!(click.pig_value, 125);
        assert_eq!(farm.state().ribbons_won, 1);
        assert!(click.unlocked.iter().any(|u| u.id == "firstRibbon"));
    }

    #[test]
    fn ribbon_upgrade_scenario() {
        let mut farm = Farm::new(catalog(), never_ribbon());
        let mut state = farm.state().clone();
        state.coins = 100;
        farm = Farm::from_state(farm.shared_catalog(), state, never_ribbon());

        let outcome = farm.buy_ribbon_upgrade().unwrap();
        assert_eq!(outcome.cost, 100);
        assert_eq!(outcome.coins_left, 0);
        assert_eq!(farm.state().ribbon_chance_percent, 2);
        assert_eq!(
            farm.buy_ribbon_upgrade(),
            Err(Rejection::InsufficientFunds {
                needed: 250,
                available: 0
            })
        );
    }

    #[test]
    fn ribbon_upgrade_maxes_at_ten_percent() {
        let mut farm = Farm::new(catalog(), never_ribbon());
        let mut state = farm.state().clone();
        state.coins = 1_000_000;
        farm = Farm::from_state(farm.shared_catalog(), state, never_ribbon());
        for expected in 2..=10 {
            farm.buy_ribbon_upgrade().unwrap();
            assert_eq!(farm.state().ribbon_chance_percent, expected);
        }
        let coins = farm.state().coins;
        assert_eq!(farm.buy_ribbon_upgrade(), Err(Rejection::Maxed));
        assert_eq!(farm.state().ribbon_chance_percent, 10);
        assert_eq!(farm.state().coins, coins);
    }

    #[test]
    fn auto_clicker_purchase_and_upgrade_scenario() {
        let mut farm = Farm::new(catalog(), never_ribbon());
        assert_eq!(farm.upgrade_auto_clicker(), Err(Rejection::NotOwned));
        assert_eq!(
            farm.buy_auto_clicker(),
            Err(Rejection::InsufficientFunds {
                needed: 25,
                available: 0
            })
        );

        let mut state = farm.state().clone();
        state.coins = 125;
        farm = Farm::from_state(farm.shared_catalog(), state, never_ribbon());

        let bought = farm.buy_auto_clicker().unwrap();
        assert_eq!(
            bought.tick,
            Some(TickDirective::Restart { interval_ms: 2_000 })
        );
        assert_eq!(bought.unlocked[0].id, "automation");
        assert_eq!(farm.tick_interval_ms(), Some(2_000));
        assert_eq!(farm.buy_auto_clicker(), Err(Rejection::AlreadyOwned));

        let upgraded = farm.upgrade_auto_clicker().unwrap();
        assert_eq!(upgraded.cost, 100);
        assert_eq!(upgraded.purchase, Purchase::AutoClickerUpgrade { level: 1 });
        assert_eq!(
            upgraded.tick,
            Some(TickDirective::Restart { interval_ms: 1_600 })
        );
        assert_eq!(farm.state().auto_clicker_interval_ms, 1_600);
        assert_eq!(farm.state().coins, 0);
    }

    #[test]
    fn auto_tick_requires_owner_and_pig() {
        let mut farm = Farm::new(catalog(), never_ribbon());
        farm.buy_pig(PigKind::Runt).unwrap();
        assert!(farm.auto_tick().is_none());
        assert_eq!(farm.state().total_clicks, 0);

        let mut state = farm.state().clone();
        state.auto_clicker_count = 1;
        farm = Farm::from_state(farm.shared_catalog(), state, never_ribbon());
        let click = farm.auto_tick().unwrap();
        assert_eq!(click.source, ClickSource::Automatic);
        assert_eq!(click.pig_value, 2);

        farm.kill_pig().unwrap();
        assert!(farm.auto_tick().is_none());
    }

    #[test]
    fn legendary_achievement_needs_live_legendary() {
        let mut farm = Farm::new(catalog(), never_ribbon());
        let mut state = farm.state().clone();
        state.coins = 75_000;
        farm = Farm::from_state(farm.shared_catalog(), state, never_ribbon());
        let outcome = farm.buy_pig(PigKind::Legendary).unwrap();
        assert!(outcome.unlocked.iter().any(|u| u.id == "legendaryFarmer"));
        assert!(farm.evaluate_achievements().is_empty());
    }

    #[test]
    fn huge_restored_upgrade_level_is_never_free() {
        let catalog = catalog();
        let mut state = LiveState::fresh(&catalog);
        state.auto_clicker_count = 1;
        state.auto_clicker_upgrade_level = 2_000;
        let mut farm = Farm::from_state(catalog, state, never_ribbon());
        assert_eq!(farm.state().auto_clicker_interval_ms, 200);
        assert_eq!(
            farm.upgrade_auto_clicker(),
            Err(Rejection::InsufficientFunds {
                needed: u64::MAX,
                available: 0
            })
        );
        assert_eq!(farm.state().auto_clicker_upgrade_level, 2_000);
    }

    #[test]
    fn exhausted_upgrade_level_is_maxed() {
        let catalog = catalog();
        let mut state = LiveState::fresh(&catalog);
        state.coins = u64::MAX;
        state.auto_clicker_count = 1;
        state.auto_clicker_upgrade_level = u32::MAX;
        let mut farm = Farm::from_state(catalog, state, never_ribbon());
        assert_eq!(farm.upgrade_auto_clicker(), Err(Rejection::Maxed));
        assert_eq!(farm.state().auto_clicker_upgrade_level, u32::MAX);
        assert_eq!(farm.state().coins, u64::MAX);
        assert_eq!(crate::shop::listing(&farm).len(), 10);
    }

    #[test]
    fn restore_clamps_out_of_range_fields() {
        let catalog = catalog();
        let mut state = LiveState::fresh(&catalog);
        state.ribbon_chance_percent = 42;
        state.auto_clicker_count = 3;
        state.auto_clicker_upgrade_level = 1;
        state.auto_clicker_interval_ms = 9;
        state.kill_count_by_type.clear();
        let farm = Farm::from_state(catalog, state, never_ribbon());
        assert_eq!(farm.state().ribbon_chance_percent, 10);
        assert_eq!(farm.state().auto_clicker_count, 1);
        assert_eq!(farm.state().auto_clicker_interval_ms, 1_600);
        assert_eq!(farm.state().kill_count_by_type.len(), 7);
    }

    #[test]
    fn seeded_farms_are_reproducible() {
        let run = |seed| {
            let mut farm = Farm::seeded(catalog(), seed);
            farm.buy_pig(PigKind::Runt).unwrap();
            (0..500)
                .filter_map(|_| farm.click_pig(ClickSource::Manual).ok())
                .filter(ClickOutcome::ribbon_triggered)
                .count()
        };
        assert_eq!(run(7), run(7));
    }

    #[test]
    fn music_toggle_flips_preference() {
        let mut farm = Farm::new(catalog(), never_ribbon());
        assert!(farm.toggle_music());
        assert!(farm.state().music_muted);
        assert!(!farm.toggle_music());
    }
}
