use std::sync::Arc;

use pigfarm_game::{
    AutoClickerTimer, ClickSource, CurrentPig, Farm, GameCatalog, LiveState, ManualScheduler,
    PigKind, Purchase, Rejection, TickDirective, pricing,
};
use rand::rngs::mock::StepRng;

fn catalog() -> Arc<GameCatalog> {
    GameCatalog::shared_static().unwrap()
}

fn no_ribbons() -> StepRng {
    StepRng::new(u64::MAX, 0)
}

fn rich_farm(coins: u64) -> Farm<StepRng> {
    let catalog = catalog();
    let mut state = LiveState::fresh(&catalog);
    state.coins = coins;
    Farm::from_state(catalog, state, no_ribbons())
}

#[test]
fn every_kind_gains_one_start_value_per_harvest() {
    let mut farm = rich_farm(1_000_000);
    for kind in PigKind::ALL {
        let base = farm.catalog().pig_type(kind).base_start_value;
        farm.buy_pig(kind).unwrap();
        farm.kill_pig().unwrap();
        assert_eq!(farm.state().kills(kind), 1, "{kind}");

        let again = farm.buy_pig(kind).unwrap();
        assert_eq!(
            again.purchase,
            Purchase::Pig {
                kind,
                start_value: base + 1
            },
            "{kind}"
        );
        farm.kill_pig().unwrap();
    }
}

#[test]
fn slot_occupied_regardless_of_funds() {
    for coins in [0, 24, 1_000_000] {
        let mut farm = rich_farm(coins);
        farm.buy_pig(PigKind::Runt).unwrap();
        for kind in PigKind::ALL {
            assert_eq!(farm.buy_pig(kind), Err(Rejection::SlotOccupied));
        }
    }
}

#[test]
fn coins_only_move_by_reported_amounts() {
    let mut farm = Farm::seeded(catalog(), 99);
    let mut expected = farm.state().coins;
    for round in 0..200_u32 {
        if farm.state().current_pig.is_none() {
            let kind = if farm.state().coins >= 25 && round % 3 == 0 {
                PigKind::Piglet
            } else {
                PigKind::Runt
            };
            let bought = farm.buy_pig(kind).unwrap();
            expected -= bought.cost;
        }
        for _ in 0..5 {
            farm.click_pig(ClickSource::Manual).unwrap();
        }
        if round % 4 == 3 {
            expected += farm.kill_pig().unwrap().coins_earned;
        }
        if let Ok(upgrade) = farm.buy_ribbon_upgrade() {
            expected -= upgrade.cost;
        }
        assert_eq!(farm.state().coins, expected);
    }
}

#[test]
fn ribbon_chance_climbs_to_ten_then_maxes() {
    let mut farm = rich_farm(100_000);
    let mut last = farm.state().ribbon_chance_percent;
    loop {
        match farm.buy_ribbon_upgrade() {
            Ok(_) => {
                let chance = farm.state().ribbon_chance_percent;
                assert_eq!(chance, last + 1);
                last = chance;
            }
            Err(rejection) => {
                assert_eq!(rejection, Rejection::Maxed);
                break;
            }
        }
    }
    assert_eq!(last, 10);
    assert_eq!(farm.state().ribbon_level(1), 9);
}

#[test]
fn ribbon_on_pig_worth_one_hundred() {
    let catalog = catalog();
    let mut state = LiveState::fresh(&catalog);
    // One diamond click brings the pig to exactly 100.
    state.current_pig = Some(CurrentPig::new(PigKind::Diamond, 80));
    let mut farm = Farm::from_state(catalog, state, StepRng::new(0, 0));
    let click = farm.click_pig(ClickSource::Manual).unwrap();
    let award = click.ribbon.unwrap();
    assert_eq!(award.bonus, 25);
    assert_eq!(click.pig_value, 125);
    assert_eq!(farm.state().ribbons_won, 1);
    assert_eq!(farm.state().current_pig.as_ref().unwrap().ribbons, 1);
}

#[test]
fn auto_clicker_ticks_follow_upgrades() {
    let mut farm = rich_farm(125);
    let mut timer = AutoClickerTimer::new(ManualScheduler::new());

    let bought = farm.buy_auto_clicker().unwrap();
    timer.apply(bought.tick.unwrap());
    farm.buy_pig(PigKind::Runt).unwrap();

    let ticks = timer.scheduler_mut().advance(4_000);
    for _ in &ticks {
        farm.auto_tick().unwrap();
    }
    assert_eq!(ticks.len(), 2);
    assert_eq!(farm.state().total_clicks, 2);

    let upgraded = farm.upgrade_auto_clicker().unwrap();
    assert_eq!(
        upgraded.tick,
        Some(TickDirective::Restart { interval_ms: 1_600 })
    );
    timer.apply(upgraded.tick.unwrap());
    assert_eq!(timer.scheduler().active_count(), 1);

    let ticks = timer.scheduler_mut().advance(3_200);
    assert_eq!(ticks.len(), 2);
    assert_eq!(
        pricing::auto_clicker_upgrade_cost(farm.catalog(), 1),
        150
    );
}

#[test]
fn evaluator_is_idempotent_across_a_session() {
    let mut farm = Farm::seeded(catalog(), 5);
    farm.buy_pig(PigKind::Runt).unwrap();
    for _ in 0..120 {
        farm.click_pig(ClickSource::Manual).unwrap();
    }
    farm.kill_pig().unwrap();
    let unlocked = farm.state().unlocked_count();
    assert!(unlocked >= 3);
    assert!(farm.evaluate_achievements().is_empty());
    assert_eq!(farm.state().unlocked_count(), unlocked);
}
