//! Deterministic virtual-time sessions driven by a player policy.
use log::{debug, info};
use serde::Serialize;
use std::time::Instant;

use pigfarm_game::{
    AutoClickerTimer, CatalogLoader, ClickOutcome, ClickSource, Farm, FarmStorage, GameEngine,
    ManualScheduler, TickScheduler,
};

use crate::invariants::InvariantChecker;
use crate::strategy::{Performed, PlayerPolicy, Strategy, perform};
use crate::util::session_key;

/// Upper bound on policy actions taken between two manual clicks.
const MAX_ACTIONS_PER_DECISION: usize = 8;
/// Timers the simulation always runs besides the auto-clicker: manual clicks and autosave.
const HOST_TIMERS: usize = 2;

#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    pub virtual_ms: u64,
    pub click_interval_ms: u64,
    pub step_ms: u64,
}

impl SimulationConfig {
    pub fn from_minutes(minutes: u64) -> Self {
        Self {
            virtual_ms: minutes.saturating_mul(60_000),
            ..Self::default()
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            virtual_ms: 10 * 60_000,
            click_interval_ms: 250,
            step_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub strategy: String,
    pub seed: u64,
    pub virtual_ms: u64,
    pub coins: u64,
    pub pigs_raised: u64,
    pub pigs_harvested: u64,
    pub total_clicks: u64,
    pub manual_clicks: u64,
    pub auto_clicks: u64,
    pub ribbons_won: u64,
    pub ribbon_chance_percent: u32,
    pub auto_clicker_level: u32,
    pub auto_clicker_interval_ms: Option<u64>,
    pub achievements: Vec<String>,
    pub rejections: u64,
    pub saves: u64,
    pub failures: Vec<String>,
    pub passed: bool,
    pub wall_time_ms: u64,
}

#[derive(Debug, Default)]
struct Tally {
    manual_clicks: u64,
    auto_clicks: u64,
    rejections: u64,
    saves: u64,
    achievements: Vec<String>,
}

impl Tally {
    fn record_click(&mut self, click: &ClickOutcome) {
        match click.source {
            ClickSource::Manual => self.manual_clicks += 1,
            ClickSource::Automatic => self.auto_clicks += 1,
        }
        self.achievements
            .extend(click.unlocked.iter().map(|u| u.id.clone()));
    }
}

/// Play one (strategy, seed) session on a virtual clock.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded.
pub fn run_simulation<L, S>(
    engine: &GameEngine<L, S>,
    strategy: Strategy,
    seed: u64,
    config: &SimulationConfig,
) -> Result<SimulationReport, L::Error>
where
    L: CatalogLoader,
    S: FarmStorage,
{
    let started = Instant::now();
    let key = session_key(strategy.key(), seed);
    let mut farm = engine.new_farm(seed)?;
    let mut policy = strategy.create_policy();
    let mut timer = AutoClickerTimer::new(ManualScheduler::new());
    let click_timer = timer
        .scheduler_mut()
        .schedule_every(config.click_interval_ms);
    let save_timer = timer
        .scheduler_mut()
        .schedule_every(farm.catalog().timing.save_interval_ms);

    let mut checker = InvariantChecker::new(farm.state());
    let mut tally = Tally::default();

    while timer.scheduler().now_ms() < config.virtual_ms {
        let step = config
            .step_ms
            .min(config.virtual_ms - timer.scheduler().now_ms());
        for id in timer.scheduler_mut().advance(step) {
            let now = timer.scheduler().now_ms();
            if id == click_timer {
                let mut session = Session {
                    engine,
                    key: &key,
                    timer: &mut timer,
                    checker: &mut checker,
                    tally: &mut tally,
                };
                session.decide(&mut farm, policy.as_mut(), now);
                if let Ok(click) = farm.click_pig(ClickSource::Manual) {
                    tally.record_click(&click);
                }
            } else if id == save_timer {
                autosave_and_verify(engine, &key, &farm, &mut checker, &mut tally, now);
            } else if Some(id) == timer.timer_id() {
                if let Some(click) = farm.auto_tick() {
                    tally.record_click(&click);
                }
            } else {
                debug!("dropping tick from cancelled timer {id:?}");
                continue;
            }
            let sources = timer.scheduler().active_count().saturating_sub(HOST_TIMERS);
            checker.observe(now, farm.state(), farm.catalog(), sources);
        }
    }

    if engine.autosave(&key, &farm) {
        tally.saves += 1;
    }

    let state = farm.state();
    let failures = checker.into_failures();
    let report = SimulationReport {
        strategy: strategy.key().to_string(),
        seed,
        virtual_ms: config.virtual_ms,
        coins: state.coins,
        pigs_raised: state.pigs_raised,
        pigs_harvested: state.pigs_harvested,
        total_clicks: state.total_clicks,
        manual_clicks: tally.manual_clicks,
        auto_clicks: tally.auto_clicks,
        ribbons_won: state.ribbons_won,
        ribbon_chance_percent: state.ribbon_chance_percent,
        auto_clicker_level: state.auto_clicker_upgrade_level,
        auto_clicker_interval_ms: farm.tick_interval_ms(),
        achievements: tally.achievements,
        rejections: tally.rejections,
        saves: tally.saves,
        passed: failures.is_empty(),
        failures,
        wall_time_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    };
    info!(
        "{} seed {}: {} coins, {} harvests, {} failures",
        report.strategy,
        seed,
        report.coins,
        report.pigs_harvested,
        report.failures.len()
    );
    Ok(report)
}

/// Borrowed host context for one round of policy decisions.
struct Session<'a, L: CatalogLoader, S: FarmStorage, T: TickScheduler> {
    engine: &'a GameEngine<L, S>,
    key: &'a str,
    timer: &'a mut AutoClickerTimer<T>,
    checker: &'a mut InvariantChecker,
    tally: &'a mut Tally,
}

impl<L, S, T> Session<'_, L, S, T>
where
    L: CatalogLoader,
    S: FarmStorage,
    T: TickScheduler,
{
    /// Let the policy act, saving after every accepted operation.
    fn decide(&mut self, farm: &mut Farm, policy: &mut (dyn PlayerPolicy + Send), now: u64) {
        for _ in 0..MAX_ACTIONS_PER_DECISION {
            let Some(action) = policy.next_action(farm.state(), farm.catalog()) else {
                break;
            };
            match perform(farm, action) {
                Ok(performed) => {
                    debug!("t={now}ms {} performed {action:?}", policy.name());
                    self.checker.credit(performed.coin_delta());
                    self.tally
                        .achievements
                        .extend(performed.unlocked_ids().map(str::to_string));
                    if let Performed::Purchase(purchase) = &performed
                        && let Some(directive) = purchase.tick
                    {
                        self.timer.apply(directive);
                    }
                    if self.engine.autosave(self.key, farm) {
                        self.tally.saves += 1;
                    }
                }
                Err(rejection) => {
                    debug!("t={now}ms {} rejected {action:?}: {rejection}", policy.name());
                    self.tally.rejections += 1;
                    break;
                }
            }
        }
    }
}

fn autosave_and_verify<L, S>(
    engine: &GameEngine<L, S>,
    key: &str,
    farm: &Farm,
    checker: &mut InvariantChecker,
    tally: &mut Tally,
    now: u64,
) where
    L: CatalogLoader,
    S: FarmStorage,
{
    if !engine.autosave(key, farm) {
        return;
    }
    tally.saves += 1;
    match engine.load_farm(key, 0) {
        Ok(restored) if restored.state() == farm.state() => {}
        Ok(_) => checker.record(format!(
            "t={now}ms: snapshot did not restore the saved state"
        )),
        Err(err) => checker.record(format!("t={now}ms: catalog reload failed: {err}")),
    }
}
