//! Real-time session: one actor task owns the farm and serializes every mutation.
use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, Instant, MissedTickBehavior};

use pigfarm_game::{
    AutoClickerTimer, CatalogLoader, ClickOutcome, ClickSource, Farm, FarmStorage, GameEngine,
    TickScheduler, TimerId,
};

use crate::strategy::{Performed, PlayerPolicy, Strategy, perform};

const MAILBOX_CAPACITY: usize = 64;
const MAX_ACTIONS_PER_DECISION: usize = 8;

#[derive(Debug)]
pub enum Command {
    ManualClick,
    Tick(TimerId),
    Autosave,
    Shutdown(oneshot::Sender<LiveReport>),
}

#[derive(Debug, Clone)]
pub struct LiveConfig {
    pub duration: Duration,
    pub click_interval: Duration,
    /// Overrides the catalog's autosave cadence.
    pub autosave_interval: Option<Duration>,
    pub seed: u64,
    pub save_key: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LiveReport {
    pub strategy: String,
    pub seed: u64,
    pub save_key: String,
    pub coins: u64,
    pub pigs_harvested: u64,
    pub total_clicks: u64,
    pub auto_clicks: u64,
    pub achievements: Vec<String>,
    pub rejections: u64,
    pub tick_restarts: u64,
    pub stale_ticks: u64,
    pub autosaves: u64,
    pub final_save: bool,
}

/// Tick source backed by spawned interval tasks that post into the actor's mailbox.
#[derive(Debug)]
pub struct TokioTicker {
    mailbox: mpsc::Sender<Command>,
    tasks: HashMap<TimerId, JoinHandle<()>>,
    next_id: u64,
}

impl TokioTicker {
    pub fn new(mailbox: mpsc::Sender<Command>) -> Self {
        Self {
            mailbox,
            tasks: HashMap::new(),
            next_id: 0,
        }
    }

    pub fn running(&self) -> usize {
        self.tasks.len()
    }

    pub fn abort_all(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }
}

impl TickScheduler for TokioTicker {
    fn schedule_every(&mut self, interval_ms: u64) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let mailbox = self.mailbox.clone();
        let period = Duration::from_millis(interval_ms.max(1));
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if mailbox.send(Command::Tick(id)).await.is_err() {
                    break;
                }
            }
        });
        self.tasks.insert(id, handle);
        id
    }

    fn cancel(&mut self, id: TimerId) {
        if let Some(handle) = self.tasks.remove(&id) {
            handle.abort();
        }
    }
}

fn spawn_repeating(
    mailbox: mpsc::Sender<Command>,
    period: Duration,
    make: fn() -> Command,
) -> JoinHandle<()> {
    let period = period.max(Duration::from_millis(1));
    tokio::spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if mailbox.send(make()).await.is_err() {
                break;
            }
        }
    })
}

struct FarmActor<L: CatalogLoader, S: FarmStorage> {
    engine: GameEngine<L, S>,
    farm: Farm,
    policy: Box<dyn PlayerPolicy + Send>,
    timer: AutoClickerTimer<TokioTicker>,
    strategy: Strategy,
    seed: u64,
    save_key: String,
    auto_clicks: u64,
    achievements: Vec<String>,
    rejections: u64,
    tick_restarts: u64,
    stale_ticks: u64,
    autosaves: u64,
}

impl<L, S> FarmActor<L, S>
where
    L: CatalogLoader,
    S: FarmStorage,
{
    async fn run(mut self, mut mailbox: mpsc::Receiver<Command>) {
        if let Some(interval_ms) = self.farm.tick_interval_ms() {
            self.timer.restart(interval_ms);
            self.tick_restarts += 1;
        }

        while let Some(command) = mailbox.recv().await {
            match command {
                Command::ManualClick => {
                    self.decide();
                    if let Ok(click) = self.farm.click_pig(ClickSource::Manual) {
                        self.record_click(&click);
                    }
                }
                Command::Tick(id) if self.timer.timer_id() == Some(id) => {
                    if let Some(click) = self.farm.auto_tick() {
                        self.record_click(&click);
                    }
                }
                Command::Tick(id) => {
                    debug!("ignoring tick from replaced timer {id:?}");
                    self.stale_ticks += 1;
                }
                Command::Autosave => {
                    if self.engine.autosave(&self.save_key, &self.farm) {
                        self.autosaves += 1;
                    }
                }
                Command::Shutdown(reply) => {
                    self.timer.stop();
                    self.timer.scheduler_mut().abort_all();
                    let saved = self.engine.autosave(&self.save_key, &self.farm);
                    if reply.send(self.report(saved)).is_err() {
                        warn!("shutdown requester went away before the final report");
                    }
                    break;
                }
            }
        }
    }

    fn decide(&mut self) {
        for _ in 0..MAX_ACTIONS_PER_DECISION {
            let Some(action) = self
                .policy
                .next_action(self.farm.state(), self.farm.catalog())
            else {
                break;
            };
            match perform(&mut self.farm, action) {
                Ok(performed) => {
                    if self.engine.autosave(&self.save_key, &self.farm) {
                        self.autosaves += 1;
                    }
                    self.achievements
                        .extend(performed.unlocked_ids().map(str::to_string));
                    if let Performed::Purchase(purchase) = &performed
                        && let Some(directive) = purchase.tick
                    {
                        self.timer.apply(directive);
                        self.tick_restarts += 1;
                        debug!(
                            "auto-clicker now every {:?}ms, {} tick task(s) live",
                            self.timer.interval_ms(),
                            self.timer.scheduler().running()
                        );
                    }
                }
                Err(rejection) => {
                    debug!("{} rejected {action:?}: {rejection}", self.policy.name());
                    self.rejections += 1;
                    break;
                }
            }
        }
    }

    fn record_click(&mut self, click: &ClickOutcome) {
        if click.source == ClickSource::Automatic {
            self.auto_clicks += 1;
        }
        if let Some(ribbon) = &click.ribbon {
            info!("🎀 ribbon! +{} coins of value", ribbon.bonus);
        }
        for unlock in &click.unlocked {
            info!("🏆 {} {}", unlock.icon, unlock.name);
            self.achievements.push(unlock.id.clone());
        }
    }

    fn report(&self, final_save: bool) -> LiveReport {
        let state = self.farm.state();
        LiveReport {
            strategy: self.strategy.key().to_string(),
            seed: self.seed,
            save_key: self.save_key.clone(),
            coins: state.coins,
            pigs_harvested: state.pigs_harvested,
            total_clicks: state.total_clicks,
            auto_clicks: self.auto_clicks,
            achievements: self.achievements.clone(),
            rejections: self.rejections,
            tick_restarts: self.tick_restarts,
            stale_ticks: self.stale_ticks,
            autosaves: self.autosaves,
            final_save,
        }
    }
}

/// Run a live session until the deadline or Ctrl-C, then flush a final save.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded or the actor dies early.
pub async fn run_live<L, S>(
    engine: GameEngine<L, S>,
    strategy: Strategy,
    config: LiveConfig,
) -> Result<LiveReport>
where
    L: CatalogLoader + Send + 'static,
    S: FarmStorage + Send + 'static,
{
    let farm = engine
        .load_farm(&config.save_key, config.seed)
        .context("loading catalog")?;
    let autosave_interval = config
        .autosave_interval
        .unwrap_or_else(|| Duration::from_millis(farm.catalog().timing.save_interval_ms));

    let (tx, rx) = mpsc::channel(MAILBOX_CAPACITY);
    let actor = FarmActor {
        engine,
        farm,
        policy: strategy.create_policy(),
        timer: AutoClickerTimer::new(TokioTicker::new(tx.clone())),
        strategy,
        seed: config.seed,
        save_key: config.save_key.clone(),
        auto_clicks: 0,
        achievements: Vec::new(),
        rejections: 0,
        tick_restarts: 0,
        stale_ticks: 0,
        autosaves: 0,
    };
    let actor_task = tokio::spawn(actor.run(rx));
    let clicker = spawn_repeating(tx.clone(), config.click_interval, || Command::ManualClick);
    let autosaver = spawn_repeating(tx.clone(), autosave_interval, || Command::Autosave);

    tokio::select! {
        () = time::sleep(config.duration) => info!("session deadline reached"),
        signal = tokio::signal::ctrl_c() => match signal {
            Ok(()) => info!("interrupted, shutting down"),
            Err(err) => warn!("could not listen for Ctrl-C: {err}"),
        },
    }

    clicker.abort();
    autosaver.abort();
    let (reply_tx, reply_rx) = oneshot::channel();
    tx.send(Command::Shutdown(reply_tx))
        .await
        .context("farm actor stopped early")?;
    let report = reply_rx
        .await
        .context("farm actor dropped the shutdown reply")?;
    actor_task.await.context("farm actor panicked")?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use pigfarm_game::{StaticCatalog, decode};

    fn config(ms: u64) -> LiveConfig {
        LiveConfig {
            duration: Duration::from_millis(ms),
            click_interval: Duration::from_millis(5),
            autosave_interval: Some(Duration::from_millis(100)),
            seed: 9,
            save_key: "live-test".to_string(),
        }
    }

    #[tokio::test]
    async fn cancelled_ticker_stops_posting() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut ticker = TokioTicker::new(tx);
        let id = ticker.schedule_every(5);
        match rx.recv().await {
            Some(Command::Tick(got)) => assert_eq!(got, id),
            other => panic!("unexpected {other:?}"),
        }
        ticker.cancel(id);
        assert_eq!(ticker.running(), 0);
        while rx.try_recv().is_ok() {}
        time::sleep(Duration::from_millis(30)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn accepted_actions_are_saved_before_any_autosave_tick() {
        let storage = MemoryStorage::default();
        let engine = GameEngine::new(StaticCatalog, storage.clone());
        let farm = engine.new_farm(9).unwrap();
        let (tx, _rx) = mpsc::channel(MAILBOX_CAPACITY);
        let mut actor = FarmActor {
            engine,
            farm,
            policy: Strategy::Idle.create_policy(),
            timer: AutoClickerTimer::new(TokioTicker::new(tx)),
            strategy: Strategy::Idle,
            seed: 9,
            save_key: "live-now".to_string(),
            auto_clicks: 0,
            achievements: Vec::new(),
            rejections: 0,
            tick_restarts: 0,
            stale_ticks: 0,
            autosaves: 0,
        };
        actor.decide();

        assert!(actor.farm.state().has_pig());
        assert_eq!(actor.autosaves, 1);
        let text = storage.read_snapshot("live-now").unwrap().unwrap();
        let state = decode(&text, actor.farm.catalog()).unwrap();
        assert_eq!(&state, actor.farm.state());
    }

    #[tokio::test]
    async fn live_session_flushes_final_save() {
        let storage = MemoryStorage::default();
        let engine = GameEngine::new(StaticCatalog, storage.clone());
        let report = run_live(engine, Strategy::Automation, config(400))
            .await
            .unwrap();
        assert!(report.final_save);
        assert!(report.total_clicks > 0);
        assert!(report.autosaves >= 1);

        let text = storage.read_snapshot("live-test").unwrap().unwrap();
        let catalog = pigfarm_game::GameCatalog::load_from_static().unwrap();
        let state = decode(&text, &catalog).unwrap();
        assert_eq!(state.coins, report.coins);
        assert_eq!(state.total_clicks, report.total_clicks);
    }

    #[tokio::test]
    async fn live_session_resumes_from_previous_save() {
        let storage = MemoryStorage::default();
        let first = run_live(
            GameEngine::new(StaticCatalog, storage.clone()),
            Strategy::Idle,
            config(150),
        )
        .await
        .unwrap();
        let second = run_live(
            GameEngine::new(StaticCatalog, storage.clone()),
            Strategy::Idle,
            config(150),
        )
        .await
        .unwrap();
        assert!(second.total_clicks >= first.total_clicks);
    }
}
