use rand::Rng;
use std::fmt;
use std::str::FromStr;

use pigfarm_game::{
    Farm, GameCatalog, HarvestOutcome, LiveState, PigKind, PurchaseOutcome, Rejection, pricing,
};

/// One engine operation a player policy wants performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    BuyPig(PigKind),
    Harvest,
    BuyAutoClicker,
    UpgradeAutoClicker,
    BuyRibbonUpgrade,
}

/// What an accepted [`Action`] produced.
#[derive(Debug, Clone)]
pub enum Performed {
    Purchase(PurchaseOutcome),
    Harvest(HarvestOutcome),
}

impl Performed {
    /// Signed change to the coin balance.
    pub fn coin_delta(&self) -> i128 {
        match self {
            Self::Purchase(outcome) => -i128::from(outcome.cost),
            Self::Harvest(outcome) => i128::from(outcome.coins_earned),
        }
    }

    pub fn unlocked_ids(&self) -> impl Iterator<Item = &str> {
        let unlocked = match self {
            Self::Purchase(outcome) => &outcome.unlocked,
            Self::Harvest(outcome) => &outcome.unlocked,
        };
        unlocked.iter().map(|u| u.id.as_str())
    }
}

/// Run one action against the farm.
pub fn perform<R: Rng>(farm: &mut Farm<R>, action: Action) -> Result<Performed, Rejection> {
    match action {
        Action::BuyPig(kind) => farm.buy_pig(kind).map(Performed::Purchase),
        Action::Harvest => farm.kill_pig().map(Performed::Harvest),
        Action::BuyAutoClicker => farm.buy_auto_clicker().map(Performed::Purchase),
        Action::UpgradeAutoClicker => farm.upgrade_auto_clicker().map(Performed::Purchase),
        Action::BuyRibbonUpgrade => farm.buy_ribbon_upgrade().map(Performed::Purchase),
    }
}

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Next purchase or harvest to attempt, or `None` to keep clicking.
    fn next_action(&mut self, state: &LiveState, catalog: &GameCatalog) -> Option<Action>;
}

/// Built-in player strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Strategy {
    Idle,
    Greedy,
    Automation,
    Ribbon,
}

impl Strategy {
    pub const ALL: [Self; 4] = [Self::Idle, Self::Greedy, Self::Automation, Self::Ribbon];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Greedy => "greedy",
            Self::Automation => "automation",
            Self::Ribbon => "ribbon",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Idle => "Raises runts only and harvests them at a fixed value",
            Self::Greedy => "Always buys the most expensive pig it can afford",
            Self::Automation => "Buys the auto-clicker first and keeps upgrading it",
            Self::Ribbon => "Spends on ribbon upgrades before anything else",
        }
    }

    #[must_use]
    pub fn create_policy(self) -> Box<dyn PlayerPolicy + Send> {
        match self {
            Self::Idle => Box::new(IdlePolicy),
            Self::Greedy => Box::new(GreedyPolicy),
            Self::Automation => Box::new(AutomationPolicy),
            Self::Ribbon => Box::new(RibbonPolicy),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown strategy `{s}`"))
    }
}

const RUNT_HARVEST_VALUE: u64 = 50;

/// Harvest once the pig is worth double its price, or the runt target for free pigs.
fn harvest_target(catalog: &GameCatalog, kind: PigKind) -> u64 {
    pricing::pig_cost(catalog, kind)
        .saturating_mul(2)
        .max(RUNT_HARVEST_VALUE)
}

fn harvest_when_ready(state: &LiveState, catalog: &GameCatalog) -> Option<Action> {
    let pig = state.current_pig.as_ref()?;
    (pig.value >= harvest_target(catalog, pig.kind)).then_some(Action::Harvest)
}

/// Most expensive kind affordable while keeping `reserve` coins back.
fn best_affordable(state: &LiveState, catalog: &GameCatalog, reserve: u64) -> PigKind {
    let budget = state.coins.saturating_sub(reserve);
    catalog
        .pig_types()
        .filter(|(_, def)| def.base_cost <= budget)
        .map(|(kind, _)| kind)
        .last()
        .unwrap_or(PigKind::Runt)
}

fn restock(state: &LiveState, catalog: &GameCatalog, reserve: u64) -> Option<Action> {
    if state.has_pig() {
        harvest_when_ready(state, catalog)
    } else {
        Some(Action::BuyPig(best_affordable(state, catalog, reserve)))
    }
}

struct IdlePolicy;

impl PlayerPolicy for IdlePolicy {
    fn name(&self) -> &'static str {
        "idle"
    }

    fn next_action(&mut self, state: &LiveState, _catalog: &GameCatalog) -> Option<Action> {
        match &state.current_pig {
            None => Some(Action::BuyPig(PigKind::Runt)),
            Some(pig) if pig.value >= RUNT_HARVEST_VALUE => Some(Action::Harvest),
            Some(_) => None,
        }
    }
}

struct GreedyPolicy;

impl PlayerPolicy for GreedyPolicy {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn next_action(&mut self, state: &LiveState, catalog: &GameCatalog) -> Option<Action> {
        restock(state, catalog, 0)
    }
}

struct AutomationPolicy;

impl PlayerPolicy for AutomationPolicy {
    fn name(&self) -> &'static str {
        "automation"
    }

    fn next_action(&mut self, state: &LiveState, catalog: &GameCatalog) -> Option<Action> {
        if !state.owns_auto_clicker() {
            if state.coins >= catalog.auto_clicker.base_cost {
                return Some(Action::BuyAutoClicker);
            }
            return restock(state, catalog, 0);
        }
        let upgrade = pricing::auto_clicker_upgrade_cost(catalog, state.auto_clicker_upgrade_level);
        let floored = state.auto_clicker_interval_ms <= catalog.auto_clicker.min_speed_ms;
        if !floored && state.coins >= upgrade {
            return Some(Action::UpgradeAutoClicker);
        }
        let reserve = if floored { 0 } else { upgrade };
        restock(state, catalog, reserve)
    }
}

struct RibbonPolicy;

impl PlayerPolicy for RibbonPolicy {
    fn name(&self) -> &'static str {
        "ribbon"
    }

    fn next_action(&mut self, state: &LiveState, catalog: &GameCatalog) -> Option<Action> {
        let level = state.ribbon_level(catalog.ribbon.base_chance);
        match pricing::ribbon_upgrade_cost(catalog, level) {
            Some(cost) if state.coins >= cost => Some(Action::BuyRibbonUpgrade),
            Some(cost) => restock(state, catalog, cost),
            None => restock(state, catalog, 0),
        }
    }
}
