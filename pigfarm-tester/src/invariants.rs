//! Cross-checks run after every operation in a simulated session.
use pigfarm_game::{GameCatalog, LiveState, PigKind};

/// Tracks the last observed state and the coin ledger implied by reported outcomes.
#[derive(Debug, Clone)]
pub struct InvariantChecker {
    previous: LiveState,
    ledger: i128,
    failures: Vec<String>,
}

impl InvariantChecker {
    pub fn new(initial: &LiveState) -> Self {
        Self {
            previous: initial.clone(),
            ledger: i128::from(initial.coins),
            failures: Vec::new(),
        }
    }

    /// Record a coin movement reported by an outcome.
    pub fn credit(&mut self, delta: i128) {
        self.ledger += delta;
    }

    pub fn record(&mut self, failure: String) {
        self.failures.push(failure);
    }

    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<String> {
        self.failures
    }

    /// Compare `state` against the previous observation. `tick_sources` is the number of
    /// live auto-clicker timers on the host side.
    pub fn observe(
        &mut self,
        at_ms: u64,
        state: &LiveState,
        catalog: &GameCatalog,
        tick_sources: usize,
    ) {
        let mut broken = Vec::new();
        let prev = &self.previous;

        if i128::from(state.coins) != self.ledger {
            broken.push(format!(
                "coins {} disagree with reported outcomes ({})",
                state.coins, self.ledger
            ));
        }

        if state.ribbon_chance_percent > catalog.ribbon.max_chance {
            broken.push(format!(
                "ribbon chance {}% above maximum",
                state.ribbon_chance_percent
            ));
        }
        if state.ribbon_chance_percent < prev.ribbon_chance_percent {
            broken.push("ribbon chance decreased".to_string());
        }

        for kind in PigKind::ALL {
            if state.kills(kind) < prev.kills(kind) {
                broken.push(format!("kill count for {kind} decreased"));
            }
        }
        let kills: u64 = state.kill_count_by_type.values().sum();
        if kills != state.pigs_harvested {
            broken.push(format!(
                "kill counts sum to {kills} but {} pigs were harvested",
                state.pigs_harvested
            ));
        }

        for (id, unlocked) in &prev.achievement_unlocked {
            if *unlocked && !state.is_unlocked(id) {
                broken.push(format!("achievement {id} was re-locked"));
            }
        }

        let counters = [
            ("pigsRaised", prev.pigs_raised, state.pigs_raised),
            ("pigsHarvested", prev.pigs_harvested, state.pigs_harvested),
            ("totalClicks", prev.total_clicks, state.total_clicks),
            ("ribbonsWon", prev.ribbons_won, state.ribbons_won),
        ];
        for (name, before, after) in counters {
            if after < before {
                broken.push(format!("{name} went from {before} to {after}"));
            }
        }

        let live = state.pigs_raised.saturating_sub(state.pigs_harvested);
        if live != u64::from(state.has_pig()) {
            broken.push(format!(
                "{} raised and {} harvested but slot holds {}",
                state.pigs_raised,
                state.pigs_harvested,
                u64::from(state.has_pig())
            ));
        }

        if state.auto_clicker_count > 1 {
            broken.push(format!("{} auto-clickers owned", state.auto_clicker_count));
        }
        let expected_sources = usize::from(state.owns_auto_clicker());
        if tick_sources != expected_sources {
            broken.push(format!(
                "{tick_sources} auto-clicker tick sources running, expected {expected_sources}"
            ));
        }

        self.failures
            .extend(broken.into_iter().map(|msg| format!("t={at_ms}ms: {msg}")));
        self.previous = state.clone();
    }
}
