//! Pig Farm Progression Engine
//!
//! Platform-agnostic core of the pig clicker: catalog, live state, pricing, the
//! purchase/harvest state machine, achievements, persistence and tick scheduling.
//! Hosts supply storage and timers; this crate performs no I/O of its own.

pub mod achievements;
pub mod catalog;
pub mod constants;
pub mod farm;
pub mod numbers;
pub mod outcome;
pub mod pricing;
pub mod save;
pub mod schedule;
pub mod shop;
pub mod state;

use log::{info, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::sync::Arc;
use thiserror::Error;

// Re-export commonly used types
pub use catalog::{
    AchievementDef, AutoClickerConfig, CatalogError, GameCatalog, HarvestTier, PigKind,
    PigTypeDef, Requirement, RibbonConfig, TimingConfig, UnknownPigKind,
};
pub use constants::{DEFAULT_SAVE_KEY, DEFAULT_SEED};
pub use farm::Farm;
pub use numbers::format_compact;
pub use outcome::{
    AchievementUnlock, ClickOutcome, ClickSource, HarvestOutcome, Purchase, PurchaseOutcome,
    Rejection, RibbonAward, TickDirective,
};
pub use save::{SnapshotError, decode, encode};
pub use schedule::{AutoClickerTimer, ManualScheduler, TickScheduler, TimerId};
pub use shop::{ShopEntry, ShopItem, harvest_tier, listing};
pub use state::{CurrentPig, LiveState};

use constants::LOG_TARGET_SAVE;

/// Trait for abstracting where the catalog comes from
/// Platform-specific implementations should provide this
pub trait CatalogLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the game catalog
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded or validated.
    fn load_catalog(&self) -> Result<Arc<GameCatalog>, Self::Error>;
}

/// Loader for the catalog embedded in this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticCatalog;

impl CatalogLoader for StaticCatalog {
    type Error = CatalogError;

    fn load_catalog(&self) -> Result<Arc<GameCatalog>, Self::Error> {
        GameCatalog::shared_static()
    }
}

/// Trait for abstracting snapshot persistence as string key/value pairs
/// Platform-specific implementations should provide this
pub trait FarmStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Store an encoded snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be written.
    fn write_snapshot(&self, key: &str, snapshot: &str) -> Result<(), Self::Error>;

    /// Read a previously stored snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be read.
    fn read_snapshot(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Remove a stored snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be deleted.
    fn delete_snapshot(&self, key: &str) -> Result<(), Self::Error>;
}

#[derive(Debug, Error)]
pub enum PersistError<E: std::error::Error + 'static> {
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("storage failure: {0}")]
    Storage(#[source] E),
}

/// Main engine for creating, restoring and persisting farms
pub struct GameEngine<L, S>
where
    L: CatalogLoader,
    S: FarmStorage,
{
    loader: L,
    storage: S,
}

impl<L, S> GameEngine<L, S>
where
    L: CatalogLoader,
    S: FarmStorage,
{
    pub const fn new(loader: L, storage: S) -> Self {
        Self { loader, storage }
    }

    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Start a fresh farm.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded.
    pub fn new_farm(&self, seed: u64) -> Result<Farm, L::Error> {
        let catalog = self.loader.load_catalog()?;
        Ok(Farm::seeded(catalog, seed))
    }

    /// Restore the farm stored under `key`, or start fresh when there is nothing usable.
    ///
    /// Storage failures and corrupt snapshots are logged and never abort the session.
    ///
    /// # Errors
    ///
    /// Returns an error only if the catalog cannot be loaded.
    pub fn load_farm(&self, key: &str, seed: u64) -> Result<Farm, L::Error> {
        let catalog = self.loader.load_catalog()?;
        let snapshot = match self.storage.read_snapshot(key) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(target: LOG_TARGET_SAVE, "could not read save `{key}`: {err}");
                None
            }
        };
        let Some(text) = snapshot else {
            return Ok(Farm::seeded(catalog, seed));
        };

        match save::decode(&text, &catalog) {
            Ok(state) => {
                info!(target: LOG_TARGET_SAVE, "restored save `{key}`");
                let rng = ChaCha20Rng::seed_from_u64(seed);
                Ok(Farm::from_state(catalog, state, rng))
            }
            Err(err) => {
                warn!(target: LOG_TARGET_SAVE, "discarding corrupt save `{key}`: {err}");
                Ok(Farm::seeded(catalog, seed))
            }
        }
    }

    /// Encode and store the farm's state.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the storage write fails.
    pub fn save_farm<R: Rng>(
        &self,
        key: &str,
        farm: &Farm<R>,
    ) -> Result<(), PersistError<S::Error>> {
        let text = save::encode(farm.state())?;
        self.storage
            .write_snapshot(key, &text)
            .map_err(PersistError::Storage)
    }

    /// Save, logging instead of returning failures. Returns whether the save landed.
    pub fn autosave<R: Rng>(&self, key: &str, farm: &Farm<R>) -> bool {
        match self.save_farm(key, farm) {
            Ok(()) => true,
            Err(err) => {
                warn!(target: LOG_TARGET_SAVE, "could not save game: {err}");
                false
            }
        }
    }

    /// Delete the stored farm.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot delete the snapshot.
    pub fn delete_save(&self, key: &str) -> Result<(), S::Error> {
        self.storage.delete_snapshot(key)
    }
}
