//! Static configuration catalog: pig types, pricing tables, timings and achievements.
//!
//! The catalog is loaded once per session and shared immutably. All balance
//! numbers flow from here so they can be tuned without touching the state machine.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};
use thiserror::Error;

const DEFAULT_CATALOG_DATA: &str = include_str!("../assets/catalog.json");

/// The seven purchasable pig breeds, in shop order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PigKind {
    Runt,
    Piglet,
    Farm,
    Prize,
    Royal,
    Diamond,
    Legendary,
}

impl PigKind {
    pub const ALL: [Self; 7] = [
        Self::Runt,
        Self::Piglet,
        Self::Farm,
        Self::Prize,
        Self::Royal,
        Self::Diamond,
        Self::Legendary,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Runt => "runt",
            Self::Piglet => "piglet",
            Self::Farm => "farm",
            Self::Prize => "prize",
            Self::Royal => "royal",
            Self::Diamond => "diamond",
            Self::Legendary => "legendary",
        }
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for PigKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown pig kind: {0}")]
pub struct UnknownPigKind(pub String);

impl FromStr for PigKind {
    type Err = UnknownPigKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownPigKind(s.to_string()))
    }
}

/// Static definition of a pig breed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PigTypeDef {
    pub base_cost: u64,
    pub base_start_value: u64,
    pub base_click_value: u64,
    pub name: String,
    #[serde(default)]
    pub emoji: String,
    #[serde(default)]
    pub image: String,
}

/// Ribbon odds and the upgrade price ladder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RibbonConfig {
    pub base_chance: u32,
    pub max_chance: u32,
    pub bonus_percent: u32,
    pub upgrade_costs: Vec<u64>,
}

/// Auto-clicker purchase price and speed curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoClickerConfig {
    pub base_cost: u64,
    pub base_speed_ms: u64,
    pub min_speed_ms: u64,
    pub upgrade_base_cost: u64,
    pub upgrade_cost_multiplier: f64,
    pub speed_multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingConfig {
    #[serde(default = "TimingConfig::default_save_interval_ms")]
    pub save_interval_ms: u64,
}

impl TimingConfig {
    const fn default_save_interval_ms() -> u64 {
        25_000
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            save_interval_ms: Self::default_save_interval_ms(),
        }
    }
}

/// Display label applied to a harvest once the pig reaches `min_value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestTier {
    pub min_value: u64,
    pub label: String,
}

/// Condition that unlocks an achievement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Requirement {
    Clicks { value: u64 },
    Harvested { value: u64 },
    Ribbons { value: u64 },
    Coins { value: u64 },
    AutoClickers { value: u32 },
    AutoClickerUpgrades { value: u32 },
    PigKills { subtype: PigKind, value: u64 },
    /// Satisfied only while a pig of this kind is live.
    PigType { value: PigKind },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementDef {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub icon: String,
    pub requirement: Requirement,
}

/// Errors raised when a catalog cannot be parsed or violates its invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("catalog JSON parsing error: {0}")]
    Parse(String),
    #[error("pig type `{0}` is missing from the catalog")]
    MissingPigType(PigKind),
    #[error("ribbon chance invalid: base {base}%, max {max}%")]
    RibbonChanceRange { base: u32, max: u32 },
    #[error("ribbon upgrade table has {actual} tiers but the chance range needs {expected}")]
    RibbonTableLength { expected: usize, actual: usize },
    #[error("ribbon upgrade costs must be strictly ascending (tier {tier})")]
    RibbonTableOrder { tier: usize },
    #[error("auto-clicker minimum speed {min}ms exceeds base speed {base}ms")]
    AutoClickerSpeedRange { min: u64, base: u64 },
    #[error("{field} must be at least 1.0 (got {value})")]
    MultiplierBelowOne { field: &'static str, value: String },
    #[error("duplicate or empty achievement id `{0}`")]
    AchievementId(String),
    #[error("catalog needs at least one harvest tier")]
    NoHarvestTiers,
    #[error("timing.saveIntervalMs must be positive")]
    ZeroSaveInterval,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCatalog {
    pig_types: BTreeMap<PigKind, PigTypeDef>,
    ribbon: RibbonConfig,
    auto_clicker: AutoClickerConfig,
    #[serde(default)]
    timing: TimingConfig,
    #[serde(default)]
    harvest_tiers: Vec<HarvestTier>,
    #[serde(default)]
    achievements: Vec<AchievementDef>,
}

/// Validated, immutable game catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct GameCatalog {
    pig_types: Vec<PigTypeDef>,
    pub ribbon: RibbonConfig,
    pub auto_clicker: AutoClickerConfig,
    pub timing: TimingConfig,
    harvest_tiers: Vec<HarvestTier>,
    achievements: Vec<AchievementDef>,
}

impl GameCatalog {
    /// Parse and validate a catalog from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the catalog breaks an invariant.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let raw: RawCatalog =
            serde_json::from_str(json).map_err(|err| CatalogError::Parse(err.to_string()))?;
        Self::from_raw(raw)
    }

    /// Load the catalog embedded in the crate.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded asset is invalid.
    pub fn load_from_static() -> Result<Self, CatalogError> {
        Self::from_json(DEFAULT_CATALOG_DATA)
    }

    /// Shared handle to the embedded catalog, parsed once per process.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded asset is invalid.
    pub fn shared_static() -> Result<Arc<Self>, CatalogError> {
        static CATALOG: OnceLock<Result<Arc<GameCatalog>, CatalogError>> = OnceLock::new();
        CATALOG
            .get_or_init(|| Self::load_from_static().map(Arc::new))
            .clone()
    }

    fn from_raw(raw: RawCatalog) -> Result<Self, CatalogError> {
        let RawCatalog {
            mut pig_types,
            ribbon,
            auto_clicker,
            timing,
            mut harvest_tiers,
            achievements,
        } = raw;

        let mut ordered = Vec::with_capacity(PigKind::ALL.len());
        for kind in PigKind::ALL {
            let def = pig_types
                .remove(&kind)
                .ok_or(CatalogError::MissingPigType(kind))?;
            ordered.push(def);
        }

        validate_ribbon(&ribbon)?;
        validate_auto_clicker(&auto_clicker)?;
        if timing.save_interval_ms == 0 {
            return Err(CatalogError::ZeroSaveInterval);
        }

        let mut seen = HashSet::new();
        for achievement in &achievements {
            if achievement.id.trim().is_empty() || !seen.insert(achievement.id.as_str()) {
                return Err(CatalogError::AchievementId(achievement.id.clone()));
            }
        }

        if harvest_tiers.is_empty() {
            return Err(CatalogError::NoHarvestTiers);
        }
        harvest_tiers.sort_by(|a, b| b.min_value.cmp(&a.min_value));

        Ok(Self {
            pig_types: ordered,
            ribbon,
            auto_clicker,
            timing,
            harvest_tiers,
            achievements,
        })
    }

    /// Definition for a pig breed. Every kind is present once validated.
    #[must_use]
    pub fn pig_type(&self, kind: PigKind) -> &PigTypeDef {
        &self.pig_types[kind.index()]
    }

    /// Pig definitions paired with their kind, in shop order.
    pub fn pig_types(&self) -> impl Iterator<Item = (PigKind, &PigTypeDef)> {
        PigKind::ALL.into_iter().zip(self.pig_types.iter())
    }

    /// Achievement definitions in catalog order.
    #[must_use]
    pub fn achievements(&self) -> &[AchievementDef] {
        &self.achievements
    }

    #[must_use]
    pub fn achievement(&self, id: &str) -> Option<&AchievementDef> {
        self.achievements.iter().find(|a| a.id == id)
    }

    /// Harvest tiers sorted from the highest threshold down.
    #[must_use]
    pub fn harvest_tiers(&self) -> &[HarvestTier] {
        &self.harvest_tiers
    }
}

fn validate_ribbon(ribbon: &RibbonConfig) -> Result<(), CatalogError> {
    if ribbon.base_chance == 0 || ribbon.base_chance > ribbon.max_chance {
        return Err(CatalogError::RibbonChanceRange {
            base: ribbon.base_chance,
            max: ribbon.max_chance,
        });
    }
    let expected = (ribbon.max_chance - ribbon.base_chance) as usize;
    if ribbon.upgrade_costs.len() != expected {
        return Err(CatalogError::RibbonTableLength {
            expected,
            actual: ribbon.upgrade_costs.len(),
        });
    }
    if let Some(tier) = ribbon
        .upgrade_costs
        .windows(2)
        .position(|pair| pair[1] <= pair[0])
    {
        return Err(CatalogError::RibbonTableOrder { tier: tier + 1 });
    }
    Ok(())
}

fn validate_auto_clicker(cfg: &AutoClickerConfig) -> Result<(), CatalogError> {
    if cfg.min_speed_ms > cfg.base_speed_ms {
        return Err(CatalogError::AutoClickerSpeedRange {
            min: cfg.min_speed_ms,
            base: cfg.base_speed_ms,
        });
    }
    for (field, value) in [
        ("upgradeCostMultiplier", cfg.upgrade_cost_multiplier),
        ("speedMultiplier", cfg.speed_multiplier),
    ] {
        if !value.is_finite() || value < 1.0 {
            return Err(CatalogError::MultiplierBelowOne {
                field,
                value: value.to_string(),
            });
        }
    }
    Ok(())
}
