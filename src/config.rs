use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::spawner::CategoryWeights;
use crate::types::{ItemCategory, ItemDefinition, UpgradeCost, UpgradeKind};

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    Invalid {
        field: &'static str,
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read config {}: {source}", path.display())
            }
            ConfigError::Parse { path, source } => {
                write!(f, "failed to parse config {}: {source}", path.display())
            }
            ConfigError::Invalid { field, reason } => {
                write!(f, "invalid config value for '{field}': {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::Invalid { .. } => None,
        }
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerConfig {
    pub radius: f32,
    pub spacing: f32,
    pub min_height: f32,
    pub max_height: f32,
    pub reference_depth: f32,
    pub initial_count: usize,
    pub max_items: usize,
    pub spawn_interval_ms: u64,
    pub retry_budget: u32,
    pub default_category: ItemCategory,
    pub weights: CategoryWeights,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            radius: SPAWN_RADIUS,
            spacing: SPAWN_SPACING,
            min_height: SPAWN_MIN_HEIGHT,
            max_height: SPAWN_MAX_HEIGHT,
            reference_depth: SPAWN_REFERENCE_DEPTH,
            initial_count: INITIAL_ITEM_COUNT,
            max_items: MAX_LIVE_ITEMS,
            spawn_interval_ms: SPAWN_INTERVAL_MS,
            retry_budget: SPAWN_RETRY_BUDGET,
            default_category: DEFAULT_CATEGORY,
            weights: CategoryWeights::default(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightConfig {
    pub fuel_capacity: f32,
    pub burn_per_sec: f32,
    pub climb_per_sec: f32,
    pub lateral_per_sec: f32,
    pub low_fuel_ratio: f32,
    pub pickup_radius: f32,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            fuel_capacity: FUEL_CAPACITY,
            burn_per_sec: FUEL_BURN_PER_SEC,
            climb_per_sec: CLIMB_PER_SEC,
            lateral_per_sec: LATERAL_PER_SEC,
            low_fuel_ratio: LOW_FUEL_RATIO,
            pickup_radius: PICKUP_RADIUS,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopConfig {
    pub max_level: u8,
    pub cost_growth: f64,
    pub fuel_tank: UpgradeCost,
    pub engine: UpgradeCost,
    pub efficiency: UpgradeCost,
    pub gold_magnet: UpgradeCost,
    pub fuel_scanner: UpgradeCost,
}

impl ShopConfig {
    pub fn base_cost(&self, kind: UpgradeKind) -> UpgradeCost {
        match kind {
            UpgradeKind::FuelTank => self.fuel_tank,
            UpgradeKind::Engine => self.engine,
            UpgradeKind::Efficiency => self.efficiency,
            UpgradeKind::GoldMagnet => self.gold_magnet,
            UpgradeKind::FuelScanner => self.fuel_scanner,
        }
    }
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            max_level: UPGRADE_MAX_LEVEL,
            cost_growth: UPGRADE_COST_GROWTH,
            fuel_tank: UpgradeCost {
                gold: 40,
                metal: 2,
                energy: 0,
            },
            engine: UpgradeCost {
                gold: 60,
                metal: 4,
                energy: 1,
            },
            efficiency: UpgradeCost {
                gold: 50,
                metal: 0,
                energy: 3,
            },
            gold_magnet: UpgradeCost {
                gold: 80,
                metal: 0,
                energy: 2,
            },
            fuel_scanner: UpgradeCost {
                gold: 70,
                metal: 3,
                energy: 0,
            },
        }
    }
}

pub fn default_items() -> Vec<ItemDefinition> {
    vec![
        ItemDefinition {
            category: ItemCategory::Gold,
            amount: GOLD_REWARD,
        },
        ItemDefinition {
            category: ItemCategory::Fuel,
            amount: FUEL_REWARD,
        },
        ItemDefinition {
            category: ItemCategory::Energy,
            amount: ENERGY_REWARD,
        },
        ItemDefinition {
            category: ItemCategory::Metal,
            amount: METAL_REWARD,
        },
    ]
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub spawner: SpawnerConfig,
    pub flight: FlightConfig,
    pub shop: ShopConfig,
    pub items: Vec<ItemDefinition>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            spawner: SpawnerConfig::default(),
            flight: FlightConfig::default(),
            shop: ShopConfig::default(),
            items: default_items(),
        }
    }
}

impl GameConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: GameConfig =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Falls back to defaults when `path` is `None`.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let spawner = &self.spawner;
        if !(spawner.radius.is_finite() && spawner.radius > 0.0) {
            return Err(invalid("spawner.radius", "must be a positive number"));
        }
        if !(spawner.spacing.is_finite() && spawner.spacing > 0.0) {
            return Err(invalid("spawner.spacing", "must be a positive number"));
        }
        let side = get_grid_side(spawner.radius, spawner.spacing) as i64;
        if side * side > MAX_GRID_CELLS {
            return Err(invalid(
                "spawner.spacing",
                format!("grid of {side}x{side} cells exceeds {MAX_GRID_CELLS} cells"),
            ));
        }
        if !(spawner.min_height.is_finite() && spawner.max_height.is_finite()) {
            return Err(invalid("spawner.min_height", "heights must be finite"));
        }
        if spawner.min_height > spawner.max_height {
            return Err(invalid(
                "spawner.min_height",
                format!(
                    "{} is above max_height {}",
                    spawner.min_height, spawner.max_height
                ),
            ));
        }
        if spawner.spawn_interval_ms == 0 {
            return Err(invalid("spawner.spawn_interval_ms", "must be at least 1"));
        }
        for category in ItemCategory::ALL {
            let weight = spawner.weights.get(category);
            if !weight.is_finite() || weight < 0.0 {
                return Err(invalid(
                    "spawner.weights",
                    format!("{} weight {weight} is not a non-negative number", category.key()),
                ));
            }
        }

        let flight = &self.flight;
        if !(flight.fuel_capacity.is_finite() && flight.fuel_capacity > 0.0) {
            return Err(invalid("flight.fuel_capacity", "must be a positive number"));
        }
        if !(flight.burn_per_sec.is_finite() && flight.burn_per_sec >= 0.0) {
            return Err(invalid("flight.burn_per_sec", "must be non-negative"));
        }
        if !(flight.climb_per_sec.is_finite() && flight.climb_per_sec >= 0.0) {
            return Err(invalid("flight.climb_per_sec", "must be non-negative"));
        }
        if !(flight.lateral_per_sec.is_finite() && flight.lateral_per_sec >= 0.0) {
            return Err(invalid("flight.lateral_per_sec", "must be non-negative"));
        }
        if !(flight.pickup_radius.is_finite() && flight.pickup_radius >= 0.0) {
            return Err(invalid("flight.pickup_radius", "must be non-negative"));
        }
        if !(0.0..=1.0).contains(&flight.low_fuel_ratio) {
            return Err(invalid("flight.low_fuel_ratio", "must be within 0..=1"));
        }

        if !(self.shop.cost_growth.is_finite() && self.shop.cost_growth >= 1.0) {
            return Err(invalid("shop.cost_growth", "must be at least 1.0"));
        }
        Ok(())
    }
}
