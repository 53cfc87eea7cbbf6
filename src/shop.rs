//! Upgrade levels and the cost/probability model.
//!
//! Cost at level `L` is `base * growth^L` per resource, rounded up. Flight
//! upgrades scale [`FlightStats`]; the magnet and scanner upgrades scale the
//! spawn weights of gold and fuel, which shifts what the spawner draws.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{FlightConfig, ShopConfig};
use crate::constants::{
    EFFICIENCY_CUT_PER_LEVEL, EFFICIENCY_FLOOR, ENGINE_BONUS_PER_LEVEL,
    FUEL_TANK_BONUS_PER_LEVEL, WEIGHT_BONUS_PER_LEVEL,
};
use crate::flight::FlightStats;
use crate::spawner::CategoryWeights;
use crate::types::{ItemCategory, UpgradeCost, UpgradeKind};
use crate::wallet::Wallet;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShopError {
    MaxLevel { kind: UpgradeKind, level: u8 },
    InsufficientFunds { kind: UpgradeKind, cost: UpgradeCost },
}

impl fmt::Display for ShopError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShopError::MaxLevel { kind, level } => {
                write!(f, "{kind:?} is already at max level {level}")
            }
            ShopError::InsufficientFunds { kind, cost } => write!(
                f,
                "{kind:?} needs {} gold, {} metal, {} energy",
                cost.gold, cost.metal, cost.energy
            ),
        }
    }
}

impl std::error::Error for ShopError {}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Upgrades {
    levels: HashMap<UpgradeKind, u8>,
}

impl Upgrades {
    pub fn level(&self, kind: UpgradeKind) -> u8 {
        self.levels.get(&kind).copied().unwrap_or(0)
    }

    /// `None` once the kind is maxed out.
    pub fn next_cost(&self, kind: UpgradeKind, shop: &ShopConfig) -> Option<UpgradeCost> {
        let level = self.level(kind);
        if level >= shop.max_level {
            return None;
        }
        Some(cost_at_level(shop.base_cost(kind), shop.cost_growth, level))
    }

    /// Buys one level of `kind`. The wallet is untouched on error.
    pub fn purchase(
        &mut self,
        kind: UpgradeKind,
        wallet: &mut Wallet,
        shop: &ShopConfig,
    ) -> Result<u8, ShopError> {
        let level = self.level(kind);
        let cost = self
            .next_cost(kind, shop)
            .ok_or(ShopError::MaxLevel { kind, level })?;
        if !wallet.spend(&cost) {
            return Err(ShopError::InsufficientFunds { kind, cost });
        }
        let next = level + 1;
        self.levels.insert(kind, next);
        Ok(next)
    }

    /// Cheapest affordable upgrade by gold cost, ties broken by
    /// [`UpgradeKind::ALL`] order.
    pub fn cheapest_affordable(
        &self,
        wallet: &Wallet,
        shop: &ShopConfig,
    ) -> Option<(UpgradeKind, UpgradeCost)> {
        UpgradeKind::ALL
            .iter()
            .filter_map(|kind| self.next_cost(*kind, shop).map(|cost| (*kind, cost)))
            .filter(|(_, cost)| wallet.can_afford(cost))
            .min_by_key(|(_, cost)| (cost.gold, cost.metal, cost.energy))
    }

    pub fn flight_stats(&self, base: &FlightConfig) -> FlightStats {
        let tank = 1.0 + FUEL_TANK_BONUS_PER_LEVEL * self.level(UpgradeKind::FuelTank) as f32;
        let engine = 1.0 + ENGINE_BONUS_PER_LEVEL * self.level(UpgradeKind::Engine) as f32;
        let burn = (1.0 - EFFICIENCY_CUT_PER_LEVEL * self.level(UpgradeKind::Efficiency) as f32)
            .max(EFFICIENCY_FLOOR);
        FlightStats {
            fuel_capacity: base.fuel_capacity * tank,
            burn_per_sec: base.burn_per_sec * burn,
            climb_per_sec: base.climb_per_sec * engine,
            lateral_per_sec: base.lateral_per_sec,
            low_fuel_ratio: base.low_fuel_ratio,
        }
    }

    pub fn spawn_weights(&self, base: CategoryWeights) -> CategoryWeights {
        let magnet = 1.0 + WEIGHT_BONUS_PER_LEVEL * self.level(UpgradeKind::GoldMagnet) as f64;
        let scanner = 1.0 + WEIGHT_BONUS_PER_LEVEL * self.level(UpgradeKind::FuelScanner) as f64;
        base.scaled(ItemCategory::Gold, magnet)
            .scaled(ItemCategory::Fuel, scanner)
    }
}

pub fn cost_at_level(base: UpgradeCost, growth: f64, level: u8) -> UpgradeCost {
    let factor = growth.max(1.0).powi(level as i32);
    let scale = |value: u32| -> u32 {
        if value == 0 {
            return 0;
        }
        (value as f64 * factor).ceil().min(u32::MAX as f64) as u32
    };
    UpgradeCost {
        gold: scale(base.gold),
        metal: scale(base.metal),
        energy: scale(base.energy),
    }
}
