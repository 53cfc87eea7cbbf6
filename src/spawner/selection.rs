use serde::{Deserialize, Serialize};

use crate::constants::{ENERGY_WEIGHT, FUEL_WEIGHT, GOLD_WEIGHT, METAL_WEIGHT};
use crate::rng::Rng;
use crate::types::ItemCategory;

/// Per-category spawn weights. They need not sum to 1; selection normalizes
/// against the running total.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryWeights {
    pub gold: f64,
    pub fuel: f64,
    pub energy: f64,
    pub metal: f64,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            gold: GOLD_WEIGHT,
            fuel: FUEL_WEIGHT,
            energy: ENERGY_WEIGHT,
            metal: METAL_WEIGHT,
        }
    }
}

impl CategoryWeights {
    pub fn uniform(weight: f64) -> Self {
        Self {
            gold: weight,
            fuel: weight,
            energy: weight,
            metal: weight,
        }
    }

    pub fn get(&self, category: ItemCategory) -> f64 {
        match category {
            ItemCategory::Gold => self.gold,
            ItemCategory::Fuel => self.fuel,
            ItemCategory::Energy => self.energy,
            ItemCategory::Metal => self.metal,
        }
    }

    pub fn set(&mut self, category: ItemCategory, weight: f64) {
        match category {
            ItemCategory::Gold => self.gold = weight,
            ItemCategory::Fuel => self.fuel = weight,
            ItemCategory::Energy => self.energy = weight,
            ItemCategory::Metal => self.metal = weight,
        }
    }

    pub fn scaled(mut self, category: ItemCategory, factor: f64) -> Self {
        let weight = self.get(category);
        self.set(category, weight * factor);
        self
    }

    /// Negative or non-finite weights count as zero.
    fn effective(&self, category: ItemCategory) -> f64 {
        let weight = self.get(category);
        if weight.is_finite() && weight > 0.0 {
            weight
        } else {
            0.0
        }
    }

    pub fn total(&self) -> f64 {
        ItemCategory::ALL
            .iter()
            .map(|category| self.effective(*category))
            .sum()
    }

    /// Walks categories in declaration order and returns the first whose
    /// running sum strictly exceeds `target`, so a target sitting exactly on
    /// a boundary belongs to the next category.
    pub fn select_at(&self, target: f64, fallback: ItemCategory) -> ItemCategory {
        let total = self.total();
        if !(total > 0.0) {
            return fallback;
        }
        let mut cumulative = 0.0;
        let mut last_positive = fallback;
        for category in ItemCategory::ALL {
            let weight = self.effective(category);
            if weight <= 0.0 {
                continue;
            }
            cumulative += weight;
            last_positive = category;
            if target < cumulative {
                return category;
            }
        }
        last_positive
    }

    pub fn pick(&self, rng: &mut Rng, fallback: ItemCategory) -> ItemCategory {
        let target = rng.next_f64() * self.total();
        self.select_at(target, fallback)
    }
}
