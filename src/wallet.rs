use serde::{Deserialize, Serialize};

use crate::types::{ItemCategory, UpgradeCost};

/// Banked resources. Fuel is burned in flight and never banked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub gold: u32,
    pub metal: u32,
    pub energy: u32,
}

impl Wallet {
    /// Returns false for categories that are not banked.
    pub fn deposit(&mut self, category: ItemCategory, amount: u32) -> bool {
        match category {
            ItemCategory::Gold => self.gold = self.gold.saturating_add(amount),
            ItemCategory::Metal => self.metal = self.metal.saturating_add(amount),
            ItemCategory::Energy => self.energy = self.energy.saturating_add(amount),
            ItemCategory::Fuel => return false,
        }
        true
    }

    pub fn can_afford(&self, cost: &UpgradeCost) -> bool {
        self.gold >= cost.gold && self.metal >= cost.metal && self.energy >= cost.energy
    }

    pub fn spend(&mut self, cost: &UpgradeCost) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        self.gold -= cost.gold;
        self.metal -= cost.metal;
        self.energy -= cost.energy;
        true
    }
}
