use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    Gold,
    Fuel,
    Energy,
    Metal,
}

impl ItemCategory {
    /// Declaration order; weighted selection walks categories in this order.
    pub const ALL: [ItemCategory; 4] = [
        ItemCategory::Gold,
        ItemCategory::Fuel,
        ItemCategory::Energy,
        ItemCategory::Metal,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::Gold => 0,
            Self::Fuel => 1,
            Self::Energy => 2,
            Self::Metal => 3,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Gold => "gold",
            Self::Fuel => "fuel",
            Self::Energy => "energy",
            Self::Metal => "metal",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeKind {
    FuelTank,
    Engine,
    Efficiency,
    GoldMagnet,
    FuelScanner,
}

impl UpgradeKind {
    pub const ALL: [UpgradeKind; 5] = [
        UpgradeKind::FuelTank,
        UpgradeKind::Engine,
        UpgradeKind::Efficiency,
        UpgradeKind::GoldMagnet,
        UpgradeKind::FuelScanner,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "fuel_tank" => Some(Self::FuelTank),
            "engine" => Some(Self::Engine),
            "efficiency" => Some(Self::Efficiency),
            "gold_magnet" => Some(Self::GoldMagnet),
            "fuel_scanner" => Some(Self::FuelScanner),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunEnd {
    Crashed,
    OutOfFuel,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Spawn grid cell as (column, row).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Cell {
    pub col: i32,
    pub row: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDefinition {
    pub category: ItemCategory,
    pub amount: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Placement {
    pub id: u64,
    pub cell: Cell,
    pub position: Vec3,
    pub category: ItemCategory,
    pub item: ItemDefinition,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpgradeCost {
    pub gold: u32,
    pub metal: u32,
    pub energy: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    SpawnerReset {
        placed: usize,
    },
    ItemSpawned {
        #[serde(rename = "itemId")]
        item_id: u64,
        category: ItemCategory,
    },
    ItemCollected {
        #[serde(rename = "itemId")]
        item_id: u64,
        category: ItemCategory,
        amount: u32,
    },
    FuelLow {
        fuel: f32,
    },
    RunEnded {
        reason: RunEnd,
        height: f32,
    },
    NewBestHeight {
        height: f32,
    },
    UpgradePurchased {
        kind: UpgradeKind,
        level: u8,
    },
    WalletChanged {
        gold: u32,
        metal: u32,
        energy: u32,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    #[serde(rename = "elapsedMs")]
    pub elapsed_ms: u64,
    pub height: f32,
    pub x: f32,
    pub fuel: f32,
    #[serde(rename = "fuelCapacity")]
    pub fuel_capacity: f32,
    #[serde(rename = "liveItems")]
    pub live_items: usize,
    #[serde(rename = "bestHeight")]
    pub best_height: f32,
    pub gold: u32,
    pub metal: u32,
    pub energy: u32,
    #[serde(rename = "runEnd")]
    pub run_end: Option<RunEnd>,
    pub events: Vec<GameEvent>,
}
