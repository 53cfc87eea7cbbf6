use crate::types::ItemCategory;

pub const TICK_RATE: u32 = 20;
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;

pub const SPAWN_RADIUS: f32 = 500.0;
pub const SPAWN_SPACING: f32 = 50.0;
pub const SPAWN_MIN_HEIGHT: f32 = 20.0;
pub const SPAWN_MAX_HEIGHT: f32 = 400.0;
pub const SPAWN_REFERENCE_DEPTH: f32 = 0.0;
pub const INITIAL_ITEM_COUNT: usize = 120;
pub const MAX_LIVE_ITEMS: usize = 160;
pub const SPAWN_INTERVAL_MS: u64 = 500;
pub const SPAWN_RETRY_BUDGET: u32 = 10;
pub const MAX_GRID_CELLS: i64 = 250_000;
pub const DEFAULT_CATEGORY: ItemCategory = ItemCategory::Gold;

pub const GOLD_WEIGHT: f64 = 0.5;
pub const FUEL_WEIGHT: f64 = 0.4;
pub const ENERGY_WEIGHT: f64 = 0.05;
pub const METAL_WEIGHT: f64 = 0.05;

pub const GOLD_REWARD: u32 = 5;
pub const FUEL_REWARD: u32 = 25;
pub const ENERGY_REWARD: u32 = 2;
pub const METAL_REWARD: u32 = 3;

pub const FUEL_CAPACITY: f32 = 100.0;
pub const FUEL_BURN_PER_SEC: f32 = 8.0;
pub const CLIMB_PER_SEC: f32 = 40.0;
pub const LATERAL_PER_SEC: f32 = 120.0;
pub const LOW_FUEL_RATIO: f32 = 0.2;
pub const PICKUP_RADIUS: f32 = 30.0;

pub const UPGRADE_MAX_LEVEL: u8 = 5;
pub const UPGRADE_COST_GROWTH: f64 = 1.6;

pub const FUEL_TANK_BONUS_PER_LEVEL: f32 = 0.20;
pub const ENGINE_BONUS_PER_LEVEL: f32 = 0.15;
pub const EFFICIENCY_CUT_PER_LEVEL: f32 = 0.08;
pub const EFFICIENCY_FLOOR: f32 = 0.4;
pub const WEIGHT_BONUS_PER_LEVEL: f64 = 0.25;

/// Grid side for a square of side `2 * radius` split into `spacing` cells.
pub fn get_grid_side(radius: f32, spacing: f32) -> i32 {
    if !(radius > 0.0) || !(spacing > 0.0) {
        return 0;
    }
    (2.0 * radius / spacing).ceil() as i32
}
