use std::collections::{BTreeMap, HashSet};

use crate::catalog::ItemCatalog;
use crate::config::SpawnerConfig;
use crate::rng::Rng;
use crate::types::{Cell, ItemCategory, Placement, Vec3};

mod grid;
mod placement;
mod selection;

pub use self::grid::SpawnGrid;
pub use self::selection::CategoryWeights;

#[derive(Clone, Debug, PartialEq)]
pub enum SpawnOutcome {
    Placed(Placement),
    /// Every retry hit an occupied cell.
    Exhausted,
    /// The drawn category has no catalog definition.
    Skipped(ItemCategory),
}

impl SpawnOutcome {
    pub fn placement(&self) -> Option<&Placement> {
        match self {
            SpawnOutcome::Placed(placement) => Some(placement),
            _ => None,
        }
    }
}

/// Places collectibles on a grid so no two live items share a cell.
#[derive(Clone, Debug)]
pub struct Spawner {
    config: SpawnerConfig,
    grid: SpawnGrid,
    catalog: ItemCatalog,
    weights: CategoryWeights,
    rng: Rng,
    occupied: HashSet<Cell>,
    live: BTreeMap<u64, Placement>,
    anchor: Vec3,
    spawn_accumulator_ms: u64,
    next_id: u64,
}

impl Spawner {
    pub fn new(config: SpawnerConfig, catalog: ItemCatalog, seed: u32) -> Self {
        let grid = SpawnGrid::new(config.radius, config.spacing);
        let weights = config.weights;
        let anchor = Vec3::new(0.0, 0.0, config.reference_depth);
        Self {
            config,
            grid,
            catalog,
            weights,
            rng: Rng::new(seed),
            occupied: HashSet::new(),
            live: BTreeMap::new(),
            anchor,
            spawn_accumulator_ms: 0,
            next_id: 1,
        }
    }

    pub fn grid(&self) -> &SpawnGrid {
        &self.grid
    }

    pub fn config(&self) -> &SpawnerConfig {
        &self.config
    }

    pub fn weights(&self) -> CategoryWeights {
        self.weights
    }

    /// Takes effect for placements drawn after the call.
    pub fn set_weights(&mut self, weights: CategoryWeights) {
        self.weights = weights;
    }

    pub fn anchor(&self) -> Vec3 {
        self.anchor
    }

    /// Moves the reference depth to the anchor's depth and lifts the height
    /// band so it starts at the anchor's height. Existing placements stay put.
    pub fn recentre(&mut self, anchor: Vec3) {
        self.anchor = anchor;
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn occupied_count(&self) -> usize {
        self.occupied.len()
    }

    pub fn is_occupied(&self, cell: Cell) -> bool {
        self.occupied.contains(&cell)
    }

    pub fn placements(&self) -> impl Iterator<Item = &Placement> {
        self.live.values()
    }

    /// Clears every placement and re-derives the initial batch.
    pub fn reset_spawner(&mut self) -> Vec<Placement> {
        self.occupied.clear();
        self.live.clear();
        self.spawn_accumulator_ms = 0;
        let placed = self.populate(self.config.initial_count);
        log::info!(
            "[spawner] reset: placed {} of {} requested ({} cells)",
            placed.len(),
            self.config.initial_count,
            self.grid.capacity()
        );
        placed
    }

    /// Advances the spawn clock. Attempts at most one incremental spawn per
    /// elapsed interval, and only while `live_items` is under the cap.
    pub fn tick(&mut self, dt_ms: u64, live_items: usize) -> Option<SpawnOutcome> {
        self.spawn_accumulator_ms = self.spawn_accumulator_ms.saturating_add(dt_ms);
        if self.spawn_accumulator_ms < self.config.spawn_interval_ms {
            return None;
        }
        self.spawn_accumulator_ms = 0;
        if live_items >= self.config.max_items {
            return None;
        }
        Some(self.try_spawn_one())
    }

    pub fn collect(&mut self, id: u64) -> Option<Placement> {
        let placement = self.live.remove(&id)?;
        self.occupied.remove(&placement.cell);
        Some(placement)
    }

    /// Drops placements below `height`, freeing their cells.
    pub fn retire_below(&mut self, height: f32) -> usize {
        let retired: Vec<u64> = self
            .live
            .values()
            .filter(|placement| placement.position.y < height)
            .map(|placement| placement.id)
            .collect();
        for id in &retired {
            self.collect(*id);
        }
        retired.len()
    }
}
