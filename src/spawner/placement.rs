use super::*;

impl Spawner {
    /// Places up to `count` items on distinct free cells, drawn in shuffled
    /// order. Requests beyond the free capacity are silently capped.
    pub fn populate(&mut self, count: usize) -> Vec<Placement> {
        let mut candidates: Vec<Cell> = self
            .grid
            .cells()
            .filter(|cell| !self.occupied.contains(cell))
            .collect();
        self.rng.shuffle(&mut candidates);

        let take = count.min(candidates.len());
        let mut placed = Vec::with_capacity(take);
        for cell in candidates.into_iter().take(take) {
            if let SpawnOutcome::Placed(placement) = self.place_at(cell) {
                placed.push(placement);
            }
        }
        placed
    }

    /// Tries up to `retry_budget` random cells and places on the first free
    /// one. Under high occupancy this fails often; callers just skip a tick.
    pub fn try_spawn_one(&mut self) -> SpawnOutcome {
        if self.grid.capacity() > 0 {
            for _ in 0..self.config.retry_budget {
                let cell = Cell {
                    col: self.rng.pick_index(self.grid.side() as usize) as i32,
                    row: self.rng.pick_index(self.grid.side() as usize) as i32,
                };
                if self.occupied.contains(&cell) {
                    continue;
                }
                return self.place_at(cell);
            }
        }
        log::debug!(
            "[spawner] no free cell after {} tries ({} occupied)",
            self.config.retry_budget,
            self.occupied.len()
        );
        SpawnOutcome::Exhausted
    }

    fn place_at(&mut self, cell: Cell) -> SpawnOutcome {
        let category = self.weights.pick(&mut self.rng, self.config.default_category);
        let Some(item) = self.catalog.get(category) else {
            log::warn!(
                "[spawner] no item definition for {}; skipping cell ({}, {})",
                category.key(),
                cell.col,
                cell.row
            );
            return SpawnOutcome::Skipped(category);
        };

        let height = self
            .rng
            .range_f32(self.config.min_height, self.config.max_height);
        let placement = Placement {
            id: self.next_id,
            cell,
            position: Vec3 {
                x: self.grid.lateral_x(cell),
                y: self.anchor.y + height,
                z: self.anchor.z,
            },
            category,
            item,
        };
        self.next_id += 1;
        self.occupied.insert(cell);
        self.live.insert(placement.id, placement.clone());
        SpawnOutcome::Placed(placement)
    }
}
