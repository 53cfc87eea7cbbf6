use crate::constants::get_grid_side;
use crate::types::Cell;

/// Square spawn region of side `2 * radius` split into `spacing` cells.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnGrid {
    side: i32,
    spacing: f32,
    half_extent: f32,
}

impl SpawnGrid {
    pub fn new(radius: f32, spacing: f32) -> Self {
        let side = get_grid_side(radius, spacing);
        Self {
            side,
            spacing,
            half_extent: side as f32 * spacing / 2.0,
        }
    }

    pub fn side(&self) -> i32 {
        self.side
    }

    pub fn capacity(&self) -> usize {
        (self.side.max(0) as usize).pow(2)
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.col >= 0 && cell.row >= 0 && cell.col < self.side && cell.row < self.side
    }

    /// Row-major enumeration of every cell.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.side).flat_map(move |row| (0..self.side).map(move |col| Cell { col, row }))
    }

    pub fn lateral_x(&self, cell: Cell) -> f32 {
        cell.col as f32 * self.spacing - self.half_extent
    }
}
