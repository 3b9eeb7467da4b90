//! Mapping between world space (cell units) and canvas space (pixels).
//!
//! World positions are measured in cells with cell centers on integer
//! coordinates, so snapping a world position to its cell is rounding.

use croak_core::{Coord, Vector2};
use serde::{Deserialize, Serialize};

/// Cell size plus the canvas position of the world origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldGeometry {
    pub cell_size: Vector2,
    /// Canvas point the center of cell `(0, 0)` is drawn at.
    pub origin: Vector2,
}

impl WorldGeometry {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size: Vector2::new(cell_size, cell_size),
            origin: Vector2::ZERO,
        }
    }

    pub fn with_origin(mut self, origin: Vector2) -> Self {
        self.origin = origin;
        self
    }

    pub fn world_to_canvas(&self, world: Vector2) -> Vector2 {
        Vector2::new(
            self.origin.x + world.x * self.cell_size.x,
            self.origin.y + world.y * self.cell_size.y,
        )
    }

    pub fn canvas_to_world(&self, canvas: Vector2) -> Vector2 {
        Vector2::new(
            (canvas.x - self.origin.x) / self.cell_size.x,
            (canvas.y - self.origin.y) / self.cell_size.y,
        )
    }

    /// The cell whose center is nearest to `world`.
    pub fn snap(&self, world: Vector2) -> Coord {
        Coord::new(world.x.round() as i32, world.y.round() as i32)
    }

    pub fn canvas_to_cell(&self, canvas: Vector2) -> Coord {
        self.snap(self.canvas_to_world(canvas))
    }

    /// Canvas position of the center of `cell`.
    pub fn cell_to_canvas(&self, cell: Coord) -> Vector2 {
        self.world_to_canvas(Vector2::from_coord(cell))
    }

    /// Canvas radius of a range given in cells.
    pub fn range_to_canvas(&self, range: f64) -> f64 {
        range * self.cell_size.y
    }
}

impl Default for WorldGeometry {
    fn default() -> Self {
        Self::new(40.0)
    }
}
