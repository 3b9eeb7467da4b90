//! Recursive, direction-biased random walk that lays the bug route.
//!
//! Each step places the current tile, filters the candidate directions and
//! recurses on a uniformly chosen survivor. A candidate next tile is
//! rejected when it leaves the bounds, is already on the path, or touches
//! the path at any orthogonal neighbor other than the tile it steps from.
//! The result is a snake with no loops and no two-wide corridors: two tiles
//! are orthogonally adjacent only if they are consecutive.
//!
//! Running out of legal directions ends the walk early. A short path is a
//! normal outcome.

use croak_core::{Coord, SparseGrid};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Axis-aligned step. `Up` is toward negative `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// `(dx, dy)` of one step.
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub const fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    /// The two directions across this one's axis.
    pub const fn perpendicular(self) -> [Direction; 2] {
        if self.is_horizontal() {
            [Direction::Up, Direction::Down]
        } else {
            [Direction::Left, Direction::Right]
        }
    }

    /// `coord` moved one step this way.
    pub fn step(self, coord: Coord) -> Coord {
        let (dx, dy) = self.offset();
        coord.offset(dx, dy)
    }
}

// ---------------------------------------------------------------------------
// Path
// ---------------------------------------------------------------------------

/// Membership grid plus construction order of the placed tiles.
///
/// The grid stores each tile's position in the walk, so lookups by
/// coordinate and traversal in walk order are both cheap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path {
    tiles: SparseGrid<usize>,
    order: Vec<Coord>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `coord`. Returns `false`, leaving the path unchanged, if it
    /// is already on the path.
    pub fn push(&mut self, coord: Coord) -> bool {
        if self.tiles.contains(coord.x, coord.y) {
            return false;
        }
        self.tiles.set(coord.x, coord.y, self.order.len());
        self.order.push(coord);
        true
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.tiles.contains(x, y)
    }

    /// Position of `(x, y)` in walk order.
    pub fn index_of(&self, x: i32, y: i32) -> Option<usize> {
        self.tiles.get(x, y).copied()
    }

    /// Tiles in walk order.
    pub fn coords(&self) -> &[Coord] {
        &self.order
    }

    pub fn grid(&self) -> &SparseGrid<usize> {
        &self.tiles
    }

    pub fn first(&self) -> Option<Coord> {
        self.order.first().copied()
    }

    pub fn last(&self) -> Option<Coord> {
        self.order.last().copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

// ---------------------------------------------------------------------------
// PathBounds
// ---------------------------------------------------------------------------

/// Inclusive box every step must stay within.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathBounds {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl PathBounds {
    /// `[-radius, radius]` on both axes.
    pub const fn symmetric(radius: i32) -> Self {
        Self {
            min_x: -radius,
            max_x: radius,
            min_y: -radius,
            max_y: radius,
        }
    }

    pub fn contains(&self, coord: Coord) -> bool {
        (self.min_x..=self.max_x).contains(&coord.x) && (self.min_y..=self.max_y).contains(&coord.y)
    }
}

impl Default for PathBounds {
    fn default() -> Self {
        Self::symmetric(5)
    }
}

// ---------------------------------------------------------------------------
// PathGenerator
// ---------------------------------------------------------------------------

/// Seedable random-walk path builder.
#[derive(Debug, Clone)]
pub struct PathGenerator {
    bounds: PathBounds,
    rng: Pcg64,
}

impl PathGenerator {
    /// A generator seeded from system entropy, with the default bounds.
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            bounds: PathBounds::default(),
            rng: Pcg64::seed_from_u64(seed),
        }
    }

    pub fn with_bounds(mut self, bounds: PathBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn bounds(&self) -> PathBounds {
        self.bounds
    }

    /// Extend `path` with at most `length` tiles, starting by placing
    /// `(x, y)`.
    ///
    /// A forced `direction` restricts only the first step; later steps
    /// consider all four directions. `length == 0` returns `path` unchanged.
    pub fn generate(
        &mut self,
        x: i32,
        y: i32,
        direction: Option<Direction>,
        length: usize,
        mut path: Path,
    ) -> Path {
        if length == 0 {
            return path;
        }

        let current = Coord::new(x, y);
        path.push(current);

        let candidates = self.candidates(current, direction, &path);
        if candidates.is_empty() {
            tracing::trace!(tiles = path.len(), short_by = length - 1, "path walk stuck");
            return path;
        }
        let chosen = candidates[self.rng.gen_range(0..candidates.len())];
        let next = chosen.step(current);
        self.generate(next.x, next.y, None, length - 1, path)
    }

    /// Directions from `current` whose next tile is legal, in
    /// [`Direction::ALL`] order (or just `forced`, if legal).
    pub fn candidates(
        &self,
        current: Coord,
        forced: Option<Direction>,
        path: &Path,
    ) -> Vec<Direction> {
        let pool: &[Direction] = match &forced {
            Some(direction) => std::slice::from_ref(direction),
            None => &Direction::ALL,
        };
        pool.iter()
            .copied()
            .filter(|&direction| self.is_legal_step(current, direction, path))
            .collect()
    }

    fn is_legal_step(&self, current: Coord, direction: Direction, path: &Path) -> bool {
        let next = direction.step(current);
        if !self.bounds.contains(next) || path.contains(next.x, next.y) {
            return false;
        }
        // Probe ahead and to both sides; behind is `current`.
        std::iter::once(direction)
            .chain(direction.perpendicular())
            .map(|probe| probe.step(next))
            .all(|test| test == current || !path.contains(test.x, test.y))
    }
}

impl Default for PathGenerator {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn orthogonally_adjacent(a: Coord, b: Coord) -> bool {
        (a.x - b.x).abs() + (a.y - b.y).abs() == 1
    }

    #[test]
    fn zero_length_returns_accumulator() {
        let mut generator = PathGenerator::with_seed(1);
        let path = generator.generate(0, 0, None, 0, Path::new());
        assert!(path.is_empty());
    }

    #[test]
    fn tiny_box_terminates() {
        for seed in 0..32 {
            let mut generator = PathGenerator::with_seed(seed).with_bounds(PathBounds::symmetric(1));
            let path = generator.generate(0, 0, None, 50, Path::new());
            assert!(!path.is_empty());
            assert!(path.len() <= 9, "seed {seed}: {} tiles", path.len());
        }
    }

    #[test]
    fn forced_direction_sets_first_step() {
        let mut generator = PathGenerator::with_seed(3);
        let path = generator.generate(-4, 4, Some(Direction::Up), 30, Path::new());
        assert_eq!(path.first(), Some(Coord::new(-4, 4)));
        assert_eq!(path.coords()[1], Coord::new(-4, 3));
    }

    #[test]
    fn forced_direction_out_of_bounds_stops() {
        let mut generator = PathGenerator::with_seed(3);
        let path = generator.generate(0, -5, Some(Direction::Up), 10, Path::new());
        assert_eq!(path.coords(), &[Coord::new(0, -5)]);
    }

    #[test]
    fn only_consecutive_tiles_touch() {
        for seed in 0..64 {
            let mut generator = PathGenerator::with_seed(seed);
            let path = generator.generate(-4, 4, Some(Direction::Up), 30, Path::new());
            assert!(path.len() <= 30);
            let tiles = path.coords();
            for (i, &a) in tiles.iter().enumerate() {
                assert_eq!(path.index_of(a.x, a.y), Some(i));
                for (j, &b) in tiles.iter().enumerate().skip(i + 1) {
                    assert_eq!(
                        orthogonally_adjacent(a, b),
                        j == i + 1,
                        "seed {seed}: tiles {i} {a:?} and {j} {b:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn candidates_respect_adjacency() {
        let mut path = Path::new();
        for coord in [(0, 0), (1, 0), (1, 1)] {
            path.push(coord.into());
        }
        let generator = PathGenerator::with_seed(0);
        // From (1, 1): left lands on (0, 1), which touches (0, 0).
        let options = generator.candidates(Coord::new(1, 1), None, &path);
        assert_eq!(options, vec![Direction::Down, Direction::Right]);
    }
}
