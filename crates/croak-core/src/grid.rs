//! Sparse two-dimensional grid keyed by integer coordinates.
//!
//! A [`SparseGrid`] is a two-level map `x -> (y -> V)`. Only occupied
//! coordinates consume memory, so it is equally suited to a bounded terrain
//! square, a thin snake-like path or an unbounded world.
//!
//! Rows are never left empty: removing the last entry of a column also drops
//! the column, so a grid that has had every entry removed reports zero rows.
//!
//! Both levels are ordered maps. Enumeration therefore visits columns in
//! ascending `x` and, within a column, entries in ascending `y`. Callers must
//! not rely on any particular order, but the order is stable across runs,
//! which keeps seeded generation reproducible.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Coord
// ---------------------------------------------------------------------------

/// An integer grid coordinate.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Coord {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Coord {
    /// Construct a coordinate.
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// This coordinate shifted by `(dx, dy)`.
    #[inline]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// The eight surrounding coordinates (orthogonal and diagonal), column
    /// by column.
    pub fn neighbors8(self) -> impl Iterator<Item = Coord> {
        (-1..=1).flat_map(move |dx| {
            (-1..=1)
                .filter(move |&dy| !(dx == 0 && dy == 0))
                .map(move |dy| self.offset(dx, dy))
        })
    }
}

impl fmt::Debug for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for Coord {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

// ---------------------------------------------------------------------------
// SparseGrid
// ---------------------------------------------------------------------------

/// Sparse associative map from `(x, y)` to `V`.
#[derive(Clone, PartialEq, Eq)]
pub struct SparseGrid<V> {
    rows: BTreeMap<i32, BTreeMap<i32, V>>,
    len: usize,
}

impl<V> SparseGrid<V> {
    /// Create an empty grid.
    pub fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            len: 0,
        }
    }

    /// Insert or replace the value at `(x, y)`.
    ///
    /// Returns `self` so that writes can be chained.
    pub fn set(&mut self, x: i32, y: i32, value: V) -> &mut Self {
        if self.rows.entry(x).or_default().insert(y, value).is_none() {
            self.len += 1;
        }
        self
    }

    /// The value stored at `(x, y)`, if any.
    pub fn get(&self, x: i32, y: i32) -> Option<&V> {
        self.rows.get(&x)?.get(&y)
    }

    /// Mutable access to the value stored at `(x, y)`, if any.
    pub fn get_mut(&mut self, x: i32, y: i32) -> Option<&mut V> {
        self.rows.get_mut(&x)?.get_mut(&y)
    }

    /// The value at `coord`, if any.
    pub fn get_at(&self, coord: Coord) -> Option<&V> {
        self.get(coord.x, coord.y)
    }

    /// Whether a value is stored at `(x, y)`.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.get(x, y).is_some()
    }

    /// Remove and return the value at `(x, y)`.
    ///
    /// Absent coordinates are a no-op. Removing the last entry of a column
    /// drops the column as well.
    pub fn remove(&mut self, x: i32, y: i32) -> Option<V> {
        let row = self.rows.get_mut(&x)?;
        let removed = row.remove(&y)?;
        if row.is_empty() {
            self.rows.remove(&x);
        }
        self.len -= 1;
        Some(removed)
    }

    /// Visit every entry as `visitor(value, x, y)`.
    pub fn for_each<F>(&self, mut visitor: F)
    where
        F: FnMut(&V, i32, i32),
    {
        for (&x, row) in &self.rows {
            for (&y, value) in row {
                visitor(value, x, y);
            }
        }
    }

    /// Iterate over `(coord, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Coord, &V)> + '_ {
        self.rows
            .iter()
            .flat_map(|(&x, row)| row.iter().map(move |(&y, v)| (Coord::new(x, y), v)))
    }

    /// Iterate mutably over `(coord, value)` pairs.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Coord, &mut V)> + '_ {
        self.rows
            .iter_mut()
            .flat_map(|(&x, row)| row.iter_mut().map(move |(&y, v)| (Coord::new(x, y), v)))
    }

    /// All occupied coordinates.
    pub fn keys(&self) -> Vec<Coord> {
        self.iter().map(|(coord, _)| coord).collect()
    }

    /// All stored values.
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.rows.values().flat_map(|row| row.values())
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the grid holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of non-empty columns.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Remove every entry and every column.
    pub fn clear(&mut self) -> &mut Self {
        self.rows.clear();
        self.len = 0;
        self
    }
}

impl<V> Default for SparseGrid<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: fmt::Debug> fmt::Debug for SparseGrid<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<V> FromIterator<(Coord, V)> for SparseGrid<V> {
    fn from_iter<I: IntoIterator<Item = (Coord, V)>>(iter: I) -> Self {
        let mut grid = Self::new();
        for (coord, value) in iter {
            grid.set(coord.x, coord.y, value);
        }
        grid
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
