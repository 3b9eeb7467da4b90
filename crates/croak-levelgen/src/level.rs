//! Level generation: terrain by wave function collapse, then the bug path.
//!
//! Terrain is a square of cells, each offered land, coast and water. Land
//! may not touch water and water may not touch land (8-neighborhood), while
//! coast only refuses to be surrounded by four or more decided land/water
//! neighbors. The path is then walked through the square; path tiles that
//! fall outside the terrain get empty cells so every path tile has a cell.

use std::cell::RefCell;
use std::rc::Rc;

use croak_core::{Coord, SparseGrid};
use serde::{Deserialize, Serialize};

use crate::path::{Direction, Path, PathBounds, PathGenerator};
use crate::wfc::{CollapseStep, Propagation, Rule, WaveFunctionCollapser};

// ---------------------------------------------------------------------------
// Terrain and rules
// ---------------------------------------------------------------------------

/// Background of a level cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terrain {
    #[serde(rename = "l")]
    Land,
    #[serde(rename = "w")]
    Water,
    #[serde(rename = "c")]
    Coast,
}

impl Terrain {
    /// Single-letter tag: `'l'`, `'w'` or `'c'`.
    pub const fn tag(self) -> char {
        match self {
            Terrain::Land => 'l',
            Terrain::Water => 'w',
            Terrain::Coast => 'c',
        }
    }

    pub const fn from_tag(tag: char) -> Option<Self> {
        match tag {
            'l' => Some(Terrain::Land),
            'w' => Some(Terrain::Water),
            'c' => Some(Terrain::Coast),
            _ => None,
        }
    }
}

pub const NO_ADJACENT_WATER: &str = "no-adjacent-water";
pub const NO_ADJACENT_LAND: &str = "no-adjacent-land";
pub const PREFER_ADJACENT_WATER: &str = "prefer-adjacent-water";
pub const NO_ISLAND: &str = "no-island";
pub const REQUIRE_ADJACENT_WATER: &str = "require-adjacent-water";

/// Decided neighbors of `(x, y)` matching `filter`.
fn count_adjacent<F>(decisions: &SparseGrid<Terrain>, x: i32, y: i32, filter: F) -> usize
where
    F: Fn(Terrain) -> bool,
{
    Coord::new(x, y)
        .neighbors8()
        .filter(|&n| decisions.get_at(n).is_some_and(|&t| filter(t)))
        .count()
}

fn rule<F>(predicate: F) -> Rule<Terrain>
where
    F: Fn(&Terrain, i32, i32, &SparseGrid<Terrain>) -> bool + 'static,
{
    Rc::new(predicate)
}

/// The named terrain rules.
pub fn terrain_rules() -> Vec<(&'static str, Rule<Terrain>)> {
    vec![
        (
            NO_ADJACENT_WATER,
            rule(|_, x, y, d| count_adjacent(d, x, y, |t| t == Terrain::Water) == 0),
        ),
        (
            NO_ADJACENT_LAND,
            rule(|_, x, y, d| count_adjacent(d, x, y, |t| t == Terrain::Land) == 0),
        ),
        (
            PREFER_ADJACENT_WATER,
            rule(|_, x, y, d| count_adjacent(d, x, y, |t| t != Terrain::Water) < 2),
        ),
        (
            NO_ISLAND,
            rule(|_, x, y, d| {
                count_adjacent(d, x, y, |t| matches!(t, Terrain::Water | Terrain::Land)) < 4
            }),
        ),
        (
            REQUIRE_ADJACENT_WATER,
            rule(|_, x, y, d| count_adjacent(d, x, y, |t| t == Terrain::Water) > 0),
        ),
    ]
}

// ---------------------------------------------------------------------------
// Level cells
// ---------------------------------------------------------------------------

/// Something stacked on a level cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Occupant {
    Terrain(Terrain),
    /// A placed entity, by raw entity id.
    Entity(u64),
}

/// One cell of a generated level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCell {
    pub x: i32,
    pub y: i32,
    /// `None` for path tiles outside the terrain square.
    pub background: Option<Terrain>,
    /// Terrain tag first, then placed entities.
    pub stack: Vec<Occupant>,
    pub on_path: bool,
}

impl LevelCell {
    pub fn empty(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            background: None,
            stack: Vec::new(),
            on_path: false,
        }
    }

    /// Whether an entity has been placed here.
    pub fn is_occupied(&self) -> bool {
        self.stack.iter().any(|o| matches!(o, Occupant::Entity(_)))
    }

    /// Raw ids of entities placed here.
    pub fn entities(&self) -> impl Iterator<Item = u64> + '_ {
        self.stack.iter().filter_map(|o| match o {
            Occupant::Entity(id) => Some(*id),
            Occupant::Terrain(_) => None,
        })
    }
}

/// Why a cell cannot take a placement.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    #[error("no level cell at ({x}, {y})")]
    NoCell { x: i32, y: i32 },
    #[error("cell ({x}, {y}) is on the path")]
    OnPath { x: i32, y: i32 },
    #[error("cell ({x}, {y}) is already occupied")]
    Occupied { x: i32, y: i32 },
}

// ---------------------------------------------------------------------------
// LevelConfig
// ---------------------------------------------------------------------------

/// Generation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Terrain covers `[-terrain_radius, terrain_radius]` on both axes.
    pub terrain_radius: i32,
    pub path_start: Coord,
    /// Forced first step of the path.
    pub path_direction: Option<Direction>,
    /// Maximum number of path tiles.
    pub path_length: usize,
    /// The path stays within `[-path_bounds, path_bounds]`.
    pub path_bounds: i32,
    pub propagation: Propagation,
    /// Fixed seed for reproducible levels; random when absent.
    pub seed: Option<u64>,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            terrain_radius: 6,
            path_start: Coord::new(-4, 4),
            path_direction: Some(Direction::Up),
            path_length: 30,
            path_bounds: 5,
            propagation: Propagation::Live,
            seed: None,
        }
    }
}

// ---------------------------------------------------------------------------
// LevelGenerator
// ---------------------------------------------------------------------------

/// Decorrelates the path stream from the terrain stream of the same seed.
const PATH_STREAM: u64 = 0x9E37_79B9_7F4A_7C15;

/// Progress of [`LevelGenerator::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStep {
    Collapsing { remaining: usize },
    Collapsed,
}

/// Incremental level builder.
///
/// Call [`step`](Self::step) once per host tick to spread terrain
/// generation out, then [`finish`](Self::finish) to lay the path.
pub struct LevelGenerator {
    config: LevelConfig,
    seed: u64,
    collapser: WaveFunctionCollapser<Terrain>,
    grid: Rc<RefCell<SparseGrid<LevelCell>>>,
}

impl LevelGenerator {
    pub fn new(config: LevelConfig) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        let mut collapser =
            WaveFunctionCollapser::with_seed(seed).with_propagation(config.propagation);
        for (name, rule) in terrain_rules() {
            collapser.create_rule(name, move |v, x, y, d| rule(v, x, y, d));
        }

        let r = config.terrain_radius;
        for x in -r..=r {
            for y in -r..=r {
                collapser.set_cell(x, y);
                collapser.add_option_to_cell(x, y, Terrain::Land, [NO_ADJACENT_WATER]);
                collapser.add_option_to_cell(x, y, Terrain::Coast, [NO_ISLAND]);
                collapser.add_option_to_cell(x, y, Terrain::Water, [NO_ADJACENT_LAND]);
            }
        }

        let grid = Rc::new(RefCell::new(SparseGrid::new()));
        let sink = Rc::clone(&grid);
        collapser.on_cell_collapse(move |event| {
            let Some(terrain) = event.decision else {
                return;
            };
            let mut grid = sink.borrow_mut();
            if !grid.contains(event.x, event.y) {
                grid.set(event.x, event.y, LevelCell::empty(event.x, event.y));
            }
            if let Some(cell) = grid.get_mut(event.x, event.y) {
                cell.background = Some(terrain);
                cell.stack.push(Occupant::Terrain(terrain));
            }
        });

        tracing::debug!(seed, radius = r, "level generation started");
        Self {
            config,
            seed,
            collapser,
            grid,
        }
    }

    /// One terrain pass.
    pub fn step(&mut self) -> GenerationStep {
        match self.collapser.collapse_step() {
            CollapseStep::Progress { remaining } => GenerationStep::Collapsing { remaining },
            CollapseStep::Complete => GenerationStep::Collapsed,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapser.is_complete()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn collapser(&self) -> &WaveFunctionCollapser<Terrain> {
        &self.collapser
    }

    /// Finish any remaining terrain passes and lay the path.
    pub fn finish(mut self) -> Level {
        self.collapser.collapse();
        let mut grid = std::mem::take(&mut *self.grid.borrow_mut());

        let config = &self.config;
        let mut walker = PathGenerator::with_seed(self.seed ^ PATH_STREAM)
            .with_bounds(PathBounds::symmetric(config.path_bounds));
        let start = config.path_start;
        let path = walker.generate(
            start.x,
            start.y,
            config.path_direction,
            config.path_length,
            Path::new(),
        );

        for &coord in path.coords() {
            if !grid.contains(coord.x, coord.y) {
                grid.set(coord.x, coord.y, LevelCell::empty(coord.x, coord.y));
            }
            if let Some(cell) = grid.get_mut(coord.x, coord.y) {
                cell.on_path = true;
            }
        }

        tracing::debug!(
            seed = self.seed,
            cells = grid.len(),
            path_tiles = path.len(),
            "level generated"
        );
        Level {
            grid,
            path,
            seed: self.seed,
        }
    }

    /// Generate a whole level in one call.
    pub fn generate(config: LevelConfig) -> Level {
        Self::new(config).finish()
    }
}

impl std::fmt::Debug for LevelGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LevelGenerator")
            .field("seed", &self.seed)
            .field("collapser", &self.collapser)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Level
// ---------------------------------------------------------------------------

/// A generated level: cells plus the ordered bug path.
#[derive(Debug, Clone)]
pub struct Level {
    grid: SparseGrid<LevelCell>,
    path: Path,
    seed: u64,
}

impl Level {
    pub fn grid(&self) -> &SparseGrid<LevelCell> {
        &self.grid
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path tiles in traversal order.
    pub fn path_array(&self) -> &[Coord] {
        self.path.coords()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn cell(&self, x: i32, y: i32) -> Option<&LevelCell> {
        self.grid.get(x, y)
    }

    /// Whether a tower may be placed at `(x, y)`.
    pub fn check_placement(&self, x: i32, y: i32) -> Result<(), PlacementError> {
        let cell = self.cell(x, y).ok_or(PlacementError::NoCell { x, y })?;
        if cell.on_path {
            return Err(PlacementError::OnPath { x, y });
        }
        if cell.is_occupied() {
            return Err(PlacementError::Occupied { x, y });
        }
        Ok(())
    }

    /// Stack `entity` on `(x, y)` if placement there is legal.
    pub fn occupy(&mut self, x: i32, y: i32, entity: u64) -> Result<(), PlacementError> {
        self.check_placement(x, y)?;
        let cell = self
            .grid
            .get_mut(x, y)
            .ok_or(PlacementError::NoCell { x, y })?;
        cell.stack.push(Occupant::Entity(entity));
        Ok(())
    }

    /// Remove `entity` from `(x, y)`. Returns whether it was there.
    pub fn vacate(&mut self, x: i32, y: i32, entity: u64) -> bool {
        let Some(cell) = self.grid.get_mut(x, y) else {
            return false;
        };
        match cell.stack.iter().position(|o| *o == Occupant::Entity(entity)) {
            Some(i) => {
                cell.stack.remove(i);
                true
            }
            None => false,
        }
    }

    /// BLAKE3 hex digest of the terrain and path, independent of placed
    /// entities. Equal seeds and configs give equal fingerprints.
    pub fn fingerprint(&self) -> String {
        #[derive(Serialize)]
        struct HashableLevel<'a> {
            terrain: Vec<(Coord, Option<Terrain>)>,
            path: &'a [Coord],
        }

        let hashable = HashableLevel {
            terrain: self
                .grid
                .iter()
                .map(|(coord, cell)| (coord, cell.background))
                .collect(),
            path: self.path.coords(),
        };
        let json_bytes =
            serde_json::to_vec(&hashable).expect("level terrain should always be JSON-serializable");
        blake3::hash(&json_bytes).to_hex().to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
