//! Croak Levelgen -- procedural terrain and bug paths.
//!
//! Three layers, each usable on its own:
//!
//! - [`wfc`]: a generic, seedable wave function collapser over a
//!   [`SparseGrid`](croak_core::SparseGrid), with named or inline rule
//!   predicates and a `cellcollapse` notification per decided cell.
//! - [`path`]: a recursive random walk that lays a non-touching route
//!   inside a bounding box.
//! - [`level`]: land/coast/water terrain rules on top of the collapser,
//!   plus the path, assembled into a placement-checked [`Level`].
//!
//! # Quick Start
//!
//! ```
//! use croak_levelgen::prelude::*;
//!
//! let config = LevelConfig {
//!     seed: Some(7),
//!     ..LevelConfig::default()
//! };
//! let level = LevelGenerator::generate(config.clone());
//!
//! // Every path tile has a cell, and towers may not be placed on it.
//! let start = level.path_array()[0];
//! assert!(level.cell(start.x, start.y).unwrap().on_path);
//! assert!(level.check_placement(start.x, start.y).is_err());
//!
//! // Seeds make generation reproducible.
//! assert_eq!(
//!     LevelGenerator::generate(config).fingerprint(),
//!     level.fingerprint()
//! );
//! ```

#![deny(unsafe_code)]

pub mod level;
pub mod path;
pub mod wfc;

pub use level::{
    terrain_rules, GenerationStep, Level, LevelCell, LevelConfig, LevelGenerator, Occupant,
    PlacementError, Terrain,
};
pub use path::{Direction, Path, PathBounds, PathGenerator};
pub use wfc::{
    Cell, CellCollapse, CellOption, CollapseStep, Propagation, Rule, RuleRef,
    WaveFunctionCollapser, CELL_COLLAPSE,
};

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::level::{Level, LevelConfig, LevelGenerator, PlacementError, Terrain};
    pub use crate::path::{Direction, Path, PathGenerator};
    pub use crate::wfc::{CollapseStep, Propagation, RuleRef, WaveFunctionCollapser};
}
