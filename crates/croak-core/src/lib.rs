//! Croak Core -- shared building blocks for the Croak simulation.
//!
//! This crate holds the leaf types every other Croak crate builds on:
//!
//! - [`SparseGrid`]: a sparse 2D map from integer [`Coord`]s to arbitrary
//!   payloads. It backs terrain storage, generated paths and the per-cell
//!   state of the wave function collapser.
//! - [`EventBus`]: a synchronous, re-entrant-safe publish/subscribe registry
//!   keyed by event name.
//! - [`Vector2`] and the [`LinearCurve`]/[`BilinearCurve`] helpers used for
//!   world positions, targeting and movement.
//!
//! # Quick Start
//!
//! ```
//! use croak_core::prelude::*;
//!
//! let mut grid = SparseGrid::new();
//! grid.set(1, 2, 'a');
//! assert_eq!(grid.get(1, 2), Some(&'a'));
//! grid.remove(1, 2);
//! assert_eq!(grid.get(1, 2), None);
//! assert_eq!(grid.row_count(), 0);
//! ```

#![deny(unsafe_code)]

pub mod events;
pub mod grid;
pub mod vector;

pub use events::{Callback, EventBus, NamedEvent, SubscribeOptions};
pub use grid::{Coord, SparseGrid};
pub use vector::{BilinearCurve, LinearCurve, Vector2};

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::events::{Callback, EventBus, NamedEvent, SubscribeOptions};
    pub use crate::grid::{Coord, SparseGrid};
    pub use crate::vector::{BilinearCurve, LinearCurve, Vector2};
}
