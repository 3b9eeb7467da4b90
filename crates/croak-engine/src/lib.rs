//! Croak Engine -- the tower-defense game on top of the Croak crates.
//!
//! This crate builds on [`croak_ecs`] and [`croak_levelgen`] to provide the
//! playable simulation: a fixed-timestep [`TickLoop`](tick::TickLoop), the
//! bug and frog components, the spawn schedule, placement and combat rules
//! in [`Game`], and a hashable [`GameSnapshot`](snapshot::GameSnapshot) for
//! presentation layers and determinism checks.
//!
//! # Quick Start
//!
//! ```
//! use croak_engine::prelude::*;
//!
//! let config = GameConfig { seed: Some(1), ..GameConfig::default() };
//! let mut game = Game::new(config).unwrap();
//! let mut tick_loop = TickLoop::new(TickConfig::default());
//!
//! // Terrain collapses one pass per tick, then play begins.
//! while game.phase() == Phase::Generating {
//!     game.update(&tick_loop.tick());
//! }
//! assert_eq!(game.phase(), Phase::Playing);
//!
//! // The first playing tick spawns a bug.
//! game.update(&tick_loop.tick());
//! assert_eq!(game.bugs().len(), 1);
//! ```

#![deny(unsafe_code)]

pub mod components;
pub mod config;
pub mod events;
pub mod game;
pub mod geometry;
pub mod snapshot;
pub mod spawner;
pub mod tick;

pub use config::{BugType, ConfigError, FrogType, FrogVariant, GameConfig, SpawnConfig};
pub use events::{AttackMode, EventQueue, GameEvent, Phase, ShopItem};
pub use game::{Game, GameError, PendingFrog};
pub use geometry::WorldGeometry;
pub use snapshot::{BugView, FrogView, GameSnapshot};
pub use spawner::Spawner;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the core crate for convenience.
pub use croak_core;

/// Re-export the ECS crate for convenience.
pub use croak_ecs;

/// Re-export the level generation crate for convenience.
pub use croak_levelgen;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    pub use croak_core::prelude::*;
    pub use croak_ecs::prelude::*;
    pub use croak_levelgen::prelude::*;

    pub use crate::components::{Bug, Frog, FrogState, Health, PathFollower, PlagueFrog, Position};
    pub use crate::config::{BugType, FrogType, FrogVariant, GameConfig, SpawnConfig};
    pub use crate::events::{AttackMode, GameEvent, Phase};
    pub use crate::game::{Game, GameError};
    pub use crate::geometry::WorldGeometry;
    pub use crate::snapshot::GameSnapshot;
    pub use crate::tick::{Tick, TickConfig, TickLoop};
}
