//! Gameplay components.
//!
//! A bug entity is built by adding a single [`Bug`], which adds its own
//! [`Position`], [`Health`] and [`PathFollower`]. A frog entity is a
//! [`Frog`] or a [`PlagueFrog`], each adding its [`Position`]. Lookups for
//! `Frog` also find plague frogs.

mod bug;
mod frog;
mod health;
mod path_follower;
mod position;

pub use bug::{Bug, BugConfig};
pub use frog::{Frog, FrogConfig, FrogState, PlagueFrog};
pub use health::{Death, Health, DEATH};
pub use path_follower::{PathFollower, PathFollowerConfig, MAX_HOPS_PER_TICK};
pub use position::Position;

use croak_ecs::{EcsError, World};

/// Register every gameplay component with `world`.
pub fn register_all(world: &mut World) -> Result<(), EcsError> {
    world.register_component::<Position>()?;
    world.register_component::<Health>()?;
    world.register_component::<PathFollower>()?;
    world.register_component::<Bug>()?;
    world.register_component::<Frog>()?;
    world.register_component::<PlagueFrog>()?;
    Ok(())
}
