//! Croak ECS -- behavior-object Entity Component System.
//!
//! Entities own boxed component objects, at most one per registered
//! component name. The [`World`] schedules them: every tick each active,
//! non-destroyed entity has each of its components updated once, in
//! insertion order. Generational entity IDs give immediate stale-reference
//! detection.
//!
//! Component types come in two halves. [`Component`] is the object-safe
//! per-tick behavior. [`ComponentType`] is the static part: a registration
//! name, a typed `Config` the call site supplies instead of loose arguments,
//! optional base types for is-a lookups, and the `pre_update` constructor.
//!
//! # Quick Start
//!
//! ```
//! use croak_ecs::prelude::*;
//!
//! struct Health {
//!     health: f64,
//! }
//!
//! impl Component for Health {}
//!
//! impl ComponentType for Health {
//!     const NAME: &'static str = "health";
//!     type Config = f64;
//!     fn pre_update(_cx: &mut Context<'_>, health: f64) -> Self {
//!         Health { health }
//!     }
//! }
//!
//! let mut world = World::new();
//! world.register_component::<Health>().unwrap();
//!
//! let entity = world.create_entity();
//! world.add_component::<Health>(entity, 5.0).unwrap();
//! assert_eq!(world.get_component::<Health>(entity).unwrap().health, 5.0);
//!
//! // At most one component per type.
//! assert!(world.add_component::<Health>(entity, 1.0).is_err());
//! assert_eq!(world.get_component::<Health>(entity).unwrap().health, 5.0);
//! ```

#![deny(unsafe_code)]

pub mod component;
pub mod context;
pub mod entity;
pub mod world;

pub use component::{AsAny, Component, ComponentInfo, ComponentRegistry, ComponentType, ComponentTypeId};
pub use context::Context;
pub use entity::{ComponentMap, Entity, EntityAllocator, EntityId};
pub use world::World;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by ECS operations.
#[derive(Debug, thiserror::Error)]
pub enum EcsError {
    /// The entity does not exist (stale generation, pruned or never allocated).
    #[error("entity {entity:?} does not exist (stale or never allocated)")]
    StaleEntity { entity: EntityId },

    /// The entity has been destroyed and accepts no further components.
    #[error("entity {entity:?} is destroyed")]
    EntityDestroyed { entity: EntityId },

    /// A component name was referenced that has not been registered.
    #[error("component type '{name}' not registered. Registered components: [{registered}]")]
    UnknownComponent { name: String, registered: String },

    /// A Rust component type was used without being registered.
    #[error("component type {type_name} not registered")]
    UnregisteredType { type_name: String },

    /// The entity already holds a component under this name.
    #[error("entity {entity:?} already has a '{name}' component")]
    DuplicateComponent { entity: EntityId, name: String },

    /// The name is already registered for a different Rust type.
    #[error("component name '{name}' is already registered for a different type")]
    NameConflict { name: String },

    /// A name-based add received a config of the wrong type.
    #[error("config passed for component '{name}' has the wrong type")]
    ConfigMismatch { name: String },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::component::{Component, ComponentRegistry, ComponentType, ComponentTypeId};
    pub use crate::context::Context;
    pub use crate::entity::{Entity, EntityId};
    pub use crate::world::World;
    pub use crate::EcsError;
}
