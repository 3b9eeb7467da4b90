//! Component behavior traits, type registration and metadata.
//!
//! A component is a boxed behavior object owned by exactly one entity. Every
//! component type must be registered in a [`ComponentRegistry`] before any
//! entity may be given an instance of it. Registration records the type's
//! name, its declared base types (for is-a lookups) and a type-erased
//! constructor used by name-based adds.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use crate::context::Context;
use crate::EcsError;

// ---------------------------------------------------------------------------
// Behavior traits
// ---------------------------------------------------------------------------

/// Upcast to `dyn Any`, implemented for every `'static` type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Per-tick behavior of a component instance.
///
/// Object-safe half of the component contract. The scheduler calls
/// [`update`](Component::update) once per tick while the owning entity is
/// active and not destroyed, and [`on_destroy`](Component::on_destroy) exactly
/// once when the entity is destroyed.
pub trait Component: AsAny {
    /// Advance one tick. `cx` exposes the tick timing and the sibling
    /// components of the owning entity.
    fn update(&mut self, _cx: &mut Context<'_>) {}

    /// Teardown hook.
    fn on_destroy(&mut self) {}

    /// View `self` as the base type identified by `base`.
    ///
    /// Types that list bases in [`ComponentType::bases`] return the embedded
    /// base value here. The default has no bases.
    fn upcast(&self, _base: TypeId) -> Option<&dyn Any> {
        None
    }

    /// Mutable counterpart of [`upcast`](Component::upcast).
    fn upcast_mut(&mut self, _base: TypeId) -> Option<&mut dyn Any> {
        None
    }
}

/// Static half of the component contract: naming, configuration and
/// construction.
///
/// `Config` replaces untyped initializer arguments. The call site adding the
/// component supplies it and [`pre_update`](ComponentType::pre_update) turns it
/// into the live instance. `pre_update` runs with a [`Context`] for the owning
/// entity, so it may add sibling components.
pub trait ComponentType: Component + Sized {
    /// Default registration name.
    const NAME: &'static str;

    /// Initializer arguments.
    type Config: 'static;

    /// Types this component also answers lookups for.
    fn bases() -> Vec<TypeId> {
        Vec::new()
    }

    /// Build the instance for the entity behind `cx`.
    fn pre_update(cx: &mut Context<'_>, config: Self::Config) -> Self;
}

// ---------------------------------------------------------------------------
// ComponentTypeId
// ---------------------------------------------------------------------------

/// Opaque, lightweight identifier for a registered component type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentTypeId(pub(crate) u32);

impl fmt::Debug for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentTypeId({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// ComponentInfo
// ---------------------------------------------------------------------------

/// Type-erased constructor: downcasts the boxed config and runs
/// `pre_update`. A config of the wrong type is handed back untouched.
pub(crate) type Constructor =
    fn(&mut Context<'_>, Box<dyn Any>) -> Result<Box<dyn Component>, Box<dyn Any>>;

fn construct<T: ComponentType>(
    cx: &mut Context<'_>,
    config: Box<dyn Any>,
) -> Result<Box<dyn Component>, Box<dyn Any>> {
    let config = config.downcast::<T::Config>()?;
    Ok(Box::new(T::pre_update(cx, *config)))
}

/// Metadata about a registered component type.
#[derive(Clone)]
pub struct ComponentInfo {
    /// Unique ID assigned at registration time.
    pub id: ComponentTypeId,
    /// Registration name. Entities hold at most one component per name.
    pub name: String,
    /// Rust `TypeId` of the concrete type.
    pub type_id: TypeId,
    /// `std::any::type_name` of the concrete type, for diagnostics.
    pub type_name: &'static str,
    /// Declared base types.
    pub bases: Vec<TypeId>,
    pub(crate) construct: Constructor,
}

impl fmt::Debug for ComponentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInfo")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("bases", &self.bases.len())
            .finish()
    }
}

impl ComponentInfo {
    /// Whether a component of this type answers lookups for `type_id`.
    pub fn is_a(&self, type_id: TypeId) -> bool {
        self.type_id == type_id || self.bases.contains(&type_id)
    }
}

// ---------------------------------------------------------------------------
// ComponentRegistry
// ---------------------------------------------------------------------------

/// Registry mapping Rust types and names to [`ComponentTypeId`]s and their
/// metadata.
///
/// Registration is idempotent per Rust type: registering a type again returns
/// the existing id and ignores the new name.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    by_type: HashMap<TypeId, ComponentTypeId>,
    by_name: HashMap<String, ComponentTypeId>,
    /// Indexed by ComponentTypeId.0.
    infos: Vec<ComponentInfo>,
}

impl ComponentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under [`ComponentType::NAME`].
    pub fn register<T: ComponentType>(&mut self) -> Result<ComponentTypeId, EcsError> {
        self.register_named::<T>(T::NAME)
    }

    /// Register `T` under `name`.
    ///
    /// # Errors
    ///
    /// [`EcsError::NameConflict`] if `name` is already bound to a different
    /// type.
    pub fn register_named<T: ComponentType>(
        &mut self,
        name: &str,
    ) -> Result<ComponentTypeId, EcsError> {
        let rust_type_id = TypeId::of::<T>();
        if let Some(&existing) = self.by_type.get(&rust_type_id) {
            return Ok(existing);
        }
        if self.by_name.contains_key(name) {
            return Err(EcsError::NameConflict {
                name: name.to_owned(),
            });
        }

        let id = ComponentTypeId(self.infos.len() as u32);
        self.infos.push(ComponentInfo {
            id,
            name: name.to_owned(),
            type_id: rust_type_id,
            type_name: std::any::type_name::<T>(),
            bases: T::bases(),
            construct: construct::<T>,
        });
        self.by_type.insert(rust_type_id, id);
        self.by_name.insert(name.to_owned(), id);
        tracing::debug!(component = name, ?id, "registered component type");
        Ok(id)
    }

    /// Look up a component type by its Rust type.
    pub fn lookup<T: 'static>(&self) -> Option<ComponentTypeId> {
        self.by_type.get(&TypeId::of::<T>()).copied()
    }

    /// Look up a component type by its registered name.
    pub fn lookup_by_name(&self, name: &str) -> Option<ComponentTypeId> {
        self.by_name.get(name).copied()
    }

    /// Get the [`ComponentInfo`] for a registered component type ID.
    pub fn get_info(&self, id: ComponentTypeId) -> Option<&ComponentInfo> {
        self.infos.get(id.0 as usize)
    }

    /// Metadata for the Rust type `T`, if registered.
    pub fn info_of<T: 'static>(&self) -> Option<&ComponentInfo> {
        self.lookup::<T>().and_then(|id| self.get_info(id))
    }

    /// Metadata for the type registered as `name`.
    pub fn info_by_name(&self, name: &str) -> Option<&ComponentInfo> {
        self.lookup_by_name(name).and_then(|id| self.get_info(id))
    }

    /// Total number of registered component types.
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    /// Whether any component types have been registered.
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// Returns the names of all registered component types, sorted.
    pub fn registered_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_name.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
