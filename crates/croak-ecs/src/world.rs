//! The [`World`] is the top-level container for the ECS. It owns the entity
//! allocator, the component registry and every tracked entity, and runs the
//! per-tick update.

use std::any::Any;
use std::collections::HashMap;

use crate::component::{Component, ComponentRegistry, ComponentType, ComponentTypeId};
use crate::context::{insert_erased, insert_typed, unregistered, Context};
use crate::entity::{Entity, EntityAllocator, EntityId};
use crate::EcsError;

/// Owns all entities and schedules their components.
///
/// Entities are updated in creation order and, within an entity, components
/// in insertion order. Destroyed entities stay tracked (and skipped) until
/// [`prune_destroyed`](World::prune_destroyed) is called.
#[derive(Debug, Default)]
pub struct World {
    allocator: EntityAllocator,
    registry: ComponentRegistry,
    entities: Vec<Entity>,
    /// EntityId -> position in `entities`.
    index: HashMap<EntityId, usize>,
    /// Time of the most recent update, handed to out-of-update adds.
    time: f64,
}

impl World {
    /// Create an empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Access the component registry.
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    // -- registration -------------------------------------------------------

    /// Register `T` under [`ComponentType::NAME`]. Idempotent.
    pub fn register_component<T: ComponentType>(&mut self) -> Result<ComponentTypeId, EcsError> {
        self.register_component_named::<T>(T::NAME)
    }

    /// Register `T` under `name`. Idempotent per Rust type.
    pub fn register_component_named<T: ComponentType>(
        &mut self,
        name: &str,
    ) -> Result<ComponentTypeId, EcsError> {
        let result = self.registry.register_named::<T>(name);
        if let Err(err) = &result {
            tracing::warn!(component = name, error = %err, "component registration rejected");
        }
        result
    }

    // -- entities -----------------------------------------------------------

    /// Allocate and track a new, active entity with no components.
    pub fn create_entity(&mut self) -> EntityId {
        let id = self.allocator.allocate();
        self.index.insert(id, self.entities.len());
        self.entities.push(Entity::new(id));
        id
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.index.get(&id).map(|&i| &self.entities[i])
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.index.get(&id).map(|&i| &mut self.entities[i])
    }

    /// Every tracked entity in creation order, destroyed ones included.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.iter()
    }

    /// Number of tracked entities, destroyed ones included.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Tracked and not destroyed.
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.entity(id).is_some_and(|e| !e.is_destroyed())
    }

    /// Tracked and destroyed. Pruned and unknown ids are not "destroyed".
    pub fn is_destroyed(&self, id: EntityId) -> bool {
        self.entity(id).is_some_and(Entity::is_destroyed)
    }

    /// Returns `false` if the entity is unknown.
    pub fn set_active(&mut self, id: EntityId, active: bool) -> bool {
        match self.entity_mut(id) {
            Some(entity) => {
                entity.set_active(active);
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self, id: EntityId) -> bool {
        self.entity(id).is_some_and(Entity::is_active)
    }

    /// Destroy `id` and all its components.
    ///
    /// Returns `true` only for the call that actually destroyed the entity;
    /// repeated calls and unknown ids are no-ops.
    pub fn destroy_entity(&mut self, id: EntityId) -> bool {
        self.entity_mut(id).is_some_and(Entity::destroy)
    }

    /// Stop tracking destroyed entities and recycle their ids.
    ///
    /// Returns how many entities were removed.
    pub fn prune_destroyed(&mut self) -> usize {
        let before = self.entities.len();
        let allocator = &mut self.allocator;
        self.entities.retain(|entity| {
            if entity.is_destroyed() {
                allocator.deallocate(entity.id());
                false
            } else {
                true
            }
        });
        let pruned = before - self.entities.len();
        if pruned > 0 {
            self.index = self
                .entities
                .iter()
                .enumerate()
                .map(|(i, e)| (e.id(), i))
                .collect();
            tracing::trace!(pruned, remaining = self.entities.len(), "pruned destroyed entities");
        }
        pruned
    }

    // -- components ---------------------------------------------------------

    /// Construct a `T` from `config` and attach it to `entity`.
    ///
    /// # Errors
    ///
    /// Fails, leaving the entity unchanged, if `T` is unregistered, the
    /// entity already holds a component under `T`'s name, or the entity is
    /// unknown or destroyed. Errors are also logged at `warn`.
    pub fn add_component<T: ComponentType>(
        &mut self,
        entity: EntityId,
        config: T::Config,
    ) -> Result<&mut T, EcsError> {
        let result = self.try_add_component::<T>(entity, config);
        if let Err(err) = &result {
            tracing::warn!(%entity, component = std::any::type_name::<T>(), error = %err, "add_component failed");
        }
        result
    }

    fn try_add_component<T: ComponentType>(
        &mut self,
        entity: EntityId,
        config: T::Config,
    ) -> Result<&mut T, EcsError> {
        let slot = self.live_slot(entity)?;
        let registry = &self.registry;
        let info = registry.info_of::<T>().ok_or_else(unregistered::<T>)?;
        let target = &mut self.entities[slot];
        let (index, destroy) = insert_typed::<T>(
            entity,
            &mut target.components,
            registry,
            info,
            config,
            (0.0, self.time),
        )?;
        if destroy {
            target.destroy();
            return Err(EcsError::EntityDestroyed { entity });
        }
        target
            .components
            .get_at_mut::<T>(index)
            .ok_or_else(unregistered::<T>)
    }

    /// Attach a component by registration name with a boxed config.
    ///
    /// # Errors
    ///
    /// As [`add_component`](Self::add_component), plus
    /// [`EcsError::UnknownComponent`] for an unregistered name and
    /// [`EcsError::ConfigMismatch`] when `config` is not the type's config.
    pub fn add_component_by_name(
        &mut self,
        entity: EntityId,
        name: &str,
        config: Box<dyn Any>,
    ) -> Result<&dyn Component, EcsError> {
        let result = self.try_add_component_by_name(entity, name, config);
        if let Err(err) = &result {
            tracing::warn!(%entity, component = name, error = %err, "add_component_by_name failed");
        }
        result
    }

    fn try_add_component_by_name(
        &mut self,
        entity: EntityId,
        name: &str,
        config: Box<dyn Any>,
    ) -> Result<&dyn Component, EcsError> {
        let slot = self.live_slot(entity)?;
        let registry = &self.registry;
        let info = registry
            .info_by_name(name)
            .ok_or_else(|| EcsError::UnknownComponent {
                name: name.to_owned(),
                registered: registry.registered_names().join(", "),
            })?;
        let target = &mut self.entities[slot];
        let (_, destroy) = insert_erased(
            entity,
            &mut target.components,
            registry,
            info,
            config,
            (0.0, self.time),
        )?;
        if destroy {
            target.destroy();
            return Err(EcsError::EntityDestroyed { entity });
        }
        target
            .components
            .get_by_name(name)
            .ok_or_else(|| EcsError::ConfigMismatch {
                name: name.to_owned(),
            })
    }

    /// First component of `entity` that is, or declares as base, a `T`.
    pub fn get_component<T: 'static>(&self, entity: EntityId) -> Option<&T> {
        self.entity(entity)?.get::<T>()
    }

    pub fn get_component_mut<T: 'static>(&mut self, entity: EntityId) -> Option<&mut T> {
        self.entity_mut(entity)?.get_mut::<T>()
    }

    /// Exact lookup by registration name.
    pub fn get_component_by_name(&self, entity: EntityId, name: &str) -> Option<&dyn Component> {
        self.entity(entity)?.components().get_by_name(name)
    }

    pub fn has_component<T: 'static>(&self, entity: EntityId) -> bool {
        self.get_component::<T>(entity).is_some()
    }

    /// `(entity, component)` for every live entity holding a `T`, in creation
    /// order.
    pub fn iter_component<T: 'static>(&self) -> impl Iterator<Item = (EntityId, &T)> + '_ {
        self.entities
            .iter()
            .filter(|e| !e.is_destroyed())
            .filter_map(|e| e.get::<T>().map(|c| (e.id(), c)))
    }

    fn live_slot(&self, entity: EntityId) -> Result<usize, EcsError> {
        let slot = *self
            .index
            .get(&entity)
            .ok_or(EcsError::StaleEntity { entity })?;
        if self.entities[slot].is_destroyed() {
            return Err(EcsError::EntityDestroyed { entity });
        }
        Ok(slot)
    }

    // -- scheduling ---------------------------------------------------------

    /// Update every component of every active, non-destroyed entity once.
    ///
    /// Components added during this update are first updated next tick. A
    /// destroy requested through [`Context::destroy_entity`] is applied right
    /// after the requesting component returns.
    pub fn update(&mut self, delta: f64, time: f64) {
        self.time = time;
        let registry = &self.registry;
        for entity in &mut self.entities {
            if entity.is_destroyed() || !entity.is_active() {
                continue;
            }
            let id = entity.id();
            let count = entity.components.len();
            for i in 0..count {
                let Some(mut component) = entity.components.take(i) else {
                    continue;
                };
                let destroy = {
                    let mut cx = Context::new(id, &mut entity.components, registry, delta, time);
                    component.update(&mut cx);
                    cx.destroy_requested()
                };
                entity.components.restore(i, component);
                if destroy {
                    tracing::trace!(entity = %id, "destroyed during update");
                    entity.destroy();
                    break;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::TypeId;
    use std::cell::RefCell;
    use std::rc::Rc;

    // -- test component types -----------------------------------------------

    struct Health {
        health: f64,
    }

    impl Component for Health {
        fn update(&mut self, cx: &mut Context<'_>) {
            if self.health <= 0.0 {
                cx.destroy_entity();
            }
        }
    }

    impl ComponentType for Health {
        const NAME: &'static str = "health";
        type Config = f64;
        fn pre_update(_cx: &mut Context<'_>, health: f64) -> Self {
            Health { health }
        }
    }

    /// Appends `(tag, time)` to a shared log every update.
    struct Recorder {
        tag: &'static str,
        log: Rc<RefCell<Vec<(&'static str, f64)>>>,
        torn_down: Rc<RefCell<u32>>,
    }

    impl Component for Recorder {
        fn update(&mut self, cx: &mut Context<'_>) {
            self.log.borrow_mut().push((self.tag, cx.time()));
        }
        fn on_destroy(&mut self) {
            *self.torn_down.borrow_mut() += 1;
        }
    }

    type RecorderConfig = (
        &'static str,
        Rc<RefCell<Vec<(&'static str, f64)>>>,
        Rc<RefCell<u32>>,
    );

    impl ComponentType for Recorder {
        const NAME: &'static str = "recorder";
        type Config = RecorderConfig;
        fn pre_update(_cx: &mut Context<'_>, (tag, log, torn_down): RecorderConfig) -> Self {
            Recorder { tag, log, torn_down }
        }
    }

    /// Adds a `Health` sibling during construction.
    struct Mortal;
    impl Component for Mortal {}
    impl ComponentType for Mortal {
        const NAME: &'static str = "mortal";
        type Config = f64;
        fn pre_update(cx: &mut Context<'_>, health: f64) -> Self {
            cx.add::<Health>(health).expect("health registered");
            Mortal
        }
    }

    /// Specialized health that answers `Health` lookups.
    struct ArmoredHealth {
        inner: Health,
    }
    impl Component for ArmoredHealth {
        fn upcast(&self, base: TypeId) -> Option<&dyn Any> {
            (base == TypeId::of::<Health>()).then_some(&self.inner as &dyn Any)
        }
        fn upcast_mut(&mut self, base: TypeId) -> Option<&mut dyn Any> {
            (base == TypeId::of::<Health>()).then_some(&mut self.inner as &mut dyn Any)
        }
    }
    impl ComponentType for ArmoredHealth {
        const NAME: &'static str = "armored-health";
        type Config = f64;
        fn bases() -> Vec<TypeId> {
            vec![TypeId::of::<Health>()]
        }
        fn pre_update(_cx: &mut Context<'_>, health: f64) -> Self {
            ArmoredHealth {
                inner: Health { health },
            }
        }
    }

    fn setup_world() -> World {
        let mut world = World::new();
        world.register_component::<Health>().unwrap();
        world.register_component::<Recorder>().unwrap();
        world.register_component::<Mortal>().unwrap();
        world.register_component::<ArmoredHealth>().unwrap();
        world
    }

    // -- add / get ----------------------------------------------------------

    #[test]
    fn add_then_get_and_reject_duplicate() {
        let mut world = setup_world();
        let e = world.create_entity();
        assert_eq!(world.add_component::<Health>(e, 5.0).unwrap().health, 5.0);
        assert_eq!(world.get_component::<Health>(e).unwrap().health, 5.0);

        let result = world.add_component::<Health>(e, 1.0);
        assert!(matches!(result, Err(EcsError::DuplicateComponent { .. })));
        assert_eq!(world.get_component::<Health>(e).unwrap().health, 5.0);
    }

    #[test]
    fn unregistered_add_leaves_entity_untouched() {
        let mut world = World::new();
        let e = world.create_entity();
        let result = world.add_component::<Health>(e, 5.0);
        assert!(matches!(result, Err(EcsError::UnregisteredType { .. })));
        assert!(world.entity(e).unwrap().components().is_empty());
    }

    #[test]
    fn add_by_name_and_config_mismatch() {
        let mut world = setup_world();
        let e = world.create_entity();
        let result = world.add_component_by_name(e, "health", Box::new("five"));
        assert!(matches!(result, Err(EcsError::ConfigMismatch { .. })));
        assert!(world.entity(e).unwrap().components().is_empty());

        world
            .add_component_by_name(e, "health", Box::new(5.0_f64))
            .unwrap();
        assert_eq!(world.get_component::<Health>(e).unwrap().health, 5.0);
        assert!(world.get_component_by_name(e, "health").is_some());

        let result = world.add_component_by_name(e, "mana", Box::new(()));
        assert!(matches!(result, Err(EcsError::UnknownComponent { .. })));
    }

    #[test]
    fn nested_add_during_construction() {
        let mut world = setup_world();
        let e = world.create_entity();
        world.add_component::<Mortal>(e, 3.0).unwrap();
        assert_eq!(world.get_component::<Health>(e).unwrap().health, 3.0);
        let names: Vec<&str> = world.entity(e).unwrap().components().names().collect();
        assert_eq!(names, vec!["health", "mortal"]);
    }

    #[test]
    fn base_lookup_finds_specialized_component() {
        let mut world = setup_world();
        let e = world.create_entity();
        world.add_component::<ArmoredHealth>(e, 9.0).unwrap();
        assert_eq!(world.get_component::<Health>(e).unwrap().health, 9.0);
        world.get_component_mut::<Health>(e).unwrap().health = 4.0;
        assert_eq!(world.get_component::<ArmoredHealth>(e).unwrap().inner.health, 4.0);
        // Exact name lookups do not follow bases.
        assert!(world.get_component_by_name(e, "health").is_none());
    }

    // -- destroy ------------------------------------------------------------

    #[test]
    fn destroy_is_idempotent_and_runs_teardown_once() {
        let mut world = setup_world();
        let log = Rc::new(RefCell::new(Vec::new()));
        let torn = Rc::new(RefCell::new(0));
        let e = world.create_entity();
        world
            .add_component::<Recorder>(e, ("a", Rc::clone(&log), Rc::clone(&torn)))
            .unwrap();

        assert!(world.destroy_entity(e));
        assert!(!world.destroy_entity(e));
        assert!(world.is_destroyed(e));
        assert_eq!(*torn.borrow(), 1);

        let result = world.add_component::<Health>(e, 1.0);
        assert!(matches!(result, Err(EcsError::EntityDestroyed { .. })));
    }

    // -- update -------------------------------------------------------------

    #[test]
    fn update_skips_inactive_and_destroyed() {
        let mut world = setup_world();
        let log = Rc::new(RefCell::new(Vec::new()));
        let torn = Rc::new(RefCell::new(0));
        let spawn = |world: &mut World, tag| {
            let e = world.create_entity();
            world
                .add_component::<Recorder>(e, (tag, Rc::clone(&log), Rc::clone(&torn)))
                .unwrap();
            e
        };
        let _a = spawn(&mut world, "a");
        let b = spawn(&mut world, "b");
        let c = spawn(&mut world, "c");
        world.set_active(b, false);
        world.destroy_entity(c);

        world.update(0.5, 1.5);
        assert_eq!(*log.borrow(), vec![("a", 1.5)]);
    }

    #[test]
    fn destroy_request_stops_remaining_components() {
        let mut world = setup_world();
        let log = Rc::new(RefCell::new(Vec::new()));
        let torn = Rc::new(RefCell::new(0));
        let e = world.create_entity();
        world.add_component::<Health>(e, 0.0).unwrap();
        world
            .add_component::<Recorder>(e, ("late", Rc::clone(&log), Rc::clone(&torn)))
            .unwrap();

        world.update(0.1, 0.1);
        assert!(world.is_destroyed(e));
        assert!(log.borrow().is_empty());
        assert_eq!(*torn.borrow(), 1);
    }

    #[test]
    fn prune_recycles_destroyed() {
        let mut world = setup_world();
        let a = world.create_entity();
        let b = world.create_entity();
        world.destroy_entity(a);
        assert_eq!(world.entity_count(), 2);
        assert_eq!(world.prune_destroyed(), 1);
        assert_eq!(world.entity_count(), 1);
        assert!(world.entity(a).is_none());
        assert!(world.is_alive(b));
        assert_eq!(world.prune_destroyed(), 0);
    }

    #[test]
    fn iter_component_lists_live_holders() {
        let mut world = setup_world();
        let a = world.create_entity();
        let b = world.create_entity();
        let c = world.create_entity();
        world.add_component::<Health>(a, 1.0).unwrap();
        world.add_component::<ArmoredHealth>(b, 2.0).unwrap();
        world.add_component::<Health>(c, 3.0).unwrap();
        world.destroy_entity(c);
        let seen: Vec<(EntityId, f64)> = world
            .iter_component::<Health>()
            .map(|(id, h)| (id, h.health))
            .collect();
        assert_eq!(seen, vec![(a, 1.0), (b, 2.0)]);
    }
}
