//! The per-call view a component gets of its owning entity.

use crate::component::{Component, ComponentInfo, ComponentRegistry, ComponentType};
use crate::entity::{ComponentMap, EntityId};
use crate::EcsError;

/// Access handed to [`Component::update`] and [`ComponentType::pre_update`].
///
/// Exposes the tick timing, the owning entity's id, its sibling components
/// and a deferred destroy request. The component being updated is checked
/// out of the entity for the duration of the call, so it does not see
/// itself through [`get`](Context::get).
pub struct Context<'a> {
    entity: EntityId,
    components: &'a mut ComponentMap,
    registry: &'a ComponentRegistry,
    delta: f64,
    time: f64,
    destroy_requested: bool,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        entity: EntityId,
        components: &'a mut ComponentMap,
        registry: &'a ComponentRegistry,
        delta: f64,
        time: f64,
    ) -> Self {
        Self {
            entity,
            components,
            registry,
            delta,
            time,
            destroy_requested: false,
        }
    }

    /// The owning entity.
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Seconds since the previous tick. Zero outside of an update.
    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// Simulation time of the current tick, in seconds.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.components.get::<T>()
    }

    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.components.get_mut::<T>()
    }

    pub fn has<T: 'static>(&self) -> bool {
        self.get::<T>().is_some()
    }

    /// Add a sibling component to the owning entity.
    ///
    /// Same contract as [`World::add_component`](crate::World::add_component).
    /// A destroy requested by the new component's `pre_update` is carried
    /// over to this context.
    pub fn add<T: ComponentType>(&mut self, config: T::Config) -> Result<&mut T, EcsError> {
        let registry: &'a ComponentRegistry = self.registry;
        let info = registry.info_of::<T>().ok_or_else(unregistered::<T>)?;
        let (index, destroy) = insert_typed::<T>(
            self.entity,
            &mut *self.components,
            registry,
            info,
            config,
            (self.delta, self.time),
        )?;
        self.destroy_requested |= destroy;
        self.components
            .get_at_mut::<T>(index)
            .ok_or_else(unregistered::<T>)
    }

    /// Ask for the owning entity to be destroyed once the current call
    /// returns. The entity's remaining components are not updated this tick.
    pub fn destroy_entity(&mut self) {
        self.destroy_requested = true;
    }

    pub fn destroy_requested(&self) -> bool {
        self.destroy_requested
    }
}

// ---------------------------------------------------------------------------
// Insertion
// ---------------------------------------------------------------------------

pub(crate) fn unregistered<T>() -> EcsError {
    EcsError::UnregisteredType {
        type_name: std::any::type_name::<T>().to_owned(),
    }
}

/// Reserve the name, run `build` in a nested context, then store the result.
///
/// Returns the new slot index and whether `build` requested the entity's
/// destruction. On error the entity is left as it was.
fn insert_with<F>(
    entity: EntityId,
    components: &mut ComponentMap,
    registry: &ComponentRegistry,
    info: &ComponentInfo,
    (delta, time): (f64, f64),
    build: F,
) -> Result<(usize, bool), EcsError>
where
    F: FnOnce(&mut Context<'_>) -> Result<Box<dyn Component>, EcsError>,
{
    components.begin(entity, info)?;
    let (built, destroy) = {
        let mut nested = Context::new(entity, components, registry, delta, time);
        let built = build(&mut nested);
        (built, nested.destroy_requested)
    };
    match built {
        Ok(component) => Ok((components.finish(info, component), destroy)),
        Err(err) => {
            components.abandon(info);
            Err(err)
        }
    }
}

pub(crate) fn insert_typed<T: ComponentType>(
    entity: EntityId,
    components: &mut ComponentMap,
    registry: &ComponentRegistry,
    info: &ComponentInfo,
    config: T::Config,
    timing: (f64, f64),
) -> Result<(usize, bool), EcsError> {
    insert_with(entity, components, registry, info, timing, |cx| {
        let component: Box<dyn Component> = Box::new(T::pre_update(cx, config));
        Ok(component)
    })
}

pub(crate) fn insert_erased(
    entity: EntityId,
    components: &mut ComponentMap,
    registry: &ComponentRegistry,
    info: &ComponentInfo,
    config: Box<dyn std::any::Any>,
    timing: (f64, f64),
) -> Result<(usize, bool), EcsError> {
    let construct = info.construct;
    insert_with(entity, components, registry, info, timing, |cx| {
        construct(cx, config).map_err(|_| EcsError::ConfigMismatch {
            name: info.name.clone(),
        })
    })
}
