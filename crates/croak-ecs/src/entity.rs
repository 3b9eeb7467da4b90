//! Entity identifiers, allocation and per-entity component storage.
//!
//! An [`EntityId`] is a 64-bit handle that packs a *generation* counter in the
//! high 32 bits and an *index* in the low 32 bits. The generation is bumped
//! every time an index is recycled, which allows immediate stale-ID detection.
//!
//! An [`Entity`] owns its components in insertion order, at most one per
//! registered component name. Destruction is terminal.

use std::any::TypeId;
use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::component::{Component, ComponentInfo, ComponentTypeId};
use crate::EcsError;

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// A generational entity identifier.
///
/// Layout: `[generation: u32 | index: u32]`
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Construct an `EntityId` from an index and generation.
    #[inline]
    pub fn new(index: u32, generation: u32) -> Self {
        Self((generation as u64) << 32 | index as u64)
    }

    /// The index portion (low 32 bits).
    #[inline]
    pub fn index(self) -> u32 {
        self.0 as u32
    }

    /// The generation portion (high 32 bits).
    #[inline]
    pub fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Raw `u64` representation.
    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }

    /// Reconstruct from a raw `u64`.
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({}v{})", self.index(), self.generation())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

// ---------------------------------------------------------------------------
// EntityAllocator
// ---------------------------------------------------------------------------

/// Allocates and recycles [`EntityId`]s with generational tracking.
///
/// Free indices are kept in a FIFO queue so that generations are spread out
/// over time rather than concentrated on a hot index.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    generations: Vec<u32>,
    alive: Vec<bool>,
    free_indices: VecDeque<u32>,
}

impl EntityAllocator {
    /// Create a new, empty allocator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh [`EntityId`], reusing a recycled index if one is
    /// available.
    pub fn allocate(&mut self) -> EntityId {
        if let Some(index) = self.free_indices.pop_front() {
            // Generation was already bumped on deallocation.
            self.alive[index as usize] = true;
            EntityId::new(index, self.generations[index as usize])
        } else {
            let index = self.generations.len() as u32;
            self.generations.push(0);
            self.alive.push(true);
            EntityId::new(index, 0)
        }
    }

    /// Release `id`, bumping the generation of its index so that outstanding
    /// handles become stale.
    ///
    /// Returns `false` if the id was already released or stale.
    pub fn deallocate(&mut self, id: EntityId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        let idx = id.index() as usize;
        self.alive[idx] = false;
        self.generations[idx] = self.generations[idx].wrapping_add(1);
        self.free_indices.push_back(id.index());
        true
    }

    /// Whether `id` is allocated and its generation is current.
    pub fn is_alive(&self, id: EntityId) -> bool {
        let idx = id.index() as usize;
        idx < self.generations.len() && self.alive[idx] && self.generations[idx] == id.generation()
    }

    /// Total number of currently allocated ids.
    pub fn alive_count(&self) -> usize {
        self.alive.iter().filter(|&&a| a).count()
    }
}

// ---------------------------------------------------------------------------
// ComponentMap
// ---------------------------------------------------------------------------

struct Slot {
    id: ComponentTypeId,
    name: String,
    type_id: TypeId,
    bases: Vec<TypeId>,
    /// `None` only while the component is checked out for its own update.
    component: Option<Box<dyn Component>>,
}

impl Slot {
    fn view<T: 'static>(&self) -> Option<&T> {
        let want = TypeId::of::<T>();
        let component: &dyn Component = self.component.as_deref()?;
        if self.type_id == want {
            component.as_any().downcast_ref::<T>()
        } else if self.bases.contains(&want) {
            component.upcast(want)?.downcast_ref::<T>()
        } else {
            None
        }
    }

    fn view_mut<T: 'static>(&mut self) -> Option<&mut T> {
        let want = TypeId::of::<T>();
        let is_exact = self.type_id == want;
        let is_base = self.bases.contains(&want);
        let component: &mut dyn Component = self.component.as_deref_mut()?;
        if is_exact {
            component.as_any_mut().downcast_mut::<T>()
        } else if is_base {
            component.upcast_mut(want)?.downcast_mut::<T>()
        } else {
            None
        }
    }
}

/// Insertion-ordered components of one entity, keyed by registration name.
#[derive(Default)]
pub struct ComponentMap {
    slots: Vec<Slot>,
    /// Names whose `pre_update` is currently running.
    constructing: Vec<String>,
}

impl ComponentMap {
    /// First component, in insertion order, that is a `T` or declares `T`
    /// as a base.
    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.slots.iter().find_map(Slot::view::<T>)
    }

    /// Mutable counterpart of [`get`](Self::get).
    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.slots.iter_mut().find_map(Slot::view_mut::<T>)
    }

    /// Exact lookup by registration name.
    pub fn get_by_name(&self, name: &str) -> Option<&dyn Component> {
        self.slots
            .iter()
            .find(|slot| slot.name == name)
            .and_then(|slot| slot.component.as_deref())
    }

    /// Whether a component registered as `name` is present or being built.
    pub fn contains_name(&self, name: &str) -> bool {
        self.slots.iter().any(|slot| slot.name == name)
            || self.constructing.iter().any(|n| n == name)
    }

    /// Registration names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.slots.iter().map(|slot| slot.name.as_str())
    }

    /// Component type ids in insertion order.
    pub fn type_ids(&self) -> impl Iterator<Item = ComponentTypeId> + '_ {
        self.slots.iter().map(|slot| slot.id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Reserve `info.name` for a construction in progress.
    pub(crate) fn begin(&mut self, entity: EntityId, info: &ComponentInfo) -> Result<(), EcsError> {
        if self.contains_name(&info.name) {
            return Err(EcsError::DuplicateComponent {
                entity,
                name: info.name.clone(),
            });
        }
        self.constructing.push(info.name.clone());
        Ok(())
    }

    /// Release a reservation made by [`begin`](Self::begin).
    pub(crate) fn abandon(&mut self, info: &ComponentInfo) {
        if let Some(pos) = self.constructing.iter().rposition(|n| *n == info.name) {
            self.constructing.remove(pos);
        }
    }

    /// Store a finished component and return its slot index.
    pub(crate) fn finish(&mut self, info: &ComponentInfo, component: Box<dyn Component>) -> usize {
        self.abandon(info);
        self.slots.push(Slot {
            id: info.id,
            name: info.name.clone(),
            type_id: info.type_id,
            bases: info.bases.clone(),
            component: Some(component),
        });
        self.slots.len() - 1
    }

    /// The concrete `T` stored at `index`.
    pub(crate) fn get_at_mut<T: 'static>(&mut self, index: usize) -> Option<&mut T> {
        self.slots
            .get_mut(index)?
            .component
            .as_deref_mut()?
            .as_any_mut()
            .downcast_mut::<T>()
    }

    pub(crate) fn take(&mut self, index: usize) -> Option<Box<dyn Component>> {
        self.slots.get_mut(index)?.component.take()
    }

    pub(crate) fn restore(&mut self, index: usize, component: Box<dyn Component>) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.component = Some(component);
        }
    }

    /// Run every `on_destroy` in insertion order and drop all components.
    fn destroy_all(&mut self) {
        for slot in &mut self.slots {
            if let Some(component) = slot.component.as_deref_mut() {
                component.on_destroy();
            }
        }
        self.slots.clear();
        self.constructing.clear();
    }
}

impl fmt::Debug for ComponentMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A tracked game object: an id, its components and lifecycle flags.
#[derive(Debug)]
pub struct Entity {
    id: EntityId,
    pub(crate) components: ComponentMap,
    active: bool,
    destroyed: bool,
}

impl Entity {
    pub(crate) fn new(id: EntityId) -> Self {
        Self {
            id,
            components: ComponentMap::default(),
            active: true,
            destroyed: false,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Inactive entities keep their components but are skipped by updates.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn components(&self) -> &ComponentMap {
        &self.components
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

    /// Destroy every component and mark the entity destroyed.
    ///
    /// Returns `false` if the entity was already destroyed, in which case
    /// nothing happens.
    pub fn destroy(&mut self) -> bool {
        if self.destroyed {
            return false;
        }
        self.destroyed = true;
        self.components.destroy_all();
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
