//! Gameplay notifications.
//!
//! Components never reach the game directly. They push [`GameEvent`]s onto
//! a shared [`EventQueue`] while the world updates; the game drains the
//! queue afterwards, applies the consequences and republishes the results on
//! its [`EventBus`](croak_core::EventBus) for presentation layers.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use croak_core::NamedEvent;
use croak_ecs::EntityId;
use serde::{Deserialize, Serialize};

pub const BUG_DIED: &str = "bugDied";
pub const BUG_REACHED_END: &str = "bugReachedEnd";
pub const FROG_EAT_BUG: &str = "frogEatBug";
pub const STATE_CHANGED: &str = "stateChanged";
pub const UI_SET_LIVES: &str = "uiSetLives";
pub const UI_SET_MONEY: &str = "uiSetMoney";
pub const SHOP_SET_ITEM: &str = "shopSetItem";

/// Lifecycle phase of a [`Game`](crate::Game).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Terrain is collapsing, one pass per tick.
    Generating,
    Playing,
    /// Lives ran out. Updates are ignored.
    GameOver,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Generating => "generating",
            Phase::Playing => "playing",
            Phase::GameOver => "game over",
        };
        f.write_str(name)
    }
}

/// How a frog attack picks its victims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackMode {
    /// The in-range bug furthest along the path.
    Single,
    /// Every bug in range.
    Area,
}

/// A shop entry, as announced to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopItem {
    pub id: String,
    pub name: String,
    pub price: i64,
}

/// Everything the game announces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum GameEvent {
    BugDied { entity: EntityId, worth: i64 },
    BugReachedEnd { entity: EntityId },
    FrogEatBug { frog: EntityId, mode: AttackMode },
    StateChanged { phase: Phase },
    UiSetLives { lives: f64 },
    UiSetMoney { money: i64 },
    ShopSetItem(ShopItem),
}

impl NamedEvent for GameEvent {
    fn event_name(&self) -> &str {
        match self {
            GameEvent::BugDied { .. } => BUG_DIED,
            GameEvent::BugReachedEnd { .. } => BUG_REACHED_END,
            GameEvent::FrogEatBug { .. } => FROG_EAT_BUG,
            GameEvent::StateChanged { .. } => STATE_CHANGED,
            GameEvent::UiSetLives { .. } => UI_SET_LIVES,
            GameEvent::UiSetMoney { .. } => UI_SET_MONEY,
            GameEvent::ShopSetItem(_) => SHOP_SET_ITEM,
        }
    }
}

// ---------------------------------------------------------------------------
// EventQueue
// ---------------------------------------------------------------------------

/// Shared FIFO of events raised by components during an update.
///
/// Cloning yields another handle to the same queue.
#[derive(Clone, Default)]
pub struct EventQueue {
    inner: Rc<RefCell<VecDeque<GameEvent>>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: GameEvent) {
        self.inner.borrow_mut().push_back(event);
    }

    /// Oldest queued event.
    pub fn pop(&self) -> Option<GameEvent> {
        self.inner.borrow_mut().pop_front()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

impl fmt::Debug for EventQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventQueue")
            .field("queued", &self.len())
            .finish()
    }
}
