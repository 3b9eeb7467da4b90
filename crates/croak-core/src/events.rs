//! Synchronous named-event publish/subscribe.
//!
//! An [`EventBus`] maps an event name to an ordered list of subscriptions.
//! [`trigger`](EventBus::trigger) calls every subscriber registered under the
//! name, in registration order, on the caller's stack.
//!
//! # Re-entrancy
//!
//! Callbacks receive only the event payload, but they may hold an `Rc` to the
//! bus and subscribe, unsubscribe or trigger from inside a delivery. To keep
//! that well defined, `trigger` works from a snapshot of the subscriber list
//! taken when it starts:
//!
//! - subscribers added during a delivery are not called by that delivery;
//! - a snapshotted subscriber that was removed before its turn is skipped;
//! - a `once` subscriber is unregistered right before its single call, so a
//!   nested trigger of the same event cannot call it a second time.
//!
//! The bus is single-threaded (`Rc`/`RefCell`). Share it with
//! `Rc<EventBus<E>>` and pass it explicitly to whatever needs it.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A shared subscriber callback.
///
/// Keep a clone of the `Rc` to later unsubscribe by identity with
/// [`EventBus::off_callback`].
pub type Callback<E> = Rc<dyn Fn(&E)>;

/// An event payload that knows the name it is published under.
pub trait NamedEvent {
    /// The event name subscribers register for.
    fn event_name(&self) -> &str;
}

/// Options for [`EventBus::on_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubscribeOptions {
    /// Unregister after the first delivery.
    pub once: bool,
    /// Caller-chosen handle for [`EventBus::off_id`].
    pub id: Option<u64>,
}

struct Subscription<E> {
    /// Bus-internal key, unique for the lifetime of the bus.
    key: u64,
    callback: Callback<E>,
    once: bool,
    id: Option<u64>,
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Named-event registry with ordered, synchronous delivery.
pub struct EventBus<E> {
    subscriptions: RefCell<HashMap<String, Vec<Subscription<E>>>>,
    next_key: Cell<u64>,
}

impl<E> EventBus<E> {
    /// Create a bus with no subscribers.
    pub fn new() -> Self {
        Self {
            subscriptions: RefCell::new(HashMap::new()),
            next_key: Cell::new(0),
        }
    }

    /// Subscribe `callback` to `name`.
    pub fn on<F>(&self, name: &str, callback: F) -> &Self
    where
        F: Fn(&E) + 'static,
    {
        self.on_with(name, Rc::new(callback), SubscribeOptions::default())
    }

    /// Subscribe `callback` to `name` for a single delivery.
    pub fn once<F>(&self, name: &str, callback: F) -> &Self
    where
        F: Fn(&E) + 'static,
    {
        self.on_with(
            name,
            Rc::new(callback),
            SubscribeOptions {
                once: true,
                id: None,
            },
        )
    }

    /// Subscribe a shared callback with explicit options.
    pub fn on_with(&self, name: &str, callback: Callback<E>, options: SubscribeOptions) -> &Self {
        let key = self.next_key.get();
        self.next_key.set(key + 1);
        self.subscriptions
            .borrow_mut()
            .entry(name.to_owned())
            .or_default()
            .push(Subscription {
                key,
                callback,
                once: options.once,
                id: options.id,
            });
        self
    }

    /// Remove every subscriber of `name`.
    pub fn off(&self, name: &str) -> &Self {
        self.subscriptions.borrow_mut().remove(name);
        self
    }

    /// Remove the first subscriber of `name` registered with handle `id`.
    pub fn off_id(&self, name: &str, id: u64) -> &Self {
        self.remove_first(name, |sub| sub.id == Some(id));
        self
    }

    /// Remove the first subscriber of `name` whose callback is `callback`.
    pub fn off_callback(&self, name: &str, callback: &Callback<E>) -> &Self {
        self.remove_first(name, |sub| Rc::ptr_eq(&sub.callback, callback));
        self
    }

    /// Deliver `event` to every current subscriber of `name`.
    ///
    /// Triggering a name nobody subscribed to is a no-op.
    pub fn trigger(&self, name: &str, event: &E) -> &Self {
        let snapshot: Vec<(u64, Callback<E>, bool)> = match self.subscriptions.borrow().get(name) {
            Some(subs) => subs
                .iter()
                .map(|s| (s.key, Rc::clone(&s.callback), s.once))
                .collect(),
            None => return self,
        };

        for (key, callback, once) in snapshot {
            // The borrow must end before the callback runs.
            let still_registered = if once {
                self.remove_first(name, |sub| sub.key == key)
            } else {
                self.is_registered(name, key)
            };
            if still_registered {
                callback(event);
            }
        }
        self
    }

    /// Number of subscribers currently registered under `name`.
    pub fn subscriber_count(&self, name: &str) -> usize {
        self.subscriptions
            .borrow()
            .get(name)
            .map_or(0, |subs| subs.len())
    }

    /// Whether anyone is subscribed to `name`.
    pub fn has_subscribers(&self, name: &str) -> bool {
        self.subscriber_count(name) > 0
    }

    fn is_registered(&self, name: &str, key: u64) -> bool {
        self.subscriptions
            .borrow()
            .get(name)
            .is_some_and(|subs| subs.iter().any(|s| s.key == key))
    }

    /// Returns `true` if a subscription was removed.
    fn remove_first<P>(&self, name: &str, predicate: P) -> bool
    where
        P: Fn(&Subscription<E>) -> bool,
    {
        let mut subscriptions = self.subscriptions.borrow_mut();
        let Some(subs) = subscriptions.get_mut(name) else {
            return false;
        };
        let Some(index) = subs.iter().position(predicate) else {
            return false;
        };
        subs.remove(index);
        if subs.is_empty() {
            subscriptions.remove(name);
        }
        true
    }
}

impl<E: NamedEvent> EventBus<E> {
    /// Trigger `event` under its own name.
    pub fn emit(&self, event: E) -> &Self {
        tracing::trace!(event = event.event_name(), "emit");
        self.trigger(event.event_name(), &event)
    }
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subscriptions = self.subscriptions.borrow();
        let mut names: Vec<(&str, usize)> = subscriptions
            .iter()
            .map(|(name, subs)| (name.as_str(), subs.len()))
            .collect();
        names.sort();
        f.debug_struct("EventBus").field("subscribers", &names).finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Rc<RefCell<Vec<String>>>, impl Fn(&str) -> Box<dyn Fn(&u32)>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let make = move |tag: &str| -> Box<dyn Fn(&u32)> {
            let sink = Rc::clone(&sink);
            let tag = tag.to_owned();
            Box::new(move |v: &u32| sink.borrow_mut().push(format!("{tag}:{v}")))
        };
        (log, make)
    }

    #[test]
    fn delivers_in_registration_order() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        let (a, b, c) = (make("a"), make("b"), make("c"));
        bus.on("ping", move |v| a(v))
            .on("ping", move |v| b(v))
            .on("ping", move |v| c(v));
        bus.trigger("ping", &1);
        assert_eq!(*log.borrow(), vec!["a:1", "b:1", "c:1"]);
    }

    #[test]
    fn once_fires_exactly_once() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        let (a, b) = (make("a"), make("b"));
        bus.on("ping", move |v| a(v));
        bus.once("ping", move |v| b(v));
        bus.trigger("ping", &1).trigger("ping", &2).trigger("ping", &3);
        assert_eq!(*log.borrow(), vec!["a:1", "b:1", "a:2", "a:3"]);
        assert_eq!(bus.subscriber_count("ping"), 1);
    }

    #[test]
    fn consecutive_once_subscribers_are_not_skipped() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        let (a, b, c) = (make("a"), make("b"), make("c"));
        bus.once("ping", move |v| a(v));
        bus.once("ping", move |v| b(v));
        bus.on("ping", move |v| c(v));
        bus.trigger("ping", &7);
        assert_eq!(*log.borrow(), vec!["a:7", "b:7", "c:7"]);
    }

    #[test]
    fn off_without_id_removes_all() {
        let bus: EventBus<u32> = EventBus::new();
        bus.on("ping", |_| {}).on("ping", |_| {});
        bus.off("ping");
        assert_eq!(bus.subscriber_count("ping"), 0);
    }

    #[test]
    fn off_by_id_and_by_callback() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        let a = make("a");
        let b: Callback<u32> = Rc::from(make("b"));
        bus.on_with("ping", Rc::new(move |v: &u32| a(v)), SubscribeOptions { once: false, id: Some(9) });
        bus.on_with("ping", Rc::clone(&b), SubscribeOptions::default());

        bus.off_id("ping", 9);
        bus.trigger("ping", &1);
        bus.off_callback("ping", &b);
        bus.trigger("ping", &2);
        assert_eq!(*log.borrow(), vec!["b:1"]);
    }

    #[test]
    fn trigger_without_subscribers_is_noop() {
        let bus: EventBus<u32> = EventBus::new();
        bus.trigger("nobody", &0);
        assert!(!bus.has_subscribers("nobody"));
    }

    #[test]
    fn reentrant_trigger_does_not_repeat_once() {
        let bus: Rc<EventBus<u32>> = Rc::new(EventBus::new());
        let count = Rc::new(Cell::new(0));

        let inner = Rc::clone(&bus);
        let seen = Rc::clone(&count);
        bus.once("ping", move |v| {
            seen.set(seen.get() + 1);
            if *v < 3 {
                inner.trigger("ping", &(v + 1));
            }
        });
        bus.trigger("ping", &0);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn removal_during_delivery_skips_later_subscriber() {
        let bus: Rc<EventBus<u32>> = Rc::new(EventBus::new());
        let calls = Rc::new(Cell::new(0));

        let handle = Rc::clone(&bus);
        bus.on("ping", move |_| {
            handle.off_id("ping", 2);
        });
        let c = Rc::clone(&calls);
        bus.on_with(
            "ping",
            Rc::new(move |_: &u32| c.set(c.get() + 1)),
            SubscribeOptions { once: false, id: Some(2) },
        );
        bus.trigger("ping", &0);
        assert_eq!(calls.get(), 0);
    }
}
