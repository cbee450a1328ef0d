//! Synchronous in-process publish/subscribe for gesture events.
//!
//! Emission order is fixed: the event is appended to the bounded history,
//! then type-specific listeners fire, then wildcard listeners, all within the
//! emitter's call. Dispatch iterates a snapshot of the listener list so
//! registration changes (including `once` self-removal) can never skip or
//! double-fire a listener, and a panicking listener is isolated and logged
//! without affecting the rest.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::{debug, warn};

use crate::store::event::Event;
use crate::store::event_history::EventHistory;

/// Listener key that receives every event regardless of kind.
pub const WILDCARD: &str = "*";

/// Callback invoked synchronously for matching events.
pub type EventCallback = Box<dyn FnMut(&Event) + Send>;

/// Token returned by [`EventBus::on`]/[`EventBus::once`], used with
/// [`EventBus::off`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct ListenerEntry {
    id: ListenerId,
    once: bool,
    callback: EventCallback,
}

/// Event distribution hub owning the bounded [`EventHistory`].
pub struct EventBus {
    listeners: HashMap<String, Vec<ListenerEntry>>,
    history: EventHistory,
    next_listener: u64,
}

impl EventBus {
    pub fn new(history: EventHistory) -> Self {
        Self {
            listeners: HashMap::new(),
            history,
            next_listener: 0,
        }
    }

    /// Appends the event to the history, then notifies type-specific
    /// listeners followed by wildcard listeners, synchronously.
    pub fn emit(&mut self, event: Event) {
        debug!("Emitting event '{}' at {:.1}ms", event.kind, event.timestamp_ms);
        self.history.add(event.clone());

        let kind = event.kind.clone();
        self.dispatch(&kind, &event);
        self.dispatch(WILDCARD, &event);
    }

    /// Registers a listener for one event kind (or [`WILDCARD`]).
    pub fn on(&mut self, kind: &str, callback: EventCallback) -> ListenerId {
        self.register(kind, callback, false)
    }

    /// Registers a listener that removes itself after its first firing.
    pub fn once(&mut self, kind: &str, callback: EventCallback) -> ListenerId {
        self.register(kind, callback, true)
    }

    /// Removes a listener by token. Returns whether an entry was removed.
    pub fn off(&mut self, kind: &str, id: ListenerId) -> bool {
        if let Some(entries) = self.listeners.get_mut(kind) {
            let before = entries.len();
            entries.retain(|entry| entry.id != id);
            return entries.len() != before;
        }
        false
    }

    /// Drops all listeners of one kind, or every listener when `None`.
    pub fn remove_all_listeners(&mut self, kind: Option<&str>) {
        match kind {
            Some(kind) => {
                self.listeners.remove(kind);
            }
            None => self.listeners.clear(),
        }
    }

    pub fn listener_count(&self, kind: &str) -> usize {
        self.listeners.get(kind).map_or(0, Vec::len)
    }

    pub fn history(&self) -> &EventHistory {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut EventHistory {
        &mut self.history
    }

    fn register(&mut self, kind: &str, callback: EventCallback, once: bool) -> ListenerId {
        self.next_listener += 1;
        let id = ListenerId(self.next_listener);
        self.listeners
            .entry(kind.to_string())
            .or_default()
            .push(ListenerEntry { id, once, callback });
        debug!("Listener {:?} registered for '{}'", id, kind);
        id
    }

    fn dispatch(&mut self, key: &str, event: &Event) {
        // Snapshot: take the list out, fire every entry, reinstall survivors.
        let Some(mut snapshot) = self.listeners.remove(key) else {
            return;
        };

        for entry in snapshot.iter_mut() {
            let result = catch_unwind(AssertUnwindSafe(|| (entry.callback)(event)));
            if result.is_err() {
                warn!(
                    "Event listener {:?} for '{}' panicked on '{}'; continuing",
                    entry.id, key, event.kind
                );
            }
        }
        snapshot.retain(|entry| !entry.once);

        // Listeners registered during dispatch landed in a fresh slot; keep
        // them behind the surviving snapshot entries.
        match self.listeners.remove(key) {
            Some(added) => {
                snapshot.extend(added);
                self.listeners.insert(key.to_string(), snapshot);
            }
            None if snapshot.is_empty() => {}
            None => {
                self.listeners.insert(key.to_string(), snapshot);
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(EventHistory::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::event::EventPayload;
    use std::sync::{Arc, Mutex};

    fn event(kind: &str, ts: f64) -> Event {
        Event::new(kind, EventPayload::None, ts)
    }

    #[test]
    fn typed_listeners_fire_before_wildcard() {
        let mut bus = EventBus::default();
        let order = Arc::new(Mutex::new(Vec::new()));

        let order_wild = Arc::clone(&order);
        bus.on(
            WILDCARD,
            Box::new(move |_| order_wild.lock().unwrap().push("wildcard")),
        );
        let order_typed = Arc::clone(&order);
        bus.on(
            "tap_detected",
            Box::new(move |_| order_typed.lock().unwrap().push("typed")),
        );

        bus.emit(event("tap_detected", 1.0));
        assert_eq!(*order.lock().unwrap(), vec!["typed", "wildcard"]);
    }

    #[test]
    fn once_listener_fires_exactly_once() {
        let mut bus = EventBus::default();
        let hits = Arc::new(Mutex::new(0usize));
        let hits_cb = Arc::clone(&hits);
        bus.once(
            "tap_detected",
            Box::new(move |_| *hits_cb.lock().unwrap() += 1),
        );

        bus.emit(event("tap_detected", 1.0));
        bus.emit(event("tap_detected", 2.0));
        bus.emit(event("tap_detected", 3.0));

        assert_eq!(*hits.lock().unwrap(), 1);
        assert_eq!(bus.listener_count("tap_detected"), 0);
    }

    #[test]
    fn off_removes_by_token() {
        let mut bus = EventBus::default();
        let hits = Arc::new(Mutex::new(0usize));
        let hits_cb = Arc::clone(&hits);
        let id = bus.on(
            "tap_detected",
            Box::new(move |_| *hits_cb.lock().unwrap() += 1),
        );

        assert!(bus.off("tap_detected", id));
        assert!(!bus.off("tap_detected", id));
        bus.emit(event("tap_detected", 1.0));
        assert_eq!(*hits.lock().unwrap(), 0);
    }

    #[test]
    fn panicking_listener_is_isolated() {
        let mut bus = EventBus::default();
        bus.on("tap_detected", Box::new(|_| panic!("listener bug")));
        let hits = Arc::new(Mutex::new(0usize));
        let hits_cb = Arc::clone(&hits);
        bus.on(
            "tap_detected",
            Box::new(move |_| *hits_cb.lock().unwrap() += 1),
        );

        bus.emit(event("tap_detected", 1.0));
        assert_eq!(*hits.lock().unwrap(), 1);
    }

    #[test]
    fn every_emission_lands_in_history() {
        let mut bus = EventBus::default();
        bus.emit(event("a", 1.0));
        bus.emit(event("b", 2.0));

        assert_eq!(bus.history().len(), 2);
        assert_eq!(bus.history().last_event(None).unwrap().kind, "b");
    }

    #[test]
    fn remove_all_listeners_clears_kind_or_everything() {
        let mut bus = EventBus::default();
        bus.on("a", Box::new(|_| {}));
        bus.on("a", Box::new(|_| {}));
        bus.on("b", Box::new(|_| {}));

        bus.remove_all_listeners(Some("a"));
        assert_eq!(bus.listener_count("a"), 0);
        assert_eq!(bus.listener_count("b"), 1);

        bus.remove_all_listeners(None);
        assert_eq!(bus.listener_count("b"), 0);
    }
}
