//! Bounded retention of emitted events with recency queries.
//!
//! All window queries take the caller's current timestamp explicitly; the
//! history never reads a wall clock, so replayed sessions and tests behave
//! identically to live input.

use std::collections::VecDeque;

use crate::pipeline::frame::Handedness;
use crate::store::event::Event;

/// Default cap for retained events; oldest evicted first.
pub const DEFAULT_EVENT_RETENTION: usize = 100;

/// Append-only, bounded log of emitted events.
pub struct EventHistory {
    events: VecDeque<Event>,
    max_size: usize,
}

impl Default for EventHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHistory {
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_EVENT_RETENTION)
    }

    pub fn with_retention(max_size: usize) -> Self {
        Self {
            events: VecDeque::new(),
            max_size: max_size.max(1),
        }
    }

    /// Appends an event, evicting the oldest entry when the cap is reached.
    pub fn add(&mut self, event: Event) {
        self.events.push_back(event);
        while self.events.len() > self.max_size {
            self.events.pop_front();
        }
    }

    /// Events whose timestamp lies within `window_ms` of `now_ms`.
    pub fn recent_events(&self, window_ms: f64, now_ms: f64) -> Vec<&Event> {
        let min_ts = now_ms - window_ms;
        self.events.iter().filter(|e| e.timestamp_ms >= min_ts).collect()
    }

    /// All retained events of a given kind, oldest first.
    pub fn events_by_kind(&self, kind: &str) -> Vec<&Event> {
        self.events.iter().filter(|e| e.kind == kind).collect()
    }

    /// Events of a given kind within `window_ms` of `now_ms`.
    pub fn events_by_kind_within(&self, kind: &str, window_ms: f64, now_ms: f64) -> Vec<&Event> {
        let min_ts = now_ms - window_ms;
        self.events
            .iter()
            .filter(|e| e.kind == kind && e.timestamp_ms >= min_ts)
            .collect()
    }

    /// Most recent event, optionally restricted to a kind.
    pub fn last_event(&self, kind: Option<&str>) -> Option<&Event> {
        match kind {
            Some(kind) => self.events.iter().rev().find(|e| e.kind == kind),
            None => self.events.back(),
        }
    }

    /// Recency check used to suppress duplicate downstream reactions: did an
    /// event of this kind (optionally for this hand) occur within
    /// `window_ms` of `now_ms`?
    pub fn was_emitted_recently(
        &self,
        kind: &str,
        window_ms: f64,
        hand: Option<Handedness>,
        now_ms: f64,
    ) -> bool {
        let min_ts = now_ms - window_ms;
        self.events.iter().rev().any(|e| {
            e.kind == kind
                && e.timestamp_ms >= min_ts
                && (hand.is_none() || e.hand == hand)
        })
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
