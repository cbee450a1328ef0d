//! Keyed feature store with bounded per-key history and exact-key
//! subscriptions.
//!
//! The store is the single owner of all derived features: extractors write,
//! analyzers and external consumers read. Every write appends to a bounded
//! rolling history (oldest evicted first) and synchronously notifies the
//! subscribers registered for that exact key. There are no wildcard feature
//! subscriptions.
//!
//! # Architecture
//!
//! ```text
//! Extractors ──► set_feature ──► current value map
//!                     │               │
//!                     ├──► bounded history (per key)
//!                     └──► subscriber callbacks (per key, isolated)
//! ```

use std::collections::{HashMap, VecDeque};
use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::{debug, warn};

use crate::pipeline::frame::Handedness;
use crate::store::feature::{feature_key, Feature, FeatureDisplay, FeatureKind};

/// Default cap for the per-key rolling history.
pub const DEFAULT_HISTORY_SIZE: usize = 100;

/// Callback invoked synchronously for every update of a subscribed key.
pub type FeatureCallback = Box<dyn FnMut(&Feature) + Send>;

/// Token returned by [`FeatureStore::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct SubscriberEntry {
    id: SubscriptionId,
    callback: FeatureCallback,
}

/// Summary counters exposed for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub total_features: usize,
    pub total_history_entries: usize,
}

/// Single source of truth for all derived features of one pipeline.
pub struct FeatureStore {
    features: HashMap<String, Feature>,
    history: HashMap<String, VecDeque<Feature>>,
    max_history: usize,
    subscribers: HashMap<String, Vec<SubscriberEntry>>,
    next_subscription: u64,
}

impl FeatureStore {
    pub fn new() -> Self {
        Self::with_history_size(DEFAULT_HISTORY_SIZE)
    }

    pub fn with_history_size(max_history: usize) -> Self {
        Self {
            features: HashMap::new(),
            history: HashMap::new(),
            max_history: max_history.max(1),
            subscribers: HashMap::new(),
            next_subscription: 0,
        }
    }

    /// Stores `feature` as the current value under its key, appends it to the
    /// bounded history and synchronously notifies subscribers of that key.
    ///
    /// A panicking subscriber is caught and logged; remaining subscribers are
    /// still notified.
    pub fn set_feature(&mut self, feature: Feature) {
        let key = feature.key();

        let entry = self.history.entry(key.clone()).or_default();
        entry.push_back(feature.clone());
        while entry.len() > self.max_history {
            entry.pop_front();
        }

        self.features.insert(key.clone(), feature.clone());
        self.notify_subscribers(&key, &feature);
    }

    /// Current value for `name` (+ optional hand tag), if any.
    pub fn get_feature(&self, name: &str, hand: Option<Handedness>) -> Option<&Feature> {
        self.features.get(&feature_key(name, hand))
    }

    /// Numeric shortcut for the overwhelmingly common case.
    pub fn get_number(&self, name: &str, hand: Option<Handedness>) -> Option<f64> {
        self.get_feature(name, hand).and_then(Feature::as_number)
    }

    /// Up to the last `count` history entries for a key, oldest first.
    /// `None` returns the whole retained history.
    pub fn feature_history(
        &self,
        name: &str,
        hand: Option<Handedness>,
        count: Option<usize>,
    ) -> Vec<Feature> {
        let Some(entries) = self.history.get(&feature_key(name, hand)) else {
            return Vec::new();
        };
        let take = count.unwrap_or(entries.len()).min(entries.len());
        entries.iter().skip(entries.len() - take).cloned().collect()
    }

    /// All current features, keyed.
    pub fn all_features(&self) -> impl Iterator<Item = (&String, &Feature)> {
        self.features.iter()
    }

    /// Current features filtered by value kind.
    pub fn features_by_kind(&self, kind: FeatureKind) -> Vec<&Feature> {
        self.features.values().filter(|f| f.kind() == kind).collect()
    }

    /// Current features filtered by producing extractor.
    pub fn features_by_parent(&self, parent: &str) -> Vec<&Feature> {
        self.features.values().filter(|f| f.parent == parent).collect()
    }

    /// Current features filtered by hand tag.
    pub fn features_by_hand(&self, hand: Handedness) -> Vec<&Feature> {
        self.features
            .values()
            .filter(|f| f.hand == Some(hand))
            .collect()
    }

    /// Current features whose display hint asks for a rolling graph.
    pub fn graphable_features(&self) -> Vec<&Feature> {
        self.features
            .values()
            .filter(|f| f.display == FeatureDisplay::Graph)
            .collect()
    }

    /// Registers a callback for exact-key updates. Returns a token for
    /// [`FeatureStore::unsubscribe`].
    pub fn subscribe(
        &mut self,
        name: &str,
        hand: Option<Handedness>,
        callback: FeatureCallback,
    ) -> SubscriptionId {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.subscribers
            .entry(feature_key(name, hand))
            .or_default()
            .push(SubscriberEntry { id, callback });
        debug!("Feature subscription {:?} registered for {}", id, name);
        id
    }

    /// Removes a subscription by token. Returns whether an entry was removed.
    pub fn unsubscribe(&mut self, name: &str, hand: Option<Handedness>, id: SubscriptionId) -> bool {
        let key = feature_key(name, hand);
        if let Some(entries) = self.subscribers.get_mut(&key) {
            let before = entries.len();
            entries.retain(|entry| entry.id != id);
            return entries.len() != before;
        }
        false
    }

    /// Drops all current values and history. Subscriptions survive.
    pub fn clear(&mut self) {
        self.features.clear();
        self.history.clear();
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            total_features: self.features.len(),
            total_history_entries: self.history.values().map(VecDeque::len).sum(),
        }
    }

    fn notify_subscribers(&mut self, key: &str, feature: &Feature) {
        let Some(entries) = self.subscribers.get_mut(key) else {
            return;
        };
        for entry in entries.iter_mut() {
            let result = catch_unwind(AssertUnwindSafe(|| (entry.callback)(feature)));
            if result.is_err() {
                warn!(
                    "Feature subscriber {:?} for key '{}' panicked; continuing with remaining subscribers",
                    entry.id, key
                );
            }
        }
    }
}

impl Default for FeatureStore {
    fn default() -> Self {
        Self::new()
    }
}
