//! Shared state owned by the pipeline: the feature store and the event bus
//! with its bounded history.
//!
//! Both stores are constructed by the pipeline (one instance each, lifecycle
//! = pipeline lifetime) and handed to components per processing turn; there
//! is no ambient global instance.

pub mod event;
pub mod event_bus;
pub mod event_history;
pub mod feature;
pub mod feature_store;

pub use event::{Event, EventPayload, TapSnapshot, TAP_DETECTED, TAP_TIP_DETECTED};
pub use event_bus::{EventBus, EventCallback, ListenerId, WILDCARD};
pub use event_history::EventHistory;
pub use feature::{feature_key, Feature, FeatureDisplay, FeatureKind, FeatureValue};
pub use feature_store::{FeatureCallback, FeatureStore, StoreStats, SubscriptionId};
