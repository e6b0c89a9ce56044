//! Test helpers for relay-based code
//!
//! Small subscribers for asserting on delivery counts and ordering without
//! hand-rolling a mutex-and-vec in every test.

use std::sync::Mutex;

use crate::event::PropertyEvent;
use crate::subject::{lock, ChangeSubscriber};

/// A subscriber that records every event it receives, in delivery order
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use prop_relay_core::{PropertyChange, Subject};
/// use prop_relay_core::testing::RecordingSubscriber;
///
/// let subject: Subject<PropertyChange> = Subject::new();
/// let recorder = Arc::new(RecordingSubscriber::new());
/// subject.add_change_subscriber(recorder.clone());
///
/// subject.fire(PropertyChange::new("x", 0, 1));
/// subject.fire(PropertyChange::new("y", 1, 2));
///
/// let properties: Vec<String> =
///     recorder.events().iter().map(|e| e.property.clone()).collect();
/// assert_eq!(properties, ["x", "y"]);
/// ```
#[derive(Debug, Default)]
pub struct RecordingSubscriber<E> {
    events: Mutex<Vec<E>>,
}

impl<E: PropertyEvent> RecordingSubscriber<E> {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of every event received so far
    pub fn events(&self) -> Vec<E> {
        lock(&self.events).clone()
    }

    /// Number of events received
    pub fn len(&self) -> usize {
        lock(&self.events).len()
    }

    /// Whether no events have been received
    pub fn is_empty(&self) -> bool {
        lock(&self.events).is_empty()
    }

    /// Forget everything received so far
    pub fn clear(&self) {
        lock(&self.events).clear();
    }
}

impl<E: PropertyEvent> ChangeSubscriber<E> for RecordingSubscriber<E> {
    fn property_changed(&self, event: &E) {
        lock(&self.events).push(event.clone());
    }
}
