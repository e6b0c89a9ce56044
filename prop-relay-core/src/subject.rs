//! Observed subjects and their subscriber lists

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::event::PropertyEvent;

/// Lock a mutex, recovering the guard if a panicking holder poisoned it.
///
/// Subscriber handlers are application code and may panic; the lists they
/// live in stay usable afterwards.
pub(crate) fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Receiver side of a property-change notification
///
/// Implementors are registered on a [`Subject`] and called synchronously,
/// on the firing thread, for every event the subject fires.
pub trait ChangeSubscriber<E>: Send + Sync {
    /// Handle one property change
    fn property_changed(&self, event: &E);
}

/// An observed object that fires property-change events to subscribers
///
/// `Subject` is a cheaply clonable shared handle; clones observe the same
/// subscriber list. Subscribers are compared by identity (the allocation
/// behind the `Arc`), so removing a subscriber that was never added, or was
/// already removed, is a silent no-op.
///
/// # Type Parameters
/// * `E` - The event type (must implement [`PropertyEvent`])
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
/// subject.fire(PropertyChange::new("value", 1, 2));
/// assert_eq!(recorder.len(), 1);
/// ```
pub struct Subject<E: PropertyEvent> {
    inner: Arc<SubjectInner<E>>,
}

struct SubjectInner<E> {
    subscribers: Mutex<Vec<Arc<dyn ChangeSubscriber<E>>>>,
}

impl<E: PropertyEvent> Clone for Subject<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<E: PropertyEvent> Default for Subject<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: PropertyEvent> fmt::Debug for Subject<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subject")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl<E: PropertyEvent> Subject<E> {
    /// Create a new subject with no subscribers
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SubjectInner {
                subscribers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Register a subscriber
    ///
    /// The same subscriber may be added more than once; it will then be
    /// notified once per registration.
    pub fn add_change_subscriber(&self, subscriber: Arc<dyn ChangeSubscriber<E>>) {
        lock(&self.inner.subscribers).push(subscriber);
    }

    /// Remove a subscriber by identity
    ///
    /// Removes every registration of this exact subscriber. Removing a
    /// subscriber that is not registered is a no-op, not an error - both
    /// the reclamation drain and the stale-notification path may race to
    /// remove the same relay.
    pub fn remove_change_subscriber(&self, subscriber: &Arc<dyn ChangeSubscriber<E>>) {
        let target = Arc::as_ptr(subscriber) as *const ();
        lock(&self.inner.subscribers).retain(|s| Arc::as_ptr(s) as *const () != target);
    }

    /// Fire an event to every current subscriber
    ///
    /// The subscriber list is snapshotted before any handler runs, so a
    /// handler may remove itself (or any other subscriber) without
    /// invalidating the iteration. Removals triggered mid-fire take effect
    /// from the next fire onwards. Dispatch is synchronous on the calling
    /// thread, in registration order.
    pub fn fire(&self, event: E) {
        let snapshot: Vec<Arc<dyn ChangeSubscriber<E>>> = lock(&self.inner.subscribers).clone();
        tracing::trace!(
            property = event.property(),
            subscribers = snapshot.len(),
            "firing property change"
        );
        for subscriber in &snapshot {
            subscriber.property_changed(&event);
        }
    }

    /// Number of registered subscribers
    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner.subscribers).len()
    }

    /// Whether this subject has no subscribers
    pub fn has_no_subscribers(&self) -> bool {
        self.subscriber_count() == 0
    }
}
