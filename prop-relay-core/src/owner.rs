//! Owner handles and lifetime tokens
//!
//! Rust has no tracing collector, so "the owner became unreachable" is made
//! explicit: the application holds its listener target through an [`Owner`]
//! handle, and relays hold [`OwnerRef`] weak handles. When the last `Owner`
//! clone drops, its lifetime token's destructor pushes every watching
//! subscription onto the registry's reclamation queue. That destructor is
//! the enqueue-on-reclaim primitive; relay code never enqueues.

use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, Mutex, Weak};

use tracing::trace;

use crate::registry::{RelayRegistry, StaleSubscription};
use crate::subject::lock;

/// Strong, clonable handle to a relay owner
///
/// The application keeps an `Owner<T>` alive for as long as `T` should keep
/// receiving notifications. Relays only ever hold [`OwnerRef`]s, so a
/// subscription is never the reason an otherwise-dropped owner stays alive.
///
/// Cloning shares the underlying value and lifetime token; reclamation
/// fires once, when the last clone drops.
pub struct Owner<T: Send + Sync + 'static> {
    // Declared before `token` so weak upgrades of the value already fail
    // by the time the token's destructor enqueues watchers.
    value: Arc<T>,
    token: Arc<LifetimeToken>,
}

/// Weak handle to a relay owner
///
/// This is what subscriptions store. `upgrade` resolves to the live owner
/// or `None` once every [`Owner`] clone has been dropped.
pub struct OwnerRef<T: Send + Sync + 'static> {
    value: Weak<T>,
    token: Weak<LifetimeToken>,
}

/// Shared token whose destructor reports owner reclamation
///
/// Holds weak back-pointers to every subscription watching this owner,
/// paired with the registry each subscription drains through.
pub(crate) struct LifetimeToken {
    watchers: Mutex<Vec<(RelayRegistry, Weak<dyn StaleSubscription>)>>,
}

impl LifetimeToken {
    /// Register a subscription to be enqueued when this owner is reclaimed
    pub(crate) fn watch(&self, registry: RelayRegistry, subscription: Weak<dyn StaleSubscription>) {
        lock(&self.watchers).push((registry, subscription));
    }
}

impl Drop for LifetimeToken {
    fn drop(&mut self) {
        let watchers = std::mem::take(&mut *lock(&self.watchers));
        if !watchers.is_empty() {
            trace!(watchers = watchers.len(), "owner reclaimed, enqueueing subscriptions");
        }
        for (registry, subscription) in watchers {
            registry.enqueue(subscription);
        }
    }
}

impl<T: Send + Sync + 'static> Owner<T> {
    /// Wrap a value in an owner handle
    pub fn new(value: T) -> Self {
        Self {
            value: Arc::new(value),
            token: Arc::new(LifetimeToken {
                watchers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Create a weak handle suitable for storing in a subscription
    pub fn downgrade(&self) -> OwnerRef<T> {
        OwnerRef {
            value: Arc::downgrade(&self.value),
            token: Arc::downgrade(&self.token),
        }
    }

    /// Borrow the owned value
    pub fn get(&self) -> &T {
        &self.value
    }
}

impl<T: Send + Sync + 'static> Clone for Owner<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            token: self.token.clone(),
        }
    }
}

impl<T: Send + Sync + 'static> Deref for Owner<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T: Send + Sync + 'static + fmt::Debug> fmt::Debug for Owner<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Owner").field(&self.value).finish()
    }
}

impl<T: Send + Sync + 'static> OwnerRef<T> {
    /// Resolve the owner, if it is still alive
    pub fn upgrade(&self) -> Option<Arc<T>> {
        self.value.upgrade()
    }

    /// Whether the owner has been reclaimed
    pub fn is_expired(&self) -> bool {
        self.value.strong_count() == 0
    }

    pub(crate) fn token(&self) -> Option<Arc<LifetimeToken>> {
        self.token.upgrade()
    }
}

impl<T: Send + Sync + 'static> Clone for OwnerRef<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            token: self.token.clone(),
        }
    }
}

impl<T: Send + Sync + 'static> fmt::Debug for OwnerRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnerRef")
            .field("expired", &self.is_expired())
            .finish()
    }
}
