//! Shared reclamation queue for stale subscriptions

use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, Weak};

use tokio::sync::mpsc;
use tracing::debug;

use crate::subject::lock;

/// A subscription whose owner has been reclaimed and which can remove
/// itself from its subject
///
/// Implemented by the relay; the registry only needs enough of a
/// back-pointer to reach the stored subject for deregistration.
/// `deregister` must be idempotent: the reclamation drain and the
/// stale-notification path may both call it.
pub trait StaleSubscription: Send + Sync {
    /// Remove this subscription from its subject; a no-op if already removed
    fn deregister(&self);
}

/// Collection point for subscriptions whose owners have been dropped
///
/// Owner lifetime tokens enqueue a back-pointer here from their destructor;
/// relay construction drains the queue opportunistically. There is no
/// background sweeper: cleanup latency is bounded by the rate of new
/// subscriptions, which tracks the same object population. Applications
/// wanting a tighter bound can call [`RelayRegistry::drain`] from their own
/// tick.
///
/// Handles are cheap clones of one shared queue. Enqueue is safe from any
/// thread, including inside destructors; drain is safe from any number of
/// concurrent callers (pops are serialized, so no entry is ever seen twice).
#[derive(Clone)]
pub struct RelayRegistry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    tx: mpsc::UnboundedSender<Weak<dyn StaleSubscription>>,
    rx: Mutex<mpsc::UnboundedReceiver<Weak<dyn StaleSubscription>>>,
}

impl fmt::Debug for RelayRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayRegistry").finish_non_exhaustive()
    }
}

impl Default for RelayRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RelayRegistry {
    /// Create a scoped registry
    ///
    /// Scoped registries isolate one subject category (or one test) from
    /// the process-wide queue.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(RegistryInner {
                tx,
                rx: Mutex::new(rx),
            }),
        }
    }

    /// The process-wide registry, created lazily on first use
    ///
    /// Lives for the process lifetime; there is no teardown. Entries left
    /// undrained at exit are irrelevant by then.
    pub fn global() -> &'static Self {
        static GLOBAL: OnceLock<RelayRegistry> = OnceLock::new();
        GLOBAL.get_or_init(Self::new)
    }

    /// Enqueue a reclaimed subscription for deferred deregistration
    ///
    /// Called from owner lifetime-token destructors, never from relay code
    /// paths. Never blocks.
    pub(crate) fn enqueue(&self, stale: Weak<dyn StaleSubscription>) {
        // The receiver lives inside the same inner, so the channel cannot
        // close while a sender exists.
        let _ = self.inner.tx.send(stale);
    }

    /// Drain the queue, deregistering every stale subscription found
    ///
    /// Non-blocking: polls until the queue is empty and returns the number
    /// of subscriptions actually removed. Entries whose relay has itself
    /// been dropped are skipped.
    pub fn drain(&self) -> usize {
        // Pop everything under the lock, deregister after releasing it so
        // subject locks are never taken while holding the queue.
        let mut stale = Vec::new();
        {
            let mut rx = lock(&self.inner.rx);
            while let Ok(entry) = rx.try_recv() {
                stale.push(entry);
            }
        }

        let mut removed = 0;
        for entry in stale {
            if let Some(subscription) = entry.upgrade() {
                subscription.deregister();
                removed += 1;
            }
        }
        if removed > 0 {
            debug!(removed, "drained stale subscriptions");
        }
        removed
    }
}
