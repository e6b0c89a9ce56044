//! Weak subscription relays between owners and subjects

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use tracing::trace;

use crate::error::RelayError;
use crate::event::PropertyEvent;
use crate::owner::OwnerRef;
use crate::registry::{RelayRegistry, StaleSubscription};
use crate::subject::{ChangeSubscriber, Subject};

/// Handler invoked when the owner is live and the subject fired
pub type RelayHandler<O, E> = dyn Fn(&O, &Subject<E>, &E) + Send + Sync;

/// Lifecycle of a subscription relay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    /// Owner is reachable and the relay forwards notifications
    Active,
    /// Owner has been reclaimed but the relay has not yet been deregistered
    OwnerReclaimedPending,
    /// Deregistered from the subject; terminal
    Removed,
}

/// Relays property-change notifications from a subject to an owner, for as
/// long as the owner stays alive elsewhere
///
/// The relay holds the subject strongly and the owner weakly: subscribing
/// never becomes the sole reason an otherwise-dropped owner stays alive,
/// while the subject is kept alive for the life of the subscription.
///
/// Cleanup of a relay whose owner has been reclaimed happens through
/// whichever of two paths is reached first, and each path tolerates the
/// other having won:
///
/// - **Drain on construction.** Creating any new relay through the same
///   registry drains the reclamation queue and deregisters every stale
///   relay found there.
/// - **Self-removal on notification.** A fire that reaches a relay whose
///   owner no longer upgrades deregisters that relay instead of invoking
///   the handler.
///
/// The handler is never invoked with a reclaimed owner.
///
/// # Example
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use prop_relay_core::{Owner, PropertyChange, RelayRegistry, Subject, SubscriptionRelay};
///
/// let registry = RelayRegistry::new();
/// let subject: Subject<PropertyChange> = Subject::new();
/// let owner = Owner::new(AtomicUsize::new(0));
///
/// let relay = SubscriptionRelay::create(
///     &owner.downgrade(),
///     &subject,
///     &registry,
///     |owner, _subject, _event| {
///         owner.fetch_add(1, Ordering::SeqCst);
///     },
/// )
/// .expect("owner is live");
/// relay.attach();
///
/// subject.fire(PropertyChange::new("value", 1, 2));
/// assert_eq!(owner.load(Ordering::SeqCst), 1);
///
/// // Once the owner drops, the next relay created through this registry
/// // sweeps the stale registration away.
/// drop(owner);
/// let keeper = Owner::new(AtomicUsize::new(0));
/// let _other = SubscriptionRelay::create(
///     &keeper.downgrade(),
///     &subject,
///     &registry,
///     |_, _, _| {},
/// )
/// .expect("owner is live");
/// assert_eq!(subject.subscriber_count(), 0);
/// ```
pub struct SubscriptionRelay<O, E>
where
    O: Send + Sync + 'static,
    E: PropertyEvent,
{
    owner: OwnerRef<O>,
    subject: Subject<E>,
    handler: Box<RelayHandler<O, E>>,
    /// Identity of this relay inside the subject's subscriber list
    this: Weak<Self>,
    /// Latch so the race path and the drain path converge on one removal
    removed: AtomicBool,
}

impl<O, E> SubscriptionRelay<O, E>
where
    O: Send + Sync + 'static,
    E: PropertyEvent,
{
    /// Create a relay between `owner` and `subject`
    ///
    /// Drains `registry` first, so the cost of cleaning up reclaimed owners
    /// is amortized across new subscriptions. Fails fast with
    /// [`RelayError::InvalidSubscription`] if the owner has already been
    /// reclaimed; no partial state is created in that case.
    ///
    /// The returned relay is not yet registered on the subject - call
    /// [`attach`](Self::attach), or pass it to
    /// [`Subject::add_change_subscriber`] yourself. Creating more than one
    /// relay for the same (owner, subject) pair is legal; duplicates are
    /// cleaned up independently.
    pub fn create<F>(
        owner: &OwnerRef<O>,
        subject: &Subject<E>,
        registry: &RelayRegistry,
        handler: F,
    ) -> Result<Arc<Self>, RelayError>
    where
        F: Fn(&O, &Subject<E>, &E) + Send + Sync + 'static,
    {
        registry.drain();

        let token = owner.token().ok_or(RelayError::InvalidSubscription)?;
        if owner.upgrade().is_none() {
            return Err(RelayError::InvalidSubscription);
        }

        let relay = Arc::new_cyclic(|this| Self {
            owner: owner.clone(),
            subject: subject.clone(),
            handler: Box::new(handler),
            this: this.clone(),
            removed: AtomicBool::new(false),
        });
        token.watch(
            registry.clone(),
            Arc::downgrade(&relay) as Weak<dyn StaleSubscription>,
        );
        trace!("subscription relay created");
        Ok(relay)
    }

    /// Register this relay as a subscriber on its subject
    pub fn attach(&self) {
        // The self-pointer always upgrades here: relays are only ever
        // handed out inside an Arc.
        if let Some(me) = self.this.upgrade() {
            self.subject
                .add_change_subscriber(me as Arc<dyn ChangeSubscriber<E>>);
        }
    }

    /// Remove this relay from its subject
    ///
    /// Idempotent: only the first call reaches the subject, every later
    /// call (from the drain path, the notification race path, or the
    /// application discarding the subject) is a silent no-op.
    pub fn deregister(&self) {
        if self.removed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(me) = self.this.upgrade() {
            self.subject
                .remove_change_subscriber(&(me as Arc<dyn ChangeSubscriber<E>>));
        }
        trace!("subscription relay deregistered");
    }

    /// Current lifecycle state, for observability
    pub fn state(&self) -> SubscriptionState {
        if self.removed.load(Ordering::Acquire) {
            SubscriptionState::Removed
        } else if self.owner.is_expired() {
            SubscriptionState::OwnerReclaimedPending
        } else {
            SubscriptionState::Active
        }
    }

    /// The subject this relay observes
    pub fn subject(&self) -> &Subject<E> {
        &self.subject
    }
}

impl<O, E> ChangeSubscriber<E> for SubscriptionRelay<O, E>
where
    O: Send + Sync + 'static,
    E: PropertyEvent,
{
    fn property_changed(&self, event: &E) {
        match self.owner.upgrade() {
            Some(owner) => (self.handler)(&owner, &self.subject, event),
            None => {
                // Reclaimed before the registry drained this relay: take
                // the self-removal path instead of forwarding.
                trace!(
                    property = event.property(),
                    "owner reclaimed, relay removing itself"
                );
                self.deregister();
            }
        }
    }
}

impl<O, E> StaleSubscription for SubscriptionRelay<O, E>
where
    O: Send + Sync + 'static,
    E: PropertyEvent,
{
    fn deregister(&self) {
        Self::deregister(self);
    }
}

impl<O, E> fmt::Debug for SubscriptionRelay<O, E>
where
    O: Send + Sync + 'static,
    E: PropertyEvent,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionRelay")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::owner::Owner;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    #[derive(Clone, Debug, PartialEq)]
    struct TestEvent(u32);

    impl PropertyEvent for TestEvent {
        fn property(&self) -> &str {
            "value"
        }
    }

    struct Counter {
        seen: AtomicUsize,
    }

    fn counting_owner() -> Owner<Counter> {
        Owner::new(Counter {
            seen: AtomicUsize::new(0),
        })
    }

    fn counting_relay(
        owner: &Owner<Counter>,
        subject: &Subject<TestEvent>,
        registry: &RelayRegistry,
    ) -> Arc<SubscriptionRelay<Counter, TestEvent>> {
        let relay = SubscriptionRelay::create(
            &owner.downgrade(),
            subject,
            registry,
            |owner: &Counter, _subject, _event| {
                owner.seen.fetch_add(1, Ordering::SeqCst);
            },
        )
        .expect("owner is live");
        relay.attach();
        relay
    }

    #[test]
    fn test_live_owner_receives_notifications() {
        let registry = RelayRegistry::new();
        let subject = Subject::new();
        let owner = counting_owner();
        let relay = counting_relay(&owner, &subject, &registry);

        subject.fire(TestEvent(1));
        subject.fire(TestEvent(2));

        assert_eq!(owner.seen.load(Ordering::SeqCst), 2);
        assert_eq!(relay.state(), SubscriptionState::Active);
    }

    #[test]
    fn test_create_rejects_expired_owner() {
        let registry = RelayRegistry::new();
        let subject: Subject<TestEvent> = Subject::new();
        let owner = counting_owner();
        let weak = owner.downgrade();
        drop(owner);

        let result =
            SubscriptionRelay::create(&weak, &subject, &registry, |_: &Counter, _, _| {});
        assert_eq!(result.err(), Some(RelayError::InvalidSubscription));
        // Fail-fast means no residual registration anywhere.
        assert_eq!(subject.subscriber_count(), 0);
        assert_eq!(registry.drain(), 0);
    }

    #[test]
    fn test_notification_race_takes_self_removal_path() {
        let registry = RelayRegistry::new();
        let subject = Subject::new();
        let owner = counting_owner();
        let relay = counting_relay(&owner, &subject, &registry);

        drop(owner);
        assert_eq!(relay.state(), SubscriptionState::OwnerReclaimedPending);

        // The registry has not drained yet; a fire reaches the stale relay.
        subject.fire(TestEvent(1));

        assert_eq!(relay.state(), SubscriptionState::Removed);
        assert_eq!(subject.subscriber_count(), 0);
    }

    #[test]
    fn test_construction_drains_stale_relays() {
        let registry = RelayRegistry::new();
        let subject = Subject::new();

        let stale_owner = counting_owner();
        let stale = counting_relay(&stale_owner, &subject, &registry);
        drop(stale_owner);
        assert_eq!(subject.subscriber_count(), 1);

        // A new subscription anywhere in the same registry sweeps it away.
        let live_owner = counting_owner();
        let _live = counting_relay(&live_owner, &subject, &registry);

        assert_eq!(subject.subscriber_count(), 1);
        assert_eq!(stale.state(), SubscriptionState::Removed);
    }

    #[test]
    fn test_deregister_is_idempotent() {
        let registry = RelayRegistry::new();
        let subject = Subject::new();
        let owner = counting_owner();
        let other = counting_relay(&owner, &subject, &registry);
        let relay = counting_relay(&owner, &subject, &registry);
        assert_eq!(subject.subscriber_count(), 2);

        relay.deregister();
        relay.deregister();

        assert_eq!(subject.subscriber_count(), 1);
        assert_eq!(relay.state(), SubscriptionState::Removed);
        assert_eq!(other.state(), SubscriptionState::Active);
    }

    #[test]
    fn test_handler_never_sees_reclaimed_owner() {
        let registry = RelayRegistry::new();
        let subject = Subject::new();
        let owner = counting_owner();

        let invoked = Arc::new(AtomicUsize::new(0));
        let invoked_in_handler = invoked.clone();
        let relay = SubscriptionRelay::create(
            &owner.downgrade(),
            &subject,
            &registry,
            move |_: &Counter, _, _| {
                invoked_in_handler.fetch_add(1, Ordering::SeqCst);
            },
        )
        .expect("owner is live");
        relay.attach();

        drop(owner);
        subject.fire(TestEvent(1));
        subject.fire(TestEvent(2));

        assert_eq!(invoked.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_relay_keeps_subject_alive_not_owner() {
        let registry = RelayRegistry::new();
        let subject = Subject::new();
        let owner = counting_owner();
        let weak = owner.downgrade();
        let relay = counting_relay(&owner, &subject, &registry);

        // Dropping every application handle to the subject leaves the
        // relay's strong reference as the last one standing.
        drop(subject);
        relay.subject().fire(TestEvent(1));
        assert_eq!(owner.seen.load(Ordering::SeqCst), 1);

        // The relay's weak owner reference adds no liveness.
        drop(owner);
        assert!(weak.is_expired());
    }

    #[test]
    fn test_duplicate_relays_clean_up_independently() {
        let registry = RelayRegistry::new();
        let subject = Subject::new();
        let owner = counting_owner();
        let _first = counting_relay(&owner, &subject, &registry);
        let _second = counting_relay(&owner, &subject, &registry);

        subject.fire(TestEvent(1));
        assert_eq!(owner.seen.load(Ordering::SeqCst), 2);

        drop(owner);
        let keeper = counting_owner();
        let _keeper_relay = counting_relay(&keeper, &subject, &registry);
        assert_eq!(subject.subscriber_count(), 1);
    }

    #[test]
    fn test_handler_receives_event_subject_and_owner() {
        let registry = RelayRegistry::new();
        let subject: Subject<TestEvent> = Subject::new();
        let owner = Owner::new(String::from("owner"));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_in_handler = seen.clone();
        let relay = SubscriptionRelay::create(
            &owner.downgrade(),
            &subject,
            &registry,
            move |owner: &String, subject, event: &TestEvent| {
                assert_eq!(subject.subscriber_count(), 1);
                seen_in_handler
                    .lock()
                    .expect("seen lock")
                    .push((owner.clone(), event.0));
            },
        )
        .expect("owner is live");
        relay.attach();

        subject.fire(TestEvent(9));
        assert_eq!(
            *seen.lock().expect("seen lock"),
            vec![(String::from("owner"), 9)]
        );
    }
}
