//! Core traits and types for prop-relay
//!
//! This crate provides weak-reference property-change relays: a way for a
//! long-lived subject to notify a shorter-lived owner without the
//! subscription itself keeping the owner alive, and without stale
//! registrations leaking once the owner is gone.
//!
//! # Core Concepts
//!
//! - **Subject**: the observed object; fires [`PropertyEvent`]s to its
//!   subscribers, snapshotting the subscriber list per fire
//! - **Owner**: the logical listener target, held by the application
//!   through a strong [`Owner`] handle and by relays through weak
//!   [`OwnerRef`]s
//! - **SubscriptionRelay**: the link between the two; holds the subject
//!   strongly, the owner weakly, and removes itself once the owner is gone
//! - **RelayRegistry**: the shared reclamation queue that owner destructors
//!   enqueue onto and relay construction drains
//!
//! # Basic Example
//!
//! ```
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use prop_relay_core::{Owner, PropertyChange, RelayRegistry, Subject, SubscriptionRelay};
//!
//! let registry = RelayRegistry::new();
//! let model: Subject<PropertyChange> = Subject::new();
//!
//! // The "owner" is whatever should receive notifications while it lives -
//! // here just a counter standing in for a widget.
//! let widget = Owner::new(AtomicUsize::new(0));
//!
//! let relay = SubscriptionRelay::create(
//!     &widget.downgrade(),
//!     &model,
//!     &registry,
//!     |widget, _model, event| {
//!         assert_eq!(event.property, "value");
//!         widget.fetch_add(1, Ordering::SeqCst);
//!     },
//! )
//! .expect("widget is live");
//! relay.attach();
//!
//! model.fire(PropertyChange::new("value", 1, 2));
//! assert_eq!(widget.load(Ordering::SeqCst), 1);
//!
//! // Dropping the widget expires the relay; the next subscription created
//! // through the same registry sweeps the stale registration off the model.
//! drop(widget);
//! model.fire(PropertyChange::new("value", 2, 3)); // self-removal, no handler call
//! assert_eq!(model.subscriber_count(), 0);
//! ```
//!
//! # Cleanup model
//!
//! There is no background sweeper. A relay whose owner is gone is removed
//! by whichever comes first:
//!
//! 1. any new relay creation through the same [`RelayRegistry`] (drain on
//!    construction), or
//! 2. the next fire on its subject (self-removal on notification).
//!
//! Both paths funnel through one idempotent deregistration, so racing them
//! is harmless. If neither happens, the stale entry sits in the queue until
//! process exit - call [`RelayRegistry::drain`] periodically if that bound
//! is too loose for your application.

pub mod error;
pub mod event;
pub mod owner;
pub mod registry;
pub mod relay;
pub mod subject;
pub mod testing;

pub use error::RelayError;
pub use event::{PropertyChange, PropertyEvent};
pub use owner::{Owner, OwnerRef};
pub use registry::{RelayRegistry, StaleSubscription};
pub use relay::{RelayHandler, SubscriptionRelay, SubscriptionState};
pub use subject::{ChangeSubscriber, Subject};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::RelayError;
    pub use crate::event::{PropertyChange, PropertyEvent};
    pub use crate::owner::{Owner, OwnerRef};
    pub use crate::registry::RelayRegistry;
    pub use crate::relay::{SubscriptionRelay, SubscriptionState};
    pub use crate::subject::{ChangeSubscriber, Subject};
}
