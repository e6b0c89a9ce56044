//! prop-relay: Weak-reference property-change relays for Rust UI toolkits
//!
//! A [`SubscriptionRelay`] forwards change notifications from a long-lived
//! subject (a model) to a shorter-lived owner (a widget) while the owner is
//! alive elsewhere in the program, and removes itself once the owner is
//! gone. Subscribing never keeps the owner alive, and stale registrations
//! are swept away without a background thread: owner destructors enqueue
//! onto a shared [`RelayRegistry`], and every new subscription drains it.
//!
//! # Example
//! ```
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use prop_relay::prelude::*;
//!
//! let registry = RelayRegistry::new();
//! let model: Subject<PropertyChange> = Subject::new();
//! let widget = Owner::new(AtomicUsize::new(0));
//!
//! let relay = SubscriptionRelay::create(
//!     &widget.downgrade(),
//!     &model,
//!     &registry,
//!     |widget, _model, _event| {
//!         widget.fetch_add(1, Ordering::SeqCst);
//!     },
//! )
//! .expect("widget is live");
//! relay.attach();
//!
//! model.fire(PropertyChange::new("value", 1, 2));
//! assert_eq!(widget.load(Ordering::SeqCst), 1);
//! ```
//!
//! Event enums can derive [`PropertyEvent`]:
//! ```
//! use prop_relay::PropertyEvent;
//!
//! #[derive(PropertyEvent, Clone, Debug)]
//! enum ModelEvent {
//!     ValueChanged { old: i64, new: i64 },
//!     #[event(property = "enabled")]
//!     EnabledFlipped(bool),
//! }
//!
//! let event = ModelEvent::ValueChanged { old: 1, new: 2 };
//! assert_eq!(event.property(), "value_changed");
//! assert_eq!(ModelEvent::EnabledFlipped(true).property(), "enabled");
//! ```

// Re-export everything from core
pub use prop_relay_core::*;

// Re-export derive macros
pub use prop_relay_macros::PropertyEvent;

/// Prelude for convenient imports
pub mod prelude {
    // Traits
    pub use prop_relay_core::{ChangeSubscriber, PropertyEvent};

    // Relay surface
    pub use prop_relay_core::{
        Owner, OwnerRef, PropertyChange, RelayError, RelayRegistry, Subject, SubscriptionRelay,
        SubscriptionState,
    };

    // Derive macros
    pub use prop_relay_macros::PropertyEvent;
}
