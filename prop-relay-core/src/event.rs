//! Property-change event types

use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Trait for events delivered through a property-change relay
///
/// Events represent one observed mutation of a subject. They should be:
/// - Clone: Events are snapshotted per subscriber during a fire
/// - Debug: For debugging and logging
/// - Send + Sync + 'static: Subjects and relays may be shared across threads
///
/// Use `#[derive(PropertyEvent)]` from `prop-relay-macros` to auto-implement
/// this trait for enums.
pub trait PropertyEvent: Clone + Debug + Send + Sync + 'static {
    /// Name of the property that changed, for logging and filtering
    fn property(&self) -> &str;
}

/// A dynamically-typed property change
///
/// The provided concrete event type for applications that don't want to
/// define their own event enum. Old and new values are carried as
/// [`serde_json::Value`], so any serializable state fits.
///
/// This is the only part of the relay surface that serializes; relays
/// themselves hold weak owner references and are rebuilt on load.
///
/// # Example
/// ```
/// use prop_relay_core::PropertyChange;
///
/// let change = PropertyChange::new("enabled", false, true);
/// assert_eq!(change.property, "enabled");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertyChange {
    /// Name of the property that changed
    pub property: String,
    /// Value before the change
    pub old: Value,
    /// Value after the change
    pub new: Value,
}

impl PropertyChange {
    /// Create a change from anything convertible to a JSON value
    pub fn new(property: impl Into<String>, old: impl Into<Value>, new: impl Into<Value>) -> Self {
        Self {
            property: property.into(),
            old: old.into(),
            new: new.into(),
        }
    }

    /// Create a change from pre-built values
    pub fn raw(property: impl Into<String>, old: Value, new: Value) -> Self {
        Self {
            property: property.into(),
            old,
            new,
        }
    }
}

impl PropertyEvent for PropertyChange {
    fn property(&self) -> &str {
        &self.property
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_converts_values() {
        let change = PropertyChange::new("count", 1, 2);
        assert_eq!(change.old, Value::from(1));
        assert_eq!(change.new, Value::from(2));
        assert_eq!(change.property(), "count");
    }

    #[test]
    fn test_raw_takes_prebuilt_values() {
        let change = PropertyChange::raw("items", Value::Null, serde_json::json!([1, 2]));
        assert_eq!(change.property(), "items");
        assert_eq!(change.old, Value::Null);
        assert_eq!(change.new, serde_json::json!([1, 2]));
    }

    #[test]
    fn test_serde_round_trip() {
        let change = PropertyChange::new("label", "old", "new");
        let json = serde_json::to_string(&change).expect("serialize");
        let back: PropertyChange = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, change);
    }
}
