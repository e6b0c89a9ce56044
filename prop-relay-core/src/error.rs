//! Relay error types
//!
//! Almost everything that can go wrong inside a relay is a normal state,
//! not an error: a notification racing owner reclamation takes the
//! self-removal path, and redundant deregistration is a no-op. The only
//! condition surfaced to callers is an invalid construction, which is a
//! programmer error and fails fast.

use std::error::Error;
use std::fmt;

/// Errors surfaced by relay construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayError {
    /// The owner was already reclaimed when the subscription was created.
    ///
    /// Rejected synchronously; no partial state (no subject registration,
    /// no registry entry) is left behind.
    InvalidSubscription,
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSubscription => {
                write!(f, "subscription created against an already-reclaimed owner")
            }
        }
    }
}

impl Error for RelayError {}
