//! Subscriber types for the reactive system.
//!
//! A subscriber is anything a signal notifies when its value changes. In
//! practice that is an effect registration.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::Result;

/// Unique identifier for a subscriber.
///
/// Signals key their subscriber lists by this ID, so a registration that
/// lists the same signal twice is still notified once per change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "effect#{}", self.0)
    }
}

/// Something a signal can notify.
pub trait Reactive {
    /// The subscriber ID for this reactive value.
    fn subscriber_id(&self) -> SubscriberId;

    /// Run in response to a dependency change.
    ///
    /// Errors abort the notification pass that called this.
    fn run(&self) -> Result<()>;

    /// Disposed subscribers are skipped by notification passes.
    fn is_disposed(&self) -> bool;
}
