//! Reactive Primitives
//!
//! This module implements the reactive engine shared by every level:
//! signals, effects and the structural equality that gates updates.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is a container for mutable state. Setting it to a value that is
//! structurally equal to the current one does nothing. Setting it to a
//! different value stores the value and immediately runs every effect that
//! declared the signal as a dependency.
//!
//! ## Effects
//!
//! An Effect is a callback registered against an explicit list of signals.
//! It runs once on registration and once more for every accepted change to
//! any listed signal. Dependencies are never discovered automatically: an
//! effect that reads a signal it did not list will not re-run when that
//! signal changes.
//!
//! ## Cascades
//!
//! Effects may set other signals. Those nested updates run their own
//! notification pass to completion before the outer pass continues, so a
//! whole cascade finishes before the `set` that started it returns. A cycle
//! that settles completes normally; one that never settles fails with
//! [`ReactiveError::CascadeOverflow`].
//!
//! [`ReactiveError::CascadeOverflow`]: crate::ReactiveError::CascadeOverflow

mod equality;
mod signal;
mod context;
mod subscriber;
mod effect;
mod runtime;

pub use equality::{equals, Equals, Value};
pub use signal::{Signal, Source};
pub use context::CascadeContext;
pub use subscriber::{Reactive, SubscriberId};
pub use effect::{use_effect, Effect};
pub use runtime::{config, is_registered, register_dot_dee, register_dot_dee_with, RuntimeConfig};
