//! Error types for the reactive engine.
//!
//! Every fallible operation returns [`Result`]. Errors raised by effect
//! callbacks travel back up through the `set` that triggered them, aborting
//! whatever remained of that notification pass.

use std::error::Error as StdError;

use thiserror::Error;

use crate::reactive::SubscriberId;

/// Convenience alias used throughout the crate.
pub type Result<T, E = ReactiveError> = std::result::Result<T, E>;

/// Errors produced while propagating signal changes.
#[derive(Debug, Error)]
pub enum ReactiveError {
    /// User code inside an effect callback failed.
    #[error("effect failed: {0}")]
    Effect(Box<dyn StdError + Send + Sync>),

    /// A stateful effect was triggered again while its previous run was
    /// still on the stack.
    #[error("{effect} holds state and was re-triggered while still running")]
    Reentrant { effect: SubscriberId },

    /// Too many effect runs were nested inside a single cascade.
    #[error("notification cascade exceeded {limit} nested effect runs")]
    CascadeOverflow { limit: usize },

    /// The runtime configuration could not be parsed.
    #[error("invalid runtime configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl ReactiveError {
    /// Wrap an arbitrary error (or message) raised inside an effect.
    pub fn effect<E>(error: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        Self::Effect(error.into())
    }

    /// Whether this error was raised by a callback rather than the engine.
    pub fn is_effect_failure(&self) -> bool {
        matches!(self, Self::Effect(_))
    }
}
