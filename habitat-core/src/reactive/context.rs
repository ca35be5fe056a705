//! Cascade Context
//!
//! The cascade context tracks which effects are currently running on this
//! thread. Because notification is synchronous and depth-first, the stack of
//! running effects is exactly the chain of `set` calls that led to the
//! current point of a cascade.
//!
//! # Depth Ceiling
//!
//! An effect may be triggered again while it is still on the stack, for
//! example when it writes one of its own dependencies. If the values settle,
//! equality suppresses the next write and the cascade unwinds. If they never
//! settle, the stack keeps growing, so its depth is bounded and the context
//! refuses to enter a frame past the limit.

use std::cell::RefCell;

use tracing::warn;

use super::SubscriberId;
use crate::error::{ReactiveError, Result};

thread_local! {
    static CASCADE_STACK: RefCell<Vec<SubscriberId>> = const { RefCell::new(Vec::new()) };
}

/// Guard for one effect run on the cascade stack.
///
/// Popping happens on drop, so the stack stays balanced when a callback
/// returns an error or panics.
#[derive(Debug)]
pub struct CascadeContext {
    subscriber_id: SubscriberId,
}

impl CascadeContext {
    /// Push `subscriber_id` onto the cascade stack.
    ///
    /// A subscriber may appear more than once. Fails with
    /// [`ReactiveError::CascadeOverflow`] if the stack already holds `limit`
    /// frames.
    pub fn enter(subscriber_id: SubscriberId, limit: usize) -> Result<Self> {
        CASCADE_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();

            if stack.len() >= limit {
                warn!(effect = %subscriber_id, limit, "notification cascade too deep");
                return Err(ReactiveError::CascadeOverflow { limit });
            }

            stack.push(subscriber_id);
            Ok(Self { subscriber_id })
        })
    }

    /// Number of effect runs currently nested on this thread.
    pub fn depth() -> usize {
        CASCADE_STACK.with(|stack| stack.borrow().len())
    }

    /// Check if any effect is running.
    pub fn is_active() -> bool {
        Self::depth() > 0
    }

    /// The innermost running effect, if any.
    pub fn current_subscriber() -> Option<SubscriberId> {
        CASCADE_STACK.with(|stack| stack.borrow().last().copied())
    }

    /// Whether `subscriber_id` is anywhere on the stack.
    pub fn is_running(subscriber_id: SubscriberId) -> bool {
        CASCADE_STACK.with(|stack| stack.borrow().contains(&subscriber_id))
    }
}

impl Drop for CascadeContext {
    fn drop(&mut self) {
        CASCADE_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();

            if let Some(entry) = popped {
                debug_assert_eq!(
                    entry, self.subscriber_id,
                    "CascadeContext mismatch: expected {:?}, got {:?}",
                    self.subscriber_id, entry
                );
            }
        });
    }
}
