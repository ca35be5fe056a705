//! Effect Implementation
//!
//! An Effect is a side-effecting computation that re-runs whenever one of
//! its declared dependencies changes.
//!
//! # How Effects Work
//!
//! 1. When created, the effect runs its callback once, immediately, whatever
//!    the state of its dependencies.
//!
//! 2. It then subscribes to every signal in its dependency list. Only those
//!    signals trigger re-runs; the callback may read any other signal, but a
//!    change to an undeclared one will not re-run it.
//!
//! 3. Each accepted `set` on a dependency runs the callback again, right
//!    away, before `set` returns. There is no batching: two changes produce
//!    two runs.
//!
//! # State Across Runs
//!
//! Three constructors cover the ways an effect can carry state:
//!
//! - [`Effect::new`] for stateless callbacks.
//! - [`Effect::with_state`] owns a state value and hands the callback a
//!   mutable reference on every run.
//! - [`Effect::with_memory`] (and [`use_effect`]) feeds the value returned by
//!   the previous run back in as the argument of the next one.
//!
//! # Re-entry
//!
//! A callback may `set` one of its own dependencies, directly or through
//! other effects, and so be triggered again before its current run returns.
//! Stateless callbacks are run again in that nested pass; once the values
//! settle the nested `set` is suppressed and the cascade unwinds. Callbacks
//! that never settle hit the cascade depth limit. A callback that owns
//! state ([`Effect::with_state`], [`Effect::with_memory`]) is borrowed
//! mutably for the whole run and cannot be re-entered: that case fails with
//! [`ReactiveError::Reentrant`].
//!
//! # Lifetime
//!
//! Signals hold their subscribers strongly, so a registration lives as long
//! as its signals do. Dropping the [`Effect`] handle does not stop it; call
//! [`Effect::dispose`] to unsubscribe.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;
use tracing::{debug, trace_span, warn};

use super::context::CascadeContext;
use super::runtime;
use super::signal::Source;
use super::subscriber::{Reactive, SubscriberId};
use crate::error::{ReactiveError, Result};

enum Callback {
    /// Called through a cloned `Rc`, so nested runs are possible.
    Shared(Rc<dyn Fn() -> Result<()>>),
    /// Borrowed mutably for the duration of a run.
    Exclusive(Box<dyn FnMut() -> Result<()>>),
}

struct EffectInner {
    subscriber_id: SubscriberId,

    /// `None` once disposed.
    callback: RefCell<Option<Callback>>,

    /// Handles to the declared dependencies, in declaration order.
    sources: RefCell<SmallVec<[Box<dyn Source>; 4]>>,

    disposed: Cell<bool>,

    run_count: Cell<usize>,
}

impl Reactive for EffectInner {
    fn subscriber_id(&self) -> SubscriberId {
        self.subscriber_id
    }

    fn run(&self) -> Result<()> {
        if self.disposed.get() {
            return Ok(());
        }

        let _frame = CascadeContext::enter(self.subscriber_id, runtime::config().max_cascade_depth)?;
        let _span = trace_span!("effect", id = %self.subscriber_id).entered();

        // A failed borrow means an exclusive run is in progress.
        let shared = match self.callback.try_borrow() {
            Ok(slot) => match slot.as_ref() {
                Some(Callback::Shared(callback)) => Some(Rc::clone(callback)),
                Some(Callback::Exclusive(_)) => None,
                None => return Ok(()),
            },
            Err(_) => None,
        };

        let result = match shared {
            Some(callback) => callback(),
            None => {
                let Ok(mut slot) = self.callback.try_borrow_mut() else {
                    warn!(effect = %self.subscriber_id, "stateful effect triggered itself");
                    return Err(ReactiveError::Reentrant {
                        effect: self.subscriber_id,
                    });
                };
                match slot.as_mut() {
                    Some(Callback::Exclusive(callback)) => callback(),
                    _ => return Ok(()),
                }
            }
        };
        self.run_count.set(self.run_count.get() + 1);

        // Disposed from inside its own callback.
        if self.disposed.get() {
            if let Ok(mut slot) = self.callback.try_borrow_mut() {
                slot.take();
            }
        }

        result
    }

    fn is_disposed(&self) -> bool {
        self.disposed.get()
    }
}

/// Handle to a registered effect.
///
/// # Example
///
/// ```
/// use habitat_core::reactive::{Effect, Signal};
///
/// let down = Signal::new(false);
/// let watched = down.clone();
/// let effect = Effect::new(&[&down], move || {
///     println!("pointer down: {}", watched.get());
///     Ok(())
/// })?;
///
/// down.set(true)?;
/// assert_eq!(effect.run_count(), 2);
/// # Ok::<(), habitat_core::ReactiveError>(())
/// ```
pub struct Effect {
    inner: Rc<EffectInner>,
}

impl Effect {
    /// Register a stateless effect.
    ///
    /// The callback runs once before this returns; an error from that first
    /// run is returned and the effect is not subscribed.
    pub fn new<F>(dependencies: &[&dyn Source], callback: F) -> Result<Self>
    where
        F: Fn() -> Result<()> + 'static,
    {
        Self::register(dependencies, Callback::Shared(Rc::new(callback)))
    }

    /// Register an effect that owns `state` and receives it mutably on
    /// every run.
    ///
    /// Triggering the effect again from inside its own run fails with
    /// [`ReactiveError::Reentrant`].
    pub fn with_state<S, F>(dependencies: &[&dyn Source], mut state: S, mut callback: F) -> Result<Self>
    where
        S: 'static,
        F: FnMut(&mut S) -> Result<()> + 'static,
    {
        Self::register(
            dependencies,
            Callback::Exclusive(Box::new(move || callback(&mut state))),
        )
    }

    /// Register an effect whose return value is remembered and passed back
    /// in on the next run. The first run receives `None`.
    ///
    /// The returned value replaces the memory outright; return `prev` to keep
    /// it. If a run fails, the memory is left empty. Like
    /// [`Effect::with_state`], it cannot be re-entered.
    pub fn with_memory<R, F>(dependencies: &[&dyn Source], mut callback: F) -> Result<Self>
    where
        R: 'static,
        F: FnMut(Option<R>) -> Result<Option<R>> + 'static,
    {
        let mut memory: Option<R> = None;
        Self::register(
            dependencies,
            Callback::Exclusive(Box::new(move || {
                memory = callback(memory.take())?;
                Ok(())
            })),
        )
    }

    fn register(dependencies: &[&dyn Source], callback: Callback) -> Result<Self> {
        let inner = Rc::new(EffectInner {
            subscriber_id: SubscriberId::new(),
            callback: RefCell::new(Some(callback)),
            sources: RefCell::new(dependencies.iter().map(|d| d.clone_source()).collect()),
            disposed: Cell::new(false),
            run_count: Cell::new(0),
        });

        debug!(
            effect = %inner.subscriber_id,
            dependencies = dependencies.len(),
            "registering effect"
        );

        inner.run()?;

        // The first run may have disposed it already.
        if !inner.disposed.get() {
            let reactive: Rc<dyn Reactive> = inner.clone();
            for source in inner.sources.borrow().iter() {
                source.subscribe(Rc::clone(&reactive));
            }
        }

        Ok(Self { inner })
    }

    /// Get the effect's unique ID.
    pub fn id(&self) -> SubscriberId {
        self.inner.subscriber_id
    }

    /// Number of times the callback has run, including the initial run.
    pub fn run_count(&self) -> usize {
        self.inner.run_count.get()
    }

    /// Number of declared dependencies (zero after disposal).
    pub fn dependency_count(&self) -> usize {
        self.inner.sources.borrow().len()
    }

    /// Unsubscribe from every dependency and release the callback.
    ///
    /// Safe to call from inside any effect, including this one. Calling it
    /// twice does nothing.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }

        let sources = std::mem::take(&mut *self.inner.sources.borrow_mut());
        for source in &sources {
            source.unsubscribe(self.inner.subscriber_id);
        }

        // If the callback is running, `run` drops it once it returns.
        if let Ok(mut slot) = self.inner.callback.try_borrow_mut() {
            slot.take();
        }

        debug!(effect = %self.inner.subscriber_id, "effect disposed");
    }

    /// Check if the effect has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }
}

impl Clone for Effect {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.inner.subscriber_id)
            .field("run_count", &self.run_count())
            .field("dependency_count", &self.dependency_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Register `callback` against `dependencies`, remembering its return value
/// between runs.
///
/// Shorthand for [`Effect::with_memory`].
pub fn use_effect<R, F>(dependencies: &[&dyn Source], callback: F) -> Result<Effect>
where
    R: 'static,
    F: FnMut(Option<R>) -> Result<Option<R>> + 'static,
{
    Effect::with_memory(dependencies, callback)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
