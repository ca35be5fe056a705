//! Signal Implementation
//!
//! A Signal is the fundamental reactive primitive. It holds a value and the
//! ordered list of effects that declared it as a dependency.
//!
//! # How Signals Work
//!
//! 1. An effect lists the signals it depends on when it is registered, and
//!    each of those signals records the effect as a subscriber.
//!
//! 2. `set` compares the new value with the current one. Equal values are
//!    dropped without any notification.
//!
//! 3. A changed value is stored first, then every subscriber runs
//!    synchronously in registration order. Subscribers may `set` other
//!    signals (or this one); each nested `set` finishes its own pass before
//!    the outer pass continues.
//!
//! # Single-threaded
//!
//! Signals are `Rc`-shared and live on one thread, the same way the event
//! loop that drives them does. No lock is held while subscribers run, so
//! re-entrant reads and writes from inside effects are fine.

use std::cell::RefCell;
use std::fmt::{self, Debug};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::trace;

use super::equality::Equals;
use super::subscriber::{Reactive, SubscriberId};
use crate::error::Result;

/// Counter for generating unique signal IDs.
static SIGNAL_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a new unique signal ID.
fn next_signal_id() -> u64 {
    SIGNAL_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

type EqualityFn<T> = Box<dyn Fn(&T, &T) -> bool>;

struct SignalInner<T> {
    id: u64,
    value: RefCell<T>,
    equals: EqualityFn<T>,
    /// Insertion-ordered, keyed by subscriber so each effect appears once.
    subscribers: RefCell<IndexMap<SubscriberId, Rc<dyn Reactive>>>,
}

/// A reactive signal holding a value of type T.
///
/// Cloning a signal produces another handle to the same cell.
///
/// # Example
///
/// ```
/// use habitat_core::reactive::Signal;
///
/// let phase = Signal::new("menu");
/// phase.set("game")?;
/// assert_eq!(phase.get(), "game");
/// # Ok::<(), habitat_core::ReactiveError>(())
/// ```
pub struct Signal<T> {
    inner: Rc<SignalInner<T>>,
}

impl<T> Signal<T>
where
    T: Clone + 'static,
{
    /// Create a new signal compared with structural equality.
    pub fn new(value: T) -> Self
    where
        T: Equals,
    {
        Self::with_equality(value, |a: &T, b: &T| a.equals(b))
    }

    /// Create a new signal with a custom equality function.
    ///
    /// `set` is a no-op whenever `equals(current, new)` returns true.
    pub fn with_equality<F>(value: T, equals: F) -> Self
    where
        F: Fn(&T, &T) -> bool + 'static,
    {
        Self {
            inner: Rc::new(SignalInner {
                id: next_signal_id(),
                value: RefCell::new(value),
                equals: Box::new(equals),
                subscribers: RefCell::new(IndexMap::new()),
            }),
        }
    }

    /// Get the signal's unique ID.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Get a clone of the current value.
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Borrow the current value without cloning it.
    ///
    /// `f` must not `set` this signal.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Store a new value and notify subscribers if it differs.
    ///
    /// Any error from a subscriber stops the pass: later subscribers of this
    /// change are skipped and the error is returned.
    pub fn set(&self, value: T) -> Result<()> {
        // Only a shared borrow while comparing: the equality function may
        // read this signal.
        let unchanged = (self.inner.equals)(&*self.inner.value.borrow(), &value);
        if unchanged {
            trace!(signal = self.inner.id, "set suppressed, value unchanged");
            return Ok(());
        }
        *self.inner.value.borrow_mut() = value;

        trace!(signal = self.inner.id, "value changed");
        self.notify_subscribers()
    }

    /// Update the value using a function of the current one.
    pub fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&T) -> T,
    {
        let next = self.with(f);
        self.set(next)
    }

    /// Run every subscriber that was registered when the pass began.
    fn notify_subscribers(&self) -> Result<()> {
        // Snapshot so that effects registering or disposing mid-pass cannot
        // disturb the iteration.
        let snapshot: SmallVec<[Rc<dyn Reactive>; 8]> =
            self.inner.subscribers.borrow().values().cloned().collect();

        for subscriber in snapshot {
            if subscriber.is_disposed() {
                continue;
            }
            subscriber.run()?;
        }

        Ok(())
    }

    /// Get the number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Debug for Signal<T>
where
    T: Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.inner.id)
            .field("value", &*self.inner.value.borrow())
            .field("subscriber_count", &self.inner.subscribers.borrow().len())
            .finish()
    }
}

/// A signal seen without its value type: what an effect needs to subscribe.
///
/// Every [`Signal`] implements this, so dependency lists can mix value
/// types: `&[&phase, &pointer.down, &pointer.position]`.
pub trait Source {
    /// The underlying signal's ID.
    fn source_id(&self) -> u64;

    /// Add `subscriber` to the end of the notification order. A subscriber
    /// that is already present keeps its original position.
    fn subscribe(&self, subscriber: Rc<dyn Reactive>);

    /// Remove a subscriber. Unknown IDs are ignored.
    fn unsubscribe(&self, subscriber_id: SubscriberId);

    /// Number of subscribers.
    fn subscriber_count(&self) -> usize;

    /// Another handle to the same signal.
    fn clone_source(&self) -> Box<dyn Source>;
}

impl<T> Source for Signal<T>
where
    T: Clone + 'static,
{
    fn source_id(&self) -> u64 {
        self.inner.id
    }

    fn subscribe(&self, subscriber: Rc<dyn Reactive>) {
        self.inner
            .subscribers
            .borrow_mut()
            .entry(subscriber.subscriber_id())
            .or_insert(subscriber);
    }

    fn unsubscribe(&self, subscriber_id: SubscriberId) {
        // shift_remove keeps the remaining subscribers in order.
        self.inner
            .subscribers
            .borrow_mut()
            .shift_remove(&subscriber_id);
    }

    fn subscriber_count(&self) -> usize {
        Signal::subscriber_count(self)
    }

    fn clone_source(&self) -> Box<dyn Source> {
        Box::new(self.clone())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReactiveError;
    use std::cell::Cell;

    struct Counter {
        id: SubscriberId,
        runs: Cell<usize>,
        disposed: Cell<bool>,
        fail: bool,
    }

    impl Counter {
        fn build(fail: bool) -> Rc<Self> {
            Rc::new(Self {
                id: SubscriberId::new(),
                runs: Cell::new(0),
                disposed: Cell::new(false),
                fail,
            })
        }

        fn new() -> Rc<Self> {
            Self::build(false)
        }

        fn failing() -> Rc<Self> {
            Self::build(true)
        }
    }

    impl Reactive for Counter {
        fn subscriber_id(&self) -> SubscriberId {
            self.id
        }

        fn run(&self) -> Result<()> {
            self.runs.set(self.runs.get() + 1);
            if self.fail {
                return Err(ReactiveError::effect("boom"));
            }
            Ok(())
        }

        fn is_disposed(&self) -> bool {
            self.disposed.get()
        }
    }

    #[test]
    fn signal_get_and_set() {
        let signal = Signal::new(0);
        assert_eq!(signal.get(), 0);

        signal.set(42).unwrap();
        assert_eq!(signal.get(), 42);
    }

    #[test]
    fn signal_update() {
        let signal = Signal::new(10);
        signal.update(|v| v + 5).unwrap();
        assert_eq!(signal.get(), 15);
    }

    #[test]
    fn signal_with_borrows_value() {
        let signal = Signal::new(String::from("menu"));
        assert_eq!(signal.with(|s| s.len()), 4);
    }

    #[test]
    fn signal_notifies_subscribers() {
        let signal = Signal::new(0);
        let counter = Counter::new();
        signal.subscribe(counter.clone());

        assert_eq!(counter.runs.get(), 0);

        signal.set(1).unwrap();
        assert_eq!(counter.runs.get(), 1);

        signal.set(2).unwrap();
        assert_eq!(counter.runs.get(), 2);
    }

    #[test]
    fn equal_values_are_suppressed() {
        let signal = Signal::new((0.0, 0.0));
        let counter = Counter::new();
        signal.subscribe(counter.clone());

        signal.set((0.0, 0.0)).unwrap();
        assert_eq!(counter.runs.get(), 0);

        signal.set((1.0, 0.0)).unwrap();
        signal.set((1.0, 0.0)).unwrap();
        assert_eq!(counter.runs.get(), 1);
    }

    #[test]
    fn custom_equality_overrides_structural() {
        // Only the integer part matters.
        let signal = Signal::with_equality(1.2_f64, |a: &f64, b: &f64| a.trunc() == b.trunc());
        let counter = Counter::new();
        signal.subscribe(counter.clone());

        signal.set(1.9).unwrap();
        assert_eq!(counter.runs.get(), 0);
        assert_eq!(signal.get(), 1.2);

        signal.set(2.0).unwrap();
        assert_eq!(counter.runs.get(), 1);
    }

    #[test]
    fn equality_may_read_the_signal() {
        let slot: Rc<RefCell<Option<Signal<i32>>>> = Rc::new(RefCell::new(None));
        let this = slot.clone();
        let signal = Signal::with_equality(0, move |_: &i32, b: &i32| {
            this.borrow().as_ref().is_some_and(|s| s.get() == *b)
        });
        *slot.borrow_mut() = Some(signal.clone());
        let counter = Counter::new();
        signal.subscribe(counter.clone());

        signal.set(0).unwrap();
        assert_eq!(counter.runs.get(), 0);

        signal.set(4).unwrap();
        assert_eq!(signal.get(), 4);
        assert_eq!(counter.runs.get(), 1);
    }

    #[test]
    fn signal_unsubscribe() {
        let signal = Signal::new(0);
        let counter = Counter::new();
        signal.subscribe(counter.clone());

        signal.set(1).unwrap();
        signal.unsubscribe(counter.id);
        signal.set(2).unwrap();

        assert_eq!(counter.runs.get(), 1);
        assert_eq!(signal.subscriber_count(), 0);
    }

    #[test]
    fn duplicate_subscription_is_ignored() {
        let signal = Signal::new(0);
        let counter = Counter::new();
        signal.subscribe(counter.clone());
        signal.subscribe(counter.clone());

        assert_eq!(signal.subscriber_count(), 1);
        signal.set(1).unwrap();
        assert_eq!(counter.runs.get(), 1);
    }

    #[test]
    fn disposed_subscribers_are_skipped() {
        let signal = Signal::new(0);
        let counter = Counter::new();
        signal.subscribe(counter.clone());
        counter.disposed.set(true);

        signal.set(1).unwrap();
        assert_eq!(counter.runs.get(), 0);
    }

    #[test]
    fn failing_subscriber_aborts_the_pass() {
        let signal = Signal::new(0);
        let before = Counter::new();
        let failing = Counter::failing();
        let after = Counter::new();
        signal.subscribe(before.clone());
        signal.subscribe(failing.clone());
        signal.subscribe(after.clone());

        let err = signal.set(1).unwrap_err();
        assert!(err.is_effect_failure());

        // The value was accepted before notification began.
        assert_eq!(signal.get(), 1);
        assert_eq!(before.runs.get(), 1);
        assert_eq!(failing.runs.get(), 1);
        assert_eq!(after.runs.get(), 0);
    }

    #[test]
    fn signal_clone_shares_state() {
        let signal1 = Signal::new(0);
        let signal2 = signal1.clone();

        signal1.set(42).unwrap();
        assert_eq!(signal2.get(), 42);
        assert_eq!(signal1.id(), signal2.id());
    }

    #[test]
    fn signal_ids_are_unique() {
        let s1 = Signal::new(0);
        let s2 = Signal::new(0);
        let s3 = Signal::new(0);

        assert_ne!(s1.id(), s2.id());
        assert_ne!(s2.id(), s3.id());
        assert_ne!(s1.id(), s3.id());
    }
}
