//! Habitat Core
//!
//! This crate provides the reactive engine behind the Habitat drawing
//! levels. It implements:
//!
//! - Signals: observable value cells whose updates are suppressed when the
//!   new value is structurally equal to the old one
//! - Effects: callbacks registered against an explicit dependency list
//! - Structural equality over numbers, booleans, strings and tuples
//! - A process-wide, idempotent runtime registration
//! - Pointer state exposed as signals
//!
//! Rendering, DOM wiring, audio and progress storage live with the host and
//! talk to the engine only through signals and effect callbacks.
//!
//! # Architecture
//!
//! - `reactive`: signals, effects, equality and the runtime registry
//! - `pointer`: the shared pointer signals
//! - `error`: the crate-wide error type
//!
//! # Example
//!
//! ```rust
//! use habitat_core::reactive::{register_dot_dee, Effect, Signal};
//!
//! register_dot_dee();
//!
//! let count = Signal::new(0);
//! let doubled = Signal::new(0);
//!
//! let source = count.clone();
//! let target = doubled.clone();
//! Effect::new(&[&count], move || target.set(source.get() * 2))?;
//!
//! count.set(5)?;
//! assert_eq!(doubled.get(), 10);
//! # Ok::<(), habitat_core::ReactiveError>(())
//! ```

pub mod error;
pub mod pointer;
pub mod reactive;

pub use error::{ReactiveError, Result};
