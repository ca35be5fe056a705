//! Pointer Tracking
//!
//! Exposes the pointer as two signals, `position` and `down`, that drawing
//! effects can depend on. The host's event listeners feed raw events in
//! through [`Pointer::moved`], [`Pointer::pressed`] and [`Pointer::released`].
//!
//! Positions are stored in device pixels: every incoming coordinate is
//! multiplied by the configured pixel ratio.
//!
//! A page has a single pointer, so [`use_pointer`] hands out one shared
//! instance per thread. The first call creates it; later calls return a
//! handle to the same signals.

use std::cell::OnceCell;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::reactive::Signal;

/// Options applied when the shared pointer is first created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerOptions {
    /// Device pixels per CSS pixel.
    pub pixel_ratio: f64,
}

impl Default for PointerOptions {
    fn default() -> Self {
        Self { pixel_ratio: 1.0 }
    }
}

/// Pointer state as signals.
#[derive(Debug, Clone)]
pub struct Pointer {
    /// Last known position in device pixels.
    pub position: Signal<(f64, f64)>,
    /// Whether a button or touch is held.
    pub down: Signal<bool>,
    pixel_ratio: f64,
}

impl Pointer {
    /// Create an independent pointer at the origin, not pressed.
    pub fn new(options: PointerOptions) -> Self {
        Self {
            position: Signal::new((0.0, 0.0)),
            down: Signal::new(false),
            pixel_ratio: options.pixel_ratio,
        }
    }

    /// Device pixels per CSS pixel, applied to every incoming coordinate.
    pub fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    /// Pointer moved to `(x, y)` in CSS pixels.
    pub fn moved(&self, x: f64, y: f64) -> Result<()> {
        self.position.set((x * self.pixel_ratio, y * self.pixel_ratio))
    }

    /// Pointer pressed at `(x, y)`. The position is updated first.
    pub fn pressed(&self, x: f64, y: f64) -> Result<()> {
        self.moved(x, y)?;
        self.down.set(true)
    }

    /// Pointer released at `(x, y)`. The position is updated first.
    pub fn released(&self, x: f64, y: f64) -> Result<()> {
        self.moved(x, y)?;
        self.down.set(false)
    }
}

thread_local! {
    static SHARED: OnceCell<Pointer> = const { OnceCell::new() };
}

/// The shared pointer for this thread.
///
/// `options` only matter on the first call.
pub fn use_pointer(options: PointerOptions) -> Pointer {
    SHARED.with(|cell| {
        cell.get_or_init(|| {
            debug!(pixel_ratio = options.pixel_ratio, "creating shared pointer");
            Pointer::new(options)
        })
        .clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Effect;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn positions_are_scaled_by_pixel_ratio() {
        let pointer = Pointer::new(PointerOptions { pixel_ratio: 2.0 });
        pointer.moved(10.0, 15.5).unwrap();
        assert_eq!(pointer.position.get(), (20.0, 31.0));
    }

    #[test]
    fn press_updates_position_before_down() {
        let pointer = Pointer::new(PointerOptions::default());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        let reader = pointer.clone();

        Effect::new(&[&pointer.down], move || {
            log.borrow_mut().push((reader.down.get(), reader.position.get()));
            Ok(())
        })
        .unwrap();

        pointer.pressed(3.0, 4.0).unwrap();
        pointer.released(5.0, 6.0).unwrap();

        assert_eq!(
            *seen.borrow(),
            vec![
                (false, (0.0, 0.0)),
                (true, (3.0, 4.0)),
                (false, (5.0, 6.0)),
            ]
        );
    }

    #[test]
    fn shared_pointer_is_created_once() {
        let first = use_pointer(PointerOptions { pixel_ratio: 2.0 });
        let second = use_pointer(PointerOptions { pixel_ratio: 3.0 });

        assert_eq!(first.position.id(), second.position.id());
        assert_eq!(second.pixel_ratio(), 2.0);

        first.moved(1.0, 1.0).unwrap();
        assert_eq!(second.position.get(), (2.0, 2.0));
    }
}
