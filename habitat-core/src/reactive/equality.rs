//! Structural Equality
//!
//! Signals use structural equality to decide whether an update actually
//! changed anything. Two values are equal when:
//!
//! - they are primitives (numbers, booleans, strings) that compare equal by
//!   value, or
//! - they are ordered tuples of the same length whose elements are pairwise
//!   equal under the same rule, applied recursively.
//!
//! Tuples of different length are never equal.
//!
//! Statically sized values (Rust tuples, arrays) go through the [`Equals`]
//! trait. Values whose shape is only known at run time can use [`Value`].
//!
//! Floating point follows IEEE comparison, so `NaN` never equals itself and a
//! signal set to `NaN` notifies on every `set`.

use serde::{Deserialize, Serialize};

/// Structural equality used to gate signal updates.
pub trait Equals {
    /// Returns true when `self` and `other` are structurally equal.
    fn equals(&self, other: &Self) -> bool;
}

/// Compare two values structurally.
///
/// ```
/// use habitat_core::reactive::equals;
///
/// assert!(equals(&(1, 2), &(1, 2)));
/// assert!(!equals(&[1, 2][..], &[1, 2, 3][..]));
/// assert!(!equals("a", "b"));
/// ```
pub fn equals<T>(a: &T, b: &T) -> bool
where
    T: Equals + ?Sized,
{
    a.equals(b)
}

macro_rules! equals_by_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Equals for $ty {
                #[inline]
                fn equals(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

equals_by_value!(
    (), bool, char, str, String,
    i8, i16, i32, i64, i128, isize,
    u8, u16, u32, u64, u128, usize,
    f32, f64,
);

impl<T> Equals for &T
where
    T: Equals + ?Sized,
{
    fn equals(&self, other: &Self) -> bool {
        (**self).equals(*other)
    }
}

impl<T> Equals for [T]
where
    T: Equals,
{
    fn equals(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a.equals(b))
    }
}

impl<T, const N: usize> Equals for [T; N]
where
    T: Equals,
{
    fn equals(&self, other: &Self) -> bool {
        self.as_slice().equals(other.as_slice())
    }
}

impl<T> Equals for Vec<T>
where
    T: Equals,
{
    fn equals(&self, other: &Self) -> bool {
        self.as_slice().equals(other.as_slice())
    }
}

impl<T> Equals for Option<T>
where
    T: Equals,
{
    fn equals(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.equals(b),
            (None, None) => true,
            _ => false,
        }
    }
}

macro_rules! equals_for_tuple {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: Equals),+> Equals for ($($name,)+) {
            fn equals(&self, other: &Self) -> bool {
                $(self.$idx.equals(&other.$idx))&&+
            }
        }
    };
}

equals_for_tuple!(A: 0);
equals_for_tuple!(A: 0, B: 1);
equals_for_tuple!(A: 0, B: 1, C: 2);
equals_for_tuple!(A: 0, B: 1, C: 2, D: 3);
equals_for_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4);
equals_for_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);

/// A dynamically shaped value: a number, boolean, string or ordered tuple.
///
/// Deserializes from plain JSON (`[1, 2]`, `"menu"`, `true`, `3.5`), which
/// makes it convenient for values read from storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Number(f64),
    Text(String),
    Tuple(Vec<Value>),
}

impl Value {
    /// Number of elements if this is a tuple.
    pub fn arity(&self) -> Option<usize> {
        match self {
            Value::Tuple(items) => Some(items.len()),
            _ => None,
        }
    }
}

impl Equals for Value {
    fn equals(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a.equals(b),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl<T> From<Vec<T>> for Value
where
    T: Into<Value>,
{
    fn from(items: Vec<T>) -> Self {
        Value::Tuple(items.into_iter().map(Into::into).collect())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
