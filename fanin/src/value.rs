//! The tagged value type carried by a drain.

use std::any::{self, Any};
use std::fmt;

/// Identifies a registered input by its registration index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(pub(crate) usize);

impl SourceId {
  /// The zero-based registration index of the input.
  #[inline]
  pub fn index(self) -> usize {
    self.0
  }
}

impl fmt::Display for SourceId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#{}", self.0)
  }
}

/// A value forwarded from one of the inputs of a drain.
///
/// The element keeps its original type behind `dyn Any`; use
/// [`downcast`](Value::downcast) or [`downcast_ref`](Value::downcast_ref) to
/// get it back. Each value also records which input it came from.
pub struct Value {
  source: SourceId,
  type_name: &'static str,
  inner: Box<dyn Any + Send>,
}

impl Value {
  /// Wraps `value` as if it had been received from `source`.
  pub fn new<T: Any + Send>(source: SourceId, value: T) -> Self {
    Self {
      source,
      type_name: any::type_name::<T>(),
      inner: Box::new(value),
    }
  }

  /// The input this value was received from.
  #[inline]
  pub fn source(&self) -> SourceId {
    self.source
  }

  /// The name of the element type, as reported by [`std::any::type_name`].
  #[inline]
  pub fn type_name(&self) -> &'static str {
    self.type_name
  }

  /// Returns `true` if the element is a `T`.
  #[inline]
  pub fn is<T: Any>(&self) -> bool {
    self.inner.is::<T>()
  }

  pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
    self.inner.downcast_ref::<T>()
  }

  pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
    self.inner.downcast_mut::<T>()
  }

  /// Takes the element out as a `T`, or gives the value back unchanged if
  /// it holds another type.
  pub fn downcast<T: Any>(self) -> Result<T, Value> {
    let Value {
      source,
      type_name,
      inner,
    } = self;
    match inner.downcast::<T>() {
      Ok(value) => Ok(*value),
      Err(inner) => Err(Value {
        source,
        type_name,
        inner,
      }),
    }
  }

  /// Discards the tag, returning the boxed element.
  pub fn into_any(self) -> Box<dyn Any + Send> {
    self.inner
  }
}

impl fmt::Debug for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Value")
      .field("source", &self.source)
      .field("type_name", &self.type_name)
      .finish_non_exhaustive()
  }
}

// Displays the element for the common scalar and string types, and falls back
// to the type name for anything else.
macro_rules! display_as {
  ($value:expr, $f:expr, $($ty:ty),+ $(,)?) => {
    $(
      if let Some(v) = $value.downcast_ref::<$ty>() {
        return fmt::Display::fmt(v, $f);
      }
    )+
  };
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    display_as!(
      self, f, String, &'static str, bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32,
      u64, u128, usize, f32, f64,
    );
    write!(f, "<{}>", self.type_name)
  }
}
