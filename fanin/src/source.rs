//! Receivable inputs and their type-erased adapter.
//!
//! [`Source`] is the capability a fan-in pump needs from an input: block for
//! the next element, or report that the input is exhausted. It is implemented
//! for the receiving halves of the channels this crate knows about, and can be
//! implemented for any other channel type.

use crate::handoff;
use crate::value::{SourceId, Value};

use std::any;
use std::sync::mpsc as std_mpsc;

/// A receivable channel that a fan-in pump can drain.
pub trait Source: Send + 'static {
  /// The element type of the channel.
  type Item: Send + 'static;

  /// Blocks until the next element is available.
  ///
  /// Returns `None` once the channel is closed and exhausted; after that
  /// the pump never calls it again.
  fn recv_next(&mut self) -> Option<Self::Item>;
}

impl<T: Send + 'static> Source for handoff::Receiver<T> {
  type Item = T;

  fn recv_next(&mut self) -> Option<T> {
    self.recv().ok()
  }
}

impl<T: Send + 'static> Source for handoff::AsyncReceiver<T> {
  type Item = T;

  fn recv_next(&mut self) -> Option<T> {
    // Pumps run on their own threads, so blocking here is fine.
    self.shared.recv().ok()
  }
}

impl<T: Send + 'static> Source for std_mpsc::Receiver<T> {
  type Item = T;

  fn recv_next(&mut self) -> Option<T> {
    self.recv().ok()
  }
}

#[cfg(feature = "tokio")]
impl<T: Send + 'static> Source for tokio::sync::mpsc::Receiver<T> {
  type Item = T;

  fn recv_next(&mut self) -> Option<T> {
    self.blocking_recv()
  }
}

#[cfg(feature = "tokio")]
impl<T: Send + 'static> Source for tokio::sync::mpsc::UnboundedReceiver<T> {
  type Item = T;

  fn recv_next(&mut self) -> Option<T> {
    self.blocking_recv()
  }
}

// --- Type erasure ---

/// A [`Source`] with its element type erased: elements come out as [`Value`]s.
pub(crate) trait ErasedSource: Send {
  fn recv_value(&mut self, id: SourceId) -> Option<Value>;

  fn item_type_name(&self) -> &'static str;
}

/// The per-element-type adapter behind every registered input.
pub(crate) struct Erased<S>(pub(crate) S);

impl<S: Source> ErasedSource for Erased<S> {
  #[inline]
  fn recv_value(&mut self, id: SourceId) -> Option<Value> {
    self.0.recv_next().map(|item| Value::new(id, item))
  }

  fn item_type_name(&self) -> &'static str {
    any::type_name::<S::Item>()
  }
}

pub(crate) fn erase<S: Source>(source: S) -> Box<dyn ErasedSource> {
  Box::new(Erased(source))
}
