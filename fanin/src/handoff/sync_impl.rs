//! The synchronous API for the hand-off channel.

use super::async_impl::AsyncReceiver;
use super::shared::HandoffShared;
use crate::error::{CloseError, RecvError, RecvTimeoutError, SendError, TryRecvError};

use std::fmt;
use std::mem;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// The sending half of a hand-off channel.
///
/// Senders can be cloned; the channel stays open while at least one exists.
pub struct Sender<T> {
  pub(crate) shared: Arc<HandoffShared<T>>,
}

/// The receiving half of a hand-off channel.
pub struct Receiver<T> {
  pub(crate) shared: Arc<HandoffShared<T>>,
}

impl<T> fmt::Debug for Sender<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Sender").field("shared", &self.shared).finish()
  }
}

impl<T> fmt::Debug for Receiver<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Receiver").field("shared", &self.shared).finish()
  }
}

// --- Sender Implementation ---

impl<T: Send> Sender<T> {
  pub(crate) fn from_shared(shared: Arc<HandoffShared<T>>) -> Self {
    Self { shared }
  }

  /// Hands a value to the receiver, blocking the current thread until the
  /// receiver has taken it.
  ///
  /// Fails, returning the value, if the channel has been closed or the
  /// receiver has been dropped.
  pub fn send(&self, value: T) -> Result<(), SendError<T>> {
    self.shared.send(value)
  }

  /// Closes the channel for every sender.
  ///
  /// Blocked senders fail with [`SendError`], the receiver drains whatever
  /// is already in flight and then observes the disconnect.
  pub fn close(&self) -> Result<(), CloseError> {
    self.shared.close()
  }

  /// Returns `true` if the channel was closed or the receiver is gone.
  pub fn is_closed(&self) -> bool {
    self.shared.is_closed()
  }
}

impl<T> Clone for Sender<T> {
  fn clone(&self) -> Self {
    self.shared.add_sender();
    Sender {
      shared: Arc::clone(&self.shared),
    }
  }
}

impl<T> Drop for Sender<T> {
  fn drop(&mut self) {
    self.shared.drop_sender();
  }
}

// --- Receiver Implementation ---

impl<T: Send> Receiver<T> {
  pub(crate) fn from_shared(shared: Arc<HandoffShared<T>>) -> Self {
    Self { shared }
  }

  /// Receives the next value, blocking until a sender offers one.
  ///
  /// Returns [`RecvError::Disconnected`] once the channel is closed and no
  /// value is left in flight.
  pub fn recv(&self) -> Result<T, RecvError> {
    self.shared.recv()
  }

  /// Takes a value if a sender is currently offering one.
  pub fn try_recv(&self) -> Result<T, TryRecvError> {
    self.shared.try_recv()
  }

  /// Like [`recv`](Self::recv), but gives up after `timeout`.
  pub fn recv_timeout(&self, timeout: Duration) -> Result<T, RecvTimeoutError> {
    match Instant::now().checked_add(timeout) {
      Some(deadline) => self.shared.recv_deadline(deadline),
      None => self.recv().map_err(|_| RecvTimeoutError::Disconnected),
    }
  }

  /// Returns `true` once no further value can arrive.
  pub fn is_disconnected(&self) -> bool {
    self.shared.is_disconnected()
  }

  /// Returns a blocking iterator over received values, ending on disconnect.
  pub fn iter(&self) -> Iter<'_, T> {
    Iter { receiver: self }
  }

  /// Converts this receiver into an [`AsyncReceiver`].
  pub fn to_async(self) -> AsyncReceiver<T> {
    let shared = unsafe { std::ptr::read(&self.shared) };
    mem::forget(self);
    AsyncReceiver::from_shared(shared)
  }
}

impl<T> Drop for Receiver<T> {
  fn drop(&mut self) {
    self.shared.drop_receiver();
  }
}

/// A blocking iterator borrowing a [`Receiver`].
#[derive(Debug)]
pub struct Iter<'a, T> {
  receiver: &'a Receiver<T>,
}

impl<T: Send> Iterator for Iter<'_, T> {
  type Item = T;

  fn next(&mut self) -> Option<T> {
    self.receiver.recv().ok()
  }
}

/// A blocking iterator owning a [`Receiver`].
#[derive(Debug)]
pub struct IntoIter<T> {
  receiver: Receiver<T>,
}

impl<T: Send> Iterator for IntoIter<T> {
  type Item = T;

  fn next(&mut self) -> Option<T> {
    self.receiver.recv().ok()
  }
}

impl<T: Send> IntoIterator for Receiver<T> {
  type Item = T;
  type IntoIter = IntoIter<T>;

  fn into_iter(self) -> IntoIter<T> {
    IntoIter { receiver: self }
  }
}

impl<'a, T: Send> IntoIterator for &'a Receiver<T> {
  type Item = T;
  type IntoIter = Iter<'a, T>;

  fn into_iter(self) -> Iter<'a, T> {
    self.iter()
  }
}
