//! The asynchronous receiving half of the hand-off channel.

use super::shared::HandoffShared;
use super::sync_impl::Receiver;
use crate::error::{RecvError, TryRecvError};

use std::fmt;
use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;

/// The receiving half of a hand-off channel, for use in async code.
///
/// Senders stay synchronous: each one blocks its own thread until this
/// receiver takes its value.
pub struct AsyncReceiver<T> {
  pub(crate) shared: Arc<HandoffShared<T>>,
}

impl<T> fmt::Debug for AsyncReceiver<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("AsyncReceiver").field("shared", &self.shared).finish()
  }
}

impl<T: Send> AsyncReceiver<T> {
  pub(crate) fn from_shared(shared: Arc<HandoffShared<T>>) -> Self {
    Self { shared }
  }

  /// Receives the next value, waiting asynchronously until a sender offers
  /// one or the channel disconnects.
  pub fn recv(&self) -> RecvFuture<'_, T> {
    RecvFuture { receiver: self }
  }

  /// Takes a value if a sender is currently offering one.
  pub fn try_recv(&self) -> Result<T, TryRecvError> {
    self.shared.try_recv()
  }

  /// Returns `true` once no further value can arrive.
  pub fn is_disconnected(&self) -> bool {
    self.shared.is_disconnected()
  }

  /// Converts this receiver back into a blocking [`Receiver`].
  pub fn to_sync(self) -> Receiver<T> {
    let shared = unsafe { std::ptr::read(&self.shared) };
    mem::forget(self);
    Receiver::from_shared(shared)
  }
}

impl<T> Drop for AsyncReceiver<T> {
  fn drop(&mut self) {
    self.shared.drop_receiver();
  }
}

/// Future returned by [`AsyncReceiver::recv`].
#[must_use = "futures do nothing unless you .await or poll them"]
pub struct RecvFuture<'a, T> {
  receiver: &'a AsyncReceiver<T>,
}

impl<T> fmt::Debug for RecvFuture<'_, T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RecvFuture").finish_non_exhaustive()
  }
}

impl<T: Send> Future for RecvFuture<'_, T> {
  type Output = Result<T, RecvError>;

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    self.receiver.shared.poll_recv(cx)
  }
}

impl<T: Send> Stream for AsyncReceiver<T> {
  type Item = T;

  fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
    match self.shared.poll_recv(cx) {
      Poll::Ready(Ok(value)) => Poll::Ready(Some(value)),
      Poll::Ready(Err(RecvError::Disconnected)) => Poll::Ready(None),
      Poll::Pending => Poll::Pending,
    }
  }
}
