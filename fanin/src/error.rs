// src/error.rs

use core::fmt;
use std::io;

use thiserror::Error;

use crate::registry::Kind;

// --- Hand-off channel errors ---

/// Error returned by [`Sender::send`](crate::handoff::Sender::send) when the
/// value could not be handed off because the channel is closed or the
/// receiver was dropped. The value is returned.
#[derive(PartialEq, Eq, Clone)]
pub struct SendError<T>(pub T);

impl<T> SendError<T> {
  /// Consumes the error, returning the value that was not delivered.
  #[inline]
  pub fn into_inner(self) -> T {
    self.0
  }
}

impl<T> fmt::Debug for SendError<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "SendError(..)")
  }
}

impl<T> fmt::Display for SendError<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "channel closed")
  }
}

impl<T> std::error::Error for SendError<T> {}

/// Error returned by blocking and async `recv` operations.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RecvError {
  /// The channel is empty and was closed, or every sender has been dropped.
  Disconnected,
}
impl std::error::Error for RecvError {}
impl fmt::Display for RecvError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RecvError::Disconnected => write!(f, "channel disconnected (empty and closed)"),
    }
  }
}

/// Error returned by `try_recv` when no value could be taken immediately.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TryRecvError {
  Empty,
  Disconnected,
}
impl std::error::Error for TryRecvError {}
impl fmt::Display for TryRecvError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TryRecvError::Empty => write!(f, "channel empty"),
      TryRecvError::Disconnected => write!(f, "channel disconnected (empty and closed)"),
    }
  }
}

/// Error returned by `recv_timeout` operations.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RecvTimeoutError {
  /// The channel is empty and closed.
  Disconnected,
  /// The timeout elapsed before a value was offered.
  Timeout,
}
impl std::error::Error for RecvTimeoutError {}
impl fmt::Display for RecvTimeoutError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RecvTimeoutError::Disconnected => write!(f, "channel disconnected"),
      RecvTimeoutError::Timeout => write!(f, "receive operation timed out"),
    }
  }
}

/// Error returned when attempting to close an already closed channel.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct CloseError;
impl std::error::Error for CloseError {}
impl fmt::Display for CloseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "channel is already closed")
  }
}

// --- Fan-in errors ---

/// Error returned when a candidate cannot be registered with a
/// [`FanIn`](crate::FanIn).
///
/// `op` names the registration operation that failed (`register`,
/// `register_all`).
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum RegisterError {
  /// The candidate is not a channel at all.
  #[error("{op}: cannot add {kind} as channel")]
  NotAChannel { op: &'static str, kind: Kind },

  /// The candidate is a channel handle that can only send.
  #[error("{op}: cannot add non-receiving channel")]
  NotReceivable { op: &'static str },

  /// The coordinator has already been drained and accepts no new inputs.
  #[error("{op}: fan-in has already been drained")]
  AlreadyDrained { op: &'static str },
}

/// Error returned by [`FanIn::drain`](crate::FanIn::drain).
#[derive(Debug, Error)]
pub enum DrainError {
  /// `drain` was already called on this coordinator.
  #[error("fan-in has already been drained")]
  AlreadyDrained,

  /// A pump or watcher thread could not be spawned.
  #[error("failed to spawn fan-in thread: {0}")]
  Spawn(#[from] io::Error),
}
