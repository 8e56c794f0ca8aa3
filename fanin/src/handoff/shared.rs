//! Shared state for the rendezvous hand-off channel.
//!
//! The channel holds at most one value in flight. A sender parks the value in
//! the slot and then waits until the receiver has taken it, so `send` only
//! returns once the hand-off has happened. Every offered value gets a ticket
//! and every take advances `taken`; a sender knows its value was delivered
//! once `taken` has caught up with its ticket.
//!
//! All state lives behind one `parking_lot::Mutex`. Blocked senders and the
//! blocking receiver wait on separate condition variables, and an async
//! receiver registers its waker in an `AtomicWaker`.

use crate::error::{CloseError, RecvError, RecvTimeoutError, SendError, TryRecvError};

use core::task::{Context, Poll};
use std::fmt;
use std::time::Instant;

use futures_util::task::AtomicWaker;
use parking_lot::{Condvar, Mutex, MutexGuard};

#[derive(Debug)]
struct State<T> {
  slot: Option<T>,
  offered: u64,
  taken: u64,
  senders: usize,
  closed: bool,
  receiver_dropped: bool,
}

impl<T> State<T> {
  /// True once no further value can ever be offered.
  #[inline]
  fn is_disconnected(&self) -> bool {
    self.closed || self.senders == 0
  }
}

pub(crate) struct HandoffShared<T> {
  state: Mutex<State<T>>,
  // Senders waiting for the slot to free up or for their value to be taken.
  senders_cv: Condvar,
  // The blocking receiver waiting for a value.
  receiver_cv: Condvar,
  receiver_waker: AtomicWaker,
}

impl<T> fmt::Debug for HandoffShared<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let state = self.state.lock();
    f.debug_struct("HandoffShared")
      .field("occupied", &state.slot.is_some())
      .field("offered", &state.offered)
      .field("taken", &state.taken)
      .field("senders", &state.senders)
      .field("closed", &state.closed)
      .field("receiver_dropped", &state.receiver_dropped)
      .finish_non_exhaustive()
  }
}

impl<T> HandoffShared<T> {
  pub(crate) fn new() -> Self {
    Self {
      state: Mutex::new(State {
        slot: None,
        offered: 0,
        taken: 0,
        senders: 1,
        closed: false,
        receiver_dropped: false,
      }),
      senders_cv: Condvar::new(),
      receiver_cv: Condvar::new(),
      receiver_waker: AtomicWaker::new(),
    }
  }

  #[inline]
  fn wake_receiver(&self) {
    self.receiver_cv.notify_one();
    self.receiver_waker.wake();
  }

  /// Takes the value out of the slot, if any, and releases its sender.
  fn take_locked(&self, state: &mut MutexGuard<'_, State<T>>) -> Option<T> {
    let value = state.slot.take()?;
    state.taken += 1;
    // Wakes both the sender waiting for its ticket and any sender waiting
    // for the slot.
    self.senders_cv.notify_all();
    Some(value)
  }

  // --- Sender side ---

  pub(crate) fn send(&self, value: T) -> Result<(), SendError<T>> {
    let mut state = self.state.lock();
    loop {
      if state.closed || state.receiver_dropped {
        return Err(SendError(value));
      }
      if state.slot.is_none() {
        break;
      }
      self.senders_cv.wait(&mut state);
    }

    state.slot = Some(value);
    state.offered += 1;
    let ticket = state.offered;
    self.wake_receiver();

    while state.taken < ticket {
      if state.receiver_dropped {
        // Nobody took it, so the slot still holds our value.
        return match state.slot.take() {
          Some(value) => Err(SendError(value)),
          None => Ok(()),
        };
      }
      self.senders_cv.wait(&mut state);
    }
    Ok(())
  }

  pub(crate) fn add_sender(&self) {
    self.state.lock().senders += 1;
  }

  pub(crate) fn drop_sender(&self) {
    let mut state = self.state.lock();
    state.senders -= 1;
    if state.senders == 0 {
      drop(state);
      self.receiver_cv.notify_all();
      self.receiver_waker.wake();
    }
  }

  pub(crate) fn close(&self) -> Result<(), CloseError> {
    let mut state = self.state.lock();
    if state.closed {
      return Err(CloseError);
    }
    state.closed = true;
    drop(state);
    self.senders_cv.notify_all();
    self.receiver_cv.notify_all();
    self.receiver_waker.wake();
    Ok(())
  }

  pub(crate) fn is_closed(&self) -> bool {
    let state = self.state.lock();
    state.closed || state.receiver_dropped
  }

  // --- Receiver side ---

  pub(crate) fn recv(&self) -> Result<T, RecvError> {
    let mut state = self.state.lock();
    loop {
      if let Some(value) = self.take_locked(&mut state) {
        return Ok(value);
      }
      if state.is_disconnected() {
        return Err(RecvError::Disconnected);
      }
      self.receiver_cv.wait(&mut state);
    }
  }

  pub(crate) fn try_recv(&self) -> Result<T, TryRecvError> {
    let mut state = self.state.lock();
    if let Some(value) = self.take_locked(&mut state) {
      return Ok(value);
    }
    if state.is_disconnected() {
      Err(TryRecvError::Disconnected)
    } else {
      Err(TryRecvError::Empty)
    }
  }

  pub(crate) fn recv_deadline(&self, deadline: Instant) -> Result<T, RecvTimeoutError> {
    let mut state = self.state.lock();
    loop {
      if let Some(value) = self.take_locked(&mut state) {
        return Ok(value);
      }
      if state.is_disconnected() {
        return Err(RecvTimeoutError::Disconnected);
      }
      if self.receiver_cv.wait_until(&mut state, deadline).timed_out() {
        // One last look: a sender may have offered right at the deadline.
        return match self.take_locked(&mut state) {
          Some(value) => Ok(value),
          None if state.is_disconnected() => Err(RecvTimeoutError::Disconnected),
          None => Err(RecvTimeoutError::Timeout),
        };
      }
    }
  }

  pub(crate) fn poll_recv(&self, cx: &mut Context<'_>) -> Poll<Result<T, RecvError>> {
    let mut state = self.state.lock();
    if let Some(value) = self.take_locked(&mut state) {
      return Poll::Ready(Ok(value));
    }
    if state.is_disconnected() {
      return Poll::Ready(Err(RecvError::Disconnected));
    }
    // Registered while holding the lock, so an offer cannot slip in between
    // the check above and the registration.
    self.receiver_waker.register(cx.waker());
    Poll::Pending
  }

  pub(crate) fn is_disconnected(&self) -> bool {
    self.state.lock().is_disconnected()
  }

  pub(crate) fn drop_receiver(&self) {
    let mut state = self.state.lock();
    state.receiver_dropped = true;
    drop(state);
    self.senders_cv.notify_all();
  }
}
