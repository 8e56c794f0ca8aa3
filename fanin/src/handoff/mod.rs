//! A rendezvous (zero-capacity) multi-producer, single-consumer channel.
//!
//! `send` does not return until the receiver has taken the value, so the
//! channel never buffers: it is a pure hand-off between one of many senders
//! and the single receiver. This is the output channel of a
//! [`FanIn`](crate::FanIn) drain, and it can equally be used by producers as
//! a fan-in input.
//!
//! The channel closes once every [`Sender`] is dropped or any sender calls
//! [`Sender::close`]. A value that was already handed over is never lost by
//! a close; the receiver reports [`RecvError::Disconnected`](crate::RecvError)
//! only when the slot is empty.
//!
//! # Examples
//!
//! ```
//! use fibre_fanin::handoff;
//! use std::thread;
//!
//! let (tx, rx) = handoff::channel();
//! let producer = thread::spawn(move || {
//!   for i in 0..3 {
//!     tx.send(i).unwrap();
//!   }
//! });
//!
//! let received: Vec<i32> = rx.into_iter().collect();
//! assert_eq!(received, vec![0, 1, 2]);
//! producer.join().unwrap();
//! ```

mod async_impl;
mod shared;
mod sync_impl;


pub use async_impl::{AsyncReceiver, RecvFuture};
pub use sync_impl::{IntoIter, Iter, Receiver, Sender};

use shared::HandoffShared;
use std::sync::Arc;

/// Creates a new rendezvous channel, returning the sender/receiver halves.
pub fn channel<T: Send>() -> (Sender<T>, Receiver<T>) {
  let shared = Arc::new(HandoffShared::new());
  (Sender::from_shared(Arc::clone(&shared)), Receiver::from_shared(shared))
}

/// Creates a new rendezvous channel whose receiver is async.
pub fn channel_async<T: Send>() -> (Sender<T>, AsyncReceiver<T>) {
  let (tx, rx) = channel();
  (tx, rx.to_async())
}
