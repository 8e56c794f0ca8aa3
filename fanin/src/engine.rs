//! The drain engine: one pump thread per input plus a completion watcher.
//!
//! Every pump forwards values from its input into a shared hand-off channel.
//! The pumps of one drain share a [`PumpTracker`]; each pump holds a
//! [`PumpGuard`] that decrements the tracker when the pump exits, however it
//! exits. The watcher blocks until the tracker reaches zero and then closes
//! the output, which is the only end-of-data signal the consumer sees.

use crate::config::FanInConfig;
use crate::error::{DrainError, RecvError, RecvTimeoutError, TryRecvError};
use crate::handoff::{self, AsyncReceiver, Receiver, RecvFuture, Sender};
use crate::registry::RegisteredStream;
use crate::value::Value;

use std::fmt;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::thread;
use std::time::Duration;

use futures_core::Stream;
use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace, warn};

#[derive(Debug)]
struct TrackerState {
  remaining: usize,
  closed: bool,
}

/// Counts the pumps of one drain that are still running.
///
/// The count starts at the number of pumps, only ever decreases, and reaches
/// zero exactly once.
pub(crate) struct PumpTracker {
  state: Mutex<TrackerState>,
  all_done: Condvar,
}

impl fmt::Debug for PumpTracker {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let state = self.state.lock();
    f.debug_struct("PumpTracker")
      .field("remaining", &state.remaining)
      .field("closed", &state.closed)
      .finish()
  }
}

impl PumpTracker {
  pub(crate) fn new(pumps: usize) -> Arc<Self> {
    Arc::new(Self {
      state: Mutex::new(TrackerState {
        remaining: pumps,
        closed: false,
      }),
      all_done: Condvar::new(),
    })
  }

  fn finish_one(&self) {
    let mut state = self.state.lock();
    debug_assert!(state.remaining > 0, "pump count went negative");
    state.remaining = state.remaining.saturating_sub(1);
    if state.remaining == 0 {
      self.all_done.notify_all();
    }
  }

  /// Blocks until every pump has finished.
  fn wait(&self) {
    let mut state = self.state.lock();
    while state.remaining > 0 {
      self.all_done.wait(&mut state);
    }
  }

  fn mark_closed(&self) {
    self.state.lock().closed = true;
  }

  /// Marks a drain that could not start as finished. Pumps that did start
  /// still count down as they exit.
  fn abort(&self) {
    self.mark_closed();
    self.all_done.notify_all();
  }

  pub(crate) fn remaining(&self) -> usize {
    self.state.lock().remaining
  }

  /// True once the watcher has closed the output.
  pub(crate) fn is_closed(&self) -> bool {
    self.state.lock().closed
  }
}

/// Held by a pump for its whole life; dropping it counts the pump as done.
struct PumpGuard(Arc<PumpTracker>);

impl Drop for PumpGuard {
  fn drop(&mut self) {
    self.0.finish_one();
  }
}

/// Relays every value of `stream` into `output` until the stream is
/// exhausted or the consumer goes away.
fn pump(mut stream: RegisteredStream, output: Sender<Value>, _guard: PumpGuard) {
  let id = stream.id();
  trace!(source = %id, type_name = stream.type_name(), "pump started");

  let mut forwarded: u64 = 0;
  while let Some(value) = stream.recv_value() {
    if output.send(value).is_err() {
      debug!(source = %id, forwarded, "drain receiver dropped, pump stopping");
      return;
    }
    forwarded += 1;
  }
  debug!(source = %id, forwarded, "source exhausted, pump terminated");
}

fn watch(tracker: Arc<PumpTracker>, output: Sender<Value>) {
  tracker.wait();
  // Marked first, so a consumer that has seen the disconnect also sees the
  // drain as finished.
  tracker.mark_closed();
  // Fails only if a sender closed the channel already.
  let _ = output.close();
  debug!("all pumps terminated, drain output closed");
}

/// Starts one pump per stream plus the watcher, returning the consumer side.
///
/// If a thread fails to spawn, the tracker is aborted so the drain reads as
/// finished, and the consumer side is dropped so pumps already running stop
/// at their next hand-off.
pub(crate) fn start(
  streams: Vec<RegisteredStream>,
  config: &FanInConfig,
  tracker: Arc<PumpTracker>,
) -> Result<Drain, DrainError> {
  debug_assert_eq!(tracker.remaining(), streams.len());
  let (output, receiver) = handoff::channel::<Value>();
  debug!(pumps = streams.len(), "starting drain");

  if let Err(e) = spawn_threads(streams, config, &tracker, output) {
    tracker.abort();
    warn!(error = %e, "failed to spawn drain threads, drain aborted");
    return Err(DrainError::Spawn(e));
  }
  Ok(Drain { receiver, tracker })
}

fn spawn_threads(
  streams: Vec<RegisteredStream>,
  config: &FanInConfig,
  tracker: &Arc<PumpTracker>,
  output: Sender<Value>,
) -> io::Result<()> {
  // Every stream gets its guard up front, so streams that never reach a
  // thread still count down when dropped.
  let pumps: Vec<(RegisteredStream, PumpGuard)> = streams
    .into_iter()
    .map(|stream| (stream, PumpGuard(Arc::clone(tracker))))
    .collect();

  for (stream, guard) in pumps {
    let output = output.clone();
    let mut builder = thread::Builder::new()
      .name(config.pump_thread_name(stream.id().index()));
    if let Some(size) = config.stack_size() {
      builder = builder.stack_size(size);
    }
    builder.spawn(move || pump(stream, output, guard))?;
  }

  let watcher_tracker = Arc::clone(tracker);
  thread::Builder::new()
    .name(config.watcher_thread_name())
    .spawn(move || watch(watcher_tracker, output))?;
  Ok(())
}

// --- Consumer side ---

/// The output of [`FanIn::drain`](crate::FanIn::drain): every value of every
/// registered input, closing once all inputs are exhausted.
///
/// Values from one input arrive in the order that input produced them; there
/// is no ordering between inputs. Iterating blocks the current thread between
/// values. Dropping a `Drain` early stops every pump after the value it is
/// currently offering.
pub struct Drain {
  receiver: Receiver<Value>,
  tracker: Arc<PumpTracker>,
}

impl fmt::Debug for Drain {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Drain")
      .field("tracker", &self.tracker)
      .finish_non_exhaustive()
  }
}

impl Drain {
  /// Receives the next value, blocking until one is available.
  ///
  /// Returns [`RecvError::Disconnected`] once every input is exhausted.
  pub fn recv(&self) -> Result<Value, RecvError> {
    self.receiver.recv()
  }

  /// Takes a value if a pump is currently offering one.
  pub fn try_recv(&self) -> Result<Value, TryRecvError> {
    self.receiver.try_recv()
  }

  pub fn recv_timeout(&self, timeout: Duration) -> Result<Value, RecvTimeoutError> {
    self.receiver.recv_timeout(timeout)
  }

  /// Number of pumps whose input has not been exhausted yet.
  pub fn pumps_remaining(&self) -> usize {
    self.tracker.remaining()
  }

  /// True once every pump has terminated and the output has been closed.
  pub fn is_drained(&self) -> bool {
    self.tracker.is_closed()
  }

  /// Converts this drain into an [`AsyncDrain`] for use in async code.
  pub fn into_async(self) -> AsyncDrain {
    AsyncDrain {
      receiver: self.receiver.to_async(),
      tracker: self.tracker,
    }
  }
}

impl Iterator for Drain {
  type Item = Value;

  fn next(&mut self) -> Option<Value> {
    self.receiver.recv().ok()
  }
}

/// The async counterpart of [`Drain`]; a [`Stream`] of [`Value`]s.
pub struct AsyncDrain {
  receiver: AsyncReceiver<Value>,
  tracker: Arc<PumpTracker>,
}

impl fmt::Debug for AsyncDrain {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("AsyncDrain")
      .field("tracker", &self.tracker)
      .finish_non_exhaustive()
  }
}

impl AsyncDrain {
  /// Receives the next value without blocking the executor thread.
  pub fn recv(&self) -> RecvFuture<'_, Value> {
    self.receiver.recv()
  }

  pub fn try_recv(&self) -> Result<Value, TryRecvError> {
    self.receiver.try_recv()
  }

  pub fn pumps_remaining(&self) -> usize {
    self.tracker.remaining()
  }

  pub fn is_drained(&self) -> bool {
    self.tracker.is_closed()
  }
}

impl Stream for AsyncDrain {
  type Item = Value;

  fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Value>> {
    Pin::new(&mut self.get_mut().receiver).poll_next(cx)
  }
}
