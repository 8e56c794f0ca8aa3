//! The fan-in coordinator.

use crate::config::{FanInBuilder, FanInConfig};
use crate::engine::{self, Drain, PumpTracker};
use crate::error::{DrainError, RegisterError};
use crate::registry::{Candidate, RegisteredStream, Registry};
use crate::source::{self, Source};
use crate::value::SourceId;

use std::fmt;
use std::sync::Arc;

use tracing::debug;

/// Where a [`FanIn`] is in its one-shot life cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  /// Accepting registrations; `drain` has not been called.
  Idle,
  /// Pumps are running.
  Draining,
  /// Every pump has terminated and the output is closed.
  Drained,
}

/// Collects receivable channels of any element types and drains them
/// together through a single output.
///
/// Inputs are registered with [`register`](FanIn::register) (checked at run
/// time) or [`add_source`](FanIn::add_source) (checked at compile time).
/// [`drain`](FanIn::drain) then starts one pump thread per input and returns
/// a [`Drain`] that yields every value of every input and closes once all of
/// them are exhausted. A coordinator drains exactly once.
///
/// Every registered input must eventually close, otherwise the drain never
/// finishes.
///
/// ```
/// use fibre_fanin::{handoff, FanIn};
/// use std::thread;
///
/// let mut fan_in = FanIn::new();
/// let (numbers_tx, numbers) = handoff::channel::<i32>();
/// let (words_tx, words) = handoff::channel::<String>();
/// fan_in.register(numbers).unwrap();
/// fan_in.register(words).unwrap();
///
/// thread::spawn(move || numbers_tx.send(123).unwrap());
/// thread::spawn(move || words_tx.send("Hello".to_string()).unwrap());
///
/// let mut seen = 0;
/// for value in fan_in.drain().unwrap() {
///   if let Some(n) = value.downcast_ref::<i32>() {
///     assert_eq!(*n, 123);
///   } else {
///     assert_eq!(value.downcast::<String>().unwrap(), "Hello");
///   }
///   seen += 1;
/// }
/// assert_eq!(seen, 2);
/// ```
pub struct FanIn {
  registry: Registry,
  config: FanInConfig,
  tracker: Option<Arc<PumpTracker>>,
}

impl FanIn {
  /// Creates an empty coordinator with the default configuration.
  pub fn new() -> Self {
    Self::with_config(FanInConfig::default())
  }

  /// Returns a builder to configure a coordinator.
  pub fn builder() -> FanInBuilder {
    FanInBuilder::new()
  }

  pub fn with_config(config: FanInConfig) -> Self {
    Self {
      registry: Registry::default(),
      config,
      tracker: None,
    }
  }

  pub fn config(&self) -> &FanInConfig {
    &self.config
  }

  fn ensure_idle(&self, op: &'static str) -> Result<(), RegisterError> {
    if self.tracker.is_some() {
      return Err(RegisterError::AlreadyDrained { op });
    }
    Ok(())
  }

  /// Registers one input.
  ///
  /// Fails with [`RegisterError::NotAChannel`] if `candidate` is not a
  /// channel and with [`RegisterError::NotReceivable`] if it is a send-only
  /// handle. A failed registration leaves the coordinator unchanged.
  pub fn register<C: Candidate + 'static>(
    &mut self,
    candidate: C,
  ) -> Result<SourceId, RegisterError> {
    const OP: &str = "register";
    self.ensure_idle(OP)?;
    self.registry.register(OP, Box::new(candidate)).map_err(|e| {
      debug!(error = %e, "rejected fan-in input");
      e
    })
  }

  /// Registers a batch of inputs, all or nothing.
  ///
  /// Every candidate is inspected before any is added. If one is invalid,
  /// its error is returned and none of the batch is registered; the batch
  /// is consumed either way. See also the [`register!`](crate::register)
  /// macro.
  pub fn register_all<I>(&mut self, candidates: I) -> Result<Vec<SourceId>, RegisterError>
  where
    I: IntoIterator<Item = Box<dyn Candidate>>,
  {
    const OP: &str = "register_all";
    self.ensure_idle(OP)?;
    self.registry.register_all(OP, candidates).map_err(|e| {
      debug!(error = %e, "rejected fan-in batch");
      e
    })
  }

  /// Registers an input whose receivability is known at compile time.
  ///
  /// Fails only once the coordinator has been drained.
  pub fn add_source<S: Source>(&mut self, source: S) -> Result<SourceId, RegisterError> {
    self.ensure_idle("add_source")?;
    Ok(self.registry.push(source::erase(source)))
  }

  /// Number of inputs registered so far, drained ones included.
  pub fn len(&self) -> usize {
    self.registry.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// The registered inputs, in registration order. Empty once drained, as
  /// the inputs then belong to their pumps.
  pub fn sources(&self) -> &[RegisteredStream] {
    self.registry.streams()
  }

  pub fn phase(&self) -> Phase {
    match &self.tracker {
      None => Phase::Idle,
      Some(tracker) if tracker.is_closed() => Phase::Drained,
      Some(_) => Phase::Draining,
    }
  }

  /// Starts draining every registered input and returns the merged output.
  ///
  /// Returns immediately; the pumps run on their own threads. With no
  /// inputs the output closes right away without yielding anything.
  ///
  /// A coordinator drains once: a second call fails with
  /// [`DrainError::AlreadyDrained`], and so does a call after a first one
  /// that failed to spawn its threads.
  pub fn drain(&mut self) -> Result<Drain, DrainError> {
    if self.tracker.is_some() {
      return Err(DrainError::AlreadyDrained);
    }
    let streams = self.registry.take();
    let tracker = PumpTracker::new(streams.len());
    self.tracker = Some(Arc::clone(&tracker));
    engine::start(streams, &self.config, tracker)
  }
}

impl Default for FanIn {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Debug for FanIn {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("FanIn")
      .field("sources", &self.registry.streams())
      .field("config", &self.config)
      .field("phase", &self.phase())
      .finish()
  }
}
