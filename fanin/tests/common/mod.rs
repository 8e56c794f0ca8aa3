#![allow(dead_code)]

use fibre_fanin::{handoff, SourceId, Value};
use std::collections::HashMap;
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub const SHORT_TIMEOUT: Duration = Duration::from_millis(500);
pub const LONG_TIMEOUT: Duration = Duration::from_secs(3);
pub const ITEMS_LOW: usize = 50;
pub const ITEMS_MEDIUM: usize = 200;
pub const ITEMS_HIGH: usize = 1000;

/// Installs a test-writer subscriber so pump events show up with `--nocapture`.
pub fn init_tracing() {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_test_writer()
    .try_init();
}

/// Spawns a producer that sends every item on a hand-off channel, then closes
/// it by dropping the sender.
pub fn spawn_producer<T, I>(tx: handoff::Sender<T>, items: I) -> JoinHandle<()>
where
  T: Send + 'static,
  I: IntoIterator<Item = T> + Send + 'static,
{
  thread::spawn(move || {
    for item in items {
      tx.send(item).unwrap();
    }
  })
}

/// Groups drained values by source, downcasting each to `T`.
pub fn by_source<T: 'static>(values: Vec<Value>) -> HashMap<SourceId, Vec<T>> {
  let mut grouped: HashMap<SourceId, Vec<T>> = HashMap::new();
  for value in values {
    let source = value.source();
    let item = value
      .downcast::<T>()
      .unwrap_or_else(|v| panic!("unexpected element type {}", v.type_name()));
    grouped.entry(source).or_default().push(item);
  }
  grouped
}
