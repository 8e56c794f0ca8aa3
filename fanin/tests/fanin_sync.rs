mod common;
use common::*;

use fibre_fanin::{
  handoff, register, DrainError, FanIn, Kind, Opaque, Phase, RecvError, RecvTimeoutError,
  RegisterError, Source, Value,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Tag {
  x: i32,
}

#[test]
fn draining_empty_fan_in_stops() {
  init_tracing();
  let mut fan_in = FanIn::new();
  let drain = fan_in.drain().unwrap();
  assert_eq!(drain.count(), 0);
}

#[test]
fn empty_drain_reports_closed() {
  let mut fan_in = FanIn::new();
  let drain = fan_in.drain().unwrap();
  assert_eq!(
    drain.recv_timeout(LONG_TIMEOUT).map(|_| ()),
    Err(RecvTimeoutError::Disconnected)
  );
  assert!(drain.is_drained());
  assert_eq!(fan_in.phase(), Phase::Drained);
}

#[test]
fn heterogeneous_sources_keep_per_source_order() {
  init_tracing();
  let mut fan_in = FanIn::new();
  let (ints_tx, ints) = handoff::channel::<i32>();
  let (words_tx, words) = handoff::channel::<String>();
  let (tags_tx, tags) = handoff::channel::<Tag>();
  let ids = register!(fan_in, ints, words, tags).unwrap();
  assert_eq!(ids.iter().map(|id| id.index()).collect::<Vec<_>>(), vec![0, 1, 2]);

  let producers = vec![
    spawn_producer(ints_tx, 0..2),
    spawn_producer(words_tx, (0..2).map(|i| format!("Num {}", i))),
    spawn_producer(tags_tx, (0..2).map(|x| Tag { x })),
  ];

  let values: Vec<Value> = fan_in.drain().unwrap().collect();
  assert_eq!(values.len(), 6);

  let ints: Vec<i32> = values
    .iter()
    .filter_map(|v| v.downcast_ref::<i32>().copied())
    .collect();
  let words: Vec<&String> = values
    .iter()
    .filter_map(|v| v.downcast_ref::<String>())
    .collect();
  let tags: Vec<Tag> = values
    .iter()
    .filter_map(|v| v.downcast_ref::<Tag>().copied())
    .collect();
  assert_eq!(ints, vec![0, 1]);
  assert_eq!(words, vec!["Num 0", "Num 1"]);
  assert_eq!(tags, vec![Tag { x: 0 }, Tag { x: 1 }]);

  for p in producers {
    p.join().unwrap();
  }
}

#[test]
fn merging_three_string_channels_yields_all() {
  let mut fan_in = FanIn::new();
  let (tx1, rx1) = handoff::channel::<String>();
  fan_in.register(rx1).unwrap();
  let (tx2, rx2) = handoff::channel::<String>();
  let (tx3, rx3) = handoff::channel::<String>();
  register!(fan_in, rx2, rx3).unwrap();
  assert_eq!(fan_in.len(), 3);

  let mut producers = Vec::new();
  for (n, tx) in [(1, tx1), (2, tx2), (3, tx3)] {
    producers.push(spawn_producer(tx, (0..5).map(move |i| format!("From {}: {}", n, i))));
  }

  let mut received: Vec<String> = fan_in
    .drain()
    .unwrap()
    .map(|v| v.downcast::<String>().unwrap())
    .collect();
  assert_eq!(received.len(), 15);

  let mut expected: Vec<String> = (1..=3)
    .flat_map(|n| (0..5).map(move |i| format!("From {}: {}", n, i)))
    .collect();
  received.sort();
  expected.sort();
  assert_eq!(received, expected);

  for p in producers {
    p.join().unwrap();
  }
}

#[test]
fn one_value_per_type() {
  let mut fan_in = FanIn::new();
  let (words_tx, words) = handoff::channel::<&'static str>();
  let (ints_tx, ints) = mpsc::channel::<i32>();
  fan_in.register(words).unwrap();
  fan_in.register(ints).unwrap();

  let a = spawn_producer(words_tx, ["Hello"]);
  let b = thread::spawn(move || ints_tx.send(123).unwrap());

  let values: Vec<Value> = fan_in.drain().unwrap().collect();
  assert_eq!(values.len(), 2);
  let words: Vec<&str> = values
    .iter()
    .filter_map(|v| v.downcast_ref::<&str>().copied())
    .collect();
  let ints: Vec<i32> = values
    .iter()
    .filter_map(|v| v.downcast_ref::<i32>().copied())
    .collect();
  assert_eq!(words, vec!["Hello"]);
  assert_eq!(ints, vec![123]);

  a.join().unwrap();
  b.join().unwrap();
}

#[test]
fn values_are_tagged_with_their_source() {
  let mut fan_in = FanIn::new();
  let mut producers = Vec::new();
  for _ in 0..4 {
    let (tx, rx) = handoff::channel::<usize>();
    fan_in.register(rx).unwrap();
    producers.push(spawn_producer(tx, 0..ITEMS_MEDIUM));
  }

  let grouped = by_source::<usize>(fan_in.drain().unwrap().collect());
  assert_eq!(grouped.len(), 4);
  for (source, items) in grouped {
    assert!(source.index() < 4);
    assert_eq!(items, (0..ITEMS_MEDIUM).collect::<Vec<_>>(), "order broken for {}", source);
  }

  for p in producers {
    p.join().unwrap();
  }
}

#[test]
fn total_equals_sum_of_sources() {
  let mut fan_in = FanIn::new();
  let sizes = [0, 1, ITEMS_LOW, ITEMS_HIGH];
  let mut producers = Vec::new();
  for size in sizes {
    let (tx, rx) = mpsc::channel::<u64>();
    fan_in.register(rx).unwrap();
    producers.push(thread::spawn(move || {
      for i in 0..size as u64 {
        tx.send(i).unwrap();
      }
    }));
  }

  let mut drain = fan_in.drain().unwrap();
  let count = drain.by_ref().count();
  assert_eq!(count, sizes.iter().sum::<usize>());
  // Closed for good.
  assert_eq!(drain.recv().map(|_| ()), Err(RecvError::Disconnected));
  assert!(drain.next().is_none());
  assert_eq!(drain.pumps_remaining(), 0);

  for p in producers {
    p.join().unwrap();
  }
}

#[test]
fn merging_non_channels_fails() {
  let mut fan_in = FanIn::new();

  let err = fan_in.register("foo").unwrap_err();
  assert_eq!(err, RegisterError::NotAChannel { op: "register", kind: Kind::String });
  assert_eq!(err.to_string(), "register: cannot add string as channel");

  let err = fan_in.register(123).unwrap_err();
  assert_eq!(err.to_string(), "register: cannot add int as channel");

  let err = fan_in.register(Opaque(Tag { x: 1 })).unwrap_err();
  assert_eq!(err.to_string(), "register: cannot add struct as channel");

  let err = fan_in.register(vec![1u8, 2, 3]).unwrap_err();
  assert_eq!(err, RegisterError::NotAChannel { op: "register", kind: Kind::Slice });

  let err = fan_in.register(HashMap::<String, u32>::new()).unwrap_err();
  assert_eq!(err, RegisterError::NotAChannel { op: "register", kind: Kind::Map });

  assert!(fan_in.is_empty());
}

#[test]
fn merging_non_receiving_channels_fails() {
  let mut fan_in = FanIn::new();
  let (tx, _rx) = handoff::channel::<i32>();
  let err = fan_in.register(tx).unwrap_err();
  assert_eq!(err, RegisterError::NotReceivable { op: "register" });
  assert_eq!(err.to_string(), "register: cannot add non-receiving channel");

  let (std_tx, _std_rx) = mpsc::channel::<i32>();
  assert_eq!(
    fan_in.register(std_tx).unwrap_err(),
    RegisterError::NotReceivable { op: "register" }
  );
  let (sync_tx, _sync_rx) = mpsc::sync_channel::<i32>(0);
  assert_eq!(
    fan_in.register(sync_tx).unwrap_err(),
    RegisterError::NotReceivable { op: "register" }
  );

  assert_eq!(fan_in.len(), 0);
}

#[test]
fn failed_batch_registers_nothing() {
  let mut fan_in = FanIn::new();
  let (_keep_tx, keep) = handoff::channel::<u8>();
  fan_in.register(keep).unwrap();

  let (_tx1, rx1) = handoff::channel::<u8>();
  let (tx2, _rx2) = handoff::channel::<u8>();
  let err = register!(fan_in, rx1, tx2).unwrap_err();
  assert_eq!(err, RegisterError::NotReceivable { op: "register_all" });
  assert_eq!(fan_in.len(), 1);
  assert_eq!(fan_in.sources()[0].id().index(), 0);
}

#[test]
fn drain_is_one_shot() {
  let mut fan_in = FanIn::new();
  assert_eq!(fan_in.phase(), Phase::Idle);
  let (tx, rx) = handoff::channel::<i32>();
  fan_in.register(rx).unwrap();

  let drain = fan_in.drain().unwrap();
  assert!(matches!(fan_in.drain(), Err(DrainError::AlreadyDrained)));

  let (_late_tx, late) = handoff::channel::<i32>();
  assert_eq!(
    fan_in.register(late).unwrap_err(),
    RegisterError::AlreadyDrained { op: "register" }
  );
  let (_late_tx, late) = handoff::channel::<i32>();
  assert_eq!(
    fan_in.add_source(late).unwrap_err(),
    RegisterError::AlreadyDrained { op: "add_source" }
  );
  assert_eq!(fan_in.len(), 1);
  assert!(fan_in.sources().is_empty());

  let producer = spawn_producer(tx, [7]);
  let values: Vec<i32> = drain.map(|v| v.downcast::<i32>().unwrap()).collect();
  assert_eq!(values, vec![7]);
  assert_eq!(fan_in.phase(), Phase::Drained);
  producer.join().unwrap();
}

#[test]
fn failed_spawn_ends_drain() {
  init_tracing();
  // No platform can map a stack this large, so the first pump fails to spawn.
  let mut fan_in = FanIn::builder().stack_size(1usize << 62).build();
  let (_tx1, rx1) = handoff::channel::<u32>();
  let (_tx2, rx2) = handoff::channel::<u32>();
  register!(fan_in, rx1, rx2).unwrap();

  assert!(matches!(fan_in.drain(), Err(DrainError::Spawn(_))));
  assert_eq!(fan_in.phase(), Phase::Drained);
  assert!(matches!(fan_in.drain(), Err(DrainError::AlreadyDrained)));
  assert_eq!(fan_in.len(), 2);
  assert!(fan_in.sources().is_empty());
}

#[test]
fn draining_phase_until_sources_close() {
  let mut fan_in = FanIn::new();
  let (tx, rx) = handoff::channel::<i32>();
  fan_in.register(rx).unwrap();
  let drain = fan_in.drain().unwrap();

  assert_eq!(fan_in.phase(), Phase::Draining);
  assert_eq!(drain.pumps_remaining(), 1);
  assert!(!drain.is_drained());
  assert_eq!(
    drain.recv_timeout(std::time::Duration::from_millis(50)).map(|_| ()),
    Err(RecvTimeoutError::Timeout)
  );

  drop(tx);
  assert!(drain.recv_timeout(LONG_TIMEOUT).is_err());
  assert!(drain.is_drained());
  assert_eq!(fan_in.phase(), Phase::Drained);
}

#[test]
fn dropping_drain_stops_pumps() {
  let mut fan_in = FanIn::new();
  let (tx, rx) = handoff::channel::<usize>();
  fan_in.register(rx).unwrap();
  let producer = thread::spawn(move || {
    let mut sent = 0;
    for i in 0..ITEMS_HIGH {
      if tx.send(i).is_err() {
        break;
      }
      sent += 1;
    }
    sent
  });

  let mut drain = fan_in.drain().unwrap();
  let first: Vec<usize> = drain
    .by_ref()
    .take(3)
    .map(|v| v.downcast().unwrap())
    .collect();
  assert_eq!(first, vec![0, 1, 2]);
  drop(drain);

  // The pump exits after its pending value, so the producer's channel loses
  // its receiver and the producer stops early.
  let sent = producer.join().unwrap();
  assert!(sent < ITEMS_HIGH);
}

struct CountingSource {
  remaining: usize,
  thread_names: Arc<parking_lot::Mutex<Vec<String>>>,
  calls: Arc<AtomicUsize>,
}

impl Source for CountingSource {
  type Item = usize;

  fn recv_next(&mut self) -> Option<usize> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    if let Some(name) = thread::current().name() {
      self.thread_names.lock().push(name.to_string());
    }
    if self.remaining == 0 {
      return None;
    }
    self.remaining -= 1;
    Some(self.remaining)
  }
}

#[test]
fn add_source_uses_configured_threads() {
  let names = Arc::new(parking_lot::Mutex::new(Vec::new()));
  let calls = Arc::new(AtomicUsize::new(0));
  let mut fan_in = FanIn::builder().thread_name("merge-test").build();
  let id = fan_in
    .add_source(CountingSource {
      remaining: 3,
      thread_names: names.clone(),
      calls: calls.clone(),
    })
    .unwrap();
  assert_eq!(fan_in.sources()[0].type_name(), std::any::type_name::<usize>());

  let values: Vec<usize> = fan_in
    .drain()
    .unwrap()
    .map(|v| {
      assert_eq!(v.source(), id);
      v.downcast().unwrap()
    })
    .collect();
  assert_eq!(values, vec![2, 1, 0]);
  // Three values plus the final `None`, never polled again after that.
  assert_eq!(calls.load(Ordering::SeqCst), 4);
  assert!(names.lock().iter().all(|n| n == "merge-test-pump-0"));
}

#[test]
fn pumps_count_down_as_sources_close() {
  let mut fan_in = FanIn::new();
  let (tx_a, rx_a) = handoff::channel::<u8>();
  let (tx_b, rx_b) = handoff::channel::<u8>();
  register!(fan_in, rx_a, rx_b).unwrap();
  let drain = fan_in.drain().unwrap();
  assert_eq!(drain.pumps_remaining(), 2);

  drop(tx_a);
  let deadline = std::time::Instant::now() + LONG_TIMEOUT;
  while drain.pumps_remaining() != 1 {
    assert!(std::time::Instant::now() < deadline, "pump A never terminated");
    thread::yield_now();
  }
  assert!(!drain.is_drained());

  drop(tx_b);
  assert!(drain.recv_timeout(LONG_TIMEOUT).is_err());
  assert_eq!(drain.pumps_remaining(), 0);
}
