// examples/merge.rs
use fibre_fanin::{handoff, register, FanIn};
use std::thread;

#[derive(Debug, Clone, Copy)]
struct Point {
  x: i32,
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  println!("--- Merging channels of three element types ---");
  let mut fan_in = FanIn::builder().thread_name("merge-example").build();
  let (ints_tx, ints) = handoff::channel::<i32>();
  let (words_tx, words) = handoff::channel::<String>();
  let (points_tx, points) = handoff::channel::<Point>();
  if let Err(e) = register!(fan_in, ints, words, points) {
    panic!("{}", e);
  }

  // Feed the channels; dropping a sender closes its channel.
  thread::spawn(move || {
    for i in 0..2 {
      ints_tx.send(i).unwrap();
    }
  });
  thread::spawn(move || {
    for i in 0..2 {
      words_tx.send(format!("Num {}", i)).unwrap();
    }
  });
  thread::spawn(move || {
    for x in 0..2 {
      points_tx.send(Point { x }).unwrap();
    }
  });

  // Drain until all are closed. Output order varies between runs.
  for value in fan_in.drain().unwrap() {
    match value.downcast_ref::<Point>() {
      Some(point) => println!("Got {:?} from {}", point, value.source()),
      None => println!("Got {} from {}", value, value.source()),
    }
  }

  println!("\n--- Rejected inputs ---");
  let mut fan_in = FanIn::new();
  let (tx, _rx) = handoff::channel::<i32>();
  for err in [
    fan_in.register("foo").unwrap_err(),
    fan_in.register(123).unwrap_err(),
    fan_in.register(tx).unwrap_err(),
  ] {
    println!("Error: {}", err);
  }
}
