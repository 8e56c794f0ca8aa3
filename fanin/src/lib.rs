//! Fan-in for channels of any element type.
//!
//! A [`FanIn`] collects any number of receivable channels, of the same or of
//! different element types, and drains them together through one output
//! channel. Each registered input gets a dedicated pump thread that forwards
//! its values, one rendezvous hand-off at a time, into the shared output; a
//! watcher closes the output once every input has closed.
//!
//! Values arrive as [`Value`]s, tagged with their original type and the
//! [`SourceId`] of the input they came from. Order is preserved per input,
//! never across inputs.
//!
//! Inputs are accepted through the [`Candidate`] capability (checked at run
//! time, so plain values and send-only handles are rejected with a
//! [`RegisterError`]) or the [`Source`] trait (checked at compile time).
//! Receivers of [`handoff`] and `std::sync::mpsc` channels are supported out
//! of the box, tokio mpsc receivers with the `tokio` feature.
//!
//! ```
//! use fibre_fanin::{handoff, register, FanIn};
//! use std::sync::mpsc;
//! use std::thread;
//!
//! let mut fan_in = FanIn::new();
//! let (ints_tx, ints) = handoff::channel::<i32>();
//! let (words_tx, words) = mpsc::channel::<String>();
//! register!(fan_in, ints, words).unwrap();
//!
//! thread::spawn(move || {
//!   for i in 0..2 {
//!     ints_tx.send(i).unwrap();
//!   }
//! });
//! thread::spawn(move || {
//!   for i in 0..2 {
//!     words_tx.send(format!("Num {}", i)).unwrap();
//!   }
//! });
//!
//! let values: Vec<_> = fan_in.drain().unwrap().collect();
//! assert_eq!(values.len(), 4);
//! ```

pub mod config;
pub mod error;
pub mod handoff;

mod engine;
mod fanin;
mod macros;
mod registry;
mod source;
mod value;

pub use config::{FanInBuilder, FanInConfig};
pub use engine::{AsyncDrain, Drain};
pub use error::{
  CloseError, DrainError, RecvError, RecvTimeoutError, RegisterError, SendError, TryRecvError,
};
pub use fanin::{FanIn, Phase};
pub use registry::{Candidate, Inspection, Kind, Opaque, RegisteredStream};
pub use source::Source;
pub use value::{SourceId, Value};
