//! Run-time registration of fan-in inputs.
//!
//! A [`Candidate`] is anything that may be handed to
//! [`FanIn::register`](crate::FanIn::register). Inspecting a candidate tells
//! the registry whether it is a receivable channel (accepted), a send-only
//! channel handle (rejected as not receivable) or not a channel at all
//! (rejected, naming its [`Kind`]).

use crate::error::RegisterError;
use crate::handoff;
use crate::source::{self, ErasedSource, Source};
use crate::value::{SourceId, Value};

use std::collections::HashMap;
use std::fmt;
use std::sync::mpsc as std_mpsc;

/// The kind of a value that is not a channel, used in
/// [`RegisterError::NotAChannel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Kind {
  Bool,
  Int,
  Uint,
  Float,
  Char,
  String,
  Unit,
  Tuple,
  Slice,
  Map,
  Struct,
}

impl fmt::Display for Kind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Kind::Bool => "bool",
      Kind::Int => "int",
      Kind::Uint => "uint",
      Kind::Float => "float",
      Kind::Char => "char",
      Kind::String => "string",
      Kind::Unit => "unit",
      Kind::Tuple => "tuple",
      Kind::Slice => "slice",
      Kind::Map => "map",
      Kind::Struct => "struct",
    };
    f.write_str(name)
  }
}

enum Class {
  Receivable(Box<dyn ErasedSource>),
  SendOnly,
  NotAChannel(Kind),
}

/// The outcome of inspecting a [`Candidate`].
pub struct Inspection(Class);

impl Inspection {
  /// The candidate is a receivable channel.
  pub fn receivable<S: Source>(source: S) -> Self {
    Inspection(Class::Receivable(source::erase(source)))
  }

  /// The candidate is a channel handle that can only send.
  pub fn send_only() -> Self {
    Inspection(Class::SendOnly)
  }

  /// The candidate is not a channel.
  pub fn not_a_channel(kind: Kind) -> Self {
    Inspection(Class::NotAChannel(kind))
  }

  /// Returns `true` for a receivable channel.
  pub fn is_receivable(&self) -> bool {
    matches!(self.0, Class::Receivable(_))
  }
}

impl fmt::Debug for Inspection {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.0 {
      Class::Receivable(source) => f
        .debug_tuple("Receivable")
        .field(&source.item_type_name())
        .finish(),
      Class::SendOnly => f.write_str("SendOnly"),
      Class::NotAChannel(kind) => f.debug_tuple("NotAChannel").field(kind).finish(),
    }
  }
}

/// A value offered for registration with a [`FanIn`](crate::FanIn).
///
/// Channel receivers inspect as receivable, channel senders as send-only,
/// and plain values as "not a channel". Implement it for your own channel
/// types with [`Inspection::receivable`] (their receiver must implement
/// [`Source`]) or [`Inspection::send_only`].
pub trait Candidate: Send {
  /// Consumes the candidate and classifies it.
  fn inspect(self: Box<Self>) -> Inspection;
}

impl<C: Candidate + ?Sized> Candidate for Box<C> {
  fn inspect(self: Box<Self>) -> Inspection {
    C::inspect(*self)
  }
}

// --- Receivers ---

impl<T: Send + 'static> Candidate for handoff::Receiver<T> {
  fn inspect(self: Box<Self>) -> Inspection {
    Inspection::receivable(*self)
  }
}

impl<T: Send + 'static> Candidate for handoff::AsyncReceiver<T> {
  fn inspect(self: Box<Self>) -> Inspection {
    Inspection::receivable(*self)
  }
}

impl<T: Send + 'static> Candidate for std_mpsc::Receiver<T> {
  fn inspect(self: Box<Self>) -> Inspection {
    Inspection::receivable(*self)
  }
}

#[cfg(feature = "tokio")]
impl<T: Send + 'static> Candidate for tokio::sync::mpsc::Receiver<T> {
  fn inspect(self: Box<Self>) -> Inspection {
    Inspection::receivable(*self)
  }
}

#[cfg(feature = "tokio")]
impl<T: Send + 'static> Candidate for tokio::sync::mpsc::UnboundedReceiver<T> {
  fn inspect(self: Box<Self>) -> Inspection {
    Inspection::receivable(*self)
  }
}

// --- Send-only handles ---

macro_rules! impl_send_only {
  ($($ty:ty),+ $(,)?) => {
    $(
      impl<T: Send> Candidate for $ty {
        fn inspect(self: Box<Self>) -> Inspection {
          Inspection::send_only()
        }
      }
    )+
  };
}

impl_send_only!(handoff::Sender<T>, std_mpsc::Sender<T>, std_mpsc::SyncSender<T>);

#[cfg(feature = "tokio")]
impl_send_only!(
  tokio::sync::mpsc::Sender<T>,
  tokio::sync::mpsc::UnboundedSender<T>
);

// --- Plain values ---

macro_rules! impl_not_a_channel {
  ($kind:ident => $($ty:ty),+ $(,)?) => {
    $(
      impl Candidate for $ty {
        fn inspect(self: Box<Self>) -> Inspection {
          Inspection::not_a_channel(Kind::$kind)
        }
      }
    )+
  };
}

impl_not_a_channel!(Bool => bool);
impl_not_a_channel!(Int => i8, i16, i32, i64, i128, isize);
impl_not_a_channel!(Uint => u8, u16, u32, u64, u128, usize);
impl_not_a_channel!(Float => f32, f64);
impl_not_a_channel!(Char => char);
impl_not_a_channel!(String => String, &'static str);
impl_not_a_channel!(Unit => ());

impl<T: Send> Candidate for Vec<T> {
  fn inspect(self: Box<Self>) -> Inspection {
    Inspection::not_a_channel(Kind::Slice)
  }
}

impl<K: Send, V: Send, S: Send> Candidate for HashMap<K, V, S> {
  fn inspect(self: Box<Self>) -> Inspection {
    Inspection::not_a_channel(Kind::Map)
  }
}

macro_rules! impl_tuple_not_a_channel {
  ($(($($name:ident),+)),+ $(,)?) => {
    $(
      impl<$($name: Send),+> Candidate for ($($name,)+) {
        fn inspect(self: Box<Self>) -> Inspection {
          Inspection::not_a_channel(Kind::Tuple)
        }
      }
    )+
  };
}

impl_tuple_not_a_channel!((A), (A, B), (A, B, C), (A, B, C, D));

/// Wraps an arbitrary value so it can be offered for registration.
///
/// It always inspects as [`Kind::Struct`]; this is the escape hatch for
/// registration paths that take values whose type is not known up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Opaque<T>(pub T);

impl<T: Send> Candidate for Opaque<T> {
  fn inspect(self: Box<Self>) -> Inspection {
    Inspection::not_a_channel(Kind::Struct)
  }
}

// --- Registry ---

/// A registered, type-erased input.
pub struct RegisteredStream {
  id: SourceId,
  type_name: &'static str,
  source: Box<dyn ErasedSource>,
}

impl RegisteredStream {
  fn new(id: SourceId, source: Box<dyn ErasedSource>) -> Self {
    Self {
      id,
      type_name: source.item_type_name(),
      source,
    }
  }

  /// The id that tags every value received from this input.
  pub fn id(&self) -> SourceId {
    self.id
  }

  /// The element type name of this input.
  pub fn type_name(&self) -> &'static str {
    self.type_name
  }

  #[inline]
  pub(crate) fn recv_value(&mut self) -> Option<Value> {
    self.source.recv_value(self.id)
  }
}

impl fmt::Debug for RegisteredStream {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RegisteredStream")
      .field("id", &self.id)
      .field("type_name", &self.type_name)
      .finish_non_exhaustive()
  }
}

/// The append-only list of inputs owned by a [`FanIn`](crate::FanIn).
#[derive(Debug, Default)]
pub(crate) struct Registry {
  streams: Vec<RegisteredStream>,
  // Inputs already handed over to a drain.
  taken: usize,
}

impl Registry {
  pub(crate) fn len(&self) -> usize {
    self.taken + self.streams.len()
  }

  pub(crate) fn streams(&self) -> &[RegisteredStream] {
    &self.streams
  }

  pub(crate) fn take(&mut self) -> Vec<RegisteredStream> {
    let streams = std::mem::take(&mut self.streams);
    self.taken += streams.len();
    streams
  }

  fn next_id(&self) -> SourceId {
    SourceId(self.len())
  }

  fn validate(
    op: &'static str,
    candidate: Box<dyn Candidate>,
  ) -> Result<Box<dyn ErasedSource>, RegisterError> {
    match candidate.inspect().0 {
      Class::Receivable(source) => Ok(source),
      Class::SendOnly => Err(RegisterError::NotReceivable { op }),
      Class::NotAChannel(kind) => Err(RegisterError::NotAChannel { op, kind }),
    }
  }

  /// Validates and appends one candidate.
  pub(crate) fn register(
    &mut self,
    op: &'static str,
    candidate: Box<dyn Candidate>,
  ) -> Result<SourceId, RegisterError> {
    let source = Self::validate(op, candidate)?;
    Ok(self.push(source))
  }

  /// Validates every candidate, then appends them all. On the first
  /// invalid candidate nothing is appended.
  pub(crate) fn register_all<I>(
    &mut self,
    op: &'static str,
    candidates: I,
  ) -> Result<Vec<SourceId>, RegisterError>
  where
    I: IntoIterator<Item = Box<dyn Candidate>>,
  {
    let sources = candidates
      .into_iter()
      .map(|candidate| Self::validate(op, candidate))
      .collect::<Result<Vec<_>, _>>()?;
    Ok(sources.into_iter().map(|source| self.push(source)).collect())
  }

  pub(crate) fn push(&mut self, source: Box<dyn ErasedSource>) -> SourceId {
    let id = self.next_id();
    self.streams.push(RegisteredStream::new(id, source));
    id
  }
}
