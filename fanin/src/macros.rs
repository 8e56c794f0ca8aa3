//! Public macros for registering heterogeneous batches.

/// Registers several inputs of possibly different types in one call.
///
/// Expands to [`FanIn::register_all`](crate::FanIn::register_all), so the
/// batch is all or nothing: if any candidate is rejected, none of them is
/// registered.
///
/// # Examples
///
/// ```
/// use fibre_fanin::{handoff, register, FanIn, RegisterError};
/// use std::sync::mpsc;
///
/// let mut fan_in = FanIn::new();
/// let (_ints_tx, ints) = handoff::channel::<i32>();
/// let (_words_tx, words) = mpsc::channel::<String>();
/// let ids = register!(fan_in, ints, words).unwrap();
/// assert_eq!(ids.len(), 2);
///
/// let (_tx, rx) = handoff::channel::<u8>();
/// let err = register!(fan_in, rx, "foo").unwrap_err();
/// assert!(matches!(err, RegisterError::NotAChannel { .. }));
/// assert_eq!(fan_in.len(), 2);
/// ```
#[macro_export]
macro_rules! register {
  ($fan_in:expr $(, $candidate:expr)* $(,)?) => {
    $fan_in.register_all(::std::vec![
      $(::std::boxed::Box::new($candidate) as ::std::boxed::Box<dyn $crate::Candidate>),*
    ])
  };
}
