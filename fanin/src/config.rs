use crate::fanin::FanIn;

/// Default prefix for the names of pump and watcher threads.
pub const DEFAULT_THREAD_NAME: &str = "fibre-fanin";

/// The configuration a [`FanIn`] drains with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanInConfig {
  pub(crate) thread_name: String,
  pub(crate) stack_size: Option<usize>,
}

impl FanInConfig {
  /// Prefix of the pump and watcher thread names.
  ///
  /// Pumps are named `<prefix>-pump-<index>`, the watcher
  /// `<prefix>-watcher`.
  pub fn thread_name(&self) -> &str {
    &self.thread_name
  }

  /// Stack size of pump threads, if set. `None` uses the platform default.
  pub fn stack_size(&self) -> Option<usize> {
    self.stack_size
  }

  pub(crate) fn pump_thread_name(&self, index: usize) -> String {
    format!("{}-pump-{}", self.thread_name, index)
  }

  pub(crate) fn watcher_thread_name(&self) -> String {
    format!("{}-watcher", self.thread_name)
  }
}

impl Default for FanInConfig {
  fn default() -> Self {
    Self {
      thread_name: DEFAULT_THREAD_NAME.to_string(),
      stack_size: None,
    }
  }
}

/// A builder for [`FanIn`] coordinators.
///
/// ```
/// use fibre_fanin::FanIn;
///
/// let fan_in = FanIn::builder()
///   .thread_name("ingest")
///   .stack_size(256 * 1024)
///   .build();
/// assert_eq!(fan_in.config().thread_name(), "ingest");
/// ```
#[derive(Debug, Clone, Default)]
pub struct FanInBuilder {
  thread_name: Option<String>,
  stack_size: Option<usize>,
}

impl FanInBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Sets the prefix used to name pump and watcher threads.
  pub fn thread_name(mut self, prefix: impl Into<String>) -> Self {
    self.thread_name = Some(prefix.into());
    self
  }

  /// Sets the stack size, in bytes, of each pump thread.
  pub fn stack_size(mut self, bytes: usize) -> Self {
    self.stack_size = Some(bytes);
    self
  }

  /// Builds the configuration without creating a coordinator.
  pub fn build_config(self) -> FanInConfig {
    let defaults = FanInConfig::default();
    FanInConfig {
      thread_name: self.thread_name.unwrap_or(defaults.thread_name),
      stack_size: self.stack_size.or(defaults.stack_size),
    }
  }

  /// Builds an empty [`FanIn`] with this configuration.
  pub fn build(self) -> FanIn {
    FanIn::with_config(self.build_config())
  }
}
