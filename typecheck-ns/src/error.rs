use std::error::Error;
use std::fmt;

/// Internal checker error: something that should never happen did. Carried as
/// data so it can be rendered as a diagnostic instead of tearing the process
/// down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ice {
  pub message: String,
  pub context: Vec<(String, String)>,
}

impl Ice {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
      context: Vec::new(),
    }
  }

  pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.context.push((key.into(), value.into()));
    self
  }

  /// Build an ICE from a caught panic payload.
  pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
    let message = if let Some(text) = payload.downcast_ref::<&str>() {
      (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
      text.clone()
    } else {
      "panic with non-string payload".to_string()
    };
    Ice::new(format!("kernel panicked: {message}"))
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FatalError {
  /// The cycle was cancelled. Not an error condition: prior cache state is
  /// intact and a fresh cycle is expected to follow.
  Cancelled,
  Ice(Ice),
}

impl From<Ice> for FatalError {
  fn from(value: Ice) -> Self {
    FatalError::Ice(value)
  }
}

impl fmt::Display for FatalError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      FatalError::Cancelled => write!(f, "analysis cancelled"),
      FatalError::Ice(ice) => write!(f, "internal error: {}", ice.message),
    }
  }
}

impl Error for FatalError {}
