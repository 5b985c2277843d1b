use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Cooperative cancellation flag shared between a pass and its requester.
///
/// Cancellation is polled, not preemptive: the resolver checks between
/// definitions, the typechecker between (and inside) checked definitions.
/// Cloning shares the underlying flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
  flag: Arc<AtomicBool>,
}

impl CancelToken {
  pub fn new() -> Self {
    Self::default()
  }

  /// Request cancellation of ongoing work.
  pub fn cancel(&self) {
    self.flag.store(true, Ordering::Relaxed);
  }

  /// Clear a pending cancellation request so new work can proceed.
  pub fn clear(&self) {
    self.flag.store(false, Ordering::Relaxed);
  }

  pub fn is_cancelled(&self) -> bool {
    self.flag.load(Ordering::Relaxed)
  }
}
