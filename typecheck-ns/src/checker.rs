//! Budgeted execution of the typechecking kernel.
//!
//! The kernel runs on a worker thread while the coordinator waits on a
//! channel, polling the cycle's cancellation token. Three exits:
//!
//! - the kernel finishes within the budget: its outcome is returned;
//! - the wall clock exceeds the per-definition budget: the worker's token is
//!   cancelled, the definition is blacklisted, and `TimedOut` is returned as
//!   a result, not an abort;
//! - the cycle itself is cancelled: the worker's token is cancelled and
//!   [`FatalError::Cancelled`] propagates, leaving no state change behind.
//!
//! A worker that ignores its token (a truly stuck kernel) is disowned; its
//! result channel is dropped, so a late answer goes nowhere.

use crate::blacklist::Blacklist;
use crate::desugar::DesugaredDef;
use crate::error::FatalError;
use crate::error::Ice;
use crate::kernel::DepState;
use crate::kernel::Kernel;
use crate::kernel::KernelOutcome;
use diagnostics::Diagnostic;
use resolve_ns::CancelToken;
use std::panic;
use std::panic::AssertUnwindSafe;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use std::time::Instant;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
  Ok,
  Errors(Vec<Diagnostic>),
  TimedOut,
}

pub struct BackgroundTypechecker {
  kernel: Arc<dyn Kernel>,
  blacklist: Arc<Blacklist>,
  budget: Duration,
}

impl BackgroundTypechecker {
  pub fn new(kernel: Arc<dyn Kernel>, blacklist: Arc<Blacklist>, budget: Duration) -> Self {
    BackgroundTypechecker {
      kernel,
      blacklist,
      budget,
    }
  }

  /// Check one definition under the wall-clock budget. `cancel` is the
  /// cycle's token; the worker gets a derived token that is cancelled on
  /// either timeout or cycle cancellation.
  pub fn check_definition(
    &self,
    def: Arc<DesugaredDef>,
    deps: Arc<DepState>,
    cancel: &CancelToken,
  ) -> Result<CheckOutcome, FatalError> {
    let def_id = def.def;
    let worker_cancel = CancelToken::new();
    let (sender, receiver) = mpsc::channel();
    let kernel = Arc::clone(&self.kernel);
    let worker_token = worker_cancel.clone();
    let spawned = thread::Builder::new()
      .name(format!("typecheck {}", def.name))
      .spawn(move || {
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
          kernel.typecheck(&def, &deps, &worker_token)
        }));
        let _ = sender.send(result);
      });
    if spawned.is_err() {
      return Ok(CheckOutcome::Errors(vec![ice_diagnostic(Ice::new(
        "failed to spawn typechecking worker",
      ))]));
    }

    let deadline = Instant::now() + self.budget;
    loop {
      if cancel.is_cancelled() {
        worker_cancel.cancel();
        return Err(FatalError::Cancelled);
      }
      let now = Instant::now();
      if now >= deadline {
        worker_cancel.cancel();
        self.blacklist.record_timeout(def_id);
        return Ok(CheckOutcome::TimedOut);
      }
      let wait = (deadline - now).min(POLL_INTERVAL);
      match receiver.recv_timeout(wait) {
        Ok(Ok(KernelOutcome::Ok)) => return Ok(CheckOutcome::Ok),
        Ok(Ok(KernelOutcome::Errors(diagnostics))) => {
          return Ok(CheckOutcome::Errors(diagnostics))
        }
        Ok(Err(payload)) => {
          return Ok(CheckOutcome::Errors(vec![ice_diagnostic(Ice::from_panic(
            payload,
          ))]))
        }
        Err(mpsc::RecvTimeoutError::Timeout) => continue,
        Err(mpsc::RecvTimeoutError::Disconnected) => {
          return Ok(CheckOutcome::Errors(vec![ice_diagnostic(Ice::new(
            "typechecking worker exited without a result",
          ))]))
        }
      }
    }
  }
}

fn ice_diagnostic(ice: Ice) -> Diagnostic {
  let mut diagnostic = Diagnostic::error(
    "ICE0001",
    format!("internal error: {}", ice.message),
    diagnostics::Span::new(diagnostics::FileId(0), diagnostics::TextRange::new(0, 0)),
  );
  for (key, value) in ice.context {
    diagnostic = diagnostic.with_note(format!("context {key} = {value}"));
  }
  diagnostic
}
