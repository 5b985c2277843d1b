#![allow(dead_code)]

use diagnostics::Diagnostic;
use diagnostics::FileId;
use hir_ns::DefId;
use hir_ns::GroupId;
use hir_ns::NamespaceTree;
use hir_ns::TreeBuilder;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::mpsc;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;
use std::time::Instant;
use typecheck_ns::CancelToken;
use typecheck_ns::DepState;
use typecheck_ns::DesugaredDef;
use typecheck_ns::Kernel;
use typecheck_ns::KernelOutcome;

/// Three plain functions `a`, `slow`, `c` in the root group.
pub fn three_defs() -> (NamespaceTree, GroupId, DefId, DefId, DefId) {
  let mut b = TreeBuilder::new(FileId(0));
  let root = b.root();
  let a = b.function(root, "a");
  let slow = b.function(root, "slow");
  let c = b.function(root, "c");
  let tree = b.finish();
  (tree, root, a, slow, c)
}

/// `f` referencing `g`, plus an independent `h`.
pub fn dependent_defs() -> (NamespaceTree, GroupId, DefId, DefId, DefId) {
  let mut b = TreeBuilder::new(FileId(0));
  let root = b.root();
  let f = b.function(root, "f");
  b.body_ref(f, &["g"]);
  let g = b.function(root, "g");
  let h = b.function(root, "h");
  let tree = b.finish();
  (tree, root, f, g, h)
}

/// Kernel that spins (polling its token) for definitions with a given name
/// and accepts everything else immediately.
pub struct SlowKernel {
  pub slow_name: String,
}

impl Kernel for SlowKernel {
  fn typecheck(&self, def: &DesugaredDef, _deps: &DepState, cancel: &CancelToken) -> KernelOutcome {
    if def.name.last() == self.slow_name {
      let start = Instant::now();
      while !cancel.is_cancelled() && start.elapsed() < Duration::from_secs(10) {
        thread::sleep(Duration::from_millis(2));
      }
    }
    KernelOutcome::Ok
  }
}

/// Kernel that rejects definitions with a given name while the flag is set.
pub struct FlagKernel {
  pub fail_name: String,
  pub failing: AtomicBool,
}

impl FlagKernel {
  pub fn new(fail_name: &str) -> Self {
    FlagKernel {
      fail_name: fail_name.to_string(),
      failing: AtomicBool::new(true),
    }
  }

  pub fn relent(&self) {
    self.failing.store(false, Ordering::SeqCst);
  }
}

impl Kernel for FlagKernel {
  fn typecheck(&self, def: &DesugaredDef, _deps: &DepState, _cancel: &CancelToken) -> KernelOutcome {
    if self.failing.load(Ordering::SeqCst) && def.name.last() == self.fail_name {
      KernelOutcome::Errors(vec![Diagnostic::error(
        "TEST0001",
        format!("kernel rejected '{}'", def.name),
        def.span,
      )])
    } else {
      KernelOutcome::Ok
    }
  }
}

/// Kernel that announces each invocation on a channel, then blocks until its
/// token is cancelled.
pub struct BlockingKernel {
  started: Mutex<mpsc::Sender<DefId>>,
}

impl BlockingKernel {
  pub fn new() -> (Self, mpsc::Receiver<DefId>) {
    let (sender, receiver) = mpsc::channel();
    (
      BlockingKernel {
        started: Mutex::new(sender),
      },
      receiver,
    )
  }
}

impl Kernel for BlockingKernel {
  fn typecheck(&self, def: &DesugaredDef, _deps: &DepState, cancel: &CancelToken) -> KernelOutcome {
    let _ = self.started.lock().unwrap().send(def.def);
    let start = Instant::now();
    while !cancel.is_cancelled() && start.elapsed() < Duration::from_secs(10) {
      thread::sleep(Duration::from_millis(2));
    }
    KernelOutcome::Ok
  }
}

/// Kernel that panics on a given definition name.
pub struct PanicKernel {
  pub panic_name: String,
}

impl Kernel for PanicKernel {
  fn typecheck(&self, def: &DesugaredDef, _deps: &DepState, _cancel: &CancelToken) -> KernelOutcome {
    if def.name.last() == self.panic_name {
      panic!("kernel exploded on '{}'", def.name);
    }
    KernelOutcome::Ok
  }
}
