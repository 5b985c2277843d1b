mod common;

use common::BlockingKernel;
use diagnostics::FileId;
use hir_ns::CheckStatus;
use hir_ns::TreeBuilder;
use resolve_ns::NullListener;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use std::time::Instant;
use typecheck_ns::CheckerConfig;
use typecheck_ns::Session;
use typecheck_ns::TypecheckingMode;

fn patient_config() -> CheckerConfig {
  CheckerConfig {
    mode: TypecheckingMode::Smart,
    time_budget: Duration::from_secs(30),
    auto_retry: true,
  }
}

#[test]
fn cancel_returns_quickly_and_does_not_poison_later_cycles() {
  let (kernel, invocations) = BlockingKernel::new();
  let session = Arc::new(Session::with_kernel(patient_config(), Arc::new(kernel)));
  let (mut tree, root, a, slow, _c) = common::three_defs();

  let runner = Arc::clone(&session);
  let (done_tx, done_rx) = mpsc::channel();
  let handle = thread::spawn(move || {
    let report = runner.analyze(&mut tree, root, &mut NullListener);
    let _ = done_tx.send(());
    (tree, report)
  });

  // Wait until the first definition is actually inside the kernel.
  let first = invocations
    .recv_timeout(Duration::from_secs(5))
    .expect("kernel should be invoked");
  assert_eq!(first, a);

  let cancelled_at = Instant::now();
  session.cancel_group(root);
  done_rx
    .recv_timeout(Duration::from_secs(5))
    .expect("analysis should observe cancellation");
  assert!(
    cancelled_at.elapsed() < Duration::from_secs(2),
    "cancellation should complete promptly"
  );

  let (tree, report) = handle.join().unwrap();
  assert!(report.cancelled);
  // The in-flight definition was not committed.
  assert_eq!(tree.def(a).unwrap().check_status, CheckStatus::NotChecked);
  assert_eq!(tree.def(slow).unwrap().check_status, CheckStatus::NotChecked);
  assert!(
    session.blacklist().is_empty(),
    "cancellation is not a timeout"
  );
}

#[test]
fn new_cycle_for_the_same_subtree_supersedes_the_old_one() {
  let (kernel, invocations) = BlockingKernel::new();
  let session = Arc::new(Session::with_kernel(patient_config(), Arc::new(kernel)));
  let (mut busy_tree, busy_root, _a, _slow, _c) = common::three_defs();

  let runner = Arc::clone(&session);
  let handle = thread::spawn(move || runner.analyze(&mut busy_tree, busy_root, &mut NullListener));

  invocations
    .recv_timeout(Duration::from_secs(5))
    .expect("first cycle should reach the kernel");

  // An empty tree with the same root group id: the new request supersedes
  // the in-flight pass instead of queueing behind it.
  let mut fresh_tree = TreeBuilder::new(FileId(0)).finish();
  let fresh_report = session.analyze(&mut fresh_tree, busy_root, &mut NullListener);
  assert!(!fresh_report.cancelled);

  let old_report = handle.join().unwrap();
  assert!(old_report.cancelled, "the superseded pass must abort");
}
