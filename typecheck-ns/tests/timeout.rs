mod common;

use common::SlowKernel;
use hir_ns::CheckStatus;
use resolve_ns::NullListener;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;
use typecheck_ns::CheckEvent;
use typecheck_ns::CheckerConfig;
use typecheck_ns::Session;
use typecheck_ns::TypecheckingMode;

fn config() -> CheckerConfig {
  CheckerConfig {
    mode: TypecheckingMode::Smart,
    time_budget: Duration::from_millis(50),
    auto_retry: true,
  }
}

#[test]
fn timeout_blacklists_warns_and_continues() {
  let (mut tree, root, a, slow, c) = common::three_defs();
  let session = Session::with_kernel(
    config(),
    Arc::new(SlowKernel {
      slow_name: "slow".into(),
    }),
  );

  let started = Instant::now();
  let report = session.analyze(&mut tree, root, &mut NullListener);
  assert!(
    started.elapsed() < Duration::from_secs(5),
    "a nonterminating definition must not hang the cycle"
  );

  // The offender is blacklisted and warned about by qualified name.
  assert!(session.blacklist().is_blacklisted(slow));
  assert!(report
    .diagnostics
    .iter()
    .any(|diag| diag.code == "CHK0001" && diag.message.contains("slow")));
  assert!(report
    .check_events
    .iter()
    .any(|event| matches!(event, CheckEvent::TimedOut { def, .. } if *def == slow)));

  // `slow` was not the last definition, so the pass was rescheduled and the
  // automatic retry completed the rest.
  assert!(report.restarts >= 1);
  assert!(report
    .check_events
    .iter()
    .any(|event| matches!(event, CheckEvent::Rescheduled { .. })));
  assert_eq!(tree.def(a).unwrap().check_status, CheckStatus::Ok);
  assert_eq!(tree.def(c).unwrap().check_status, CheckStatus::Ok);
  assert_eq!(tree.def(slow).unwrap().check_status, CheckStatus::TimedOut);
}

#[test]
fn blacklisted_definition_is_skipped_until_cleared() {
  let (mut tree, root, _a, slow, _c) = common::three_defs();
  let session = Session::with_kernel(
    config(),
    Arc::new(SlowKernel {
      slow_name: "slow".into(),
    }),
  );

  let first = session.analyze(&mut tree, root, &mut NullListener);
  assert!(session.blacklist().is_blacklisted(slow));
  assert!(first
    .diagnostics
    .iter()
    .any(|diag| diag.code == "CHK0001"));

  // Second cycle without edits: no full check of `slow`, structural results
  // only, and no repeated warning.
  let second = session.analyze(&mut tree, root, &mut NullListener);
  assert!(!second
    .check_events
    .iter()
    .any(|event| matches!(event, CheckEvent::TimedOut { def, .. } if *def == slow)));
  assert!(second
    .check_events
    .iter()
    .any(|event| matches!(event, CheckEvent::DumbChecked { def } if *def == slow)));
  assert!(!second.diagnostics.iter().any(|diag| diag.code == "CHK0001"));

  // An explicit clear makes the definition eligible again; it times out
  // again and the failure count grows.
  session.blacklist().clear(slow);
  let third = session.analyze(&mut tree, root, &mut NullListener);
  assert!(third.diagnostics.iter().any(|diag| diag.code == "CHK0001"));
  assert_eq!(session.blacklist().entry(slow).unwrap().failures, 2);
}

#[test]
fn timeout_of_the_last_definition_does_not_reschedule() {
  let (mut tree, root, _a, slow, c) = common::three_defs();
  // Make `slow` the last candidate by verifying nothing else... the batch is
  // in declaration order, so use a kernel that is slow on `c` instead.
  let session = Session::with_kernel(
    config(),
    Arc::new(SlowKernel {
      slow_name: "c".into(),
    }),
  );
  let _ = slow;

  let report = session.analyze(&mut tree, root, &mut NullListener);
  assert!(session.blacklist().is_blacklisted(c));
  assert_eq!(report.restarts, 0);
  assert!(!report
    .check_events
    .iter()
    .any(|event| matches!(event, CheckEvent::Rescheduled { .. })));
}

#[test]
fn without_auto_retry_the_reschedule_is_only_reported() {
  let (mut tree, root, a, slow, c) = common::three_defs();
  let session = Session::with_kernel(
    CheckerConfig {
      auto_retry: false,
      ..config()
    },
    Arc::new(SlowKernel {
      slow_name: "slow".into(),
    }),
  );

  let report = session.analyze(&mut tree, root, &mut NullListener);
  assert_eq!(report.restarts, 0);
  assert!(report
    .check_events
    .iter()
    .any(|event| matches!(event, CheckEvent::Rescheduled { .. })));
  // The batch still ran to completion in declaration order.
  assert_eq!(tree.def(a).unwrap().check_status, CheckStatus::Ok);
  assert_eq!(tree.def(c).unwrap().check_status, CheckStatus::Ok);
  assert_eq!(tree.def(slow).unwrap().check_status, CheckStatus::TimedOut);
}
