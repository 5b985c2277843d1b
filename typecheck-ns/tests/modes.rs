mod common;

use diagnostics::FileId;
use hir_ns::CheckStatus;
use hir_ns::Clause;
use hir_ns::Pattern;
use hir_ns::Term;
use hir_ns::TreeBuilder;
use resolve_ns::NullListener;
use std::time::Duration;
use typecheck_ns::CheckEvent;
use typecheck_ns::CheckerConfig;
use typecheck_ns::Session;
use typecheck_ns::TypecheckingMode;

fn config(mode: TypecheckingMode) -> CheckerConfig {
  CheckerConfig {
    mode,
    time_budget: Duration::from_secs(30),
    auto_retry: true,
  }
}

#[test]
fn off_mode_resolves_but_checks_nothing() {
  let mut b = TreeBuilder::new(FileId(0));
  let root = b.root();
  let f = b.function(root, "f");
  let occ = b.body_ref(f, &["missing"]);
  let mut tree = b.finish();

  let session = Session::new(config(TypecheckingMode::Off));
  let report = session.analyze(&mut tree, root, &mut NullListener);

  // Resolution ran: the bad reference is diagnosed and cached.
  assert!(report.diagnostics.iter().any(|d| d.code == "RES0001"));
  assert!(session.cache().lookup(occ).is_some());
  // But nothing was checked, dumb or full.
  assert!(report.check_events.is_empty());
  assert_eq!(report.progress, 0);
  assert_eq!(tree.def(f).unwrap().check_status, CheckStatus::NotChecked);
}

#[test]
fn dumb_mode_runs_structural_checks_only() {
  // A constructor pattern with the wrong arity: exactly what the structural
  // pass catches without any dependency state.
  let mut b = TreeBuilder::new(FileId(0));
  let root = b.root();
  let nat = b.data(root, "Nat");
  let _zero = b.constructor(nat, "zero");
  let suc = b.constructor(nat, "suc");
  b.param(suc, "n");
  let f = b.function(root, "f");
  b.param(f, "x");
  let scrut = b.reference(f, &["x"]);
  let bad_pat = b.reference(f, &["suc"]);
  b.set_body(f, Term::Match {
    scrutinees: vec![Term::Ref(scrut)],
    clauses: vec![Clause {
      // `suc` takes one argument; none given.
      patterns: vec![Pattern::Ctor { occ: bad_pat, args: vec![] }],
      body: Some(Term::Universe(0)),
    }],
  });
  let mut tree = b.finish();

  let session = Session::new(config(TypecheckingMode::Dumb));
  let report = session.analyze(&mut tree, root, &mut NullListener);

  assert!(report.diagnostics.iter().any(|d| d.code == "CHK1003"));
  assert!(report
    .check_events
    .iter()
    .any(|event| matches!(event, CheckEvent::DumbChecked { def } if *def == f)));
  assert!(!report
    .check_events
    .iter()
    .any(|event| matches!(event, CheckEvent::DefinitionChecked { .. })));
  // Structural checks never verify a definition.
  assert_eq!(tree.def(f).unwrap().check_status, CheckStatus::NotChecked);
}

#[test]
fn smart_mode_verifies_definitions() {
  let (mut tree, root, f, g, h) = common::dependent_defs();
  let session = Session::new(config(TypecheckingMode::Smart));
  let report = session.analyze(&mut tree, root, &mut NullListener);

  assert!(report.diagnostics.is_empty());
  for def in [f, g, h] {
    assert_eq!(tree.def(def).unwrap().check_status, CheckStatus::Ok);
  }
  assert!(report
    .check_events
    .iter()
    .any(|event| matches!(event, CheckEvent::ResultsReady { .. })));
  // Dependency order: g (a dependency of f) is fully checked before f.
  let order: Vec<_> = report
    .check_events
    .iter()
    .filter_map(|event| match event {
      CheckEvent::DefinitionChecked { def, .. } => Some(*def),
      _ => None,
    })
    .collect();
  let g_pos = order.iter().position(|d| *d == g).unwrap();
  let f_pos = order.iter().position(|d| *d == f).unwrap();
  assert!(g_pos < f_pos);
}
