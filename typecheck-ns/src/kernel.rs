//! The typechecking kernel seam.
//!
//! The kernel is opaque to the orchestrator: a possibly-long-running,
//! cancellable judgment over one desugared definition plus a snapshot of its
//! already-checked dependencies. Implementations must poll the supplied
//! [`CancelToken`] at bounded intervals; the built-in [`StructuralKernel`]
//! polls once per case branch.

use crate::desugar::CoreTerm;
use crate::desugar::DesugaredDef;
use ahash::HashMap;
use diagnostics::Diagnostic;
use hir_ns::DefId;
use hir_ns::DefKind;
use resolve_ns::CancelToken;
use resolve_ns::ResolvedTarget;
use std::collections::BTreeSet;

pub(crate) const CODE_UNRESOLVED_REFERENCE: &str = "CHK2001";
pub(crate) const CODE_CONSTRUCTOR_ARITY: &str = "CHK2002";

/// Snapshot of the dependency state a definition is checked against.
#[derive(Debug, Clone, Default)]
pub struct DepState {
  /// Definitions whose last full check succeeded.
  pub verified: BTreeSet<DefId>,
  pub param_counts: HashMap<DefId, usize>,
  pub kinds: HashMap<DefId, DefKind>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelOutcome {
  Ok,
  Errors(Vec<Diagnostic>),
}

/// A cancellable typechecking judgment over a single definition.
pub trait Kernel: Send + Sync + 'static {
  fn typecheck(&self, def: &DesugaredDef, deps: &DepState, cancel: &CancelToken) -> KernelOutcome;
}

/// Default kernel: rejects definitions with unresolved references or
/// mis-applied constructors. Deliberately shallow; the seam exists so a real
/// type theory can be plugged in.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuralKernel;

impl Kernel for StructuralKernel {
  fn typecheck(&self, def: &DesugaredDef, deps: &DepState, cancel: &CancelToken) -> KernelOutcome {
    let mut diagnostics = Vec::new();
    if let Some(term) = &def.result_type {
      check_term(term, deps, cancel, &mut diagnostics);
    }
    if let Some(term) = &def.term {
      check_term(term, deps, cancel, &mut diagnostics);
    }
    if diagnostics.is_empty() {
      KernelOutcome::Ok
    } else {
      KernelOutcome::Errors(diagnostics)
    }
  }
}

fn check_term(
  term: &CoreTerm,
  deps: &DepState,
  cancel: &CancelToken,
  diagnostics: &mut Vec<Diagnostic>,
) {
  match term {
    CoreTerm::Ref(reference) => {
      if reference.target == ResolvedTarget::Error {
        diagnostics.push(Diagnostic::error(
          CODE_UNRESOLVED_REFERENCE,
          "definition refers to an unresolved name",
          reference.span,
        ));
      }
    }
    CoreTerm::App { head, args } => {
      check_term(head, deps, cancel, diagnostics);
      for arg in args {
        check_term(arg, deps, cancel, diagnostics);
      }
      if let CoreTerm::Ref(reference) = head.as_ref() {
        if let Some(def) = reference.target.def() {
          let is_ctor = deps.kinds.get(&def) == Some(&DefKind::Constructor);
          let arity = deps.param_counts.get(&def).copied().unwrap_or(0);
          if is_ctor && args.len() > arity {
            diagnostics.push(Diagnostic::error(
              CODE_CONSTRUCTOR_ARITY,
              format!(
                "constructor expects {} argument(s) but got {}",
                arity,
                args.len()
              ),
              reference.span,
            ));
          }
        }
      }
    }
    CoreTerm::Lam { body, .. } => check_term(body, deps, cancel, diagnostics),
    CoreTerm::Case {
      scrutinees,
      branches,
    } => {
      for scrutinee in scrutinees {
        check_term(scrutinee, deps, cancel, diagnostics);
      }
      for branch in branches {
        if cancel.is_cancelled() {
          return;
        }
        if let Some(body) = &branch.body {
          check_term(body, deps, cancel, diagnostics);
        }
      }
    }
    CoreTerm::Extend { base, fields } | CoreTerm::NewInstance { base, fields } => {
      check_term(base, deps, cancel, diagnostics);
      for field in fields {
        if field.field.target == ResolvedTarget::Error {
          diagnostics.push(Diagnostic::error(
            CODE_UNRESOLVED_REFERENCE,
            "field implementation refers to an unresolved name",
            field.field.span,
          ));
        }
        check_term(&field.value, deps, cancel, diagnostics);
      }
    }
    CoreTerm::Universe(_) | CoreTerm::Hole => {}
  }
}
