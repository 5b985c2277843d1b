//! The structural ("dumb") checker.
//!
//! A fast, unsound validity pass over a desugared definition that needs no
//! dependency checking results: arity of constructor patterns, duplicate
//! parameter names, clause shapes. Used for definitions whose dependencies
//! are not yet known-good, for blacklisted definitions, and as the entire
//! strategy in dumb mode. Idempotent and side-effect-free beyond the
//! returned diagnostics.

use crate::desugar::CoreBranch;
use crate::desugar::CoreTerm;
use crate::desugar::DesugaredDef;
use diagnostics::Diagnostic;
use diagnostics::Span;
use hir_ns::NamespaceTree;
use hir_ns::Pattern;
use itertools::Itertools;
use resolve_ns::ResolveCache;

pub(crate) const CODE_DUPLICATE_PARAM: &str = "CHK1001";
pub(crate) const CODE_CLAUSE_WIDTH: &str = "CHK1002";
pub(crate) const CODE_PATTERN_ARITY: &str = "CHK1003";

/// The cache is consulted read-only for constructor arities; the dumb
/// checker never writes to it.
pub fn dumb_check(
  tree: &NamespaceTree,
  cache: &ResolveCache,
  def: &DesugaredDef,
) -> Vec<Diagnostic> {
  let mut diagnostics = Vec::new();

  for name in def
    .params
    .iter()
    .map(|param| param.name.as_str())
    .duplicates()
  {
    let range = def
      .params
      .iter()
      .rev()
      .find(|param| param.name == name)
      .map(|param| param.range)
      .unwrap_or(def.span.range);
    diagnostics.push(Diagnostic::error(
      CODE_DUPLICATE_PARAM,
      format!("duplicate parameter '{}'", name),
      Span::new(def.span.file, range),
    ));
  }

  if let Some(term) = &def.result_type {
    check_term(tree, cache, def, term, &mut diagnostics);
  }
  if let Some(term) = &def.term {
    check_term(tree, cache, def, term, &mut diagnostics);
  }

  diagnostics
}

fn check_term(
  tree: &NamespaceTree,
  cache: &ResolveCache,
  def: &DesugaredDef,
  term: &CoreTerm,
  diagnostics: &mut Vec<Diagnostic>,
) {
  match term {
    CoreTerm::Ref(_) | CoreTerm::Universe(_) | CoreTerm::Hole => {}
    CoreTerm::App { head, args } => {
      check_term(tree, cache, def, head, diagnostics);
      for arg in args {
        check_term(tree, cache, def, arg, diagnostics);
      }
    }
    CoreTerm::Lam { body, .. } => check_term(tree, cache, def, body, diagnostics),
    CoreTerm::Case {
      scrutinees,
      branches,
    } => {
      for scrutinee in scrutinees {
        check_term(tree, cache, def, scrutinee, diagnostics);
      }
      for branch in branches {
        check_branch(tree, cache, def, scrutinees.len(), branch, diagnostics);
      }
    }
    CoreTerm::Extend { base, fields } | CoreTerm::NewInstance { base, fields } => {
      check_term(tree, cache, def, base, diagnostics);
      for field in fields {
        check_term(tree, cache, def, &field.value, diagnostics);
      }
    }
  }
}

fn check_branch(
  tree: &NamespaceTree,
  cache: &ResolveCache,
  def: &DesugaredDef,
  scrutinee_count: usize,
  branch: &CoreBranch,
  diagnostics: &mut Vec<Diagnostic>,
) {
  if branch.patterns.len() != scrutinee_count {
    diagnostics.push(Diagnostic::error(
      CODE_CLAUSE_WIDTH,
      format!(
        "clause has {} pattern(s) but matches {} value(s)",
        branch.patterns.len(),
        scrutinee_count
      ),
      def.span,
    ));
  }
  for pattern in &branch.patterns {
    check_pattern(tree, cache, pattern, diagnostics);
  }
  if let Some(body) = &branch.body {
    check_term(tree, cache, def, body, diagnostics);
  }
}

fn check_pattern(
  tree: &NamespaceTree,
  cache: &ResolveCache,
  pattern: &Pattern,
  diagnostics: &mut Vec<Diagnostic>,
) {
  match pattern {
    Pattern::Var(_) => {}
    Pattern::Ctor { occ, args } => {
      // Arity against the constructor the occurrence currently names. An
      // unresolved constructor is the resolver's diagnostic, not ours.
      if let Some(data) = tree.occ(*occ) {
        let ctor = cache.lookup(*occ).and_then(|target| target.def());
        if let Some(ctor_def) = ctor.and_then(|ctor| tree.def(ctor)) {
          if ctor_def.params.len() != args.len() {
            diagnostics.push(Diagnostic::error(
              CODE_PATTERN_ARITY,
              format!(
                "constructor '{}' expects {} argument(s) in a pattern but got {}",
                ctor_def.name,
                ctor_def.params.len(),
                args.len()
              ),
              data.span,
            ));
          }
        }
      }
      for arg in args {
        check_pattern(tree, cache, arg, diagnostics);
      }
    }
    Pattern::Tuple(elems) => {
      for elem in elems {
        check_pattern(tree, cache, elem, diagnostics);
      }
    }
  }
}
