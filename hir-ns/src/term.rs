//! Surface terms as produced by parsing, before desugaring.
//!
//! Terms reference names only through [`OccId`]s, so the resolver and the
//! reference cache stay the single source of truth for what a name means.
//! Terms never store resolution results.

use crate::ids::OccId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
  /// A (possibly qualified, possibly operator) reference occurrence.
  Ref(OccId),
  App {
    head: Box<Term>,
    args: Vec<Term>,
  },
  Lam {
    params: Vec<String>,
    body: Box<Term>,
  },
  Let {
    name: String,
    value: Box<Term>,
    body: Box<Term>,
  },
  /// Pattern-matching sugar; desugared into a case tree before checking.
  Match {
    scrutinees: Vec<Term>,
    clauses: Vec<Clause>,
  },
  /// Class-extension sugar (`C { | f => e }`); desugared into explicit field
  /// implementations before checking.
  ClassExt {
    base: Box<Term>,
    fields: Vec<FieldImpl>,
  },
  New(Box<Term>),
  Universe(u32),
  Hole,
}

impl Term {
  pub fn app(head: Term, args: Vec<Term>) -> Term {
    Term::App {
      head: Box::new(head),
      args,
    }
  }

  /// All occurrences in this term, in left-to-right source order.
  pub fn collect_occurrences(&self, out: &mut Vec<OccId>) {
    match self {
      Term::Ref(occ) => out.push(*occ),
      Term::App { head, args } => {
        head.collect_occurrences(out);
        for arg in args {
          arg.collect_occurrences(out);
        }
      }
      Term::Lam { body, .. } => body.collect_occurrences(out),
      Term::Let { value, body, .. } => {
        value.collect_occurrences(out);
        body.collect_occurrences(out);
      }
      Term::Match {
        scrutinees,
        clauses,
      } => {
        for scrutinee in scrutinees {
          scrutinee.collect_occurrences(out);
        }
        for clause in clauses {
          for pattern in &clause.patterns {
            pattern.collect_occurrences(out);
          }
          if let Some(body) = &clause.body {
            body.collect_occurrences(out);
          }
        }
      }
      Term::ClassExt { base, fields } => {
        base.collect_occurrences(out);
        for field in fields {
          out.push(field.occ);
          field.value.collect_occurrences(out);
        }
      }
      Term::New(inner) => inner.collect_occurrences(out),
      Term::Universe(_) | Term::Hole => {}
    }
  }
}

/// One clause of a pattern match. A clause without a body is absurd: its
/// patterns are expected to be impossible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
  pub patterns: Vec<Pattern>,
  pub body: Option<Term>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
  /// Binds a fresh local variable.
  Var(String),
  /// A constructor pattern; the occurrence names the constructor.
  Ctor { occ: OccId, args: Vec<Pattern> },
  Tuple(Vec<Pattern>),
}

impl Pattern {
  pub fn collect_occurrences(&self, out: &mut Vec<OccId>) {
    match self {
      Pattern::Var(_) => {}
      Pattern::Ctor { occ, args } => {
        out.push(*occ);
        for arg in args {
          arg.collect_occurrences(out);
        }
      }
      Pattern::Tuple(elems) => {
        for elem in elems {
          elem.collect_occurrences(out);
        }
      }
    }
  }

  /// Names bound by this pattern, in source order.
  pub fn collect_bindings(&self, out: &mut Vec<String>) {
    match self {
      Pattern::Var(name) => out.push(name.clone()),
      Pattern::Ctor { args, .. } => {
        for arg in args {
          arg.collect_bindings(out);
        }
      }
      Pattern::Tuple(elems) => {
        for elem in elems {
          elem.collect_bindings(out);
        }
      }
    }
  }
}

/// A co-pattern implementation of a class field, either inside an instance
/// definition or a class-extension expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldImpl {
  /// Reference to the implemented field.
  pub occ: OccId,
  pub value: Term,
}
