//! Desugaring of resolved surface terms into the canonical checked form.
//!
//! Runs immediately before both dumb and full checking, so the output embeds
//! the *current* resolution of every occurrence. Desugaring is pure and
//! cheap; it performs three rewrites:
//!
//! - `\let x => v \in b` becomes an application of a lambda,
//! - pattern-matching sugar becomes an explicit case tree,
//! - class-extension sugar (and `\new` around it) becomes explicit field
//!   implementations.

use crate::kernel::DepState;
use diagnostics::Span;
use diagnostics::TextRange;
use hir_ns::CheckStatus;
use hir_ns::Clause;
use hir_ns::DefId;
use hir_ns::DefKind;
use hir_ns::NamespaceTree;
use hir_ns::OccId;
use hir_ns::Pattern;
use hir_ns::QualifiedName;
use hir_ns::Term;
use resolve_ns::ResolveCache;
use resolve_ns::ResolvedTarget;

/// A reference with its resolution as of desugaring time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreRef {
  pub occ: OccId,
  pub target: ResolvedTarget,
  pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreTerm {
  Ref(CoreRef),
  App {
    head: Box<CoreTerm>,
    args: Vec<CoreTerm>,
  },
  Lam {
    params: Vec<String>,
    body: Box<CoreTerm>,
  },
  Case {
    scrutinees: Vec<CoreTerm>,
    branches: Vec<CoreBranch>,
  },
  /// Explicit field implementations over a class, from class-extension
  /// sugar.
  Extend {
    base: Box<CoreTerm>,
    fields: Vec<CoreField>,
  },
  NewInstance {
    base: Box<CoreTerm>,
    fields: Vec<CoreField>,
  },
  Universe(u32),
  Hole,
}

/// A case branch. `body` is `None` for absurd clauses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreBranch {
  pub patterns: Vec<Pattern>,
  pub body: Option<CoreTerm>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreField {
  pub field: CoreRef,
  pub value: CoreTerm,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreParam {
  pub name: String,
  pub range: TextRange,
}

/// A definition in checkable form, self-contained: carries everything the
/// kernel needs so checking can run off-thread without touching the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesugaredDef {
  pub def: DefId,
  pub name: QualifiedName,
  pub kind: DefKind,
  pub span: Span,
  pub params: Vec<CoreParam>,
  pub result_type: Option<CoreTerm>,
  pub term: Option<CoreTerm>,
}

/// Desugar one definition against the current resolution state. Returns
/// `None` for definitions that no longer exist.
pub fn desugar(tree: &NamespaceTree, cache: &ResolveCache, def: DefId) -> Option<DesugaredDef> {
  let data = tree.def(def)?;
  let ctx = DesugarCtx { tree, cache };
  Some(DesugaredDef {
    def,
    name: tree.qualified_name(def),
    kind: data.kind,
    span: data.span,
    params: data
      .params
      .iter()
      .map(|param| CoreParam {
        name: param.name.clone(),
        range: param.name_range,
      })
      .collect(),
    result_type: data.result_type.as_ref().map(|term| ctx.term(term)),
    term: data.term.as_ref().map(|term| ctx.term(term)),
  })
}

/// Snapshot of dependency information for off-thread checking.
pub fn dep_state(tree: &NamespaceTree) -> DepState {
  let mut state = DepState::default();
  for def in tree.all_defs() {
    if def.check_status == CheckStatus::Ok {
      state.verified.insert(def.id);
    }
    state.param_counts.insert(def.id, def.params.len());
    state.kinds.insert(def.id, def.kind);
  }
  state
}

struct DesugarCtx<'t> {
  tree: &'t NamespaceTree,
  cache: &'t ResolveCache,
}

impl<'t> DesugarCtx<'t> {
  fn reference(&self, occ: OccId) -> CoreRef {
    let span = self
      .tree
      .occ(occ)
      .map(|o| o.span)
      .unwrap_or(Span::new(diagnostics::FileId(0), TextRange::new(0, 0)));
    CoreRef {
      occ,
      target: self.cache.lookup(occ).unwrap_or(ResolvedTarget::Error),
      span,
    }
  }

  fn term(&self, term: &Term) -> CoreTerm {
    match term {
      Term::Ref(occ) => CoreTerm::Ref(self.reference(*occ)),
      Term::App { head, args } => CoreTerm::App {
        head: Box::new(self.term(head)),
        args: args.iter().map(|arg| self.term(arg)).collect(),
      },
      Term::Lam { params, body } => CoreTerm::Lam {
        params: params.clone(),
        body: Box::new(self.term(body)),
      },
      Term::Let { name, value, body } => CoreTerm::App {
        head: Box::new(CoreTerm::Lam {
          params: vec![name.clone()],
          body: Box::new(self.term(body)),
        }),
        args: vec![self.term(value)],
      },
      Term::Match {
        scrutinees,
        clauses,
      } => CoreTerm::Case {
        scrutinees: scrutinees.iter().map(|s| self.term(s)).collect(),
        branches: clauses.iter().map(|clause| self.branch(clause)).collect(),
      },
      Term::ClassExt { base, fields } => CoreTerm::Extend {
        base: Box::new(self.term(base)),
        fields: fields
          .iter()
          .map(|field| CoreField {
            field: self.reference(field.occ),
            value: self.term(&field.value),
          })
          .collect(),
      },
      Term::New(inner) => match self.term(inner) {
        CoreTerm::Extend { base, fields } => CoreTerm::NewInstance { base, fields },
        other => CoreTerm::NewInstance {
          base: Box::new(other),
          fields: Vec::new(),
        },
      },
      Term::Universe(level) => CoreTerm::Universe(*level),
      Term::Hole => CoreTerm::Hole,
    }
  }

  fn branch(&self, clause: &Clause) -> CoreBranch {
    CoreBranch {
      patterns: clause.patterns.clone(),
      body: clause.body.as_ref().map(|body| self.term(body)),
    }
  }
}
