//! The name resolver.
//!
//! Resolves every reference occurrence of a group's definitions against the
//! enclosing scope, writes results into the [`ResolveCache`], and reports
//! them to a caller-supplied [`ResolutionListener`]. Resolution proceeds in
//! declaration order and recurses into nested groups depth-first; each
//! group's namespace is built from all of its member declarations before any
//! body resolves, so forward references succeed.
//!
//! Failure is local: an unknown or ambiguous name produces an error-sentinel
//! cache entry and a diagnostic, and resolution continues with the sibling
//! occurrences. Cancellation is polled between definitions; the cache is
//! only ever updated for definitions that resolved completely, so a
//! cancelled pass leaves every untouched definition exactly as it was.
//!
//! Dirty tracking: a definition is reported dirty when one of its cache
//! entries changed non-trivially (see [`is_dirtying_change`]) or when its
//! resolved dependency set differs from the previous pass.

use crate::cache::is_dirtying_change;
use crate::cache::ResolveCache;
use crate::cache::ResolvedTarget;
use crate::cancel::CancelToken;
use crate::event::ResolutionEvent;
use crate::event::ResolutionListener;
use crate::scope::def_namespace;
use crate::scope::Binding;
use crate::scope::Frame;
use crate::scope::Lookup;
use crate::scope::Scope;
use diagnostics::Diagnostic;
use diagnostics::Span;
use hir_ns::DefId;
use hir_ns::DefKind;
use hir_ns::Definition;
use hir_ns::GroupId;
use hir_ns::NamespaceCommand;
use hir_ns::NamespaceTree;
use hir_ns::OccId;
use hir_ns::Pattern;
use hir_ns::Term;
use std::collections::BTreeSet;

pub(crate) const CODE_UNKNOWN_NAME: &str = "RES0001";
pub(crate) const CODE_AMBIGUOUS_NAME: &str = "RES0002";
pub(crate) const CODE_NOT_IN_NAMESPACE: &str = "RES0003";
pub(crate) const CODE_LOCAL_PROJECTION: &str = "RES0004";
pub(crate) const CODE_UNKNOWN_MEMBER: &str = "RES0005";
pub(crate) const CODE_UNKNOWN_FIELD: &str = "RES0006";

/// Result of one resolution pass over a group.
#[derive(Debug, Default)]
pub struct ResolveOutcome {
  /// Definitions whose resolution changed and which must be re-typechecked.
  pub dirty: BTreeSet<DefId>,
  /// The cycle's full set of resolution diagnostics; callers replace any
  /// previously stored set rather than appending.
  pub diagnostics: Vec<Diagnostic>,
  /// The pass was cancelled before completing; cache state for unvisited
  /// definitions is untouched.
  pub cancelled: bool,
  /// Definitions fully resolved, for progress reporting.
  pub resolved: u32,
}

/// Resolve every definition transitively contained in `group`.
pub fn resolve_group(
  tree: &mut NamespaceTree,
  cache: &ResolveCache,
  group: GroupId,
  listener: &mut dyn ResolutionListener,
  cancel: &CancelToken,
) -> ResolveOutcome {
  let (outcome, commits) = {
    let tree_ref: &NamespaceTree = tree;
    let mut resolver = Resolver {
      tree: tree_ref,
      cache,
      listener,
      outcome: ResolveOutcome::default(),
      commits: Vec::new(),
    };
    let mut scope = Scope::new(tree_ref);
    for ancestor in ancestor_chain(tree_ref, group) {
      scope.push_frame(Frame::for_group(tree_ref, ancestor));
    }
    resolver.resolve_group_rec(group, &mut scope, cancel);
    (resolver.outcome, resolver.commits)
  };
  for (def, deps) in commits {
    tree.set_last_deps(def, deps);
  }
  outcome
}

/// Groups enclosing `group`, outermost first, excluding `group` itself.
fn ancestor_chain(tree: &NamespaceTree, group: GroupId) -> Vec<GroupId> {
  let mut chain = Vec::new();
  let mut current = tree.group(group).parent;
  while let Some(id) = current {
    chain.push(id);
    current = tree.group(id).parent;
  }
  chain.reverse();
  chain
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefStyle {
  Reference,
  Pattern,
  Namespace,
}

/// Per-definition scratch state. Cache writes are buffered and flushed only
/// once the definition resolved completely, keeping the cache per-definition
/// atomic under cancellation.
#[derive(Default)]
struct DefCtx {
  writes: Vec<(OccId, ResolvedTarget)>,
  deps: BTreeSet<DefId>,
  class_params: Vec<Span>,
}

impl DefCtx {
  fn target_of(&self, occ: OccId) -> Option<ResolvedTarget> {
    self
      .writes
      .iter()
      .rev()
      .find(|(id, _)| *id == occ)
      .map(|(_, target)| *target)
  }
}

struct Resolver<'t, 'l> {
  tree: &'t NamespaceTree,
  cache: &'t ResolveCache,
  listener: &'l mut dyn ResolutionListener,
  outcome: ResolveOutcome,
  commits: Vec<(DefId, BTreeSet<DefId>)>,
}

impl<'t, 'l> Resolver<'t, 'l> {
  fn resolve_group_rec(&mut self, group: GroupId, scope: &mut Scope, cancel: &CancelToken) {
    if self.check_cancelled(cancel) {
      return;
    }
    let tree = self.tree;
    scope.push_frame(Frame::for_group(tree, group));
    for command in &tree.group(group).commands {
      self.resolve_command(command, scope);
    }
    for &def in &tree.group(group).defs {
      if self.check_cancelled(cancel) {
        break;
      }
      self.resolve_definition(def, scope, cancel);
    }
    scope.pop_frame();
  }

  fn check_cancelled(&mut self, cancel: &CancelToken) -> bool {
    if cancel.is_cancelled() {
      self.outcome.cancelled = true;
    }
    self.outcome.cancelled
  }

  fn resolve_definition(&mut self, def_id: DefId, scope: &mut Scope, cancel: &CancelToken) {
    let tree = self.tree;
    let Some(def) = tree.def(def_id) else { return };
    let mut ctx = DefCtx::default();

    for param in &def.params {
      if let Some(ty_occ) = param.ty {
        let target = self.resolve_occ(ty_occ, scope, &mut ctx, RefStyle::Reference);
        let is_class = target
          .def()
          .and_then(|d| tree.def(d))
          .map(|d| d.kind == DefKind::Class)
          .unwrap_or(false);
        if is_class {
          ctx.class_params.push(Span::new(def.span.file, param.name_range));
        }
      }
    }
    if !ctx.class_params.is_empty() {
      let params = std::mem::take(&mut ctx.class_params);
      self
        .listener
        .on_event(ResolutionEvent::ClassParametersResolved { def: def_id, params });
    }

    scope.push_locals(def.params.iter().map(|p| p.name.clone()).collect());
    if let Some(result_type) = &def.result_type {
      self.resolve_term(result_type, scope, &mut ctx);
    }
    if let Some(term) = &def.term {
      self.resolve_term(term, scope, &mut ctx);
    }
    self.finish_definition(def_id, def, ctx);

    // Sub-definitions see the parent's parameters (constructors of a data
    // definition reference its type parameters).
    for &child in &def.children {
      self.resolve_definition(child, scope, cancel);
    }
    scope.pop_locals();

    if let Some(subgroup) = def.subgroup {
      self.resolve_group_rec(subgroup, scope, cancel);
    }
  }

  fn finish_definition(&mut self, def_id: DefId, def: &Definition, ctx: DefCtx) {
    self.listener.on_event(ResolutionEvent::DeclarationResolved {
      def: def_id,
      name_span: Span::new(def.span.file, def.name_range),
    });
    for (occ, target) in &ctx.writes {
      let prev = self.cache.replace(*occ, *target);
      if is_dirtying_change(prev, *target) {
        self.outcome.dirty.insert(def_id);
      }
    }
    if let Some(old) = &def.last_deps {
      if *old != ctx.deps {
        self.outcome.dirty.insert(def_id);
      }
    }
    self.commits.push((def_id, ctx.deps));
    self.outcome.resolved += 1;
    self
      .listener
      .on_event(ResolutionEvent::DefinitionResolved { def: def_id });
  }

  fn resolve_term(&mut self, term: &Term, scope: &mut Scope, ctx: &mut DefCtx) {
    match term {
      Term::Ref(occ) => {
        self.resolve_occ(*occ, scope, ctx, RefStyle::Reference);
      }
      Term::App { head, args } => {
        self.resolve_term(head, scope, ctx);
        for arg in args {
          self.resolve_term(arg, scope, ctx);
        }
      }
      Term::Lam { params, body } => {
        scope.push_locals(params.clone());
        self.resolve_term(body, scope, ctx);
        scope.pop_locals();
      }
      Term::Let { name, value, body } => {
        self.resolve_term(value, scope, ctx);
        scope.push_locals(vec![name.clone()]);
        self.resolve_term(body, scope, ctx);
        scope.pop_locals();
      }
      Term::Match {
        scrutinees,
        clauses,
      } => {
        for scrutinee in scrutinees {
          self.resolve_term(scrutinee, scope, ctx);
        }
        for clause in clauses {
          let mut bindings = Vec::new();
          for pattern in &clause.patterns {
            self.resolve_pattern(pattern, scope, ctx);
            pattern.collect_bindings(&mut bindings);
          }
          if let Some(body) = &clause.body {
            scope.push_locals(bindings);
            self.resolve_term(body, scope, ctx);
            scope.pop_locals();
          }
        }
      }
      Term::ClassExt { base, fields } => {
        self.resolve_term(base, scope, ctx);
        let class = head_occ(base)
          .and_then(|occ| ctx.target_of(occ))
          .and_then(|target| target.def())
          .filter(|def| {
            self
              .tree
              .def(*def)
              .map(|d| d.kind == DefKind::Class)
              .unwrap_or(false)
          });
        for field in fields {
          self.resolve_copattern(field.occ, class, ctx);
          self.resolve_term(&field.value, scope, ctx);
        }
      }
      Term::New(inner) => self.resolve_term(inner, scope, ctx),
      Term::Universe(_) | Term::Hole => {}
    }
  }

  fn resolve_pattern(&mut self, pattern: &Pattern, scope: &mut Scope, ctx: &mut DefCtx) {
    match pattern {
      Pattern::Var(_) => {}
      Pattern::Ctor { occ, args } => {
        self.resolve_occ(*occ, scope, ctx, RefStyle::Pattern);
        for arg in args {
          self.resolve_pattern(arg, scope, ctx);
        }
      }
      Pattern::Tuple(elems) => {
        for elem in elems {
          self.resolve_pattern(elem, scope, ctx);
        }
      }
    }
  }

  /// Resolve a class-field implementation (co-pattern) against the class of
  /// the extended expression. When the class itself did not resolve, the
  /// field gets an error sentinel without a cascading diagnostic.
  fn resolve_copattern(&mut self, occ_id: OccId, class: Option<DefId>, ctx: &mut DefCtx) {
    let tree = self.tree;
    let Some(occ) = tree.occ(occ_id) else { return };
    let target = match class {
      None => ResolvedTarget::Error,
      Some(class_def) => match def_namespace(tree, class_def).get(occ.last_segment()) {
        Some(Binding::Def(field)) => {
          ctx.deps.insert(field);
          ResolvedTarget::Def(field)
        }
        Some(Binding::Ambiguous) => {
          self.ambiguous_diag(occ.last_segment(), occ.span);
          ResolvedTarget::Error
        }
        None => {
          let class_name = tree.def(class_def).map(|d| d.name.clone()).unwrap_or_default();
          self.outcome.diagnostics.push(Diagnostic::error(
            CODE_UNKNOWN_FIELD,
            format!("'{}' is not a field of '{}'", occ.last_segment(), class_name),
            occ.span,
          ));
          ResolvedTarget::Error
        }
      },
    };
    ctx.writes.push((occ_id, target));
    self
      .listener
      .on_event(ResolutionEvent::CoPatternResolved { occ: occ_id, target });
  }

  /// Resolve a (possibly qualified) occurrence: segments left-to-right, the
  /// first against the scope, the rest by descending into the previous
  /// segment's namespace.
  fn resolve_occ(
    &mut self,
    occ_id: OccId,
    scope: &Scope,
    ctx: &mut DefCtx,
    style: RefStyle,
  ) -> ResolvedTarget {
    let tree = self.tree;
    let Some(occ) = tree.occ(occ_id) else {
      return ResolvedTarget::Error;
    };
    let count = occ.segments.len();
    if count == 0 {
      return ResolvedTarget::Error;
    }

    let mut segments = Vec::with_capacity(count);
    let first = match scope.lookup(&occ.segments[0]) {
      Lookup::Local => ResolvedTarget::Null,
      Lookup::Def(def) => {
        ctx.deps.insert(def);
        ResolvedTarget::Def(def)
      }
      Lookup::Ambiguous => {
        self.ambiguous_diag(&occ.segments[0], self.segment_span(occ_id, 0));
        ResolvedTarget::Error
      }
      Lookup::NotFound => {
        self.outcome.diagnostics.push(Diagnostic::error(
          CODE_UNKNOWN_NAME,
          format!("unknown name '{}'", occ.segments[0]),
          self.segment_span(occ_id, 0),
        ));
        ResolvedTarget::Error
      }
    };
    segments.push(first);

    for idx in 1..count {
      let next = match segments[idx - 1] {
        ResolvedTarget::Def(container) => {
          match def_namespace(tree, container).get(&occ.segments[idx]) {
            Some(Binding::Def(member)) => {
              ctx.deps.insert(member);
              ResolvedTarget::Def(member)
            }
            Some(Binding::Ambiguous) => {
              self.ambiguous_diag(&occ.segments[idx], self.segment_span(occ_id, idx));
              ResolvedTarget::Error
            }
            None => {
              let container_name =
                tree.def(container).map(|d| d.name.clone()).unwrap_or_default();
              self.outcome.diagnostics.push(Diagnostic::error(
                CODE_NOT_IN_NAMESPACE,
                format!(
                  "'{}' is not in the namespace of '{}'",
                  occ.segments[idx], container_name
                ),
                self.segment_span(occ_id, idx),
              ));
              ResolvedTarget::Error
            }
          }
        }
        ResolvedTarget::Null => {
          self.outcome.diagnostics.push(Diagnostic::error(
            CODE_LOCAL_PROJECTION,
            format!("local name '{}' cannot be qualified", occ.segments[idx - 1]),
            self.segment_span(occ_id, idx),
          ));
          ResolvedTarget::Error
        }
        // The head already failed; stay silent for the tail.
        ResolvedTarget::Error => ResolvedTarget::Error,
      };
      segments.push(next);
    }

    let target = segments.last().copied().unwrap_or(ResolvedTarget::Error);

    // Longest resolved prefix of a qualified path, for display. Emitted both
    // when the tail failed (drop to the longest valid prefix) and when the
    // path fully resolved (the qualifier).
    let mut prefix = 0;
    while prefix < count - 1 && !segments[prefix].is_error() {
      prefix += 1;
    }
    if prefix > 0 {
      let range = occ.segment_ranges[0].cover(occ.segment_ranges[prefix - 1]);
      self.listener.on_event(ResolutionEvent::LongPrefixResolved {
        occ: occ_id,
        range: Span::new(occ.span.file, range),
      });
    }

    match style {
      RefStyle::Reference => self.listener.on_event(ResolutionEvent::ReferenceResolved {
        occ: occ_id,
        segments,
        target,
        role: occ.role,
      }),
      RefStyle::Pattern => self
        .listener
        .on_event(ResolutionEvent::PatternResolved { occ: occ_id, target }),
      RefStyle::Namespace => self
        .listener
        .on_event(ResolutionEvent::NamespaceResolved { occ: occ_id, segments }),
    }

    ctx.writes.push((occ_id, target));
    target
  }

  /// Resolve one namespace command and populate the innermost frame's import
  /// layer. Command occurrences belong to the group, so their cache entries
  /// are written immediately and dirty no definition by themselves; any real
  /// consequence shows up as changed entries of member definitions.
  fn resolve_command(&mut self, command: &NamespaceCommand, scope: &mut Scope) {
    let tree = self.tree;
    let mut ctx = DefCtx::default();
    let target = self.resolve_occ(command.path, scope, &mut ctx, RefStyle::Namespace);

    if let ResolvedTarget::Def(target_def) = target {
      let ns = def_namespace(tree, target_def);
      if !command.renamings.is_empty() {
        for renaming in &command.renamings {
          let Some(occ) = tree.occ(renaming.occ) else { continue };
          let name = occ.last_segment();
          match ns.get(name) {
            Some(Binding::Def(member)) => {
              ctx.writes.push((renaming.occ, ResolvedTarget::Def(member)));
              self.listener.on_event(ResolutionEvent::RenamingResolved {
                occ: renaming.occ,
                target: ResolvedTarget::Def(member),
              });
              let visible = renaming.to.as_deref().unwrap_or(name);
              if let Some(imported) = scope.imported_mut() {
                imported.bind(visible, member);
              }
            }
            Some(Binding::Ambiguous) => {
              self.ambiguous_diag(name, occ.span);
              ctx.writes.push((renaming.occ, ResolvedTarget::Error));
            }
            None => {
              let target_name =
                tree.def(target_def).map(|d| d.name.clone()).unwrap_or_default();
              self.outcome.diagnostics.push(Diagnostic::error(
                CODE_UNKNOWN_MEMBER,
                format!("'{}' is not exported by '{}'", name, target_name),
                occ.span,
              ));
              ctx.writes.push((renaming.occ, ResolvedTarget::Error));
            }
          }
        }
      } else {
        for (name, binding) in ns.iter() {
          if command.hiding.iter().any(|hidden| hidden == name) {
            continue;
          }
          if let Some(imported) = scope.imported_mut() {
            match binding {
              Binding::Def(def) => imported.bind(name, def),
              Binding::Ambiguous => imported.merge_ambiguous(name),
            }
          }
        }
      }
    }

    for (occ, target) in ctx.writes {
      self.cache.replace(occ, target);
    }
  }

  fn ambiguous_diag(&mut self, name: &str, span: Span) {
    self.outcome.diagnostics.push(Diagnostic::error(
      CODE_AMBIGUOUS_NAME,
      format!("name '{}' is ambiguous", name),
      span,
    ));
  }

  fn segment_span(&self, occ: OccId, idx: usize) -> Span {
    let Some(occ) = self.tree.occ(occ) else {
      return Span::new(diagnostics::FileId(0), diagnostics::TextRange::new(0, 0));
    };
    let range = occ
      .segment_ranges
      .get(idx)
      .copied()
      .unwrap_or(occ.span.range);
    Span::new(occ.span.file, range)
  }
}

fn head_occ(term: &Term) -> Option<OccId> {
  match term {
    Term::Ref(occ) => Some(*occ),
    Term::App { head, .. } => head_occ(head),
    Term::New(inner) => head_occ(inner),
    _ => None,
  }
}
