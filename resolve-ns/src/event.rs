//! Resolution results as an ordered event stream.
//!
//! Events are the sole channel by which resolution reaches rendering and
//! diagnostics collaborators; the resolver owns no display state. Events for
//! one definition are emitted contiguously, terminated by
//! [`ResolutionEvent::DefinitionResolved`].

use crate::cache::ResolvedTarget;
use diagnostics::Span;
use hir_ns::DefId;
use hir_ns::OccId;
use hir_ns::OperatorRole;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionEvent {
  /// A reference occurrence in a body or type was resolved. `segments` holds
  /// the per-segment targets of a qualified path, `target` the final one.
  ReferenceResolved {
    occ: OccId,
    segments: Vec<ResolvedTarget>,
    target: ResolvedTarget,
    role: Option<OperatorRole>,
  },
  /// A constructor in a pattern position was resolved.
  PatternResolved { occ: OccId, target: ResolvedTarget },
  /// A class-field co-pattern (field implementation) was resolved.
  CoPatternResolved { occ: OccId, target: ResolvedTarget },
  /// A namespace command's path was resolved.
  NamespaceResolved {
    occ: OccId,
    segments: Vec<ResolvedTarget>,
  },
  /// A member named in a command's using list was resolved.
  RenamingResolved { occ: OccId, target: ResolvedTarget },
  /// Display range covering the longest resolved prefix of a qualified
  /// path. Presentation only; carries no semantics.
  LongPrefixResolved { occ: OccId, range: Span },
  /// A definition's declaration site, for name highlighting.
  DeclarationResolved { def: DefId, name_span: Span },
  /// Parameters of the definition whose annotated type is a class.
  ClassParametersResolved { def: DefId, params: Vec<Span> },
  /// All of the definition's references were resolved.
  DefinitionResolved { def: DefId },
}

/// Caller-supplied sink for resolution events.
pub trait ResolutionListener {
  fn on_event(&mut self, event: ResolutionEvent);
}

/// Listener that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullListener;

impl ResolutionListener for NullListener {
  fn on_event(&mut self, _event: ResolutionEvent) {}
}

/// Listener that records events in order, for tests and batch consumers.
#[derive(Debug, Default)]
pub struct CollectListener {
  pub events: Vec<ResolutionEvent>,
}

impl ResolutionListener for CollectListener {
  fn on_event(&mut self, event: ResolutionEvent) {
    self.events.push(event);
  }
}
