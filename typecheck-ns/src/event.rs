//! Checking results as an ordered event stream toward rendering and
//! diagnostics collaborators.

use hir_ns::DefId;
use hir_ns::GroupId;
use hir_ns::QualifiedName;

/// Coarse outcome of one full-check attempt, for event consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcomeKind {
  Ok,
  Errors,
  TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckEvent {
  /// A definition went through the full typechecker.
  DefinitionChecked {
    def: DefId,
    outcome: CheckOutcomeKind,
  },
  /// A definition went through the structural checker only.
  DumbChecked { def: DefId },
  /// Monotonic progress: one increment per definition fully processed.
  Progress { completed: u32, total: u32 },
  /// A definition exceeded its time budget; named for the user-visible
  /// warning.
  TimedOut { def: DefId, name: QualifiedName },
  /// A non-last definition timed out, so the remainder of this batch is
  /// unreliable and the subtree pass must run again.
  Rescheduled { group: GroupId },
  /// A smart batch completed; collaborators may run secondary rendering.
  ResultsReady { group: GroupId },
}
