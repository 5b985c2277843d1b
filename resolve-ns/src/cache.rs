//! The reference cache: occurrence → resolved definition.
//!
//! The cache is the only structure mutated across analysis components, so it
//! hides its map behind a lock: readers (rendering collaborators) always see
//! either the old or the new value for an entry, never a torn one. Entries
//! for occurrences deleted from the tree are removed synchronously with the
//! edit via [`ResolveCache::apply_tree_event`]; an entry never outlives its
//! occurrence.

use ahash::HashMap;
use ahash::HashMapExt;
use hir_ns::DefId;
use hir_ns::OccId;
use hir_ns::TreeEvent;
use parking_lot::RwLock;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;

/// What an occurrence currently resolves to.
///
/// `None` from [`ResolveCache::lookup`] means "never resolved in this
/// session" and is distinct from both variants below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolvedTarget {
  /// A concrete definition in the namespace tree.
  Def(DefId),
  /// Resolved, but not to a tree definition (a local binding).
  Null,
  /// Resolution failed; error sentinel.
  Error,
}

impl ResolvedTarget {
  pub fn def(&self) -> Option<DefId> {
    match self {
      ResolvedTarget::Def(def) => Some(*def),
      _ => None,
    }
  }

  pub fn is_error(&self) -> bool {
    matches!(self, ResolvedTarget::Error)
  }
}

/// Whether swapping `prev` for `new` obliges the owning definition to be
/// re-typechecked. A first-time write never does, and neither does the
/// sentinel-only downgrade `Null` → `Error`, which would otherwise force a
/// re-check without any resolution actually changing.
pub fn is_dirtying_change(prev: Option<ResolvedTarget>, new: ResolvedTarget) -> bool {
  match prev {
    None => false,
    Some(prev) => {
      prev != new && !(new == ResolvedTarget::Error && prev == ResolvedTarget::Null)
    }
  }
}

#[derive(Debug, Default)]
pub struct ResolveCache {
  entries: RwLock<HashMap<OccId, ResolvedTarget>>,
}

impl ResolveCache {
  pub fn new() -> Self {
    ResolveCache {
      entries: RwLock::new(HashMap::new()),
    }
  }

  /// `None` means the occurrence was never resolved in this session.
  pub fn lookup(&self, occ: OccId) -> Option<ResolvedTarget> {
    self.entries.read().get(&occ).copied()
  }

  /// Atomically swap the cached target, returning the previous one so
  /// callers can detect a change rather than just a write.
  pub fn replace(&self, occ: OccId, target: ResolvedTarget) -> Option<ResolvedTarget> {
    self.entries.write().insert(occ, target)
  }

  /// Remove the entry for an occurrence being deleted. Idempotent.
  pub fn invalidate(&self, occ: OccId) {
    self.entries.write().remove(&occ);
  }

  /// Bulk removal, applied occurrence-by-occurrence in the given (tree)
  /// order under a single write lock.
  pub fn invalidate_many(&self, occs: &[OccId]) {
    let mut entries = self.entries.write();
    for occ in occs {
      entries.remove(occ);
    }
  }

  /// Apply a tree edit event. Must run synchronously as part of the edit,
  /// before the edited tree becomes visible to readers.
  pub fn apply_tree_event(&self, event: &TreeEvent) {
    match event {
      TreeEvent::OccurrenceAdded { .. } => {}
      TreeEvent::OccurrenceRemoved { occ, .. } => self.invalidate(*occ),
      TreeEvent::RangeRemoved { occs, .. } => self.invalidate_many(occs),
      TreeEvent::DefinitionReplaced { removed, .. }
      | TreeEvent::DefinitionRemoved { removed, .. } => self.invalidate_many(removed),
    }
  }

  pub fn len(&self) -> usize {
    self.entries.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.read().is_empty()
  }

  /// Deterministic snapshot of all entries, for comparisons in tests.
  pub fn snapshot(&self) -> BTreeMap<OccId, ResolvedTarget> {
    self
      .entries
      .read()
      .iter()
      .map(|(occ, target)| (*occ, *target))
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dirtying_change_rules() {
    let a = ResolvedTarget::Def(DefId(1));
    let b = ResolvedTarget::Def(DefId(2));
    assert!(!is_dirtying_change(None, a), "first write is not a change");
    assert!(!is_dirtying_change(Some(a), a));
    assert!(is_dirtying_change(Some(a), b));
    assert!(is_dirtying_change(Some(a), ResolvedTarget::Error));
    assert!(
      !is_dirtying_change(Some(ResolvedTarget::Null), ResolvedTarget::Error),
      "sentinel-only downgrade must not force a re-check"
    );
    assert!(is_dirtying_change(Some(ResolvedTarget::Error), ResolvedTarget::Null));
  }
}
