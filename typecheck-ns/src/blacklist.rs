//! Durable record of definitions that exceeded their typechecking budget.
//!
//! Append/lookup only from the analysis core: a blacklisted definition is
//! skipped by full typechecking (it still gets structural checks) until the
//! entry is cleared by an explicit external decision such as a project
//! reload. Lifecycle matches the namespace tree it belongs to; there is no
//! process-global state.

use ahash::HashMap;
use ahash::HashMapExt;
use hir_ns::DefId;
use parking_lot::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlacklistEntry {
  /// How many times the definition has timed out. Monotonically increasing.
  pub failures: u32,
}

#[derive(Debug, Default)]
pub struct Blacklist {
  entries: RwLock<HashMap<DefId, BlacklistEntry>>,
}

impl Blacklist {
  pub fn new() -> Self {
    Blacklist {
      entries: RwLock::new(HashMap::new()),
    }
  }

  pub fn is_blacklisted(&self, def: DefId) -> bool {
    self.entries.read().contains_key(&def)
  }

  pub fn entry(&self, def: DefId) -> Option<BlacklistEntry> {
    self.entries.read().get(&def).copied()
  }

  /// Record a timeout, returning the updated failure count.
  pub fn record_timeout(&self, def: DefId) -> u32 {
    let mut entries = self.entries.write();
    let entry = entries
      .entry(def)
      .and_modify(|entry| entry.failures += 1)
      .or_insert(BlacklistEntry { failures: 1 });
    entry.failures
  }

  /// Clear one definition's entry, e.g. for an explicit retry. Returns
  /// whether an entry existed.
  pub fn clear(&self, def: DefId) -> bool {
    self.entries.write().remove(&def).is_some()
  }

  pub fn clear_all(&self) {
    self.entries.write().clear();
  }

  pub fn len(&self) -> usize {
    self.entries.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.read().is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn failures_accumulate_until_cleared() {
    let blacklist = Blacklist::new();
    let def = DefId(3);
    assert!(!blacklist.is_blacklisted(def));
    assert_eq!(blacklist.record_timeout(def), 1);
    assert_eq!(blacklist.record_timeout(def), 2);
    assert!(blacklist.is_blacklisted(def));
    assert_eq!(blacklist.entry(def), Some(BlacklistEntry { failures: 2 }));
    assert!(blacklist.clear(def));
    assert!(!blacklist.clear(def));
    assert!(blacklist.is_empty());
  }
}
