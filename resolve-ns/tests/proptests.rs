use std::collections::BTreeMap;

use hir_ns::DefId;
use hir_ns::OccId;
use proptest::prelude::*;
use resolve_ns::ResolveCache;
use resolve_ns::ResolvedTarget;

#[derive(Clone, Debug)]
enum Op {
  Replace(u32, ResolvedTarget),
  Invalidate(u32),
  Lookup(u32),
}

fn target_strategy() -> impl Strategy<Value = ResolvedTarget> {
  prop_oneof![
    (0u32..8).prop_map(|def| ResolvedTarget::Def(DefId(def))),
    Just(ResolvedTarget::Null),
    Just(ResolvedTarget::Error),
  ]
}

fn op_strategy() -> impl Strategy<Value = Op> {
  prop_oneof![
    ((0u32..16), target_strategy()).prop_map(|(occ, target)| Op::Replace(occ, target)),
    (0u32..16).prop_map(Op::Invalidate),
    (0u32..16).prop_map(Op::Lookup),
  ]
}

proptest! {
  /// For any sequence of replace/invalidate calls, lookup returns the most
  /// recent replace target for a live occurrence and `None` for one whose
  /// last event was an invalidation.
  #[test]
  fn cache_agrees_with_model(ops in prop::collection::vec(op_strategy(), 0..128)) {
    let cache = ResolveCache::new();
    let mut model: BTreeMap<u32, ResolvedTarget> = BTreeMap::new();

    for op in ops {
      match op {
        Op::Replace(occ, target) => {
          let previous = cache.replace(OccId(occ), target);
          prop_assert_eq!(previous, model.insert(occ, target));
        }
        Op::Invalidate(occ) => {
          cache.invalidate(OccId(occ));
          model.remove(&occ);
        }
        Op::Lookup(occ) => {
          prop_assert_eq!(cache.lookup(OccId(occ)), model.get(&occ).copied());
        }
      }
    }

    let snapshot = cache.snapshot();
    prop_assert_eq!(snapshot.len(), model.len());
    for (occ, target) in model {
      prop_assert_eq!(snapshot.get(&OccId(occ)).copied(), Some(target));
    }
  }
}
