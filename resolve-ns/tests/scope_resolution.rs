use diagnostics::FileId;
use hir_ns::Term;
use hir_ns::TreeBuilder;
use resolve_ns::resolve_group;
use resolve_ns::CancelToken;
use resolve_ns::NullListener;
use resolve_ns::ResolveCache;
use resolve_ns::ResolvedTarget;

#[test]
fn forward_reference_within_group_resolves() {
  let mut b = TreeBuilder::new(FileId(0));
  let root = b.root();
  let f = b.function(root, "f");
  let occ = b.body_ref(f, &["g"]);
  let g = b.function(root, "g");
  b.set_body(g, Term::Universe(0));
  let mut tree = b.finish();

  let cache = ResolveCache::new();
  let outcome = resolve_group(
    &mut tree,
    &cache,
    root,
    &mut NullListener,
    &CancelToken::new(),
  );
  assert!(outcome.diagnostics.is_empty());
  assert_eq!(cache.lookup(occ), Some(ResolvedTarget::Def(g)));
}

#[test]
fn locals_shadow_namespace_bindings() {
  let mut b = TreeBuilder::new(FileId(0));
  let root = b.root();
  let x = b.function(root, "x");
  let shadowed = b.function(root, "f");
  b.param(shadowed, "x");
  let local_ref = b.body_ref(shadowed, &["x"]);
  let plain = b.function(root, "h");
  let global_ref = b.body_ref(plain, &["x"]);
  let mut tree = b.finish();

  let cache = ResolveCache::new();
  resolve_group(&mut tree, &cache, root, &mut NullListener, &CancelToken::new());
  assert_eq!(cache.lookup(local_ref), Some(ResolvedTarget::Null));
  assert_eq!(cache.lookup(global_ref), Some(ResolvedTarget::Def(x)));
}

#[test]
fn qualified_path_descends_into_modules_and_data() {
  let mut b = TreeBuilder::new(FileId(0));
  let root = b.root();
  let (_m, inner) = b.module(root, "M");
  let nat = b.data(inner, "Nat");
  let zero = b.constructor(nat, "zero");
  let f = b.function(root, "f");
  let occ = b.body_ref(f, &["M", "Nat", "zero"]);
  let mut tree = b.finish();

  let cache = ResolveCache::new();
  let outcome = resolve_group(
    &mut tree,
    &cache,
    root,
    &mut NullListener,
    &CancelToken::new(),
  );
  assert!(outcome.diagnostics.is_empty());
  assert_eq!(cache.lookup(occ), Some(ResolvedTarget::Def(zero)));
}

#[test]
fn constructors_visible_alongside_their_data() {
  let mut b = TreeBuilder::new(FileId(0));
  let root = b.root();
  let nat = b.data(root, "Nat");
  let zero = b.constructor(nat, "zero");
  let f = b.function(root, "f");
  let occ = b.body_ref(f, &["zero"]);
  let mut tree = b.finish();

  let cache = ResolveCache::new();
  resolve_group(&mut tree, &cache, root, &mut NullListener, &CancelToken::new());
  assert_eq!(cache.lookup(occ), Some(ResolvedTarget::Def(zero)));
}

#[test]
fn open_imports_renames_and_hides_without_mutating_the_module() {
  let mut b = TreeBuilder::new(FileId(0));
  let root = b.root();
  let (_m, inner) = b.module(root, "M");
  let f = b.function(inner, "f");
  let g = b.function(inner, "g");

  // `\open M (f \as h)`: only f is imported, under the name h.
  b.open_with(root, &["M"], &[("f", Some("h"))], &[]);
  let user = b.function(root, "user");
  let via_rename = b.body_ref(user, &["h"]);
  let not_imported = b.reference(user, &["g"]);
  let qualified = b.reference(user, &["M", "g"]);
  b.set_body(user, Term::app(Term::Ref(via_rename), vec![
    Term::Ref(not_imported),
    Term::Ref(qualified),
  ]));
  let mut tree = b.finish();

  let cache = ResolveCache::new();
  let outcome = resolve_group(
    &mut tree,
    &cache,
    root,
    &mut NullListener,
    &CancelToken::new(),
  );
  assert_eq!(cache.lookup(via_rename), Some(ResolvedTarget::Def(f)));
  assert_eq!(
    cache.lookup(not_imported),
    Some(ResolvedTarget::Error),
    "a using list imports only the listed members"
  );
  assert_eq!(cache.lookup(qualified), Some(ResolvedTarget::Def(g)));
  assert_eq!(outcome.diagnostics.len(), 1);
}

#[test]
fn hiding_excludes_a_member() {
  let mut b = TreeBuilder::new(FileId(0));
  let root = b.root();
  let (_m, inner) = b.module(root, "M");
  let f = b.function(inner, "f");
  let _g = b.function(inner, "g");
  b.open_with(root, &["M"], &[], &["g"]);
  let user = b.function(root, "user");
  let visible = b.reference(user, &["f"]);
  let hidden = b.reference(user, &["g"]);
  b.set_body(user, Term::app(Term::Ref(visible), vec![Term::Ref(hidden)]));
  let mut tree = b.finish();

  let cache = ResolveCache::new();
  resolve_group(&mut tree, &cache, root, &mut NullListener, &CancelToken::new());
  assert_eq!(cache.lookup(visible), Some(ResolvedTarget::Def(f)));
  assert_eq!(cache.lookup(hidden), Some(ResolvedTarget::Error));
}

#[test]
fn colliding_imports_are_ambiguous_but_own_defs_shadow_imports() {
  let mut b = TreeBuilder::new(FileId(0));
  let root = b.root();
  let (_m1, inner1) = b.module(root, "M1");
  let _x1 = b.function(inner1, "x");
  let _y1 = b.function(inner1, "y");
  let (_m2, inner2) = b.module(root, "M2");
  let _x2 = b.function(inner2, "x");
  b.open(root, &["M1"]);
  b.open(root, &["M2"]);
  let own_y = b.function(root, "y");
  let user = b.function(root, "user");
  let ambiguous = b.reference(user, &["x"]);
  let shadowed = b.reference(user, &["y"]);
  b.set_body(user, Term::app(Term::Ref(ambiguous), vec![Term::Ref(shadowed)]));
  let mut tree = b.finish();

  let cache = ResolveCache::new();
  let outcome = resolve_group(
    &mut tree,
    &cache,
    root,
    &mut NullListener,
    &CancelToken::new(),
  );
  assert_eq!(cache.lookup(ambiguous), Some(ResolvedTarget::Error));
  assert!(outcome
    .diagnostics
    .iter()
    .any(|diag| diag.code == "RES0002"));
  // The group's own `y` wins over the imported one.
  assert_eq!(cache.lookup(shadowed), Some(ResolvedTarget::Def(own_y)));
}

#[test]
fn prelude_is_always_in_scope() {
  let mut b = TreeBuilder::new(FileId(0));
  let prelude = b.prelude_group("Prelude");
  let nat = b.data(prelude, "Nat");
  let root = b.root();
  let f = b.function(root, "f");
  let occ = b.body_ref(f, &["Nat"]);
  let mut tree = b.finish();

  let cache = ResolveCache::new();
  let outcome = resolve_group(
    &mut tree,
    &cache,
    root,
    &mut NullListener,
    &CancelToken::new(),
  );
  assert!(outcome.diagnostics.is_empty());
  assert_eq!(cache.lookup(occ), Some(ResolvedTarget::Def(nat)));
}
