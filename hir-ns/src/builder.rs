//! Convenience construction of namespace trees.
//!
//! Primarily for tests and tooling: allocates plausible, strictly increasing
//! text ranges so diagnostics and prefix ranges behave like they would on real
//! source. Production front ends drive [`NamespaceTree`] directly with spans
//! from their parser.

use crate::ids::DefId;
use crate::ids::DefKind;
use crate::ids::GroupId;
use crate::ids::OccId;
use crate::ids::OperatorRole;
use crate::term::Term;
use crate::tree::CommandKind;
use crate::tree::NamespaceCommand;
use crate::tree::NamespaceTree;
use crate::tree::OccOwner;
use crate::tree::Param;
use crate::tree::Renaming;
use diagnostics::FileId;
use diagnostics::Span;
use diagnostics::TextRange;

pub struct TreeBuilder {
  tree: NamespaceTree,
  file: FileId,
  cursor: u32,
}

impl TreeBuilder {
  pub fn new(file: FileId) -> Self {
    TreeBuilder {
      tree: NamespaceTree::new(),
      file,
      cursor: 0,
    }
  }

  pub fn root(&self) -> GroupId {
    self.tree.root()
  }

  /// Create a detached group and install it as the prelude.
  pub fn prelude_group(&mut self, name: &str) -> GroupId {
    let group = self.tree.add_group(None, name);
    self.tree.set_prelude(group);
    group
  }

  pub fn module(&mut self, parent: GroupId, name: &str) -> (DefId, GroupId) {
    let name_range = self.advance(name.len());
    let span = Span::new(self.file, name_range);
    self.tree.add_module(parent, name, span, name_range)
  }

  pub fn function(&mut self, group: GroupId, name: &str) -> DefId {
    self.def(group, None, name, DefKind::Function)
  }

  pub fn data(&mut self, group: GroupId, name: &str) -> DefId {
    self.def(group, None, name, DefKind::Data)
  }

  pub fn class(&mut self, group: GroupId, name: &str) -> DefId {
    self.def(group, None, name, DefKind::Class)
  }

  pub fn instance(&mut self, group: GroupId, name: &str) -> DefId {
    self.def(group, None, name, DefKind::Instance)
  }

  pub fn constructor(&mut self, data: DefId, name: &str) -> DefId {
    let group = self.tree.def(data).map(|d| d.group).expect("live data definition");
    self.def(group, Some(data), name, DefKind::Constructor)
  }

  pub fn field(&mut self, class: DefId, name: &str) -> DefId {
    let group = self.tree.def(class).map(|d| d.group).expect("live class definition");
    self.def(group, Some(class), name, DefKind::Field)
  }

  fn def(&mut self, group: GroupId, parent: Option<DefId>, name: &str, kind: DefKind) -> DefId {
    let name_range = self.advance(name.len());
    let span = Span::new(self.file, name_range);
    self.tree.add_def(group, parent, name, kind, span, name_range)
  }

  pub fn param(&mut self, def: DefId, name: &str) {
    let name_range = self.advance(name.len());
    self.tree.add_param(def, Param {
      name: name.to_string(),
      name_range,
      ty: None,
    });
  }

  /// Parameter with a type reference, e.g. `(m : Monoid)`.
  pub fn typed_param(&mut self, def: DefId, name: &str, ty: &[&str]) -> OccId {
    let name_range = self.advance(name.len());
    let occ = self.occurrence(OccOwner::Def(def), ty, None);
    self.tree.add_param(def, Param {
      name: name.to_string(),
      name_range,
      ty: Some(occ),
    });
    occ
  }

  pub fn reference(&mut self, def: DefId, segments: &[&str]) -> OccId {
    self.occurrence(OccOwner::Def(def), segments, None)
  }

  pub fn operator(&mut self, def: DefId, segments: &[&str], role: OperatorRole) -> OccId {
    self.occurrence(OccOwner::Def(def), segments, Some(role))
  }

  pub fn set_body(&mut self, def: DefId, term: Term) {
    self.tree.set_term(def, term);
  }

  pub fn set_result_type(&mut self, def: DefId, term: Term) {
    self.tree.set_result_type(def, term);
  }

  /// Set the body to a single reference and return its occurrence.
  pub fn body_ref(&mut self, def: DefId, segments: &[&str]) -> OccId {
    let occ = self.reference(def, segments);
    self.tree.set_term(def, Term::Ref(occ));
    occ
  }

  pub fn open(&mut self, group: GroupId, path: &[&str]) {
    self.command(group, CommandKind::Open, path, &[], &[]);
  }

  pub fn import(&mut self, group: GroupId, path: &[&str]) {
    self.command(group, CommandKind::Import, path, &[], &[]);
  }

  /// Namespace command with a using/renaming list and a hiding list.
  pub fn open_with(
    &mut self,
    group: GroupId,
    path: &[&str],
    renamings: &[(&str, Option<&str>)],
    hiding: &[&str],
  ) {
    self.command(group, CommandKind::Open, path, renamings, hiding);
  }

  fn command(
    &mut self,
    group: GroupId,
    kind: CommandKind,
    path: &[&str],
    renamings: &[(&str, Option<&str>)],
    hiding: &[&str],
  ) {
    let path_occ = self.occurrence(OccOwner::Group(group), path, None);
    let mut renaming_list = Vec::with_capacity(renamings.len());
    for (from, to) in renamings {
      let occ = self.occurrence(OccOwner::Group(group), &[*from], None);
      renaming_list.push(Renaming {
        occ,
        to: to.map(|s| s.to_string()),
      });
    }
    self.tree.add_command(group, NamespaceCommand {
      kind,
      path: path_occ,
      renamings: renaming_list,
      hiding: hiding.iter().map(|s| s.to_string()).collect(),
    });
  }

  fn occurrence(
    &mut self,
    owner: OccOwner,
    segments: &[&str],
    role: Option<OperatorRole>,
  ) -> OccId {
    let mut ranges = Vec::with_capacity(segments.len());
    let mut start = self.cursor;
    for (idx, segment) in segments.iter().enumerate() {
      let end = start + segment.len() as u32;
      ranges.push(TextRange::new(start, end));
      // Account for the separating dot.
      start = end + if idx + 1 < segments.len() { 1 } else { 0 };
    }
    let span = Span::new(
      self.file,
      TextRange::new(ranges.first().map(|r| r.start).unwrap_or(self.cursor), start),
    );
    self.cursor = start + 1;
    self.tree.add_occurrence(
      owner,
      segments.iter().map(|s| s.to_string()).collect(),
      ranges,
      span,
      role,
    )
  }

  fn advance(&mut self, width: usize) -> TextRange {
    let start = self.cursor;
    let end = start + width as u32;
    self.cursor = end + 1;
    TextRange::new(start, end)
  }

  /// Direct access for edits mid-construction.
  pub fn tree_mut(&mut self) -> &mut NamespaceTree {
    &mut self.tree
  }

  pub fn finish(mut self) -> NamespaceTree {
    // Construction is not an edit; nothing should react to it.
    let _ = self.tree.take_events();
    self.tree
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tree::TreeEvent;

  #[test]
  fn qualified_names_cross_modules_and_parents() {
    let mut b = TreeBuilder::new(FileId(0));
    let root = b.root();
    let (_m, inner) = b.module(root, "Algebra");
    let d = b.data(inner, "Nat");
    let zero = b.constructor(d, "zero");
    let tree = b.finish();

    assert_eq!(tree.qualified_name(zero).to_string(), "Algebra.Nat.zero");
    assert_eq!(tree.qualified_name(d).to_string(), "Algebra.Nat");
  }

  #[test]
  fn declaration_order_is_depth_first() {
    let mut b = TreeBuilder::new(FileId(0));
    let root = b.root();
    let f = b.function(root, "f");
    let d = b.data(root, "D");
    let c = b.constructor(d, "c");
    let (m, inner) = b.module(root, "M");
    let g = b.function(inner, "g");
    let tree = b.finish();

    assert_eq!(tree.definitions_in_group(tree.root()), vec![f, d, c, m, g]);
  }

  #[test]
  fn strip_definition_removes_occurrences_and_marks_last_edited() {
    let mut b = TreeBuilder::new(FileId(0));
    let root = b.root();
    let f = b.function(root, "f");
    let occ = b.body_ref(f, &["g"]);
    let mut tree = b.finish();

    let removed = tree.strip_definition(f).unwrap();
    assert_eq!(removed, vec![occ]);
    assert!(tree.occ(occ).is_none());
    assert_eq!(tree.last_edited(), Some(f));

    let events = tree.take_events();
    assert!(events
      .iter()
      .any(|ev| matches!(ev, TreeEvent::DefinitionReplaced { def, removed } if *def == f && removed.len() == 1)));
  }

  #[test]
  fn remove_definition_detaches_from_group() {
    let mut b = TreeBuilder::new(FileId(0));
    let root = b.root();
    let f = b.function(root, "f");
    let g = b.function(root, "g");
    let mut tree = b.finish();

    tree.remove_definition(g).unwrap();
    assert!(tree.def(g).is_none());
    assert_eq!(tree.definitions_in_group(tree.root()), vec![f]);
    assert!(tree.remove_definition(g).is_err());
  }

  #[test]
  fn occurrence_range_removal_skips_other_owners() {
    let mut b = TreeBuilder::new(FileId(0));
    let root = b.root();
    let f = b.function(root, "f");
    let g = b.function(root, "g");
    let o1 = b.reference(f, &["a"]);
    let o2 = b.reference(g, &["b"]);
    let o3 = b.reference(f, &["c"]);
    let mut tree = b.finish();

    tree.remove_occurrence_range(o1, o3);
    assert!(tree.occ(o1).is_none());
    assert!(tree.occ(o2).is_some(), "other owner must be untouched");
    assert!(tree.occ(o3).is_none());

    let events = tree.take_events();
    match &events[..] {
      [TreeEvent::RangeRemoved { occs, .. }] => assert_eq!(occs, &vec![o1, o3]),
      other => panic!("unexpected events: {other:?}"),
    }
  }
}
