//! The namespace tree: groups, definitions, and reference occurrences.
//!
//! The tree owns every definition and occurrence. Definitions are created on
//! parse, mutated in place on edit, and destroyed on deletion; occurrences are
//! ephemeral and rebuilt whenever their owning definition is re-parsed. All
//! mutations push a [`TreeEvent`] onto an internal queue which the analysis
//! session drains and applies to the reference cache before the edit becomes
//! visible to readers.
//!
//! Two analysis fields live on each definition and are written by exactly one
//! stage each: `last_deps` by the resolver, `check_status` by the
//! typechecker.

use crate::ids::CheckStatus;
use crate::ids::DefId;
use crate::ids::DefKind;
use crate::ids::GroupId;
use crate::ids::OccId;
use crate::ids::OperatorRole;
use crate::ids::QualifiedName;
use crate::term::Term;
use diagnostics::Span;
use diagnostics::TextRange;
use std::collections::BTreeSet;

#[derive(Debug, thiserror::Error)]
pub enum TreeError {
  #[error("definition {0} is not part of this tree")]
  StaleDef(DefId),
}

/// Who owns an occurrence: a definition body, or a group's namespace command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OccOwner {
  Def(DefId),
  Group(GroupId),
}

/// One syntactic use of a (possibly multi-segment, possibly operator) name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
  pub id: OccId,
  /// Name segments, outermost first.
  pub segments: Vec<String>,
  /// One range per segment, in segment order.
  pub segment_ranges: Vec<TextRange>,
  pub span: Span,
  pub role: Option<OperatorRole>,
  pub owner: OccOwner,
}

impl Occurrence {
  pub fn last_segment(&self) -> &str {
    self.segments.last().map(|s| s.as_str()).unwrap_or("")
  }
}

/// A parameter of a definition. The optional type occurrence lets the
/// resolver report parameters whose type is a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
  pub name: String,
  pub name_range: TextRange,
  pub ty: Option<OccId>,
}

/// A named node in the namespace tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
  pub id: DefId,
  pub name: String,
  pub name_range: TextRange,
  pub kind: DefKind,
  pub params: Vec<Param>,
  pub result_type: Option<Term>,
  pub term: Option<Term>,
  pub span: Span,
  pub group: GroupId,
  /// Containing definition for constructors and fields.
  pub parent: Option<DefId>,
  /// Sub-definitions: constructors of a data definition, fields of a class.
  pub children: Vec<DefId>,
  /// Module definitions own a nested group.
  pub subgroup: Option<GroupId>,
  /// Owned occurrences in allocation (= tree) order.
  pub occs: Vec<OccId>,
  /// Resolved dependency set from the last resolution, written by the
  /// resolver only.
  pub last_deps: Option<BTreeSet<DefId>>,
  /// Written by the typechecker only.
  pub check_status: CheckStatus,
}

/// Whether a namespace command opens an already-visible namespace or imports
/// a sibling module. Both resolve the same way; the distinction is kept for
/// the editing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
  Open,
  Import,
}

/// `from \as to` inside a namespace command's using list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Renaming {
  /// Reference to the member being brought in; single-segment.
  pub occ: OccId,
  /// New name, if the member is renamed.
  pub to: Option<String>,
}

/// A namespace command: brings the members of another group into scope,
/// optionally renaming or hiding some of them. Produces a fresh name layer;
/// the imported group itself is never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceCommand {
  pub kind: CommandKind,
  /// Multi-segment path of the opened group.
  pub path: OccId,
  pub renamings: Vec<Renaming>,
  pub hiding: Vec<String>,
}

/// A namespace node: contains definitions, nested groups, and namespace
/// commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
  pub id: GroupId,
  pub name: String,
  pub parent: Option<GroupId>,
  /// The module definition this group belongs to, if any.
  pub owner_def: Option<DefId>,
  /// Top-level member definitions in declaration order.
  pub defs: Vec<DefId>,
  pub subgroups: Vec<GroupId>,
  pub commands: Vec<NamespaceCommand>,
  /// Command-owned occurrences in allocation order.
  pub occs: Vec<OccId>,
}

/// Edits the tree reports toward the analysis core. Removal events must be
/// applied to the reference cache synchronously, before the edited tree is
/// observed by readers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEvent {
  OccurrenceAdded { occ: OccId, owner: OccOwner },
  OccurrenceRemoved { occ: OccId, owner: OccOwner },
  RangeRemoved { occs: Vec<OccId>, owner: OccOwner },
  /// The definition's previous content (including its occurrences) was
  /// discarded; new content is reported through `OccurrenceAdded` events.
  DefinitionReplaced { def: DefId, removed: Vec<OccId> },
  DefinitionRemoved { def: DefId, removed: Vec<OccId> },
}

#[derive(Debug)]
pub struct NamespaceTree {
  groups: Vec<Group>,
  defs: Vec<Option<Definition>>,
  occs: Vec<Option<Occurrence>>,
  root: GroupId,
  prelude: Option<GroupId>,
  last_edited: Option<DefId>,
  pending_events: Vec<TreeEvent>,
}

impl Default for NamespaceTree {
  fn default() -> Self {
    Self::new()
  }
}

impl NamespaceTree {
  pub fn new() -> Self {
    let mut tree = NamespaceTree {
      groups: Vec::new(),
      defs: Vec::new(),
      occs: Vec::new(),
      root: GroupId(0),
      prelude: None,
      last_edited: None,
      pending_events: Vec::new(),
    };
    tree.root = tree.add_group(None, "");
    tree
  }

  pub fn root(&self) -> GroupId {
    self.root
  }

  /// The always-available prelude group, if one was installed.
  pub fn prelude(&self) -> Option<GroupId> {
    self.prelude
  }

  pub fn set_prelude(&mut self, group: GroupId) {
    self.prelude = Some(group);
  }

  /// Most recently edited definition, used by smart-mode scheduling.
  pub fn last_edited(&self) -> Option<DefId> {
    self.last_edited
  }

  pub fn clear_last_edited(&mut self) {
    self.last_edited = None;
  }

  /// Drain the edit events accumulated since the last call.
  pub fn take_events(&mut self) -> Vec<TreeEvent> {
    std::mem::take(&mut self.pending_events)
  }

  pub fn group(&self, id: GroupId) -> &Group {
    &self.groups[id.0 as usize]
  }

  fn group_mut(&mut self, id: GroupId) -> &mut Group {
    &mut self.groups[id.0 as usize]
  }

  pub fn def(&self, id: DefId) -> Option<&Definition> {
    self.defs.get(id.0 as usize).and_then(|slot| slot.as_ref())
  }

  pub fn def_mut(&mut self, id: DefId) -> Option<&mut Definition> {
    self.defs.get_mut(id.0 as usize).and_then(|slot| slot.as_mut())
  }

  pub fn occ(&self, id: OccId) -> Option<&Occurrence> {
    self.occs.get(id.0 as usize).and_then(|slot| slot.as_ref())
  }

  /// All live definitions, in id order.
  pub fn all_defs(&self) -> impl Iterator<Item = &Definition> {
    self.defs.iter().filter_map(|slot| slot.as_ref())
  }

  // Construction.

  pub fn add_group(&mut self, parent: Option<GroupId>, name: &str) -> GroupId {
    let id = GroupId(self.groups.len() as u32);
    self.groups.push(Group {
      id,
      name: name.to_string(),
      parent,
      owner_def: None,
      defs: Vec::new(),
      subgroups: Vec::new(),
      commands: Vec::new(),
      occs: Vec::new(),
    });
    if let Some(parent) = parent {
      self.group_mut(parent).subgroups.push(id);
    }
    id
  }

  pub fn add_def(
    &mut self,
    group: GroupId,
    parent: Option<DefId>,
    name: &str,
    kind: DefKind,
    span: Span,
    name_range: TextRange,
  ) -> DefId {
    let id = DefId(self.defs.len() as u32);
    self.defs.push(Some(Definition {
      id,
      name: name.to_string(),
      name_range,
      kind,
      params: Vec::new(),
      result_type: None,
      term: None,
      span,
      group,
      parent,
      children: Vec::new(),
      subgroup: None,
      occs: Vec::new(),
      last_deps: None,
      check_status: CheckStatus::NotChecked,
    }));
    match parent {
      Some(parent) => {
        if let Some(parent) = self.def_mut(parent) {
          parent.children.push(id);
        }
      }
      None => self.group_mut(group).defs.push(id),
    }
    id
  }

  /// Create a module definition together with the group it owns.
  pub fn add_module(
    &mut self,
    group: GroupId,
    name: &str,
    span: Span,
    name_range: TextRange,
  ) -> (DefId, GroupId) {
    let def = self.add_def(group, None, name, DefKind::Module, span, name_range);
    let subgroup = self.add_group(Some(group), name);
    self.group_mut(subgroup).owner_def = Some(def);
    if let Some(data) = self.def_mut(def) {
      data.subgroup = Some(subgroup);
    }
    (def, subgroup)
  }

  pub fn add_occurrence(
    &mut self,
    owner: OccOwner,
    segments: Vec<String>,
    segment_ranges: Vec<TextRange>,
    span: Span,
    role: Option<OperatorRole>,
  ) -> OccId {
    debug_assert_eq!(segments.len(), segment_ranges.len());
    let id = OccId(self.occs.len() as u32);
    self.occs.push(Some(Occurrence {
      id,
      segments,
      segment_ranges,
      span,
      role,
      owner,
    }));
    match owner {
      OccOwner::Def(def) => {
        if let Some(def) = self.def_mut(def) {
          def.occs.push(id);
        }
      }
      OccOwner::Group(group) => self.group_mut(group).occs.push(id),
    }
    self.pending_events.push(TreeEvent::OccurrenceAdded { occ: id, owner });
    id
  }

  pub fn add_param(&mut self, def: DefId, param: Param) {
    if let Some(def) = self.def_mut(def) {
      def.params.push(param);
    }
  }

  pub fn set_term(&mut self, def: DefId, term: Term) {
    if let Some(def) = self.def_mut(def) {
      def.term = Some(term);
    }
  }

  pub fn set_result_type(&mut self, def: DefId, term: Term) {
    if let Some(def) = self.def_mut(def) {
      def.result_type = Some(term);
    }
  }

  pub fn add_command(&mut self, group: GroupId, command: NamespaceCommand) {
    self.group_mut(group).commands.push(command);
  }

  // Analysis state, written by the resolver / typechecker respectively.

  pub fn set_last_deps(&mut self, def: DefId, deps: BTreeSet<DefId>) {
    if let Some(def) = self.def_mut(def) {
      def.last_deps = Some(deps);
    }
  }

  pub fn set_check_status(&mut self, def: DefId, status: CheckStatus) {
    if let Some(def) = self.def_mut(def) {
      def.check_status = status;
    }
  }

  // Edit operations.

  /// Remove a single occurrence. Removing an occurrence that is already gone
  /// is a no-op.
  pub fn remove_occurrence(&mut self, occ: OccId) {
    let Some(data) = self.occs.get_mut(occ.0 as usize).and_then(|slot| slot.take()) else {
      return;
    };
    self.detach_occ(occ, data.owner);
    self
      .pending_events
      .push(TreeEvent::OccurrenceRemoved { occ, owner: data.owner });
  }

  /// Remove every live occurrence with an id in `[first, last]` that shares
  /// the first live occurrence's owner, in tree order.
  pub fn remove_occurrence_range(&mut self, first: OccId, last: OccId) {
    let mut owner = None;
    let mut removed = Vec::new();
    for raw in first.0..=last.0 {
      let id = OccId(raw);
      let Some(data) = self.occ(id) else { continue };
      let occ_owner = data.owner;
      match owner {
        None => owner = Some(occ_owner),
        Some(owner) if owner != occ_owner => continue,
        _ => {}
      }
      self.occs[raw as usize] = None;
      self.detach_occ(id, occ_owner);
      removed.push(id);
    }
    if let Some(owner) = owner {
      if !removed.is_empty() {
        self
          .pending_events
          .push(TreeEvent::RangeRemoved { occs: removed, owner });
      }
    }
  }

  /// Discard a definition's content (parameters, body, occurrences, and
  /// sub-definitions) ahead of re-parsing it. The definition keeps its id and
  /// becomes the last-edited definition; callers rebuild its content through
  /// the normal construction methods.
  pub fn strip_definition(&mut self, def: DefId) -> Result<Vec<OccId>, TreeError> {
    if self.def(def).is_none() {
      return Err(TreeError::StaleDef(def));
    }
    let mut removed = Vec::new();
    let children = self.def(def).map(|d| d.children.clone()).unwrap_or_default();
    for child in children {
      self.discard_definition(child, &mut removed);
    }
    self.remove_def_occs(def, &mut removed);
    if let Some(data) = self.def_mut(def) {
      data.params.clear();
      data.result_type = None;
      data.term = None;
      data.children.clear();
      data.check_status = CheckStatus::NotChecked;
    }
    self.last_edited = Some(def);
    self
      .pending_events
      .push(TreeEvent::DefinitionReplaced { def, removed: removed.clone() });
    Ok(removed)
  }

  /// Delete a definition (and everything it contains) from the tree.
  pub fn remove_definition(&mut self, def: DefId) -> Result<Vec<OccId>, TreeError> {
    let Some(data) = self.def(def) else {
      return Err(TreeError::StaleDef(def));
    };
    let group = data.group;
    let parent = data.parent;
    let mut removed = Vec::new();
    self.discard_definition(def, &mut removed);
    match parent {
      Some(parent) => {
        if let Some(parent) = self.def_mut(parent) {
          parent.children.retain(|child| *child != def);
        }
      }
      None => self.group_mut(group).defs.retain(|member| *member != def),
    }
    self
      .pending_events
      .push(TreeEvent::DefinitionRemoved { def, removed: removed.clone() });
    Ok(removed)
  }

  fn discard_definition(&mut self, def: DefId, removed: &mut Vec<OccId>) {
    let Some(data) = self.def(def) else { return };
    let children = data.children.clone();
    let subgroup = data.subgroup;
    for child in children {
      self.discard_definition(child, removed);
    }
    if let Some(subgroup) = subgroup {
      let members = self.group(subgroup).defs.clone();
      for member in members {
        self.discard_definition(member, removed);
      }
      self.group_mut(subgroup).defs.clear();
    }
    self.remove_def_occs(def, removed);
    if self.last_edited == Some(def) {
      self.last_edited = None;
    }
    self.defs[def.0 as usize] = None;
  }

  fn remove_def_occs(&mut self, def: DefId, removed: &mut Vec<OccId>) {
    let occs = self.def(def).map(|d| d.occs.clone()).unwrap_or_default();
    for occ in occs {
      if self.occs[occ.0 as usize].take().is_some() {
        removed.push(occ);
      }
    }
    if let Some(data) = self.def_mut(def) {
      data.occs.clear();
    }
  }

  fn detach_occ(&mut self, occ: OccId, owner: OccOwner) {
    match owner {
      OccOwner::Def(def) => {
        if let Some(def) = self.def_mut(def) {
          def.occs.retain(|o| *o != occ);
        }
      }
      OccOwner::Group(group) => self.group_mut(group).occs.retain(|o| *o != occ),
    }
  }

  // Queries.

  /// Dotted path of a definition from the namespace root.
  pub fn qualified_name(&self, def: DefId) -> QualifiedName {
    let mut segments = Vec::new();
    let Some(mut data) = self.def(def) else {
      return QualifiedName(segments);
    };
    segments.push(data.name.clone());
    while let Some(parent) = data.parent {
      let Some(parent) = self.def(parent) else { break };
      segments.push(parent.name.clone());
      data = parent;
    }
    let mut group = Some(data.group);
    while let Some(id) = group {
      let data = self.group(id);
      if !data.name.is_empty() {
        segments.push(data.name.clone());
      }
      group = data.parent;
    }
    segments.reverse();
    QualifiedName(segments)
  }

  /// Every definition transitively contained in a group, in declaration
  /// order, depth-first: a definition precedes its sub-definitions, which
  /// precede the contents of its module group.
  pub fn definitions_in_group(&self, group: GroupId) -> Vec<DefId> {
    let mut out = Vec::new();
    self.collect_group(group, &mut out);
    out
  }

  fn collect_group(&self, group: GroupId, out: &mut Vec<DefId>) {
    let data = self.group(group);
    for def in &data.defs {
      self.collect_def(*def, out);
    }
    for sub in &data.subgroups {
      if self.group(*sub).owner_def.is_none() {
        self.collect_group(*sub, out);
      }
    }
  }

  fn collect_def(&self, def: DefId, out: &mut Vec<DefId>) {
    let Some(data) = self.def(def) else { return };
    out.push(def);
    for child in &data.children {
      self.collect_def(*child, out);
    }
    if let Some(subgroup) = data.subgroup {
      self.collect_group(subgroup, out);
    }
  }
}
