//! Layered lexical scopes over the namespace tree.
//!
//! A scope is a stack of group frames (outermost first) with a stack of local
//! binding frames on top. Locals shadow namespace bindings; within one group
//! frame, the group's own declarations shadow anything brought in by its
//! namespace commands. Two imported bindings of the same name collide into
//! [`Binding::Ambiguous`] unless they denote the same definition.
//!
//! A group's namespace is built from all of its member declarations before
//! any body is resolved, so references to later declarations in the same
//! group resolve (forward references).

use ahash::HashMap;
use ahash::HashMapExt;
use hir_ns::DefId;
use hir_ns::DefKind;
use hir_ns::GroupId;
use hir_ns::NamespaceTree;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
  Def(DefId),
  /// More than one distinct definition claims the name.
  Ambiguous,
}

/// A flat name → binding mapping.
#[derive(Debug, Default, Clone)]
pub struct Namespace {
  names: HashMap<String, Binding>,
}

impl Namespace {
  pub fn new() -> Self {
    Namespace {
      names: HashMap::new(),
    }
  }

  /// Add a binding; a second distinct definition under the same name makes
  /// the name ambiguous. Order-independent.
  pub fn bind(&mut self, name: &str, def: DefId) {
    match self.names.get(name) {
      None => {
        self.names.insert(name.to_string(), Binding::Def(def));
      }
      Some(Binding::Def(existing)) if *existing == def => {}
      Some(_) => {
        self.names.insert(name.to_string(), Binding::Ambiguous);
      }
    }
  }

  /// Import an already-ambiguous name; it stays ambiguous here.
  pub fn merge_ambiguous(&mut self, name: &str) {
    self.names.insert(name.to_string(), Binding::Ambiguous);
  }

  pub fn get(&self, name: &str) -> Option<Binding> {
    self.names.get(name).copied()
  }

  pub fn is_empty(&self) -> bool {
    self.names.is_empty()
  }

  /// Iterate bindings in unspecified order. Callers needing determinism must
  /// sort; [`Namespace::bind`] itself is order-independent.
  pub fn iter(&self) -> impl Iterator<Item = (&str, Binding)> {
    self.names.iter().map(|(name, binding)| (name.as_str(), *binding))
  }
}

/// Names a group itself exposes: its member declarations, with data
/// constructors additionally visible alongside their data definition.
pub fn group_own_namespace(tree: &NamespaceTree, group: GroupId) -> Namespace {
  let mut ns = Namespace::new();
  for def in &tree.group(group).defs {
    bind_def_and_constructors(tree, &mut ns, *def);
  }
  ns
}

fn bind_def_and_constructors(tree: &NamespaceTree, ns: &mut Namespace, def: DefId) {
  let Some(data) = tree.def(def) else { return };
  ns.bind(&data.name, def);
  if data.kind == DefKind::Data {
    for child in &data.children {
      if let Some(child_data) = tree.def(*child) {
        if child_data.kind == DefKind::Constructor {
          ns.bind(&child_data.name, *child);
        }
      }
    }
  }
}

/// The namespace a qualified path descends into after resolving a segment to
/// `def`: module members, data constructors, or class fields.
pub fn def_namespace(tree: &NamespaceTree, def: DefId) -> Namespace {
  let mut ns = Namespace::new();
  let Some(data) = tree.def(def) else { return ns };
  match data.kind {
    DefKind::Module => {
      if let Some(subgroup) = data.subgroup {
        ns = group_own_namespace(tree, subgroup);
      }
    }
    DefKind::Data | DefKind::Class => {
      for child in &data.children {
        if let Some(child_data) = tree.def(*child) {
          ns.bind(&child_data.name, *child);
        }
      }
    }
    _ => {}
  }
  ns
}

/// One group layer of the scope: own declarations shadow imported ones.
#[derive(Debug, Default)]
pub struct Frame {
  pub own: Namespace,
  pub imported: Namespace,
}

impl Frame {
  pub fn for_group(tree: &NamespaceTree, group: GroupId) -> Frame {
    Frame {
      own: group_own_namespace(tree, group),
      imported: Namespace::new(),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
  /// A local binding (parameter, pattern variable, let).
  Local,
  Def(DefId),
  Ambiguous,
  NotFound,
}

/// Scope stack used while resolving one group.
#[derive(Debug, Default)]
pub struct Scope {
  frames: Vec<Frame>,
  locals: Vec<Vec<String>>,
}

impl Scope {
  /// Fresh scope with the always-available prelude at the bottom, if the
  /// tree has one.
  pub fn new(tree: &NamespaceTree) -> Scope {
    let mut scope = Scope::default();
    if let Some(prelude) = tree.prelude() {
      scope.push_frame(Frame::for_group(tree, prelude));
    }
    scope
  }

  pub fn push_frame(&mut self, frame: Frame) {
    self.frames.push(frame);
  }

  pub fn pop_frame(&mut self) {
    self.frames.pop();
  }

  /// The innermost frame's import layer, where namespace-command results are
  /// accumulated.
  pub fn imported_mut(&mut self) -> Option<&mut Namespace> {
    self.frames.last_mut().map(|frame| &mut frame.imported)
  }

  pub fn push_locals(&mut self, names: Vec<String>) {
    self.locals.push(names);
  }

  pub fn pop_locals(&mut self) {
    self.locals.pop();
  }

  /// Strictly lexical lookup: local frames innermost-first, then group
  /// frames innermost-first, own declarations before imports within each.
  pub fn lookup(&self, name: &str) -> Lookup {
    for frame in self.locals.iter().rev() {
      if frame.iter().any(|local| local == name) {
        return Lookup::Local;
      }
    }
    for frame in self.frames.iter().rev() {
      if let Some(binding) = frame.own.get(name) {
        return binding.into();
      }
      if let Some(binding) = frame.imported.get(name) {
        return binding.into();
      }
    }
    Lookup::NotFound
  }
}

impl From<Binding> for Lookup {
  fn from(binding: Binding) -> Lookup {
    match binding {
      Binding::Def(def) => Lookup::Def(def),
      Binding::Ambiguous => Lookup::Ambiguous,
    }
  }
}
