//! Definition and namespace tree model for incremental semantic analysis.
//!
//! `hir-ns` owns the data the resolver and typechecker operate on: a
//! [`NamespaceTree`] of groups and definitions, surface [`Term`]s whose names
//! are opaque [`OccId`] occurrences, and the [`TreeEvent`] stream that tree
//! edits emit toward the reference cache. It knows nothing about resolution
//! or checking; those stages attach their results through the two analysis
//! fields on [`Definition`] (`last_deps`, `check_status`) and their own side
//! structures.
//!
//! Ids are plain `u32` newtypes assigned deterministically in allocation
//! order, so identical construction sequences produce identical trees.

pub mod builder;
pub mod ids;
pub mod term;
pub mod tree;

pub use builder::TreeBuilder;
pub use ids::CheckStatus;
pub use ids::DefId;
pub use ids::DefKind;
pub use ids::GroupId;
pub use ids::OccId;
pub use ids::OperatorRole;
pub use ids::QualifiedName;
pub use term::Clause;
pub use term::FieldImpl;
pub use term::Pattern;
pub use term::Term;
pub use tree::CommandKind;
pub use tree::Definition;
pub use tree::Group;
pub use tree::NamespaceCommand;
pub use tree::NamespaceTree;
pub use tree::OccOwner;
pub use tree::Occurrence;
pub use tree::Param;
pub use tree::Renaming;
pub use tree::TreeError;
pub use tree::TreeEvent;
