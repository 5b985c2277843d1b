//! Incremental name resolution over a namespace tree.
//!
//! Three pieces cooperate here:
//!
//! - the [`ResolveCache`], mapping reference occurrences to the definitions
//!   they currently resolve to, kept consistent with tree edits through
//!   synchronous invalidation;
//! - the scope model ([`scope`]), layering local bindings over group
//!   namespaces, namespace commands, and the prelude;
//! - the resolver ([`resolve_group`]), which walks a group's definitions in
//!   declaration order, resolves every qualified or operator reference,
//!   reports each result to a [`ResolutionListener`], and computes the set of
//!   definitions whose resolution changed since the previous pass.
//!
//! The resolver never decides what to do about a dirty definition; that is
//! the orchestrator's job downstream.

pub mod cache;
pub mod cancel;
pub mod event;
pub mod resolver;
pub mod scope;

pub use cache::is_dirtying_change;
pub use cache::ResolveCache;
pub use cache::ResolvedTarget;
pub use cancel::CancelToken;
pub use event::CollectListener;
pub use event::NullListener;
pub use event::ResolutionEvent;
pub use event::ResolutionListener;
pub use resolver::resolve_group;
pub use resolver::ResolveOutcome;
pub use scope::Binding;
pub use scope::Lookup;
pub use scope::Namespace;
pub use scope::Scope;
