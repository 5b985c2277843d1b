//! Budgeted background typechecking over a resolved namespace tree.
//!
//! This crate is intentionally focused on robustness: the typechecking
//! kernel is treated as an opaque, cancellable, possibly-nonterminating
//! judgment, and the orchestration around it guarantees that no single
//! definition can hang or poison a whole analysis cycle. User-facing
//! failures become diagnostics, kernel panics become ICE diagnostics, and a
//! definition that exceeds its wall-clock budget is blacklisted and degraded
//! to structural checks until the entry is explicitly cleared.
//!
//! The [`Session`] type owns the sequencing: resolution first (via
//! `resolve-ns`), then, per the configured [`TypecheckingMode`], full
//! checks in dependency order, structural checks, or nothing.

mod blacklist;
mod checker;
mod config;
mod desugar;
mod dumb;
mod error;
mod event;
mod kernel;
mod query_span;
mod session;

pub use blacklist::Blacklist;
pub use blacklist::BlacklistEntry;
pub use checker::BackgroundTypechecker;
pub use checker::CheckOutcome;
pub use config::CheckerConfig;
pub use config::TypecheckingMode;
pub use desugar::dep_state;
pub use desugar::desugar;
pub use desugar::CoreBranch;
pub use desugar::CoreField;
pub use desugar::CoreParam;
pub use desugar::CoreRef;
pub use desugar::CoreTerm;
pub use desugar::DesugaredDef;
pub use dumb::dumb_check;
pub use error::FatalError;
pub use error::Ice;
pub use event::CheckEvent;
pub use event::CheckOutcomeKind;
pub use kernel::DepState;
pub use kernel::Kernel;
pub use kernel::KernelOutcome;
pub use kernel::StructuralKernel;
pub use resolve_ns::CancelToken;
pub use resolve_ns::ResolveCache;
pub use session::AnalysisReport;
pub use session::Session;
