//! The pass orchestrator.
//!
//! A [`Session`] owns the reference cache, the blacklist, and the checker
//! configuration for one namespace tree, and sequences resolve → desugar →
//! check for each edit-triggered analysis cycle. Overlapping requests for
//! the same subtree supersede: starting a cycle cancels the previous cycle's
//! token rather than queueing behind it.
//!
//! Smart mode checks the most recently edited definition first, as the
//! most likely source of a fix or a new break. Only if it verifies cleanly
//! does the rest of the batch get full checks, in dependency order;
//! otherwise the rest degrades to structural checks. A timeout of a non-last
//! definition makes the remaining budget unreliable, so the whole subtree
//! pass is rescheduled (and rerun immediately when `auto_retry` is set; each
//! rerun skips the now-blacklisted offender, so the loop terminates).

use crate::blacklist::Blacklist;
use crate::checker::BackgroundTypechecker;
use crate::checker::CheckOutcome;
use crate::config::CheckerConfig;
use crate::config::TypecheckingMode;
use crate::desugar::dep_state;
use crate::desugar::desugar;
use crate::dumb::dumb_check;
use crate::error::FatalError;
use crate::event::CheckEvent;
use crate::event::CheckOutcomeKind;
use crate::kernel::Kernel;
use crate::kernel::StructuralKernel;
use crate::query_span::pass_span;
use crate::query_span::PassSpan;
use ahash::HashMap;
use ahash::HashMapExt;
use diagnostics::Diagnostic;
use hir_ns::CheckStatus;
use hir_ns::DefId;
use hir_ns::DefKind;
use hir_ns::GroupId;
use hir_ns::NamespaceTree;
use hir_ns::OccOwner;
use hir_ns::TreeEvent;
use parking_lot::Mutex;
use resolve_ns::resolve_group;
use resolve_ns::CancelToken;
use resolve_ns::ResolutionListener;
use resolve_ns::ResolveCache;
use std::collections::BTreeSet;
use std::sync::Arc;

pub(crate) const CODE_INTERRUPTED: &str = "CHK0001";

/// Result of one call to [`Session::analyze`].
#[derive(Debug, Default)]
pub struct AnalysisReport {
  /// The cycle's full diagnostic set (resolution and checking); replaces any
  /// previously stored set for the subtree. Timeout warnings survive
  /// automatic restarts.
  pub diagnostics: Vec<Diagnostic>,
  pub check_events: Vec<CheckEvent>,
  /// The cycle was cancelled; cache state for unprocessed definitions is
  /// untouched and a fresh cycle is expected to follow.
  pub cancelled: bool,
  /// Automatic whole-subtree restarts performed after non-last timeouts.
  pub restarts: u32,
  /// Definitions fully processed in the final cycle.
  pub progress: u32,
}

#[derive(Default)]
struct CycleResult {
  diagnostics: Vec<Diagnostic>,
  events: Vec<CheckEvent>,
  cancelled: bool,
  progress: u32,
  restart: bool,
}

enum StepResult {
  Cancelled,
  Ok,
  Errors,
  TimedOut,
}

pub struct Session {
  cache: ResolveCache,
  blacklist: Arc<Blacklist>,
  config: CheckerConfig,
  kernel: Arc<dyn Kernel>,
  active: Mutex<HashMap<GroupId, CancelToken>>,
}

impl Session {
  pub fn new(config: CheckerConfig) -> Session {
    Session::with_kernel(config, Arc::new(StructuralKernel))
  }

  pub fn with_kernel(config: CheckerConfig, kernel: Arc<dyn Kernel>) -> Session {
    Session {
      cache: ResolveCache::new(),
      blacklist: Arc::new(Blacklist::new()),
      config,
      kernel,
      active: Mutex::new(HashMap::new()),
    }
  }

  pub fn cache(&self) -> &ResolveCache {
    &self.cache
  }

  pub fn blacklist(&self) -> &Blacklist {
    &self.blacklist
  }

  pub fn config(&self) -> CheckerConfig {
    self.config
  }

  /// Drain pending tree-edit events: cache entries for removed occurrences
  /// are invalidated and edited definitions drop their verified status. Must
  /// run before the edited tree is read; [`Session::analyze`] also drains
  /// defensively.
  pub fn apply_edits(&self, tree: &mut NamespaceTree) {
    for event in tree.take_events() {
      self.cache.apply_tree_event(&event);
      match &event {
        TreeEvent::OccurrenceAdded { owner: OccOwner::Def(def), .. }
        | TreeEvent::OccurrenceRemoved { owner: OccOwner::Def(def), .. }
        | TreeEvent::RangeRemoved { owner: OccOwner::Def(def), .. } => {
          tree.set_check_status(*def, CheckStatus::NotChecked);
        }
        _ => {}
      }
    }
  }

  /// Cancel the in-flight cycle for a subtree, if any.
  pub fn cancel_group(&self, group: GroupId) {
    if let Some(token) = self.active.lock().get(&group) {
      token.cancel();
    }
  }

  /// Run one edit-triggered analysis cycle over a namespace subtree:
  /// resolution always, then checking per the configured mode.
  pub fn analyze(
    &self,
    tree: &mut NamespaceTree,
    group: GroupId,
    listener: &mut dyn ResolutionListener,
  ) -> AnalysisReport {
    self.apply_edits(tree);

    let cancel = CancelToken::new();
    if let Some(previous) = self.active.lock().insert(group, cancel.clone()) {
      previous.cancel();
    }

    let mut report = AnalysisReport::default();
    let mut warnings: Vec<Diagnostic> = Vec::new();
    loop {
      let cycle = self.run_cycle(tree, group, listener, &cancel);
      warnings.extend(
        cycle
          .diagnostics
          .iter()
          .filter(|diag| diag.code == CODE_INTERRUPTED)
          .cloned(),
      );
      report.diagnostics = cycle.diagnostics;
      report.check_events.extend(cycle.events);
      report.cancelled = cycle.cancelled;
      report.progress = cycle.progress;
      if cycle.restart && self.config.auto_retry && !cycle.cancelled {
        report.restarts += 1;
        continue;
      }
      break;
    }
    for warning in warnings {
      if !report.diagnostics.contains(&warning) {
        report.diagnostics.push(warning);
      }
    }
    report
  }

  fn run_cycle(
    &self,
    tree: &mut NamespaceTree,
    group: GroupId,
    listener: &mut dyn ResolutionListener,
    cancel: &CancelToken,
  ) -> CycleResult {
    let mut cycle = CycleResult::default();

    let span = PassSpan::enter(pass_span!(
      "typecheck_ns.resolve",
      group.0,
      tracing::field::Empty
    ));
    let resolution = resolve_group(tree, &self.cache, group, listener, cancel);
    if let Some(span) = span {
      span.finish();
    }
    cycle.diagnostics.extend(resolution.diagnostics);
    if resolution.cancelled {
      cycle.cancelled = true;
      return cycle;
    }
    for def in &resolution.dirty {
      tree.set_check_status(*def, CheckStatus::NotChecked);
    }

    if self.config.mode == TypecheckingMode::Off {
      return cycle;
    }

    let mut full = Vec::new();
    let mut structural = Vec::new();
    for def_id in tree.definitions_in_group(group) {
      let Some(def) = tree.def(def_id) else { continue };
      if matches!(
        def.kind,
        DefKind::Module | DefKind::Constructor | DefKind::Field
      ) {
        continue;
      }
      if def.check_status == CheckStatus::Ok {
        continue;
      }
      if self.blacklist.is_blacklisted(def_id) {
        structural.push(def_id);
      } else {
        full.push(def_id);
      }
    }
    let total = (full.len() + structural.len()) as u32;

    match self.config.mode {
      TypecheckingMode::Off => {}
      TypecheckingMode::Dumb => {
        for def in full.into_iter().chain(structural) {
          if cancel.is_cancelled() {
            cycle.cancelled = true;
            return cycle;
          }
          self.dumb_one(tree, def, total, &mut cycle);
        }
      }
      TypecheckingMode::Smart => {
        let batch = topo_order(tree, &full);
        let restart = self.smart_batch(tree, group, batch, total, cancel, &mut cycle);
        if cycle.cancelled {
          return cycle;
        }
        for def in structural {
          if cancel.is_cancelled() {
            cycle.cancelled = true;
            return cycle;
          }
          self.dumb_one(tree, def, total, &mut cycle);
        }
        if restart {
          cycle.events.push(CheckEvent::Rescheduled { group });
          cycle.restart = true;
        } else if total > 0 {
          cycle.events.push(CheckEvent::ResultsReady { group });
        }
      }
    }
    cycle
  }

  /// Smart-mode batch: last-edited definition first, the rest fully checked
  /// only if it verified cleanly. Returns whether the pass must be rerun.
  fn smart_batch(
    &self,
    tree: &mut NamespaceTree,
    group: GroupId,
    mut batch: Vec<DefId>,
    total: u32,
    cancel: &CancelToken,
    cycle: &mut CycleResult,
  ) -> bool {
    let checker = BackgroundTypechecker::new(
      Arc::clone(&self.kernel),
      Arc::clone(&self.blacklist),
      self.config.time_budget,
    );

    let mut restart = false;
    let last_edited = tree.last_edited().filter(|def| batch.contains(def));
    if let Some(le) = last_edited {
      batch.retain(|def| *def != le);
      match self.check_one(tree, group, &checker, le, total, cancel, cycle) {
        StepResult::Cancelled => return false,
        StepResult::Ok => {
          tree.clear_last_edited();
        }
        StepResult::TimedOut => {
          restart = !batch.is_empty();
          self.dumb_rest(tree, batch, total, cancel, cycle);
          return restart;
        }
        StepResult::Errors => {
          // The freshest edit is still broken; cascading full checks of
          // everything else would be wasted work.
          self.dumb_rest(tree, batch, total, cancel, cycle);
          return false;
        }
      }
    }

    let count = batch.len();
    for (idx, def) in batch.iter().enumerate() {
      if cancel.is_cancelled() {
        cycle.cancelled = true;
        return restart;
      }
      match self.check_one(tree, group, &checker, *def, total, cancel, cycle) {
        StepResult::Cancelled => return restart,
        StepResult::TimedOut => {
          if idx + 1 < count {
            restart = true;
          }
        }
        StepResult::Ok | StepResult::Errors => {}
      }
    }
    restart
  }

  fn dumb_rest(
    &self,
    tree: &mut NamespaceTree,
    batch: Vec<DefId>,
    total: u32,
    cancel: &CancelToken,
    cycle: &mut CycleResult,
  ) {
    for def in batch {
      if cancel.is_cancelled() {
        cycle.cancelled = true;
        return;
      }
      self.dumb_one(tree, def, total, cycle);
    }
  }

  fn check_one(
    &self,
    tree: &mut NamespaceTree,
    group: GroupId,
    checker: &BackgroundTypechecker,
    def_id: DefId,
    total: u32,
    cancel: &CancelToken,
    cycle: &mut CycleResult,
  ) -> StepResult {
    let Some(desugared) = desugar(tree, &self.cache, def_id) else {
      return StepResult::Ok;
    };
    let span = PassSpan::enter(pass_span!("typecheck_ns.check_def", group.0, def_id.0));
    let deps = Arc::new(dep_state(tree));
    let result = checker.check_definition(Arc::new(desugared), deps, cancel);
    if let Some(span) = span {
      span.finish();
    }
    match result {
      Err(FatalError::Cancelled) => {
        cycle.cancelled = true;
        StepResult::Cancelled
      }
      Err(FatalError::Ice(ice)) => {
        cycle.diagnostics.push(Diagnostic::error(
          "ICE0001",
          format!("internal error: {}", ice.message),
          tree.def(def_id).map(|d| d.span).unwrap_or(diagnostics::Span::new(
            diagnostics::FileId(0),
            diagnostics::TextRange::new(0, 0),
          )),
        ));
        self.finish_def(tree, def_id, CheckStatus::HasErrors, total, cycle);
        cycle.events.push(CheckEvent::DefinitionChecked {
          def: def_id,
          outcome: CheckOutcomeKind::Errors,
        });
        StepResult::Errors
      }
      Ok(CheckOutcome::Ok) => {
        self.finish_def(tree, def_id, CheckStatus::Ok, total, cycle);
        cycle.events.push(CheckEvent::DefinitionChecked {
          def: def_id,
          outcome: CheckOutcomeKind::Ok,
        });
        StepResult::Ok
      }
      Ok(CheckOutcome::Errors(diagnostics)) => {
        cycle.diagnostics.extend(diagnostics);
        self.finish_def(tree, def_id, CheckStatus::HasErrors, total, cycle);
        cycle.events.push(CheckEvent::DefinitionChecked {
          def: def_id,
          outcome: CheckOutcomeKind::Errors,
        });
        StepResult::Errors
      }
      Ok(CheckOutcome::TimedOut) => {
        let name = tree.qualified_name(def_id);
        let span = tree.def(def_id).map(|d| d.span).unwrap_or(diagnostics::Span::new(
          diagnostics::FileId(0),
          diagnostics::TextRange::new(0, 0),
        ));
        cycle.diagnostics.push(Diagnostic::warning(
          CODE_INTERRUPTED,
          format!(
            "typechecking of '{}' was interrupted after {:.1} second(s)",
            name,
            self.config.time_budget.as_secs_f64()
          ),
          span,
        ));
        self.finish_def(tree, def_id, CheckStatus::TimedOut, total, cycle);
        cycle.events.push(CheckEvent::TimedOut { def: def_id, name });
        StepResult::TimedOut
      }
    }
  }

  fn finish_def(
    &self,
    tree: &mut NamespaceTree,
    def_id: DefId,
    status: CheckStatus,
    total: u32,
    cycle: &mut CycleResult,
  ) {
    tree.set_check_status(def_id, status);
    cycle.progress += 1;
    cycle.events.push(CheckEvent::Progress {
      completed: cycle.progress,
      total,
    });
  }

  /// Structural check only; never updates the verified status.
  fn dumb_one(&self, tree: &mut NamespaceTree, def_id: DefId, total: u32, cycle: &mut CycleResult) {
    let Some(desugared) = desugar(tree, &self.cache, def_id) else {
      return;
    };
    let diagnostics = dumb_check(tree, &self.cache, &desugared);
    cycle.diagnostics.extend(diagnostics);
    cycle.events.push(CheckEvent::DumbChecked { def: def_id });
    cycle.progress += 1;
    cycle.events.push(CheckEvent::Progress {
      completed: cycle.progress,
      total,
    });
  }
}

/// Order a batch so that a definition follows its in-batch dependencies.
/// Declaration order is preserved between independent definitions; cycles
/// degrade gracefully to visitation order.
fn topo_order(tree: &NamespaceTree, batch: &[DefId]) -> Vec<DefId> {
  let in_batch: BTreeSet<DefId> = batch.iter().copied().collect();
  let mut visited: BTreeSet<DefId> = BTreeSet::new();
  let mut order = Vec::with_capacity(batch.len());
  for &def in batch {
    visit(tree, def, &in_batch, &mut visited, &mut order);
  }
  order
}

fn visit(
  tree: &NamespaceTree,
  def: DefId,
  in_batch: &BTreeSet<DefId>,
  visited: &mut BTreeSet<DefId>,
  order: &mut Vec<DefId>,
) {
  if !in_batch.contains(&def) || !visited.insert(def) {
    return;
  }
  if let Some(data) = tree.def(def) {
    if let Some(deps) = &data.last_deps {
      for &dep in deps {
        visit(tree, dep, in_batch, visited, order);
      }
    }
  }
  order.push(def);
}
