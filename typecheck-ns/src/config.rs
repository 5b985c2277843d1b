use serde::Deserialize;
use serde::Serialize;
use std::time::Duration;

/// How much checking an analysis cycle performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypecheckingMode {
  /// Full, dependency-aware checking with the last-edited definition first.
  Smart,
  /// Structural checks only, for every definition.
  Dumb,
  /// No checking at all; resolution still runs.
  Off,
}

/// Read-only configuration for the pass orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckerConfig {
  pub mode: TypecheckingMode,
  /// Wall-clock budget per definition; exceeding it blacklists the
  /// definition.
  pub time_budget: Duration,
  /// Restart the cycle automatically when a non-last definition times out.
  pub auto_retry: bool,
}

impl Default for CheckerConfig {
  fn default() -> Self {
    CheckerConfig {
      mode: TypecheckingMode::Smart,
      time_budget: Duration::from_secs(5),
      auto_retry: true,
    }
  }
}
