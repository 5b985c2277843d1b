use serde::Deserialize;
use serde::Serialize;
use std::fmt::Display;
use std::fmt::Formatter;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DefId(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OccId(pub u32);

impl Display for GroupId {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl Display for DefId {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl Display for OccId {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// What a definition is, as declared in the surface syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DefKind {
  Function,
  Data,
  Constructor,
  Class,
  Field,
  Instance,
  Module,
}

/// Verification state of a definition, owned by the typechecking stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckStatus {
  /// Never checked, or invalidated by an edit / dependency change.
  NotChecked,
  Ok,
  HasErrors,
  TimedOut,
}

impl CheckStatus {
  pub fn is_verified(&self) -> bool {
    matches!(self, CheckStatus::Ok)
  }
}

/// Role an occurrence plays when it names an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperatorRole {
  Infix,
  Postfix,
}

/// Dotted path of name segments from the namespace root to a definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QualifiedName(pub Vec<String>);

impl QualifiedName {
  pub fn last(&self) -> &str {
    self.0.last().map(|s| s.as_str()).unwrap_or("")
  }
}

impl Display for QualifiedName {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let mut first = true;
    for segment in &self.0 {
      if !first {
        f.write_str(".")?;
      }
      f.write_str(segment)?;
      first = false;
    }
    Ok(())
  }
}
