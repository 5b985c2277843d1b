use crate::render::SourceProvider;
use crate::FileId;
use std::sync::Arc;

/// A minimal in-memory store of module names and source text for rendering
/// diagnostics in tests and harnesses without a custom [`SourceProvider`]
/// implementation.
///
/// `FileId`s are allocated deterministically in insertion order starting from
/// zero. Source text is stored in `Arc<str>` to make cloning cheap.
#[derive(Clone, Debug, Default)]
pub struct SimpleFiles {
  files: Vec<SimpleFile>,
}

#[derive(Clone, Debug)]
struct SimpleFile {
  name: Arc<str>,
  text: Arc<str>,
}

impl SimpleFiles {
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds a new file and returns its [`FileId`]. The id is monotonically
  /// increasing and stable for the lifetime of this instance.
  pub fn add(&mut self, name: impl Into<Arc<str>>, text: impl Into<Arc<str>>) -> FileId {
    assert!(self.files.len() < u32::MAX as usize, "file count overflow");
    let file = FileId(self.files.len() as u32);
    self.files.push(SimpleFile {
      name: name.into(),
      text: text.into(),
    });
    file
  }

  /// Replaces the text of an existing file, returning the previous text if
  /// the file existed.
  pub fn set_text(&mut self, file: FileId, text: impl Into<Arc<str>>) -> Option<Arc<str>> {
    let entry = self.files.get_mut(file.0 as usize)?;
    Some(std::mem::replace(&mut entry.text, text.into()))
  }

  pub fn name(&self, file: FileId) -> Option<&str> {
    self.files.get(file.0 as usize).map(|f| f.name.as_ref())
  }

  pub fn text(&self, file: FileId) -> Option<&str> {
    self.files.get(file.0 as usize).map(|f| f.text.as_ref())
  }

  pub fn len(&self) -> usize {
    self.files.len()
  }

  pub fn is_empty(&self) -> bool {
    self.files.is_empty()
  }
}

impl SourceProvider for SimpleFiles {
  fn file_name(&self, file: FileId) -> &str {
    self.name(file).unwrap_or("<unknown>")
  }

  fn file_text(&self, file: FileId) -> &str {
    self.text(file).unwrap_or("")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ids_are_stable_and_text_replaceable() {
    let mut files = SimpleFiles::new();
    let a = files.add("A", "\\func a => 1");
    let b = files.add("B", "\\func b => 2");
    assert_eq!(a, FileId(0));
    assert_eq!(b, FileId(1));

    let old = files.set_text(a, "\\func a => 2").unwrap();
    assert_eq!(old.as_ref(), "\\func a => 1");
    assert_eq!(files.text(a), Some("\\func a => 2"));
    assert_eq!(files.set_text(FileId(7), "x"), None);
  }
}
