//! Plain-text rendering of diagnostics with caret highlighting.
//!
//! Output is deterministic: labels are ordered primary-first, then by file and
//! start offset, so snapshots of rendered diagnostics are stable across runs.

use crate::Diagnostic;
use crate::FileId;
use crate::Label;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Provides access to source text for rendering diagnostics.
pub trait SourceProvider {
  fn file_name(&self, file: FileId) -> &str;
  fn file_text(&self, file: FileId) -> &str;
}

/// Render a diagnostic into a human-readable string with caret highlighting.
pub fn render_diagnostic(provider: &dyn SourceProvider, diagnostic: &Diagnostic) -> String {
  let mut output = String::new();
  writeln!(
    output,
    "{}[{}]: {}",
    diagnostic.severity, diagnostic.code, diagnostic.message
  )
  .unwrap();

  let mut labels = Vec::with_capacity(diagnostic.labels.len() + 1);
  labels.push(Label {
    span: diagnostic.primary,
    message: diagnostic.message.clone(),
    is_primary: true,
  });
  labels.extend(diagnostic.labels.iter().cloned());
  labels.sort_by(|a, b| {
    b.is_primary
      .cmp(&a.is_primary)
      .then(a.span.file.cmp(&b.span.file))
      .then(a.span.range.start.cmp(&b.span.range.start))
      .then(a.span.range.end.cmp(&b.span.range.end))
      .then(a.message.cmp(&b.message))
  });

  let mut groups: Vec<(FileId, Vec<Label>)> = Vec::new();
  for label in labels {
    match groups.last_mut() {
      Some((file, group)) if *file == label.span.file => group.push(label),
      _ => groups.push((label.span.file, vec![label])),
    }
  }

  for (file, group) in &groups {
    render_file_group(provider, &mut output, *file, group);
  }

  for note in &diagnostic.notes {
    writeln!(output, "= note: {}", note).unwrap();
  }

  output
}

struct Highlight<'a> {
  start_col: usize,
  len: usize,
  marker: char,
  message: Option<&'a str>,
}

fn render_file_group(
  provider: &dyn SourceProvider,
  output: &mut String,
  file: FileId,
  labels: &[Label],
) {
  let name = provider.file_name(file);
  let text = provider.file_text(file);
  let lines = LineIndex::new(text);

  let first = &labels[0];
  let (line, col) = lines.position(first.span.range.start as usize);
  writeln!(output, " --> {}:{}:{}", name, line + 1, col + 1).unwrap();

  // One highlight per (line, label); the label's message lands on its first
  // visible line only.
  let mut per_line: BTreeMap<usize, Vec<Highlight<'_>>> = BTreeMap::new();
  for label in labels {
    let start = (label.span.range.start as usize).min(text.len());
    let end = (label.span.range.end as usize).clamp(start, text.len());
    let (start_line, start_col) = lines.position(start);
    let (end_line, end_col) = lines.position(end);
    let marker = if label.is_primary { '^' } else { '-' };
    for line_idx in start_line..=end_line {
      let (bounds_start, bounds_end) = lines.bounds(line_idx);
      let line_text = &text[bounds_start..bounds_end];
      let line_len = line_text.chars().count();
      let from = if line_idx == start_line { start_col } else { 0 };
      let to = if line_idx == end_line { end_col } else { line_len };
      per_line.entry(line_idx).or_default().push(Highlight {
        start_col: from,
        len: to.saturating_sub(from).max(1),
        marker,
        message: if line_idx == start_line && !label.message.is_empty() {
          Some(label.message.as_str())
        } else {
          None
        },
      });
    }
  }

  let gutter = per_line
    .keys()
    .last()
    .map(|idx| (idx + 1).to_string().len())
    .unwrap_or(1);

  writeln!(output, "{:>gutter$} |", "").unwrap();
  let mut prev: Option<usize> = None;
  for (line_idx, highlights) in &per_line {
    if let Some(prev) = prev {
      if *line_idx > prev + 1 {
        writeln!(output, "{:>gutter$} | ...", "").unwrap();
      }
    }
    let (bounds_start, bounds_end) = lines.bounds(*line_idx);
    writeln!(
      output,
      "{:>gutter$} | {}",
      line_idx + 1,
      &text[bounds_start..bounds_end]
    )
    .unwrap();
    for highlight in highlights {
      let mut row = String::new();
      write!(row, "{:>gutter$} | ", "").unwrap();
      row.push_str(&" ".repeat(highlight.start_col));
      row.extend(std::iter::repeat(highlight.marker).take(highlight.len));
      if let Some(message) = highlight.message {
        row.push(' ');
        row.push_str(message);
      }
      writeln!(output, "{}", row.trim_end()).unwrap();
    }
    prev = Some(*line_idx);
  }
}

struct LineIndex<'a> {
  text: &'a str,
  starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
  fn new(text: &'a str) -> Self {
    let mut starts = vec![0];
    for (idx, byte) in text.bytes().enumerate() {
      if byte == b'\n' {
        starts.push(idx + 1);
      }
    }
    Self { text, starts }
  }

  /// Byte bounds of a line, excluding the trailing newline.
  fn bounds(&self, line_idx: usize) -> (usize, usize) {
    let start = *self.starts.get(line_idx).unwrap_or(&self.text.len());
    let end = if line_idx + 1 < self.starts.len() {
      self.starts[line_idx + 1].saturating_sub(1)
    } else {
      self.text.len()
    };
    (start, end.max(start))
  }

  /// Zero-based (line, character column) for a byte offset.
  fn position(&self, offset: usize) -> (usize, usize) {
    let offset = offset.min(self.text.len());
    let line_idx = match self.starts.binary_search(&offset) {
      Ok(idx) => idx,
      Err(0) => 0,
      Err(idx) => idx - 1,
    };
    let (start, end) = self.bounds(line_idx);
    let col = self.text[start..offset.clamp(start, end)].chars().count();
    (line_idx, col)
  }
}
