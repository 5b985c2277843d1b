use std::time::Instant;

macro_rules! pass_span {
  ($name:literal, $group:expr, $def:expr) => {
    tracing::debug_span!(
      $name,
      group = $group,
      def = $def,
      duration_ms = tracing::field::Empty,
    )
  };
}
pub(crate) use pass_span;

/// Lightweight helper for emitting structured tracing spans around pass
/// boundaries. When tracing is disabled this is a no-op to keep the hot path
/// cheap.
pub(crate) struct PassSpan {
  span: tracing::Span,
  start: Instant,
}

impl PassSpan {
  pub(crate) fn enter(span: tracing::Span) -> Option<PassSpan> {
    if span.is_disabled() {
      return None;
    }
    let _guard = span.enter();
    drop(_guard);
    Some(PassSpan {
      span,
      start: Instant::now(),
    })
  }

  pub(crate) fn finish(self) {
    self
      .span
      .record("duration_ms", self.start.elapsed().as_secs_f64() * 1000.0);
  }
}
