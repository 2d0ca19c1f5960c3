//! Human-readable rendering of configuration errors

use crate::error::CompileError;
use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use std::ops::Range;

/// Render a compile error against its source, without colors.
///
/// Errors without a source position render as their plain message.
pub fn render_diagnostic(error: &CompileError, source: &str, filename: &str) -> String {
    let Some(span) = error.span() else {
        return format!("error: {}\n", error);
    };
    let span = clamp(span, source.len());

    let label = match error {
        CompileError::Syntax(e) => e.kind.to_string(),
        CompileError::InvalidPattern { source, .. } => source.to_string(),
        CompileError::Directive { source, .. } => source.to_string(),
        CompileError::Io { .. } => error.to_string(),
    };

    let report = Report::build(ReportKind::Error, span.clone())
        .with_message(format!("{}: {}", filename, error))
        .with_config(Config::default().with_color(false))
        .with_label(Label::new(span).with_message(label).with_color(Color::Red))
        .finish();

    let mut buf = Vec::new();
    match report.write(Source::from(source), &mut buf) {
        Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
        Err(_) => format!("error: {}\n", error),
    }
}

/// Keep a span inside the source and at least one byte wide
fn clamp(span: Range<usize>, len: usize) -> Range<usize> {
    let start = span.start.min(len);
    let end = span.end.min(len).max(start);
    if start == end {
        start.saturating_sub(usize::from(start == len && len > 0))..end.saturating_add(1).min(len)
    } else {
        start..end
    }
}
