//! Diagnostics: the user-visible error/warning/note type, its pretty
//! printer, and the `ErrorListener` capability interface threaded through
//! every compiler pass.

use crate::span::SourceSpan;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Io,
    Parse,
    Resolve,
    Emit,
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: String,
    pub span: Option<SourceSpan>,
    pub filename: String,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn error(
        kind: DiagnosticKind,
        message: impl Into<String>,
        span: Option<SourceSpan>,
        filename: impl Into<String>,
    ) -> Self {
        Diagnostic {
            kind,
            severity: Severity::Error,
            message: message.into(),
            span,
            filename: filename.into(),
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Render with a source snippet and caret underline, teacher-style.
    pub fn format(&self, source: &str) -> String {
        let line_index = LineIndex::new(source);
        DiagnosticFormatter {
            diagnostic: self,
            source,
            line_index: &line_index,
        }
        .format()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        match self.span {
            Some(span) => write!(
                f,
                "{severity}: {} ({}:{}:{})",
                self.message, self.filename, span.start, span.end
            ),
            None => write!(f, "{severity}: {} ({})", self.message, self.filename),
        }
    }
}

/// The capability interface every pass reports through. `had_error` gates
/// whether the pipeline advances to the next stage (§7): a pass keeps
/// running after an error to surface as many diagnostics as it can, but the
/// stage boundary refuses to hand a broken tree to the next pass.
pub trait ErrorListener {
    fn error(&mut self, span: Option<SourceSpan>, message: String);
    fn note(&mut self, span: Option<SourceSpan>, message: String);
    fn had_error(&self) -> bool;
}

/// Accumulates diagnostics for later formatting, e.g. by the CLI.
#[derive(Debug, Default)]
pub struct CollectingListener {
    pub filename: String,
    pub diagnostics: Vec<Diagnostic>,
    had_error: bool,
}

impl CollectingListener {
    pub fn new(filename: impl Into<String>) -> Self {
        CollectingListener {
            filename: filename.into(),
            diagnostics: Vec::new(),
            had_error: false,
        }
    }
}

impl ErrorListener for CollectingListener {
    fn error(&mut self, span: Option<SourceSpan>, message: String) {
        self.had_error = true;
        self.diagnostics.push(Diagnostic::error(
            DiagnosticKind::Resolve,
            message,
            span,
            self.filename.clone(),
        ));
    }

    fn note(&mut self, _span: Option<SourceSpan>, message: String) {
        if let Some(last) = self.diagnostics.last_mut() {
            last.notes.push(message);
        } else {
            self.diagnostics.push(
                Diagnostic::error(DiagnosticKind::Resolve, String::new(), None, self.filename.clone())
                    .with_note(message),
            );
        }
    }

    fn had_error(&self) -> bool {
        self.had_error
    }
}

/// Tracks only whether an error occurred; used for recursive imports whose
/// own diagnostics are re-attributed by the parent listener (§7).
#[derive(Debug, Default)]
pub struct SilentListener {
    had_error: bool,
}

impl ErrorListener for SilentListener {
    fn error(&mut self, _span: Option<SourceSpan>, _message: String) {
        self.had_error = true;
    }

    fn note(&mut self, _span: Option<SourceSpan>, _message: String) {}

    fn had_error(&self) -> bool {
        self.had_error
    }
}

/// Line index for efficient offset-to-line/column conversion.
#[derive(Debug)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, ch) in source.char_indices() {
            if ch == '\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line.saturating_sub(1),
        };
        let line_start = self.line_starts[line];
        (line + 1, offset.saturating_sub(line_start) + 1)
    }

    pub fn line_range(&self, line: usize) -> Option<(usize, usize)> {
        if line == 0 || line > self.line_starts.len() {
            return None;
        }
        let start = self.line_starts[line - 1];
        let end = if line < self.line_starts.len() {
            self.line_starts[line].saturating_sub(1)
        } else {
            usize::MAX
        };
        Some((start, end))
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

struct DiagnosticFormatter<'a> {
    diagnostic: &'a Diagnostic,
    source: &'a str,
    line_index: &'a LineIndex,
}

impl<'a> DiagnosticFormatter<'a> {
    fn format(&self) -> String {
        let mut output = String::new();
        let severity = match self.diagnostic.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        output.push_str(&format!("{severity}: {}\n", self.diagnostic.message));

        if let Some(span) = self.diagnostic.span {
            let (start_line, start_col) = self.line_index.line_col(span.start);
            let (end_line, end_col) = self.line_index.line_col(span.end);
            output.push_str(&format!(
                "  --> {}:{}:{}\n",
                self.diagnostic.filename, start_line, start_col
            ));
            output.push_str(&self.format_snippet(start_line, start_col, end_line, end_col));
        }

        for note in &self.diagnostic.notes {
            output.push_str(&format!("note: {note}\n"));
        }

        output
    }

    fn format_snippet(
        &self,
        start_line: usize,
        start_col: usize,
        end_line: usize,
        end_col: usize,
    ) -> String {
        let mut output = String::new();
        let max_line = end_line.max(start_line);
        let line_num_width = max_line.to_string().len();

        for line_num in start_line..=end_line {
            if let Some((line_start, line_end)) = self.line_index.line_range(line_num) {
                let line_end = line_end.min(self.source.len());
                let line_text = &self.source[line_start..line_end];
                output.push_str(&format!("{line_num:line_num_width$} | {line_text}\n"));

                output.push_str(&format!("{:width$} | ", "", width = line_num_width));
                let line_span_start = if line_num == start_line { start_col - 1 } else { 0 };
                let line_span_end = if line_num == end_line {
                    end_col - 1
                } else {
                    line_text.chars().count()
                };
                for _ in 0..line_span_start {
                    output.push(' ');
                }
                let span_width = (line_span_end.saturating_sub(line_span_start)).max(1);
                for i in 0..span_width {
                    output.push(if i == 0 { '^' } else { '~' });
                }
                output.push('\n');
            }
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_index_tracks_line_starts() {
        let index = LineIndex::new("line1\nline2\nline3");
        assert_eq!(index.line_col(0), (1, 1));
        assert_eq!(index.line_col(6), (2, 1));
        assert_eq!(index.line_col(12), (3, 1));
    }

    #[test]
    fn diagnostic_format_includes_caret() {
        let span = SourceSpan::new(12, 16);
        let diag = Diagnostic::error(DiagnosticKind::Resolve, "bad thing", Some(span), "test.loop");
        let formatted = diag.format("let x = 1 + true;");
        assert!(formatted.contains("error:"));
        assert!(formatted.contains("test.loop:1:13"));
        assert!(formatted.contains("^~~~"));
    }

    #[test]
    fn collecting_listener_tracks_had_error() {
        let mut listener = CollectingListener::new("test.loop");
        assert!(!listener.had_error());
        listener.error(None, "oops".to_string());
        assert!(listener.had_error());
        assert_eq!(listener.diagnostics.len(), 1);
    }
}
