//! Source location tracking for the loop AST.

use serde::{Deserialize, Serialize};

/// A byte-offset range into a single source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: usize,
    pub end: usize,
}

impl SourceSpan {
    pub fn new(start: usize, end: usize) -> Self {
        SourceSpan { start, end }
    }

    /// Build a span from a chumsky combinator span.
    pub fn from_chumsky(span: chumsky::span::SimpleSpan) -> Self {
        SourceSpan {
            start: span.start,
            end: span.end,
        }
    }

    /// Resolve this span to a 1-indexed line/column against `source`.
    pub fn location(&self, source: &str) -> Location {
        let mut line = 1;
        let mut col = 1;
        for (byte_idx, ch) in source.char_indices() {
            if byte_idx >= self.start {
                break;
            }
            if ch == '\n' {
                line += 1;
                col = 1;
            } else {
                col += 1;
            }
        }
        Location {
            line,
            col,
            offset: self.start,
        }
    }

    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end.min(source.len())]
    }

    /// Merge two spans into the smallest span covering both.
    pub fn merge(&self, other: &SourceSpan) -> SourceSpan {
        SourceSpan {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub line: usize,
    pub col: usize,
    pub offset: usize,
}

/// A source file as handed to the pipeline: its resolved path and contents.
#[derive(Debug, Clone)]
pub struct File {
    pub path: std::path::PathBuf,
    pub contents: String,
}

impl File {
    pub fn new(path: std::path::PathBuf, contents: String) -> Self {
        File { path, contents }
    }
}
