//! Converts chumsky parse errors into the crate's own [`Diagnostic`] type.

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::span::SourceSpan;
use chumsky::error::{Rich, RichReason};

fn format_reason(reason: &RichReason<char>) -> String {
    match reason {
        RichReason::ExpectedFound { found, .. } => match found {
            Some(c) => format!("unexpected '{}'", c.escape_debug()),
            None => "unexpected end of input".to_string(),
        },
        RichReason::Custom(msg) => msg.to_string(),
    }
}

pub fn errors_to_diagnostics(errors: Vec<Rich<char>>, filename: &str) -> Vec<Diagnostic> {
    errors
        .into_iter()
        .map(|e| {
            let span = SourceSpan::from_chumsky(*e.span());
            Diagnostic::error(DiagnosticKind::Parse, format_reason(e.reason()), Some(span), filename)
        })
        .collect()
}
