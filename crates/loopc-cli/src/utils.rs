//! Shared CLI utilities for formatting diagnostics.

use loopc_core::PipelineError;

/// Print every diagnostic in `err` with a source snippet, teacher-style.
/// Falls back to the plain `Display` rendering (message + location, no
/// snippet) when the source text couldn't be recovered, e.g. the file went
/// missing between resolution and this point.
pub fn print_pipeline_error(err: &PipelineError, source: Option<&str>) {
    match source {
        Some(source) => eprintln!("{}", err.format_with_source(source)),
        None => eprintln!("{err}"),
    }
}
