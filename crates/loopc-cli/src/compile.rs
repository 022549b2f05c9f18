//! Drives the whole compile for the positional `source_path` argument.

use crate::utils::print_pipeline_error;
use loopc_core::config::CompileConfig;
use loopc_core::pipeline::{self, PipelineError};
use std::fs;
use std::process;

/// Resolve, compile, and write the artifact for `source_path`, exiting with
/// the codes `spec.md` §6 mandates: 0 on success, 2 on a usage error (bad
/// path, missing file), 3 on one or more reported compile diagnostics.
pub fn handle_compile(source_path: &str) {
    let config = CompileConfig::from_env();

    let resolved = match pipeline::resolve_source_path(source_path, &config) {
        Ok(path) => path,
        Err(err) => {
            print_pipeline_error(&err, None);
            process::exit(2);
        }
    };
    let source = fs::read_to_string(&resolved).ok();

    match pipeline::compile_file(source_path, &config) {
        Ok(_) => {
            let artifact_path = pipeline::artifact_path_for(&resolved, &config);
            println!("Compiled '{source_path}' to '{}'", artifact_path.display());
        }
        Err(err) => {
            print_pipeline_error(&err, source.as_deref());
            match err {
                PipelineError::Io(_) => process::exit(2),
                PipelineError::Parse(_) | PipelineError::Resolve(_) | PipelineError::Emit(_) => process::exit(3),
            }
        }
    }
}
