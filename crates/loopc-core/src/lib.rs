pub mod ast;
pub mod bytecode;
pub mod config;
pub mod diagnostics;
pub mod lower;
pub mod parser;
pub mod pipeline;
pub mod resolve;
pub mod span;

pub use ast::{Expr, Module, Stmt};
pub use diagnostics::{Diagnostic, Severity};
pub use pipeline::{Pipeline, PipelineError};
