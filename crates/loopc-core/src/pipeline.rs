//! Drives a single source file through parse → lower-before → resolve →
//! lower-after → emit and assembles the on-disk artifact (§6), the way the
//! teacher's own `pipeline.rs` chains its stages behind one type. Recursive
//! `import`/`from .. import` resolution is handled here too, mirroring
//! `full_passes.py`'s `full_passes`: resolve the path, check the artifact's
//! freshness, recompile if needed, and `chdir` into the importing file's own
//! directory for the scope of the nested compile.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ast::Module;
use crate::bytecode::{Chunk, CodeGen, ModuleValue, Value};
use crate::config::CompileConfig;
use crate::diagnostics::{CollectingListener, Diagnostic, DiagnosticKind, ErrorListener, LineIndex};
use crate::lower::{LowerAfter, LowerBefore};
use crate::parser;
use crate::resolve::{ImportCompiler, Resolver};
use crate::span::SourceSpan;

/// One of the four diagnostic kinds from §7, surfaced up through whichever
/// stage first reported `had_error`. A stage that fails still lets earlier
/// stages' work stand; only the *next* stage is skipped.
#[derive(Debug)]
pub enum PipelineError {
    Io(Diagnostic),
    Parse(Vec<Diagnostic>),
    Resolve(Vec<Diagnostic>),
    Emit(Vec<Diagnostic>),
}

impl PipelineError {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            PipelineError::Io(d) => std::slice::from_ref(d),
            PipelineError::Parse(ds) | PipelineError::Resolve(ds) | PipelineError::Emit(ds) => ds,
        }
    }

    /// Render every diagnostic with a source snippet, teacher-style.
    pub fn format_with_source(&self, source: &str) -> String {
        self.diagnostics()
            .iter()
            .map(|d| d.format(source))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, d) in self.diagnostics().iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{d}")?;
        }
        Ok(())
    }
}

impl std::error::Error for PipelineError {}

pub type PipelineResult<T> = Result<T, PipelineError>;

fn io_error(path: &Path, message: impl fmt::Display) -> PipelineError {
    PipelineError::Io(Diagnostic::error(
        DiagnosticKind::Io,
        message.to_string(),
        None,
        path.to_string_lossy().into_owned(),
    ))
}

/// Temporarily `chdir`s into a directory for the scope of a recursive
/// import compile, restoring the previous working directory unconditionally
/// when dropped (§4.7) — even if the inner compile returns early via `?` or
/// unwinds through a panic, exactly as the original's `new_cd` context
/// manager restores `cwd` in a `finally` block.
pub struct WorkingDirGuard {
    previous: PathBuf,
}

impl WorkingDirGuard {
    pub fn enter(dir: &Path) -> std::io::Result<Self> {
        let previous = std::env::current_dir()?;
        std::env::set_current_dir(dir)?;
        Ok(WorkingDirGuard { previous })
    }
}

impl Drop for WorkingDirGuard {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.previous);
    }
}

pub struct Pipeline {
    source: String,
    filename: String,
}

impl Pipeline {
    pub fn new(source: impl Into<String>, filename: impl Into<String>) -> Self {
        Pipeline {
            source: source.into(),
            filename: filename.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn parse(&self) -> PipelineResult<Module> {
        parser::parse(&self.source, &self.filename).map_err(PipelineError::Parse)
    }

    pub fn lower_before(&self, module: Module) -> Module {
        LowerBefore::new().lower_module(module)
    }

    pub fn resolve(
        &self,
        module: Module,
        listener: &mut dyn ErrorListener,
        import_compiler: &mut ImportCompiler,
    ) -> Module {
        Resolver::new(listener, import_compiler).resolve_module(module)
    }

    pub fn lower_after(&self, module: Module) -> Module {
        LowerAfter::new().lower_module(module)
    }

    pub fn emit(&self, module: &Module, listener: &mut dyn ErrorListener) -> Chunk {
        let line_index = LineIndex::new(&self.source);
        CodeGen::new(&line_index, listener).generate_module(module)
    }

    /// Runs every stage in order, resolving this module's own imports by
    /// recursively compiling them relative to `dir` (this file's own
    /// directory) and stopping before `emit` if `resolve` reported an error.
    pub fn compile_all(&self, dir: &Path, config: &CompileConfig) -> PipelineResult<ModuleValue> {
        let module = self.parse()?;
        let module = self.lower_before(module);

        let mut listener = CollectingListener::new(self.filename.clone());
        // Collected separately from `listener` rather than captured by the
        // closure directly: the closure must not hold `listener` borrowed
        // for the whole `resolve` call, since `resolve` itself needs a
        // fresh mutable borrow of it for the resolver's own diagnostics.
        let import_failures = std::cell::RefCell::new(Vec::<(SourceSpan, String)>::new());
        let module = {
            let mut import_compiler = |raw: &str, span: SourceSpan| -> bool {
                let guard = match WorkingDirGuard::enter(dir) {
                    Ok(guard) => guard,
                    Err(err) => {
                        import_failures
                            .borrow_mut()
                            .push((span, format!("cannot enter '{}': {err}", dir.display())));
                        return false;
                    }
                };
                let ok = compile_file(raw, config).is_ok();
                drop(guard);
                if !ok {
                    import_failures.borrow_mut().push((span, format!("failed to compile import '{raw}'")));
                }
                ok
            };
            self.resolve(module, &mut listener, &mut import_compiler)
        };
        for (span, message) in import_failures.into_inner() {
            listener.error(Some(span), message);
        }
        if listener.had_error() {
            return Err(PipelineError::Resolve(listener.diagnostics));
        }

        let module = self.lower_after(module);

        let mut emit_listener = CollectingListener::new(self.filename.clone());
        let chunk = self.emit(&module, &mut emit_listener);
        if emit_listener.had_error() {
            return Err(PipelineError::Emit(emit_listener.diagnostics));
        }

        Ok(ModuleValue {
            globals_count: module.globals_count,
            chunk,
        })
    }
}

/// Appends the `.loop` extension when a path has none, the way the CLI
/// appends it to its bare `source_path` argument (§6) and the original
/// resolver appends it to import paths.
fn ensure_loop_extension(path: &Path) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension("loop")
    }
}

/// Tries each of [`CompileConfig::search_dirs`] in order (§6): the current
/// directory first (which, for a nested `import`, is the importing file's
/// own directory once [`WorkingDirGuard`] has chdir'd there), then each of
/// `config.search_paths`. Used both for a top-level `source_path` the CLI
/// is given and for every nested `import`, which is why it's exposed for
/// the CLI's own error reporting.
pub fn resolve_source_path(raw: &str, config: &CompileConfig) -> PipelineResult<PathBuf> {
    let cwd = Path::new(".");
    for dir in config.search_dirs(cwd) {
        let candidate = ensure_loop_extension(&dir.join(raw));
        if candidate.exists() {
            return Ok(candidate);
        }
    }
    Err(PipelineError::Io(Diagnostic::error(
        DiagnosticKind::Io,
        format!("could not resolve import '{raw}'"),
        None,
        raw,
    )))
}

pub fn artifact_path_for(source_path: &Path, config: &CompileConfig) -> PathBuf {
    let dir = source_path.parent().unwrap_or_else(|| Path::new("."));
    let basename = source_path.file_stem().unwrap_or_default();
    dir.join(&config.artifact_dir_name).join(basename).with_extension("code")
}

/// The freshness test as the original evidently intended it
/// (`mtime(compiled) > mtime(source)`), not as it's literally written there
/// (`mtime(compiled) < mtime(compiled)`, which always compares a path to
/// itself and so never short-circuits — see §9).
fn is_fresh(source_path: &Path, artifact_path: &Path) -> bool {
    let (Ok(src_meta), Ok(art_meta)) = (fs::metadata(source_path), fs::metadata(artifact_path)) else {
        return false;
    };
    match (art_meta.modified(), src_meta.modified()) {
        (Ok(art_time), Ok(src_time)) => art_time > src_time,
        _ => false,
    }
}

fn read_artifact(path: &Path) -> Option<ModuleValue> {
    let text = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&text).ok()? {
        Value::Module(module) => Some(module),
        _ => None,
    }
}

fn write_artifact(path: &Path, value: &ModuleValue) -> PipelineResult<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|err| io_error(dir, err))?;
    }
    let file = fs::File::create(path).map_err(|err| io_error(path, err))?;
    let wrapped = Value::Module(value.clone());
    serde_json::to_writer_pretty(file, &wrapped).map_err(|err| io_error(path, err))?;
    Ok(())
}

/// Resolves `raw` against `config`'s search paths, recompiles it if its
/// artifact is missing or stale (or `config.force_recompile` is set), and
/// writes the refreshed artifact back out. Used both for the top-level
/// `source_path` the CLI is given and for every nested `import`.
pub fn compile_file(raw: &str, config: &CompileConfig) -> PipelineResult<ModuleValue> {
    let resolved = resolve_source_path(raw, config)?;
    let artifact_path = artifact_path_for(&resolved, config);

    if !config.force_recompile && is_fresh(&resolved, &artifact_path) {
        if let Some(value) = read_artifact(&artifact_path) {
            return Ok(value);
        }
    }

    let source = fs::read_to_string(&resolved).map_err(|err| io_error(&resolved, err))?;
    let filename = resolved.to_string_lossy().into_owned();
    let dir = resolved.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));

    let pipeline = Pipeline::new(source, filename);
    let value = pipeline.compile_all(&dir, config)?;
    write_artifact(&artifact_path, &value)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    fn scratch_dir() -> PathBuf {
        let n = COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!("loopc-pipeline-test-{}-{n}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn parse_stage_reports_diagnostics_on_bad_syntax() {
        let pipeline = Pipeline::new("var = ;".to_string(), "test.loop".to_string());
        let err = pipeline.parse().unwrap_err();
        assert!(matches!(err, PipelineError::Parse(_)));
        assert!(!err.diagnostics().is_empty());
    }

    #[test]
    fn compile_all_runs_full_pipeline_for_import_free_module() {
        let pipeline = Pipeline::new("var x = 1 + 2;\nprint x;".to_string(), "test.loop".to_string());
        let config = CompileConfig::default();
        let value = pipeline.compile_all(Path::new("."), &config).unwrap();
        assert_eq!(value.globals_count, 1);
        assert!(!value.chunk.code.is_empty());
    }

    #[test]
    fn compile_file_writes_artifact_and_reuses_it_when_fresh() {
        let dir = scratch_dir();
        let source_path = dir.join("mod.loop");
        fs::write(&source_path, "var x = 1;\nprint x;").unwrap();

        let config = CompileConfig::default();
        let raw = source_path.to_string_lossy().into_owned();
        let first = compile_file(&raw, &config).unwrap();

        let artifact_path = artifact_path_for(&source_path, &config);
        assert!(artifact_path.exists());

        let second = compile_file(&raw, &config).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn compile_file_recompiles_when_forced_even_if_fresh() {
        let dir = scratch_dir();
        let source_path = dir.join("mod.loop");
        fs::write(&source_path, "var x = 1;").unwrap();

        let mut config = CompileConfig::default();
        compile_file(&source_path.to_string_lossy(), &config).unwrap();

        config.force_recompile = true;
        let value = compile_file(&source_path.to_string_lossy(), &config).unwrap();
        assert_eq!(value.globals_count, 1);
    }

    #[test]
    fn compile_file_reports_io_error_for_missing_source() {
        let dir = scratch_dir();
        let missing = dir.join("nope.loop");
        let config = CompileConfig::default();
        let err = compile_file(&missing.to_string_lossy(), &config).unwrap_err();
        assert!(matches!(err, PipelineError::Io(_)));
    }

    #[test]
    fn working_dir_guard_restores_previous_directory_on_drop() {
        let before = std::env::current_dir().unwrap();
        let scratch = scratch_dir();
        {
            let _guard = WorkingDirGuard::enter(&scratch).unwrap();
            assert_eq!(std::env::current_dir().unwrap(), fs::canonicalize(&scratch).unwrap());
        }
        assert_eq!(std::env::current_dir().unwrap(), before);
    }
}
