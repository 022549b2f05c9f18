//! Compile-time/runtime configuration threaded through the [`Pipeline`]
//! (§2 ambient stack), generalizing the original's ad hoc use of
//! `os.environ` and hardcoded paths (`full_passes.py`) into an explicit,
//! testable value built once by the CLI.

use std::env;
use std::path::PathBuf;

/// The environment variable consulted for the second search-path entry
/// (§6), matching the original's `LOOP_PACKAGES_PATH`.
pub const PACKAGES_PATH_VAR: &str = "LOOP_PACKAGES_PATH";

/// The directory name artifacts are written under, relative to the source
/// file's own directory (§6): `<dir>/.loop_compiled/<basename>.code`.
pub const ARTIFACT_DIR_NAME: &str = ".loop_compiled";

#[derive(Debug, Clone)]
pub struct CompileConfig {
    /// Extra search path entries tried after `""` (the importing file's own
    /// directory), in order. Populated from `$LOOP_PACKAGES_PATH` by
    /// [`CompileConfig::from_env`].
    pub search_paths: Vec<PathBuf>,
    /// Name of the per-directory artifact cache directory.
    pub artifact_dir_name: String,
    /// Recompile an import even if its artifact already looks fresh. The
    /// original's own freshness check (`mtime(compiled) < mtime(compiled)`)
    /// never short-circuits anything, since it compares a path to itself;
    /// this crate implements the evidently-intended
    /// `mtime(compiled) > mtime(source)` guard instead (§9), and this flag
    /// lets callers bypass it entirely.
    pub force_recompile: bool,
}

impl CompileConfig {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        CompileConfig {
            search_paths,
            artifact_dir_name: ARTIFACT_DIR_NAME.to_string(),
            force_recompile: false,
        }
    }

    /// Build from `$LOOP_PACKAGES_PATH`, the way the CLI constructs its
    /// default configuration before any `clap` overrides are applied.
    pub fn from_env() -> Self {
        let search_paths = match env::var_os(PACKAGES_PATH_VAR) {
            Some(raw) => env::split_paths(&raw).collect(),
            None => Vec::new(),
        };
        CompileConfig::new(search_paths)
    }

    pub fn with_force_recompile(mut self, force: bool) -> Self {
        self.force_recompile = force;
        self
    }

    /// Every directory tried when resolving an import path, in order: the
    /// importing file's own directory first, then each configured search
    /// path entry (§6).
    pub fn search_dirs<'a>(&'a self, importing_dir: &'a std::path::Path) -> Vec<&'a std::path::Path> {
        let mut dirs = vec![importing_dir];
        dirs.extend(self.search_paths.iter().map(PathBuf::as_path));
        dirs
    }
}

impl Default for CompileConfig {
    fn default() -> Self {
        CompileConfig::new(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_no_extra_search_paths() {
        let config = CompileConfig::default();
        assert!(config.search_paths.is_empty());
        assert_eq!(config.artifact_dir_name, ".loop_compiled");
        assert!(!config.force_recompile);
    }

    #[test]
    fn search_dirs_puts_importing_dir_first() {
        let mut config = CompileConfig::new(vec![PathBuf::from("/pkgs")]);
        config.force_recompile = true;
        let importing_dir = PathBuf::from("/project/src");
        let dirs = config.search_dirs(&importing_dir);
        assert_eq!(dirs, vec![std::path::Path::new("/project/src"), std::path::Path::new("/pkgs")]);
    }
}
