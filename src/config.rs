use std::path::{Path, PathBuf};

/// Conventional location of Istanbul's JSON output, relative to the project.
pub const DEFAULT_COVERAGE_FILE: &str = "coverage/coverage-final.json";

/// Explicit inputs to an analysis. Nothing is resolved against the process
/// working directory unless `base_dir` says so.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Directory that relative paths are resolved against.
    pub base_dir: PathBuf,
    /// Fallback coverage JSON, relative to `base_dir` unless absolute.
    pub coverage_file: PathBuf,
    /// Read source text from disk for records that carry no `code`.
    pub read_sources: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

impl AnalyzerConfig {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            coverage_file: PathBuf::from(DEFAULT_COVERAGE_FILE),
            read_sources: false,
        }
    }

    #[must_use]
    pub fn with_coverage_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.coverage_file = path.into();
        self
    }

    #[must_use]
    pub fn with_read_sources(mut self, read_sources: bool) -> Self {
        self.read_sources = read_sources;
        self
    }

    /// Absolute-or-base-relative path of the fallback coverage file.
    #[must_use]
    pub fn coverage_path(&self) -> PathBuf {
        self.resolve(&self.coverage_file)
    }

    /// Resolve `path` against `base_dir` unless it is already absolute.
    #[must_use]
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}
