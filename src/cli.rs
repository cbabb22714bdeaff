//! Command handler functions for the covmetrics CLI.
//!
//! Each `cmd_*` function returns its output as a `String`, making them easy
//! to test without capturing stdout.

use std::fmt::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde_json::Value;
use tracing::{info, warn};

use crate::analyzer::Analyzer;
use crate::config::AnalyzerConfig;
use crate::loader;
use crate::record::{merge_maps, CoverageMap};
use crate::report::{CoverageReport, JsonFormatter, MarkdownFormatter, ReportFormatter, TextFormatter};
use crate::threshold::{coverage_gaps, Thresholds};

/// Output style for the `analyze` command.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Style {
    Text,
    Markdown,
    Json,
}

impl Style {
    fn formatter(self) -> &'static dyn ReportFormatter {
        match self {
            Style::Text => &TextFormatter,
            Style::Markdown => &MarkdownFormatter,
            Style::Json => &JsonFormatter,
        }
    }
}

/// Where to find coverage data.
#[derive(Debug, Clone)]
pub struct Inputs {
    pub directory: PathBuf,
    /// Explicit coverage files; empty means the conventional location.
    pub coverage_files: Vec<PathBuf>,
    pub read_sources: bool,
}

impl Inputs {
    fn config(&self) -> AnalyzerConfig {
        AnalyzerConfig::new(&self.directory).with_read_sources(self.read_sources)
    }

    /// Load and merge every requested coverage file. Explicitly named files
    /// must be readable; the conventional location may be absent.
    fn load(&self, config: &AnalyzerConfig) -> Result<CoverageMap> {
        if self.coverage_files.is_empty() {
            let path = config.coverage_path();
            if !path.exists() {
                warn!(path = %path.display(), "no coverage file found; reporting empty coverage");
            }
            return Ok(loader::resolve(&Value::Object(Default::default()), config).map);
        }

        let mut maps = Vec::with_capacity(self.coverage_files.len());
        for file in &self.coverage_files {
            let path = config.resolve(file);
            let map = loader::load_coverage_file(&path)
                .with_context(|| format!("Failed to load coverage file {}", path.display()))?;
            info!(path = %path.display(), files = map.len(), "loaded coverage file");
            maps.push(map);
        }
        Ok(merge_maps(maps))
    }
}

/// Result of a command: rendered output plus whether it should exit
/// successfully.
#[derive(Debug)]
pub struct CommandOutput {
    pub text: String,
    pub success: bool,
}

pub fn cmd_analyze(
    inputs: &Inputs,
    style: Style,
    per_file: bool,
    thresholds: &Thresholds,
) -> Result<CommandOutput> {
    let config = inputs.config();
    let map = inputs.load(&config)?;
    let analyzer = Analyzer::new(config);

    let mut report = CoverageReport::new(analyzer.analyze_map(&map)).stamped();
    if per_file {
        report.files = analyzer.analyze_files(&map);
    }
    report.failures = thresholds.check(&report.metrics);

    Ok(CommandOutput {
        text: report.format(style.formatter()),
        success: report.passed(),
    })
}

pub fn cmd_gaps(inputs: &Inputs, threshold: f64) -> Result<String> {
    let config = inputs.config();
    let map = inputs.load(&config)?;
    let files = Analyzer::new(config).analyze_files(&map);
    let gaps = coverage_gaps(&files, threshold);

    if gaps.is_empty() {
        return Ok(format!("All files meet the {threshold}% threshold.\n"));
    }

    let mut out = String::new();
    writeln!(out, "{:<60} {:>8} {:>8}", "FILE", "METRIC", "GAP").unwrap();
    writeln!(out, "{}", "-".repeat(78)).unwrap();
    for gap in &gaps {
        for issue in &gap.issues {
            writeln!(
                out,
                "{:<60} {:>8} {:>7.1}%",
                gap.path,
                issue.kind.as_str(),
                issue.gap
            )
            .unwrap();
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Write a coverage file with one fully covered and one half covered
    /// file into a fresh project directory.
    fn seed_project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("coverage")).unwrap();
        let data = json!({
            "/src/full.ts": {
                "l": { "1": 1, "2": 1 },
                "b": { "0": [1, 1] },
                "f": { "0": 1 },
                "fnMap": { "0": { "name": "Full.run" } },
                "code": "class Full { run() {} }"
            },
            "/src/half.ts": {
                "l": { "1": 1, "2": 0, "3": 0, "4": 1 },
                "b": { "0": [1, 0] },
                "f": { "0": 0 },
                "fnMap": { "0": { "name": "Half.run" } },
                "code": "class Half { run() {} }"
            }
        });
        std::fs::write(
            dir.path().join("coverage/coverage-final.json"),
            serde_json::to_vec(&data).unwrap(),
        )
        .unwrap();
        dir
    }

    fn inputs(dir: &tempfile::TempDir) -> Inputs {
        Inputs {
            directory: dir.path().to_path_buf(),
            coverage_files: vec![],
            read_sources: false,
        }
    }

    #[test]
    fn test_cmd_analyze_text() {
        let dir = seed_project();
        let out = cmd_analyze(&inputs(&dir), Style::Text, false, &Thresholds::default()).unwrap();

        assert!(out.success);
        assert!(out.text.contains("Lines:      4/6 (66.7%)"));
        assert!(out.text.contains("Classes:    1/2 (50.0%)"));
        assert!(out.text.contains("Branches:   3/4 (75.0%)"));
    }

    #[test]
    fn test_cmd_analyze_per_file_markdown() {
        let dir = seed_project();
        let out =
            cmd_analyze(&inputs(&dir), Style::Markdown, true, &Thresholds::default()).unwrap();

        assert!(out.text.contains("## Coverage Report"));
        assert!(out.text.contains("**`/src/half.ts`**: 2-3"));
    }

    #[test]
    fn test_cmd_analyze_threshold_failure() {
        let dir = seed_project();
        let thresholds = Thresholds {
            line: Some(80.0),
            ..Default::default()
        };
        let out = cmd_analyze(&inputs(&dir), Style::Json, false, &thresholds).unwrap();

        assert!(!out.success);
        let value: Value = serde_json::from_str(&out.text).unwrap();
        assert_eq!(value["failures"][0]["kind"], "line");
        assert_eq!(value["failures"][0]["minimum"], 80.0);
    }

    #[test]
    fn test_cmd_analyze_missing_default_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let out = cmd_analyze(&inputs(&dir), Style::Text, false, &Thresholds::default()).unwrap();

        assert!(out.success);
        assert!(out.text.contains("Lines:      0/0 (0.0%)"));
    }

    #[test]
    fn test_cmd_analyze_explicit_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut inputs = inputs(&dir);
        inputs.coverage_files.push(PathBuf::from("nope.json"));

        let err = cmd_analyze(&inputs, Style::Text, false, &Thresholds::default()).unwrap_err();
        assert!(err.to_string().contains("Failed to load coverage file"));
    }

    #[test]
    fn test_cmd_analyze_merges_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("a.json"),
            r#"{ "/src/x.ts": { "l": { "1": 1, "2": 0 } } }"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("b.json"),
            r#"{ "/src/x.ts": { "l": { "1": 0, "2": 3 } }, "/src/y.ts": { "l": { "1": 0 } } }"#,
        )
        .unwrap();

        let inputs = Inputs {
            directory: dir.path().to_path_buf(),
            coverage_files: vec![PathBuf::from("a.json"), PathBuf::from("b.json")],
            read_sources: false,
        };
        let out = cmd_analyze(&inputs, Style::Text, false, &Thresholds::default()).unwrap();
        assert!(out.text.contains("Lines:      2/3 (66.7%)"));
    }

    #[test]
    fn test_cmd_gaps() {
        let dir = seed_project();
        let out = cmd_gaps(&inputs(&dir), 80.0).unwrap();

        assert!(out.contains("/src/half.ts"));
        assert!(!out.contains("/src/full.ts"));
        assert!(out.contains("method"));
        assert!(out.contains("80.0%"));
    }

    #[test]
    fn test_cmd_gaps_none() {
        let dir = seed_project();
        let out = cmd_gaps(&inputs(&dir), 40.0).unwrap();
        // half.ts still has 0% methods.
        assert!(out.contains("/src/half.ts"));

        let empty = tempfile::tempdir().unwrap();
        let out = cmd_gaps(&inputs(&empty), 80.0).unwrap();
        assert!(out.contains("All files meet the 80% threshold."));
    }
}
