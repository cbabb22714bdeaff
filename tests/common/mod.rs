#![allow(dead_code)]

use std::path::Path;

use covmetrics::{Analyzer, AnalyzerConfig};
use serde_json::Value;
use tempfile::TempDir;

/// An analyzer rooted in a fresh temporary directory with no coverage file.
/// The caller must hold onto `TempDir` to keep the directory alive.
pub fn empty_project() -> (Analyzer, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let analyzer = Analyzer::new(AnalyzerConfig::new(dir.path()));
    (analyzer, dir)
}

/// Write `data` to `<dir>/coverage/coverage-final.json`.
pub fn write_coverage_file(dir: &Path, data: &Value) {
    let coverage_dir = dir.join("coverage");
    std::fs::create_dir_all(&coverage_dir).unwrap();
    std::fs::write(
        coverage_dir.join("coverage-final.json"),
        serde_json::to_vec_pretty(data).unwrap(),
    )
    .unwrap();
}

/// Assert a percentage to two decimal places.
pub fn assert_pct(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 0.01,
        "expected {expected:.2}%, got {actual}"
    );
}
