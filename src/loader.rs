//! Locating the coverage map for an analysis.
//!
//! Precedence: an explicit `coverageMap` field, then the test results
//! themselves when they already are a `{ path: record }` map, then the
//! coverage JSON on disk, then an empty map.

use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::AnalyzerConfig;
use crate::error::{CoverageError, Result};
use crate::record::{coverage_map_from_object, looks_like_record, CoverageMap};

/// Where a resolved coverage map came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverageSource {
    /// The `coverageMap` field of the test results.
    Embedded,
    /// The test results object itself.
    TestResults,
    /// The coverage JSON file on disk.
    File,
    /// Nothing usable was found.
    Empty,
}

#[derive(Debug, Clone)]
pub struct LoadedCoverage {
    pub source: CoverageSource,
    pub map: CoverageMap,
}

/// Resolve the coverage map for `test_results`. Never fails: every
/// unusable input degrades to an empty map.
pub fn resolve(test_results: &Value, config: &AnalyzerConfig) -> LoadedCoverage {
    if let Some(embedded) = test_results.get("coverageMap") {
        let map = match embedded.as_object() {
            Some(obj) => coverage_map_from_object(obj),
            None => {
                warn!("coverageMap is not an object; treating as empty");
                CoverageMap::new()
            }
        };
        debug!(files = map.len(), "using embedded coverageMap");
        return LoadedCoverage {
            source: CoverageSource::Embedded,
            map,
        };
    }

    if let Some(obj) = test_results.as_object() {
        if obj.values().any(looks_like_record) {
            debug!(files = obj.len(), "test results are a coverage map");
            return LoadedCoverage {
                source: CoverageSource::TestResults,
                map: coverage_map_from_object(obj),
            };
        }
    }

    let path = config.coverage_path();
    if !path.exists() {
        debug!(path = %path.display(), "no coverage file found");
        return LoadedCoverage {
            source: CoverageSource::Empty,
            map: CoverageMap::new(),
        };
    }

    match load_coverage_file(&path) {
        Ok(map) => {
            debug!(path = %path.display(), files = map.len(), "loaded coverage file");
            LoadedCoverage {
                source: CoverageSource::File,
                map,
            }
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable coverage file");
            LoadedCoverage {
                source: CoverageSource::Empty,
                map: CoverageMap::new(),
            }
        }
    }
}

/// Read and parse a coverage JSON file, surfacing I/O and parse errors.
pub fn load_coverage_file(path: &Path) -> Result<CoverageMap> {
    let content = std::fs::read(path)?;
    parse_coverage_map(&content)
}

/// Parse raw coverage JSON. Empty or whitespace-only input is an empty map.
pub fn parse_coverage_map(input: &[u8]) -> Result<CoverageMap> {
    if input.iter().all(u8::is_ascii_whitespace) {
        return Ok(CoverageMap::new());
    }

    let value: Value = serde_json::from_slice(input)?;
    match value {
        Value::Object(obj) => Ok(coverage_map_from_object(&obj)),
        other => Err(CoverageError::Other(format!(
            "expected a JSON object keyed by file path, found {}",
            json_type_name(&other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(lines: Value) -> Value {
        json!({ "l": lines, "b": {}, "f": {}, "fnMap": {}, "code": "" })
    }

    #[test]
    fn test_embedded_map_wins() {
        let dir = tempfile::tempdir().unwrap();
        let config = AnalyzerConfig::new(dir.path());
        let input = json!({
            "coverageMap": { "/a.ts": record(json!({ "1": 1 })) },
            "/b.ts": record(json!({ "1": 1 }))
        });

        let loaded = resolve(&input, &config);
        assert_eq!(loaded.source, CoverageSource::Embedded);
        assert_eq!(loaded.map.keys().collect::<Vec<_>>(), vec!["/a.ts"]);
    }

    #[test]
    fn test_embedded_non_object_is_empty() {
        let config = AnalyzerConfig::new("/nonexistent");
        let loaded = resolve(&json!({ "coverageMap": [1, 2] }), &config);
        assert_eq!(loaded.source, CoverageSource::Embedded);
        assert!(loaded.map.is_empty());
    }

    #[test]
    fn test_raw_map() {
        let config = AnalyzerConfig::new("/nonexistent");
        let loaded = resolve(&json!({ "/a.ts": record(json!({ "1": 0 })) }), &config);
        assert_eq!(loaded.source, CoverageSource::TestResults);
        assert_eq!(loaded.map.len(), 1);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = resolve(&json!({}), &AnalyzerConfig::new(dir.path()));
        assert_eq!(loaded.source, CoverageSource::Empty);
        assert!(loaded.map.is_empty());
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(parse_coverage_map(b"").unwrap().is_empty());
        assert!(parse_coverage_map(b"  \n\t").unwrap().is_empty());
        assert!(parse_coverage_map(b"{}").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_non_object() {
        let err = parse_coverage_map(b"[1, 2]").unwrap_err();
        assert!(err.to_string().contains("an array"));
        assert!(matches!(
            parse_coverage_map(b"{ not json"),
            Err(CoverageError::Json(_))
        ));
    }
}
