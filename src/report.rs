//! Output formatting for coverage analysis results.

use std::fmt::Write;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::model::{CoverageMetrics, FileMetrics, MetricKind};
use crate::threshold::ThresholdFailure;

/// Everything a formatter needs to render one analysis.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CoverageReport {
    /// RFC 3339 generation time, if stamped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    pub metrics: CoverageMetrics,
    /// Per-file breakdown (empty unless requested).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<FileMetrics>,
    /// Violated thresholds.
    pub failures: Vec<ThresholdFailure>,
}

impl CoverageReport {
    #[must_use]
    pub fn new(metrics: CoverageMetrics) -> Self {
        Self {
            metrics,
            ..Default::default()
        }
    }

    /// Stamp the report with the current time.
    #[must_use]
    pub fn stamped(mut self) -> Self {
        self.generated_at = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));
        self
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// Format using a specific formatter.
    #[must_use]
    pub fn format(&self, formatter: &dyn ReportFormatter) -> String {
        formatter.format(self)
    }

    /// Files sorted by line coverage, worst first.
    fn files_by_line_rate(&self) -> Vec<&FileMetrics> {
        let mut files: Vec<_> = self.files.iter().collect();
        files.sort_by(|a, b| {
            a.metrics
                .line
                .percentage
                .total_cmp(&b.metrics.line.percentage)
                .then_with(|| a.path.cmp(&b.path))
        });
        files
    }
}

/// Trait for formatting coverage reports.
pub trait ReportFormatter {
    /// Format the report to a string.
    fn format(&self, report: &CoverageReport) -> String;
}

/// Plain text formatter.
pub struct TextFormatter;

impl ReportFormatter for TextFormatter {
    fn format(&self, report: &CoverageReport) -> String {
        let mut out = String::new();

        for kind in MetricKind::ALL {
            let d = report.metrics.get(kind);
            let label = format!("{}:", kind.label());
            writeln!(
                out,
                "{label:<10}  {}/{} ({:.1}%)",
                d.covered, d.total, d.percentage
            )
            .unwrap();
        }

        if !report.files.is_empty() {
            out.push('\n');
            writeln!(
                out,
                "{:<50} {:>8} {:>8} {:>8} {:>8}",
                "FILE", "CLASS", "METHOD", "LINE", "BRANCH"
            )
            .unwrap();
            writeln!(out, "{}", "-".repeat(86)).unwrap();
            for f in report.files_by_line_rate() {
                let m = &f.metrics;
                writeln!(
                    out,
                    "{:<50} {:>7.1}% {:>7.1}% {:>7.1}% {:>7.1}%",
                    f.path,
                    m.class.percentage,
                    m.method.percentage,
                    m.line.percentage,
                    m.branch.percentage
                )
                .unwrap();
                if !f.uncovered_lines.is_empty() {
                    let missed = format_line_ranges(&f.uncovered_lines, &f.instrumented_lines);
                    writeln!(out, "  uncovered: {missed}").unwrap();
                }
            }
        }

        if !report.failures.is_empty() {
            out.push('\n');
            for failure in &report.failures {
                writeln!(out, "FAIL: {failure}").unwrap();
            }
        }

        out
    }
}

/// Markdown formatter.
pub struct MarkdownFormatter;

impl ReportFormatter for MarkdownFormatter {
    fn format(&self, report: &CoverageReport) -> String {
        let mut md = String::new();

        md.push_str("## Coverage Report\n\n");
        if let Some(ref at) = report.generated_at {
            writeln!(md, "Generated: {at}\n").unwrap();
        }

        md.push_str("| Metric | Covered | Total | Percentage |\n");
        md.push_str("|--------|--------:|------:|-----------:|\n");
        for kind in MetricKind::ALL {
            let d = report.metrics.get(kind);
            writeln!(
                md,
                "| {} | {} | {} | {:.2}% |",
                kind.label(),
                d.covered,
                d.total,
                d.percentage
            )
            .unwrap();
        }

        if !report.files.is_empty() {
            md.push_str("\n### Files\n\n");
            md.push_str("| File | Class | Method | Line | Branch |\n");
            md.push_str("|------|------:|-------:|-----:|-------:|\n");
            for f in report.files_by_line_rate() {
                let m = &f.metrics;
                writeln!(
                    md,
                    "| `{}` | {:.0}% | {:.0}% | {:.0}% | {:.0}% |",
                    f.path,
                    m.class.percentage,
                    m.method.percentage,
                    m.line.percentage,
                    m.branch.percentage
                )
                .unwrap();
            }

            let with_misses: Vec<_> = report
                .files_by_line_rate()
                .into_iter()
                .filter(|f| !f.uncovered_lines.is_empty())
                .collect();
            if !with_misses.is_empty() {
                md.push_str("\n<details>\n<summary>Uncovered lines</summary>\n\n");
                for f in with_misses {
                    let ranges = format_line_ranges(&f.uncovered_lines, &f.instrumented_lines);
                    writeln!(md, "**`{}`**: {ranges}\n", f.path).unwrap();
                }
                md.push_str("</details>\n");
            }
        }

        if !report.failures.is_empty() {
            md.push_str("\n### Threshold failures\n\n");
            for failure in &report.failures {
                writeln!(md, "- {failure}").unwrap();
            }
        }

        md
    }
}

/// JSON formatter.
pub struct JsonFormatter;

impl ReportFormatter for JsonFormatter {
    fn format(&self, report: &CoverageReport) -> String {
        let mut json = serde_json::to_string_pretty(report).unwrap();
        json.push('\n');
        json
    }
}

/// Maximum number of consecutive non-instrumented lines that can be bridged
/// when coalescing uncovered ranges.
const MAX_BRIDGE_GAP: u32 = 2;

/// Coalesce sorted line numbers into `(start, end)` ranges, bridging small
/// gaps where every line in the gap is non-instrumented.
///
/// Both `lines` and `all_instrumented` must be sorted and deduplicated.
#[must_use]
pub fn coalesce_ranges(lines: &[u32], all_instrumented: &[u32]) -> Vec<(u32, u32)> {
    let Some((&first, rest)) = lines.split_first() else {
        return Vec::new();
    };

    let mut ranges = Vec::new();
    let (mut start, mut end) = (first, first);
    for &line in rest {
        let gap = line - end - 1;
        if gap <= MAX_BRIDGE_GAP
            && (end + 1..line).all(|l| all_instrumented.binary_search(&l).is_err())
        {
            end = line;
        } else {
            ranges.push((start, end));
            start = line;
            end = line;
        }
    }

    ranges.push((start, end));
    ranges
}

/// Format line numbers into compact range notation, e.g. "1, 3-5, 8".
#[must_use]
pub fn format_line_ranges(lines: &[u32], all_instrumented: &[u32]) -> String {
    coalesce_ranges(lines, all_instrumented)
        .iter()
        .map(|&(start, end)| {
            if start == end {
                start.to_string()
            } else {
                format!("{start}-{end}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MetricTallies, Tally};

    fn sample_report() -> CoverageReport {
        let file = |path: &str, line: (u64, u64), uncovered: Vec<u32>, instrumented: Vec<u32>| {
            FileMetrics {
                path: path.to_string(),
                metrics: MetricTallies {
                    line: Tally::new(line.0, line.1),
                    ..Default::default()
                }
                .into_metrics(),
                uncovered_lines: uncovered,
                instrumented_lines: instrumented,
            }
        };

        CoverageReport {
            generated_at: None,
            metrics: MetricTallies {
                class: Tally::new(1, 3),
                method: Tally::new(2, 4),
                line: Tally::new(8, 13),
                branch: Tally::new(5, 9),
            }
            .into_metrics(),
            files: vec![
                file("src/full.ts", (3, 3), vec![], vec![1, 2, 3]),
                file("src/half.ts", (2, 4), vec![3, 4], vec![1, 2, 3, 4]),
            ],
            failures: vec![],
        }
    }

    #[test]
    fn test_coalesce_ranges() {
        assert_eq!(coalesce_ranges(&[], &[]), Vec::<(u32, u32)>::new());
        assert_eq!(coalesce_ranges(&[5], &[5]), vec![(5, 5)]);
        assert_eq!(coalesce_ranges(&[1, 2, 3], &[1, 2, 3]), vec![(1, 3)]);
        // Line 3 not instrumented → bridge
        assert_eq!(coalesce_ranges(&[1, 2, 4, 5], &[1, 2, 4, 5]), vec![(1, 5)]);
        // Line 3 instrumented and covered → no bridge
        assert_eq!(
            coalesce_ranges(&[1, 2, 4, 5], &[1, 2, 3, 4, 5]),
            vec![(1, 2), (4, 5)]
        );
        // Gap of three is too wide
        assert_eq!(
            coalesce_ranges(&[1, 2, 6, 7], &[1, 2, 6, 7]),
            vec![(1, 2), (6, 7)]
        );
    }

    #[test]
    fn test_format_line_ranges() {
        assert_eq!(format_line_ranges(&[], &[]), "");
        assert_eq!(
            format_line_ranges(&[1, 3, 4, 5, 10], &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]),
            "1, 3-5, 10"
        );
    }

    #[test]
    fn test_text_format() {
        let out = sample_report().format(&TextFormatter);

        assert!(out.contains("Classes:    1/3 (33.3%)"));
        assert!(out.contains("Lines:      8/13 (61.5%)"));
        assert!(out.contains("Branches:   5/9 (55.6%)"));
        // Worst file first.
        let half = out.find("src/half.ts").unwrap();
        let full = out.find("src/full.ts").unwrap();
        assert!(half < full);
        assert!(out.contains("uncovered: 3-4"));
        assert!(!out.contains("FAIL"));
    }

    #[test]
    fn test_text_format_failures() {
        let mut report = sample_report();
        report.failures.push(ThresholdFailure {
            kind: MetricKind::Line,
            actual: 61.54,
            minimum: 80.0,
        });
        assert!(!report.passed());
        let out = report.format(&TextFormatter);
        assert!(out.contains("FAIL: Lines coverage 61.54% below threshold 80%"));
    }

    #[test]
    fn test_markdown_format() {
        let mut report = sample_report();
        report.generated_at = Some("2026-01-01T00:00:00Z".to_string());
        let md = report.format(&MarkdownFormatter);

        assert!(md.contains("## Coverage Report"));
        assert!(md.contains("Generated: 2026-01-01T00:00:00Z"));
        assert!(md.contains("| Lines | 8 | 13 | 61.54% |"));
        assert!(md.contains("| `src/half.ts` |"));
        assert!(md.contains("**`src/half.ts`**: 3-4"));
        assert!(!md.contains("**`src/full.ts`**"));
        assert!(!md.contains("Threshold failures"));
    }

    #[test]
    fn test_json_format() {
        let json = sample_report().format(&JsonFormatter);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["metrics"]["line"]["covered"], 8);
        assert_eq!(value["metrics"]["branch"]["total"], 9);
        assert_eq!(value["files"][1]["path"], "src/half.ts");
        assert_eq!(value["files"][1]["line"]["total"], 4);
        assert_eq!(value["files"][1]["uncovered_lines"], serde_json::json!([3, 4]));
        assert!(value.get("generated_at").is_none());
        assert_eq!(value["failures"], serde_json::json!([]));
    }

    #[test]
    fn test_stamped() {
        let report = CoverageReport::new(CoverageMetrics::default()).stamped();
        assert!(report.generated_at.is_some());
        assert!(report.passed());
    }
}
