//! Minimum-coverage checks and per-file gap ranking.

use std::fmt;

use serde::Serialize;

use crate::error::{CoverageError, Result};
use crate::model::{CoverageMetrics, FileMetrics, MetricKind};

/// Metrics considered when ranking per-file gaps. Class coverage is left
/// out since most files declare at most one class.
const GAP_METRICS: [MetricKind; 3] = [MetricKind::Line, MetricKind::Branch, MetricKind::Method];

/// Parse a percentage in `0..=100`.
pub fn parse_percentage(s: &str) -> Result<f64> {
    match s.trim().trim_end_matches('%').parse::<f64>() {
        Ok(v) if (0.0..=100.0).contains(&v) => Ok(v),
        _ => Err(CoverageError::InvalidThreshold(s.to_string())),
    }
}

/// Optional minimum percentage per metric.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Thresholds {
    pub class: Option<f64>,
    pub method: Option<f64>,
    pub line: Option<f64>,
    pub branch: Option<f64>,
}

impl Thresholds {
    #[must_use]
    pub fn get(&self, kind: MetricKind) -> Option<f64> {
        match kind {
            MetricKind::Class => self.class,
            MetricKind::Method => self.method,
            MetricKind::Line => self.line,
            MetricKind::Branch => self.branch,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        MetricKind::ALL.iter().all(|k| self.get(*k).is_none())
    }

    /// One failure per metric whose percentage is below its minimum.
    #[must_use]
    pub fn check(&self, metrics: &CoverageMetrics) -> Vec<ThresholdFailure> {
        MetricKind::ALL
            .iter()
            .filter_map(|&kind| {
                let minimum = self.get(kind)?;
                let actual = metrics.get(kind).percentage;
                (actual < minimum).then_some(ThresholdFailure {
                    kind,
                    actual,
                    minimum,
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdFailure {
    pub kind: MetricKind,
    pub actual: f64,
    pub minimum: f64,
}

impl fmt::Display for ThresholdFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} coverage {:.2}% below threshold {}%",
            self.kind.label(),
            self.actual,
            self.minimum
        )
    }
}

/// One metric of one file falling short of the target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapIssue {
    pub kind: MetricKind,
    pub current: f64,
    pub target: f64,
    pub gap: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageGap {
    pub path: String,
    pub issues: Vec<GapIssue>,
    /// Largest gap among `issues`.
    pub priority: f64,
}

/// Files with at least one line, branch or method percentage under
/// `threshold`, largest gap first. Metrics with nothing to cover are not
/// flagged.
#[must_use]
pub fn coverage_gaps(files: &[FileMetrics], threshold: f64) -> Vec<CoverageGap> {
    let mut gaps: Vec<CoverageGap> = files
        .iter()
        .filter_map(|file| {
            let issues: Vec<GapIssue> = GAP_METRICS
                .iter()
                .filter_map(|&kind| {
                    let detail = file.metrics.get(kind);
                    (detail.total > 0 && detail.percentage < threshold).then(|| GapIssue {
                        kind,
                        current: detail.percentage,
                        target: threshold,
                        gap: threshold - detail.percentage,
                    })
                })
                .collect();
            if issues.is_empty() {
                return None;
            }
            let priority = issues.iter().map(|i| i.gap).fold(0.0, f64::max);
            Some(CoverageGap {
                path: file.path.clone(),
                issues,
                priority,
            })
        })
        .collect();

    gaps.sort_by(|a, b| {
        b.priority
            .total_cmp(&a.priority)
            .then_with(|| a.path.cmp(&b.path))
    });
    gaps
}
