//! Result types shared by the calculators, the analyzer and the report
//! formatters.

use std::ops::{Add, AddAssign};

use serde::Serialize;

/// Compute a coverage rate, returning 0.0 when the total is zero.
#[must_use]
pub fn rate(covered: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        covered as f64 / total as f64
    }
}

/// Running covered/total accumulator for one metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub covered: u64,
    pub total: u64,
}

impl Tally {
    #[must_use]
    pub fn new(covered: u64, total: u64) -> Self {
        debug_assert!(covered <= total, "covered {covered} exceeds total {total}");
        Self { covered, total }
    }

    #[must_use]
    pub fn detail(self) -> MetricDetail {
        MetricDetail::from(self)
    }
}

impl Add for Tally {
    type Output = Tally;

    fn add(self, rhs: Tally) -> Tally {
        Tally {
            covered: self.covered + rhs.covered,
            total: self.total + rhs.total,
        }
    }
}

impl AddAssign for Tally {
    fn add_assign(&mut self, rhs: Tally) {
        *self = *self + rhs;
    }
}

/// Covered/total/percentage triple reported for every metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MetricDetail {
    pub covered: u64,
    pub total: u64,
    /// `covered / total * 100`, or 0 when `total` is zero.
    pub percentage: f64,
}

impl MetricDetail {
    #[must_use]
    pub fn tally(&self) -> Tally {
        Tally {
            covered: self.covered,
            total: self.total,
        }
    }
}

impl From<Tally> for MetricDetail {
    fn from(t: Tally) -> Self {
        Self {
            covered: t.covered,
            total: t.total,
            percentage: rate(t.covered, t.total) * 100.0,
        }
    }
}

/// Which of the four metrics a value refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Class,
    Method,
    Line,
    Branch,
}

impl MetricKind {
    pub const ALL: [MetricKind; 4] = [
        MetricKind::Class,
        MetricKind::Method,
        MetricKind::Line,
        MetricKind::Branch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Class => "class",
            MetricKind::Method => "method",
            MetricKind::Line => "line",
            MetricKind::Branch => "branch",
        }
    }

    /// Capitalized label for human-readable output.
    pub fn label(&self) -> &'static str {
        match self {
            MetricKind::Class => "Classes",
            MetricKind::Method => "Methods",
            MetricKind::Line => "Lines",
            MetricKind::Branch => "Branches",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four aggregated metrics returned by an analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CoverageMetrics {
    pub class: MetricDetail,
    pub method: MetricDetail,
    pub line: MetricDetail,
    pub branch: MetricDetail,
}

impl CoverageMetrics {
    #[must_use]
    pub fn get(&self, kind: MetricKind) -> &MetricDetail {
        match kind {
            MetricKind::Class => &self.class,
            MetricKind::Method => &self.method,
            MetricKind::Line => &self.line,
            MetricKind::Branch => &self.branch,
        }
    }

    /// Sum several results tally-wise, recomputing percentages from the
    /// combined counts.
    #[must_use]
    pub fn merge<'a, I>(results: I) -> CoverageMetrics
    where
        I: IntoIterator<Item = &'a CoverageMetrics>,
    {
        let mut tallies = MetricTallies::default();
        for m in results {
            tallies.class += m.class.tally();
            tallies.method += m.method.tally();
            tallies.line += m.line.tally();
            tallies.branch += m.branch.tally();
        }
        tallies.into_metrics()
    }
}

/// Four running tallies, one per metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricTallies {
    pub class: Tally,
    pub method: Tally,
    pub line: Tally,
    pub branch: Tally,
}

impl MetricTallies {
    pub fn get_mut(&mut self, kind: MetricKind) -> &mut Tally {
        match kind {
            MetricKind::Class => &mut self.class,
            MetricKind::Method => &mut self.method,
            MetricKind::Line => &mut self.line,
            MetricKind::Branch => &mut self.branch,
        }
    }

    #[must_use]
    pub fn into_metrics(self) -> CoverageMetrics {
        CoverageMetrics {
            class: self.class.detail(),
            method: self.method.detail(),
            line: self.line.detail(),
            branch: self.branch.detail(),
        }
    }
}

impl AddAssign for MetricTallies {
    fn add_assign(&mut self, rhs: MetricTallies) {
        self.class += rhs.class;
        self.method += rhs.method;
        self.line += rhs.line;
        self.branch += rhs.branch;
    }
}

/// Per-file breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct FileMetrics {
    pub path: String,
    #[serde(flatten)]
    pub metrics: CoverageMetrics,
    /// Numeric line identifiers with a zero hit count, ascending.
    pub uncovered_lines: Vec<u32>,
    /// All numeric line identifiers, ascending.
    #[serde(skip)]
    pub instrumented_lines: Vec<u32>,
}
