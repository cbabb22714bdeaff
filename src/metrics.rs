//! The four per-file metric calculators.
//!
//! Each reduces one normalized record to a [`Tally`]. Aggregation across
//! files sums tallies before any percentage is computed.

use crate::classes::{extract_classes, is_class_covered, ClassNameMatcher};
use crate::model::{MetricKind, Tally};
use crate::record::FileCoverageRecord;

/// Every metric calculator implements this trait.
pub trait MetricCalculator {
    fn kind(&self) -> MetricKind;

    /// Covered/total counts contributed by a single file.
    fn tally(&self, record: &FileCoverageRecord) -> Tally;
}

/// Count entries, and those with a nonzero hit count.
fn count_hits<I>(hits: I) -> Tally
where
    I: IntoIterator<Item = u64>,
{
    hits.into_iter().fold(Tally::default(), |acc, hits| {
        acc + Tally {
            covered: u64::from(hits > 0),
            total: 1,
        }
    })
}

pub struct LineCalculator;

impl MetricCalculator for LineCalculator {
    fn kind(&self) -> MetricKind {
        MetricKind::Line
    }

    fn tally(&self, record: &FileCoverageRecord) -> Tally {
        count_hits(record.lines.iter().map(|l| l.hit_count))
    }
}

/// Every arm of every branch group counts once.
pub struct BranchCalculator;

impl MetricCalculator for BranchCalculator {
    fn kind(&self) -> MetricKind {
        MetricKind::Branch
    }

    fn tally(&self, record: &FileCoverageRecord) -> Tally {
        count_hits(record.branches.values().flatten().copied())
    }
}

pub struct MethodCalculator;

impl MetricCalculator for MethodCalculator {
    fn kind(&self) -> MetricKind {
        MetricKind::Method
    }

    fn tally(&self, record: &FileCoverageRecord) -> Tally {
        count_hits(record.functions.values().copied())
    }
}

/// Declared classes form the total; a class is covered when the matcher
/// attributes at least one executed function to it.
pub struct ClassCalculator<'a> {
    matcher: &'a dyn ClassNameMatcher,
}

impl<'a> ClassCalculator<'a> {
    pub fn new(matcher: &'a dyn ClassNameMatcher) -> Self {
        Self { matcher }
    }
}

impl MetricCalculator for ClassCalculator<'_> {
    fn kind(&self) -> MetricKind {
        MetricKind::Class
    }

    fn tally(&self, record: &FileCoverageRecord) -> Tally {
        let classes = extract_classes(record.source_text.as_deref());
        let covered = classes
            .iter()
            .filter(|class| is_class_covered(self.matcher, class, record))
            .count();
        Tally::new(covered as u64, classes.len() as u64)
    }
}
