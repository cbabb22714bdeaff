//! Aggregation of per-file tallies into [`CoverageMetrics`].

use std::borrow::Cow;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::classes::{ClassNameMatcher, SubstringMatcher};
use crate::config::AnalyzerConfig;
use crate::loader;
use crate::metrics::{
    BranchCalculator, ClassCalculator, LineCalculator, MethodCalculator, MetricCalculator,
};
use crate::model::{CoverageMetrics, FileMetrics, MetricTallies};
use crate::record::{CoverageMap, FileCoverageRecord};

/// Computes class, method, line and branch coverage for a coverage map.
///
/// Holds only configuration, so one analyzer can serve any number of
/// concurrent analyses.
pub struct Analyzer {
    config: AnalyzerConfig,
    matcher: Box<dyn ClassNameMatcher + Send + Sync>,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default())
    }
}

impl Analyzer {
    /// An analyzer using the loose [`SubstringMatcher`].
    pub fn new(config: AnalyzerConfig) -> Self {
        Self {
            config,
            matcher: Box::new(SubstringMatcher),
        }
    }

    #[must_use]
    pub fn with_matcher(mut self, matcher: impl ClassNameMatcher + Send + Sync + 'static) -> Self {
        self.matcher = Box::new(matcher);
        self
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Resolve the coverage map for `test_results` and aggregate it.
    ///
    /// Never fails: missing or malformed data yields zero-valued metrics.
    pub fn analyze(&self, test_results: &Value) -> CoverageMetrics {
        let loaded = loader::resolve(test_results, &self.config);
        debug!(source = ?loaded.source, files = loaded.map.len(), "analyzing coverage");
        self.analyze_map(&loaded.map)
    }

    /// Aggregate an already loaded map. Counts are summed across files
    /// before percentages are computed.
    pub fn analyze_map(&self, map: &CoverageMap) -> CoverageMetrics {
        let mut totals = MetricTallies::default();
        for (path, record) in map {
            totals += self.tally_file(path, record);
        }
        totals.into_metrics()
    }

    /// Per-file metrics, ordered by path.
    pub fn analyze_files(&self, map: &CoverageMap) -> Vec<FileMetrics> {
        map.iter()
            .map(|(path, record)| {
                let mut numbered: Vec<(u32, u64)> = record
                    .lines
                    .iter()
                    .filter_map(|l| l.number().map(|n| (n, l.hit_count)))
                    .collect();
                numbered.sort_unstable();
                numbered.dedup_by_key(|(n, _)| *n);

                FileMetrics {
                    path: path.clone(),
                    metrics: self.tally_file(path, record).into_metrics(),
                    uncovered_lines: numbered
                        .iter()
                        .filter(|(_, hits)| *hits == 0)
                        .map(|(n, _)| *n)
                        .collect(),
                    instrumented_lines: numbered.iter().map(|(n, _)| *n).collect(),
                }
            })
            .collect()
    }

    fn tally_file(&self, path: &str, record: &FileCoverageRecord) -> MetricTallies {
        let record = self.with_source(path, record);
        let class_calc = ClassCalculator::new(&*self.matcher);
        let calculators: [&dyn MetricCalculator; 4] = [
            &class_calc,
            &MethodCalculator,
            &LineCalculator,
            &BranchCalculator,
        ];

        let mut tallies = MetricTallies::default();
        for calc in calculators {
            *tallies.get_mut(calc.kind()) += calc.tally(&record);
        }
        tallies
    }

    /// Fill in missing source text from disk when configured to.
    fn with_source<'r>(
        &self,
        path: &str,
        record: &'r FileCoverageRecord,
    ) -> Cow<'r, FileCoverageRecord> {
        if !self.config.read_sources || record.source_text.is_some() {
            return Cow::Borrowed(record);
        }

        let source_path = self.config.resolve(Path::new(path));
        match std::fs::read_to_string(&source_path) {
            Ok(text) => {
                let mut owned = record.clone();
                owned.source_text = Some(text);
                Cow::Owned(owned)
            }
            Err(e) => {
                debug!(path = %source_path.display(), error = %e, "source not readable");
                Cow::Borrowed(record)
            }
        }
    }
}
