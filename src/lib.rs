pub mod analyzer;
pub mod classes;
pub mod cli;
pub mod config;
pub mod error;
pub mod loader;
pub mod metrics;
pub mod model;
pub mod record;
pub mod report;
pub mod threshold;

pub use analyzer::Analyzer;
pub use config::AnalyzerConfig;
pub use model::{CoverageMetrics, MetricDetail};
