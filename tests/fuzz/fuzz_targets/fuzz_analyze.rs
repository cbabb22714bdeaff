#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Analysis must not panic on any JSON input.
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    let analyzer = covmetrics::Analyzer::new(covmetrics::AnalyzerConfig::new("/nonexistent"));
    let metrics = analyzer.analyze(&serde_json::json!({ "coverageMap": value }));
    assert!(metrics.line.covered <= metrics.line.total);
    assert!(metrics.branch.percentage.is_finite());
});
