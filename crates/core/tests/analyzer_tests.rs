// ═══════════════════════════════════════════════════════════════════
// Analyzer Tests — PortfolioAnalyzer pipeline against mock sources
// ═══════════════════════════════════════════════════════════════════

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use coinlens_core::errors::CoreError;
use coinlens_core::models::series::{PricePoint, TimeSeries};
use coinlens_core::providers::traits::{BenchmarkPriceSource, HistoricalPriceSource};
use coinlens_core::services::analyzer::{AnalyzeRequest, BenchmarkSelection, PortfolioAnalyzer};

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
}

fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, day, 0, 0, 0).unwrap()
}

fn points(raw: &[(u32, f64)]) -> Vec<PricePoint> {
    raw.iter()
        .map(|&(day, price)| PricePoint { date: d(day), price })
        .collect()
}

fn approx(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-9, "expected {b}, got {a}");
}

// ── Mock sources ────────────────────────────────────────────────────

struct MockPriceSource {
    series: HashMap<String, Vec<PricePoint>>,
    calls: AtomicUsize,
}

impl MockPriceSource {
    fn new(series: HashMap<String, Vec<PricePoint>>) -> Self {
        Self {
            series,
            calls: AtomicUsize::new(0),
        }
    }

    fn single(asset: &str, raw: &[(u32, f64)]) -> Self {
        let mut series = HashMap::new();
        series.insert(asset.to_string(), points(raw));
        Self::new(series)
    }
}

#[async_trait]
impl HistoricalPriceSource for MockPriceSource {
    fn name(&self) -> &str {
        "MockPrices"
    }

    async fn fetch_price_history(
        &self,
        asset_id: &str,
        _currency: &str,
        _from: DateTime<Utc>,
        _to: DateTime<Utc>,
    ) -> Result<TimeSeries, CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.series.get(asset_id) {
            Some(points) => TimeSeries::from_points(points.clone()),
            None => Err(CoreError::SourceUnavailable {
                provider: "MockPrices".into(),
                message: format!("unknown asset {asset_id}"),
            }),
        }
    }
}

struct MockBenchmarkSource {
    series: HashMap<String, Vec<PricePoint>>,
}

#[async_trait]
impl BenchmarkPriceSource for MockBenchmarkSource {
    fn name(&self) -> &str {
        "MockBenchmarks"
    }

    fn display_name(&self, ticker: &str) -> String {
        match ticker {
            "^TEST" => "Test Index".to_string(),
            other => other.to_string(),
        }
    }

    async fn fetch_index_history(
        &self,
        ticker: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<TimeSeries, CoreError> {
        match self.series.get(ticker) {
            Some(points) => TimeSeries::from_points(points.clone()),
            None => Err(CoreError::SourceUnavailable {
                provider: "MockBenchmarks".into(),
                message: format!("unknown ticker {ticker}"),
            }),
        }
    }
}

fn request(assets: &[&str], from_day: u32, to_day: u32) -> AnalyzeRequest {
    AnalyzeRequest {
        assets: assets.iter().map(|s| (*s).to_string()).collect(),
        currency: Some("usd".into()),
        from: Some(at(from_day)),
        to: Some(at(to_day)),
        benchmarks: BenchmarkSelection::None,
    }
}

// ── Core scenarios ──────────────────────────────────────────────────

#[tokio::test]
async fn single_asset_derived_tables() {
    let prices = Arc::new(MockPriceSource::single(
        "asseta",
        &[(1, 100.0), (2, 110.0), (3, 99.0)],
    ));
    let analyzer = PortfolioAnalyzer::new(prices, None);

    let result = analyzer.analyze(&request(&["asseta"], 1, 5)).await.unwrap();

    assert_eq!(result.prices.index(), &[d(1), d(2), d(3)]);
    assert_eq!(
        result.prices.column("asseta").unwrap(),
        &[Some(100.0), Some(110.0), Some(99.0)]
    );

    // Simple return: leading cell empty, then percent changes
    let simple = result.simple_return.column("asseta").unwrap();
    assert_eq!(simple[0], None);
    approx(simple[1].unwrap(), 10.0);
    approx(simple[2].unwrap(), -10.0);

    // Log return: ln ratios, percent-scaled
    let log = result.log_return.column("asseta").unwrap();
    assert_eq!(log[0], None);
    approx(log[1].unwrap(), (110.0f64 / 100.0).ln() * 100.0);
    approx(log[2].unwrap(), (99.0f64 / 110.0).ln() * 100.0);

    // Cumulative return: one scalar, (99 - 100) / 100 * 100
    approx(result.cumulative_return.get("asseta").unwrap(), -1.0);

    // Normalized performance: first row exactly 100
    assert_eq!(
        result.normalized_performance.column("asseta").unwrap(),
        &[Some(100.0), Some(110.0), Some(99.0)]
    );

    // Volatility: sample std of the two log returns
    let r1 = (110.0f64 / 100.0).ln() * 100.0;
    let r2 = (99.0f64 / 110.0).ln() * 100.0;
    let mean = (r1 + r2) / 2.0;
    let expected = ((r1 - mean).powi(2) + (r2 - mean).powi(2)).sqrt();
    approx(result.volatility.get("asseta").unwrap(), expected);
}

#[tokio::test]
async fn empty_fetch_for_only_asset_fails_with_empty_result() {
    let prices = Arc::new(MockPriceSource::single("asseta", &[]));
    let analyzer = PortfolioAnalyzer::new(prices, None);

    let result = analyzer.analyze(&request(&["asseta"], 1, 5)).await;
    assert!(matches!(result, Err(CoreError::EmptyResult { .. })));
}

#[tokio::test]
async fn equal_window_bounds_fail_before_any_fetch() {
    let prices = Arc::new(MockPriceSource::single("asseta", &[(1, 100.0)]));
    let analyzer = PortfolioAnalyzer::new(prices.clone(), None);

    let result = analyzer.analyze(&request(&["asseta"], 3, 3)).await;
    assert!(matches!(result, Err(CoreError::InvalidWindow { .. })));
    assert_eq!(prices.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn inverted_window_bounds_fail() {
    let prices = Arc::new(MockPriceSource::single("asseta", &[(1, 100.0)]));
    let analyzer = PortfolioAnalyzer::new(prices, None);

    let result = analyzer.analyze(&request(&["asseta"], 5, 1)).await;
    assert!(matches!(result, Err(CoreError::InvalidWindow { .. })));
}

#[tokio::test]
async fn duplicate_asset_ids_are_rejected() {
    let prices = Arc::new(MockPriceSource::single("asseta", &[(1, 100.0), (2, 101.0)]));
    let analyzer = PortfolioAnalyzer::new(prices.clone(), None);

    let result = analyzer.analyze(&request(&["asseta", "asseta"], 1, 5)).await;
    assert!(matches!(result, Err(CoreError::InvalidRequest(_))));
    assert_eq!(prices.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn source_failure_propagates() {
    let prices = Arc::new(MockPriceSource::new(HashMap::new()));
    let analyzer = PortfolioAnalyzer::new(prices, None);

    let result = analyzer.analyze(&request(&["asseta"], 1, 5)).await;
    assert!(matches!(result, Err(CoreError::SourceUnavailable { .. })));
}

#[tokio::test]
async fn analysis_is_idempotent_against_a_fixed_snapshot() {
    let mut series = HashMap::new();
    series.insert("asseta".to_string(), points(&[(1, 100.0), (2, 110.0), (3, 99.0)]));
    series.insert("assetb".to_string(), points(&[(1, 50.0), (2, 55.0), (3, 60.0)]));
    let prices = Arc::new(MockPriceSource::new(series));
    let analyzer = PortfolioAnalyzer::new(prices, None);

    let req = request(&["asseta", "assetb"], 1, 5);
    let first = analyzer.analyze(&req).await.unwrap();
    let second = analyzer.analyze(&req).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn columns_keep_request_order() {
    let mut series = HashMap::new();
    series.insert("zeta".to_string(), points(&[(1, 1.0), (2, 2.0)]));
    series.insert("alpha".to_string(), points(&[(1, 3.0), (2, 4.0)]));
    let prices = Arc::new(MockPriceSource::new(series));
    let analyzer = PortfolioAnalyzer::new(prices, None);

    let result = analyzer.analyze(&request(&["zeta", "alpha"], 1, 5)).await.unwrap();
    assert_eq!(result.prices.column_names(), vec!["zeta", "alpha"]);
}

#[tokio::test]
async fn misaligned_asset_index_is_filled_both_ways() {
    let mut series = HashMap::new();
    series.insert("asseta".to_string(), points(&[(1, 100.0), (3, 102.0)]));
    series.insert("assetb".to_string(), points(&[(2, 50.0), (3, 51.0), (4, 52.0)]));
    let prices = Arc::new(MockPriceSource::new(series));
    let analyzer = PortfolioAnalyzer::new(prices, None);

    let result = analyzer.analyze(&request(&["asseta", "assetb"], 1, 5)).await.unwrap();

    assert_eq!(result.prices.index(), &[d(1), d(2), d(3), d(4)]);
    // asseta: gap at day 2 forward-filled, day 4 carried forward
    assert_eq!(
        result.prices.column("asseta").unwrap(),
        &[Some(100.0), Some(100.0), Some(102.0), Some(102.0)]
    );
    // assetb: leading gap back-filled from day 2
    assert_eq!(
        result.prices.column("assetb").unwrap(),
        &[Some(50.0), Some(50.0), Some(51.0), Some(52.0)]
    );
}

// ── Benchmarks ──────────────────────────────────────────────────────

fn benchmark_setup(
    bench: HashMap<String, Vec<PricePoint>>,
) -> (Arc<MockPriceSource>, PortfolioAnalyzer) {
    let prices = Arc::new(MockPriceSource::single(
        "asseta",
        &[(1, 100.0), (2, 110.0), (3, 99.0), (4, 105.0)],
    ));
    let benchmarks = Arc::new(MockBenchmarkSource { series: bench });
    let analyzer = PortfolioAnalyzer::new(prices.clone(), Some(benchmarks));
    (prices, analyzer)
}

#[tokio::test]
async fn benchmark_columns_use_display_names_and_fill_calendar_gaps() {
    let mut bench = HashMap::new();
    // Closed on day 2 and day 3 (weekend), no data before day 2 either
    bench.insert("^TEST".to_string(), points(&[(2, 1000.0), (4, 1040.0)]));
    let (_, analyzer) = benchmark_setup(bench);

    let mut req = request(&["asseta"], 1, 5);
    req.benchmarks = BenchmarkSelection::Tickers(vec!["^TEST".into()]);
    let result = analyzer.analyze(&req).await.unwrap();

    assert_eq!(result.prices.column_names(), vec!["asseta", "Test Index"]);
    // Day 1 back-filled from day 2; day 3 forward-filled from day 2
    assert_eq!(
        result.prices.column("Test Index").unwrap(),
        &[Some(1000.0), Some(1000.0), Some(1000.0), Some(1040.0)]
    );
}

#[tokio::test]
async fn failed_benchmark_is_omitted_not_fatal() {
    let mut bench = HashMap::new();
    bench.insert("^TEST".to_string(), points(&[(1, 1000.0), (4, 1040.0)]));
    let (_, analyzer) = benchmark_setup(bench);

    let mut req = request(&["asseta"], 1, 5);
    req.benchmarks = BenchmarkSelection::Tickers(vec!["^MISSING".into(), "^TEST".into()]);
    let result = analyzer.analyze(&req).await.unwrap();

    // The unknown ticker errors in the mock and is dropped with a warning
    assert_eq!(result.prices.column_names(), vec!["asseta", "Test Index"]);
}

#[tokio::test]
async fn empty_benchmark_is_omitted_not_fatal() {
    let mut bench = HashMap::new();
    bench.insert("^TEST".to_string(), Vec::new());
    let (_, analyzer) = benchmark_setup(bench);

    let mut req = request(&["asseta"], 1, 5);
    req.benchmarks = BenchmarkSelection::Tickers(vec!["^TEST".into()]);
    let result = analyzer.analyze(&req).await.unwrap();

    assert_eq!(result.prices.column_names(), vec!["asseta"]);
}

#[tokio::test]
async fn benchmarks_requested_without_a_source_fail_before_any_fetch() {
    let prices = Arc::new(MockPriceSource::single("asseta", &[(1, 100.0), (2, 101.0)]));
    let analyzer = PortfolioAnalyzer::new(prices.clone(), None);

    let mut req = request(&["asseta"], 1, 5);
    req.benchmarks = BenchmarkSelection::Default;
    let result = analyzer.analyze(&req).await;
    assert!(matches!(result, Err(CoreError::InvalidRequest(_))));
    assert_eq!(prices.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn duplicate_benchmark_tickers_are_rejected_before_any_fetch() {
    let mut bench = HashMap::new();
    bench.insert("^TEST".to_string(), points(&[(1, 1000.0), (4, 1040.0)]));
    let (prices, analyzer) = benchmark_setup(bench);

    let mut req = request(&["asseta"], 1, 5);
    req.benchmarks = BenchmarkSelection::Tickers(vec!["^TEST".into(), "^TEST".into()]);
    let result = analyzer.analyze(&req).await;
    assert!(matches!(result, Err(CoreError::InvalidRequest(_))));
    assert_eq!(prices.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn default_assets_are_used_when_none_given() {
    let mut series = HashMap::new();
    for id in ["bitcoin", "ethereum", "binancecoin"] {
        series.insert(id.to_string(), points(&[(1, 10.0), (2, 11.0)]));
    }
    let prices = Arc::new(MockPriceSource::new(series));
    let analyzer = PortfolioAnalyzer::new(prices, None);

    let req = AnalyzeRequest {
        benchmarks: BenchmarkSelection::None,
        ..AnalyzeRequest::default()
    };
    let result = analyzer.analyze(&req).await.unwrap();
    assert_eq!(
        result.prices.column_names(),
        vec!["bitcoin", "ethereum", "binancecoin"]
    );
}

#[tokio::test]
async fn volatility_is_none_with_a_single_observation() {
    let prices = Arc::new(MockPriceSource::single("asseta", &[(1, 100.0)]));
    let analyzer = PortfolioAnalyzer::new(prices, None);

    let result = analyzer.analyze(&request(&["asseta"], 1, 5)).await.unwrap();
    assert_eq!(result.volatility.get("asseta"), None);
    approx(result.cumulative_return.get("asseta").unwrap(), 0.0);
}
