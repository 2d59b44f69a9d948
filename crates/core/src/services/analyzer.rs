use chrono::{DateTime, Duration, Months, Utc};
use std::sync::Arc;

use crate::errors::CoreError;
use crate::models::analysis::{AnalysisResult, ScalarRow, VolatilityRow};
use crate::models::table::AlignedTable;
use crate::providers::traits::{BenchmarkPriceSource, HistoricalPriceSource};
use crate::providers::yahoo_finance::DEFAULT_BENCHMARKS;

/// Default asset set used when the request leaves `assets` empty.
const DEFAULT_ASSETS: &[&str] = &["bitcoin", "ethereum", "binancecoin"];

/// Default quote currency.
const DEFAULT_CURRENCY: &str = "usd";

/// Which benchmark indices to merge into the analysis, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BenchmarkSelection {
    /// No benchmark columns.
    None,
    /// The built-in index set (S&P500, Dow Jones, Nasdaq, Hang Seng, B3).
    #[default]
    Default,
    /// Caller-supplied index tickers.
    Tickers(Vec<String>),
}

/// Parameters for one analysis run.
///
/// Empty `assets` means the default three-coin set. `from`/`to` default to
/// four months ago through yesterday, resolved at call time.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeRequest {
    pub assets: Vec<String>,
    pub currency: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub benchmarks: BenchmarkSelection,
}

/// Fetches historical prices for a set of assets (plus optional benchmark
/// indices), aligns them on a common date index, and derives return,
/// performance, and volatility tables.
///
/// Both data sources are injected; the analyzer holds no other state and
/// every run returns a fresh, caller-owned [`AnalysisResult`].
pub struct PortfolioAnalyzer {
    prices: Arc<dyn HistoricalPriceSource>,
    benchmarks: Option<Arc<dyn BenchmarkPriceSource>>,
}

impl PortfolioAnalyzer {
    pub fn new(
        prices: Arc<dyn HistoricalPriceSource>,
        benchmarks: Option<Arc<dyn BenchmarkPriceSource>>,
    ) -> Self {
        Self { prices, benchmarks }
    }

    /// Run the full pipeline: validate → fetch → align → fill → derive.
    ///
    /// All-or-nothing for the primary asset set: any asset that fails to
    /// fetch, or returns zero points, aborts the run. Benchmarks are
    /// supplementary — a failed or empty benchmark is logged and omitted.
    pub async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisResult, CoreError> {
        let assets: Vec<String> = if request.assets.is_empty() {
            DEFAULT_ASSETS.iter().map(|s| (*s).to_string()).collect()
        } else {
            request.assets.clone()
        };
        for (i, asset) in assets.iter().enumerate() {
            if assets[..i].contains(asset) {
                return Err(CoreError::InvalidRequest(format!(
                    "duplicate asset identifier '{asset}'"
                )));
            }
        }

        let currency = request
            .currency
            .clone()
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

        let now = Utc::now();
        let from = match request.from {
            Some(t) => t,
            None => now
                .checked_sub_months(Months::new(4))
                .ok_or_else(|| CoreError::InvalidRequest("window start out of range".into()))?,
        };
        let to = request.to.unwrap_or(now - Duration::days(1));
        if from >= to {
            return Err(CoreError::InvalidWindow {
                from: from.to_rfc3339(),
                to: to.to_rfc3339(),
            });
        }

        // Benchmark selection is validated up front too, so a malformed
        // request fails before any network call is issued.
        let tickers = self.resolve_benchmarks(&request.benchmarks)?;
        let bench_source = if tickers.is_empty() {
            None
        } else {
            Some(self.benchmarks.as_ref().ok_or_else(|| {
                CoreError::InvalidRequest(
                    "benchmarks requested but no benchmark source configured".into(),
                )
            })?)
        };

        // 1. Fetch each asset and collect into one table keyed by asset id.
        let mut table = AlignedTable::new();
        for asset in &assets {
            let series = self
                .prices
                .fetch_price_history(asset, &currency, from, to)
                .await?;
            if series.is_empty() {
                return Err(CoreError::EmptyResult {
                    id: asset.clone(),
                    from: from.to_rfc3339(),
                    to: to.to_rfc3339(),
                });
            }
            table.insert_series(asset, &series)?;
        }

        // 2. Merge benchmark columns over the realized asset index bounds,
        // not the requested window — the feeds rarely cover it exactly.
        if let Some(source) = bench_source {
            let start = table.index()[0];
            let end = table.index()[table.num_rows() - 1];

            for ticker in &tickers {
                match source.fetch_index_history(ticker, start, end).await {
                    Ok(series) if !series.is_empty() => {
                        let label = source.display_name(ticker);
                        table.insert_series(&label, &series)?;
                    }
                    Ok(_) => {
                        tracing::warn!(%ticker, %start, %end, "benchmark returned no data, omitting column");
                    }
                    Err(e) => {
                        tracing::warn!(%ticker, error = %e, "benchmark fetch failed, omitting column");
                    }
                }
            }
        }

        // 3. Close trading-calendar gaps: forward-fill, then back-fill so
        // leading gaps take the nearest following value.
        table.forward_fill();
        table.back_fill();

        Self::derive(table)
    }

    fn resolve_benchmarks(&self, selection: &BenchmarkSelection) -> Result<Vec<String>, CoreError> {
        match selection {
            BenchmarkSelection::None => Ok(Vec::new()),
            BenchmarkSelection::Default => Ok(DEFAULT_BENCHMARKS
                .iter()
                .map(|(ticker, _)| (*ticker).to_string())
                .collect()),
            BenchmarkSelection::Tickers(tickers) => {
                for (i, t) in tickers.iter().enumerate() {
                    if tickers[..i].contains(t) {
                        return Err(CoreError::InvalidRequest(format!(
                            "duplicate benchmark ticker '{t}'"
                        )));
                    }
                }
                Ok(tickers.clone())
            }
        }
    }

    /// Compute the five derived tables from the filled price table.
    fn derive(prices: AlignedTable) -> Result<AnalysisResult, CoreError> {
        let n = prices.num_rows();
        let mut simple_return = prices.like();
        let mut log_return = prices.like();
        let mut normalized = prices.like();
        let mut cumulative = Vec::with_capacity(prices.num_columns());
        let mut volatility = Vec::with_capacity(prices.num_columns());

        for column in prices.columns() {
            let values = &column.values;

            // First row has no prior value: kept as an explicit empty cell.
            let mut simple = vec![None; n];
            let mut log = vec![None; n];
            for t in 1..n {
                if let (Some(prev), Some(cur)) = (values[t - 1], values[t]) {
                    simple[t] = Some((cur / prev - 1.0) * 100.0);
                    log[t] = Some((cur / prev).ln() * 100.0);
                }
            }

            let first = values.iter().find_map(|v| *v).ok_or_else(|| {
                CoreError::MisalignedInput(format!("column '{}' has no values after fill", column.name))
            })?;
            let last = values.iter().rev().find_map(|v| *v).unwrap_or(first);

            let norm: Vec<Option<f64>> = values
                .iter()
                .map(|v| v.map(|p| round2(p / first * 100.0)))
                .collect();

            cumulative.push((column.name.clone(), (last - first) / first * 100.0));
            volatility.push((column.name.clone(), sample_std(&log)));

            simple_return.push_column(&column.name, simple)?;
            log_return.push_column(&column.name, log)?;
            normalized.push_column(&column.name, norm)?;
        }

        // Any gap left in normalized performance is carried forward, as the
        // source table does for its own output.
        normalized.forward_fill();

        Ok(AnalysisResult {
            prices,
            simple_return,
            log_return,
            cumulative_return: ScalarRow { entries: cumulative },
            normalized_performance: normalized,
            volatility: VolatilityRow { entries: volatility },
        })
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Sample standard deviation (n − 1 denominator) over the filled cells.
/// `None` with fewer than two observations.
fn sample_std(values: &[Option<f64>]) -> Option<f64> {
    let observed: Vec<f64> = values.iter().filter_map(|v| *v).collect();
    if observed.len() < 2 {
        return None;
    }
    let n = observed.len() as f64;
    let mean = observed.iter().sum::<f64>() / n;
    let var = observed.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(var.sqrt())
}
