pub mod errors;
pub mod models;
pub mod providers;
pub mod services;

use std::sync::Arc;

use chrono::{DateTime, Utc};

use errors::CoreError;
use models::analysis::AnalysisResult;
use models::market::{CoinListing, GlobalMarket, MarketListing, OhlcBar, PairSnapshot, TrendingCoin};
use models::series::TimeSeries;
use providers::coingecko::CoinGeckoProvider;
use providers::traits::{BenchmarkPriceSource, HistoricalPriceSource};
use providers::yahoo_finance::YahooBenchmarkProvider;
use services::analyzer::{AnalyzeRequest, PortfolioAnalyzer};

/// Main entry point for the CoinLens core library.
///
/// Wraps the CoinGecko market-data API into tabular structures and exposes
/// the portfolio analysis pipeline. Holds no mutable state — every call
/// returns fresh, caller-owned data.
#[must_use]
pub struct CoinLens {
    market: Arc<CoinGeckoProvider>,
    analyzer: PortfolioAnalyzer,
}

impl CoinLens {
    /// Wire up the default providers: CoinGecko for coin prices, Yahoo
    /// Finance for benchmark indices.
    pub fn new() -> Result<Self, CoreError> {
        let market = Arc::new(CoinGeckoProvider::new());
        let benchmarks: Arc<dyn BenchmarkPriceSource> = Arc::new(YahooBenchmarkProvider::new()?);
        let analyzer = PortfolioAnalyzer::new(market.clone(), Some(benchmarks));
        Ok(Self { market, analyzer })
    }

    // ── Market overview ─────────────────────────────────────────────

    /// Ping the market-data API. Returns the server's greeting line.
    pub async fn server_status(&self) -> Result<String, CoreError> {
        self.market.ping().await
    }

    /// List the supported quote currencies.
    pub async fn supported_currencies(&self) -> Result<Vec<String>, CoreError> {
        self.market.supported_currencies().await
    }

    /// Check whether a quote currency is supported (case-insensitive).
    pub async fn is_currency_supported(&self, name: &str) -> Result<bool, CoreError> {
        self.market.is_currency_supported(name).await
    }

    /// Full list of coins the data source knows about.
    pub async fn coin_list(&self) -> Result<Vec<CoinListing>, CoreError> {
        self.market.coin_list().await
    }

    /// Look up a coin by name (case-insensitive exact match).
    pub async fn find_coin(&self, name: &str) -> Result<Option<CoinListing>, CoreError> {
        self.market.find_coin(name).await
    }

    /// Snapshot of the overall market: totals, 24h change, dominance.
    pub async fn market_overview(&self) -> Result<GlobalMarket, CoreError> {
        self.market.global_overview().await
    }

    /// Top coins by market cap.
    pub async fn top_markets(&self, currency: &str, limit: u32) -> Result<Vec<MarketListing>, CoreError> {
        self.market.top_markets(currency, limit).await
    }

    /// Currently trending coins.
    pub async fn trending(&self) -> Result<Vec<TrendingCoin>, CoreError> {
        self.market.trending().await
    }

    /// Current price snapshot for one or more coin/currency pairs.
    pub async fn pair_snapshot(
        &self,
        ids: &[&str],
        currency: &str,
    ) -> Result<Vec<PairSnapshot>, CoreError> {
        self.market.pair_snapshot(ids, currency).await
    }

    /// Historical OHLC candles for a coin.
    pub async fn ohlc_history(
        &self,
        asset_id: &str,
        currency: &str,
        days: u32,
    ) -> Result<Vec<OhlcBar>, CoreError> {
        self.market.ohlc_history(asset_id, currency, days).await
    }

    // ── Historical data ─────────────────────────────────────────────

    /// A single coin's price history over `[from, to]`, daily granularity.
    pub async fn price_history(
        &self,
        asset_id: &str,
        currency: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<TimeSeries, CoreError> {
        self.market
            .fetch_price_history(asset_id, currency, from, to)
            .await
    }

    // ── Analysis ────────────────────────────────────────────────────

    /// Run the portfolio analysis pipeline and return the derived tables.
    pub async fn analyze_portfolio(
        &self,
        request: &AnalyzeRequest,
    ) -> Result<AnalysisResult, CoreError> {
        self.analyzer.analyze(request).await
    }

    /// The underlying analyzer, for callers wiring their own sources.
    #[must_use]
    pub fn analyzer(&self) -> &PortfolioAnalyzer {
        &self.analyzer
    }
}
