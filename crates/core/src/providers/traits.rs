use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::errors::CoreError;
use crate::models::series::TimeSeries;

/// Source of historical coin prices over a time window.
///
/// The analyzer only depends on this trait — swapping the concrete API
/// (or injecting a fixture in tests) never touches the analysis code.
#[async_trait]
pub trait HistoricalPriceSource: Send + Sync {
    /// Human-readable name of this source (for logs/errors).
    fn name(&self) -> &str;

    /// Fetch an asset's price series over `[from, to]` (inclusive), quoted
    /// in `currency`. Returned dates are strictly increasing.
    async fn fetch_price_history(
        &self,
        asset_id: &str,
        currency: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<TimeSeries, CoreError>;
}

/// Source of benchmark index prices (adjusted close), a distinct provider
/// with its own identifier namespace — index tickers, not coin ids.
#[async_trait]
pub trait BenchmarkPriceSource: Send + Sync {
    /// Human-readable name of this source (for logs/errors).
    fn name(&self) -> &str;

    /// Column label to use for a ticker (e.g., "^GSPC" → "S&P500").
    fn display_name(&self, ticker: &str) -> String;

    /// Fetch an index's daily closes over `[start, end]` (inclusive).
    async fn fetch_index_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<TimeSeries, CoreError>;
}
