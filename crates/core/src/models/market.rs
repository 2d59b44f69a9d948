use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of the overall crypto market, reshaped from the global endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalMarket {
    /// Number of actively tracked cryptocurrencies
    pub active_cryptocurrencies: u64,

    /// Number of tracked markets (exchange pairs)
    pub markets: u64,

    /// Total market cap in the quote currency (USD)
    pub total_market_cap_usd: f64,

    /// Total market cap denominated in BTC
    pub total_market_cap_btc: f64,

    /// Market-cap change over the last 24h, percent
    pub market_cap_change_pct_24h: f64,

    /// Market-cap dominance of the top coins, percent, largest first
    pub dominance_pct: Vec<(String, f64)>,
}

/// One row of the markets table (coins ranked by market cap).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketListing {
    pub market_cap_rank: Option<u64>,
    pub id: String,
    pub symbol: String,
    pub current_price: Option<f64>,
    pub price_change_pct_24h: Option<f64>,
    pub low_24h: Option<f64>,
    pub high_24h: Option<f64>,
    pub total_volume: Option<f64>,
}

/// One entry of the trending-searches list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendingCoin {
    pub id: String,
    pub symbol: String,
    pub market_cap_rank: Option<u64>,
}

/// A coin's identity as listed by the data source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinListing {
    pub id: String,
    pub symbol: String,
    pub name: String,
}

/// Current snapshot of one coin/currency pair: price, market cap, and
/// 24h volume/change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairSnapshot {
    pub id: String,
    pub currency: String,
    pub price: f64,
    pub market_cap: Option<f64>,
    pub volume_24h: Option<f64>,
    pub change_pct_24h: Option<f64>,
}

/// One OHLC candle. Granularity follows the source's timeframe rules,
/// so the timestamp keeps its time-of-day component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcBar {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}
