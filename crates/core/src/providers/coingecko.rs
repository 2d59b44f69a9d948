use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use super::traits::HistoricalPriceSource;
use crate::errors::CoreError;
use crate::models::market::{
    CoinListing, GlobalMarket, MarketListing, OhlcBar, PairSnapshot, TrendingCoin,
};
use crate::models::series::{PricePoint, TimeSeries};

const BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// CoinGecko API provider for cryptocurrency market data.
///
/// - **Free**: No API key required on the public tier.
/// - **Identifiers**: lowercase coin ids ("bitcoin", "ethereum"), resolvable
///   via `/coins/list`.
/// - **Endpoints used**: `/ping`, `/simple/supported_vs_currencies`,
///   `/coins/list`, `/global`, `/coins/markets`, `/search/trending`,
///   `/coins/{id}/market_chart/range`.
///
/// Range history has automatic granularity: windows under ~90 days come back
/// hourly. Sub-daily points are sampled down to one close per calendar day
/// (last observation) before the series is handed to callers.
pub struct CoinGeckoProvider {
    client: Client,
}

impl CoinGeckoProvider {
    pub fn new() -> Self {
        let builder = Client::builder().timeout(Duration::from_secs(30));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
        }
    }

    fn api_error(message: String) -> CoreError {
        CoreError::SourceUnavailable {
            provider: "CoinGecko".into(),
            message,
        }
    }

    /// Ping the API. Returns the server's greeting line.
    pub async fn ping(&self) -> Result<String, CoreError> {
        let url = format!("{BASE_URL}/ping");
        let resp: PingResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .json()
            .await
            .map_err(|e| Self::api_error(format!("Failed to parse ping response: {e}")))?;
        Ok(resp.gecko_says)
    }

    /// List the quote currencies the API supports ("usd", "eur", "btc", ...).
    pub async fn supported_currencies(&self) -> Result<Vec<String>, CoreError> {
        let url = format!("{BASE_URL}/simple/supported_vs_currencies");
        let currencies: Vec<String> = self
            .client
            .get(&url)
            .send()
            .await?
            .json()
            .await
            .map_err(|e| Self::api_error(format!("Failed to parse currency list: {e}")))?;
        Ok(currencies)
    }

    /// Check whether a quote currency is supported (case-insensitive).
    pub async fn is_currency_supported(&self, name: &str) -> Result<bool, CoreError> {
        let lower = name.to_lowercase();
        let currencies = self.supported_currencies().await?;
        Ok(currencies.iter().any(|c| c.to_lowercase() == lower))
    }

    /// Full list of coins the API knows about.
    pub async fn coin_list(&self) -> Result<Vec<CoinListing>, CoreError> {
        let url = format!("{BASE_URL}/coins/list");
        let coins: Vec<CoinListing> = self
            .client
            .get(&url)
            .send()
            .await?
            .json()
            .await
            .map_err(|e| Self::api_error(format!("Failed to parse coin list: {e}")))?;
        Ok(coins)
    }

    /// Find a coin by name (case-insensitive exact match).
    pub async fn find_coin(&self, name: &str) -> Result<Option<CoinListing>, CoreError> {
        let lower = name.to_lowercase();
        let coins = self.coin_list().await?;
        Ok(coins.into_iter().find(|c| c.name.to_lowercase() == lower))
    }

    /// Overall market snapshot: totals, 24h change, top-coin dominance.
    pub async fn global_overview(&self) -> Result<GlobalMarket, CoreError> {
        let url = format!("{BASE_URL}/global");
        let resp: GlobalResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .json()
            .await
            .map_err(|e| Self::api_error(format!("Failed to parse global data: {e}")))?;

        let data = resp.data;
        let mut dominance: Vec<(String, f64)> =
            data.market_cap_percentage.into_iter().collect();
        dominance.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        Ok(GlobalMarket {
            active_cryptocurrencies: data.active_cryptocurrencies,
            markets: data.markets,
            total_market_cap_usd: data.total_market_cap.get("usd").copied().unwrap_or(0.0),
            total_market_cap_btc: data.total_market_cap.get("btc").copied().unwrap_or(0.0),
            market_cap_change_pct_24h: data.market_cap_change_percentage_24h_usd,
            dominance_pct: dominance,
        })
    }

    /// Top coins by market cap, one row per coin.
    pub async fn top_markets(&self, currency: &str, limit: u32) -> Result<Vec<MarketListing>, CoreError> {
        let url = format!(
            "{BASE_URL}/coins/markets?vs_currency={currency}&order=market_cap_desc&per_page={limit}&page=1"
        );
        let rows: Vec<MarketRow> = self
            .client
            .get(&url)
            .send()
            .await?
            .json()
            .await
            .map_err(|e| Self::api_error(format!("Failed to parse markets table: {e}")))?;

        Ok(rows
            .into_iter()
            .map(|r| MarketListing {
                market_cap_rank: r.market_cap_rank,
                id: r.id,
                symbol: r.symbol,
                current_price: r.current_price,
                price_change_pct_24h: r.price_change_percentage_24h,
                low_24h: r.low_24h,
                high_24h: r.high_24h,
                total_volume: r.total_volume,
            })
            .collect())
    }

    /// Current price snapshot for one or more coin/currency pairs:
    /// price, market cap, 24h volume, and 24h change.
    pub async fn pair_snapshot(
        &self,
        ids: &[&str],
        currency: &str,
    ) -> Result<Vec<PairSnapshot>, CoreError> {
        if ids.is_empty() {
            return Err(CoreError::InvalidRequest("no coin ids given".into()));
        }
        let url = format!(
            "{BASE_URL}/simple/price?ids={}&vs_currencies={currency}\
             &include_market_cap=true&include_24hr_vol=true&include_24hr_change=true",
            ids.join(",")
        );
        let raw: HashMap<String, HashMap<String, f64>> = self
            .client
            .get(&url)
            .send()
            .await?
            .json()
            .await
            .map_err(|e| Self::api_error(format!("Failed to parse price snapshot: {e}")))?;

        Ok(pair_snapshots(ids, currency, &raw))
    }

    /// Historical OHLC candles. Valid `days` values per the API:
    /// 1/7/14/30/90/180/365.
    pub async fn ohlc_history(
        &self,
        asset_id: &str,
        currency: &str,
        days: u32,
    ) -> Result<Vec<OhlcBar>, CoreError> {
        let url = format!("{BASE_URL}/coins/{asset_id}/ohlc?vs_currency={currency}&days={days}");
        let raw: Vec<(f64, f64, f64, f64, f64)> = self
            .client
            .get(&url)
            .send()
            .await?
            .json()
            .await
            .map_err(|e| Self::api_error(format!("Failed to parse OHLC for {asset_id}: {e}")))?;

        Ok(ohlc_bars(&raw))
    }

    /// Currently trending coins (search popularity).
    pub async fn trending(&self) -> Result<Vec<TrendingCoin>, CoreError> {
        let url = format!("{BASE_URL}/search/trending");
        let resp: TrendingResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .json()
            .await
            .map_err(|e| Self::api_error(format!("Failed to parse trending list: {e}")))?;

        Ok(resp
            .coins
            .into_iter()
            .map(|entry| TrendingCoin {
                id: entry.item.id,
                symbol: entry.item.symbol,
                market_cap_rank: entry.item.market_cap_rank,
            })
            .collect())
    }
}

impl Default for CoinGeckoProvider {
    fn default() -> Self {
        Self::new()
    }
}

// ── CoinGecko API response types ────────────────────────────────────

#[derive(Deserialize)]
struct PingResponse {
    gecko_says: String,
}

#[derive(Deserialize)]
struct GlobalResponse {
    data: GlobalData,
}

#[derive(Deserialize)]
struct GlobalData {
    active_cryptocurrencies: u64,
    markets: u64,
    total_market_cap: HashMap<String, f64>,
    market_cap_change_percentage_24h_usd: f64,
    market_cap_percentage: HashMap<String, f64>,
}

#[derive(Deserialize)]
struct MarketRow {
    market_cap_rank: Option<u64>,
    id: String,
    symbol: String,
    current_price: Option<f64>,
    price_change_percentage_24h: Option<f64>,
    low_24h: Option<f64>,
    high_24h: Option<f64>,
    total_volume: Option<f64>,
}

#[derive(Deserialize)]
struct TrendingResponse {
    coins: Vec<TrendingEntry>,
}

#[derive(Deserialize)]
struct TrendingEntry {
    item: TrendingItem,
}

#[derive(Deserialize)]
struct TrendingItem {
    id: String,
    symbol: String,
    market_cap_rank: Option<u64>,
}

#[derive(Deserialize)]
struct MarketChartResponse {
    /// Pairs of (unix timestamp in milliseconds, price).
    prices: Vec<(f64, f64)>,
}

/// Collapse raw (millisecond timestamp, price) pairs to one point per
/// calendar day, keeping the last observation of each day.
#[must_use]
pub fn daily_points(raw: &[(f64, f64)]) -> Vec<PricePoint> {
    let mut points: Vec<PricePoint> = Vec::with_capacity(raw.len());
    for &(ts_ms, price) in raw {
        let Some(dt) = DateTime::from_timestamp_millis(ts_ms as i64) else {
            continue;
        };
        let date = dt.date_naive();
        match points.last_mut() {
            Some(last) if last.date == date => last.price = price,
            _ => points.push(PricePoint { date, price }),
        }
    }
    points
}

/// Reshape a raw `/simple/price` map into pair snapshots, in requested-id
/// order. Ids the source doesn't know are omitted. Field keys follow the
/// API's suffix scheme: `{currency}`, `{currency}_market_cap`,
/// `{currency}_24h_vol`, `{currency}_24h_change`.
#[must_use]
pub fn pair_snapshots(
    ids: &[&str],
    currency: &str,
    raw: &HashMap<String, HashMap<String, f64>>,
) -> Vec<PairSnapshot> {
    let cur = currency.to_lowercase();
    ids.iter()
        .filter_map(|id| {
            let fields = raw.get(*id)?;
            Some(PairSnapshot {
                id: (*id).to_string(),
                currency: cur.clone(),
                price: fields.get(&cur).copied()?,
                market_cap: fields.get(&format!("{cur}_market_cap")).copied(),
                volume_24h: fields.get(&format!("{cur}_24h_vol")).copied(),
                change_pct_24h: fields.get(&format!("{cur}_24h_change")).copied(),
            })
        })
        .collect()
}

/// Convert raw (millisecond timestamp, o, h, l, c) rows into candles,
/// dropping rows with out-of-range timestamps.
#[must_use]
pub fn ohlc_bars(raw: &[(f64, f64, f64, f64, f64)]) -> Vec<OhlcBar> {
    raw.iter()
        .filter_map(|&(ts_ms, open, high, low, close)| {
            let time = DateTime::from_timestamp_millis(ts_ms as i64)?;
            Some(OhlcBar {
                time,
                open,
                high,
                low,
                close,
            })
        })
        .collect()
}

#[async_trait]
impl HistoricalPriceSource for CoinGeckoProvider {
    fn name(&self) -> &str {
        "CoinGecko"
    }

    async fn fetch_price_history(
        &self,
        asset_id: &str,
        currency: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<TimeSeries, CoreError> {
        let url = format!(
            "{BASE_URL}/coins/{asset_id}/market_chart/range?vs_currency={currency}&from={}&to={}",
            from.timestamp(),
            to.timestamp()
        );

        let resp: MarketChartResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .json()
            .await
            .map_err(|e| Self::api_error(format!("Failed to parse history for {asset_id}: {e}")))?;

        TimeSeries::from_points(daily_points(&resp.prices))
    }
}
