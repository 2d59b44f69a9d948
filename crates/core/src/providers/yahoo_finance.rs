use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use time::OffsetDateTime;

use super::traits::BenchmarkPriceSource;
use crate::errors::CoreError;
use crate::models::series::{PricePoint, TimeSeries};

/// The default benchmark set: equity index tickers and the column labels
/// used for them in analysis output.
pub const DEFAULT_BENCHMARKS: &[(&str, &str)] = &[
    ("^GSPC", "S&P500"),
    ("^DJI", "Dow Jones"),
    ("^IXIC", "Nasdaq"),
    ("^HSI", "Hang Seng Index"),
    ("^BVSP", "B3"),
];

/// Yahoo Finance provider for benchmark index prices.
///
/// - **Free**: No API key required (unofficial public API).
/// - **Coverage**: Global equity indices, adjusted close.
///
/// Uses the `yahoo_finance_api` crate which wraps Yahoo Finance's public
/// endpoints. Index tickers live in their own namespace ("^GSPC"), entirely
/// separate from coin ids.
pub struct YahooBenchmarkProvider {
    connector: yahoo_finance_api::YahooConnector,
}

impl YahooBenchmarkProvider {
    pub fn new() -> Result<Self, CoreError> {
        let connector =
            yahoo_finance_api::YahooConnector::new().map_err(|e| CoreError::SourceUnavailable {
                provider: "Yahoo Finance".into(),
                message: format!("Failed to create connector: {e}"),
            })?;
        Ok(Self { connector })
    }

    fn api_error(message: String) -> CoreError {
        CoreError::SourceUnavailable {
            provider: "Yahoo Finance".into(),
            message,
        }
    }

    /// Convert a `chrono::NaiveDate` to `time::OffsetDateTime` (midnight UTC).
    fn to_offset_datetime(date: NaiveDate) -> Result<OffsetDateTime, CoreError> {
        let month: time::Month = match date.month() {
            1 => time::Month::January,
            2 => time::Month::February,
            3 => time::Month::March,
            4 => time::Month::April,
            5 => time::Month::May,
            6 => time::Month::June,
            7 => time::Month::July,
            8 => time::Month::August,
            9 => time::Month::September,
            10 => time::Month::October,
            11 => time::Month::November,
            12 => time::Month::December,
            _ => unreachable!(),
        };

        let odt = time::Date::from_calendar_date(date.year(), month, date.day() as u8)
            .map_err(|e| Self::api_error(format!("Invalid date {date}: {e}")))?
            .with_hms(0, 0, 0)
            .map_err(|e| Self::api_error(format!("Invalid time for {date}: {e}")))?
            .assume_utc();
        Ok(odt)
    }

    /// Convert a unix timestamp (seconds) to `chrono::NaiveDate`.
    fn timestamp_to_naive_date(ts: i64) -> Option<NaiveDate> {
        chrono::DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive())
    }
}

#[async_trait]
impl BenchmarkPriceSource for YahooBenchmarkProvider {
    fn name(&self) -> &str {
        "Yahoo Finance"
    }

    fn display_name(&self, ticker: &str) -> String {
        DEFAULT_BENCHMARKS
            .iter()
            .find(|(t, _)| *t == ticker)
            .map_or_else(|| ticker.to_string(), |(_, label)| (*label).to_string())
    }

    async fn fetch_index_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<TimeSeries, CoreError> {
        let from = Self::to_offset_datetime(start)?;
        let to = Self::to_offset_datetime(end + chrono::Duration::days(1))?; // inclusive end

        let resp = self
            .connector
            .get_quote_history(ticker, from, to)
            .await
            .map_err(|e| Self::api_error(format!("Failed to fetch history for {ticker}: {e}")))?;

        let quotes = resp
            .quotes()
            .map_err(|e| Self::api_error(format!("Failed to parse quotes for {ticker}: {e}")))?;

        let points: Vec<PricePoint> = quotes
            .iter()
            .filter_map(|q| {
                let date = Self::timestamp_to_naive_date(q.timestamp)?;
                if date >= start && date <= end {
                    Some(PricePoint {
                        date,
                        price: q.adjclose,
                    })
                } else {
                    None
                }
            })
            .collect();

        TimeSeries::from_points(points)
    }
}
