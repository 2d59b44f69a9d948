// ═══════════════════════════════════════════════════════════════════
// Provider Tests — offline pieces of the API providers
// ═══════════════════════════════════════════════════════════════════

use chrono::NaiveDate;

use std::collections::HashMap;

use coinlens_core::providers::coingecko::{daily_points, ohlc_bars, pair_snapshots};
use coinlens_core::providers::traits::BenchmarkPriceSource;
use coinlens_core::providers::yahoo_finance::{YahooBenchmarkProvider, DEFAULT_BENCHMARKS};

fn ms(date: &str, hour: u32) -> f64 {
    let d = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
    let dt = d.and_hms_opt(hour, 0, 0).unwrap().and_utc();
    dt.timestamp_millis() as f64
}

#[test]
fn daily_points_collapses_subdaily_samples_to_last_of_day() {
    let raw = vec![
        (ms("2025-03-01", 1), 100.0),
        (ms("2025-03-01", 13), 101.0),
        (ms("2025-03-01", 23), 102.0),
        (ms("2025-03-02", 0), 99.0),
    ];
    let points = daily_points(&raw);
    assert_eq!(points.len(), 2);
    assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
    assert_eq!(points[0].price, 102.0);
    assert_eq!(points[1].price, 99.0);
}

#[test]
fn daily_points_keeps_daily_samples_as_is() {
    let raw = vec![
        (ms("2025-03-01", 0), 100.0),
        (ms("2025-03-02", 0), 101.0),
        (ms("2025-03-03", 0), 102.0),
    ];
    let points = daily_points(&raw);
    assert_eq!(points.len(), 3);
}

#[test]
fn daily_points_handles_empty_input() {
    assert!(daily_points(&[]).is_empty());
}

#[test]
fn pair_snapshots_keep_requested_order_and_skip_unknown_ids() {
    let mut bitcoin = HashMap::new();
    bitcoin.insert("usd".to_string(), 42000.0);
    bitcoin.insert("usd_market_cap".to_string(), 8.2e11);
    bitcoin.insert("usd_24h_vol".to_string(), 3.1e10);
    bitcoin.insert("usd_24h_change".to_string(), -1.5);
    let mut ethereum = HashMap::new();
    ethereum.insert("usd".to_string(), 2500.0);
    let mut raw = HashMap::new();
    raw.insert("bitcoin".to_string(), bitcoin);
    raw.insert("ethereum".to_string(), ethereum);

    let snaps = pair_snapshots(&["ethereum", "unknown-coin", "bitcoin"], "USD", &raw);
    assert_eq!(snaps.len(), 2);

    assert_eq!(snaps[0].id, "ethereum");
    assert_eq!(snaps[0].currency, "usd");
    assert_eq!(snaps[0].price, 2500.0);
    assert_eq!(snaps[0].market_cap, None);

    assert_eq!(snaps[1].id, "bitcoin");
    assert_eq!(snaps[1].price, 42000.0);
    assert_eq!(snaps[1].market_cap, Some(8.2e11));
    assert_eq!(snaps[1].volume_24h, Some(3.1e10));
    assert_eq!(snaps[1].change_pct_24h, Some(-1.5));
}

#[test]
fn ohlc_bars_convert_millisecond_timestamps() {
    let raw = vec![
        (ms("2025-03-01", 0), 100.0, 105.0, 98.0, 102.0),
        (ms("2025-03-01", 4), 102.0, 110.0, 101.0, 108.0),
    ];
    let bars = ohlc_bars(&raw);
    assert_eq!(bars.len(), 2);
    assert_eq!(bars[0].time.date_naive(), NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
    assert_eq!(bars[0].open, 100.0);
    assert_eq!(bars[0].high, 105.0);
    assert_eq!(bars[0].low, 98.0);
    assert_eq!(bars[0].close, 102.0);
    assert_eq!(bars[1].time.format("%H").to_string(), "04");
}

#[test]
fn default_benchmark_set_covers_the_major_indices() {
    let tickers: Vec<&str> = DEFAULT_BENCHMARKS.iter().map(|(t, _)| *t).collect();
    assert!(tickers.contains(&"^GSPC"));
    assert!(tickers.contains(&"^DJI"));
    assert!(tickers.contains(&"^IXIC"));
    assert!(tickers.contains(&"^HSI"));
    assert!(tickers.contains(&"^BVSP"));
}

#[test]
fn known_tickers_map_to_display_names_unknown_pass_through() {
    let provider = YahooBenchmarkProvider::new().unwrap();
    assert_eq!(provider.display_name("^GSPC"), "S&P500");
    assert_eq!(provider.display_name("^DJI"), "Dow Jones");
    assert_eq!(provider.display_name("^IXIC"), "Nasdaq");
    assert_eq!(provider.display_name("^FTSE"), "^FTSE");
}
