use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::analysis::AnalysisResult;
use crate::models::table::AlignedTable;

/// A single point of a chart line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// One named line of a chart. The core computes the points — the frontend
/// only renders them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub name: String,
    pub points: Vec<ChartPoint>,
}

/// Turn a table into one line per column, skipping empty cells.
#[must_use]
pub fn line_series(table: &AlignedTable) -> Vec<ChartSeries> {
    table
        .columns()
        .iter()
        .map(|column| {
            let points = table
                .index()
                .iter()
                .zip(&column.values)
                .filter_map(|(date, value)| {
                    value.map(|v| ChartPoint {
                        date: *date,
                        value: v,
                    })
                })
                .collect();
            ChartSeries {
                name: column.name.clone(),
                points,
            }
        })
        .collect()
}

/// Price chart lines for an analysis run.
#[must_use]
pub fn price_chart(result: &AnalysisResult) -> Vec<ChartSeries> {
    line_series(&result.prices)
}

/// Normalized-performance chart lines (every series starts at 100).
#[must_use]
pub fn performance_chart(result: &AnalysisResult) -> Vec<ChartSeries> {
    line_series(&result.normalized_performance)
}

/// Return chart lines: simple returns, or log returns when `log` is set.
#[must_use]
pub fn returns_chart(result: &AnalysisResult, log: bool) -> Vec<ChartSeries> {
    if log {
        line_series(&result.log_return)
    } else {
        line_series(&result.simple_return)
    }
}

/// One point of the risk/return scatter: a column's volatility against its
/// mean log return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReturnPoint {
    pub name: String,
    /// Volatility of the column's log returns. `None` with fewer than two
    /// return observations.
    pub risk: Option<f64>,
    /// Mean log return, display-scaled (× 100) and rounded to two decimals.
    /// `None` when the column has no return observations.
    pub mean_return: Option<f64>,
}

/// Risk/return scatter data, one point per column.
#[must_use]
pub fn risk_return_chart(result: &AnalysisResult) -> Vec<RiskReturnPoint> {
    result
        .log_return
        .columns()
        .iter()
        .map(|column| {
            let observed: Vec<f64> = column.values.iter().filter_map(|v| *v).collect();
            let mean_return = if observed.is_empty() {
                None
            } else {
                let mean = observed.iter().sum::<f64>() / observed.len() as f64;
                Some(round2(mean * 100.0))
            };
            RiskReturnPoint {
                name: column.name.clone(),
                risk: result.volatility.get(&column.name),
                mean_return,
            }
        })
        .collect()
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
