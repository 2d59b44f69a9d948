use serde::{Deserialize, Serialize};

use super::table::AlignedTable;

/// One scalar per column, in column order (e.g., cumulative return).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarRow {
    pub entries: Vec<(String, f64)>,
}

impl ScalarRow {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }
}

/// Per-column volatility. `None` where fewer than two log returns exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityRow {
    pub entries: Vec<(String, Option<f64>)>,
}

impl VolatilityRow {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| *v)
    }
}

/// The immutable bundle produced by one analysis run.
///
/// Returned by value and owned by the caller — a fresh run replaces the
/// previous result wholesale, nothing is merged or kept in shared state.
/// Pass it explicitly to the export or chart collaborators.
///
/// Leading-row convention: the first row of `simple_return` and `log_return`
/// is an explicit empty cell (`None`), never a fabricated zero — the first
/// period has no prior value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// The aligned (and gap-filled) price table itself.
    pub prices: AlignedTable,

    /// Period-over-period percentage change: `(p[t]/p[t-1] - 1) * 100`.
    pub simple_return: AlignedTable,

    /// Natural-log ratio of consecutive prices, percentage-scaled:
    /// `ln(p[t]/p[t-1]) * 100`.
    pub log_return: AlignedTable,

    /// `(p[last] - p[first]) / p[first] * 100` — one scalar per column.
    pub cumulative_return: ScalarRow,

    /// Prices rescaled so the first observation equals 100, rounded to
    /// two decimals.
    pub normalized_performance: AlignedTable,

    /// Sample standard deviation of `log_return` per column, same
    /// percentage scale as `log_return`.
    pub volatility: VolatilityRow,
}
