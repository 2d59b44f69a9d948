use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// A single price data point (date → price).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// An ordered price series: dates strictly increasing, no duplicates.
///
/// This is what a `HistoricalPriceSource` or `BenchmarkPriceSource` produces
/// per identifier. The invariant is enforced at construction — a feed that
/// hands back out-of-order or duplicated dates is rejected, never repaired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    points: Vec<PricePoint>,
}

impl TimeSeries {
    /// Build a series from raw points, validating the ordering invariant.
    pub fn from_points(points: Vec<PricePoint>) -> Result<Self, CoreError> {
        for pair in points.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(CoreError::MisalignedInput(format!(
                    "timestamps not strictly increasing: {} followed by {}",
                    pair[0].date, pair[1].date
                )));
            }
        }
        Ok(Self { points })
    }

    #[must_use]
    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    #[must_use]
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// Look up the price at an exact date. Binary search, O(log n).
    #[must_use]
    pub fn price_at(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|idx| self.points[idx].price)
    }
}
