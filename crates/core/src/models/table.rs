use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::models::series::TimeSeries;

/// One named column of an [`AlignedTable`].
///
/// `values` is parallel to the table's shared index. An empty cell (`None`)
/// means the underlying source had no observation at that date and the cell
/// has not (yet) been filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// A set of named series aligned on one common sorted date index.
///
/// Columns keep insertion order, which makes every downstream output
/// (CSV, charts, derived tables) deterministic. Inserting a series whose
/// dates are not already in the index grows the index to the union and
/// remaps all existing columns, leaving empty cells at the new dates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignedTable {
    index: Vec<NaiveDate>,
    columns: Vec<Column>,
}

impl AlignedTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a series under a unique column name.
    ///
    /// Fails with `MisalignedInput` if the name is already taken — two inputs
    /// colliding on one key cannot be associated unambiguously.
    pub fn insert_series(&mut self, name: &str, series: &TimeSeries) -> Result<(), CoreError> {
        if self.columns.iter().any(|c| c.name == name) {
            return Err(CoreError::MisalignedInput(format!(
                "duplicate column key '{name}'"
            )));
        }

        let new_index = merge_sorted(&self.index, series.points().iter().map(|p| p.date));
        if new_index.len() != self.index.len() {
            for column in &mut self.columns {
                column.values = remap(&self.index, &column.values, &new_index);
            }
            self.index = new_index;
        }

        let mut values = vec![None; self.index.len()];
        for point in series.points() {
            // Every series date is in the index by construction.
            if let Ok(pos) = self.index.binary_search(&point.date) {
                values[pos] = Some(point.price);
            }
        }
        self.columns.push(Column {
            name: name.to_string(),
            values,
        });
        Ok(())
    }

    /// Create an empty table sharing this table's index (for derived tables).
    #[must_use]
    pub fn like(&self) -> Self {
        Self {
            index: self.index.clone(),
            columns: Vec::new(),
        }
    }

    /// Append a pre-computed column. The values must match the index length.
    pub fn push_column(&mut self, name: &str, values: Vec<Option<f64>>) -> Result<(), CoreError> {
        if values.len() != self.index.len() {
            return Err(CoreError::MisalignedInput(format!(
                "column '{name}' has {} values for an index of {}",
                values.len(),
                self.index.len()
            )));
        }
        if self.columns.iter().any(|c| c.name == name) {
            return Err(CoreError::MisalignedInput(format!(
                "duplicate column key '{name}'"
            )));
        }
        self.columns.push(Column {
            name: name.to_string(),
            values,
        });
        Ok(())
    }

    /// Propagate the last seen value forward into empty cells, per column.
    pub fn forward_fill(&mut self) {
        for column in &mut self.columns {
            let mut last = None;
            for value in &mut column.values {
                match value {
                    Some(v) => last = Some(*v),
                    None => *value = last,
                }
            }
        }
    }

    /// Propagate the next seen value backward into empty cells, per column.
    /// Applied after `forward_fill` this only affects leading gaps.
    pub fn back_fill(&mut self) {
        for column in &mut self.columns {
            let mut next = None;
            for value in column.values.iter_mut().rev() {
                match value {
                    Some(v) => next = Some(*v),
                    None => *value = next,
                }
            }
        }
    }

    #[must_use]
    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty() || self.columns.is_empty()
    }

    /// First and last filled value of a column, if any.
    #[must_use]
    pub fn first_value(&self, name: &str) -> Option<f64> {
        self.column(name)?.iter().find_map(|v| *v)
    }

    #[must_use]
    pub fn last_value(&self, name: &str) -> Option<f64> {
        self.column(name)?.iter().rev().find_map(|v| *v)
    }

    /// Iterate rows as (date, cells-in-column-order). Used by the export sink.
    pub fn rows(&self) -> impl Iterator<Item = (NaiveDate, Vec<Option<f64>>)> + '_ {
        self.index.iter().enumerate().map(|(i, date)| {
            let cells = self.columns.iter().map(|c| c.values[i]).collect();
            (*date, cells)
        })
    }
}

/// Merge a sorted index with an iterator of sorted dates into a sorted,
/// deduplicated union.
fn merge_sorted(index: &[NaiveDate], dates: impl Iterator<Item = NaiveDate>) -> Vec<NaiveDate> {
    let mut merged = Vec::with_capacity(index.len());
    let mut existing = index.iter().copied().peekable();
    let mut incoming = dates.peekable();

    loop {
        match (existing.peek(), incoming.peek()) {
            (Some(&a), Some(&b)) => {
                if a < b {
                    merged.push(a);
                    existing.next();
                } else if b < a {
                    merged.push(b);
                    incoming.next();
                } else {
                    merged.push(a);
                    existing.next();
                    incoming.next();
                }
            }
            (Some(&a), None) => {
                merged.push(a);
                existing.next();
            }
            (None, Some(&b)) => {
                merged.push(b);
                incoming.next();
            }
            (None, None) => break,
        }
    }
    merged
}

/// Remap a column's values from an old index onto a superset index.
fn remap(old_index: &[NaiveDate], values: &[Option<f64>], new_index: &[NaiveDate]) -> Vec<Option<f64>> {
    let mut remapped = vec![None; new_index.len()];
    let mut old_pos = 0;
    for (new_pos, date) in new_index.iter().enumerate() {
        if old_pos < old_index.len() && old_index[old_pos] == *date {
            remapped[new_pos] = values[old_pos];
            old_pos += 1;
        }
    }
    remapped
}
