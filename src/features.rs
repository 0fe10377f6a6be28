//! Choice of the columns that take part in training and classification.

use csv::StringRecord;

use crate::error::{Error, Result};

/// Policy deciding which columns are used as features.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureSelection {
    /// The first `n` columns.
    FirstN(usize),
    /// Explicit column positions, kept in the given order.
    Columns(Vec<usize>),
}

impl Default for FeatureSelection {
    fn default() -> Self {
        FeatureSelection::FirstN(5)
    }
}

impl FeatureSelection {
    /// Resolves the policy against a set of rows.
    ///
    /// Fails with [`Error::InsufficientColumns`] if any row is too short to hold every
    /// selected column plus a trailing label column.
    pub fn select(&self, rows: &[StringRecord]) -> Result<FeatureSet> {
        let columns = match self {
            FeatureSelection::FirstN(n) => (0..*n).collect(),
            FeatureSelection::Columns(columns) => {
                let mut unique = Vec::with_capacity(columns.len());
                for &column in columns {
                    if !unique.contains(&column) {
                        unique.push(column);
                    }
                }
                unique
            }
        };

        let features = FeatureSet { columns };
        features.check_rows(rows)?;
        Ok(features)
    }
}

/// Ordered feature column indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSet {
    columns: Vec<usize>,
}

impl FeatureSet {
    pub fn columns(&self) -> &[usize] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Minimum row width: the highest feature column plus the label after it.
    pub fn required_columns(&self) -> usize {
        self.columns.iter().max().map_or(1, |&max| max + 2)
    }

    pub fn check_rows(&self, rows: &[StringRecord]) -> Result<()> {
        let required = self.required_columns();
        match rows.iter().position(|row| row.len() < required) {
            Some(row) => Err(Error::InsufficientColumns {
                row,
                found: rows[row].len(),
                required,
            }),
            None => Ok(()),
        }
    }

    /// Iterates `(column, value)` pairs of a row for the selected columns.
    pub fn values<'r>(
        &'r self,
        row: &'r StringRecord,
    ) -> impl Iterator<Item = (usize, &'r str)> + 'r {
        self.columns
            .iter()
            .map(move |&column| (column, row.get(column).unwrap_or("")))
    }
}
