//! In-memory table of categorical rows.
//!
//! Every field is kept as a string; the last field of a row is its class label.

use csv::{ReaderBuilder, StringRecord, Trim};
use std::path::Path;

use crate::error::{Error, Result};

/// Returns the class label of a row (its last field).
pub fn label(row: &StringRecord) -> &str {
    match row.len() {
        0 => "",
        n => row.get(n - 1).unwrap_or(""),
    }
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    rows: Vec<StringRecord>,
}

impl Dataset {
    /// Builds a dataset from already materialized rows. All rows must share the
    /// arity of the first one.
    pub fn from_records(rows: Vec<StringRecord>) -> Result<Self> {
        if let Some(first) = rows.first() {
            let expected = first.len();
            if let Some((row, record)) = rows
                .iter()
                .enumerate()
                .find(|(_, record)| record.len() != expected)
            {
                return Err(Error::RaggedRow {
                    row,
                    found: record.len(),
                    expected,
                });
            }
        }

        Ok(Dataset { rows })
    }

    /// Reads a headerless, comma-delimited file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .trim(Trim::All)
            .from_path(path)?;

        // Ragged rows are reported by the reader itself as `UnequalLengths`.
        let rows = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;

        Self::from_records(rows)
    }

    /// Builds a dataset from plain string rows, with the same arity check as
    /// [`Dataset::from_records`].
    pub fn from_rows<I, S>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = Vec<S>>,
        S: AsRef<str>,
    {
        let records = rows
            .into_iter()
            .map(|fields| {
                let mut record = StringRecord::new();
                for field in &fields {
                    record.push_field(field.as_ref());
                }
                record
            })
            .collect();
        Self::from_records(records)
    }

    pub fn rows(&self) -> &[StringRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
