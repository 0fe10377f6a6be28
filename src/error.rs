//! Error types for training and evaluating the classifier.

use thiserror::Error;

use crate::metrics::Metric;

#[derive(Error, Debug)]
pub enum Error {
    #[error("row {row} has {found} columns, but {required} are needed (features + label)")]
    InsufficientColumns {
        row: usize,
        found: usize,
        required: usize,
    },

    #[error("row {row} has {found} columns, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("cannot train on an empty set of rows")]
    EmptyTrainingSet,

    #[error("invalid fold count {folds} for a dataset of {rows} rows")]
    InvalidFoldCount { folds: usize, rows: usize },

    #[error("{0} is undefined (zero denominator)")]
    UndefinedMetric(Metric),

    #[error("model has not been trained")]
    UnknownModelState,

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
