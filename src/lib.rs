//! Categorical naive Bayes with k-fold cross-validation.
//!
//! - [`dataset`]: rows of string fields, label in the last column
//! - [`features`]: which columns the classifier looks at
//! - [`bayes`]: the classifier itself
//! - [`metrics`]: confusion counts and the rates derived from them
//! - [`cross_validation`]: fold partitioning and averaging

pub mod bayes;
pub mod cross_validation;
pub mod dataset;
pub mod error;
pub mod features;
pub mod metrics;

pub use bayes::{NaiveBayesClassifier, Smoothing};
pub use cross_validation::{
    CrossValidationConfig, CrossValidator, EvaluationResult, FoldReport, MicroAverage,
};
pub use dataset::Dataset;
pub use error::{Error, Result};
pub use features::{FeatureSelection, FeatureSet};
pub use metrics::{ConfusionCounts, EvaluationMetrics, Metric};
