//! K-fold cross-validation of the naive Bayes classifier.
//!
//! Folds are contiguous blocks of `rows / k` rows in dataset order. Rows left over
//! by the integer division never form part of a test block, but remain in every
//! training partition.

use csv::StringRecord;
use tracing::{info, warn};

use crate::bayes::{NaiveBayesClassifier, Smoothing};
use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::features::FeatureSelection;
use crate::metrics::{self, ConfusionCounts, EvaluationMetrics, Metric};

/// How the micro average is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MicroAverage {
    /// Sum confusion counts over all folds, then derive the rates once.
    #[default]
    Pooled,
    /// Unweighted mean of per-fold rates, i.e. the same as the macro average.
    FoldMean,
}

#[derive(Debug, Clone)]
pub struct CrossValidationConfig {
    pub folds: usize,
    pub positive_label: String,
    pub features: FeatureSelection,
    pub smoothing: Smoothing,
    pub micro_average: MicroAverage,
}

impl Default for CrossValidationConfig {
    /// Ten folds, positive label `"A"`, the first five columns, `+2` smoothing.
    ///
    /// The micro average defaults to [`MicroAverage::Pooled`], so unlike a plain
    /// per-fold mean it can differ from the macro average. Use
    /// [`MicroAverage::FoldMean`] to make the two identical.
    fn default() -> Self {
        CrossValidationConfig {
            folds: 10,
            positive_label: "A".to_string(),
            features: FeatureSelection::default(),
            smoothing: Smoothing::default(),
            micro_average: MicroAverage::default(),
        }
    }
}

impl CrossValidationConfig {
    pub fn with_folds(mut self, folds: usize) -> Self {
        self.folds = folds;
        self
    }

    pub fn with_positive_label(mut self, label: impl Into<String>) -> Self {
        self.positive_label = label.into();
        self
    }

    pub fn with_features(mut self, features: FeatureSelection) -> Self {
        self.features = features;
        self
    }

    pub fn with_smoothing(mut self, smoothing: Smoothing) -> Self {
        self.smoothing = smoothing;
        self
    }

    pub fn with_micro_average(mut self, micro_average: MicroAverage) -> Self {
        self.micro_average = micro_average;
        self
    }
}

/// Row ranges of one fold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldSplit {
    pub test_start: usize,
    pub test_end: usize,
}

impl FoldSplit {
    pub fn test_len(&self) -> usize {
        self.test_end - self.test_start
    }

    fn test_rows<'d>(&self, rows: &'d [StringRecord]) -> &'d [StringRecord] {
        &rows[self.test_start..self.test_end]
    }

    fn train_rows(&self, rows: &[StringRecord]) -> Vec<StringRecord> {
        rows[..self.test_start]
            .iter()
            .chain(rows[self.test_end..].iter())
            .cloned()
            .collect()
    }
}

/// Splits `n_rows` into `folds` contiguous test blocks of `n_rows / folds` rows.
pub fn k_fold(n_rows: usize, folds: usize) -> Result<Vec<FoldSplit>> {
    if folds == 0 || folds > n_rows {
        return Err(Error::InvalidFoldCount {
            folds,
            rows: n_rows,
        });
    }

    let fold_size = n_rows / folds;
    Ok((0..folds)
        .map(|fold| FoldSplit {
            test_start: fold * fold_size,
            test_end: (fold + 1) * fold_size,
        })
        .collect())
}

/// Outcome of a single fold.
#[derive(Debug, Clone)]
pub struct FoldReport {
    pub fold: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub confusion: ConfusionCounts,
    pub metrics: EvaluationMetrics,
}

#[derive(Debug, Clone)]
pub struct EvaluationResult {
    pub micro_average: EvaluationMetrics,
    pub macro_average: EvaluationMetrics,
    pub folds: Vec<FoldReport>,
    /// Confusion counts summed over every fold.
    pub pooled: ConfusionCounts,
}

pub struct CrossValidator {
    config: CrossValidationConfig,
}

impl CrossValidator {
    pub fn new(config: CrossValidationConfig) -> Self {
        CrossValidator { config }
    }

    pub fn config(&self) -> &CrossValidationConfig {
        &self.config
    }

    /// Trains and evaluates a fresh classifier per fold, then averages the folds.
    pub fn run(&self, dataset: &Dataset) -> Result<EvaluationResult> {
        let rows = dataset.rows();
        let splits = k_fold(rows.len(), self.config.folds)?;
        let features = self.config.features.select(rows)?;

        let remainder = rows.len() % self.config.folds;
        if remainder > 0 {
            warn!(
                remainder,
                "rows beyond the last full fold are only ever used for training"
            );
        }

        let mut folds = Vec::with_capacity(splits.len());
        let mut pooled = ConfusionCounts::default();

        for (fold, split) in splits.iter().enumerate() {
            let train = split.train_rows(rows);
            let test = split.test_rows(rows);

            let mut model =
                NaiveBayesClassifier::new(features.clone()).with_smoothing(self.config.smoothing);
            model.fit(&train)?;

            let (confusion, fold_metrics) =
                metrics::evaluate(&model, test, &self.config.positive_label)?;

            info!(
                fold = fold + 1,
                accuracy = ?fold_metrics.accuracy,
                "fold evaluated"
            );
            for metric in Metric::ALL {
                if fold_metrics.value(metric).is_none() {
                    warn!(fold = fold + 1, %metric, "undefined, excluded from averages");
                }
            }

            pooled += confusion;
            folds.push(FoldReport {
                fold,
                train_rows: train.len(),
                test_rows: split.test_len(),
                confusion,
                metrics: fold_metrics,
            });
        }

        let per_fold: Vec<EvaluationMetrics> = folds.iter().map(|f| f.metrics).collect();
        let macro_average = EvaluationMetrics::mean(&per_fold);
        let micro_average = match self.config.micro_average {
            MicroAverage::Pooled => EvaluationMetrics::from_confusion(&pooled),
            MicroAverage::FoldMean => macro_average,
        };

        Ok(EvaluationResult {
            micro_average,
            macro_average,
            folds,
            pooled,
        })
    }
}
