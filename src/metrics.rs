//! Binary "positive label vs rest" evaluation of a trained classifier.
//!
//! Rates whose denominator is zero are undefined and carried as `None` rather
//! than as NaN, so averages can skip them explicitly.

use csv::StringRecord;
use std::fmt;
use std::ops::AddAssign;

use crate::bayes::NaiveBayesClassifier;
use crate::dataset::label;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfusionCounts {
    pub true_positive: usize,
    pub true_negative: usize,
    pub false_positive: usize,
    pub false_negative: usize,
}

impl ConfusionCounts {
    /// Records one prediction against its true label.
    pub fn record(&mut self, actual: &str, predicted: &str, positive_label: &str) {
        match (actual == positive_label, predicted == positive_label) {
            (true, true) => self.true_positive += 1,
            (true, false) => self.false_negative += 1,
            (false, true) => self.false_positive += 1,
            (false, false) => self.true_negative += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.true_positive + self.true_negative + self.false_positive + self.false_negative
    }
}

impl AddAssign for ConfusionCounts {
    fn add_assign(&mut self, other: Self) {
        self.true_positive += other.true_positive;
        self.true_negative += other.true_negative;
        self.false_positive += other.false_positive;
        self.false_negative += other.false_negative;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Accuracy,
    TruePositiveRate,
    TrueNegativeRate,
    Precision,
    FScore,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Accuracy,
        Metric::TruePositiveRate,
        Metric::TrueNegativeRate,
        Metric::Precision,
        Metric::FScore,
    ];
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Metric::Accuracy => "Accuracy",
            Metric::TruePositiveRate => "True Positive Rate (Recall)",
            Metric::TrueNegativeRate => "True Negative Rate",
            Metric::Precision => "Precision",
            Metric::FScore => "F-Score",
        };
        f.write_str(name)
    }
}

/// Rates derived from a confusion matrix. `None` marks an undefined rate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EvaluationMetrics {
    pub accuracy: Option<f64>,
    pub true_positive_rate: Option<f64>,
    pub true_negative_rate: Option<f64>,
    pub precision: Option<f64>,
    pub f_score: Option<f64>,
}

fn ratio(numerator: usize, denominator: usize) -> Option<f64> {
    (denominator > 0).then(|| numerator as f64 / denominator as f64)
}

impl EvaluationMetrics {
    pub fn from_confusion(counts: &ConfusionCounts) -> Self {
        let ConfusionCounts {
            true_positive: tp,
            true_negative: tn,
            false_positive: fp,
            false_negative: fn_,
        } = *counts;

        let recall = ratio(tp, tp + fn_);
        let precision = ratio(tp, tp + fp);
        let f_score = match (precision, recall) {
            (Some(p), Some(r)) if p + r > 0.0 => Some(2.0 * p * r / (p + r)),
            _ => None,
        };

        EvaluationMetrics {
            accuracy: ratio(tp + tn, counts.total()),
            true_positive_rate: recall,
            true_negative_rate: ratio(tn, tn + fp),
            precision,
            f_score,
        }
    }

    pub fn value(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Accuracy => self.accuracy,
            Metric::TruePositiveRate => self.true_positive_rate,
            Metric::TrueNegativeRate => self.true_negative_rate,
            Metric::Precision => self.precision,
            Metric::FScore => self.f_score,
        }
    }

    fn value_mut(&mut self, metric: Metric) -> &mut Option<f64> {
        match metric {
            Metric::Accuracy => &mut self.accuracy,
            Metric::TruePositiveRate => &mut self.true_positive_rate,
            Metric::TrueNegativeRate => &mut self.true_negative_rate,
            Metric::Precision => &mut self.precision,
            Metric::FScore => &mut self.f_score,
        }
    }

    /// Like [`value`](Self::value), but an undefined rate is an error.
    pub fn get(&self, metric: Metric) -> Result<f64> {
        self.value(metric).ok_or(Error::UndefinedMetric(metric))
    }

    /// Unweighted per-metric mean. Undefined entries are left out of the mean of
    /// that metric only; a metric undefined everywhere stays undefined.
    pub fn mean(all: &[EvaluationMetrics]) -> EvaluationMetrics {
        let mut mean = EvaluationMetrics::default();
        for metric in Metric::ALL {
            let defined: Vec<f64> = all.iter().filter_map(|m| m.value(metric)).collect();
            if !defined.is_empty() {
                *mean.value_mut(metric) = Some(defined.iter().sum::<f64>() / defined.len() as f64);
            }
        }
        mean
    }
}

impl fmt::Display for EvaluationMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for metric in Metric::ALL {
            match self.value(metric) {
                Some(value) => writeln!(f, "{}: {}", metric, value)?,
                None => writeln!(f, "{}: undefined", metric)?,
            }
        }
        Ok(())
    }
}

/// Classifies every test row and tallies the outcomes against `positive_label`.
pub fn confusion(
    model: &NaiveBayesClassifier,
    test_rows: &[StringRecord],
    positive_label: &str,
) -> Result<ConfusionCounts> {
    let mut counts = ConfusionCounts::default();
    for row in test_rows {
        let predicted = model.predict(row)?;
        counts.record(label(row), predicted, positive_label);
    }
    Ok(counts)
}

/// Evaluates a trained classifier on held-out rows, returning both the raw
/// counts and the rates derived from them.
pub fn evaluate(
    model: &NaiveBayesClassifier,
    test_rows: &[StringRecord],
    positive_label: &str,
) -> Result<(ConfusionCounts, EvaluationMetrics)> {
    let counts = confusion(model, test_rows, positive_label)?;
    Ok((counts, EvaluationMetrics::from_confusion(&counts)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureSelection;
    use approx::assert_relative_eq;

    fn counts(tp: usize, tn: usize, fp: usize, fn_: usize) -> ConfusionCounts {
        ConfusionCounts {
            true_positive: tp,
            true_negative: tn,
            false_positive: fp,
            false_negative: fn_,
        }
    }

    #[test]
    fn test_record_fills_each_cell() {
        let mut c = ConfusionCounts::default();
        c.record("A", "A", "A");
        c.record("A", "B", "A");
        c.record("B", "A", "A");
        c.record("B", "B", "A");
        c.record("C", "B", "A");
        assert_eq!(c, counts(1, 2, 1, 1));
        assert_eq!(c.total(), 5);
    }

    #[test]
    fn test_rates_from_confusion() {
        let m = EvaluationMetrics::from_confusion(&counts(6, 3, 2, 1));
        assert_relative_eq!(m.accuracy.unwrap(), 9.0 / 12.0);
        assert_relative_eq!(m.true_positive_rate.unwrap(), 6.0 / 7.0);
        assert_relative_eq!(m.true_negative_rate.unwrap(), 3.0 / 5.0);
        assert_relative_eq!(m.precision.unwrap(), 6.0 / 8.0);

        let (p, r) = (6.0 / 8.0, 6.0 / 7.0);
        assert_relative_eq!(m.f_score.unwrap(), 2.0 * p * r / (p + r));
    }

    #[test]
    fn test_zero_denominators_are_undefined() {
        // Every row is positive and predicted positive.
        let m = EvaluationMetrics::from_confusion(&counts(4, 0, 0, 0));
        assert_eq!(m.accuracy, Some(1.0));
        assert_eq!(m.true_negative_rate, None);
        assert!(matches!(
            m.get(Metric::TrueNegativeRate),
            Err(Error::UndefinedMetric(Metric::TrueNegativeRate))
        ));

        // Every row is negative and predicted negative.
        let m = EvaluationMetrics::from_confusion(&counts(0, 4, 0, 0));
        assert_eq!(m.true_positive_rate, None);
        assert_eq!(m.precision, None);
        assert_eq!(m.f_score, None);
    }

    #[test]
    fn test_f_score_undefined_when_precision_and_recall_are_zero() {
        let m = EvaluationMetrics::from_confusion(&counts(0, 1, 1, 1));
        assert_eq!(m.precision, Some(0.0));
        assert_eq!(m.true_positive_rate, Some(0.0));
        assert_eq!(m.f_score, None);
    }

    #[test]
    fn test_empty_confusion_is_all_undefined() {
        let m = EvaluationMetrics::from_confusion(&ConfusionCounts::default());
        assert!(Metric::ALL.iter().all(|&metric| m.value(metric).is_none()));
    }

    #[test]
    fn test_mean_skips_undefined_entries() {
        let a = EvaluationMetrics {
            accuracy: Some(1.0),
            precision: Some(0.5),
            ..Default::default()
        };
        let b = EvaluationMetrics {
            accuracy: Some(0.5),
            precision: None,
            ..Default::default()
        };

        let mean = EvaluationMetrics::mean(&[a, b]);
        assert_relative_eq!(mean.accuracy.unwrap(), 0.75);
        assert_relative_eq!(mean.precision.unwrap(), 0.5);
        assert_eq!(mean.f_score, None);
    }

    #[test]
    fn test_display_marks_undefined() {
        let m = EvaluationMetrics::from_confusion(&counts(0, 2, 0, 0));
        let text = m.to_string();
        assert!(text.contains("Accuracy: 1"));
        assert!(text.contains("Precision: undefined"));
    }

    #[test]
    fn test_evaluate_counts_every_test_row() {
        let train: Vec<StringRecord> = [["a", "A"], ["a", "A"], ["b", "B"], ["b", "B"]]
            .iter()
            .map(|r| StringRecord::from(r.to_vec()))
            .collect();
        let test: Vec<StringRecord> = [["a", "A"], ["b", "A"], ["b", "B"]]
            .iter()
            .map(|r| StringRecord::from(r.to_vec()))
            .collect();

        let features = FeatureSelection::FirstN(1).select(&train).unwrap();
        let mut nb = NaiveBayesClassifier::new(features);
        nb.fit(&train).unwrap();

        let c = confusion(&nb, &test, "A").unwrap();
        assert_eq!(c.total(), test.len());
        assert_eq!(c, counts(1, 1, 0, 1));

        let (evaluated, m) = evaluate(&nb, &test, "A").unwrap();
        assert_eq!(evaluated, c);
        assert_relative_eq!(m.accuracy.unwrap(), 2.0 / 3.0);
        assert_eq!(m.precision, Some(1.0));
    }
}
