use csv::StringRecord;
use std::collections::{hash_map::Entry, HashMap, HashSet};
use tracing::debug;

use crate::dataset::label;
use crate::error::{Error, Result};
use crate::features::FeatureSet;

/// Additive smoothing applied to the per-feature likelihoods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Smoothing {
    /// `(count + 1) / (class_count + 2)`: every feature is assumed to take two values.
    #[default]
    Binary,
    /// `(count + 1) / (class_count + v)` where `v` is the number of distinct values
    /// seen for that feature during training.
    ObservedValues,
}

struct ClassCounts {
    label: String,
    rows: usize,
    // column -> value -> number of rows of this class with that value
    values: HashMap<usize, HashMap<String, usize>>,
}

impl ClassCounts {
    fn count(&self, column: usize, value: &str) -> usize {
        self.values
            .get(&column)
            .and_then(|values| values.get(value))
            .copied()
            .unwrap_or(0)
    }
}

struct TrainedState {
    // In order of first occurrence in the training rows.
    classes: Vec<ClassCounts>,
    num_rows: usize,
    distinct_values: HashMap<usize, usize>,
}

/// Categorical naive Bayes over a fixed set of string-valued feature columns.
pub struct NaiveBayesClassifier {
    features: FeatureSet,
    smoothing: Smoothing,
    state: Option<TrainedState>,
}

impl NaiveBayesClassifier {
    pub fn new(features: FeatureSet) -> Self {
        NaiveBayesClassifier {
            features,
            smoothing: Smoothing::default(),
            state: None,
        }
    }

    pub fn with_smoothing(mut self, smoothing: Smoothing) -> Self {
        self.smoothing = smoothing;
        self
    }

    /// Counts labels and `(column, value)` occurrences per label.
    ///
    /// All rows are validated before anything is counted, so on error the
    /// classifier keeps whatever state it had before the call.
    pub fn fit(&mut self, rows: &[StringRecord]) -> Result<()> {
        if rows.is_empty() {
            return Err(Error::EmptyTrainingSet);
        }
        self.features.check_rows(rows)?;

        let mut class_index: HashMap<&str, usize> = HashMap::new();
        let mut classes: Vec<ClassCounts> = Vec::new();
        let mut seen_values: HashMap<usize, HashSet<&str>> = HashMap::new();

        for row in rows {
            let idx = match class_index.entry(label(row)) {
                Entry::Occupied(entry) => *entry.get(),
                Entry::Vacant(entry) => {
                    classes.push(ClassCounts {
                        label: entry.key().to_string(),
                        rows: 0,
                        values: HashMap::new(),
                    });
                    *entry.insert(classes.len() - 1)
                }
            };

            let class = &mut classes[idx];
            class.rows += 1;

            for (column, value) in self.features.values(row) {
                *class
                    .values
                    .entry(column)
                    .or_default()
                    .entry(value.to_string())
                    .or_insert(0) += 1;
                seen_values.entry(column).or_default().insert(value);
            }
        }

        let distinct_values = seen_values
            .into_iter()
            .map(|(column, values)| (column, values.len()))
            .collect();

        if self.features.is_empty() {
            debug!("no feature columns selected, predictions follow class priors only");
        }
        debug!(
            rows = rows.len(),
            classes = classes.len(),
            features = self.features.len(),
            "trained naive bayes classifier"
        );

        self.state = Some(TrainedState {
            classes,
            num_rows: rows.len(),
            distinct_values,
        });

        Ok(())
    }

    pub fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    /// Labels seen during training, in order of first occurrence.
    pub fn labels(&self) -> Result<Vec<&str>> {
        let state = self.state()?;
        Ok(state.classes.iter().map(|c| c.label.as_str()).collect())
    }

    /// Number of training rows per label, in label order.
    pub fn class_counts(&self) -> Result<Vec<(&str, usize)>> {
        let state = self.state()?;
        Ok(state
            .classes
            .iter()
            .map(|c| (c.label.as_str(), c.rows))
            .collect())
    }

    /// Number of training rows with `label` whose `column` held `value`.
    pub fn feature_count(&self, label: &str, column: usize, value: &str) -> Result<usize> {
        let state = self.state()?;
        Ok(state
            .classes
            .iter()
            .find(|c| c.label == label)
            .map_or(0, |c| c.count(column, value)))
    }

    /// Unnormalised posterior score of every label for a row.
    ///
    /// The scores omit the evidence term, so they only order labels against each
    /// other and are not probabilities.
    pub fn scores(&self, row: &StringRecord) -> Result<Vec<(&str, f64)>> {
        let state = self.state()?;
        self.features.check_rows(std::slice::from_ref(row))?;

        let total = state.num_rows as f64;
        let scores = state
            .classes
            .iter()
            .map(|class| {
                let class_rows = class.rows as f64;
                let prior = class_rows / total;

                let likelihood = self.features.values(row).fold(1.0, |acc, (column, value)| {
                    let count = class.count(column, value) as f64;
                    acc * (count + 1.0) / (class_rows + self.value_space(state, column))
                });

                (class.label.as_str(), prior * likelihood)
            })
            .collect();

        Ok(scores)
    }

    /// Returns the label with the highest score. Ties go to the label seen first
    /// during training.
    pub fn predict(&self, row: &StringRecord) -> Result<&str> {
        let scores = self.scores(row)?;

        let mut best: Option<(&str, f64)> = None;
        for (label, score) in scores {
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((label, score));
            }
        }

        best.map(|(label, _)| label).ok_or(Error::UnknownModelState)
    }

    fn value_space(&self, state: &TrainedState, column: usize) -> f64 {
        match self.smoothing {
            Smoothing::Binary => 2.0,
            Smoothing::ObservedValues => {
                state.distinct_values.get(&column).copied().unwrap_or(1) as f64
            }
        }
    }

    fn state(&self) -> Result<&TrainedState> {
        self.state.as_ref().ok_or(Error::UnknownModelState)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureSelection;
    use approx::assert_relative_eq;

    fn record(fields: &[&str]) -> StringRecord {
        StringRecord::from(fields.to_vec())
    }

    fn training_rows() -> Vec<StringRecord> {
        vec![
            record(&["sunny", "hot", "A"]),
            record(&["sunny", "mild", "A"]),
            record(&["rainy", "mild", "B"]),
            record(&["sunny", "cool", "A"]),
            record(&["rainy", "cool", "B"]),
        ]
    }

    fn classifier(rows: &[StringRecord]) -> NaiveBayesClassifier {
        let features = FeatureSelection::FirstN(2).select(rows).unwrap();
        let mut nb = NaiveBayesClassifier::new(features);
        nb.fit(rows).unwrap();
        nb
    }

    #[test]
    fn test_class_counts_sum_to_training_rows() {
        let rows = training_rows();
        let nb = classifier(&rows);
        let counts = nb.class_counts().unwrap();
        assert_eq!(counts, vec![("A", 3), ("B", 2)]);
        assert_eq!(counts.iter().map(|(_, c)| c).sum::<usize>(), rows.len());
    }

    #[test]
    fn test_feature_counts_are_per_label() {
        let nb = classifier(&training_rows());
        assert_eq!(nb.feature_count("A", 0, "sunny").unwrap(), 3);
        assert_eq!(nb.feature_count("B", 0, "sunny").unwrap(), 0);
        assert_eq!(nb.feature_count("B", 1, "cool").unwrap(), 1);
        assert_eq!(nb.feature_count("C", 1, "cool").unwrap(), 0);
    }

    #[test]
    fn test_scores_use_binary_smoothing() {
        let nb = classifier(&training_rows());
        let scores = nb.scores(&record(&["sunny", "cool", "?"])).unwrap();

        // A: 3/5 * (3+1)/(3+2) * (1+1)/(3+2)
        assert_eq!(scores[0].0, "A");
        assert_relative_eq!(scores[0].1, 0.6 * 0.8 * 0.4);
        // B: 2/5 * (0+1)/(2+2) * (1+1)/(2+2)
        assert_eq!(scores[1].0, "B");
        assert_relative_eq!(scores[1].1, 0.4 * 0.25 * 0.5);
    }

    #[test]
    fn test_observed_values_smoothing() {
        let rows = training_rows();
        let features = FeatureSelection::FirstN(2).select(&rows).unwrap();
        let mut nb = NaiveBayesClassifier::new(features).with_smoothing(Smoothing::ObservedValues);
        nb.fit(&rows).unwrap();

        let scores = nb.scores(&record(&["sunny", "cool", "?"])).unwrap();
        // column 0 has 2 distinct values, column 1 has 3.
        assert_relative_eq!(scores[0].1, 0.6 * (4.0 / 5.0) * (2.0 / 6.0));
        assert_relative_eq!(scores[1].1, 0.4 * (1.0 / 4.0) * (2.0 / 5.0));
    }

    #[test]
    fn test_predict_picks_highest_score() {
        let nb = classifier(&training_rows());
        assert_eq!(nb.predict(&record(&["sunny", "hot", "?"])).unwrap(), "A");
        assert_eq!(nb.predict(&record(&["rainy", "cool", "?"])).unwrap(), "B");
    }

    #[test]
    fn test_predict_is_repeatable() {
        let nb = classifier(&training_rows());
        let row = record(&["rainy", "mild", "?"]);
        assert_eq!(nb.predict(&row).unwrap(), nb.predict(&row).unwrap());
    }

    #[test]
    fn test_ties_go_to_first_seen_label() {
        let rows = vec![record(&["x", "B"]), record(&["y", "A"])];
        let features = FeatureSelection::FirstN(1).select(&rows).unwrap();
        let mut nb = NaiveBayesClassifier::new(features);
        nb.fit(&rows).unwrap();
        assert_eq!(nb.predict(&record(&["z", "?"])).unwrap(), "B");
    }

    #[test]
    fn test_unseen_values_never_produce_novel_labels() {
        let nb = classifier(&training_rows());
        let label = nb.predict(&record(&["snowy", "freezing", "Z"])).unwrap();
        assert!(nb.labels().unwrap().contains(&label));
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let features = FeatureSelection::FirstN(2).select(&training_rows()).unwrap();
        let nb = NaiveBayesClassifier::new(features);
        assert!(!nb.is_fitted());
        assert!(matches!(
            nb.predict(&record(&["sunny", "hot", "A"])),
            Err(Error::UnknownModelState)
        ));
        assert!(matches!(nb.class_counts(), Err(Error::UnknownModelState)));
    }

    #[test]
    fn test_fit_on_empty_rows_fails() {
        let features = FeatureSelection::FirstN(2).select(&[]).unwrap();
        let mut nb = NaiveBayesClassifier::new(features);
        assert!(matches!(nb.fit(&[]), Err(Error::EmptyTrainingSet)));
        assert!(!nb.is_fitted());
    }

    #[test]
    fn test_failed_fit_keeps_previous_state() {
        let rows = training_rows();
        let mut nb = classifier(&rows);

        let malformed = vec![record(&["sunny", "hot", "A"]), record(&["rainy", "B"])];
        let err = nb.fit(&malformed).unwrap_err();
        assert!(matches!(err, Error::InsufficientColumns { row: 1, .. }));

        assert_eq!(nb.class_counts().unwrap(), vec![("A", 3), ("B", 2)]);
    }

    #[test]
    fn test_failed_first_fit_leaves_classifier_untrained() {
        let features = FeatureSelection::FirstN(2).select(&training_rows()).unwrap();
        let mut nb = NaiveBayesClassifier::new(features);
        assert!(nb.fit(&[record(&["sunny", "A"])]).is_err());
        assert!(!nb.is_fitted());
    }
}
