// ============================================================
// Layer 3 — Tabular Dataset
// ============================================================
// An ordered sequence of records. Every record carries exactly
// `feature_count` numeric features plus one target value.
//
// The target type is generic:
//   - f64   for regression (radon activity, house price)
//   - usize for classification (clothing class 0..=9)
//
// Features may live on very different scales (a 0/1 floor flag
// next to a tax rate in the hundreds); that is what the
// Normalizer is for.

use crate::error::{Result, WorkflowError};

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset<T> {
    feature_count: usize,
    features:      Vec<Vec<f64>>,
    targets:       Vec<T>,
}

impl<T> Dataset<T> {
    /// Build a dataset, taking the feature width from the first record.
    /// An empty feature list gives an empty dataset of width 0.
    pub fn new(features: Vec<Vec<f64>>, targets: Vec<T>) -> Result<Self> {
        let feature_count = features.first().map_or(0, Vec::len);
        Self::with_feature_count(feature_count, features, targets)
    }

    /// Build a dataset with an explicit width. Useful when the record
    /// list may be empty but the schema is still known.
    pub fn with_feature_count(
        feature_count: usize,
        features:      Vec<Vec<f64>>,
        targets:       Vec<T>,
    ) -> Result<Self> {
        if features.len() != targets.len() {
            return Err(WorkflowError::DatasetShape(format!(
                "{} feature rows but {} targets",
                features.len(),
                targets.len()
            )));
        }
        if let Some((record, row)) = features
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != feature_count)
        {
            return Err(WorkflowError::SchemaMismatch {
                record,
                got: row.len(),
                expected: feature_count,
            });
        }
        Ok(Self { feature_count, features, targets })
    }

    pub fn empty(feature_count: usize) -> Self {
        Self { feature_count, features: Vec::new(), targets: Vec::new() }
    }

    pub fn feature_count(&self) -> usize {
        self.feature_count
    }

    pub fn record_count(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn features(&self) -> &[Vec<f64>] {
        &self.features
    }

    pub fn targets(&self) -> &[T] {
        &self.targets
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[f64], &T)> {
        self.features.iter().map(Vec::as_slice).zip(self.targets.iter())
    }

    /// Replace the feature matrix while keeping the targets,
    /// e.g. after standardisation or rescaling.
    pub fn with_features(self, features: Vec<Vec<f64>>) -> Result<Self> {
        Self::with_feature_count(self.feature_count, features, self.targets)
    }

    pub fn into_parts(self) -> (Vec<Vec<f64>>, Vec<T>) {
        (self.features, self.targets)
    }
}

impl<T: Clone> Dataset<T> {
    /// Materialise the records at `indices`, in the given order.
    /// Indices out of range are a programming error and panic.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            feature_count: self.feature_count,
            features:      indices.iter().map(|&i| self.features[i].clone()).collect(),
            targets:       indices.iter().map(|&i| self.targets[i].clone()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_taken_from_first_row() {
        let ds = Dataset::new(vec![vec![1.0, 2.0], vec![3.0, 4.0]], vec![0.5, 1.5]).unwrap();
        assert_eq!(ds.feature_count(), 2);
        assert_eq!(ds.record_count(), 2);
    }

    #[test]
    fn test_ragged_record_rejected() {
        let err = Dataset::new(vec![vec![1.0, 2.0], vec![3.0]], vec![0usize, 1]).unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::SchemaMismatch { record: 1, got: 1, expected: 2 }
        ));
    }

    #[test]
    fn test_target_count_must_match() {
        let err = Dataset::new(vec![vec![1.0]], vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, WorkflowError::DatasetShape(_)));
    }

    #[test]
    fn test_select_keeps_pairs_together() {
        let ds = Dataset::new(
            vec![vec![0.0], vec![1.0], vec![2.0]],
            vec![10usize, 11, 12],
        )
        .unwrap();
        let picked = ds.select(&[2, 0]);
        assert_eq!(picked.features(), &[vec![2.0], vec![0.0]]);
        assert_eq!(picked.targets(), &[12, 10]);
    }
}
