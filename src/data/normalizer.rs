// ============================================================
// Layer 4 — Feature Normalizer
// ============================================================
// Per-feature standardisation:
//
//     z = (x - mean) / std
//
// mean and std are computed ONCE from a reference set and then
// applied read-only to every dataset with the same schema.
// Recomputing them per subset would let the dev/test statistics
// leak into the transform.
//
// std is the population standard deviation (divide by N).
//
// Zero-variance features (e.g. a column that is constant in the
// reference set) make the transform undefined. The caller picks
// a ZeroVariancePolicy: reject with DegenerateFeature, or
// substitute a small positive epsilon.
//
// A constant column whose value is not exactly representable
// (0.1, 0.3, ...) leaves a rounding residue in the mean, so the
// computed std is tiny but not 0.0. Anything at or below a few
// ulps of the mean counts as zero variance.

use serde::{Deserialize, Serialize};

use crate::domain::dataset::Dataset;
use crate::error::{Result, WorkflowError};

/// Ulps of the feature mean under which a std counts as zero
const ZERO_STD_ULPS: f64 = 16.0;

/// What to do when a reference feature has zero standard deviation
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum ZeroVariancePolicy {
    /// Fail with `WorkflowError::DegenerateFeature`
    #[default]
    Reject,
    /// Replace the zero std with the given value
    Epsilon(f64),
}

/// Which records the parameters are fitted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NormalizationScope {
    /// Fit on every record before splitting. Statistics of the dev
    /// split leak into the training inputs.
    FullDataset,
    /// Fit on the training split only, apply to both splits
    #[default]
    TrainingSplit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationParameters {
    mean:    Vec<f64>,
    std_dev: Vec<f64>,
}

impl NormalizationParameters {
    /// Compute per-feature mean and population std from `rows`.
    pub fn fit(rows: &[Vec<f64>], policy: ZeroVariancePolicy) -> Result<Self> {
        if let ZeroVariancePolicy::Epsilon(eps) = policy {
            if !(eps.is_finite() && eps > 0.0) {
                return Err(WorkflowError::InvalidEpsilon(eps));
            }
        }
        let first = rows.first().ok_or(WorkflowError::EmptyReference)?;
        let width = first.len();
        if let Some((record, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(WorkflowError::DatasetShape(format!(
                "reference record {record} has {} features, record 0 has {width}",
                row.len()
            )));
        }

        let n = rows.len() as f64;

        // ── Pass 1: means ─────────────────────────────────────────────────────
        let mut mean = vec![0.0; width];
        for row in rows {
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        // ── Pass 2: squared deviations ────────────────────────────────────────
        let mut std_dev = vec![0.0; width];
        for row in rows {
            for ((s, v), m) in std_dev.iter_mut().zip(row).zip(&mean) {
                *s += (v - m).powi(2);
            }
        }
        std_dev.iter_mut().for_each(|s| *s = (*s / n).sqrt());

        for (feature, s) in std_dev.iter_mut().enumerate() {
            if !is_zero_std(*s, mean[feature]) {
                continue;
            }
            match policy {
                ZeroVariancePolicy::Reject => {
                    return Err(WorkflowError::DegenerateFeature {
                        feature,
                        mean: mean[feature],
                    });
                }
                ZeroVariancePolicy::Epsilon(eps) => {
                    tracing::warn!(
                        "Feature {} has zero variance; substituting std = {}",
                        feature,
                        eps
                    );
                    *s = eps;
                }
            }
        }

        Ok(Self { mean, std_dev })
    }

    pub fn feature_count(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn std_dev(&self) -> &[f64] {
        &self.std_dev
    }

    /// Standardise one raw value of `feature`
    pub fn transform_value(&self, feature: usize, value: f64) -> f64 {
        (value - self.mean[feature]) / self.std_dev[feature]
    }

    /// Standardise every row. Rows must have the fitted width.
    pub fn apply(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        check_widths(rows, self.feature_count())?;
        Ok(rows
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .map(|(feature, &v)| self.transform_value(feature, v))
                    .collect()
            })
            .collect())
    }

    /// Standardise the features of `dataset`, keeping its targets.
    pub fn apply_dataset<T>(&self, dataset: Dataset<T>) -> Result<Dataset<T>> {
        if dataset.feature_count() != self.feature_count() && !dataset.is_empty() {
            return Err(WorkflowError::SchemaMismatch {
                record:   0,
                got:      dataset.feature_count(),
                expected: self.feature_count(),
            });
        }
        let features = self.apply(dataset.features())?;
        let (_, targets) = dataset.into_parts();
        Dataset::with_feature_count(self.feature_count(), features, targets)
    }
}

fn is_zero_std(std_dev: f64, mean: f64) -> bool {
    std_dev <= ZERO_STD_ULPS * f64::EPSILON * mean.abs()
}

fn check_widths(rows: &[Vec<f64>], expected: usize) -> Result<()> {
    match rows.iter().enumerate().find(|(_, r)| r.len() != expected) {
        Some((record, row)) => Err(WorkflowError::SchemaMismatch {
            record,
            got: row.len(),
            expected,
        }),
        None => Ok(()),
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-9;

    fn column(rows: &[Vec<f64>], j: usize) -> Vec<f64> {
        rows.iter().map(|r| r[j]).collect()
    }

    fn mean_and_std(values: &[f64]) -> (f64, f64) {
        let n    = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var  = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        (mean, var.sqrt())
    }

    fn reference() -> Vec<Vec<f64>> {
        // two features on wildly different scales
        vec![
            vec![0.006, 296.0],
            vec![0.027, 242.0],
            vec![0.032, 222.0],
            vec![0.069, 311.0],
            vec![0.088, 666.0],
        ]
    }

    #[test]
    fn test_reference_becomes_zero_mean_unit_std() {
        let rows   = reference();
        let params = NormalizationParameters::fit(&rows, ZeroVariancePolicy::Reject).unwrap();
        let z      = params.apply(&rows).unwrap();

        for j in 0..2 {
            let (m, s) = mean_and_std(&column(&z, j));
            assert!(m.abs() < TOL, "feature {j} mean {m}");
            assert!((s - 1.0).abs() < TOL, "feature {j} std {s}");
        }
    }

    #[test]
    fn test_population_std_divides_by_n() {
        let rows   = vec![vec![1.0], vec![3.0]];
        let params = NormalizationParameters::fit(&rows, ZeroVariancePolicy::Reject).unwrap();
        assert_eq!(params.mean(), &[2.0]);
        // sample std would be sqrt(2); population std is 1
        assert!((params.std_dev()[0] - 1.0).abs() < TOL);
    }

    #[test]
    fn test_other_dataset_uses_reference_statistics() {
        let params = NormalizationParameters::fit(&reference(), ZeroVariancePolicy::Reject).unwrap();
        let other  = vec![vec![5.0, -10.0], vec![7.0, 1000.0]];
        let z      = params.apply(&other).unwrap();

        for (row, zrow) in other.iter().zip(&z) {
            for j in 0..2 {
                let expected = (row[j] - params.mean()[j]) / params.std_dev()[j];
                assert!((zrow[j] - expected).abs() < TOL);
            }
        }
        // The transformed set is NOT standardised by its own statistics
        let (m, _) = mean_and_std(&column(&z, 0));
        assert!(m.abs() > 1.0);
    }

    #[test]
    fn test_zero_variance_rejected() {
        let rows = vec![vec![1.0, 4.0], vec![2.0, 4.0], vec![3.0, 4.0]];
        let err  = NormalizationParameters::fit(&rows, ZeroVariancePolicy::Reject).unwrap_err();
        assert!(matches!(err, WorkflowError::DegenerateFeature { feature: 1, .. }));
    }

    #[test]
    fn test_zero_variance_epsilon_maps_constant_to_zero() {
        let rows   = vec![vec![1.0, 4.0], vec![2.0, 4.0], vec![3.0, 4.0]];
        let params = NormalizationParameters::fit(&rows, ZeroVariancePolicy::Epsilon(1e-8)).unwrap();
        let z      = params.apply(&rows).unwrap();
        assert!(z.iter().all(|r| r[1] == 0.0 && r[1].is_finite()));
    }

    #[test]
    fn test_inexact_constant_column_is_zero_variance() {
        // 0.1 has no exact binary form; the mean picks up a rounding residue
        let rows = vec![vec![1.0, 0.1], vec![2.0, 0.1], vec![3.0, 0.1]];
        let err  = NormalizationParameters::fit(&rows, ZeroVariancePolicy::Reject).unwrap_err();
        assert!(matches!(err, WorkflowError::DegenerateFeature { feature: 1, .. }));

        let params = NormalizationParameters::fit(&rows, ZeroVariancePolicy::Epsilon(1e-8)).unwrap();
        assert_eq!(params.std_dev()[1], 1e-8);
        let z = params.apply(&rows).unwrap();
        assert!(z.iter().all(|r| r[1].abs() < 1e-6));
    }

    #[test]
    fn test_small_but_real_spread_is_kept() {
        let rows   = vec![vec![1e-9], vec![2e-9], vec![3e-9]];
        let params = NormalizationParameters::fit(&rows, ZeroVariancePolicy::Reject).unwrap();
        assert!(params.std_dev()[0] > 0.0);
    }

    #[test]
    fn test_non_positive_epsilon_rejected() {
        let rows = vec![vec![4.0], vec![4.0]];
        for eps in [0.0, -1e-8, f64::NAN, f64::INFINITY] {
            let res = NormalizationParameters::fit(&rows, ZeroVariancePolicy::Epsilon(eps));
            assert!(matches!(res, Err(WorkflowError::InvalidEpsilon(_))), "accepted epsilon {eps}");
        }
    }

    #[test]
    fn test_ragged_reference_is_a_shape_error() {
        let rows = vec![vec![1.0, 2.0], vec![3.0]];
        let err  = NormalizationParameters::fit(&rows, ZeroVariancePolicy::Reject).unwrap_err();
        assert!(matches!(err, WorkflowError::DatasetShape(_)));
    }

    #[test]
    fn test_empty_reference_rejected() {
        let err = NormalizationParameters::fit(&[], ZeroVariancePolicy::Reject).unwrap_err();
        assert!(matches!(err, WorkflowError::EmptyReference));
    }

    #[test]
    fn test_schema_mismatch_on_apply() {
        let params = NormalizationParameters::fit(&reference(), ZeroVariancePolicy::Reject).unwrap();
        let err    = params.apply(&[vec![1.0, 2.0, 3.0]]).unwrap_err();
        assert!(matches!(err, WorkflowError::SchemaMismatch { expected: 2, got: 3, .. }));
    }

    #[test]
    fn test_apply_dataset_keeps_targets() {
        let ds     = Dataset::new(reference(), vec![24.0, 21.6, 34.7, 33.4, 36.2]).unwrap();
        let params = NormalizationParameters::fit(ds.features(), ZeroVariancePolicy::Reject).unwrap();
        let z      = params.apply_dataset(ds.clone()).unwrap();
        assert_eq!(z.targets(), ds.targets());
        assert_eq!(z.feature_count(), 2);
    }

    #[test]
    fn test_parameters_round_trip_through_json() {
        let params = NormalizationParameters::fit(&reference(), ZeroVariancePolicy::Reject).unwrap();
        let json   = serde_json::to_string(&params).unwrap();
        let back: NormalizationParameters = serde_json::from_str(&json).unwrap();
        for (a, b) in back.mean().iter().zip(params.mean()) {
            assert!((a - b).abs() < TOL);
        }
        for (a, b) in back.std_dev().iter().zip(params.std_dev()) {
            assert!((a - b).abs() < TOL);
        }
    }
}
