// ============================================================
// Layer 4 — Pixel Preprocessor
// ============================================================
// Rescales raw features by a fixed range before training.
//
// Grey-scale images arrive as integers 0..=255. Dividing by 255
// maps them into [0, 1] so the first layer sees inputs of the
// same order of magnitude as its initial weights.
//
// Unlike the Normalizer this uses no statistics of the data,
// so train and test sets can be rescaled independently.

use anyhow::{bail, Result};

use crate::domain::dataset::Dataset;

pub struct Preprocessor {
    range: f64,
}

impl Preprocessor {
    /// Divide every feature by `range`
    pub fn pixel_range(range: f64) -> Result<Self> {
        if !(range.is_finite() && range > 0.0) {
            bail!("rescale range must be a positive number, got {range}");
        }
        Ok(Self { range })
    }

    pub fn rescale(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter()
            .map(|row| row.iter().map(|v| v / self.range).collect())
            .collect()
    }

    pub fn apply<T>(&self, dataset: Dataset<T>) -> Result<Dataset<T>> {
        let rows = self.rescale(dataset.features());
        Ok(dataset.with_features(rows)?)
    }
}

/// 8-bit grey levels
impl Default for Preprocessor {
    fn default() -> Self {
        Self { range: 255.0 }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixels_map_into_unit_interval() {
        let p = Preprocessor::default();
        assert_eq!(p.rescale(&[vec![0.0, 51.0, 255.0]]), vec![vec![0.0, 0.2, 1.0]]);
    }

    #[test]
    fn test_non_positive_range_rejected() {
        assert!(Preprocessor::pixel_range(0.0).is_err());
        assert!(Preprocessor::pixel_range(-1.0).is_err());
        assert!(Preprocessor::pixel_range(f64::INFINITY).is_err());
    }

    #[test]
    fn test_apply_keeps_labels() {
        let ds = Dataset::new(vec![vec![255.0], vec![0.0]], vec![9usize, 0]).unwrap();
        let out = Preprocessor::default().apply(ds).unwrap();
        assert_eq!(out.targets(), &[9, 0]);
        assert_eq!(out.features(), &[vec![1.0], vec![0.0]]);
    }
}
