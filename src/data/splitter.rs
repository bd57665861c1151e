// ============================================================
// Layer 4 — Train/Test Splitter
// ============================================================
// Partitions a dataset into two disjoint subsets:
//   - Training set: used to update model weights
//   - Test / dev set: used to measure performance on unseen data
//
// How the split works:
//   Every record gets one uniform draw in [0, 1) from a seeded
//   generator, in record order. Draw < retention → training set,
//   otherwise → test set. The result is a boolean mask.
//
//   This is a per-record coin flip, NOT a shuffle-and-cut, so the
//   training fraction is only approximately `retention`:
//   919 records at 0.8 can give 733 training records, not 735.
//
// Determinism:
//   Same seed + same record count + same retention → same mask.
//   The generator is passed in explicitly (or built from a seed)
//   so no global RNG state is involved. Reproducing masks made by
//   another language's generator is NOT possible; only masks made
//   by this crate's StdRng are reproducible.
//
// Reference: rand crate documentation (StdRng, SeedableRng)

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::domain::dataset::Dataset;
use crate::error::{Result, WorkflowError};

/// Boolean inclusion mask: `true` = training record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitMask {
    include: Vec<bool>,
}

impl SplitMask {
    pub fn len(&self) -> usize {
        self.include.len()
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.include
    }

    pub fn train_count(&self) -> usize {
        self.include.iter().filter(|&&keep| keep).count()
    }

    pub fn train_indices(&self) -> Vec<usize> {
        self.indices_where(true)
    }

    pub fn test_indices(&self) -> Vec<usize> {
        self.indices_where(false)
    }

    fn indices_where(&self, wanted: bool) -> Vec<usize> {
        self.include
            .iter()
            .enumerate()
            .filter(|(_, &keep)| keep == wanted)
            .map(|(i, _)| i)
            .collect()
    }
}

/// A dataset partitioned by a mask, with materialised copies
/// of both halves.
#[derive(Debug, Clone)]
pub struct Split<T> {
    pub mask:  SplitMask,
    pub train: Dataset<T>,
    pub test:  Dataset<T>,
}

#[derive(Debug, Clone, Copy)]
pub struct Splitter {
    retention: f64,
}

impl Splitter {
    /// `retention` is the probability that a record lands in the
    /// training set. 0.8 keeps roughly 80% for training.
    pub fn new(retention: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&retention) {
            // NaN also fails `contains`
            return Err(WorkflowError::InvalidRetention(retention));
        }
        Ok(Self { retention })
    }

    pub fn retention(&self) -> f64 {
        self.retention
    }

    /// Draw one value per record from `rng` and build the mask.
    pub fn mask<R: Rng + ?Sized>(&self, record_count: usize, rng: &mut R) -> SplitMask {
        let include = (0..record_count)
            .map(|_| rng.gen::<f64>() < self.retention)
            .collect();
        SplitMask { include }
    }

    /// Build the mask from a fresh generator seeded with `seed`.
    pub fn mask_seeded(&self, record_count: usize, seed: u64) -> SplitMask {
        let mut rng = StdRng::seed_from_u64(seed);
        self.mask(record_count, &mut rng)
    }

    /// Partition `dataset` into train and test copies.
    pub fn split<T: Clone>(&self, dataset: &Dataset<T>, seed: u64) -> Split<T> {
        let mask = self.mask_seeded(dataset.record_count(), seed);
        let train = dataset.select(&mask.train_indices());
        let test  = dataset.select(&mask.test_indices());

        tracing::debug!(
            "Dataset split (seed={}, retention={}): {} training, {} test",
            seed,
            self.retention,
            train.record_count(),
            test.record_count(),
        );

        Split { mask, train, test }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn indexed_dataset(n: usize) -> Dataset<usize> {
        let features = (0..n).map(|i| vec![i as f64]).collect();
        let targets  = (0..n).collect();
        Dataset::new(features, targets).unwrap()
    }

    #[test]
    fn test_same_seed_same_mask() {
        let splitter = Splitter::new(0.8).unwrap();
        let a = splitter.mask_seeded(500, 42);
        let b = splitter.mask_seeded(500, 42);
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seeds_differ() {
        let splitter = Splitter::new(0.5).unwrap();
        assert_ne!(splitter.mask_seeded(200, 1), splitter.mask_seeded(200, 2));
    }

    #[test]
    fn test_partition_is_complete_and_disjoint() {
        let ds    = indexed_dataset(321);
        let split = Splitter::new(0.7).unwrap().split(&ds, 7);

        let mut all: Vec<usize> = split
            .train
            .targets()
            .iter()
            .chain(split.test.targets())
            .copied()
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..321).collect::<Vec<_>>());

        let train = split.mask.train_indices();
        assert!(split.mask.test_indices().iter().all(|i| !train.contains(i)));
    }

    #[test]
    fn test_record_order_preserved_within_subsets() {
        let ds    = indexed_dataset(100);
        let split = Splitter::new(0.6).unwrap().split(&ds, 3);
        assert!(split.train.targets().windows(2).all(|w| w[0] < w[1]));
        assert!(split.test.targets().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_realised_fraction_close_to_retention() {
        let mask  = Splitter::new(0.8).unwrap().mask_seeded(10_000, 42);
        let train = mask.train_count() as f64;
        // within 3% of the expected 8000
        assert!((train - 8000.0).abs() < 240.0, "got {train}");
    }

    #[test]
    fn test_retention_near_one_keeps_almost_everything() {
        let mask = Splitter::new(0.999).unwrap().mask_seeded(5_000, 11);
        assert!(mask.train_count() as f64 / 5_000.0 > 0.99);

        let all = Splitter::new(1.0).unwrap().mask_seeded(1_000, 11);
        assert_eq!(all.train_count(), 1_000);
    }

    #[test]
    fn test_empty_dataset() {
        let ds: Dataset<usize> = Dataset::empty(3);
        let split = Splitter::new(0.8).unwrap().split(&ds, 42);
        assert!(split.mask.is_empty());
        assert!(split.train.is_empty());
        assert!(split.test.is_empty());
        assert_eq!(split.train.feature_count(), 3);
    }

    #[test]
    fn test_retention_out_of_range_rejected() {
        assert!(matches!(Splitter::new(1.5), Err(WorkflowError::InvalidRetention(_))));
        assert!(Splitter::new(-0.1).is_err());
        assert!(Splitter::new(f64::NAN).is_err());
    }

    #[test]
    fn test_caller_supplied_generator_is_used() {
        let splitter = Splitter::new(0.5).unwrap();
        let mut rng  = StdRng::seed_from_u64(99);
        let first    = splitter.mask(50, &mut rng);
        let second   = splitter.mask(50, &mut rng);
        // the generator advances between calls
        assert_ne!(first, second);
        assert_eq!(first, splitter.mask_seeded(50, 99));
    }
}
