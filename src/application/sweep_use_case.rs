// ============================================================
// Layer 2 — SweepUseCase
// ============================================================
// Compares mini-batch sizes on an image classification task:
//
//   Step 1: Validate the sweep            (Layer 2)
//   Step 2: Load labelled images          (Layer 4 - data)
//   Step 3: Rescale pixels to [0, 1]      (Layer 4 - data)
//   Step 4: Save config                   (Layer 6 - infra)
//   Step 5: Run the batch-timing harness  (Layer 2 + 5 + 6)
//
// Every size trains a fresh "15-10" network with SGD + momentum
// on the full training set; the per-size histories and the
// timing table end up in the history store.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::application::sweep_harness::SweepHarness;
use crate::data::{
    dataset::TabularDataset,
    loader::{DatasetSource, IdxLoader, LabelledCsvLoader},
    preprocessor::Preprocessor,
};
use crate::domain::{dataset::Dataset, sweep::BatchSweepResult};
use crate::infra::{checkpoint::CheckpointManager, history_store::CsvSweepStore};
use crate::ml::{
    model::FeedForwardConfig,
    trainer::{BurnTrainer, FeedForwardFactory, Objective, OptimizerKind, TrainingData},
};

/// Where the labelled images come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageSource {
    /// gzip'd IDX image and label files
    Idx { images: String, labels: String },
    /// CSV with the label in the first column
    Csv { path: String },
}

// ─── Sweep Configuration ─────────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    pub source:      ImageSource,
    pub out_dir:     String,
    pub prefix:      String,
    pub batch_sizes: Vec<usize>,
    pub epochs:      usize,
    /// Hidden widths then output width, e.g. "15-10"
    pub structure:   String,
    pub lr:          f64,
    pub momentum:    f64,
    pub pixel_range: f64,
    pub seed:        u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            source: ImageSource::Idx {
                images: "data/train-images-idx3-ubyte.gz".to_string(),
                labels: "data/train-labels-idx1-ubyte.gz".to_string(),
            },
            out_dir:     "histories".to_string(),
            prefix:      "history-03-3".to_string(),
            batch_sizes: vec![200, 100, 50, 20, 10, 5],
            epochs:      1000,
            structure:   "15-10".to_string(),
            lr:          1e-4,
            momentum:    0.9,
            pixel_range: 255.0,
            seed:        42,
        }
    }
}

// ─── SweepUseCase ────────────────────────────────────────────────────────────
pub struct SweepUseCase {
    config: SweepConfig,
}

impl SweepUseCase {
    pub fn new(config: SweepConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<Vec<BatchSweepResult>> {
        let cfg = &self.config;

        // ── Step 1: Validate before touching the data ─────────────────────────
        let store   = CsvSweepStore::new(&cfg.out_dir, &cfg.prefix);
        let harness = SweepHarness::new(cfg.batch_sizes.clone(), cfg.epochs, store)?;

        // ── Step 2: Load images ───────────────────────────────────────────────
        let raw: Dataset<usize> = match &cfg.source {
            ImageSource::Idx { images, labels } => IdxLoader::new(images, labels).load()?,
            ImageSource::Csv { path }           => LabelledCsvLoader::new(path).load()?,
        };
        tracing::info!(
            "Loaded {} images with {} pixels each",
            raw.record_count(),
            raw.feature_count()
        );

        // ── Step 3: Rescale pixels ────────────────────────────────────────────
        let images = Preprocessor::pixel_range(cfg.pixel_range)?.apply(raw)?;

        // ── Step 4: Save config ───────────────────────────────────────────────
        CheckpointManager::new(&cfg.out_dir, &cfg.prefix)?.save_config(cfg)?;

        // ── Step 5: Harness ───────────────────────────────────────────────────
        let model   = FeedForwardConfig::from_structure(images.feature_count(), &cfg.structure)?;
        let factory = FeedForwardFactory::new(model);
        let trainer = BurnTrainer::new(
            Objective::Classification,
            OptimizerKind::Sgd { momentum: cfg.momentum },
            cfg.lr,
        )
        .with_shuffle_seed(cfg.seed);
        let data = TrainingData { train: TabularDataset::from_dataset(&images), validation: None };

        let results = harness.run(&factory, &trainer, &data)?;

        let stored = harness.load_results()?;
        tracing::info!(
            "Sweep finished; {} mini-batch sizes stored in '{}'",
            stored.len(),
            cfg.out_dir
        );
        Ok(results)
    }
}
