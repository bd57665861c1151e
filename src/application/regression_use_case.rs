// ============================================================
// Layer 2 — RegressionUseCase
// ============================================================
// Fits a feed-forward regressor on a tabular dataset:
//
//   Step 1: Load the dataset              (Layer 4 - data)
//   Step 2: Seeded train/dev split        (Layer 4 - data)
//   Step 3: Fit + apply normalization     (Layer 4 - data)
//   Step 4: Save config + normalization   (Layer 6 - infra)
//   Step 5: Run the training loop         (Layer 5 - ml)
//   Step 6: Write history + weights       (Layer 6 - infra)
//
// With hidden_layers = 0 the network is one linear neuron
// (the radon model); 4 × 20 with He init and a full batch is
// the deliberately overfitting Boston model.
//
// The split mask depends only on the record count and the seed,
// so normalizing before or after splitting sees the same records
// in each half; only the statistics differ.
//
// Reference: Burn Book §5 (Training)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::{
    dataset::TabularDataset,
    loader::{BostonLoader, DatasetSource, RegressionCsvLoader},
    normalizer::{NormalizationParameters, NormalizationScope, ZeroVariancePolicy},
    splitter::Splitter,
};
use crate::domain::{
    dataset::Dataset,
    sweep::LossTrajectory,
    traits::{ModelFactory, Trainer},
};
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsLogger};
use crate::ml::{
    model::FeedForwardConfig,
    trainer::{BurnTrainer, FeedForwardFactory, Objective, OptimizerKind, TrainingData},
};

/// On-disk layout of the regression data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegressionFormat {
    /// Headered CSV with a named target column
    Csv,
    /// StatLib Boston housing text file
    Boston,
}

// ─── Regression Configuration ────────────────────────────────────────────────
// Saved next to the checkpoint so `evaluate` can rebuild the same
// network and the same split.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionConfig {
    pub data_path:      String,
    pub format:         RegressionFormat,
    /// Target column name (CSV only)
    pub target:         String,
    pub checkpoint_dir: String,
    pub run_name:       String,
    pub retention:      f64,
    pub seed:           u64,
    pub scope:          NormalizationScope,
    pub zero_variance:  ZeroVariancePolicy,
    pub hidden_layers:  usize,
    pub hidden_width:   usize,
    pub he_init:        bool,
    pub optimizer:      OptimizerKind,
    pub lr:             f64,
    pub epochs:         usize,
    /// None trains on the whole training split at once
    pub batch_size:     Option<usize>,
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self {
            data_path:      "data/radon.csv".to_string(),
            format:         RegressionFormat::Csv,
            target:         "radon".to_string(),
            checkpoint_dir: "checkpoints".to_string(),
            run_name:       "radon".to_string(),
            retention:      0.8,
            seed:           42,
            scope:          NormalizationScope::TrainingSplit,
            zero_variance:  ZeroVariancePolicy::Reject,
            hidden_layers:  0,
            hidden_width:   20,
            he_init:        false,
            optimizer:      OptimizerKind::RmsProp,
            lr:             0.001,
            epochs:         1000,
            batch_size:     Some(32),
        }
    }
}

impl RegressionConfig {
    pub fn model_config(&self, num_inputs: usize) -> FeedForwardConfig {
        FeedForwardConfig::regression(num_inputs, self.hidden_layers, self.hidden_width)
            .with_he_init(self.he_init)
    }
}

/// Normalized train and dev splits of one regression run
pub struct PreparedData {
    pub train:  Dataset<f64>,
    pub dev:    Dataset<f64>,
    pub params: NormalizationParameters,
}

/// Read the raw dataset named by `cfg`.
pub fn load_regression_data(cfg: &RegressionConfig) -> Result<Dataset<f64>> {
    let dataset = match cfg.format {
        RegressionFormat::Csv    => RegressionCsvLoader::new(&cfg.data_path, &cfg.target).load()?,
        RegressionFormat::Boston => BostonLoader::new(&cfg.data_path).load()?,
    };
    tracing::info!(
        "Loaded {} records with {} features from '{}'",
        dataset.record_count(),
        dataset.feature_count(),
        cfg.data_path
    );
    Ok(dataset)
}

/// Split `dataset` and standardise both halves. When `saved` is given
/// those parameters are reused instead of fitting new ones.
pub fn prepare(
    cfg:     &RegressionConfig,
    dataset: Dataset<f64>,
    saved:   Option<NormalizationParameters>,
) -> Result<PreparedData> {
    let split = Splitter::new(cfg.retention)?.split(&dataset, cfg.seed);

    let params = match saved {
        Some(params) => params,
        None => {
            let reference = match cfg.scope {
                NormalizationScope::FullDataset => {
                    tracing::warn!(
                        "Normalizing with statistics of the full dataset; \
                         dev records influence the training inputs"
                    );
                    dataset.features()
                }
                NormalizationScope::TrainingSplit => split.train.features(),
            };
            NormalizationParameters::fit(reference, cfg.zero_variance)
                .context("Cannot fit normalization parameters")?
        }
    };

    let train = params.apply_dataset(split.train)?;
    let dev   = params.apply_dataset(split.test)?;
    Ok(PreparedData { train, dev, params })
}

// ─── RegressionUseCase ───────────────────────────────────────────────────────
pub struct RegressionUseCase {
    config: RegressionConfig,
}

impl RegressionUseCase {
    pub fn new(config: RegressionConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline end to end and return the learning history.
    pub fn execute(&self) -> Result<LossTrajectory> {
        let cfg = &self.config;

        // ── Step 1: Load ──────────────────────────────────────────────────────
        let dataset = load_regression_data(cfg)?;

        // ── Step 2 + 3: Split and normalize ───────────────────────────────────
        let prepared = prepare(cfg, dataset, None)?;
        tracing::info!(
            "Split: {} train, {} dev",
            prepared.train.record_count(),
            prepared.dev.record_count()
        );

        // ── Step 4: Save config for evaluation ────────────────────────────────
        let ckpt = CheckpointManager::new(&cfg.checkpoint_dir, &cfg.run_name)?;
        ckpt.save_config(cfg)?;
        ckpt.save_normalization(&prepared.params)?;

        // ── Step 5: Train ─────────────────────────────────────────────────────
        let data = TrainingData {
            train:      TabularDataset::from_dataset(&prepared.train),
            validation: (!prepared.dev.is_empty()).then(|| TabularDataset::from_dataset(&prepared.dev)),
        };
        let batch_size = cfg.batch_size.unwrap_or(prepared.train.record_count());
        let factory = FeedForwardFactory::new(cfg.model_config(prepared.train.feature_count()));
        let trainer = BurnTrainer::new(Objective::Regression, cfg.optimizer, cfg.lr)
            .with_shuffle_seed(cfg.seed);

        tracing::info!(
            "Training {} epochs with mini-batch size {} ({:?}, lr={})",
            cfg.epochs,
            batch_size,
            cfg.optimizer,
            cfg.lr
        );
        let outcome = trainer
            .train(factory.build_model(), &data, batch_size, cfg.epochs)
            .context("Regression training failed")?;

        // ── Step 6: Persist history and weights ───────────────────────────────
        let history = MetricsLogger::new(ckpt.file("history.csv"))?;
        history.log_all(&outcome.losses)?;
        ckpt.save_model(&outcome.model)?;
        tracing::info!("History written to '{}'", history.csv_path().display());

        tracing::info!(
            "Final loss={:.6} val_loss={}",
            outcome.losses.final_loss().unwrap_or(f64::NAN),
            outcome
                .losses
                .final_val_loss()
                .map_or_else(|| "-".to_string(), |v| format!("{v:.6}")),
        );
        Ok(outcome.losses)
    }
}
