// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Reloads a trained regression run and measures it:
//
//   Step 1: Load config + normalization  (Layer 6 - infra)
//   Step 2: Rebuild the same split       (Layer 4 - data)
//   Step 3: Rebuild model, load weights  (Layer 5 / 6)
//   Step 4: Mean squared error per split (Layer 5 - ml)

use std::path::PathBuf;

use anyhow::{bail, Result};
use burn::backend::ndarray::NdArrayDevice;

use crate::application::regression_use_case::{load_regression_data, prepare, RegressionConfig};
use crate::domain::dataset::Dataset;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{
    model::FeedForward,
    trainer::{predict, EvalBackend},
};

/// Train and dev error of a reloaded run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationReport {
    pub train_records: usize,
    pub dev_records:   usize,
    pub train_mse:     f64,
    /// NaN when the dev split is empty
    pub dev_mse:       f64,
}

pub struct EvaluateUseCase {
    checkpoint_dir: PathBuf,
    run_name:       String,
}

impl EvaluateUseCase {
    pub fn new(checkpoint_dir: impl Into<PathBuf>, run_name: impl Into<String>) -> Self {
        Self { checkpoint_dir: checkpoint_dir.into(), run_name: run_name.into() }
    }

    pub fn execute(&self) -> Result<EvaluationReport> {
        // ── Step 1: Saved run description ─────────────────────────────────────
        let ckpt = CheckpointManager::new(&self.checkpoint_dir, &self.run_name)?;
        let cfg: RegressionConfig = ckpt.load_config()?;
        let params = ckpt.load_normalization()?;

        // ── Step 2: Same split, saved statistics ──────────────────────────────
        let dataset = load_regression_data(&cfg)?;
        if dataset.feature_count() != params.feature_count() {
            bail!(
                "'{}' has {} features but run '{}' was trained on {}",
                cfg.data_path,
                dataset.feature_count(),
                self.run_name,
                params.feature_count()
            );
        }
        let prepared = prepare(&cfg, dataset, Some(params))?;

        // ── Step 3: Model ─────────────────────────────────────────────────────
        let device = NdArrayDevice::default();
        let model: FeedForward<EvalBackend> =
            cfg.model_config(prepared.train.feature_count()).init(&device);
        let model = ckpt.load_model(model, &device)?;

        // ── Step 4: Errors ────────────────────────────────────────────────────
        let report = EvaluationReport {
            train_records: prepared.train.record_count(),
            dev_records:   prepared.dev.record_count(),
            train_mse:     mean_squared_error(&model, &prepared.train)?,
            dev_mse:       mean_squared_error(&model, &prepared.dev)?,
        };
        tracing::info!(
            "Run '{}': train MSE={:.6}, dev MSE={:.6}",
            self.run_name,
            report.train_mse,
            report.dev_mse
        );
        Ok(report)
    }
}

fn mean_squared_error(model: &FeedForward<EvalBackend>, data: &Dataset<f64>) -> Result<f64> {
    if data.is_empty() {
        return Ok(f64::NAN);
    }
    let outputs = predict(model, data.features())?;
    let sum: f64 = outputs
        .iter()
        .zip(data.targets())
        .map(|(out, &target)| {
            let err = f64::from(out[0]) - target;
            err * err
        })
        .sum();
    Ok(sum / data.record_count() as f64)
}
