// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores a trained run using burn's CompactRecorder.
//
// What gets saved per run:
//   1. <run>-model.mpk.gz        - all learned parameters
//   2. <run>-config.json         - the run configuration, enough
//                                  to rebuild the same network and
//                                  the same train/dev split
//   3. <run>-normalization.json  - per-feature mean and std used
//                                  to standardise the inputs
//
// The network must be rebuilt from the config before the record
// can be loaded into it; loading fails if the shapes differ.
//
// Reference: Burn Book §5 (Records and Checkpointing)
//            Rust Book §9 (Error Handling)

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use serde::{de::DeserializeOwned, Serialize};

use crate::data::normalizer::NormalizationParameters;
use crate::ml::model::FeedForward;

/// Manages the files of one named run inside a directory.
pub struct CheckpointManager {
    dir: PathBuf,
    run: String,
}

impl CheckpointManager {
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<PathBuf>, run: impl Into<String>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir, run: run.into() })
    }

    /// Path of a run artefact, e.g. `file("history.csv")`
    pub fn file(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}-{}", self.run, suffix))
    }

    /// Recorder adds the `.mpk.gz` extension
    fn model_path(&self) -> PathBuf {
        self.file("model")
    }

    pub fn save_model<B: Backend>(&self, model: &FeedForward<B>) -> Result<()> {
        let path = self.model_path();
        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        tracing::debug!("Saved model weights to '{}'", path.display());
        Ok(())
    }

    /// Restore weights into `model`, which must have the saved architecture.
    pub fn load_model<B: Backend>(&self, model: FeedForward<B>, device: &B::Device) -> Result<FeedForward<B>> {
        let path = self.model_path();
        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Has this run been trained?", path.display())
            })?;

        tracing::info!("Loaded model weights from '{}'", path.display());
        Ok(model.load_record(record))
    }

    pub fn save_config<C: Serialize>(&self, cfg: &C) -> Result<()> {
        self.write_json("config.json", cfg)
    }

    pub fn load_config<C: DeserializeOwned>(&self) -> Result<C> {
        self.read_json("config.json")
    }

    pub fn save_normalization(&self, params: &NormalizationParameters) -> Result<()> {
        self.write_json("normalization.json", params)
    }

    pub fn load_normalization(&self) -> Result<NormalizationParameters> {
        self.read_json("normalization.json")
    }

    fn write_json<T: Serialize>(&self, suffix: &str, value: &T) -> Result<()> {
        let path = self.file(suffix);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json).with_context(|| format!("Cannot write '{}'", path.display()))?;

        tracing::debug!("Saved '{}'", path.display());
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, suffix: &str) -> Result<T> {
        let path = self.file(suffix);
        let json = fs::read_to_string(&path).with_context(|| {
            format!("Cannot read '{}'. Has this run been trained?", path.display())
        })?;
        serde_json::from_str(&json).with_context(|| format!("Malformed JSON in '{}'", path.display()))
    }
}
