// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records a run's learning history to a CSV file, one row per
// epoch, and reads it back for reports.
//
// Example CSV output:
//   epoch,loss,val_loss
//   0,0.912345,0.953210
//   1,0.655102,0.701993
//   ...
//
// val_loss is left empty when the run had no held-out split.
//
// How to read the history:
//   - loss should decrease each epoch
//   - val_loss rising while loss keeps falling → overfitting
//
// Reference: Rust Book §9 (Error Handling)
//            csv crate (Serde support)

use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
};

use crate::domain::sweep::{EpochLoss, LossTrajectory};
use crate::error::{Result, WorkflowError};

const HEADER: [&str; 3] = ["epoch", "loss", "val_loss"];

/// Writes epoch rows to a history CSV.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Start a fresh history file at `csv_path`, replacing any previous
    /// one, and write the header row.
    pub fn new(csv_path: impl Into<PathBuf>) -> Result<Self> {
        let csv_path = csv_path.into();

        if let Some(dir) = csv_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| WorkflowError::persistence(dir, e))?;
        }

        let mut writer =
            csv::Writer::from_path(&csv_path).map_err(|e| WorkflowError::persistence(&csv_path, e))?;
        writer
            .write_record(HEADER)
            .and_then(|_| writer.flush().map_err(csv::Error::from))
            .map_err(|e| WorkflowError::persistence(&csv_path, e))?;

        tracing::debug!("Created history CSV: '{}'", csv_path.display());
        Ok(Self { csv_path })
    }

    /// Append one epoch as a new row.
    pub fn log(&self, entry: &EpochLoss) -> Result<()> {
        let file = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .map_err(|e| WorkflowError::persistence(&self.csv_path, e))?;

        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        writer
            .serialize(entry)
            .and_then(|_| writer.flush().map_err(csv::Error::from))
            .map_err(|e| WorkflowError::persistence(&self.csv_path, e))
    }

    /// Append every epoch of a trajectory.
    pub fn log_all(&self, losses: &LossTrajectory) -> Result<()> {
        for entry in losses {
            self.log(entry)?;
        }
        tracing::debug!("Logged {} epochs to '{}'", losses.len(), self.csv_path.display());
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

/// Read a history CSV written by [`MetricsLogger`].
pub fn read_history(csv_path: &Path) -> Result<LossTrajectory> {
    let mut reader =
        csv::Reader::from_path(csv_path).map_err(|e| WorkflowError::persistence(csv_path, e))?;
    reader
        .deserialize::<EpochLoss>()
        .collect::<std::result::Result<LossTrajectory, _>>()
        .map_err(|e| WorkflowError::persistence(csv_path, e))
}
