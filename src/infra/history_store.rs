// ============================================================
// Layer 6 — Sweep History Store
// ============================================================
// CSV-backed SweepStore. One directory, two kinds of file:
//
//   <dir>/<prefix>-mb_size-<n>.csv
//       the learning history of the run with mini-batch size n
//       (epoch,loss,val_loss; written by MetricsLogger)
//
//   <dir>/<prefix>-mb_size-learning_time.csv
//       mini_batch_size,elapsed_training_time_secs
//       one row appended per run; a re-run of the same size
//       appends again and the last row wins on reload
//
// The history file is written before the timing row, so a
// timing row always points at a complete history.

use std::{
    collections::BTreeMap,
    fs::{self, OpenOptions},
    io,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::domain::{sweep::BatchSweepResult, traits::SweepStore};
use crate::error::{Result, WorkflowError};
use crate::infra::metrics::{read_history, MetricsLogger};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct TimingRow {
    mini_batch_size:            usize,
    elapsed_training_time_secs: f64,
}

pub struct CsvSweepStore {
    dir:    PathBuf,
    prefix: String,
}

impl CsvSweepStore {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self { dir: dir.into(), prefix: prefix.into() }
    }

    pub fn history_path(&self, batch_size: usize) -> PathBuf {
        self.dir.join(format!("{}-mb_size-{}.csv", self.prefix, batch_size))
    }

    pub fn timing_path(&self) -> PathBuf {
        self.dir.join(format!("{}-mb_size-learning_time.csv", self.prefix))
    }

    fn append_timing(&self, row: TimingRow) -> Result<()> {
        let path   = self.timing_path();
        let is_new = !path.exists();

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| WorkflowError::persistence(&path, e))?;

        let mut writer = csv::WriterBuilder::new().has_headers(is_new).from_writer(file);
        writer
            .serialize(row)
            .and_then(|_| writer.flush().map_err(csv::Error::from))
            .map_err(|e| WorkflowError::persistence(&path, e))
    }

    /// Elapsed time per batch size; later rows override earlier ones.
    fn read_timings(&self) -> Result<BTreeMap<usize, Duration>> {
        let path = self.timing_path();
        if !path.exists() {
            return Ok(BTreeMap::new());
        }

        let mut reader = csv::Reader::from_path(&path).map_err(|e| WorkflowError::persistence(&path, e))?;
        let mut timings = BTreeMap::new();
        for row in reader.deserialize::<TimingRow>() {
            let row     = row.map_err(|e| WorkflowError::persistence(&path, e))?;
            let elapsed = seconds_to_duration(row.elapsed_training_time_secs, &path)?;
            timings.insert(row.mini_batch_size, elapsed);
        }
        Ok(timings)
    }

    fn assemble(&self, batch_size: usize, elapsed: Duration) -> Result<BatchSweepResult> {
        let losses = read_history(&self.history_path(batch_size))?;
        Ok(BatchSweepResult::new(batch_size, elapsed, losses))
    }
}

fn seconds_to_duration(secs: f64, path: &Path) -> Result<Duration> {
    Duration::try_from_secs_f64(secs).map_err(|e| {
        let invalid = io::Error::new(io::ErrorKind::InvalidData, format!("elapsed time {secs}: {e}"));
        WorkflowError::persistence(path, invalid)
    })
}

impl SweepStore for CsvSweepStore {
    fn save(&self, result: &BatchSweepResult) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| WorkflowError::persistence(&self.dir, e))?;

        MetricsLogger::new(self.history_path(result.batch_size))?.log_all(&result.losses)?;
        self.append_timing(TimingRow {
            mini_batch_size:            result.batch_size,
            elapsed_training_time_secs: result.elapsed.as_secs_f64(),
        })?;

        tracing::debug!(
            "Persisted sweep result for mini-batch size {} in '{}'",
            result.batch_size,
            self.dir.display()
        );
        Ok(())
    }

    fn load(&self, batch_size: usize) -> Result<BatchSweepResult> {
        let elapsed = self
            .read_timings()?
            .remove(&batch_size)
            .ok_or(WorkflowError::MissingResult(batch_size))?;
        self.assemble(batch_size, elapsed)
    }

    fn load_all(&self) -> Result<BTreeMap<usize, BatchSweepResult>> {
        self.read_timings()?
            .into_iter()
            .map(|(batch_size, elapsed)| self.assemble(batch_size, elapsed).map(|r| (batch_size, r)))
            .collect()
    }
}
