// ============================================================
// Layer 3 — Loss Trajectories and Sweep Results
// ============================================================
// Plain data produced by one training run:
//   EpochLoss        - one row of the learning history
//   LossTrajectory   - the ordered history of a run
//   BatchSweepResult - a history plus wall-clock training time,
//                      keyed by the mini-batch size that produced it

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Loss values recorded at the end of one epoch.
/// Epochs are numbered from 0, like the framework histories they mirror.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochLoss {
    pub epoch:    usize,
    pub loss:     f64,
    /// Loss on the held-out split, when one was supplied
    pub val_loss: Option<f64>,
}

impl EpochLoss {
    pub fn new(epoch: usize, loss: f64, val_loss: Option<f64>) -> Self {
        Self { epoch, loss, val_loss }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LossTrajectory {
    epochs: Vec<EpochLoss>,
}

impl LossTrajectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a trajectory from bare training losses, numbering epochs 0..n
    pub fn from_losses(losses: impl IntoIterator<Item = f64>) -> Self {
        losses
            .into_iter()
            .enumerate()
            .map(|(epoch, loss)| EpochLoss::new(epoch, loss, None))
            .collect()
    }

    pub fn push(&mut self, entry: EpochLoss) {
        self.epochs.push(entry);
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EpochLoss> {
        self.epochs.iter()
    }

    pub fn last(&self) -> Option<&EpochLoss> {
        self.epochs.last()
    }

    pub fn final_loss(&self) -> Option<f64> {
        self.last().map(|e| e.loss)
    }

    pub fn final_val_loss(&self) -> Option<f64> {
        self.last().and_then(|e| e.val_loss)
    }
}

impl FromIterator<EpochLoss> for LossTrajectory {
    fn from_iter<I: IntoIterator<Item = EpochLoss>>(iter: I) -> Self {
        Self { epochs: iter.into_iter().collect() }
    }
}

impl<'a> IntoIterator for &'a LossTrajectory {
    type Item = &'a EpochLoss;
    type IntoIter = std::slice::Iter<'a, EpochLoss>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Outcome of one harness run for a single mini-batch size.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSweepResult {
    pub batch_size: usize,
    pub elapsed:    Duration,
    pub losses:     LossTrajectory,
}

impl BatchSweepResult {
    pub fn new(batch_size: usize, elapsed: Duration, losses: LossTrajectory) -> Self {
        Self { batch_size, elapsed, losses }
    }

    pub fn elapsed_minutes(&self) -> f64 {
        self.elapsed.as_secs_f64() / 60.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_losses_numbers_epochs_from_zero() {
        let t = LossTrajectory::from_losses([2.2, 1.1, 0.4]);
        let epochs: Vec<usize> = t.iter().map(|e| e.epoch).collect();
        assert_eq!(epochs, vec![0, 1, 2]);
        assert_eq!(t.final_loss(), Some(0.4));
        assert_eq!(t.final_val_loss(), None);
    }

    #[test]
    fn test_elapsed_minutes() {
        let r = BatchSweepResult::new(50, Duration::from_secs(90), LossTrajectory::new());
        assert!((r.elapsed_minutes() - 1.5).abs() < 1e-12);
    }
}
