// ============================================================
// Layer 2 — ReportUseCase
// ============================================================
// Reloads a finished sweep from the history store and builds
// the comparison table: training time against final loss for
// every mini-batch size.

use anyhow::Result;

use crate::domain::{sweep::BatchSweepResult, traits::SweepStore};
use crate::error::WorkflowError;
use crate::infra::history_store::CsvSweepStore;

/// One line of the comparison table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportRow {
    pub batch_size: usize,
    pub minutes:    f64,
    pub final_loss: Option<f64>,
    pub epochs:     usize,
}

impl From<&BatchSweepResult> for ReportRow {
    fn from(r: &BatchSweepResult) -> Self {
        Self {
            batch_size: r.batch_size,
            minutes:    r.elapsed_minutes(),
            final_loss: r.losses.final_loss(),
            epochs:     r.losses.len(),
        }
    }
}

pub struct ReportUseCase<S: SweepStore = CsvSweepStore> {
    store: S,
    /// Row order; None lists every stored size, largest first
    order: Option<Vec<usize>>,
}

impl<S: SweepStore> ReportUseCase<S> {
    pub fn new(store: S, order: Option<Vec<usize>>) -> Self {
        Self { store, order }
    }

    pub fn execute(&self) -> Result<Vec<ReportRow>> {
        let mut results = self.store.load_all()?;

        let rows = match &self.order {
            Some(order) => order
                .iter()
                .map(|size| {
                    results
                        .remove(size)
                        .map(|r| ReportRow::from(&r))
                        .ok_or(WorkflowError::MissingResult(*size))
                })
                .collect::<std::result::Result<Vec<_>, _>>()?,
            None => results.values().rev().map(ReportRow::from).collect(),
        };

        tracing::info!("Report covers {} mini-batch sizes", rows.len());
        Ok(rows)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use std::{cell::RefCell, collections::BTreeMap, time::Duration};

    use super::*;
    use crate::domain::sweep::LossTrajectory;

    struct FixedStore(RefCell<BTreeMap<usize, BatchSweepResult>>);

    impl SweepStore for FixedStore {
        fn save(&self, result: &BatchSweepResult) -> crate::error::Result<()> {
            self.0.borrow_mut().insert(result.batch_size, result.clone());
            Ok(())
        }

        fn load(&self, batch_size: usize) -> crate::error::Result<BatchSweepResult> {
            self.0.borrow().get(&batch_size).cloned().ok_or(WorkflowError::MissingResult(batch_size))
        }

        fn load_all(&self) -> crate::error::Result<BTreeMap<usize, BatchSweepResult>> {
            Ok(self.0.borrow().clone())
        }
    }

    fn store() -> FixedStore {
        let s = FixedStore(RefCell::new(BTreeMap::new()));
        for (size, secs) in [(5, 600.0), (50, 120.0), (200, 30.0)] {
            let losses = LossTrajectory::from_losses([1.0, 0.1 * size as f64]);
            s.save(&BatchSweepResult::new(size, Duration::from_secs_f64(secs), losses)).unwrap();
        }
        s
    }

    #[test]
    fn test_default_order_is_largest_first() {
        let rows = ReportUseCase::new(store(), None).execute().unwrap();
        let sizes: Vec<usize> = rows.iter().map(|r| r.batch_size).collect();
        assert_eq!(sizes, vec![200, 50, 5]);
        assert!((rows[2].minutes - 10.0).abs() < 1e-9);
        assert_eq!(rows[0].epochs, 2);
        assert_eq!(rows[1].final_loss, Some(5.0));
    }

    #[test]
    fn test_requested_order() {
        let rows = ReportUseCase::new(store(), Some(vec![5, 200])).execute().unwrap();
        let sizes: Vec<usize> = rows.iter().map(|r| r.batch_size).collect();
        assert_eq!(sizes, vec![5, 200]);
    }

    #[test]
    fn test_requested_size_missing() {
        let err = ReportUseCase::new(store(), Some(vec![10])).execute().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<WorkflowError>(),
            Some(WorkflowError::MissingResult(10))
        ));
    }
}
