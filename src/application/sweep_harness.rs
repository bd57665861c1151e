// ============================================================
// Layer 2 — Batch-Timing Harness
// ============================================================
// Trains a fresh model once per candidate mini-batch size and
// records how long each run took and how the loss evolved:
//
//   for each batch size (in the given order):
//       Step 1: build a fresh model          (ModelFactory)
//       Step 2: train it for E epochs, timed (Trainer)
//       Step 3: persist the result           (SweepStore)
//
// A failing run stops the sweep. Results of the sizes that
// already finished are on disk by then; nothing is retried.

use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

use crate::domain::{
    sweep::BatchSweepResult,
    traits::{ModelFactory, SweepStore, Trainer},
};
use crate::error::{Result, WorkflowError};

pub struct SweepHarness<S: SweepStore> {
    batch_sizes: Vec<usize>,
    epochs:      usize,
    store:       S,
}

impl<S: SweepStore> SweepHarness<S> {
    pub fn new(batch_sizes: Vec<usize>, epochs: usize, store: S) -> Result<Self> {
        if batch_sizes.is_empty() {
            return Err(WorkflowError::InvalidSweep("no mini-batch sizes given".into()));
        }
        if batch_sizes.contains(&0) {
            return Err(WorkflowError::InvalidSweep("mini-batch sizes must be positive".into()));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = batch_sizes.iter().find(|&&b| !seen.insert(b)) {
            return Err(WorkflowError::InvalidSweep(format!(
                "mini-batch size {dup} appears more than once"
            )));
        }
        if epochs == 0 {
            return Err(WorkflowError::InvalidSweep("epoch budget must be positive".into()));
        }
        Ok(Self { batch_sizes, epochs, store })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run the sweep. Returns the results in sweep order.
    pub fn run<F, T>(&self, factory: &F, trainer: &T, data: &T::Data) -> Result<Vec<BatchSweepResult>>
    where
        F: ModelFactory,
        T: Trainer<Model = F::Model>,
    {
        let total   = self.batch_sizes.len();
        let mut out = Vec::with_capacity(total);

        for (i, &batch_size) in self.batch_sizes.iter().enumerate() {
            tracing::info!(
                "[{}/{}] Training with mini-batch size {} for {} epochs",
                i + 1,
                total,
                batch_size,
                self.epochs
            );

            // ── Step 1: Fresh model ──────────────────────────────────────────
            let model = factory.build_model();

            // ── Step 2: Timed training run ───────────────────────────────────
            let start   = Instant::now();
            let outcome = trainer
                .train(model, data, batch_size, self.epochs)
                .map_err(|source| WorkflowError::TrainingFailure { batch_size, source })?;
            let elapsed = start.elapsed();

            if outcome.losses.len() != self.epochs {
                tracing::warn!(
                    "Trainer returned {} epochs of history for mini-batch size {}, expected {}",
                    outcome.losses.len(),
                    batch_size,
                    self.epochs
                );
            }

            let result = BatchSweepResult::new(batch_size, elapsed, outcome.losses);
            tracing::info!(
                "Mini-batch size {} done in {:.2} min | final loss={}",
                batch_size,
                result.elapsed_minutes(),
                result
                    .losses
                    .final_loss()
                    .map_or_else(|| "-".to_string(), |l| format!("{l:.6}")),
            );

            // ── Step 3: Persist before the next size starts ──────────────────
            self.store.save(&result)?;
            out.push(result);
        }

        Ok(out)
    }

    /// Every persisted result, keyed by mini-batch size
    pub fn load_results(&self) -> Result<BTreeMap<usize, BatchSweepResult>> {
        self.store.load_all()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::io;

    use anyhow::bail;

    use super::*;
    use crate::domain::{
        sweep::LossTrajectory,
        traits::TrainingOutcome,
    };
    use crate::infra::history_store::CsvSweepStore;

    /// In-memory store
    #[derive(Default)]
    struct MemoryStore {
        saved: RefCell<BTreeMap<usize, BatchSweepResult>>,
    }

    impl SweepStore for MemoryStore {
        fn save(&self, result: &BatchSweepResult) -> Result<()> {
            self.saved.borrow_mut().insert(result.batch_size, result.clone());
            Ok(())
        }

        fn load(&self, batch_size: usize) -> Result<BatchSweepResult> {
            self.saved
                .borrow()
                .get(&batch_size)
                .cloned()
                .ok_or(WorkflowError::MissingResult(batch_size))
        }

        fn load_all(&self) -> Result<BTreeMap<usize, BatchSweepResult>> {
            Ok(self.saved.borrow().clone())
        }
    }

    /// Memory store whose `save` fails for one batch size
    struct FailingStore {
        inner:   MemoryStore,
        fail_on: usize,
    }

    impl SweepStore for FailingStore {
        fn save(&self, result: &BatchSweepResult) -> Result<()> {
            if result.batch_size == self.fail_on {
                let disk_full = io::Error::new(io::ErrorKind::Other, "disk full");
                return Err(WorkflowError::persistence("unwritable.csv", disk_full));
            }
            self.inner.save(result)
        }

        fn load(&self, batch_size: usize) -> Result<BatchSweepResult> {
            self.inner.load(batch_size)
        }

        fn load_all(&self) -> Result<BTreeMap<usize, BatchSweepResult>> {
            self.inner.load_all()
        }
    }

    struct CountingFactory {
        built: Cell<usize>,
    }

    impl ModelFactory for CountingFactory {
        type Model = usize;

        fn build_model(&self) -> usize {
            let id = self.built.get();
            self.built.set(id + 1);
            id
        }
    }

    /// Returns a decreasing loss curve; fails for `fail_on` if set
    struct StubTrainer {
        fail_on: Option<usize>,
        calls:   RefCell<Vec<usize>>,
        models:  RefCell<Vec<usize>>,
    }

    impl StubTrainer {
        fn new(fail_on: Option<usize>) -> Self {
            Self { fail_on, calls: RefCell::new(Vec::new()), models: RefCell::new(Vec::new()) }
        }
    }

    impl Trainer for StubTrainer {
        type Model = usize;
        type Data  = ();

        fn train(
            &self,
            model:      usize,
            _data:      &(),
            batch_size: usize,
            epochs:     usize,
        ) -> anyhow::Result<TrainingOutcome<usize>> {
            self.calls.borrow_mut().push(batch_size);
            self.models.borrow_mut().push(model);
            if self.fail_on == Some(batch_size) {
                bail!("diverged");
            }
            let losses = LossTrajectory::from_losses((0..epochs).map(|e| 1.0 / (e + 1) as f64));
            Ok(TrainingOutcome { losses, model })
        }
    }

    fn factory() -> CountingFactory {
        CountingFactory { built: Cell::new(0) }
    }

    #[test]
    fn test_sweep_persists_one_result_per_size() {
        let harness = SweepHarness::new(vec![200, 100, 50], 7, MemoryStore::default()).unwrap();
        let trainer = StubTrainer::new(None);

        let results = harness.run(&factory(), &trainer, &()).unwrap();
        let order: Vec<usize> = results.iter().map(|r| r.batch_size).collect();
        assert_eq!(order, vec![200, 100, 50]);

        let stored = harness.load_results().unwrap();
        assert_eq!(stored.len(), 3);
        for result in stored.values() {
            assert_eq!(result.losses.len(), 7);
            assert!(result.elapsed.as_secs_f64() >= 0.0);
        }
    }

    #[test]
    fn test_every_run_gets_a_fresh_model() {
        let harness = SweepHarness::new(vec![10, 5], 2, MemoryStore::default()).unwrap();
        let trainer = StubTrainer::new(None);
        let factory = factory();

        harness.run(&factory, &trainer, &()).unwrap();
        assert_eq!(factory.built.get(), 2);
        assert_eq!(*trainer.models.borrow(), vec![0, 1]);
    }

    #[test]
    fn test_failure_stops_sweep_and_keeps_earlier_results() {
        let harness = SweepHarness::new(vec![200, 100, 50], 3, MemoryStore::default()).unwrap();
        let trainer = StubTrainer::new(Some(100));

        let err = harness.run(&factory(), &trainer, &()).unwrap_err();
        assert!(matches!(err, WorkflowError::TrainingFailure { batch_size: 100, .. }));

        // third size never attempted
        assert_eq!(*trainer.calls.borrow(), vec![200, 100]);

        let first = harness.store().load(200).unwrap();
        assert_eq!(first.losses.len(), 3);
        assert!(matches!(harness.store().load(100), Err(WorkflowError::MissingResult(100))));
    }

    #[test]
    fn test_invalid_sweep_configuration() {
        let bad = [
            (vec![], 10),
            (vec![10, 0], 10),
            (vec![10, 20, 10], 10),
            (vec![10], 0),
        ];
        for (sizes, epochs) in bad {
            let res = SweepHarness::new(sizes.clone(), epochs, MemoryStore::default());
            assert!(
                matches!(res, Err(WorkflowError::InvalidSweep(_))),
                "accepted {sizes:?} with {epochs} epochs"
            );
        }
    }

    #[test]
    fn test_persistence_failure_stops_sweep() {
        let store   = FailingStore { inner: MemoryStore::default(), fail_on: 100 };
        let harness = SweepHarness::new(vec![200, 100, 50], 4, store).unwrap();
        let trainer = StubTrainer::new(None);

        let err = harness.run(&factory(), &trainer, &()).unwrap_err();
        assert!(matches!(err, WorkflowError::Persistence { .. }));
        assert_eq!(*trainer.calls.borrow(), vec![200, 100]);
        assert_eq!(harness.store().load(200).unwrap().losses.len(), 4);
    }

    #[test]
    fn test_failure_keeps_earlier_results_on_disk() {
        let dir = std::env::temp_dir().join(format!("nn-workflows-harness-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);

        let harness = SweepHarness::new(vec![200, 100, 50], 3, CsvSweepStore::new(&dir, "crash")).unwrap();
        let trainer = StubTrainer::new(Some(100));
        let err     = harness.run(&factory(), &trainer, &()).unwrap_err();
        assert!(matches!(err, WorkflowError::TrainingFailure { batch_size: 100, .. }));
        assert_eq!(*trainer.calls.borrow(), vec![200, 100]);

        // a new store over the same directory sees only the finished size
        let reopened = CsvSweepStore::new(&dir, "crash");
        let all      = reopened.load_all().unwrap();
        assert_eq!(all.keys().copied().collect::<Vec<_>>(), vec![200]);
        assert_eq!(all[&200].losses.len(), 3);
        assert!(matches!(reopened.load(100), Err(WorkflowError::MissingResult(100))));
    }
}
