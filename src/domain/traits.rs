// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The seams between this crate and its collaborators.
//
//   ModelFactory / Trainer - the external training framework.
//     The sweep harness only ever sees these two traits, so the
//     burn implementation in Layer 5 can be replaced by a stub
//     in tests (or by another framework binding).
//
//   SweepStore - durable storage for sweep results.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use std::collections::BTreeMap;

use crate::domain::sweep::{BatchSweepResult, LossTrajectory};
use crate::error::Result;

// ─── ModelFactory ─────────────────────────────────────────────────────────────
/// Builds a freshly initialised model. Every call must return an
/// independent instance; no parameters are shared between calls.
pub trait ModelFactory {
    type Model;

    fn build_model(&self) -> Self::Model;
}

// ─── Trainer ──────────────────────────────────────────────────────────────────
/// What a training run hands back: the per-epoch losses and the
/// trained model.
pub struct TrainingOutcome<M> {
    pub losses: LossTrajectory,
    pub model:  M,
}

/// Fits a model for a fixed number of epochs at a given mini-batch size.
/// Any failure is opaque to the caller.
pub trait Trainer {
    type Model;
    type Data: ?Sized;

    fn train(
        &self,
        model:      Self::Model,
        data:       &Self::Data,
        batch_size: usize,
        epochs:     usize,
    ) -> anyhow::Result<TrainingOutcome<Self::Model>>;
}

// ─── SweepStore ───────────────────────────────────────────────────────────────
/// Durable, append-only storage of sweep results keyed by batch size.
pub trait SweepStore {
    /// Persist one result. Called once per batch size, right after
    /// its training run completes.
    fn save(&self, result: &BatchSweepResult) -> Result<()>;

    /// Reload a single result.
    fn load(&self, batch_size: usize) -> Result<BatchSweepResult>;

    /// Reload every persisted result, keyed by batch size.
    fn load_all(&self) -> Result<BTreeMap<usize, BatchSweepResult>>;
}
