// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the disk on behalf of the workflows:
//
//   checkpoint.rs    - Saving and loading model weights
//                      Uses burn's CompactRecorder, plus the run
//                      config and normalization parameters as JSON
//                      so a later command can rebuild the model.
//
//   metrics.rs       - Learning history CSV
//                      One row per epoch: epoch, loss, val_loss.
//
//   history_store.rs - Sweep result store
//                      Per-batch-size histories plus an append-only
//                      timing table, behind the SweepStore trait.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Per-epoch learning history CSV
pub mod metrics;

/// CSV-backed SweepStore
pub mod history_store;
