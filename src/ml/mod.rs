// ============================================================
// Layer 5 — ML / Model Layer (burn)
// ============================================================
// All burn model and optimiser code lives here. The sweep
// harness and the use cases reach it only through the
// ModelFactory / Trainer traits from Layer 3, so gradient
// computation and weight updates stay inside the framework.
//
//   model.rs   - feed-forward network: Linear layers, ReLU
//                hidden activations, linear output
//
//   trainer.rs - fixed-epoch training loop with a mini-batch
//                DataLoader, optional per-epoch validation,
//                and prediction helpers
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)

/// Feed-forward network architecture
pub mod model;

/// Training loop implementing the Trainer trait
pub mod trainer;
