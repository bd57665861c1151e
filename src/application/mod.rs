// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// a specific goal (fitting a regressor, evaluating it, sweeping
// mini-batch sizes, reporting on a sweep).
//
// Rules for this layer:
//   - No ML math or model code here
//   - No printing here (that's Layer 1)
//   - No direct file formats (that's Layer 4 and 6)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

/// Train one model per mini-batch size, timed and persisted
pub mod sweep_harness;

/// Fit a feed-forward regressor (`regress`)
pub mod regression_use_case;

/// Reload a regression run and measure it (`evaluate`)
pub mod evaluate_use_case;

/// Fashion-MNIST mini-batch sweep (`sweep`)
pub mod sweep_use_case;

/// Comparison table of a finished sweep (`report`)
pub mod report_use_case;
