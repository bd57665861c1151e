// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between a file on disk and a tensor batch:
//
//   data file
//       │
//       ▼
//   loader          → reads CSV / StatLib text / IDX into a Dataset
//       │
//       ▼
//   preprocessor    → fixed-range rescaling (pixels / 255)
//   normalizer      → per-feature standardisation from a reference set
//       │
//       ▼
//   splitter        → seeded train/test mask
//       │
//       ▼
//   dataset         → burn Dataset adapter
//       │
//       ▼
//   batcher         → stacks records into tensor batches
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads datasets from local files
pub mod loader;

/// Fixed-range feature rescaling
pub mod preprocessor;

/// Per-feature standardisation
pub mod normalizer;

/// Seeded train/test partitioning
pub mod splitter;

/// burn Dataset adapter over tabular records
pub mod dataset;

/// burn Batcher producing tensor batches
pub mod batcher;
