// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs and traits describing what the system
// works with: datasets, loss histories, sweep results, and the
// collaborator traits other layers implement.
//
// Rules for this layer:
//   - NO burn framework types
//   - NO file I/O
//   - Only plain data, enums and traits

/// Tabular dataset with a fixed feature width
pub mod dataset;

/// Per-epoch losses and mini-batch sweep results
pub mod sweep;

/// Training collaborator and result store abstractions
pub mod traits;
