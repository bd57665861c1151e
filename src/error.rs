// ============================================================
// Core Error Taxonomy
// ============================================================
// Errors raised by the splitter, normalizer, harness and the
// history store. The application and CLI layers wrap these in
// anyhow with extra context; nothing here is ever swallowed.

use std::path::PathBuf;

/// Result alias for the core (non-CLI) modules
pub type Result<T> = std::result::Result<T, WorkflowError>;

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// A feature has zero variance in the reference set, so
    /// standardisation would divide by zero.
    #[error("feature {feature} has zero variance (mean = {mean}) and cannot be standardised")]
    DegenerateFeature { feature: usize, mean: f64 },

    #[error("zero-variance epsilon must be finite and positive, got {0}")]
    InvalidEpsilon(f64),

    #[error("cannot fit normalization parameters on an empty reference set")]
    EmptyReference,

    #[error("record {record} has {got} features, expected {expected}")]
    SchemaMismatch { record: usize, got: usize, expected: usize },

    #[error("dataset shape error: {0}")]
    DatasetShape(String),

    #[error("retention fraction must lie in [0, 1], got {0}")]
    InvalidRetention(f64),

    #[error("invalid sweep configuration: {0}")]
    InvalidSweep(String),

    /// The external training collaborator failed for one batch size.
    /// Fatal to the sweep.
    #[error("training failed for mini-batch size {batch_size}")]
    TrainingFailure {
        batch_size: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("cannot persist sweep result at '{}'", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("no persisted result for mini-batch size {0}")]
    MissingResult(usize),
}

impl WorkflowError {
    pub(crate) fn persistence(path: impl Into<PathBuf>, source: impl Into<csv::Error>) -> Self {
        Self::Persistence { path: path.into(), source: source.into() }
    }
}
