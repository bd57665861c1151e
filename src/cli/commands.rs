// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the four subcommands: `regress`, `evaluate`, `sweep`
// and `report`, and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, enums, lists)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};

use crate::application::{
    regression_use_case::{RegressionConfig, RegressionFormat},
    sweep_use_case::{ImageSource, SweepConfig},
};
use crate::data::normalizer::{NormalizationScope, ZeroVariancePolicy};
use crate::ml::trainer::OptimizerKind;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fit a feed-forward regressor on a tabular dataset
    Regress(RegressArgs),

    /// Reload a regression run and print its train/dev error
    Evaluate(EvaluateArgs),

    /// Train one classifier per mini-batch size and time each run
    Sweep(SweepArgs),

    /// Print the comparison table of a finished sweep
    Report(ReportArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum FormatArg {
    /// Headered CSV with a named target column
    Csv,
    /// StatLib Boston housing text file
    Boston,
}

impl From<FormatArg> for RegressionFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Csv    => RegressionFormat::Csv,
            FormatArg::Boston => RegressionFormat::Boston,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ScopeArg {
    /// Fit the statistics on the training split only
    TrainingSplit,
    /// Fit the statistics on every record before splitting
    FullDataset,
}

impl From<ScopeArg> for NormalizationScope {
    fn from(s: ScopeArg) -> Self {
        match s {
            ScopeArg::TrainingSplit => NormalizationScope::TrainingSplit,
            ScopeArg::FullDataset   => NormalizationScope::FullDataset,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum OptimizerArg {
    Sgd,
    Adam,
    Rmsprop,
}

// ─── regress ──────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct RegressArgs {
    /// Dataset file
    #[arg(long, default_value = "data/radon.csv")]
    pub data: String,

    #[arg(long, value_enum, default_value_t = FormatArg::Csv)]
    pub format: FormatArg,

    /// Target column (CSV only)
    #[arg(long, default_value = "radon")]
    pub target: String,

    /// Directory for weights, config, normalization and history
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Prefix of every file this run writes
    #[arg(long, default_value = "radon")]
    pub run_name: String,

    /// Probability that a record lands in the training split
    #[arg(long, default_value_t = 0.8)]
    pub retention: f64,

    /// Seed of the split and of the mini-batch shuffle
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[arg(long, value_enum, default_value_t = ScopeArg::TrainingSplit)]
    pub scope: ScopeArg,

    /// Replace a zero standard deviation by this value instead of failing
    #[arg(long)]
    pub zero_variance_epsilon: Option<f64>,

    /// Number of ReLU hidden layers; 0 gives a single linear neuron
    #[arg(long, default_value_t = 0)]
    pub hidden_layers: usize,

    /// Neurons per hidden layer
    #[arg(long, default_value_t = 20)]
    pub hidden_width: usize,

    /// He-normal initialisation of the hidden layers
    #[arg(long)]
    pub he_init: bool,

    #[arg(long, value_enum, default_value_t = OptimizerArg::Rmsprop)]
    pub optimizer: OptimizerArg,

    /// Momentum of the SGD optimizer
    #[arg(long, default_value_t = 0.0)]
    pub momentum: f64,

    #[arg(long, default_value_t = 0.001)]
    pub lr: f64,

    #[arg(long, default_value_t = 1000)]
    pub epochs: usize,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    /// Train on the whole training split in one batch (ignores --batch-size)
    #[arg(long)]
    pub full_batch: bool,
}

/// Boundary between Layer 1 and Layer 2: the application layer
/// never sees clap types.
impl From<RegressArgs> for RegressionConfig {
    fn from(a: RegressArgs) -> Self {
        let optimizer = match a.optimizer {
            OptimizerArg::Sgd     => OptimizerKind::Sgd { momentum: a.momentum },
            OptimizerArg::Adam    => OptimizerKind::Adam,
            OptimizerArg::Rmsprop => OptimizerKind::RmsProp,
        };
        RegressionConfig {
            data_path:      a.data,
            format:         a.format.into(),
            target:         a.target,
            checkpoint_dir: a.checkpoint_dir,
            run_name:       a.run_name,
            retention:      a.retention,
            seed:           a.seed,
            scope:          a.scope.into(),
            zero_variance:  a
                .zero_variance_epsilon
                .map_or(ZeroVariancePolicy::Reject, ZeroVariancePolicy::Epsilon),
            hidden_layers:  a.hidden_layers,
            hidden_width:   a.hidden_width,
            he_init:        a.he_init,
            optimizer,
            lr:             a.lr,
            epochs:         a.epochs,
            batch_size:     (!a.full_batch).then_some(a.batch_size),
        }
    }
}

// ─── evaluate ─────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    #[arg(long, default_value = "radon")]
    pub run_name: String,
}

// ─── sweep ────────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct SweepArgs {
    /// gzip'd IDX image file
    #[arg(long, default_value = "data/train-images-idx3-ubyte.gz")]
    pub images: String,

    /// gzip'd IDX label file
    #[arg(long, default_value = "data/train-labels-idx1-ubyte.gz")]
    pub labels: String,

    /// Read a label-first CSV instead of the IDX pair
    #[arg(long)]
    pub csv: Option<String>,

    /// Directory of the history store
    #[arg(long, default_value = "histories")]
    pub out_dir: String,

    /// File name prefix inside the history store
    #[arg(long, default_value = "history-03-3")]
    pub prefix: String,

    /// Mini-batch sizes, trained in the given order
    #[arg(long, value_delimiter = ',', default_value = "200,100,50,20,10,5")]
    pub batch_sizes: Vec<usize>,

    #[arg(long, default_value_t = 1000)]
    pub epochs: usize,

    /// Hidden widths then output width
    #[arg(long, default_value = "15-10")]
    pub structure: String,

    #[arg(long, default_value_t = 1e-4)]
    pub lr: f64,

    #[arg(long, default_value_t = 0.9)]
    pub momentum: f64,

    /// Pixels are divided by this value
    #[arg(long, default_value_t = 255.0)]
    pub pixel_range: f64,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

impl From<SweepArgs> for SweepConfig {
    fn from(a: SweepArgs) -> Self {
        let source = match a.csv {
            Some(path) => ImageSource::Csv { path },
            None       => ImageSource::Idx { images: a.images, labels: a.labels },
        };
        SweepConfig {
            source,
            out_dir:     a.out_dir,
            prefix:      a.prefix,
            batch_sizes: a.batch_sizes,
            epochs:      a.epochs,
            structure:   a.structure,
            lr:          a.lr,
            momentum:    a.momentum,
            pixel_range: a.pixel_range,
            seed:        a.seed,
        }
    }
}

// ─── report ───────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct ReportArgs {
    #[arg(long, default_value = "histories")]
    pub out_dir: String,

    #[arg(long, default_value = "history-03-3")]
    pub prefix: String,

    /// Row order; defaults to every stored size, largest first
    #[arg(long, value_delimiter = ',')]
    pub order: Option<Vec<usize>>,
}
