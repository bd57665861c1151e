// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application);
// this layer only routes and prints.
//
// Four commands are supported:
//   1. `regress`  - fits a regressor and saves the run
//   2. `evaluate` - reloads a run and prints train/dev MSE
//   3. `sweep`    - times training across mini-batch sizes
//   4. `report`   - prints the sweep comparison table
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, RegressArgs, ReportArgs, SweepArgs};

#[derive(Parser, Debug)]
#[command(
    name = "nn-workflows",
    version,
    about = "Train small feed-forward networks, compare mini-batch sizes, and inspect the results."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Regress(args)  => run_regress(args),
            Commands::Evaluate(args) => run_evaluate(args),
            Commands::Sweep(args)    => run_sweep(args),
            Commands::Report(args)   => run_report(args),
        }
    }
}

fn run_regress(args: RegressArgs) -> Result<()> {
    use crate::application::regression_use_case::RegressionUseCase;

    tracing::info!("Starting regression on '{}'", args.data);
    let use_case = RegressionUseCase::new(args.into());
    let losses   = use_case.execute()?;

    println!("Training complete after {} epochs.", losses.len());
    if let Some(last) = losses.last() {
        match last.val_loss {
            Some(val) => println!("Final loss: {:.6} (dev: {:.6})", last.loss, val),
            None      => println!("Final loss: {:.6}", last.loss),
        }
    }
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let report = EvaluateUseCase::new(&args.checkpoint_dir, &args.run_name).execute()?;
    println!("Run '{}'", args.run_name);
    println!("  train MSE: {:.6} ({} records)", report.train_mse, report.train_records);
    println!("  dev MSE:   {:.6} ({} records)", report.dev_mse, report.dev_records);
    Ok(())
}

fn run_sweep(args: SweepArgs) -> Result<()> {
    use crate::application::sweep_use_case::SweepUseCase;

    let out_dir  = args.out_dir.clone();
    let use_case = SweepUseCase::new(args.into());
    let results  = use_case.execute()?;

    println!("Sweep complete: {} mini-batch sizes, results in '{}'.", results.len(), out_dir);
    Ok(())
}

fn run_report(args: ReportArgs) -> Result<()> {
    use crate::application::report_use_case::ReportUseCase;
    use crate::infra::history_store::CsvSweepStore;

    let store = CsvSweepStore::new(&args.out_dir, &args.prefix);
    let rows  = ReportUseCase::new(store, args.order).execute()?;

    println!("{:>15} {:>12} {:>12} {:>8}", "mini_batch_size", "minutes", "final_loss", "epochs");
    for row in rows {
        let loss = row.final_loss.map_or_else(|| "-".to_string(), |l| format!("{l:.6}"));
        println!("{:>15} {:>12.2} {:>12} {:>8}", row.batch_size, row.minutes, loss, row.epochs);
    }
    Ok(())
}
