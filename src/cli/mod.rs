// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`   — trains the steering model on a driving log
//   2. `predict` — loads a trained model and steers one frame
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, PredictArgs, TrainArgs};

/// The main CLI struct, parsed via clap's Parser derive macro.
#[derive(Parser, Debug)]
#[command(
    name = "steering-trainer",
    version = "0.1.0",
    about = "Train a CNN to predict steering angles from camera frames."
)]
pub struct Cli {
    /// The subcommand to run (train or predict)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => run_train(args),
            Commands::Predict(args) => run_predict(args),
        }
    }
}

/// Handles the `train` subcommand.
fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on driving log: {}", args.csv_path);

    let report = TrainUseCase::new(args.into()).execute()?;

    if report.stopped_early {
        println!("Stopped early after {} epochs.", report.history.epochs());
    }
    if let Some(best) = report.best_epoch {
        println!("Best validation loss at epoch {}.", best);
    }
    println!("Training complete. {} checkpoint(s) written.", report.checkpoints.len());
    println!("Model saved as '{}'.", report.model_path.display());
    Ok(())
}

/// Handles the `predict` subcommand.
fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    let use_case = PredictUseCase::new(&args.output_dir, args.model)?;
    let angle    = use_case.predict(&args.image, args.backend)?;

    println!("Steering angle: {:.4}", angle);
    Ok(())
}
