// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands: `train` and `predict`
// and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, Architecture, ...)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{ArgAction, Args, Subcommand};

use crate::application::train_use_case::TrainConfig;
use crate::ml::backend::ComputeBackend;
use crate::ml::model::Architecture;

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the steering model on a recorded driving log
    Train(TrainArgs),

    /// Predict the steering angle for one camera frame
    Predict(PredictArgs),
}

/// All arguments for the `train` command.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Driving log CSV: center, left, right, steering[, ...]
    #[arg(long, default_value = "my_data/driving_log.csv")]
    pub csv_path: String,

    /// Directory holding the camera frames named in the log
    #[arg(long, default_value = "my_data/IMG/")]
    pub image_dir: String,

    /// Directory for checkpoints, the final model, metrics and plot
    #[arg(long, default_value = "checkpoints")]
    pub output_dir: String,

    /// Driving-log records per batch (each record yields 6 samples)
    #[arg(long, default_value_t = 150)]
    pub batch_size: usize,

    /// Maximum number of epochs
    #[arg(long, default_value_t = 100)]
    pub epochs: usize,

    /// Steering offset added for the left camera and subtracted for the right
    #[arg(long, default_value_t = 0.2)]
    pub correction: f32,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Share of records held out for validation
    #[arg(long, default_value_t = 0.2)]
    pub validation_fraction: f64,

    /// Epochs without val_loss improvement before stopping
    #[arg(long, default_value_t = 7)]
    pub patience: usize,

    /// Minimum val_loss decrease that counts as an improvement
    #[arg(long, default_value_t = 0.0)]
    pub min_delta: f64,

    /// Only checkpoint epochs that improve the best val_loss
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    pub save_best_only: bool,

    /// Layer stack: deep or lenet
    #[arg(long, default_value = "deep")]
    pub architecture: Architecture,

    /// Compute backend: wgpu or ndarray
    #[arg(long, default_value = "wgpu")]
    pub backend: ComputeBackend,

    /// Frame height in pixels
    #[arg(long, default_value_t = 160)]
    pub image_height: usize,

    /// Frame width in pixels
    #[arg(long, default_value_t = 320)]
    pub image_width: usize,

    /// Rows removed from the top of every frame (sky)
    #[arg(long, default_value_t = 70)]
    pub crop_top: usize,

    /// Rows removed from the bottom of every frame (hood)
    #[arg(long, default_value_t = 25)]
    pub crop_bottom: usize,

    /// Seed for the split and the shuffles
    #[arg(long)]
    pub seed: Option<u64>,

    /// Skip writing loss.png
    #[arg(long)]
    pub no_plot: bool,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            csv_path:            a.csv_path,
            image_dir:           a.image_dir,
            output_dir:          a.output_dir,
            batch_size:          a.batch_size,
            epochs:              a.epochs,
            correction:          a.correction,
            lr:                  a.lr,
            validation_fraction: a.validation_fraction,
            patience:            a.patience,
            min_delta:           a.min_delta,
            save_best_only:      a.save_best_only,
            architecture:        a.architecture,
            backend:             a.backend,
            image_height:        a.image_height,
            image_width:         a.image_width,
            crop_top:            a.crop_top,
            crop_bottom:         a.crop_bottom,
            seed:                a.seed,
            plot:                !a.no_plot,
        }
    }
}

/// All arguments for the `predict` command
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Camera frame to steer for
    #[arg(long)]
    pub image: String,

    /// Directory the model was trained into
    #[arg(long, default_value = "checkpoints")]
    pub output_dir: String,

    /// Model stem inside output_dir (defaults to the latest final model)
    #[arg(long)]
    pub model: Option<String>,

    /// Compute backend: wgpu or ndarray
    #[arg(long, default_value = "wgpu")]
    pub backend: ComputeBackend,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("steering-trainer").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_train_defaults_match_config_defaults() {
        let Commands::Train(args) = parse(&["train"]).command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        let def = TrainConfig::default();

        assert_eq!(cfg.csv_path,       def.csv_path);
        assert_eq!(cfg.batch_size,     def.batch_size);
        assert_eq!(cfg.epochs,         def.epochs);
        assert_eq!(cfg.patience,       def.patience);
        assert_eq!(cfg.architecture,   def.architecture);
        assert_eq!(cfg.backend,        def.backend);
        assert!(cfg.save_best_only);
        assert!(cfg.plot);
        assert!(cfg.seed.is_none());
    }

    #[test]
    fn test_train_flags_override_defaults() {
        let Commands::Train(args) = parse(&[
            "train",
            "--architecture", "lenet",
            "--backend", "ndarray",
            "--save-best-only", "false",
            "--seed", "3",
            "--no-plot",
        ])
        .command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();

        assert_eq!(cfg.architecture, Architecture::LeNet);
        assert_eq!(cfg.backend,      ComputeBackend::NdArray);
        assert!(!cfg.save_best_only);
        assert_eq!(cfg.seed, Some(3));
        assert!(!cfg.plot);
    }

    #[test]
    fn test_unknown_architecture_is_rejected() {
        let argv = ["steering-trainer", "train", "--architecture", "resnet"];
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_predict_requires_image() {
        assert!(Cli::try_parse_from(["steering-trainer", "predict"]).is_err());
        let Commands::Predict(args) = parse(&["predict", "--image", "f.png"]).command else {
            panic!("expected predict")
        };
        assert_eq!(args.output_dir, "checkpoints");
        assert!(args.model.is_none());
    }
}
