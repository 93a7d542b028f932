// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load driving log           (Layer 4 - data)
//   Step 2: Split train/validation     (Layer 4 - data)
//   Step 3: Build the model            (Layer 5 - ml)
//   Step 4: Save config, open metrics  (Layer 6 - infra)
//   Step 5: Wrap splits in generators  (Layer 4 - data)
//   Step 6: Run training loop          (Layer 5 - ml)
//   Step 7: Save final model           (Layer 6 - infra)
//   Step 8: Plot loss curves           (Layer 6 - infra, best effort)
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::{ensure, Result};
use burn::tensor::backend::AutodiffBackend;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Instant};

use crate::data::{
    frames::DiskFrameSource,
    generator::BatchGenerator,
    loader::DrivingLogLoader,
    splitter::split_train_val,
};
use crate::domain::traits::RecordSource;
use crate::infra::{
    checkpoint::CheckpointManager,
    loss_plot::save_loss_plot,
    metrics::MetricsLogger,
};
use crate::ml::backend::{ComputeBackend, CpuTrainBackend, WgpuTrainBackend};
use crate::ml::model::{Architecture, SteeringModelConfig};
use crate::ml::trainer::{run_training, History};

// ─── Training Configuration ──────────────────────────────────────────────────
// All parameters of a training run. Saved next to the model so
// inference can rebuild the same layer stack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub csv_path:            String,
    pub image_dir:           String,
    pub output_dir:          String,
    pub batch_size:          usize,
    pub epochs:              usize,
    pub correction:          f32,
    pub lr:                  f64,
    pub validation_fraction: f64,
    pub patience:            usize,
    pub min_delta:           f64,
    pub save_best_only:      bool,
    pub architecture:        Architecture,
    pub backend:             ComputeBackend,
    pub image_height:        usize,
    pub image_width:         usize,
    pub crop_top:            usize,
    pub crop_bottom:         usize,
    pub seed:                Option<u64>,
    pub plot:                bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            csv_path:            "my_data/driving_log.csv".to_string(),
            image_dir:           "my_data/IMG/".to_string(),
            output_dir:          "checkpoints".to_string(),
            batch_size:          150,
            epochs:              100,
            correction:          0.2,
            lr:                  1e-3,
            validation_fraction: 0.2,
            patience:            7,
            min_delta:           0.0,
            save_best_only:      true,
            architecture:        Architecture::Deep,
            backend:             ComputeBackend::Wgpu,
            image_height:        160,
            image_width:         320,
            crop_top:            70,
            crop_bottom:         25,
            seed:                None,
            plot:                true,
        }
    }
}

impl TrainConfig {
    /// Layer-stack configuration derived from this run's settings
    pub fn model_config(&self) -> SteeringModelConfig {
        SteeringModelConfig::new()
            .with_architecture(self.architecture)
            .with_image_height(self.image_height)
            .with_image_width(self.image_width)
            .with_crop_top(self.crop_top)
            .with_crop_bottom(self.crop_bottom)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        ensure!(self.batch_size > 0, "batch size must be at least 1");
        ensure!(self.epochs > 0,     "epochs must be at least 1");
        ensure!(self.lr > 0.0,       "learning rate must be positive");
        ensure!(
            self.validation_fraction > 0.0 && self.validation_fraction < 1.0,
            "validation fraction must be in (0, 1), got {}",
            self.validation_fraction
        );
        self.model_config().plan()?;
        Ok(())
    }
}

/// What a finished run produced
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub model_path:    PathBuf,
    pub history:       History,
    pub stopped_early: bool,
    pub best_epoch:    Option<usize>,
    pub checkpoints:   Vec<String>,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline on the configured backend
    pub fn execute(&self) -> Result<TrainReport> {
        match self.config.backend {
            ComputeBackend::Wgpu => {
                let device = burn::backend::wgpu::WgpuDevice::default();
                tracing::info!("Using WGPU device: {:?}", device);
                self.execute_on::<WgpuTrainBackend>(device)
            }
            ComputeBackend::NdArray => {
                tracing::info!("Using ndarray CPU backend");
                self.execute_on::<CpuTrainBackend>(burn::backend::ndarray::NdArrayDevice::Cpu)
            }
        }
    }

    /// Run the pipeline end to end on backend `B`
    pub fn execute_on<B: AutodiffBackend>(&self, device: B::Device) -> Result<TrainReport> {
        let cfg   = &self.config;
        let start = Instant::now();
        cfg.validate()?;

        // ── Step 1: Load driving log ──────────────────────────────────────────
        let records = DrivingLogLoader::new(&cfg.csv_path).load_all()?;
        ensure!(!records.is_empty(), "driving log '{}' has no records", cfg.csv_path);

        // ── Step 2: Train / validation split ──────────────────────────────────
        let mut rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None       => StdRng::from_entropy(),
        };
        let (train_records, val_records) =
            split_train_val(records, cfg.validation_fraction, &mut rng);
        ensure!(
            !train_records.is_empty() && !val_records.is_empty(),
            "need at least one training and one validation record (got {} / {})",
            train_records.len(),
            val_records.len()
        );
        tracing::info!(
            "Split: {} train, {} validation records",
            train_records.len(),
            val_records.len()
        );

        // ── Step 3: Build model ───────────────────────────────────────────────
        let model = cfg.model_config().init::<B>(&device)?;

        // ── Step 4: Output directory, config and metrics ──────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.output_dir)?;
        ckpt_manager.save_config(cfg)?;
        let metrics = MetricsLogger::new(&cfg.output_dir)?;

        // ── Step 5: Generators ────────────────────────────────────────────────
        let frames = DiskFrameSource::new(&cfg.image_dir);
        let mut train_gen = BatchGenerator::with_rng(
            train_records,
            &frames,
            cfg.batch_size,
            cfg.correction,
            StdRng::seed_from_u64(rng.gen()),
        )?;
        let mut val_gen = BatchGenerator::with_rng(
            val_records,
            &frames,
            cfg.batch_size,
            cfg.correction,
            StdRng::seed_from_u64(rng.gen()),
        )?;

        // ── Step 6: Train ─────────────────────────────────────────────────────
        let outcome = run_training(
            cfg,
            model,
            &mut train_gen,
            &mut val_gen,
            &ckpt_manager,
            &metrics,
            &device,
        )?;

        // ── Step 7: Save final model ──────────────────────────────────────────
        let stem       = CheckpointManager::final_model_stem(cfg.epochs, cfg.batch_size);
        let model_path = ckpt_manager.save_final(&outcome.model, &stem)?;
        tracing::info!("Model saved as '{}'", model_path.display());

        // ── Step 8: Loss curves (best effort) ─────────────────────────────────
        if cfg.plot {
            let plot_path = ckpt_manager.dir().join("loss.png");
            if let Err(e) = save_loss_plot(&outcome.history.loss, &outcome.history.val_loss, &plot_path) {
                tracing::warn!("Error while visualising loss: {e:#}");
            }
        }

        tracing::info!("Elapsed time: {:.1}s", start.elapsed().as_secs_f64());

        Ok(TrainReport {
            model_path,
            history:       outcome.history,
            stopped_early: outcome.stopped_early,
            best_epoch:    outcome.best_epoch,
            checkpoints:   outcome.checkpoints,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::fixtures::{tiny_config, write_driving_log};
    use crate::ml::backend::CpuTrainBackend;

    #[test]
    fn test_default_config_is_valid() {
        assert!(TrainConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let zero_batch = TrainConfig { batch_size: 0, ..TrainConfig::default() };
        assert!(zero_batch.validate().is_err());

        let all_validation = TrainConfig { validation_fraction: 1.0, ..TrainConfig::default() };
        assert!(all_validation.validate().is_err());

        let over_cropped = TrainConfig { crop_top: 100, crop_bottom: 60, ..TrainConfig::default() };
        assert!(over_cropped.validate().is_err());
    }

    #[test]
    fn test_end_to_end_training_writes_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = tiny_config(dir.path());
        write_driving_log(dir.path(), &cfg, 6, true);

        let report = TrainUseCase::new(cfg.clone())
            .execute_on::<CpuTrainBackend>(Default::default())
            .unwrap();

        let out = dir.path().join("out");
        assert!(report.model_path.with_extension("mpk.gz").exists());
        assert!(out.join("train_config.json").exists());
        assert!(out.join("latest_model.json").exists());
        assert!(out.join("metrics.csv").exists());
        assert!(out.join("loss.png").exists());
        assert!(report.history.epochs() >= 1);
        assert_eq!(report.history.loss.len(), report.history.val_loss.len());
    }

    #[test]
    fn test_missing_image_aborts_training() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = tiny_config(dir.path());
        write_driving_log(dir.path(), &cfg, 4, false);
        // Remove one referenced frame
        std::fs::remove_file(dir.path().join("IMG").join("left_0.png")).unwrap();

        let result = TrainUseCase::new(cfg).execute_on::<CpuTrainBackend>(Default::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_driving_log_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = tiny_config(dir.path());
        let result = TrainUseCase::new(cfg).execute_on::<CpuTrainBackend>(Default::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_single_record_cannot_be_split() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = tiny_config(dir.path());
        write_driving_log(dir.path(), &cfg, 1, false);
        let result = TrainUseCase::new(cfg).execute_on::<CpuTrainBackend>(Default::default());
        assert!(result.is_err());
    }
}
