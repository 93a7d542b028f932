// ============================================================
// Layer 2 — PredictUseCase
// ============================================================
// Loads a trained steering model and predicts the angle for
// one camera frame:
//
//   Step 1: Read train_config.json       (Layer 6 - infra)
//   Step 2: Rebuild and load the model   (Layer 5 - ml)
//   Step 3: Read the frame from disk     (Layer 4 - data)
//   Step 4: Forward pass                 (Layer 5 - ml)

use anyhow::{Context, Result};
use burn::prelude::Backend;
use std::path::Path;

use crate::infra::checkpoint::CheckpointManager;
use crate::ml::backend::{ComputeBackend, CpuBackend, WgpuBackend};
use crate::ml::inferencer::Inferencer;

pub struct PredictUseCase {
    ckpt_manager: CheckpointManager,
    model:        Option<String>,
}

impl PredictUseCase {
    /// `model` is a stem inside `output_dir`; `None` picks the latest final model.
    pub fn new(output_dir: impl AsRef<Path>, model: Option<String>) -> Result<Self> {
        let output_dir = output_dir.as_ref();
        anyhow::ensure!(
            output_dir.is_dir(),
            "Output directory '{}' not found. Have you run 'train' first?",
            output_dir.display()
        );
        Ok(Self { ckpt_manager: CheckpointManager::new(output_dir)?, model })
    }

    /// Predict the steering angle for the frame at `image_path`.
    pub fn predict(&self, image_path: impl AsRef<Path>, backend: ComputeBackend) -> Result<f32> {
        match backend {
            ComputeBackend::Wgpu    => self.predict_on::<WgpuBackend>(Default::default(), image_path),
            ComputeBackend::NdArray => self.predict_on::<CpuBackend>(Default::default(), image_path),
        }
    }

    pub fn predict_on<B: Backend>(&self, device: B::Device, image_path: impl AsRef<Path>) -> Result<f32> {
        let image_path = image_path.as_ref();
        let inferencer =
            Inferencer::<B>::from_checkpoint(&self.ckpt_manager, self.model.as_deref(), device)?;

        let frame = image::open(image_path)
            .with_context(|| format!("Cannot read image '{}'", image_path.display()))?
            .to_rgb8();

        inferencer.predict(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::fixtures::{tiny_config, write_driving_log};
    use crate::application::train_use_case::TrainUseCase;
    use crate::ml::backend::CpuTrainBackend;

    #[test]
    fn test_predicts_with_latest_trained_model() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = tiny_config(dir.path());
        write_driving_log(dir.path(), &cfg, 5, false);
        TrainUseCase::new(cfg.clone())
            .execute_on::<CpuTrainBackend>(Default::default())
            .unwrap();

        let use_case = PredictUseCase::new(&cfg.output_dir, None).unwrap();
        let frame    = dir.path().join("IMG").join("center_0.png");
        let angle    = use_case.predict_on::<CpuBackend>(Default::default(), &frame).unwrap();
        assert!(angle.is_finite());

        // Same weights, same frame, same answer
        let again = use_case.predict(&frame, ComputeBackend::NdArray).unwrap();
        assert_eq!(angle, again);
    }

    #[test]
    fn test_wrong_frame_size_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = tiny_config(dir.path());
        write_driving_log(dir.path(), &cfg, 5, false);
        TrainUseCase::new(cfg.clone())
            .execute_on::<CpuTrainBackend>(Default::default())
            .unwrap();

        let odd = dir.path().join("odd.png");
        image::RgbImage::new(10, 10).save(&odd).unwrap();

        let use_case = PredictUseCase::new(&cfg.output_dir, None).unwrap();
        assert!(use_case.predict_on::<CpuBackend>(Default::default(), &odd).is_err());
    }

    #[test]
    fn test_untrained_output_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(PredictUseCase::new(dir.path().join("missing"), None).is_err());

        let use_case = PredictUseCase::new(dir.path(), Some("model-x".into())).unwrap();
        assert!(use_case.predict_on::<CpuBackend>(Default::default(), dir.path().join("f.png")).is_err());
    }
}
