// ============================================================
// Layer 5 — Inferencer
// ============================================================
use anyhow::{ensure, Result};
use burn::prelude::*;

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::SteeringBatcher, generator::Batch};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::SteeringModel;

pub struct Inferencer<B: Backend> {
    model:  SteeringModel<B>,
    config: TrainConfig,
    device: B::Device,
}

impl<B: Backend> Inferencer<B> {
    /// Rebuild the trained layer stack and load `stem` (or the latest final model).
    pub fn from_checkpoint(
        ckpt_manager: &CheckpointManager,
        stem:         Option<&str>,
        device:       B::Device,
    ) -> Result<Self> {
        let config = ckpt_manager.load_config()?;
        let stem   = match stem {
            Some(s) => s.to_string(),
            None    => ckpt_manager.latest_model()?,
        };

        let model = config.model_config().init::<B>(&device)?;
        let model = ckpt_manager.load_model(model, &stem, &device)?;
        tracing::info!("Model '{}' loaded ({})", stem, config.architecture);

        Ok(Self { model, config, device })
    }

    /// Predicted steering angle for one RGB frame.
    pub fn predict(&self, image: image::RgbImage) -> Result<f32> {
        let expected = (self.config.image_height as u32, self.config.image_width as u32);
        ensure!(
            (image.height(), image.width()) == expected,
            "image is {}x{} but the model was trained on {}x{} (height x width)",
            image.height(), image.width(), expected.0, expected.1
        );

        let batch  = Batch { images: vec![image], angles: vec![0.0] };
        let input  = SteeringBatcher::<B>::new(self.device.clone()).batch(&batch)?;
        let output = self.model.forward(input.images);

        let angle: f32 = output.into_scalar().elem::<f32>();
        tracing::debug!("Predicted steering angle {:.4}", angle);
        Ok(angle)
    }
}
