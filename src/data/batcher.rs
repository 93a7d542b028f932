// ============================================================
// Layer 4 — Steering Batcher
// ============================================================
// Converts a generator Batch (Vec of RGB frames + Vec of
// angles) into Burn tensors.
//
// Layout:
//   RgbImage stores pixels row-major as [H, W, C] (interleaved).
//   Burn's Conv2d expects channel-first [N, C, H, W].
//
//   We copy every frame into one flat Vec<f32> in NCHW order
//   and build the tensor in a single from_data call. Values stay
//   in 0..=255; scaling happens inside the model.
//
// Reference: Burn Book §4 (Batcher)

use anyhow::{ensure, Result};
use burn::{prelude::*, tensor::TensorData};

use crate::data::generator::Batch;

/// Colour channels per frame
pub const CHANNELS: usize = 3;

/// A batch ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct SteeringBatch<B: Backend> {
    /// Frames — shape: [batch_size, 3, height, width], values 0..=255
    pub images: Tensor<B, 4>,

    /// Steering targets — shape: [batch_size, 1]
    pub targets: Tensor<B, 2>,
}

/// Holds the target device so tensors land on the right GPU/CPU.
#[derive(Clone, Debug)]
pub struct SteeringBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> SteeringBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    /// Build tensors for `batch`.
    pub fn batch(&self, batch: &Batch) -> Result<SteeringBatch<B>> {
        ensure!(!batch.is_empty(), "Cannot build tensors from an empty batch");
        ensure!(
            batch.images.len() == batch.angles.len(),
            "Length of images ({}) not equal to angles ({})",
            batch.images.len(),
            batch.angles.len()
        );

        let n = batch.len();
        let (height, width) = batch
            .frame_dims()
            .map(|(h, w)| (h as usize, w as usize))
            .unwrap_or((0, 0));
        let plane = height * width;

        let mut pixels = vec![0.0f32; n * CHANNELS * plane];
        for (i, img) in batch.images.iter().enumerate() {
            ensure!(
                img.height() as usize == height && img.width() as usize == width,
                "Frame {} is {}x{}, expected {}x{}",
                i, img.height(), img.width(), height, width
            );
            let base = i * CHANNELS * plane;
            for (x, y, px) in img.enumerate_pixels() {
                let offset = y as usize * width + x as usize;
                for c in 0..CHANNELS {
                    pixels[base + c * plane + offset] = px[c] as f32;
                }
            }
        }

        let images = Tensor::<B, 4>::from_data(
            TensorData::new(pixels, [n, CHANNELS, height, width]),
            &self.device,
        );
        let targets = Tensor::<B, 2>::from_data(
            TensorData::new(batch.angles.clone(), [n, 1]),
            &self.device,
        );

        Ok(SteeringBatch { images, targets })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use image::{Rgb, RgbImage};

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_shapes_are_channel_first() {
        let batch = Batch {
            images: vec![RgbImage::new(4, 2), RgbImage::new(4, 2), RgbImage::new(4, 2)],
            angles: vec![0.1, -0.1, 0.0],
        };
        let out = SteeringBatcher::<TestBackend>::new(Default::default())
            .batch(&batch)
            .unwrap();

        assert_eq!(out.images.dims(),  [3, 3, 2, 4]);
        assert_eq!(out.targets.dims(), [3, 1]);
    }

    #[test]
    fn test_pixels_land_in_their_channel_plane() {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(1, 0, Rgb([10, 20, 30]));
        let batch = Batch { images: vec![img], angles: vec![0.5] };

        let out = SteeringBatcher::<TestBackend>::new(Default::default())
            .batch(&batch)
            .unwrap();
        let values: Vec<f32> = out.images.into_data().to_vec().unwrap();

        // [c0: (0,0) (1,0)] [c1: ...] [c2: ...]
        assert_eq!(values, vec![0.0, 10.0, 0.0, 20.0, 0.0, 30.0]);

        let targets: Vec<f32> = out.targets.into_data().to_vec().unwrap();
        assert_eq!(targets, vec![0.5]);
    }

    #[test]
    fn test_empty_batch_is_rejected() {
        let batch = Batch { images: vec![], angles: vec![] };
        assert!(SteeringBatcher::<TestBackend>::new(Default::default()).batch(&batch).is_err());
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let batch = Batch { images: vec![RgbImage::new(1, 1)], angles: vec![0.0, 0.1] };
        assert!(SteeringBatcher::<TestBackend>::new(Default::default()).batch(&batch).is_err());
    }
}
