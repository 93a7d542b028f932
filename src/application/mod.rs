// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// a specific goal (training a model or predicting an angle).
//
// Rules for this layer:
//   - No ML math or model code here
//   - No argument parsing here (that's Layer 1)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The training workflow
pub mod train_use_case;

// Single-frame inference
pub mod predict_use_case;

/// On-disk driving logs shared by the use-case tests
#[cfg(test)]
pub(crate) mod fixtures {
    use super::train_use_case::TrainConfig;
    use crate::ml::backend::ComputeBackend;
    use crate::ml::model::Architecture;
    use image::{Rgb, RgbImage};
    use std::{fmt::Write as _, fs, path::Path};

    /// Small LeNet run writing everything under `dir`
    pub fn tiny_config(dir: &Path) -> TrainConfig {
        TrainConfig {
            csv_path:     dir.join("driving_log.csv").to_string_lossy().into_owned(),
            image_dir:    dir.join("IMG").to_string_lossy().into_owned(),
            output_dir:   dir.join("out").to_string_lossy().into_owned(),
            batch_size:   4,
            epochs:       2,
            patience:     2,
            image_height: 48,
            image_width:  64,
            crop_top:     8,
            crop_bottom:  4,
            architecture: Architecture::LeNet,
            backend:      ComputeBackend::NdArray,
            seed:         Some(7),
            ..TrainConfig::default()
        }
    }

    /// Write `n` records plus their three frames each.
    /// Paths in the CSV carry a simulator-style Windows prefix.
    pub fn write_driving_log(dir: &Path, cfg: &TrainConfig, n: usize, header: bool) {
        let img_dir = dir.join("IMG");
        fs::create_dir_all(&img_dir).unwrap();

        let mut csv = String::new();
        if header {
            csv.push_str("center,left,right,steering,throttle,brake,speed\n");
        }

        for i in 0..n {
            for camera in ["center", "left", "right"] {
                let shade = (i * 40 % 255) as u8;
                RgbImage::from_fn(cfg.image_width as u32, cfg.image_height as u32, |x, y| {
                    Rgb([shade, (x * 3 % 255) as u8, (y * 5 % 255) as u8])
                })
                .save(img_dir.join(format!("{camera}_{i}.png")))
                .unwrap();
            }
            let angle = -0.3 + 0.15 * i as f32;
            writeln!(
                csv,
                "C:\\sim\\IMG\\center_{i}.png, C:\\sim\\IMG\\left_{i}.png, C:\\sim\\IMG\\right_{i}.png,{angle},0.5,0,30.1"
            )
            .unwrap();
        }

        fs::write(&cfg.csv_path, csv).unwrap();
    }
}
