// ============================================================
// Layer 4 — Frame Source
// ============================================================
// Resolves the image paths stored in the driving log against a
// local image directory and decodes them with the image crate.
//
// The simulator stores absolute paths from the machine that
// recorded the data, e.g.
//   /home/me/sim/IMG/center_2016_12_01_13_30_48_287.jpg
//   C:\Users\me\sim\IMG\center_2016_12_01_13_30_48_287.jpg
//
// Only the file name is meaningful here; it is joined onto the
// configured image directory.

use anyhow::{Context, Result};
use image::RgbImage;
use std::path::PathBuf;

use crate::domain::traits::FrameSource;

/// Loads frames from a directory on disk.
pub struct DiskFrameSource {
    image_dir: PathBuf,
}

impl DiskFrameSource {
    pub fn new(image_dir: impl Into<PathBuf>) -> Self {
        Self { image_dir: image_dir.into() }
    }

    /// Where a recorded path lives on this machine
    pub fn resolve(&self, recorded_path: &str) -> PathBuf {
        self.image_dir.join(file_name(recorded_path))
    }
}

impl FrameSource for DiskFrameSource {
    fn load(&self, recorded_path: &str) -> Result<RgbImage> {
        let path = self.resolve(recorded_path);
        let img  = image::open(&path)
            .with_context(|| format!("Cannot read image '{}'", path.display()))?;
        Ok(img.to_rgb8())
    }
}

/// Last path segment, accepting both `/` and `\` separators
pub fn file_name(recorded_path: &str) -> &str {
    recorded_path
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(recorded_path)
        .trim()
}
