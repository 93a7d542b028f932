// ============================================================
// Layer 3 — Sample Domain Type
// ============================================================
// An (image, steering angle) pair derived from a DrivingRecord.
//
// Each record produces six samples:
//   {center, left, right} × {original, mirrored}
//
// The `camera` and `flipped` fields are bookkeeping only —
// the model never sees them, but tests and logs do.

use image::RgbImage;

use crate::domain::record::Camera;

#[derive(Debug, Clone)]
pub struct Sample {
    /// Decoded RGB frame (height × width × 3, u8)
    pub image: RgbImage,

    /// Target steering angle after camera correction and flipping
    pub angle: f32,

    /// Camera the frame came from
    pub camera: Camera,

    /// True when the frame was mirrored left-to-right
    pub flipped: bool,
}

impl Sample {
    pub fn new(image: RgbImage, angle: f32, camera: Camera, flipped: bool) -> Self {
        Self { image, angle, camera, flipped }
    }
}
