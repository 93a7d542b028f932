// ============================================================
// Layer 4 — Augmentation
// ============================================================
// Turns one DrivingRecord into six training samples.
//
// Side cameras:
//   The left camera sees the road as if the car had drifted
//   left, so the "correct" steering for that frame is a little
//   more to the right: center + correction. The right camera is
//   the mirror case: center − correction.
//
// Mirroring:
//   Flipping a frame left-to-right turns a left curve into a
//   right curve, so the angle is negated.
//
// Output order for one record:
//   center, center(flipped), left, left(flipped), right, right(flipped)

use anyhow::Result;
use image::imageops;

use crate::domain::record::{Camera, DrivingRecord};
use crate::domain::sample::Sample;
use crate::domain::traits::FrameSource;

/// Number of samples produced per record (3 cameras × 2 flip states)
pub const SAMPLES_PER_RECORD: usize = 6;

/// Steering targets for [center, left, right]
pub fn steering_targets(center: f32, correction: f32) -> [f32; 3] {
    [center, center + correction, center - correction]
}

/// Target for one camera
pub fn target_for(camera: Camera, center: f32, correction: f32) -> f32 {
    steering_targets(center, correction)[camera.column()]
}

/// Load all three frames of `record` and produce the six samples.
pub fn expand_record<F: FrameSource + ?Sized>(
    record:     &DrivingRecord,
    frames:     &F,
    correction: f32,
) -> Result<Vec<Sample>> {
    let mut samples = Vec::with_capacity(SAMPLES_PER_RECORD);

    for camera in Camera::ALL {
        let image  = frames.load(record.path(camera))?;
        let angle  = target_for(camera, record.steering, correction);
        let mirror = imageops::flip_horizontal(&image);

        samples.push(Sample::new(image,  angle,        camera, false));
        samples.push(Sample::new(mirror, -1.0 * angle, camera, true));
    }

    Ok(samples)
}
