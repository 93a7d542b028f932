// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer programs against these traits, not
// against the CSV loader or the image directory directly:
//   - DrivingLogLoader implements RecordSource
//   - DiskFrameSource  implements FrameSource
//
// Tests swap in in-memory implementations without touching
// the generator or the use cases.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use image::RgbImage;

use crate::domain::record::DrivingRecord;

// ─── RecordSource ─────────────────────────────────────────────────────────────
/// Any component that can produce the full set of driving-log records.
pub trait RecordSource {
    /// Load every record. Fails if the source is missing or malformed.
    fn load_all(&self) -> Result<Vec<DrivingRecord>>;
}

// ─── FrameSource ──────────────────────────────────────────────────────────────
/// Any component that can turn a recorded image path into pixels.
pub trait FrameSource {
    /// Load the frame referenced by `recorded_path` as 8-bit RGB.
    fn load(&self, recorded_path: &str) -> Result<RgbImage>;
}

impl<T: FrameSource + ?Sized> FrameSource for &T {
    fn load(&self, recorded_path: &str) -> Result<RgbImage> {
        (**self).load(recorded_path)
    }
}
