// ============================================================
// Layer 4 — Batch Generator
// ============================================================
// An endless, restartable stream of augmented batches.
//
// One call to next() is one suspension point and yields one
// Batch. Internally the generator walks the record set in
// slices of `batch_size` records:
//
//   pass 1: shuffle records → [0..B] [B..2B] ... [kB..n]
//   pass 2: shuffle records → [0..B] [B..2B] ... [kB..n]
//   ...
//
// Each slice becomes 6 × slice_len samples (see augment.rs),
// shuffled together before being returned as parallel arrays.
// Frames are read from disk lazily, one slice at a time, so
// memory stays bounded by a single batch.
//
// Reference: Rust Book §13 (Iterators)

use anyhow::{ensure, Result};
use image::RgbImage;
use rand::{rngs::StdRng, seq::SliceRandom};

use crate::data::augment::{expand_record, SAMPLES_PER_RECORD};
use crate::domain::record::DrivingRecord;
use crate::domain::sample::Sample;
use crate::domain::traits::FrameSource;

// ─── Batch ────────────────────────────────────────────────────────────────────
/// One batch of shuffled samples as parallel arrays.
/// `images[i]` is labelled by `angles[i]`.
#[derive(Debug, Clone)]
pub struct Batch {
    pub images: Vec<RgbImage>,
    pub angles: Vec<f32>,
}

impl Batch {
    /// Split samples into parallel image/label arrays.
    ///
    /// Fails if the two arrays end up with different lengths or
    /// the frames do not share one size.
    pub fn from_samples(samples: Vec<Sample>) -> Result<Self> {
        let (images, angles): (Vec<RgbImage>, Vec<f32>) = samples
            .into_iter()
            .map(|s| (s.image, s.angle))
            .unzip();

        ensure!(
            images.len() == angles.len(),
            "Length of images ({}) not equal to angles ({})",
            images.len(),
            angles.len()
        );

        if let Some(first) = images.first() {
            let dims = first.dimensions();
            ensure!(
                images.iter().all(|img| img.dimensions() == dims),
                "Frames in one batch must share dimensions (expected {}x{})",
                dims.0,
                dims.1
            );
        }

        Ok(Self { images, angles })
    }

    pub fn len(&self) -> usize {
        self.angles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.angles.is_empty()
    }

    /// (height, width) shared by every frame, if any
    pub fn frame_dims(&self) -> Option<(u32, u32)> {
        self.images.first().map(|img| (img.height(), img.width()))
    }
}

// ─── BatchGenerator ───────────────────────────────────────────────────────────
pub struct BatchGenerator<F: FrameSource> {
    records:    Vec<DrivingRecord>,
    frames:     F,
    batch_size: usize,
    correction: f32,
    rng:        StdRng,
    /// Index of the first record of the next slice; 0 means a new pass starts
    cursor:     usize,
    /// Number of passes started so far
    passes:     usize,
}

impl<F: FrameSource> BatchGenerator<F> {
    /// Build a generator with an explicit RNG (reproducible shuffles).
    pub fn with_rng(
        records:    Vec<DrivingRecord>,
        frames:     F,
        batch_size: usize,
        correction: f32,
        rng:        StdRng,
    ) -> Result<Self> {
        ensure!(batch_size > 0, "batch_size must be at least 1");
        tracing::debug!(
            "Generator over {} records ({} samples per pass)",
            records.len(),
            records.len() * SAMPLES_PER_RECORD
        );
        Ok(Self { records, frames, batch_size, correction, rng, cursor: 0, passes: 0 })
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Samples produced over one full pass
    pub fn samples_per_pass(&self) -> usize {
        self.records.len() * SAMPLES_PER_RECORD
    }

    /// Batches needed to see every record once
    pub fn steps_per_pass(&self) -> usize {
        (self.records.len() + self.batch_size - 1) / self.batch_size
    }

    /// Passes started so far
    pub fn passes(&self) -> usize {
        self.passes
    }

    /// Make the next batch start a fresh, reshuffled pass
    pub fn restart(&mut self) {
        self.cursor = 0;
    }

    /// Record order of the current pass
    pub fn records(&self) -> &[DrivingRecord] {
        &self.records
    }

    fn next_batch(&mut self) -> Result<Batch> {
        if self.cursor == 0 {
            self.records.shuffle(&mut self.rng);
            self.passes += 1;
            tracing::debug!("Shuffling records for pass {}", self.passes);
        }

        let end   = (self.cursor + self.batch_size).min(self.records.len());
        let slice = &self.records[self.cursor..end];

        let mut samples = Vec::with_capacity(slice.len() * SAMPLES_PER_RECORD);
        for record in slice {
            samples.extend(expand_record(record, &self.frames, self.correction)?);
        }
        samples.shuffle(&mut self.rng);

        self.cursor = if end >= self.records.len() { 0 } else { end };

        Batch::from_samples(samples)
    }
}

impl<F: FrameSource> Iterator for BatchGenerator<F> {
    type Item = Result<Batch>;

    /// Never returns None unless there are no records at all.
    fn next(&mut self) -> Option<Self::Item> {
        if self.records.is_empty() {
            return None;
        }
        Some(self.next_batch())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use rand::SeedableRng;

    /// Frames are 1×1 images whose red channel is the record number
    struct IndexFrames;

    impl FrameSource for IndexFrames {
        fn load(&self, recorded_path: &str) -> Result<RgbImage> {
            let idx: u8 = recorded_path
                .trim_start_matches(|c: char| !c.is_ascii_digit())
                .trim_end_matches(".jpg")
                .parse()?;
            Ok(RgbImage::from_pixel(1, 1, Rgb([idx, 0, 0])))
        }
    }

    fn records(n: usize) -> Vec<DrivingRecord> {
        (0..n)
            .map(|i| {
                DrivingRecord::new(
                    format!("c{i}.jpg"),
                    format!("l{i}.jpg"),
                    format!("r{i}.jpg"),
                    i as f32 / 100.0,
                )
            })
            .collect()
    }

    fn generator(n: usize, batch_size: usize) -> BatchGenerator<IndexFrames> {
        BatchGenerator::with_rng(records(n), IndexFrames, batch_size, 0.2, StdRng::seed_from_u64(7)).unwrap()
    }

    #[test]
    fn test_batch_holds_six_samples_per_record() {
        let mut g = generator(10, 4);
        let b = g.next().unwrap().unwrap();
        assert_eq!(b.len(), 4 * SAMPLES_PER_RECORD);
        assert_eq!(b.images.len(), b.angles.len());
    }

    #[test]
    fn test_last_batch_of_pass_is_short() {
        let mut g = generator(10, 4);
        let sizes: Vec<usize> = (0..3).map(|_| g.next().unwrap().unwrap().len()).collect();
        assert_eq!(sizes, vec![24, 24, 12]);
        assert_eq!(g.steps_per_pass(), 3);
    }

    #[test]
    fn test_pass_covers_every_record_once() {
        let mut g = generator(9, 4);
        let mut seen = Vec::new();
        for _ in 0..g.steps_per_pass() {
            let b = g.next().unwrap().unwrap();
            seen.extend(b.images.iter().map(|img| img.get_pixel(0, 0)[0]));
        }
        assert_eq!(seen.len(), 9 * SAMPLES_PER_RECORD);
        for i in 0..9u8 {
            assert_eq!(seen.iter().filter(|&&x| x == i).count(), SAMPLES_PER_RECORD);
        }
    }

    #[test]
    fn test_generator_loops_forever_and_reshuffles() {
        let mut g = generator(20, 20);

        g.next().unwrap().unwrap();
        let first: Vec<DrivingRecord> = g.records().to_vec();
        g.next().unwrap().unwrap();
        let second: Vec<DrivingRecord> = g.records().to_vec();

        assert_eq!(g.passes(), 2);
        // 20! possible orderings
        assert_ne!(first, second);

        for _ in 0..5 {
            assert!(g.next().unwrap().is_ok());
        }
        assert_eq!(g.passes(), 7);
    }

    #[test]
    fn test_restart_begins_new_pass() {
        let mut g = generator(10, 4);
        g.next().unwrap().unwrap();
        assert_eq!(g.passes(), 1);
        g.restart();
        let b = g.next().unwrap().unwrap();
        assert_eq!(g.passes(), 2);
        assert_eq!(b.len(), 24);
    }

    #[test]
    fn test_angle_sum_matches_flip_symmetry() {
        // Every original has a negated twin, so a full batch sums to 0
        let mut g = generator(5, 5);
        let b = g.next().unwrap().unwrap();
        let sum: f32 = b.angles.iter().sum();
        assert!(sum.abs() < 1e-4);
    }

    #[test]
    fn test_empty_records_yield_nothing() {
        let mut g = generator(0, 4);
        assert!(g.next().is_none());
        assert_eq!(g.steps_per_pass(), 0);
    }

    #[test]
    fn test_zero_batch_size_is_an_error() {
        let result = BatchGenerator::with_rng(records(3), IndexFrames, 0, 0.2, StdRng::seed_from_u64(1));
        assert!(result.is_err());
    }

    #[test]
    fn test_frame_errors_surface_per_batch() {
        let bad = vec![DrivingRecord::new("c.jpg", "l.jpg", "r.jpg", 0.0)];
        let mut g = BatchGenerator::with_rng(bad, IndexFrames, 1, 0.2, StdRng::seed_from_u64(1)).unwrap();
        assert!(g.next().unwrap().is_err());
    }

    #[test]
    fn test_mismatched_frame_sizes_rejected() {
        let samples = vec![
            Sample::new(RgbImage::new(2, 2), 0.0, crate::domain::record::Camera::Center, false),
            Sample::new(RgbImage::new(3, 2), 0.0, crate::domain::record::Camera::Left, false),
        ];
        assert!(Batch::from_samples(samples).is_err());
    }
}
