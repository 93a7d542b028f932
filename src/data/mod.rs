// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from driving_log.csv to tensor batches.
//
//   driving_log.csv
//       │
//       ▼
//   DrivingLogLoader  → reads rows into DrivingRecords
//       │
//       ▼
//   split_train_val   → shuffles and splits records 80/20
//       │
//       ▼
//   BatchGenerator    → endless stream of augmented batches
//       │                (DiskFrameSource + augment rule)
//       ▼
//   SteeringBatcher   → stacks a batch into [N, 3, H, W] tensors
//
// Reference: Burn Book §4 (Datasets and Dataloaders)
//            Rust Book §13 (Iterators and Closures)

/// Reads the simulator driving log (CSV)
pub mod loader;

/// Resolves recorded image paths and decodes frames
pub mod frames;

/// Camera correction and mirror augmentation
pub mod augment;

/// Restartable batch stream
pub mod generator;

/// Batch → tensor conversion
pub mod batcher;

/// Shuffles and splits records into train/validation sets
pub mod splitter;
