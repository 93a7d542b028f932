// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting file outputs of a training run:
//
//   checkpoint.rs — Saving and loading model weights with
//                   Burn's CompactRecorder, plus the run's
//                   TrainConfig as JSON so inference can
//                   rebuild the same layer stack.
//
//   metrics.rs    — Per-epoch loss rows in metrics.csv.
//
//   loss_plot.rs  — Training/validation loss curves as a PNG.
//
// Reference: Rust Book §7 (Modules)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;

/// Loss curve rendering
pub mod loss_plot;
