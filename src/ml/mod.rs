// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Burn framework code for the steering model.
//
//   model.rs      — Layer stacks (deep / LeNet), shape planning,
//                   forward pass and MSE loss
//
//   trainer.rs    — The fit loop: Adam updates, validation pass,
//                   history, checkpoint and early-stop callbacks
//
//   callbacks.rs  — Early stopping and checkpoint policy
//
//   inferencer.rs — Loads a saved model, predicts one frame
//
//   backend.rs    — Concrete Burn backends (wgpu / ndarray)
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

/// CNN architectures for steering regression
pub mod model;

/// Full training loop with validation and checkpointing
pub mod trainer;

/// Epoch-end decisions: early stopping, checkpoint selection
pub mod callbacks;

/// Inference engine: loads a checkpoint and predicts angles
pub mod inferencer;

/// Backend type aliases and selection
pub mod backend;
