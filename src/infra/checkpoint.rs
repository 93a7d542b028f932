// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights using Burn's CompactRecorder.
//
// What lives in the output directory:
//   1. cp-epoch-NN-vloss-X_XXXX.mpk.gz  — per-epoch checkpoints
//   2. model-YYYYmmdd-HHMMSS-E-B.mpk.gz — the final trained model
//   3. latest_model.json                — stem of the final model
//   4. train_config.json                — the run's TrainConfig
//
// The config is needed to rebuild the exact layer stack before
// loading weights into it; CompactRecorder refuses records whose
// structure does not match the model.
//
// Reference: Burn Book §5 (Records and Checkpointing)
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::SteeringModel;

const CONFIG_FILE: &str = "train_config.json";
const LATEST_FILE: &str = "latest_model.json";

/// Manages saving and loading of model files in one directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create output directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Name of the final model file, e.g. `model-20240301-154210-100-150`
    pub fn final_model_stem(epochs: usize, batch_size: usize) -> String {
        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        format!("model-{stamp}-{epochs}-{batch_size}")
    }

    /// Write model weights to `{dir}/{stem}.mpk.gz`.
    pub fn save_model<B: Backend>(&self, model: &SteeringModel<B>, stem: &str) -> Result<PathBuf> {
        // Recorder adds the extension itself
        let path = self.dir.join(stem);

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save model to '{}'", path.display()))?;

        tracing::debug!("Saved model weights: {}", path.display());
        Ok(path)
    }

    /// Save the final model and point latest_model.json at it.
    pub fn save_final<B: Backend>(&self, model: &SteeringModel<B>, stem: &str) -> Result<PathBuf> {
        let path = self.save_model(model, stem)?;
        let latest = self.dir.join(LATEST_FILE);
        fs::write(&latest, serde_json::to_string(stem)?)
            .with_context(|| format!("Failed to write '{}'", latest.display()))?;
        Ok(path)
    }

    /// Load weights from `{dir}/{stem}.mpk.gz` into `model`.
    ///
    /// `model` must have the architecture the record was saved with.
    pub fn load_model<B: Backend>(
        &self,
        model:  SteeringModel<B>,
        stem:   &str,
        device: &B::Device,
    ) -> Result<SteeringModel<B>> {
        let path = self.dir.join(stem);
        tracing::info!("Loading model weights from '{}'", path.display());

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load model '{}'. Have you trained the model first?", path.display())
            })?;

        Ok(model.load_record(record))
    }

    /// Stem of the model written by the most recent finished run.
    pub fn latest_model(&self) -> Result<String> {
        let path = self.dir.join(LATEST_FILE);
        let s = fs::read_to_string(&path).with_context(|| {
            format!("Cannot find '{}'. Have you run 'train' first?", path.display())
        })?;
        Ok(serde_json::from_str(&s)?)
    }

    /// Save the training configuration as pretty JSON.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    /// Load the configuration a model was trained with.
    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join(CONFIG_FILE);

        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read config from '{}'. \
                 Make sure you have run 'train' before 'predict'.",
                path.display()
            )
        })?;

        serde_json::from_str(&json)
            .with_context(|| format!("Invalid config in '{}'", path.display()))
    }
}
