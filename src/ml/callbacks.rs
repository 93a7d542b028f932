// ============================================================
// Layer 5 — Training Callbacks
// ============================================================
// Epoch-end decisions made by the training loop:
//
//   EarlyStopping    — stop once validation loss has not
//                      improved for `patience` epochs
//   CheckpointPolicy — whether this epoch's weights are written,
//                      and under which name
//
// Both are plain state machines over f64 losses so they can be
// tested without a model.

/// Watches validation loss and signals when to stop.
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    patience:   usize,
    min_delta:  f64,
    best:       f64,
    wait:       usize,
    best_epoch: Option<usize>,
}

impl EarlyStopping {
    pub fn new(patience: usize, min_delta: f64) -> Self {
        Self {
            patience,
            min_delta: min_delta.abs(),
            best:      f64::INFINITY,
            wait:      0,
            best_epoch: None,
        }
    }

    /// Record the validation loss of `epoch`. Returns true when
    /// training should stop after this epoch.
    pub fn update(&mut self, epoch: usize, val_loss: f64) -> bool {
        if val_loss < self.best - self.min_delta {
            self.best       = val_loss;
            self.best_epoch = Some(epoch);
            self.wait       = 0;
            return false;
        }
        self.wait += 1;
        self.wait >= self.patience
    }

    pub fn best(&self) -> f64 {
        self.best
    }

    pub fn best_epoch(&self) -> Option<usize> {
        self.best_epoch
    }
}

/// Decides which epochs produce a checkpoint file.
#[derive(Debug, Clone)]
pub struct CheckpointPolicy {
    save_best_only: bool,
    best:           f64,
}

impl CheckpointPolicy {
    pub fn new(save_best_only: bool) -> Self {
        Self { save_best_only, best: f64::INFINITY }
    }

    /// Whether the model from this epoch should be written.
    /// NaN losses never count as an improvement.
    pub fn should_save(&mut self, val_loss: f64) -> bool {
        let improved = val_loss < self.best;
        if improved {
            self.best = val_loss;
        }
        !self.save_best_only || improved
    }

    /// e.g. `cp-epoch-03-vloss-0_0142`
    ///
    /// The decimal point becomes `_`: the recorder replaces anything
    /// after the last `.` with its own extension.
    pub fn file_stem(epoch: usize, val_loss: f64) -> String {
        format!("cp-epoch-{epoch:02}-vloss-{val_loss:.4}").replace('.', "_")
    }
}
