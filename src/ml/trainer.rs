// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Custom fit loop over two BatchGenerators with Adam + MSE.
//
// One epoch = one pass of the training generator
// (steps_per_pass batches), followed by one pass of the
// validation generator.
//
// Key Burn insight:
//   - Training uses an AutodiffBackend for gradients
//   - model.valid() returns the model on B::InnerBackend with
//     dropout disabled; the validation batcher must use it too
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::{ensure, Context, Result};
use burn::{
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::SteeringBatcher,
    generator::{Batch, BatchGenerator},
};
use crate::domain::traits::FrameSource;
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::callbacks::{CheckpointPolicy, EarlyStopping};
use crate::ml::model::SteeringModel;

/// Per-epoch mean squared error on both splits.
#[derive(Debug, Clone, Default)]
pub struct History {
    pub loss:     Vec<f64>,
    pub val_loss: Vec<f64>,
}

impl History {
    pub fn epochs(&self) -> usize {
        self.loss.len()
    }
}

pub struct TrainingOutcome<B: AutodiffBackend> {
    pub model:         SteeringModel<B>,
    pub history:       History,
    pub stopped_early: bool,
    pub best_epoch:    Option<usize>,
    /// Checkpoint stems written during training
    pub checkpoints:   Vec<String>,
}

pub fn run_training<B: AutodiffBackend, F: FrameSource>(
    cfg:          &TrainConfig,
    mut model:    SteeringModel<B>,
    train_gen:    &mut BatchGenerator<F>,
    val_gen:      &mut BatchGenerator<F>,
    ckpt_manager: &CheckpointManager,
    metrics:      &MetricsLogger,
    device:       &B::Device,
) -> Result<TrainingOutcome<B>> {
    let expected = (cfg.image_height as u32, cfg.image_width as u32);

    let mut optim = AdamConfig::new().with_epsilon(1e-8).init();

    let train_batcher = SteeringBatcher::<B>::new(device.clone());
    let val_batcher   = SteeringBatcher::<B::InnerBackend>::new(device.clone());

    let train_steps = train_gen.steps_per_pass();
    let val_steps   = val_gen.steps_per_pass();
    tracing::info!(
        "Training on {} records ({} samples), validating on {} records ({} samples), {} / {} steps per epoch",
        train_gen.record_count(),
        train_gen.samples_per_pass(),
        val_gen.record_count(),
        val_gen.samples_per_pass(),
        train_steps,
        val_steps,
    );

    let mut history     = History::default();
    let mut early_stop  = EarlyStopping::new(cfg.patience, cfg.min_delta);
    let mut ckpt_policy = CheckpointPolicy::new(cfg.save_best_only);
    let mut checkpoints = Vec::new();
    let mut stopped_early = false;

    for epoch in 1..=cfg.epochs {
        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss_sum = 0.0f64;
        let mut train_samples  = 0usize;

        for step in 0..train_steps {
            let batch = pull(train_gen, expected)
                .with_context(|| format!("training batch {} of epoch {}", step + 1, epoch))?;
            let n     = batch.len();
            let batch = train_batcher.batch(&batch)?;

            let (loss, _) = model.forward_loss(batch.images, batch.targets);
            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            train_loss_sum += loss_val * n as f64;
            train_samples  += n;

            // Backward pass + Adam update
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);

            tracing::debug!("epoch {} step {}/{} loss={:.5}", epoch, step + 1, train_steps, loss_val);
        }

        // ── Validation phase ──────────────────────────────────────────────────
        let model_valid = model.valid();

        let mut val_loss_sum = 0.0f64;
        let mut val_samples  = 0usize;

        for step in 0..val_steps {
            let batch = pull(val_gen, expected)
                .with_context(|| format!("validation batch {} of epoch {}", step + 1, epoch))?;
            let n     = batch.len();
            let batch = val_batcher.batch(&batch)?;

            let (loss, _) = model_valid.forward_loss(batch.images, batch.targets);
            val_loss_sum += loss.into_scalar().elem::<f64>() * n as f64;
            val_samples  += n;
        }

        let avg_train_loss = mean(train_loss_sum, train_samples);
        let avg_val_loss   = mean(val_loss_sum,   val_samples);

        println!(
            "Epoch {:>3}/{} | loss={:.4} | val_loss={:.4}",
            epoch, cfg.epochs, avg_train_loss, avg_val_loss,
        );

        history.loss.push(avg_train_loss);
        history.val_loss.push(avg_val_loss);
        metrics.log(&EpochMetrics::new(epoch, avg_train_loss, avg_val_loss))?;

        // ── Callbacks ─────────────────────────────────────────────────────────
        if ckpt_policy.should_save(avg_val_loss) {
            let stem = CheckpointPolicy::file_stem(epoch, avg_val_loss);
            ckpt_manager.save_model(&model, &stem)?;
            tracing::info!("Checkpoint '{}' saved", stem);
            checkpoints.push(stem);
        }

        if early_stop.update(epoch, avg_val_loss) {
            tracing::info!(
                "Early stopping at epoch {}: val_loss has not improved for {} epochs (best {:.4} at epoch {:?})",
                epoch,
                cfg.patience,
                early_stop.best(),
                early_stop.best_epoch(),
            );
            stopped_early = true;
            break;
        }
    }

    tracing::info!("Training complete after {} epochs", history.epochs());
    Ok(TrainingOutcome {
        model,
        history,
        stopped_early,
        best_epoch: early_stop.best_epoch(),
        checkpoints,
    })
}

/// Next batch from an endless generator, checked against the model's input size
fn pull<F: FrameSource>(generator: &mut BatchGenerator<F>, expected: (u32, u32)) -> Result<Batch> {
    let batch = generator.next().context("batch generator has no records")??;
    ensure!(
        batch.frame_dims() == Some(expected),
        "frames are {:?} (height, width) but the model expects {:?}",
        batch.frame_dims(),
        expected
    );
    Ok(batch)
}

fn mean(sum: f64, count: usize) -> f64 {
    if count > 0 { sum / count as f64 } else { f64::NAN }
}
