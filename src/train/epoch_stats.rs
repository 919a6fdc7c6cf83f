use serde::{Serialize, Deserialize};

/// Which kind of session produced an `EpochStats` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrainingPhase {
    /// Supervised backpropagation against pattern targets.
    Supervised,
    /// Denoising-autoencoder pretraining of the hidden layer at `layer`.
    Pretraining { layer: usize },
}

/// Per-epoch training statistics.
///
/// The trainer hands one `EpochStats` value to every registered observer at
/// the end of each completed epoch, and sends a copy down `progress_tx` when
/// a channel is configured in `TrainConfig`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Epoch budget of this run.
    pub total_epochs: usize,
    /// Mean pattern loss over this epoch.
    pub loss: f64,
    /// Wall-clock duration of this single epoch in milliseconds.
    pub elapsed_ms: u64,
    pub phase: TrainingPhase,
}
