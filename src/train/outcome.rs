use serde::{Serialize, Deserialize};

/// Why a training call returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// The mean epoch loss fell below the error threshold.
    Converged,
    /// `max_epochs` ran out first.
    Exhausted,
    /// The stop flag was raised or the progress receiver went away.
    Stopped,
}

/// Lifecycle of a `Trainer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainerState {
    Idle,
    Running,
    Converged,
    Exhausted,
    Stopped,
    /// The last call returned an error.
    Failed,
}

impl From<Termination> for TrainerState {
    fn from(t: Termination) -> Self {
        match t {
            Termination::Converged => TrainerState::Converged,
            Termination::Exhausted => TrainerState::Exhausted,
            Termination::Stopped => TrainerState::Stopped,
        }
    }
}

/// What a training call reports back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingOutcome {
    pub termination: Termination,
    /// Completed epochs.
    pub epochs: usize,
    /// Mean loss of the last completed epoch, if any completed.
    pub final_loss: Option<f64>,
    /// Mean loss of every completed epoch, in order.
    pub history: Vec<f64>,
}

impl TrainingOutcome {
    pub fn converged(&self) -> bool {
        self.termination == Termination::Converged
    }
}
