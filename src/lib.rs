pub mod error;
pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod optim;
pub mod train;

// Convenience re-exports
pub use error::{NnError, Result};
pub use math::{Initializer, Matrix, RandomSource};
pub use activation::ActivationFunction;
pub use layers::{DenseLayer, Layer, RecurrentLayer};
pub use network::{LayerKind, LayerSpec, Network, NetworkSpec};
pub use loss::LossFunction;
pub use optim::{AdaDelta, Momentum, Optimizer, Sgd};
pub use train::{
    Corruption, EpochStats, PretrainConfig, PretrainedWeights, Pretrainer, Termination,
    TrainConfig, Trainer, TrainerState, TrainingOutcome, TrainingPattern, TrainingPhase,
};
