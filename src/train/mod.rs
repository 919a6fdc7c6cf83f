pub mod epoch_stats;
pub mod loop_fn;
pub mod outcome;
pub mod pattern;
pub mod pretrain;
pub mod train_config;
pub mod trainer;

pub use epoch_stats::{EpochStats, TrainingPhase};
pub use loop_fn::mean_loss;
pub use outcome::{Termination, TrainerState, TrainingOutcome};
pub use pattern::TrainingPattern;
pub use pretrain::{Corruption, PretrainConfig, PretrainedLayer, PretrainedWeights, Pretrainer};
pub use train_config::TrainConfig;
pub use trainer::Trainer;
