pub mod adadelta;
pub mod momentum;
pub mod optimizer;
pub mod sgd;

pub use adadelta::AdaDelta;
pub use momentum::Momentum;
pub use optimizer::{Accumulator, Optimizer, OptimizerState};
pub use sgd::Sgd;
