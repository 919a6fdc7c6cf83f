pub mod bce;
pub mod cross_entropy;
pub mod huber;
pub mod loss_function;
pub mod mae;
pub mod mse;

pub use bce::BceLoss;
pub use cross_entropy::CrossEntropyLoss;
pub use huber::HuberLoss;
pub use loss_function::LossFunction;
pub use mae::MaeLoss;
pub use mse::SquaredError;
