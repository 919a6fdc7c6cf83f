use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, NnError>;

/// Everything that can abort network construction or a training call.
///
/// Reaching `max_epochs` without crossing the error threshold is not an
/// error; it is reported as `Termination::Exhausted` in the training outcome.
#[derive(Error, Debug)]
pub enum NnError {
    /// Rejected at construction time, before any training starts.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A pattern or input vector does not fit the network.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A loss, gradient or activation evaluated to NaN or infinity.
    #[error("numerical error: {0}")]
    Numerical(String),

    /// `backward` was called without a matching training-mode `forward`.
    #[error("backward called without a preceding training forward pass")]
    NoForwardPass,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
