/// Squared error, halved so the derivative is the plain residual.
pub struct SquaredError;

impl SquaredError {
    /// `(y - a)² / 2`
    pub fn loss(predicted: f64, expected: f64) -> f64 {
        0.5 * (predicted - expected).powi(2)
    }

    /// `y - a`
    pub fn derivative(predicted: f64, expected: f64) -> f64 {
        predicted - expected
    }
}
