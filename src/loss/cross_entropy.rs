/// Categorical cross-entropy term for one output unit of a multiclass
/// prediction.
pub struct CrossEntropyLoss;

impl CrossEntropyLoss {
    /// `-a·ln(y)`, with `0·ln(0)` taken as `0`.
    pub fn loss(predicted: f64, expected: f64) -> f64 {
        if expected == 0.0 { 0.0 } else { -expected * predicted.ln() }
    }

    /// `-a / y`, zero for classes the target does not weight.
    pub fn derivative(predicted: f64, expected: f64) -> f64 {
        if expected == 0.0 { 0.0 } else { -expected / predicted }
    }

    /// Gradient of the combined Softmax + cross-entropy w.r.t. the pre-softmax
    /// logits.
    ///
    /// Pushing `-a/y` through the softmax Jacobian simplifies to:
    ///   ∂L/∂z_i = predicted[i] · Σ_j expected[j] - expected[i]
    ///
    /// which is `predicted - expected` for a target distribution summing to 1.
    /// The network uses this as the pre-activation delta of a Softmax output
    /// layer instead of dividing by probabilities that may underflow.
    pub fn softmax_delta(predicted: &[f64], expected: &[f64]) -> Vec<f64> {
        let mass: f64 = expected.iter().sum();
        predicted.iter().zip(expected.iter())
            .map(|(p, e)| p * mass - e)
            .collect()
    }
}
