const DELTA: f64 = 1.0;

/// Huber loss with a fixed threshold δ = 1.0.
pub struct HuberLoss;

impl HuberLoss {
    /// h(x) = 0.5·x²  if |x| ≤ δ
    ///        δ·(|x| − 0.5·δ)  otherwise
    /// where x = y − a.
    pub fn loss(predicted: f64, expected: f64) -> f64 {
        let x = predicted - expected;
        if x.abs() <= DELTA {
            0.5 * x * x
        } else {
            DELTA * (x.abs() - 0.5 * DELTA)
        }
    }

    /// x  if |x| ≤ δ,  else δ·sign(x)
    pub fn derivative(predicted: f64, expected: f64) -> f64 {
        let x = predicted - expected;
        if x.abs() <= DELTA { x } else { DELTA * x.signum() }
    }
}
