pub struct MaeLoss;

impl MaeLoss {
    /// `|y - a|`
    pub fn loss(predicted: f64, expected: f64) -> f64 {
        (predicted - expected).abs()
    }

    /// Subgradient: `sign(y - a)`, 0 when equal.
    pub fn derivative(predicted: f64, expected: f64) -> f64 {
        let diff = predicted - expected;
        if diff > 0.0 { 1.0 } else if diff < 0.0 { -1.0 } else { 0.0 }
    }
}
