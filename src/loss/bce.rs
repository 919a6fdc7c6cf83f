/// Binary cross-entropy for a single output probability.
///
/// No epsilon is added inside `ln()`: a prediction of exactly 0 or 1 against
/// a target that disagrees yields infinity, which the network reports as a
/// numerical error. Terms with a zero coefficient contribute exactly zero, so
/// a saturated prediction that agrees with its target is still finite.
pub struct BceLoss;

impl BceLoss {
    /// `-a·ln(y) - (1-a)·ln(1-y)`
    pub fn loss(predicted: f64, expected: f64) -> f64 {
        let pos = if expected == 0.0 { 0.0 } else { -expected * predicted.ln() };
        let neg = if expected == 1.0 { 0.0 } else { -(1.0 - expected) * (1.0 - predicted).ln() };
        pos + neg
    }

    /// `(y - a) / (y·(1 - y))`, zero when the prediction equals the target.
    pub fn derivative(predicted: f64, expected: f64) -> f64 {
        if predicted == expected {
            return 0.0;
        }
        (predicted - expected) / (predicted * (1.0 - predicted))
    }
}
