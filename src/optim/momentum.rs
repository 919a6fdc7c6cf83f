use serde::{Serialize, Deserialize};

/// Gradient descent with a decayed velocity:
///
/// ```text
/// v     ← momentum · v − learning_rate · grad
/// param ← param + v
/// ```
///
/// With `momentum = 0` every step equals an `Sgd` step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Momentum {
    pub learning_rate: f64,
    pub momentum: f64,
}

impl Momentum {
    pub fn new(learning_rate: f64, momentum: f64) -> Momentum {
        Momentum { learning_rate, momentum }
    }

    pub fn update(&self, param: &mut f64, grad: f64, velocity: &mut f64) {
        *velocity = self.momentum * *velocity - self.learning_rate * grad;
        *param += *velocity;
    }
}
