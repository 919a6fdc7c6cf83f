use serde::{Serialize, Deserialize};

/// Plain gradient descent: `param ← param − learning_rate · grad`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sgd {
    pub learning_rate: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd { learning_rate }
    }

    pub fn update(&self, param: &mut f64, grad: f64) {
        *param -= self.learning_rate * grad;
    }
}
