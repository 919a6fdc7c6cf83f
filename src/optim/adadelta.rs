use serde::{Serialize, Deserialize};

/// AdaDelta (Zeiler, 2012). No learning rate: the step size is the ratio of
/// the RMS of past updates to the RMS of past gradients.
///
/// ```text
/// E[g²]  ← ρ·E[g²] + (1−ρ)·g²
/// Δ      ← −(√(E[Δ²] + ε) / √(E[g²] + ε)) · g
/// param  ← param + Δ
/// E[Δ²]  ← ρ·E[Δ²] + (1−ρ)·Δ²
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdaDelta {
    pub rho: f64,
    pub epsilon: f64,
}

impl Default for AdaDelta {
    fn default() -> Self {
        AdaDelta { rho: 0.95, epsilon: 1e-6 }
    }
}

impl AdaDelta {
    pub fn new(rho: f64, epsilon: f64) -> AdaDelta {
        AdaDelta { rho, epsilon }
    }

    pub fn update(&self, param: &mut f64, grad: f64, mean_sq_grad: &mut f64, mean_sq_update: &mut f64) {
        *mean_sq_grad = self.rho * *mean_sq_grad + (1.0 - self.rho) * grad * grad;
        let delta = -((*mean_sq_update + self.epsilon).sqrt() / (*mean_sq_grad + self.epsilon).sqrt()) * grad;
        *param += delta;
        *mean_sq_update = self.rho * *mean_sq_update + (1.0 - self.rho) * delta * delta;
    }
}
