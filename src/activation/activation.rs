use serde::{Serialize, Deserialize};
use std::f64::consts::PI;

/// Nonlinearity applied by a layer to its pre-activation vector.
///
/// Every derivative in this module is evaluated at the **pre-activation**
/// value `z`, never at the already-computed output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ActivationFunction {
    Identity,
    ReLU,
    Tanh,
    Sigmoid,
    /// `ln(1 + e^x)`.
    Softplus,
    /// `x / (1 + |x|)`.
    Softsign,
    /// Softmax is a vector-valued activation: each output depends on the whole
    /// pre-activation vector. Use the vector-indexed methods or `apply()`.
    Softmax,
    LeakyReLU { alpha: f64 },
    Elu { alpha: f64 },
    Gelu,
    Swish,
}

fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

impl ActivationFunction {
    /// Element-wise activation.
    ///
    /// For `Softmax` this is the softmax of a one-element vector, which is
    /// always `1.0`.
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Identity => x,
            ActivationFunction::ReLU => if x > 0.0 { x } else { 0.0 },
            ActivationFunction::Tanh => x.tanh(),
            ActivationFunction::Sigmoid => sigmoid(x),
            ActivationFunction::Softplus => {
                // Stable for large |x|: exp() only ever sees a non-positive argument.
                if x > 0.0 { x + (-x).exp().ln_1p() } else { x.exp().ln_1p() }
            }
            ActivationFunction::Softsign => x / (1.0 + x.abs()),
            ActivationFunction::Softmax => 1.0,
            ActivationFunction::LeakyReLU { alpha } => if x > 0.0 { x } else { alpha * x },
            ActivationFunction::Elu { alpha } => {
                if x > 0.0 { x } else { alpha * x.exp_m1() }
            }
            ActivationFunction::Gelu => {
                let c = (2.0_f64 / PI).sqrt();
                0.5 * x * (1.0 + (c * (x + 0.044715 * x.powi(3))).tanh())
            }
            ActivationFunction::Swish => x * sigmoid(x),
        }
    }

    /// Element-wise derivative `dy/dx` at pre-activation `x`.
    pub fn derivative(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Identity => 1.0,
            ActivationFunction::ReLU => if x > 0.0 { 1.0 } else { 0.0 },
            ActivationFunction::Tanh => {
                let t = x.tanh();
                1.0 - t * t
            }
            ActivationFunction::Sigmoid => {
                let fx = sigmoid(x);
                fx * (1.0 - fx)
            }
            ActivationFunction::Softplus => sigmoid(x),
            ActivationFunction::Softsign => {
                let d = 1.0 + x.abs();
                1.0 / (d * d)
            }
            ActivationFunction::Softmax => 0.0,
            ActivationFunction::LeakyReLU { alpha } => if x > 0.0 { 1.0 } else { *alpha },
            ActivationFunction::Elu { alpha } => {
                if x > 0.0 { 1.0 } else { alpha * x.exp() }
            }
            ActivationFunction::Gelu => {
                let c = (2.0_f64 / PI).sqrt();
                let inner = c * (x + 0.044715 * x.powi(3));
                let tanh_inner = inner.tanh();
                let sech2 = 1.0 - tanh_inner * tanh_inner;
                let d_inner = c * (1.0 + 3.0 * 0.044715 * x.powi(2));
                0.5 * tanh_inner + 0.5 * x * sech2 * d_inner + 0.5
            }
            ActivationFunction::Swish => {
                let sig = sigmoid(x);
                sig + x * sig * (1.0 - sig)
            }
        }
    }

    /// Output `i` given the whole pre-activation vector `z`.
    pub fn function_at(&self, z: &[f64], i: usize) -> f64 {
        match self {
            ActivationFunction::Softmax => {
                let max = max_of(z);
                let denom: f64 = z.iter().map(|v| (v - max).exp()).sum();
                (z[i] - max).exp() / denom
            }
            _ => self.function(z[i]),
        }
    }

    /// `dy_i/dz_i` given the whole pre-activation vector `z`.
    ///
    /// For `Softmax` this is only the diagonal Jacobian term `y_i (1 - y_i)`;
    /// `backprop()` applies the full Jacobian.
    pub fn derivative_at(&self, z: &[f64], i: usize) -> f64 {
        match self {
            ActivationFunction::Softmax => {
                let y = self.function_at(z, i);
                y * (1.0 - y)
            }
            _ => self.derivative(z[i]),
        }
    }

    /// Activates a whole pre-activation vector.
    pub fn apply(&self, z: &[f64]) -> Vec<f64> {
        match self {
            ActivationFunction::Softmax => {
                let max = max_of(z);
                let exps: Vec<f64> = z.iter().map(|v| (v - max).exp()).collect();
                let sum: f64 = exps.iter().sum();
                exps.into_iter().map(|e| e / sum).collect()
            }
            _ => z.iter().map(|&x| self.function(x)).collect(),
        }
    }

    /// Maps `∂L/∂y` to `∂L/∂z`, given the cached pre-activation `z` and
    /// output `y` of the same forward pass.
    ///
    /// Softmax: `∂L/∂z_j = y_j (δ_j - Σ_i δ_i y_i)`.
    pub fn backprop(&self, z: &[f64], y: &[f64], delta: &[f64]) -> Vec<f64> {
        match self {
            ActivationFunction::Softmax => {
                let dot: f64 = delta.iter().zip(y.iter()).map(|(d, y)| d * y).sum();
                y.iter().zip(delta.iter()).map(|(y, d)| y * (d - dot)).collect()
            }
            _ => delta.iter().zip(z.iter()).map(|(d, &x)| d * self.derivative(x)).collect(),
        }
    }

    /// `true` when outputs depend on the whole pre-activation vector.
    pub fn is_vector(&self) -> bool {
        matches!(self, ActivationFunction::Softmax)
    }

    /// `true` when every output lies in `[0, 1]`, as probability-based
    /// losses require.
    pub fn is_probability(&self) -> bool {
        matches!(self, ActivationFunction::Sigmoid | ActivationFunction::Softmax)
    }
}

fn max_of(z: &[f64]) -> f64 {
    z.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
}
