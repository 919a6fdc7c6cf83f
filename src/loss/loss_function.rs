use serde::{Serialize, Deserialize};

use crate::loss::bce::BceLoss;
use crate::loss::cross_entropy::CrossEntropyLoss;
use crate::loss::huber::HuberLoss;
use crate::loss::mae::MaeLoss;
use crate::loss::mse::SquaredError;

/// Selects which loss function the network is trained against.
///
/// - `SquaredError`       - `(y-a)²/2`; pair with any output activation.
/// - `BinaryCrossEntropy` - pair with Sigmoid (or Softmax) output.
/// - `CrossEntropy`       - multiclass `-a·ln(y)`; pair with Softmax output.
///   With a Softmax output the network seeds backward with the combined
///   gradient `predicted·Σexpected - expected` (see `CrossEntropyLoss::softmax_delta`).
/// - `AbsoluteError`      - `|y-a|`; pair with Identity output.
/// - `Huber`              - Huber loss (δ=1.0); pair with Identity output.
///
/// The loss of a whole output vector is the sum of the per-unit losses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossFunction {
    SquaredError,
    BinaryCrossEntropy,
    CrossEntropy,
    AbsoluteError,
    Huber,
}

impl LossFunction {
    /// Scalar loss between one prediction and its target.
    pub fn function(&self, predicted: f64, expected: f64) -> f64 {
        match self {
            LossFunction::SquaredError       => SquaredError::loss(predicted, expected),
            LossFunction::BinaryCrossEntropy => BceLoss::loss(predicted, expected),
            LossFunction::CrossEntropy       => CrossEntropyLoss::loss(predicted, expected),
            LossFunction::AbsoluteError      => MaeLoss::loss(predicted, expected),
            LossFunction::Huber              => HuberLoss::loss(predicted, expected),
        }
    }

    /// Scalar gradient of the loss w.r.t. the prediction.
    pub fn derivative(&self, predicted: f64, expected: f64) -> f64 {
        match self {
            LossFunction::SquaredError       => SquaredError::derivative(predicted, expected),
            LossFunction::BinaryCrossEntropy => BceLoss::derivative(predicted, expected),
            LossFunction::CrossEntropy       => CrossEntropyLoss::derivative(predicted, expected),
            LossFunction::AbsoluteError      => MaeLoss::derivative(predicted, expected),
            LossFunction::Huber              => HuberLoss::derivative(predicted, expected),
        }
    }

    /// Loss of a whole output vector.
    pub fn total(&self, predicted: &[f64], expected: &[f64]) -> f64 {
        predicted.iter().zip(expected.iter())
            .map(|(&p, &e)| self.function(p, e))
            .sum()
    }

    /// Per-output gradient `∂L/∂y`.
    pub fn gradient(&self, predicted: &[f64], expected: &[f64]) -> Vec<f64> {
        predicted.iter().zip(expected.iter())
            .map(|(&p, &e)| self.derivative(p, e))
            .collect()
    }

    /// `true` for losses defined only on probabilities.
    pub fn needs_probabilities(&self) -> bool {
        matches!(self, LossFunction::BinaryCrossEntropy | LossFunction::CrossEntropy)
    }
}
