use crate::{
    activation::activation::ActivationFunction,
    error::Result,
    layers::{dense::DenseLayer, recurrent::RecurrentLayer},
    math::{matrix::Matrix, random::RandomSource},
    network::spec::{LayerKind, LayerSpec},
};

/// Gradient handed to a layer's backward pass by the layer above (or by the
/// loss, for the output layer).
#[derive(Debug, Clone, Copy)]
pub enum Upstream<'a> {
    /// `∂L/∂a`: gradient w.r.t. the layer's output.
    Output(&'a [f64]),
    /// `∂L/∂z`: gradient already expressed w.r.t. the pre-activation, as
    /// produced by the combined Softmax + cross-entropy seed.
    PreActivation(&'a [f64]),
}

/// Result of one layer's backward pass.
#[derive(Debug, Clone)]
pub struct LayerGradients {
    /// One gradient per parameter tensor, aligned with `Layer::params()`.
    pub params: Vec<Matrix>,
    /// `∂L/∂x`, passed to the layer below.
    pub input_delta: Vec<f64>,
}

/// A layer owned by a `Network`.
#[derive(Debug, Clone)]
pub enum Layer {
    Dense(DenseLayer),
    Recurrent(RecurrentLayer),
}

impl Layer {
    /// Builds a freshly initialized layer. The spec must already be validated.
    pub fn from_spec(spec: &LayerSpec, rng: &mut RandomSource) -> Layer {
        let dropout = spec.dropout.unwrap_or(0.0);
        match spec.kind {
            LayerKind::Dense => Layer::Dense(DenseLayer::new(
                spec.size,
                spec.input_size,
                spec.activation,
                spec.initializer,
                dropout,
                rng,
            )),
            LayerKind::Recurrent { steps } => Layer::Recurrent(RecurrentLayer::new(
                spec.size,
                spec.input_size / steps,
                steps,
                spec.activation,
                spec.initializer,
                dropout,
                rng,
            )),
        }
    }

    pub fn size(&self) -> usize {
        match self {
            Layer::Dense(l) => l.size,
            Layer::Recurrent(l) => l.size,
        }
    }

    pub fn input_size(&self) -> usize {
        match self {
            Layer::Dense(l) => l.input_size,
            Layer::Recurrent(l) => l.input_size(),
        }
    }

    pub fn activator(&self) -> ActivationFunction {
        match self {
            Layer::Dense(l) => l.activator,
            Layer::Recurrent(l) => l.activator,
        }
    }

    pub fn feed_from(&mut self, input: &[f64], rng: &mut RandomSource) -> Vec<f64> {
        match self {
            Layer::Dense(l) => l.feed_from(input, rng),
            Layer::Recurrent(l) => l.feed_from(input, rng),
        }
    }

    pub fn infer(&self, input: &[f64]) -> Vec<f64> {
        match self {
            Layer::Dense(l) => l.infer(input),
            Layer::Recurrent(l) => l.infer(input),
        }
    }

    pub fn compute_gradients(&mut self, upstream: Upstream<'_>) -> Result<LayerGradients> {
        match self {
            Layer::Dense(l) => l.compute_gradients(upstream),
            Layer::Recurrent(l) => l.compute_gradients(upstream),
        }
    }

    /// Parameter tensors in a fixed order: dense `[W, b]`, recurrent
    /// `[W_in, W_rec, b]`.
    pub fn params(&self) -> Vec<&Matrix> {
        match self {
            Layer::Dense(l) => vec![&l.weights, &l.biases],
            Layer::Recurrent(l) => vec![&l.input_weights, &l.recurrent_weights, &l.biases],
        }
    }

    pub fn params_mut(&mut self) -> Vec<&mut Matrix> {
        match self {
            Layer::Dense(l) => vec![&mut l.weights, &mut l.biases],
            Layer::Recurrent(l) => vec![&mut l.input_weights, &mut l.recurrent_weights, &mut l.biases],
        }
    }

    pub fn dropout_rate(&self) -> f64 {
        match self {
            Layer::Dense(l) => l.dropout_rate(),
            Layer::Recurrent(l) => l.dropout_rate(),
        }
    }

    pub fn as_dense(&self) -> Option<&DenseLayer> {
        match self {
            Layer::Dense(l) => Some(l),
            Layer::Recurrent(_) => None,
        }
    }

    pub fn as_dense_mut(&mut self) -> Option<&mut DenseLayer> {
        match self {
            Layer::Dense(l) => Some(l),
            Layer::Recurrent(_) => None,
        }
    }
}
