use crate::{
    activation::activation::ActivationFunction,
    error::{NnError, Result},
    layers::dropout::Dropout,
    layers::layer::{LayerGradients, Upstream},
    math::{init::Initializer, matrix::Matrix, random::RandomSource},
};

/// Fully connected layer: `output = dropout(activation(x · W + b))`.
#[derive(Debug, Clone)]
pub struct DenseLayer{
    pub size: usize,
    pub input_size: usize,
    /// Shape `input_size × size`.
    pub weights: Matrix,
    /// Shape `1 × size`.
    pub biases: Matrix,
    pub activator: ActivationFunction,
    dropout: Dropout,
    cache: Option<DenseCache>,
}

/// What backward needs from the latest training forward.
#[derive(Debug, Clone)]
struct DenseCache {
    input: Vec<f64>,
    pre_neurons: Vec<f64>,  // z = xW + b, needed for the activation derivative
    neurons: Vec<f64>,      // activation before dropout
}

impl DenseLayer {
    pub fn new(
        size: usize,
        input_size: usize,
        activation: ActivationFunction,
        initializer: Initializer,
        dropout_rate: f64,
        rng: &mut RandomSource,
    ) -> DenseLayer {
        let weights = Matrix::initialized(input_size, size, initializer, input_size, size, rng);
        let biases = Matrix::initialized(1, size, initializer, input_size, size, rng);

        DenseLayer {
            size,
            input_size,
            weights,
            biases,
            activator: activation,
            dropout: Dropout::new(dropout_rate),
            cache: None,
        }
    }

    fn pre_activation(&self, input: &[f64]) -> Vec<f64> {
        let mut z = self.weights.left_mul(input);
        for (z, b) in z.iter_mut().zip(self.biases.data[0].iter()) {
            *z += b;
        }
        z
    }

    /// Training forward: applies dropout and caches what backward needs.
    pub fn feed_from(&mut self, input: &[f64], rng: &mut RandomSource) -> Vec<f64> {
        let z = self.pre_activation(input);
        let a = self.activator.apply(&z);
        let mut out = a.clone();
        self.dropout.forward(&mut out, rng);
        self.cache = Some(DenseCache {
            input: input.to_vec(),
            pre_neurons: z,
            neurons: a,
        });
        out
    }

    /// Inference forward: no dropout, no cache.
    pub fn infer(&self, input: &[f64]) -> Vec<f64> {
        self.activator.apply(&self.pre_activation(input))
    }

    /// Consumes the forward cache and returns `[∂L/∂W, ∂L/∂b]` together
    /// with `∂L/∂x` for the layer below.
    pub fn compute_gradients(&mut self, upstream: Upstream<'_>) -> Result<LayerGradients> {
        let cache = self.cache.take().ok_or(NnError::NoForwardPass)?;

        // δ = (mask ⊙ δ_up) pushed through the activation Jacobian
        let layer_delta = match upstream {
            Upstream::Output(delta) => {
                let delta = self.dropout.backward(delta);
                self.activator.backprop(&cache.pre_neurons, &cache.neurons, &delta)
            }
            Upstream::PreActivation(delta) => delta.to_vec(),
        };

        let weights_grad = Matrix::outer(&cache.input, &layer_delta);
        let input_delta = self.weights.right_mul(&layer_delta);
        let biases_grad = Matrix::row(&layer_delta);

        Ok(LayerGradients {
            params: vec![weights_grad, biases_grad],
            input_delta,
        })
    }

    pub fn dropout_rate(&self) -> f64 {
        self.dropout.rate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_layer(activation: ActivationFunction) -> DenseLayer {
        let mut rng = RandomSource::from_seed(0);
        let mut layer = DenseLayer::new(2, 3, activation, Initializer::default(), 0.0, &mut rng);
        layer.weights = Matrix::from_data(vec![
            vec![0.1, -0.2],
            vec![0.3, 0.4],
            vec![-0.5, 0.6],
        ]);
        layer.biases = Matrix::row(&[0.05, -0.05]);
        layer
    }

    #[test]
    fn forward_is_affine_then_activation() {
        let mut rng = RandomSource::from_seed(0);
        let mut layer = fixed_layer(ActivationFunction::Identity);
        let out = layer.feed_from(&[1.0, 2.0, 3.0], &mut rng);
        // [0.1 + 0.6 - 1.5 + 0.05, -0.2 + 0.8 + 1.8 - 0.05]
        assert!((out[0] - (-0.75)).abs() < 1e-12);
        assert!((out[1] - 2.35).abs() < 1e-12);
        assert_eq!(out, layer.infer(&[1.0, 2.0, 3.0]));
    }

    #[test]
    fn gradients_follow_the_chain_rule() {
        let mut rng = RandomSource::from_seed(0);
        let mut layer = fixed_layer(ActivationFunction::Identity);
        let input = [1.0, 2.0, 3.0];
        layer.feed_from(&input, &mut rng);
        let grads = layer.compute_gradients(Upstream::Output(&[1.0, -2.0])).unwrap();

        assert_eq!(grads.params[0], Matrix::outer(&input, &[1.0, -2.0]));
        assert_eq!(grads.params[1], Matrix::row(&[1.0, -2.0]));
        // W · δ
        let expected = [0.1 + 0.4, 0.3 - 0.8, -0.5 - 1.2];
        for (g, e) in grads.input_delta.iter().zip(expected.iter()) {
            assert!((g - e).abs() < 1e-12);
        }
    }

    #[test]
    fn activation_derivative_uses_pre_activation() {
        let mut rng = RandomSource::from_seed(0);
        let mut layer = fixed_layer(ActivationFunction::Tanh);
        layer.feed_from(&[1.0, 2.0, 3.0], &mut rng);
        let grads = layer.compute_gradients(Upstream::Output(&[1.0, 1.0])).unwrap();
        let expected = 1.0 - (-0.75_f64).tanh().powi(2);
        assert!((grads.params[1].data[0][0] - expected).abs() < 1e-12);
    }

    #[test]
    fn backward_without_forward_fails() {
        let mut layer = fixed_layer(ActivationFunction::Identity);
        assert!(matches!(
            layer.compute_gradients(Upstream::Output(&[1.0, 1.0])),
            Err(NnError::NoForwardPass)
        ));
    }

    #[test]
    fn backward_consumes_the_cache() {
        let mut rng = RandomSource::from_seed(0);
        let mut layer = fixed_layer(ActivationFunction::Identity);
        layer.feed_from(&[1.0, 2.0, 3.0], &mut rng);
        assert!(layer.compute_gradients(Upstream::Output(&[1.0, 1.0])).is_ok());
        assert!(layer.compute_gradients(Upstream::Output(&[1.0, 1.0])).is_err());
    }
}
