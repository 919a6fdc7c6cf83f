use tracing::debug;

use crate::{
    activation::activation::ActivationFunction,
    error::{NnError, Result},
    layers::layer::{Layer, Upstream},
    loss::{cross_entropy::CrossEntropyLoss, loss_function::LossFunction},
    math::{matrix::Matrix, random::RandomSource},
    network::spec::NetworkSpec,
    optim::optimizer::{Optimizer, OptimizerState},
    train::pattern::TrainingPattern,
};

/// An ordered stack of layers with its loss function and optimizer.
///
/// `forward` and `backward` come in pairs: `backward` consumes the caches
/// left by the most recent training-mode `forward`.
#[derive(Debug, Clone)]
pub struct Network {
    layers: Vec<Layer>,
    input_size: usize,
    loss: LossFunction,
    optimizer: OptimizerState,
    last_output: Option<Vec<f64>>,
    last_loss: Option<f64>,
}

impl Network {
    /// Validates `spec` and builds freshly initialized layers from it.
    pub fn new(spec: &NetworkSpec, optimizer: Optimizer, rng: &mut RandomSource) -> Result<Network> {
        spec.validate()?;
        let layers: Vec<Layer> = spec.layers.iter()
            .map(|layer| Layer::from_spec(layer, rng))
            .collect();
        let optimizer = OptimizerState::new(optimizer, &layers)?;

        let network = Network {
            layers,
            input_size: spec.input_size,
            loss: spec.loss,
            optimizer,
            last_output: None,
            last_loss: None,
        };
        debug!(
            layers = network.layers.len(),
            parameters = network.parameter_count(),
            loss = ?network.loss,
            "network constructed"
        );
        Ok(network)
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Mutable access to the layers, e.g. to seed pretrained weights.
    pub fn layers_mut(&mut self) -> &mut [Layer] {
        &mut self.layers
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map_or(0, Layer::size)
    }

    pub fn loss_function(&self) -> LossFunction {
        self.loss
    }

    pub fn optimizer(&self) -> &OptimizerState {
        &self.optimizer
    }

    /// Loss observed by the latest `backward` or `evaluate` call.
    pub fn last_loss(&self) -> Option<f64> {
        self.last_loss
    }

    pub fn parameter_count(&self) -> usize {
        self.layers.iter()
            .flat_map(|layer| layer.params())
            .map(|m| m.rows * m.cols)
            .sum()
    }

    fn check_input(&self, input: &[f64]) -> Result<()> {
        if input.len() != self.input_size {
            return Err(NnError::InvalidInput(format!(
                "input has {} values, network expects {}",
                input.len(),
                self.input_size
            )));
        }
        Ok(())
    }

    fn check_target(&self, target: &[f64]) -> Result<()> {
        if target.len() != self.output_size() {
            return Err(NnError::InvalidInput(format!(
                "target has {} values, network outputs {}",
                target.len(),
                self.output_size()
            )));
        }
        Ok(())
    }

    /// Training-mode forward pass: dropout active, every layer caches what
    /// `backward` needs.
    pub fn forward(&mut self, input: &[f64], rng: &mut RandomSource) -> Result<Vec<f64>> {
        self.check_input(input)?;
        let mut current = input.to_vec();
        for layer in &mut self.layers {
            current = layer.feed_from(&current, rng);
        }
        if current.iter().any(|v| !v.is_finite()) {
            self.last_output = None;
            return Err(NnError::Numerical(format!("non-finite network output {current:?}")));
        }
        self.last_output = Some(current.clone());
        Ok(current)
    }

    /// Inference forward pass with dropout disabled. Leaves no caches behind.
    pub fn predict(&self, input: &[f64]) -> Result<Vec<f64>> {
        self.check_input(input)?;
        Ok(self.layers.iter()
            .fold(input.to_vec(), |current, layer| layer.infer(&current)))
    }

    /// `true` when the output layer is Softmax and the loss is multiclass
    /// cross-entropy; backward then seeds the output pre-activation with the
    /// combined gradient `y·Σa - a`.
    fn fuses_softmax_cross_entropy(&self) -> bool {
        self.loss == LossFunction::CrossEntropy
            && self.layers.last().map(Layer::activator) == Some(ActivationFunction::Softmax)
    }

    /// Backward pass for the latest `forward`.
    ///
    /// Returns one gradient set per layer, each aligned with
    /// `Layer::params()`. Records the pattern loss as `last_loss`.
    pub fn backward(&mut self, target: &[f64]) -> Result<Vec<Vec<Matrix>>> {
        self.check_target(target)?;
        let output = self.last_output.take().ok_or(NnError::NoForwardPass)?;

        let loss = self.loss.total(&output, target);
        if !loss.is_finite() {
            return Err(NnError::Numerical(format!(
                "{:?} loss is {loss} for prediction {output:?} and target {target:?}",
                self.loss
            )));
        }
        self.last_loss = Some(loss);

        let fused = self.fuses_softmax_cross_entropy();
        let seed = if fused {
            CrossEntropyLoss::softmax_delta(&output, target)
        } else {
            self.loss.gradient(&output, target)
        };
        if seed.iter().any(|v| !v.is_finite()) {
            return Err(NnError::Numerical(format!(
                "{:?} gradient is {seed:?} for prediction {output:?}",
                self.loss
            )));
        }

        let mut grads = vec![Vec::new(); self.layers.len()];
        let mut delta = seed;
        let last = self.layers.len() - 1;
        for (i, layer) in self.layers.iter_mut().enumerate().rev() {
            let upstream = if i == last && fused {
                Upstream::PreActivation(&delta)
            } else {
                Upstream::Output(&delta)
            };
            let layer_grads = layer.compute_gradients(upstream)?;
            if layer_grads.params.iter().any(|g| !g.is_finite()) {
                return Err(NnError::Numerical(format!("non-finite gradient in layer {i}")));
            }
            grads[i] = layer_grads.params;
            delta = layer_grads.input_delta;
        }
        Ok(grads)
    }

    /// Runs the optimizer over every parameter with the given gradients.
    pub fn apply_gradients(&mut self, grads: &[Vec<Matrix>]) -> Result<()> {
        self.optimizer.step(&mut self.layers, grads)
    }

    /// One online step: forward, backward, update. Returns the pattern loss.
    pub fn train_pattern(&mut self, pattern: &TrainingPattern, rng: &mut RandomSource) -> Result<f64> {
        self.forward(&pattern.input, rng)?;
        let grads = self.backward(&pattern.target)?;
        self.apply_gradients(&grads)?;
        Ok(self.last_loss.unwrap_or_default())
    }

    /// Inference loss for one pattern; updates `last_loss`.
    pub fn evaluate(&mut self, pattern: &TrainingPattern) -> Result<f64> {
        self.check_target(&pattern.target)?;
        let output = self.predict(&pattern.input)?;
        let loss = self.loss.total(&output, &pattern.target);
        if !loss.is_finite() {
            return Err(NnError::Numerical(format!(
                "{:?} loss is {loss} for prediction {output:?}",
                self.loss
            )));
        }
        self.last_loss = Some(loss);
        Ok(loss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::init::Initializer;
    use crate::network::spec::LayerSpec;

    fn small_spec() -> NetworkSpec {
        NetworkSpec::new(3, LossFunction::SquaredError)
            .layer(LayerSpec::dense(4, 3, ActivationFunction::Tanh))
            .layer(LayerSpec::dense(2, 4, ActivationFunction::Sigmoid))
    }

    #[test]
    fn construction_rejects_width_mismatch() {
        let spec = NetworkSpec::new(3, LossFunction::SquaredError)
            .layer(LayerSpec::dense(4, 3, ActivationFunction::Tanh))
            .layer(LayerSpec::dense(2, 5, ActivationFunction::Sigmoid));
        let mut rng = RandomSource::from_seed(0);
        assert!(matches!(
            Network::new(&spec, Optimizer::sgd(0.1), &mut rng),
            Err(NnError::Configuration(_))
        ));
    }

    #[test]
    fn construction_rejects_bad_optimizer() {
        let mut rng = RandomSource::from_seed(0);
        assert!(Network::new(&small_spec(), Optimizer::sgd(-1.0), &mut rng).is_err());
    }

    #[test]
    fn predict_matches_training_forward_without_dropout() {
        let mut rng = RandomSource::from_seed(1);
        let mut net = Network::new(&small_spec(), Optimizer::sgd(0.1), &mut rng).unwrap();
        let input = [0.2, -0.4, 0.9];
        let trained = net.forward(&input, &mut rng).unwrap();
        assert_eq!(trained, net.predict(&input).unwrap());
        assert_eq!(net.output_size(), 2);
        assert_eq!(net.parameter_count(), 3 * 4 + 4 + 4 * 2 + 2);
    }

    #[test]
    fn predict_ignores_dropout() {
        let spec = NetworkSpec::new(3, LossFunction::SquaredError)
            .layer(LayerSpec::dense(8, 3, ActivationFunction::Tanh).with_dropout(0.5))
            .layer(LayerSpec::dense(1, 8, ActivationFunction::Identity));
        let mut rng = RandomSource::from_seed(2);
        let net = Network::new(&spec, Optimizer::sgd(0.1), &mut rng).unwrap();
        let input = [1.0, 0.5, -0.5];
        assert_eq!(net.predict(&input).unwrap(), net.predict(&input).unwrap());
    }

    #[test]
    fn backward_requires_forward() {
        let mut rng = RandomSource::from_seed(0);
        let mut net = Network::new(&small_spec(), Optimizer::sgd(0.1), &mut rng).unwrap();
        assert!(matches!(net.backward(&[0.0, 1.0]), Err(NnError::NoForwardPass)));

        net.forward(&[0.0, 0.0, 0.0], &mut rng).unwrap();
        assert!(net.backward(&[0.0, 1.0]).is_ok());
        assert!(matches!(net.backward(&[0.0, 1.0]), Err(NnError::NoForwardPass)));
    }

    #[test]
    fn wrong_widths_are_invalid_input() {
        let mut rng = RandomSource::from_seed(0);
        let mut net = Network::new(&small_spec(), Optimizer::sgd(0.1), &mut rng).unwrap();
        assert!(matches!(net.predict(&[1.0]), Err(NnError::InvalidInput(_))));
        net.forward(&[0.0, 0.0, 0.0], &mut rng).unwrap();
        assert!(matches!(net.backward(&[1.0]), Err(NnError::InvalidInput(_))));
    }

    #[test]
    fn training_step_records_loss_and_reduces_it() {
        let mut rng = RandomSource::from_seed(3);
        let mut net = Network::new(&small_spec(), Optimizer::sgd(0.5), &mut rng).unwrap();
        let pattern = TrainingPattern::new(vec![0.5, -0.5, 1.0], vec![1.0, 0.0]);
        let before = net.train_pattern(&pattern, &mut rng).unwrap();
        assert_eq!(net.last_loss(), Some(before));
        for _ in 0..50 {
            net.train_pattern(&pattern, &mut rng).unwrap();
        }
        assert!(net.evaluate(&pattern).unwrap() < before);
    }

    #[test]
    fn saturated_binary_cross_entropy_is_a_numerical_error() {
        let spec = NetworkSpec::new(1, LossFunction::BinaryCrossEntropy)
            .layer(LayerSpec::dense(1, 1, ActivationFunction::Sigmoid)
                .with_initializer(Initializer::Constant { value: 50.0 }));
        let mut rng = RandomSource::from_seed(0);
        let mut net = Network::new(&spec, Optimizer::sgd(0.1), &mut rng).unwrap();
        // sigmoid(100) rounds to exactly 1.0
        let pattern = TrainingPattern::new(vec![1.0], vec![0.0]);
        assert!(matches!(net.train_pattern(&pattern, &mut rng), Err(NnError::Numerical(_))));
        assert!(matches!(net.evaluate(&pattern), Err(NnError::Numerical(_))));
    }

    #[test]
    fn softmax_cross_entropy_seed_is_prediction_minus_target() {
        let spec = NetworkSpec::new(2, LossFunction::CrossEntropy)
            .layer(LayerSpec::dense(3, 2, ActivationFunction::Softmax));
        let mut rng = RandomSource::from_seed(5);
        let mut net = Network::new(&spec, Optimizer::sgd(0.1), &mut rng).unwrap();
        let input = [1.0, 2.0];
        let y = net.forward(&input, &mut rng).unwrap();
        let grads = net.backward(&[0.0, 1.0, 0.0]).unwrap();
        let expected = [y[0], y[1] - 1.0, y[2]];
        for (g, e) in grads[0][1].data[0].iter().zip(expected.iter()) {
            assert!((g - e).abs() < 1e-12);
        }
    }
}
