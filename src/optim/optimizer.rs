use serde::{Serialize, Deserialize};

use crate::error::{NnError, Result};
use crate::layers::layer::Layer;
use crate::math::matrix::Matrix;
use crate::optim::{adadelta::AdaDelta, momentum::Momentum, sgd::Sgd};

/// Parameter update rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Optimizer {
    Sgd(Sgd),
    Momentum(Momentum),
    AdaDelta(AdaDelta),
}

/// Private per-parameter state. Each rule reads only its own fields.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Accumulator {
    pub velocity: f64,
    pub mean_sq_grad: f64,
    pub mean_sq_update: f64,
}

impl Optimizer {
    pub fn sgd(learning_rate: f64) -> Optimizer {
        Optimizer::Sgd(Sgd::new(learning_rate))
    }

    pub fn momentum(learning_rate: f64, momentum: f64) -> Optimizer {
        Optimizer::Momentum(Momentum::new(learning_rate, momentum))
    }

    pub fn adadelta(rho: f64, epsilon: f64) -> Optimizer {
        Optimizer::AdaDelta(AdaDelta::new(rho, epsilon))
    }

    /// Rejects hyperparameters that would make updates non-finite or divergent.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Optimizer::Sgd(Sgd { learning_rate }) => check_learning_rate(learning_rate),
            Optimizer::Momentum(Momentum { learning_rate, momentum }) => {
                check_learning_rate(learning_rate)?;
                if !(momentum.is_finite() && (0.0..1.0).contains(&momentum)) {
                    return Err(NnError::Configuration(format!(
                        "momentum must be finite and in [0,1), got {momentum}"
                    )));
                }
                Ok(())
            }
            Optimizer::AdaDelta(AdaDelta { rho, epsilon }) => {
                if !(rho.is_finite() && (0.0..1.0).contains(&rho)) {
                    return Err(NnError::Configuration(format!(
                        "adadelta rho must be finite and in [0,1), got {rho}"
                    )));
                }
                if !(epsilon.is_finite() && epsilon > 0.0) {
                    return Err(NnError::Configuration(format!(
                        "adadelta epsilon must be finite and > 0, got {epsilon}"
                    )));
                }
                Ok(())
            }
        }
    }

    /// Applies one update to a single parameter using its accumulator slot.
    pub fn update(&self, param: &mut f64, grad: f64, slot: &mut Accumulator) {
        match self {
            Optimizer::Sgd(rule) => rule.update(param, grad),
            Optimizer::Momentum(rule) => rule.update(param, grad, &mut slot.velocity),
            Optimizer::AdaDelta(rule) => {
                rule.update(param, grad, &mut slot.mean_sq_grad, &mut slot.mean_sq_update)
            }
        }
    }
}

fn check_learning_rate(learning_rate: f64) -> Result<()> {
    if !(learning_rate.is_finite() && learning_rate > 0.0) {
        return Err(NnError::Configuration(format!(
            "learning rate must be finite and > 0, got {learning_rate}"
        )));
    }
    Ok(())
}

/// An optimizer together with one accumulator per network parameter.
///
/// Slots are indexed `[layer][tensor][row][col]`, mirroring `Layer::params()`.
#[derive(Debug, Clone)]
pub struct OptimizerState {
    optimizer: Optimizer,
    slots: Vec<Vec<Vec<Vec<Accumulator>>>>,
}

impl OptimizerState {
    pub fn new(optimizer: Optimizer, layers: &[Layer]) -> Result<OptimizerState> {
        optimizer.validate()?;
        let slots = layers.iter()
            .map(|layer| {
                layer.params().into_iter()
                    .map(|m| vec![vec![Accumulator::default(); m.cols]; m.rows])
                    .collect()
            })
            .collect();
        Ok(OptimizerState { optimizer, slots })
    }

    pub fn optimizer(&self) -> Optimizer {
        self.optimizer
    }

    pub fn slot(&self, layer: usize, tensor: usize, row: usize, col: usize) -> Option<&Accumulator> {
        self.slots.get(layer)?.get(tensor)?.get(row)?.get(col)
    }

    /// Updates every parameter of `layers` from the matching gradient.
    pub fn step(&mut self, layers: &mut [Layer], grads: &[Vec<Matrix>]) -> Result<()> {
        if layers.len() != grads.len() || layers.len() != self.slots.len() {
            return Err(NnError::Configuration(format!(
                "gradient set covers {} layers, network has {}",
                grads.len(),
                layers.len()
            )));
        }

        // Every shape is checked before any parameter moves.
        for (i, (layer, layer_grads)) in layers.iter().zip(grads).enumerate() {
            let params = layer.params();
            if params.len() != layer_grads.len() {
                return Err(NnError::Configuration(format!(
                    "layer {i} has {} parameter tensors, got {} gradients",
                    params.len(),
                    layer_grads.len()
                )));
            }
            for (param, grad) in params.into_iter().zip(layer_grads) {
                if !param.same_shape(grad) {
                    return Err(NnError::Configuration(format!(
                        "layer {i}: gradient shape {}x{} does not match parameter shape {}x{}",
                        grad.rows, grad.cols, param.rows, param.cols
                    )));
                }
            }
        }

        let optimizer = self.optimizer;
        for ((layer, layer_grads), layer_slots) in layers.iter_mut().zip(grads).zip(self.slots.iter_mut()) {
            for ((param, grad), slots) in layer.params_mut().into_iter().zip(layer_grads).zip(layer_slots.iter_mut()) {
                for ((p_row, g_row), s_row) in param.data.iter_mut().zip(&grad.data).zip(slots.iter_mut()) {
                    for ((p, &g), s) in p_row.iter_mut().zip(g_row).zip(s_row.iter_mut()) {
                        optimizer.update(p, g, s);
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trajectory(optimizer: Optimizer, grads: &[f64]) -> Vec<f64> {
        let mut param = 1.5;
        let mut slot = Accumulator::default();
        grads.iter()
            .map(|&g| {
                optimizer.update(&mut param, g, &mut slot);
                param
            })
            .collect()
    }

    #[test]
    fn zero_momentum_matches_plain_gradient_descent() {
        let grads = [0.3, -1.2, 4.0, 0.0, -0.01, 2.5, -3.3];
        let sgd = trajectory(Optimizer::sgd(0.07), &grads);
        let momentum = trajectory(Optimizer::momentum(0.07, 0.0), &grads);
        assert_eq!(sgd, momentum);
    }

    #[test]
    fn momentum_accumulates_velocity() {
        let optimizer = Optimizer::momentum(0.1, 0.9);
        let mut param = 0.0;
        let mut slot = Accumulator::default();
        optimizer.update(&mut param, 1.0, &mut slot);
        assert!((param - (-0.1)).abs() < 1e-15);
        optimizer.update(&mut param, 1.0, &mut slot);
        // v = 0.9·(−0.1) − 0.1 = −0.19
        assert!((slot.velocity - (-0.19)).abs() < 1e-15);
        assert!((param - (-0.29)).abs() < 1e-15);
    }

    #[test]
    fn adadelta_first_step_is_bounded_by_epsilon_ratio() {
        let optimizer = Optimizer::adadelta(0.9, 1e-6);
        let mut param = 0.0;
        let mut slot = Accumulator::default();
        optimizer.update(&mut param, 2.0, &mut slot);
        // E[g²] = 0.4, Δ = −√(1e-6)/√(0.4 + 1e-6) · 2
        let expected = -(1e-6_f64).sqrt() / (0.4_f64 + 1e-6).sqrt() * 2.0;
        assert!((param - expected).abs() < 1e-15);
        assert!(slot.mean_sq_update > 0.0);
    }

    #[test]
    fn adadelta_stays_finite_with_zero_gradients() {
        let optimizer = Optimizer::adadelta(0.95, 1e-6);
        let mut param = 0.5;
        let mut slot = Accumulator::default();
        for _ in 0..100 {
            optimizer.update(&mut param, 0.0, &mut slot);
        }
        assert_eq!(param, 0.5);
        assert!(slot.mean_sq_grad.is_finite());
    }

    #[test]
    fn adadelta_moves_against_the_gradient() {
        let optimizer = Optimizer::adadelta(0.95, 1e-6);
        let mut param = 0.0;
        let mut slot = Accumulator::default();
        for _ in 0..50 {
            optimizer.update(&mut param, 1.0, &mut slot);
        }
        assert!(param < 0.0);
    }

    #[test]
    fn validation_rejects_bad_hyperparameters() {
        assert!(Optimizer::sgd(0.0).validate().is_err());
        assert!(Optimizer::sgd(f64::NAN).validate().is_err());
        assert!(Optimizer::momentum(0.1, 1.0).validate().is_err());
        assert!(Optimizer::momentum(0.1, -0.1).validate().is_err());
        assert!(Optimizer::adadelta(1.0, 1e-6).validate().is_err());
        assert!(Optimizer::adadelta(0.9, 0.0).validate().is_err());
        assert!(Optimizer::momentum(0.1, 0.9).validate().is_ok());
    }

    #[test]
    fn parses_tagged_json() {
        let o: Optimizer = serde_json::from_str(
            r#"{"type":"momentum","learning_rate":0.5,"momentum":0.9}"#,
        ).unwrap();
        assert_eq!(o, Optimizer::momentum(0.5, 0.9));
        let a: Optimizer = serde_json::from_str(r#"{"type":"ada_delta","rho":0.95,"epsilon":1e-6}"#).unwrap();
        assert_eq!(a, Optimizer::adadelta(0.95, 1e-6));
    }

    #[test]
    fn state_keeps_one_slot_per_parameter() {
        use crate::activation::activation::ActivationFunction;
        use crate::math::random::RandomSource;
        use crate::network::spec::LayerSpec;

        let mut rng = RandomSource::from_seed(0);
        let mut layers = vec![Layer::from_spec(&LayerSpec::dense(2, 3, ActivationFunction::Identity), &mut rng)];
        let mut state = OptimizerState::new(Optimizer::momentum(0.5, 0.9), &layers).unwrap();
        assert_eq!(state.optimizer(), Optimizer::momentum(0.5, 0.9));

        let before = layers[0].params()[0].data[1][0];
        let grads = vec![vec![Matrix::outer(&[0.0, 1.0, 0.0], &[2.0, 0.0]), Matrix::row(&[0.0, 0.0])]];
        state.step(&mut layers, &grads).unwrap();

        assert_eq!(state.slot(0, 0, 1, 0).unwrap().velocity, -1.0);
        assert_eq!(state.slot(0, 0, 0, 0).unwrap().velocity, 0.0);
        assert!(state.slot(0, 2, 0, 0).is_none());
        assert_eq!(layers[0].params()[0].data[1][0], before - 1.0);
    }

    #[test]
    fn step_rejects_misshapen_gradients() {
        use crate::activation::activation::ActivationFunction;
        use crate::math::random::RandomSource;
        use crate::network::spec::LayerSpec;

        let mut rng = RandomSource::from_seed(0);
        let mut layers = vec![Layer::from_spec(&LayerSpec::dense(2, 3, ActivationFunction::Identity), &mut rng)];
        let mut state = OptimizerState::new(Optimizer::sgd(0.1), &layers).unwrap();
        let grads = vec![vec![Matrix::zeros(2, 3), Matrix::zeros(1, 2)]];
        assert!(matches!(state.step(&mut layers, &grads), Err(NnError::Configuration(_))));
        assert!(state.step(&mut layers, &[]).is_err());
    }

    #[test]
    fn bad_gradient_in_a_later_layer_leaves_every_layer_untouched() {
        use crate::activation::activation::ActivationFunction;
        use crate::math::random::RandomSource;
        use crate::network::spec::LayerSpec;

        let mut rng = RandomSource::from_seed(0);
        let mut layers = vec![
            Layer::from_spec(&LayerSpec::dense(2, 3, ActivationFunction::Tanh), &mut rng),
            Layer::from_spec(&LayerSpec::dense(1, 2, ActivationFunction::Identity), &mut rng),
        ];
        let before: Vec<Vec<Matrix>> = layers.iter()
            .map(|l| l.params().into_iter().cloned().collect())
            .collect();
        let mut state = OptimizerState::new(Optimizer::momentum(0.1, 0.9), &layers).unwrap();

        let grads = vec![
            vec![Matrix::outer(&[1.0, 1.0, 1.0], &[1.0, 1.0]), Matrix::row(&[1.0, 1.0])],
            vec![Matrix::zeros(2, 1), Matrix::zeros(1, 3)],
        ];
        assert!(matches!(state.step(&mut layers, &grads), Err(NnError::Configuration(_))));

        let after: Vec<Vec<Matrix>> = layers.iter()
            .map(|l| l.params().into_iter().cloned().collect())
            .collect();
        assert_eq!(before, after);
        assert_eq!(state.slot(0, 0, 0, 0).unwrap().velocity, 0.0);

        let short = vec![vec![Matrix::zeros(3, 2)], vec![Matrix::zeros(2, 1), Matrix::zeros(1, 1)]];
        assert!(state.step(&mut layers, &short).is_err());
    }
}
