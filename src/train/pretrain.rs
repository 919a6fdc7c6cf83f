//! Greedy layer-wise denoising-autoencoder pretraining.
//!
//! Each hidden dense layer of a `NetworkSpec` is trained in turn as the
//! encoder half of a small `in → size → in` autoencoder that reconstructs
//! clean inputs from corrupted copies. The learned encoder weights are kept,
//! the decoder is discarded, and the clean inputs are pushed through the
//! encoder to become the training data of the next position. The resulting
//! `PretrainedWeights` seed a separately built supervised `Network`.

use std::sync::{Arc, atomic::AtomicBool};

use serde::{Serialize, Deserialize};
use tracing::info;

use crate::activation::activation::ActivationFunction;
use crate::error::{NnError, Result};
use crate::layers::layer::Layer;
use crate::loss::loss_function::LossFunction;
use crate::math::{matrix::Matrix, random::RandomSource};
use crate::network::network::Network;
use crate::network::spec::{LayerKind, LayerSpec, NetworkSpec};
use crate::optim::optimizer::Optimizer;
use crate::train::epoch_stats::{EpochStats, TrainingPhase};
use crate::train::loop_fn::run_denoising_epoch;
use crate::train::outcome::{Termination, TrainingOutcome};
use crate::train::train_config::TrainConfig;
use crate::train::trainer::Trainer;

/// Noise applied to an input before the autoencoder sees it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Corruption {
    /// Each value is zeroed with `probability`.
    Masking { probability: f64 },
    /// Adds N(0, std_dev²) noise to each value.
    Gaussian { std_dev: f64 },
}

impl Corruption {
    pub fn apply(&self, input: &[f64], rng: &mut RandomSource) -> Vec<f64> {
        match *self {
            Corruption::Masking { probability } => input.iter()
                .map(|&x| if rng.bernoulli(probability) { 0.0 } else { x })
                .collect(),
            Corruption::Gaussian { std_dev } => input.iter()
                .map(|&x| x + std_dev * rng.standard_normal())
                .collect(),
        }
    }

    fn validate(&self) -> Result<()> {
        let ok = match *self {
            Corruption::Masking { probability } => probability.is_finite() && (0.0..1.0).contains(&probability),
            Corruption::Gaussian { std_dev } => std_dev.is_finite() && std_dev >= 0.0,
        };
        if ok {
            Ok(())
        } else {
            Err(NnError::Configuration(format!("invalid corruption {self:?}")))
        }
    }
}

fn default_decoder_activation() -> ActivationFunction {
    ActivationFunction::Identity
}

/// Hyperparameters shared by every pretrained position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PretrainConfig {
    pub corruption: Corruption,
    /// Epoch budget per layer.
    pub max_epochs: usize,
    /// Reconstruction loss below which a layer counts as converged.
    pub error_threshold: f64,
    pub optimizer: Optimizer,
    /// Activation of the throwaway decoder layer.
    #[serde(default = "default_decoder_activation")]
    pub decoder_activation: ActivationFunction,
}

impl Default for PretrainConfig {
    fn default() -> Self {
        PretrainConfig {
            corruption: Corruption::Masking { probability: 0.2 },
            max_epochs: 200,
            error_threshold: 1e-3,
            optimizer: Optimizer::momentum(0.05, 0.5),
            decoder_activation: default_decoder_activation(),
        }
    }
}

impl PretrainConfig {
    pub fn validate(&self) -> Result<()> {
        self.corruption.validate()?;
        self.optimizer.validate()?;
        if self.max_epochs == 0 {
            return Err(NnError::Configuration("max_epochs must be > 0".to_owned()));
        }
        Ok(())
    }

    /// Deserializes a `PretrainConfig` from a JSON file.
    pub fn load_json(path: &str) -> Result<PretrainConfig> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let config: PretrainConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }
}

/// Encoder parameters learned for one layer position.
#[derive(Debug, Clone)]
pub struct PretrainedLayer {
    /// Position in the `NetworkSpec` this encoder belongs to.
    pub index: usize,
    pub weights: Matrix,
    pub biases: Matrix,
    pub outcome: TrainingOutcome,
}

/// Result of a pretraining session, ready to seed a supervised network.
#[derive(Debug, Clone, Default)]
pub struct PretrainedWeights {
    pub layers: Vec<PretrainedLayer>,
}

impl PretrainedWeights {
    /// Copies every pretrained encoder into the matching dense layer of
    /// `network`. Nothing else is shared between the two sessions.
    pub fn seed_into(&self, network: &mut Network) -> Result<()> {
        for pretrained in &self.layers {
            let target = network.layers_mut()
                .get_mut(pretrained.index)
                .and_then(Layer::as_dense_mut)
                .ok_or_else(|| NnError::Configuration(format!(
                    "network has no dense layer at position {}",
                    pretrained.index
                )))?;
            if !target.weights.same_shape(&pretrained.weights) || !target.biases.same_shape(&pretrained.biases) {
                return Err(NnError::Configuration(format!(
                    "pretrained layer {} is {}x{}, network layer is {}x{}",
                    pretrained.index,
                    pretrained.weights.rows,
                    pretrained.weights.cols,
                    target.weights.rows,
                    target.weights.cols
                )));
            }
            target.weights = pretrained.weights.clone();
            target.biases = pretrained.biases.clone();
        }
        Ok(())
    }
}

/// Unsupervised layer-wise trainer.
pub struct Pretrainer<'a> {
    config: PretrainConfig,
    trainer: Trainer<'a>,
}

impl<'a> Pretrainer<'a> {
    pub fn new(config: PretrainConfig) -> Result<Pretrainer<'a>> {
        config.validate()?;
        let trainer = Trainer::new(TrainConfig::new(config.error_threshold))?;
        Ok(Pretrainer { config, trainer })
    }

    pub fn config(&self) -> &PretrainConfig {
        &self.config
    }

    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.trainer.config_mut().stop_flag = Some(flag);
        self
    }

    /// Registers a per-epoch observer; records carry `TrainingPhase::Pretraining`.
    pub fn on_epoch<F>(&mut self, observer: F)
    where
        F: FnMut(&EpochStats) + 'a,
    {
        self.trainer.on_epoch(observer);
    }

    /// Pretrains every hidden layer of `spec` (all but the output layer) on
    /// the unlabeled `inputs`.
    pub fn pretrain(
        &mut self,
        spec: &NetworkSpec,
        inputs: &[Vec<f64>],
        rng: &mut RandomSource,
    ) -> Result<PretrainedWeights> {
        spec.validate()?;
        if inputs.is_empty() {
            return Err(NnError::InvalidInput("pretraining needs at least one input".to_owned()));
        }
        if let Some(bad) = inputs.iter().position(|x| x.len() != spec.input_size) {
            return Err(NnError::InvalidInput(format!(
                "input {bad} has {} values, network expects {}",
                inputs[bad].len(),
                spec.input_size
            )));
        }

        let hidden = &spec.layers[..spec.layers.len() - 1];
        if let Some(i) = hidden.iter().position(|l| l.kind != LayerKind::Dense) {
            return Err(NnError::Configuration(format!(
                "layer {i} is not dense and cannot be pretrained as an autoencoder"
            )));
        }

        let mut pretrained = PretrainedWeights::default();
        let mut current: Vec<Vec<f64>> = inputs.to_vec();

        for (index, layer) in hidden.iter().enumerate() {
            let autoencoder_spec = NetworkSpec::new(layer.input_size, LossFunction::SquaredError)
                .layer(LayerSpec { dropout: None, ..layer.clone() })
                .layer(
                    LayerSpec::dense(layer.input_size, layer.size, self.config.decoder_activation)
                        .with_initializer(layer.initializer),
                );
            let mut autoencoder = Network::new(&autoencoder_spec, self.config.optimizer, rng)?;

            let corruption = self.config.corruption;
            let stop = self.trainer.config().stop_flag.clone();
            let data = &current;
            let outcome = self.trainer.run(
                &mut autoencoder,
                self.config.max_epochs,
                TrainingPhase::Pretraining { layer: index },
                rng,
                |network, rng| run_denoising_epoch(network, data, corruption, rng, stop.as_deref()),
            )?;
            info!(
                layer = index,
                epochs = outcome.epochs,
                loss = ?outcome.final_loss,
                termination = ?outcome.termination,
                "layer pretrained"
            );

            let encoder = autoencoder.layers()[0]
                .as_dense()
                .ok_or_else(|| NnError::Configuration("autoencoder encoder must be dense".to_owned()))?;
            current = current.iter().map(|x| encoder.infer(x)).collect();
            let stopped = outcome.termination == Termination::Stopped;
            pretrained.layers.push(PretrainedLayer {
                index,
                weights: encoder.weights.clone(),
                biases: encoder.biases.clone(),
                outcome,
            });
            if stopped {
                break;
            }
        }

        Ok(pretrained)
    }
}
