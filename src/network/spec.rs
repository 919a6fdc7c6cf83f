use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{NnError, Result};
use crate::loss::loss_function::LossFunction;
use crate::math::init::Initializer;

/// Structural kind of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerKind {
    #[default]
    Dense,
    /// Recurrent layer unrolled over `steps` time steps; its `input_size` is
    /// split into `steps` equal chunks.
    Recurrent { steps: usize },
}

/// Describes one layer in a network specification.
///
/// Fields:
/// - `size`        - number of neurons in this layer
/// - `input_size`  - number of values feeding into this layer (i.e. the output
///                   size of the previous layer, or the raw input dimension for
///                   the first layer)
/// - `activation`  - activation function applied after the linear transform
/// - `initializer` - distribution the weights and biases are drawn from
/// - `dropout`     - optional drop probability in `[0, 1)`, training only
/// - `kind`        - dense or recurrent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub size: usize,
    pub input_size: usize,
    pub activation: ActivationFunction,
    #[serde(default)]
    pub initializer: Initializer,
    #[serde(default)]
    pub dropout: Option<f64>,
    #[serde(default)]
    pub kind: LayerKind,
}

impl LayerSpec {
    pub fn dense(size: usize, input_size: usize, activation: ActivationFunction) -> LayerSpec {
        LayerSpec {
            size,
            input_size,
            activation,
            initializer: Initializer::default(),
            dropout: None,
            kind: LayerKind::Dense,
        }
    }

    pub fn recurrent(size: usize, input_size: usize, steps: usize, activation: ActivationFunction) -> LayerSpec {
        LayerSpec {
            kind: LayerKind::Recurrent { steps },
            ..LayerSpec::dense(size, input_size, activation)
        }
    }

    pub fn with_initializer(mut self, initializer: Initializer) -> LayerSpec {
        self.initializer = initializer;
        self
    }

    pub fn with_dropout(mut self, rate: f64) -> LayerSpec {
        self.dropout = Some(rate);
        self
    }
}

/// A fully serializable description of a network architecture plus the loss
/// it is trained against.
///
/// `NetworkSpec` can be saved to / loaded from JSON independently of any
/// weights, so architectures can live in configuration files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Width of the raw input vector.
    pub input_size: usize,
    /// Ordered list of layer descriptions (input → output).
    pub layers: Vec<LayerSpec>,
    /// Loss function to pair with this network during training.
    pub loss: LossFunction,
}

impl NetworkSpec {
    pub fn new(input_size: usize, loss: LossFunction) -> NetworkSpec {
        NetworkSpec { input_size, layers: Vec::new(), loss }
    }

    /// Appends a layer; builder style.
    pub fn layer(mut self, layer: LayerSpec) -> NetworkSpec {
        self.layers.push(layer);
        self
    }

    /// Checks every structural invariant the network relies on.
    pub fn validate(&self) -> Result<()> {
        if self.input_size == 0 {
            return Err(NnError::Configuration("input_size must be > 0".to_owned()));
        }
        let last = match self.layers.last() {
            Some(last) => last,
            None => return Err(NnError::Configuration("network needs at least one layer".to_owned())),
        };

        let mut expected_input = self.input_size;
        for (i, layer) in self.layers.iter().enumerate() {
            if layer.size == 0 {
                return Err(NnError::Configuration(format!("layer {i} has size 0")));
            }
            if layer.input_size != expected_input {
                return Err(NnError::Configuration(format!(
                    "layer {i} expects {} inputs but the previous width is {expected_input}",
                    layer.input_size
                )));
            }
            if let Some(rate) = layer.dropout {
                if !(rate.is_finite() && (0.0..1.0).contains(&rate)) {
                    return Err(NnError::Configuration(format!(
                        "layer {i} dropout must be in [0,1), got {rate}"
                    )));
                }
            }
            if !layer.initializer.is_valid() {
                return Err(NnError::Configuration(format!(
                    "layer {i} has an invalid initializer {:?}",
                    layer.initializer
                )));
            }
            match layer.activation {
                ActivationFunction::LeakyReLU { alpha } | ActivationFunction::Elu { alpha }
                    if !alpha.is_finite() =>
                {
                    return Err(NnError::Configuration(format!("layer {i} alpha must be finite")));
                }
                _ => {}
            }
            if let LayerKind::Recurrent { steps } = layer.kind {
                if steps == 0 || layer.input_size % steps != 0 {
                    return Err(NnError::Configuration(format!(
                        "layer {i}: input_size {} cannot be split into {steps} time steps",
                        layer.input_size
                    )));
                }
                if layer.activation.is_vector() {
                    return Err(NnError::Configuration(format!(
                        "layer {i}: recurrent layers need an element-wise activation"
                    )));
                }
            }
            expected_input = layer.size;
        }

        if last.dropout.unwrap_or(0.0) > 0.0 {
            return Err(NnError::Configuration("dropout is not allowed on the output layer".to_owned()));
        }
        if self.loss.needs_probabilities() && !last.activation.is_probability() {
            return Err(NnError::Configuration(format!(
                "{:?} loss needs a Sigmoid or Softmax output, got {:?}",
                self.loss, last.activation
            )));
        }
        Ok(())
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a `NetworkSpec` from a JSON file.
    pub fn load_json(path: &str) -> Result<NetworkSpec> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xor_spec() -> NetworkSpec {
        NetworkSpec::new(2, LossFunction::SquaredError)
            .layer(LayerSpec::dense(2, 2, ActivationFunction::Tanh))
            .layer(LayerSpec::dense(1, 2, ActivationFunction::Sigmoid))
    }

    #[test]
    fn valid_chain_passes() {
        assert!(xor_spec().validate().is_ok());
    }

    #[test]
    fn width_mismatch_is_a_configuration_error() {
        let spec = NetworkSpec::new(2, LossFunction::SquaredError)
            .layer(LayerSpec::dense(3, 2, ActivationFunction::Tanh))
            .layer(LayerSpec::dense(1, 2, ActivationFunction::Sigmoid));
        assert!(matches!(spec.validate(), Err(NnError::Configuration(_))));

        let first = NetworkSpec::new(4, LossFunction::SquaredError)
            .layer(LayerSpec::dense(1, 2, ActivationFunction::Sigmoid));
        assert!(first.validate().is_err());
    }

    #[test]
    fn empty_network_is_rejected() {
        assert!(NetworkSpec::new(2, LossFunction::SquaredError).validate().is_err());
    }

    #[test]
    fn cross_entropy_needs_probability_output() {
        let spec = NetworkSpec::new(2, LossFunction::CrossEntropy)
            .layer(LayerSpec::dense(3, 2, ActivationFunction::Identity));
        assert!(spec.validate().is_err());

        let ok = NetworkSpec::new(2, LossFunction::CrossEntropy)
            .layer(LayerSpec::dense(3, 2, ActivationFunction::Softmax));
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn dropout_rules() {
        let hidden = xor_spec();
        let mut with_hidden_dropout = hidden.clone();
        with_hidden_dropout.layers[0].dropout = Some(0.2);
        assert!(with_hidden_dropout.validate().is_ok());

        let mut on_output = hidden.clone();
        on_output.layers[1].dropout = Some(0.2);
        assert!(on_output.validate().is_err());

        let mut out_of_range = hidden;
        out_of_range.layers[0].dropout = Some(1.0);
        assert!(out_of_range.validate().is_err());
    }

    #[test]
    fn recurrent_steps_must_divide_input() {
        let bad = NetworkSpec::new(5, LossFunction::SquaredError)
            .layer(LayerSpec::recurrent(2, 5, 2, ActivationFunction::Tanh));
        assert!(bad.validate().is_err());

        let softmax = NetworkSpec::new(4, LossFunction::SquaredError)
            .layer(LayerSpec::recurrent(2, 4, 2, ActivationFunction::Softmax));
        assert!(softmax.validate().is_err());

        let ok = NetworkSpec::new(4, LossFunction::SquaredError)
            .layer(LayerSpec::recurrent(2, 4, 2, ActivationFunction::Tanh));
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn json_defaults_fill_optional_fields() {
        let json = r#"{
            "input_size": 2,
            "layers": [
                { "size": 2, "input_size": 2, "activation": "Tanh" },
                { "size": 1, "input_size": 2, "activation": "Sigmoid",
                  "initializer": { "type": "xavier" } }
            ],
            "loss": "squared_error"
        }"#;
        let spec: NetworkSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.layers[0].kind, LayerKind::Dense);
        assert_eq!(spec.layers[0].dropout, None);
        assert_eq!(spec.layers[1].initializer, Initializer::Xavier);
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn json_file_round_trip() {
        let spec = xor_spec()
            .layer(LayerSpec::recurrent(2, 1, 1, ActivationFunction::Tanh).with_dropout(0.0));
        let path = std::env::temp_dir().join(format!("dendrite-spec-{}.json", std::process::id()));
        let path = path.to_str().unwrap();
        spec.save_json(path).unwrap();
        let loaded = NetworkSpec::load_json(path).unwrap();
        std::fs::remove_file(path).unwrap();
        assert_eq!(loaded, spec);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            NetworkSpec::load_json("/nonexistent/dendrite/spec.json"),
            Err(NnError::Io(_))
        ));
    }
}
