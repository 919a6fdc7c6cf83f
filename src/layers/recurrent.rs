use crate::{
    activation::activation::ActivationFunction,
    error::{NnError, Result},
    layers::dropout::Dropout,
    layers::layer::{LayerGradients, Upstream},
    math::{init::Initializer, matrix::Matrix, random::RandomSource},
};

/// Simple recurrent layer unrolled over a fixed number of time steps.
///
/// The input vector is `steps` consecutive chunks of `step_width` values.
/// Starting from a zero hidden state, each step computes
///
/// ```text
/// h_t = activation(x_t · W_in + h_{t-1} · W_rec + b)
/// ```
///
/// with the same `W_in`, `W_rec` and `b` at every step. The output is the
/// final hidden state `h_steps`.
#[derive(Debug, Clone)]
pub struct RecurrentLayer {
    pub size: usize,
    pub steps: usize,
    pub step_width: usize,
    /// Shape `step_width × size`.
    pub input_weights: Matrix,
    /// Shape `size × size`.
    pub recurrent_weights: Matrix,
    /// Shape `1 × size`.
    pub biases: Matrix,
    pub activator: ActivationFunction,
    dropout: Dropout,
    cache: Option<Vec<StepCache>>,
}

#[derive(Debug, Clone)]
struct StepCache {
    input: Vec<f64>,
    prev_hidden: Vec<f64>,
    pre_activation: Vec<f64>,
    hidden: Vec<f64>,
}

impl RecurrentLayer {
    pub fn new(
        size: usize,
        step_width: usize,
        steps: usize,
        activation: ActivationFunction,
        initializer: Initializer,
        dropout_rate: f64,
        rng: &mut RandomSource,
    ) -> RecurrentLayer {
        let fan_in = step_width + size;
        let input_weights = Matrix::initialized(step_width, size, initializer, fan_in, size, rng);
        let recurrent_weights = Matrix::initialized(size, size, initializer, fan_in, size, rng);
        let biases = Matrix::initialized(1, size, initializer, fan_in, size, rng);

        RecurrentLayer {
            size,
            steps,
            step_width,
            input_weights,
            recurrent_weights,
            biases,
            activator: activation,
            dropout: Dropout::new(dropout_rate),
            cache: None,
        }
    }

    pub fn input_size(&self) -> usize {
        self.steps * self.step_width
    }

    fn step(&self, input: &[f64], prev_hidden: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let mut z = self.input_weights.left_mul(input);
        let recurrent = self.recurrent_weights.left_mul(prev_hidden);
        for ((z, r), b) in z.iter_mut().zip(recurrent.iter()).zip(self.biases.data[0].iter()) {
            *z += r + b;
        }
        let h = self.activator.apply(&z);
        (z, h)
    }

    /// Training forward: unrolls every step, caching each one.
    pub fn feed_from(&mut self, input: &[f64], rng: &mut RandomSource) -> Vec<f64> {
        let mut hidden = vec![0.0; self.size];
        let mut steps = Vec::with_capacity(self.steps);

        for chunk in input.chunks(self.step_width).take(self.steps) {
            let (z, h) = self.step(chunk, &hidden);
            steps.push(StepCache {
                input: chunk.to_vec(),
                prev_hidden: hidden,
                pre_activation: z,
                hidden: h.clone(),
            });
            hidden = h;
        }

        self.cache = Some(steps);
        self.dropout.forward(&mut hidden, rng);
        hidden
    }

    /// Inference forward: no dropout, no cache.
    pub fn infer(&self, input: &[f64]) -> Vec<f64> {
        input.chunks(self.step_width)
            .take(self.steps)
            .fold(vec![0.0; self.size], |hidden, chunk| self.step(chunk, &hidden).1)
    }

    /// Backpropagation through time.
    ///
    /// Walks the cached steps in reverse, summing every step's contribution
    /// into a single `[∂L/∂W_in, ∂L/∂W_rec, ∂L/∂b]` set, so the optimizer
    /// applies one update per pattern.
    pub fn compute_gradients(&mut self, upstream: Upstream<'_>) -> Result<LayerGradients> {
        let steps = self.cache.take().ok_or(NnError::NoForwardPass)?;

        let mut input_weights_grad = Matrix::zeros(self.step_width, self.size);
        let mut recurrent_weights_grad = Matrix::zeros(self.size, self.size);
        let mut biases_grad = Matrix::zeros(1, self.size);
        let mut input_delta = vec![0.0; self.input_size()];

        let (mut hidden_delta, mut last_delta) = match upstream {
            Upstream::Output(delta) => (self.dropout.backward(delta), None),
            Upstream::PreActivation(delta) => (Vec::new(), Some(delta.to_vec())),
        };

        for (t, step) in steps.iter().enumerate().rev() {
            let delta = match last_delta.take() {
                Some(delta) => delta,
                None => self.activator.backprop(&step.pre_activation, &step.hidden, &hidden_delta),
            };

            input_weights_grad += &Matrix::outer(&step.input, &delta);
            recurrent_weights_grad += &Matrix::outer(&step.prev_hidden, &delta);
            biases_grad += &Matrix::row(&delta);

            let offset = t * self.step_width;
            input_delta[offset..offset + self.step_width]
                .copy_from_slice(&self.input_weights.right_mul(&delta));
            hidden_delta = self.recurrent_weights.right_mul(&delta);
        }

        Ok(LayerGradients {
            params: vec![input_weights_grad, recurrent_weights_grad, biases_grad],
            input_delta,
        })
    }

    pub fn dropout_rate(&self) -> f64 {
        self.dropout.rate()
    }
}
