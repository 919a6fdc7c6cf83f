use crate::math::random::RandomSource;

/// Inverted dropout applied to a layer's output.
///
/// During a training forward every unit is kept with probability
/// `1 - rate` and kept units are scaled by `1 / (1 - rate)`, so inference
/// needs no rescaling and simply skips the mask. The mask of the latest
/// training forward is reused to scale the gradient in backward.
#[derive(Debug, Clone, Default)]
pub struct Dropout {
    rate: f64,
    /// Per-unit multiplier: `0` for dropped units, `1 / (1 - rate)` for kept.
    mask: Option<Vec<f64>>,
}

impl Dropout {
    /// `rate` is the drop probability, validated to lie in `[0, 1)`.
    pub fn new(rate: f64) -> Dropout {
        Dropout { rate, mask: None }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Draws a fresh mask and applies it to `values` in place.
    pub fn forward(&mut self, values: &mut [f64], rng: &mut RandomSource) {
        if self.rate == 0.0 {
            self.mask = None;
            return;
        }

        let scale = 1.0 / (1.0 - self.rate);
        let mask: Vec<f64> = (0..values.len())
            .map(|_| if rng.bernoulli(self.rate) { 0.0 } else { scale })
            .collect();
        for (v, m) in values.iter_mut().zip(mask.iter()) {
            *v *= m;
        }
        self.mask = Some(mask);
    }

    /// Scales an upstream gradient by the mask of the last forward.
    pub fn backward(&self, delta: &[f64]) -> Vec<f64> {
        match &self.mask {
            Some(mask) => delta.iter().zip(mask.iter()).map(|(d, m)| d * m).collect(),
            None => delta.to_vec(),
        }
    }
}
