use serde::{Serialize, Deserialize};

use crate::math::random::RandomSource;

/// Weight initialization scheme, a function of `(fan_in, fan_out)`.
///
/// Biases are drawn from the same scheme as the weights of their layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Initializer {
    /// Uniform on `[low, high)`.
    Uniform { low: f64, high: f64 },
    /// Every entry set to `value`.
    Constant { value: f64 },
    /// Xavier (Glorot) normal: N(0, sqrt(1 / fan_in)).
    ///
    /// Recommended before Sigmoid/Tanh/Identity layers.
    Xavier,
    /// He normal: N(0, sqrt(2 / fan_in)).
    ///
    /// Recommended before ReLU layers. The variance 2/fan_in accounts for
    /// the fact that ReLU zeroes half of its inputs on average.
    He,
    /// Glorot uniform: U(-l, l) with l = sqrt(6 / (fan_in + fan_out)).
    GlorotUniform,
}

impl Default for Initializer {
    fn default() -> Self {
        Initializer::Uniform { low: -1.0, high: 1.0 }
    }
}

impl Initializer {
    pub fn sample(&self, fan_in: usize, fan_out: usize, rng: &mut RandomSource) -> f64 {
        match *self {
            Initializer::Uniform { low, high } => rng.uniform(low, high),
            Initializer::Constant { value } => value,
            Initializer::Xavier => {
                rng.standard_normal() * (1.0 / fan_in.max(1) as f64).sqrt()
            }
            Initializer::He => {
                rng.standard_normal() * (2.0 / fan_in.max(1) as f64).sqrt()
            }
            Initializer::GlorotUniform => {
                let limit = (6.0 / (fan_in + fan_out).max(1) as f64).sqrt();
                rng.uniform(-limit, limit)
            }
        }
    }

    /// Checked at network construction.
    pub fn is_valid(&self) -> bool {
        match *self {
            Initializer::Uniform { low, high } => low.is_finite() && high.is_finite() && low <= high,
            Initializer::Constant { value } => value.is_finite(),
            Initializer::Xavier | Initializer::He | Initializer::GlorotUniform => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glorot_uniform_stays_within_limit() {
        let mut rng = RandomSource::from_seed(3);
        let limit = (6.0_f64 / 10.0).sqrt();
        for _ in 0..500 {
            let w = Initializer::GlorotUniform.sample(4, 6, &mut rng);
            assert!(w.abs() <= limit);
        }
    }

    #[test]
    fn constant_ignores_fan() {
        let mut rng = RandomSource::from_seed(0);
        assert_eq!(Initializer::Constant { value: 0.25 }.sample(100, 1, &mut rng), 0.25);
    }

    #[test]
    fn reversed_uniform_bounds_are_invalid() {
        assert!(!Initializer::Uniform { low: 1.0, high: -1.0 }.is_valid());
        assert!(Initializer::default().is_valid());
    }

    #[test]
    fn parses_from_tagged_json() {
        let init: Initializer = serde_json::from_str(r#"{"type":"uniform","low":-0.5,"high":0.5}"#).unwrap();
        assert_eq!(init, Initializer::Uniform { low: -0.5, high: 0.5 });
        let he: Initializer = serde_json::from_str(r#"{"type":"he"}"#).unwrap();
        assert_eq!(he, Initializer::He);
    }
}
