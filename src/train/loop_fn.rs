use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{NnError, Result};
use crate::math::random::RandomSource;
use crate::network::network::Network;
use crate::train::pattern::TrainingPattern;
use crate::train::pretrain::Corruption;

fn stop_requested(stop: Option<&AtomicBool>) -> bool {
    stop.is_some_and(|flag| flag.load(Ordering::Relaxed))
}

/// Checks a pattern set against the network before any epoch starts.
pub(crate) fn validate_patterns(network: &Network, patterns: &[TrainingPattern]) -> Result<()> {
    if patterns.is_empty() {
        return Err(NnError::InvalidInput("pattern set must not be empty".to_owned()));
    }
    for (i, pattern) in patterns.iter().enumerate() {
        if pattern.input.len() != network.input_size() {
            return Err(NnError::InvalidInput(format!(
                "pattern {i} input has {} values, network expects {}",
                pattern.input.len(),
                network.input_size()
            )));
        }
        if pattern.target.len() != network.output_size() {
            return Err(NnError::InvalidInput(format!(
                "pattern {i} target has {} values, network outputs {}",
                pattern.target.len(),
                network.output_size()
            )));
        }
    }
    Ok(())
}

/// Runs one online epoch over `patterns` in the order given.
///
/// Returns the mean pattern loss, or `None` if `stop` was raised between two
/// patterns.
pub(crate) fn run_one_epoch(
    network: &mut Network,
    patterns: &[TrainingPattern],
    rng: &mut RandomSource,
    stop: Option<&AtomicBool>,
) -> Result<Option<f64>> {
    let mut total_loss = 0.0;

    for pattern in patterns {
        if stop_requested(stop) {
            return Ok(None);
        }
        total_loss += network.train_pattern(pattern, rng)?;
    }

    Ok(Some(total_loss / patterns.len() as f64))
}

/// One denoising-autoencoder epoch: every clean input is corrupted afresh
/// and the network learns to reconstruct the clean version.
pub(crate) fn run_denoising_epoch(
    network: &mut Network,
    inputs: &[Vec<f64>],
    corruption: Corruption,
    rng: &mut RandomSource,
    stop: Option<&AtomicBool>,
) -> Result<Option<f64>> {
    let mut total_loss = 0.0;

    for clean in inputs {
        if stop_requested(stop) {
            return Ok(None);
        }
        let noisy = corruption.apply(clean, rng);
        let pattern = TrainingPattern::new(noisy, clean.clone());
        total_loss += network.train_pattern(&pattern, rng)?;
    }

    Ok(Some(total_loss / inputs.len() as f64))
}

/// Mean inference loss over a pattern set; no parameters change.
pub fn mean_loss(network: &mut Network, patterns: &[TrainingPattern]) -> Result<f64> {
    validate_patterns(network, patterns)?;
    let mut total = 0.0;
    for pattern in patterns {
        total += network.evaluate(pattern)?;
    }
    Ok(total / patterns.len() as f64)
}
