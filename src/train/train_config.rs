use std::sync::mpsc;
use std::sync::{Arc, atomic::AtomicBool};

use serde::{Serialize, Deserialize};

use crate::error::{NnError, Result};
use crate::train::epoch_stats::EpochStats;

/// Configuration for a `Trainer`.
///
/// # Fields
/// - `error_threshold` - training converges once the mean epoch loss falls
///                       strictly below this value
/// - `progress_tx`     - optional channel sender; one `EpochStats` is sent per
///                       completed epoch.  If the receiver is dropped the loop
///                       terminates early (clean shutdown).
/// - `stop_flag`       - optional atomic flag; when set to `true` from another
///                       thread the loop terminates before the next pattern.
///
/// Only `error_threshold` is read from JSON; the channel and the flag are
/// runtime wiring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub error_threshold: f64,
    #[serde(skip)]
    pub progress_tx: Option<mpsc::Sender<EpochStats>>,
    #[serde(skip)]
    pub stop_flag: Option<Arc<AtomicBool>>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig::new(1e-3)
    }
}

impl TrainConfig {
    /// Creates a minimal `TrainConfig` with no progress channel and no stop flag.
    pub fn new(error_threshold: f64) -> Self {
        TrainConfig {
            error_threshold,
            progress_tx: None,
            stop_flag: None,
        }
    }

    pub fn with_progress(mut self, tx: mpsc::Sender<EpochStats>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop_flag = Some(flag);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.error_threshold.is_finite() && self.error_threshold >= 0.0) {
            return Err(NnError::Configuration(format!(
                "error_threshold must be finite and >= 0, got {}",
                self.error_threshold
            )));
        }
        Ok(())
    }

    /// Deserializes a `TrainConfig` from a JSON file.
    pub fn load_json(path: &str) -> Result<TrainConfig> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let config: TrainConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_fields_are_skipped_in_json() {
        let config: TrainConfig = serde_json::from_str(r#"{"error_threshold":0.01}"#).unwrap();
        assert_eq!(config.error_threshold, 0.01);
        assert!(config.progress_tx.is_none());
        assert!(config.stop_flag.is_none());
    }

    #[test]
    fn negative_or_nan_threshold_is_rejected() {
        assert!(TrainConfig::new(-0.1).validate().is_err());
        assert!(TrainConfig::new(f64::NAN).validate().is_err());
        assert!(TrainConfig::new(0.0).validate().is_ok());
    }
}
