use std::sync::atomic::Ordering;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::error::{NnError, Result};
use crate::math::random::RandomSource;
use crate::network::network::Network;
use crate::train::epoch_stats::{EpochStats, TrainingPhase};
use crate::train::loop_fn::{run_one_epoch, validate_patterns};
use crate::train::outcome::{Termination, TrainerState, TrainingOutcome};
use crate::train::pattern::TrainingPattern;
use crate::train::train_config::TrainConfig;

type Observer<'a> = Box<dyn FnMut(&EpochStats) + 'a>;

/// Epoch loop driver.
///
/// A trainer moves `Idle → Running → {Converged | Exhausted | Stopped}` on
/// every `train` call, or to `Failed` if the call returns an error. Each call
/// is an independent session over the network it is given.
pub struct Trainer<'a> {
    config: TrainConfig,
    state: TrainerState,
    observers: Vec<Observer<'a>>,
    /// Mean loss of every epoch completed by the latest call, kept even when
    /// that call returned an error.
    history: Vec<f64>,
}

impl<'a> Trainer<'a> {
    pub fn new(config: TrainConfig) -> Result<Trainer<'a>> {
        config.validate()?;
        Ok(Trainer {
            config,
            state: TrainerState::Idle,
            observers: Vec::new(),
            history: Vec::new(),
        })
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut TrainConfig {
        &mut self.config
    }

    pub fn state(&self) -> TrainerState {
        self.state
    }

    /// Per-epoch mean losses of the latest call, including one that failed.
    pub fn last_history(&self) -> &[f64] {
        &self.history
    }

    /// Mean loss of the last epoch completed by the latest call.
    pub fn last_loss(&self) -> Option<f64> {
        self.history.last().copied()
    }

    /// Registers a callback invoked synchronously once per completed epoch.
    pub fn on_epoch<F>(&mut self, observer: F)
    where
        F: FnMut(&EpochStats) + 'a,
    {
        self.observers.push(Box::new(observer));
    }

    /// Supervised online training.
    ///
    /// Every epoch visits `patterns` in the order given; each pattern is
    /// forwarded, backpropagated and applied before the next one starts.
    /// Returns once the mean epoch loss drops below the error threshold, the
    /// epoch budget runs out, or the run is stopped. Numerical errors abort
    /// the call; the epochs completed before the abort stay readable through
    /// `last_history` and `last_loss`.
    pub fn train(
        &mut self,
        network: &mut Network,
        patterns: &[TrainingPattern],
        max_epochs: usize,
        rng: &mut RandomSource,
    ) -> Result<TrainingOutcome> {
        if let Err(e) = validate_patterns(network, patterns) {
            self.history.clear();
            self.state = TrainerState::Failed;
            return Err(e);
        }
        let stop = self.config.stop_flag.clone();
        self.run(network, max_epochs, TrainingPhase::Supervised, rng, |network, rng| {
            run_one_epoch(network, patterns, rng, stop.as_deref())
        })
    }

    /// Shared epoch loop. `epoch_fn` runs one epoch and returns its mean
    /// loss, or `None` when interrupted mid-epoch.
    pub(crate) fn run<F>(
        &mut self,
        network: &mut Network,
        max_epochs: usize,
        phase: TrainingPhase,
        rng: &mut RandomSource,
        epoch_fn: F,
    ) -> Result<TrainingOutcome>
    where
        F: FnMut(&mut Network, &mut RandomSource) -> Result<Option<f64>>,
    {
        self.state = TrainerState::Running;
        self.history.clear();
        let result = self.run_epochs(network, max_epochs, phase, rng, epoch_fn);
        self.state = match &result {
            Ok(outcome) => outcome.termination.into(),
            Err(_) => TrainerState::Failed,
        };
        result
    }

    fn run_epochs<F>(
        &mut self,
        network: &mut Network,
        max_epochs: usize,
        phase: TrainingPhase,
        rng: &mut RandomSource,
        mut epoch_fn: F,
    ) -> Result<TrainingOutcome>
    where
        F: FnMut(&mut Network, &mut RandomSource) -> Result<Option<f64>>,
    {
        if max_epochs == 0 {
            return Err(NnError::Configuration("max_epochs must be > 0".to_owned()));
        }

        for epoch in 1..=max_epochs {
            // Check stop flag at the top of each epoch.
            if self.stop_requested() {
                warn!(epoch, ?phase, "training stopped");
                return Ok(self.finish(Termination::Stopped));
            }

            let t_start = Instant::now();
            let loss = match epoch_fn(network, rng) {
                Ok(Some(loss)) => loss,
                Ok(None) => {
                    warn!(epoch, ?phase, "training stopped mid-epoch");
                    return Ok(self.finish(Termination::Stopped));
                }
                Err(e) => {
                    warn!(epoch, ?phase, last_loss = ?self.last_loss(), error = %e, "training aborted");
                    return Err(e);
                }
            };
            if !loss.is_finite() {
                return Err(NnError::Numerical(format!("mean loss of epoch {epoch} is {loss}")));
            }
            self.history.push(loss);

            let stats = EpochStats {
                epoch,
                total_epochs: max_epochs,
                loss,
                elapsed_ms: t_start.elapsed().as_millis() as u64,
                phase,
            };
            debug!(epoch, loss, ?phase, "epoch complete");

            for observer in &mut self.observers {
                observer(&stats);
            }

            // If the receiver has been dropped, stop training after this epoch.
            let receiver_gone = match &self.config.progress_tx {
                Some(tx) => tx.send(stats).is_err(),
                None => false,
            };

            if loss < self.config.error_threshold {
                info!(epoch, loss, ?phase, "training converged");
                return Ok(self.finish(Termination::Converged));
            }
            if receiver_gone {
                warn!(epoch, ?phase, "progress receiver dropped, stopping");
                return Ok(self.finish(Termination::Stopped));
            }
        }

        info!(epochs = max_epochs, loss = ?self.history.last(), ?phase, "epoch budget exhausted");
        Ok(self.finish(Termination::Exhausted))
    }

    fn finish(&self, termination: Termination) -> TrainingOutcome {
        TrainingOutcome {
            termination,
            epochs: self.history.len(),
            final_loss: self.last_loss(),
            history: self.history.clone(),
        }
    }

    fn stop_requested(&self) -> bool {
        self.config.stop_flag.as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}
