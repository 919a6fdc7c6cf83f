use serde::{Serialize, Deserialize};

/// One `(input, target)` training example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingPattern {
    pub input: Vec<f64>,
    pub target: Vec<f64>,
}

impl TrainingPattern {
    pub fn new(input: Vec<f64>, target: Vec<f64>) -> TrainingPattern {
        TrainingPattern { input, target }
    }

    /// Zips parallel input and target collections into patterns.
    pub fn from_pairs(inputs: &[Vec<f64>], targets: &[Vec<f64>]) -> Vec<TrainingPattern> {
        inputs.iter().zip(targets.iter())
            .map(|(input, target)| TrainingPattern::new(input.clone(), target.clone()))
            .collect()
    }
}
