use dendrite::{
    ActivationFunction, LayerSpec, LossFunction, Network, NetworkSpec, Optimizer, RandomSource,
    TrainConfig, Trainer, TrainingPattern,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> dendrite::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let spec = NetworkSpec::new(2, LossFunction::SquaredError)
        .layer(LayerSpec::dense(2, 2, ActivationFunction::Tanh))
        .layer(LayerSpec::dense(1, 2, ActivationFunction::Sigmoid));

    let inputs = vec![
        vec![1.0, 0.0],
        vec![1.0, 1.0],
        vec![0.0, 1.0],
        vec![0.0, 0.0],
    ];
    let expected_outputs = vec![
        vec![1.0],
        vec![0.0],
        vec![1.0],
        vec![0.0],
    ];
    let patterns = TrainingPattern::from_pairs(&inputs, &expected_outputs);

    let mut rng = RandomSource::from_seed(7);
    let mut network = Network::new(&spec, Optimizer::momentum(0.3, 0.8), &mut rng)?;

    let mut trainer = Trainer::new(TrainConfig::new(0.005))?;
    trainer.on_epoch(|stats| {
        if stats.epoch % 1000 == 0 {
            info!(epoch = stats.epoch, loss = stats.loss, "progress");
        }
    });
    let outcome = trainer.train(&mut network, &patterns, 20_000, &mut rng)?;
    info!(
        termination = ?outcome.termination,
        epochs = outcome.epochs,
        loss = ?outcome.final_loss,
        "training finished"
    );

    for input in &inputs {
        let output = network.predict(input)?;
        println!("Input: {:?} -> Output: {:.4}", input, output[0]);
    }
    Ok(())
}
