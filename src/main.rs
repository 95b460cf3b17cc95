use std::env;

use anyhow::Context;
use classifier_trainer::{
    configs::{Adapter, TrainingConfig},
    report::{ConsoleReporter, Palette},
    run_with, RunOptions,
};
use log::{debug, info};

/// Path of the JSON training config, a synthetic demo runs when unset.
const CONFIG_VAR: &str = "CONFIG";

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = match env::var(CONFIG_VAR) {
        Ok(path) => TrainingConfig::from_path(&path)
            .with_context(|| format!("failed to load config from {path}"))?,
        Err(_) => {
            info!("{CONFIG_VAR} not set, training on synthetic blobs");
            TrainingConfig::default()
        }
    };

    let mut adapter = Adapter::new(config.seed);
    adapter.validate(&config)?;

    let (mut train, mut test) = adapter.adapt_datasets(&config)?;
    let options = RunOptions {
        num_epochs: config.epochs,
        learning_rate: config.learning_rate,
        device: None,
    };

    let mut reporter = ConsoleReporter::stdout(Palette::colored(config.color));
    let summary = run_with(
        |num_classes| adapter.adapt_model(&config.model, num_classes),
        &mut train,
        &mut test,
        config.num_classes,
        &options,
        &mut reporter,
    )?;

    debug!("summary: {}", serde_json::to_string(&summary)?);
    Ok(())
}
