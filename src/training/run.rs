use log::info;
use machine_learning::{
    arch::{loss::CrossEntropy, Model},
    dataset::DataLoader,
    optimization::Adam,
    Device,
};
use serde::Serialize;

use super::{evaluate, evaluate_errors, train_epoch};
use crate::{
    error::Result,
    metrics::{EpochMetrics, ErrorReport},
    report::{EpochReport, Reporter},
};

/// The default Adam learning rate.
pub const LEARNING_RATE: f32 = 0.001;

/// The default amount of epochs.
pub const NUM_EPOCHS: usize = 10;

/// Tunables of a training run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunOptions {
    pub num_epochs: usize,
    pub learning_rate: f32,
    /// The device to train on, `None` selects the best one available.
    pub device: Option<Device>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            num_epochs: NUM_EPOCHS,
            learning_rate: LEARNING_RATE,
            device: None,
        }
    }
}

/// Everything a run reported, in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub epochs: Vec<EpochMetrics>,
    pub errors: ErrorReport,
}

/// Trains a fresh model for `num_epochs` epochs, evaluating it on `test_data` after each one.
///
/// Uses cross entropy loss and Adam with a learning rate of `LEARNING_RATE`. See `run_with`.
pub fn run<M, F, R>(
    model_factory: F,
    train_data: &mut DataLoader,
    test_data: &mut DataLoader,
    num_classes: usize,
    num_epochs: usize,
    reporter: &mut R,
) -> Result<RunSummary>
where
    M: Model,
    F: FnOnce(usize) -> machine_learning::Result<M>,
    R: Reporter,
{
    let options = RunOptions {
        num_epochs,
        ..Default::default()
    };

    run_with(
        model_factory,
        train_data,
        test_data,
        num_classes,
        &options,
        reporter,
    )
}

/// Trains a fresh model and reports its progress.
///
/// The model is built by `model_factory` for `num_classes` classes and placed on the selected
/// device. Every epoch makes one pass over `train_data`, then evaluates on `test_data` and hands
/// the results to `reporter`. After the last epoch the top-1 and top-5 errors on `test_data` are
/// reported once, also when `num_epochs` is `0`.
///
/// # Errors
/// Fails as soon as building the model, any pass or the reporter fails.
pub fn run_with<M, F, R>(
    model_factory: F,
    train_data: &mut DataLoader,
    test_data: &mut DataLoader,
    num_classes: usize,
    options: &RunOptions,
    reporter: &mut R,
) -> Result<RunSummary>
where
    M: Model,
    F: FnOnce(usize) -> machine_learning::Result<M>,
    R: Reporter,
{
    let device = options.device.unwrap_or_else(Device::select);
    info!("training on {device}");

    let mut model = model_factory(num_classes)?;
    model.to_device(device);

    let loss_fn = CrossEntropy::new();
    let mut optimizer = Adam::with_learning_rate(model.size(), options.learning_rate);

    let num_epochs = options.num_epochs;
    let mut epochs = Vec::with_capacity(num_epochs);

    for epoch in 1..=num_epochs {
        let loss = train_epoch(&mut model, train_data.iter(), &loss_fn, &mut optimizer)?;
        let metrics = evaluate(&mut model, test_data.iter())?;
        let metrics = EpochMetrics::new(loss, metrics);

        info!(epoch = epoch, loss = loss, accuracy = metrics.accuracy; "epoch finished");
        reporter.epoch(&EpochReport {
            epoch,
            num_epochs,
            metrics,
        })?;

        epochs.push(metrics);
    }

    let errors = evaluate_errors(&mut model, test_data.iter())?;
    info!(top1_error = errors.top1_error, top5_error = errors.top5_error; "training complete");
    reporter.finished(&errors)?;

    Ok(RunSummary { epochs, errors })
}
