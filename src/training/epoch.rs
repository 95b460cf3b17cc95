use log::{debug, trace};
use machine_learning::{
    arch::{loss::LossFn, Model},
    dataset::Batch,
    optimization::Optimizer,
};

use crate::error::{Result, TrainErr};

/// Makes one optimization pass over `data`, one optimizer step per batch.
///
/// The model is put in training mode with gradient tracking for the duration of the pass and
/// restored to its previous state afterwards, also when the pass fails.
///
/// # Arguments
/// * `model` - The model to train.
/// * `data` - The training batches, each one is moved to the model's device before use.
/// * `loss_fn` - The loss minimized.
/// * `optimizer` - Updates the model's parameters from their gradient.
///
/// # Returns
/// The mean per example loss over the pass, each batch loss weighted by its size.
///
/// # Errors
/// `TrainErr::EmptyDataset` if `data` yields no examples, or any error raised by the model, the
/// loss function or the optimizer.
pub fn train_epoch<M, I, L, O>(model: &mut M, data: I, loss_fn: &L, optimizer: &mut O) -> Result<f32>
where
    M: Model,
    I: IntoIterator<Item = Batch>,
    L: LossFn,
    O: Optimizer,
{
    let mut model = model.training();
    let device = model.device();

    let mut total_loss = 0f64;
    let mut samples = 0;

    for (i, batch) in data.into_iter().enumerate() {
        if batch.is_empty() {
            continue;
        }

        let Batch { x, labels } = batch.to(device);

        model.zero_grad();
        let scores = model.forward(x.view())?;
        let loss = loss_fn.loss(scores.view(), &labels)?;
        let d = loss_fn.loss_prime(scores.view(), &labels)?;
        model.backward(d)?;

        let (params, grad) = model.params_and_grad();
        optimizer.update_params(params, grad)?;

        trace!(batch = i, size = labels.len(), loss = loss; "optimizer step");
        total_loss += f64::from(loss) * labels.len() as f64;
        samples += labels.len();
    }

    if samples == 0 {
        return Err(TrainErr::EmptyDataset {
            what: "training data",
        });
    }

    let loss = (total_loss / samples as f64) as f32;
    debug!(samples = samples, loss = loss; "training pass finished");
    Ok(loss)
}
