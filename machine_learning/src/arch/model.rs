use ndarray::{Array2, ArrayView2};

use super::Scope;
use crate::{Device, Result};

/// The behaviour mode of a model. Layers such as `Dropout` only act while training.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Train,
    Eval,
}

/// The state a single forward pass is run under, handed down to every layer.
#[derive(Debug, Clone, Copy)]
pub struct Pass {
    pub mode: Mode,
    pub track: bool,
    pub device: Device,
}

/// A classification model that owns its parameters and their gradient.
///
/// Parameters live in one flat buffer and the gradient in another of the same length, this way
/// any `Optimizer` can update them without knowing the model's architecture.
pub trait Model {
    /// Returns the amount of parameters in the model.
    fn size(&self) -> usize;

    /// Returns the current behaviour mode.
    fn mode(&self) -> Mode;

    /// Sets the behaviour mode.
    fn set_mode(&mut self, mode: Mode);

    /// Whether forward passes record what the backward pass needs.
    fn grad_enabled(&self) -> bool;

    /// Enables or disables gradient tracking.
    fn set_grad_enabled(&mut self, enabled: bool);

    /// Returns the device the model is placed on.
    fn device(&self) -> Device;

    /// Moves the model to `device`.
    fn to_device(&mut self, device: Device);

    /// Makes a forward pass through the model.
    ///
    /// # Arguments
    /// * `x` - A batch of inputs, one example per row.
    ///
    /// # Returns
    /// The raw class scores, one row per example and one column per class.
    ///
    /// # Errors
    /// Returns `MlErr::SizeMismatch` if the inputs don't fit the model.
    fn forward(&mut self, x: ArrayView2<f32>) -> Result<Array2<f32>>;

    /// Propagates `d`, the derivative of the loss with respect to the last forward output,
    /// backwards through the model, **accumulating** into the gradient buffer.
    ///
    /// # Errors
    /// Returns `MlErr::GradDisabled` if gradient tracking is off.
    fn backward(&mut self, d: Array2<f32>) -> Result<()>;

    /// Sets every accumulated gradient back to zero.
    fn zero_grad(&mut self);

    /// Gives simultaneous access to the parameters and their gradient.
    fn params_and_grad(&mut self) -> (&mut [f32], &[f32]);

    /// Enters training mode with gradient tracking until the returned scope is dropped.
    fn training(&mut self) -> Scope<'_, Self>
    where
        Self: Sized,
    {
        Scope::enter(self, Mode::Train, true)
    }

    /// Enters evaluation mode without gradient tracking until the returned scope is dropped.
    fn inference(&mut self) -> Scope<'_, Self>
    where
        Self: Sized,
    {
        Scope::enter(self, Mode::Eval, false)
    }
}
