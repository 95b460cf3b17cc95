use crate::Result;

/// Defines the strategy for updating model parameters based on calculated gradients.
pub trait Optimizer {
    /// Updates the provided slice of parameters using the accumulated gradient.
    ///
    /// # Arguments
    /// * `params` - The parameters to update.
    /// * `grad` - A reference to the model's gradient.
    ///
    /// # Errors
    /// Returns `MlErr::SizeMismatch` if `grad` and `params` differ in length from each other
    /// or from the length the optimizer was built for.
    fn update_params(&mut self, params: &mut [f32], grad: &[f32]) -> Result<()>;
}

pub(super) fn check_sizes(params: &[f32], grad: &[f32]) -> Result<()> {
    if grad.len() != params.len() {
        return Err(crate::MlErr::SizeMismatch {
            what: "gradient",
            got: grad.len(),
            expected: params.len(),
        });
    }

    Ok(())
}
