use ndarray::{Array2, ArrayView2};

use crate::Result;

/// A loss function over raw class scores and integer class labels.
pub trait LossFn {
    /// Computes the scalar loss of a batch.
    ///
    /// # Arguments
    /// * `scores` - The raw scores, one row per example.
    /// * `labels` - The true class of each example.
    fn loss(&self, scores: ArrayView2<f32>, labels: &[usize]) -> Result<f32>;

    /// Computes the derivative of `loss` with respect to `scores`.
    fn loss_prime(&self, scores: ArrayView2<f32>, labels: &[usize]) -> Result<Array2<f32>>;
}
