use ndarray::{Array1, Array2, ArrayView2, Axis};

use super::LossFn;
use crate::{MlErr, Result};

/// Multi-class cross entropy over raw scores (logits), averaged over the batch.
///
/// The softmax is folded into the loss, so models should output unnormalized scores.
#[derive(Debug, Default, Clone, Copy)]
pub struct CrossEntropy;

impl CrossEntropy {
    /// Returns a new `CrossEntropy`.
    pub fn new() -> Self {
        Self
    }

    fn check(scores: ArrayView2<f32>, labels: &[usize]) -> Result<()> {
        if scores.nrows() != labels.len() {
            return Err(MlErr::SizeMismatch {
                what: "labels",
                got: labels.len(),
                expected: scores.nrows(),
            });
        }

        let num_classes = scores.ncols();
        match labels.iter().find(|&&label| label >= num_classes) {
            Some(&label) => Err(MlErr::InvalidLabel { label, num_classes }),
            None => Ok(()),
        }
    }

    /// Row-wise `log(sum(exp(s)))`, shifted by the row maximum for stability.
    fn log_sum_exp(scores: ArrayView2<f32>) -> Array1<f32> {
        scores.map_axis(Axis(1), |row| {
            let max = row.fold(f32::NEG_INFINITY, |m, &s| m.max(s));
            max + row.mapv(|s| (s - max).exp()).sum().ln()
        })
    }
}

impl LossFn for CrossEntropy {
    fn loss(&self, scores: ArrayView2<f32>, labels: &[usize]) -> Result<f32> {
        Self::check(scores, labels)?;

        if labels.is_empty() {
            return Ok(0.);
        }

        let lse = Self::log_sum_exp(scores);
        let total: f32 = labels
            .iter()
            .enumerate()
            .map(|(i, &label)| lse[i] - scores[[i, label]])
            .sum();

        Ok(total / labels.len() as f32)
    }

    fn loss_prime(&self, scores: ArrayView2<f32>, labels: &[usize]) -> Result<Array2<f32>> {
        Self::check(scores, labels)?;

        let n = labels.len().max(1) as f32;
        let lse = Self::log_sum_exp(scores);
        let mut d = scores.to_owned();

        for ((i, mut row), &label) in d.axis_iter_mut(Axis(0)).enumerate().zip(labels) {
            row.mapv_inplace(|s| (s - lse[i]).exp());
            row[label] -= 1.;
            row /= n;
        }

        Ok(d)
    }
}
