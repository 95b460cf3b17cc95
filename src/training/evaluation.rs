use log::debug;
use machine_learning::{arch::Model, dataset::Batch, MlErr};
use ndarray::{Array2, Axis};

use crate::{
    error::{Result, TrainErr},
    metrics::{self, ClassificationMetrics, ErrorReport},
};

/// The amount of best ranked classes considered by the top-k error.
pub const TOP_K: usize = 5;

/// Scores `data` with the model and compares its top predictions against the labels.
///
/// The model is put in evaluation mode without gradient tracking for the duration of the pass and
/// restored to its previous state afterwards.
///
/// # Errors
/// `TrainErr::EmptyDataset` if `data` yields no examples, or any error raised by the model.
pub fn evaluate<M, I>(model: &mut M, data: I) -> Result<ClassificationMetrics>
where
    M: Model,
    I: IntoIterator<Item = Batch>,
{
    let mut y_true = Vec::new();
    let mut y_pred = Vec::new();

    for_each_scored(model, data, |scores, labels| {
        for row in scores.axis_iter(Axis(0)) {
            // rows are non empty, checked when scoring
            y_pred.push(metrics::argmax(row).unwrap_or_default());
        }
        y_true.extend_from_slice(labels);
    })?;

    if y_true.is_empty() {
        return Err(TrainErr::EmptyDataset { what: "test data" });
    }

    let metrics = metrics::classification_metrics(&y_true, &y_pred)?;
    debug!(samples = y_true.len(), accuracy = metrics.accuracy; "evaluation finished");
    Ok(metrics)
}

/// Computes the top-1 and top-5 error rates of the model over `data`.
///
/// With fewer than five classes the top-5 error uses every class, so it is always `0`.
///
/// # Errors
/// `TrainErr::EmptyDataset` if `data` yields no examples, or any error raised by the model.
pub fn evaluate_errors<M, I>(model: &mut M, data: I) -> Result<ErrorReport>
where
    M: Model,
    I: IntoIterator<Item = Batch>,
{
    let mut top1 = 0usize;
    let mut top5 = 0usize;
    let mut total = 0usize;

    for_each_scored(model, data, |scores, labels| {
        let k = TOP_K.min(scores.ncols());

        for (row, label) in scores.axis_iter(Axis(0)).zip(labels) {
            let ranked = metrics::top_k(row, k);

            if ranked.first() == Some(label) {
                top1 += 1;
            }
            if ranked.contains(label) {
                top5 += 1;
            }
        }

        total += labels.len();
    })?;

    if total == 0 {
        return Err(TrainErr::EmptyDataset { what: "test data" });
    }

    let report = ErrorReport {
        top1_error: (1. - top1 as f64 / total as f64) as f32,
        top5_error: (1. - top5 as f64 / total as f64) as f32,
    };

    debug!(samples = total, top1_error = report.top1_error; "error evaluation finished");
    Ok(report)
}

/// Runs an inference pass over every batch and hands the scores with their labels to `f`.
fn for_each_scored<M, I, F>(model: &mut M, data: I, mut f: F) -> Result<()>
where
    M: Model,
    I: IntoIterator<Item = Batch>,
    F: FnMut(&Array2<f32>, &[usize]),
{
    let mut model = model.inference();
    let device = model.device();

    for batch in data {
        if batch.is_empty() {
            continue;
        }

        let Batch { x, labels } = batch.to(device);
        let scores = model.forward(x.view())?;

        if scores.nrows() != labels.len() {
            return Err(MlErr::SizeMismatch {
                what: "score rows",
                got: scores.nrows(),
                expected: labels.len(),
            }
            .into());
        }

        if scores.ncols() == 0 {
            return Err(MlErr::SizeMismatch {
                what: "class scores",
                got: 0,
                expected: 1,
            }
            .into());
        }

        f(&scores, &labels);
    }

    Ok(())
}
