use std::{cmp::Ordering, collections::BTreeMap};

use machine_learning::MlErr;
use ndarray::ArrayView1;
use serde::Serialize;

use crate::error::Result;

/// Summary scores of a set of predictions against their true labels.
///
/// Precision, recall and F1 are averaged over the classes weighted by how many true examples
/// each class has.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ClassificationMetrics {
    pub accuracy: f32,
    pub precision: f32,
    pub recall: f32,
    pub f1: f32,
}

/// What a single epoch reports: the training loss and the evaluation scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EpochMetrics {
    pub loss: f32,
    pub accuracy: f32,
    pub precision: f32,
    pub recall: f32,
    pub f1: f32,
}

impl EpochMetrics {
    pub fn new(loss: f32, metrics: ClassificationMetrics) -> Self {
        let ClassificationMetrics {
            accuracy,
            precision,
            recall,
            f1,
        } = metrics;

        Self {
            loss,
            accuracy,
            precision,
            recall,
            f1,
        }
    }
}

/// The fraction of examples whose true class is not the top prediction, and not within the
/// top five predictions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ErrorReport {
    pub top1_error: f32,
    pub top5_error: f32,
}

#[derive(Debug, Default)]
struct ClassCounts {
    tp: usize,
    fp: usize,
    support: usize,
}

/// Computes accuracy and the support weighted precision, recall and F1 of `y_pred`.
///
/// The classes considered are those appearing in either `y_true` or `y_pred`. A per class score
/// with a zero denominator counts as `0`.
///
/// # Errors
/// `MlErr::SizeMismatch` if `y_true` and `y_pred` have different lengths.
pub fn classification_metrics(y_true: &[usize], y_pred: &[usize]) -> Result<ClassificationMetrics> {
    if y_true.len() != y_pred.len() {
        return Err(MlErr::SizeMismatch {
            what: "predictions",
            got: y_pred.len(),
            expected: y_true.len(),
        }
        .into());
    }

    if y_true.is_empty() {
        return Ok(ClassificationMetrics::default());
    }

    let mut counts: BTreeMap<usize, ClassCounts> = BTreeMap::new();
    let mut correct = 0;

    for (&t, &p) in y_true.iter().zip(y_pred) {
        counts.entry(t).or_default().support += 1;

        if t == p {
            correct += 1;
            counts.entry(t).or_default().tp += 1;
        } else {
            counts.entry(p).or_default().fp += 1;
        }
    }

    let (mut precision, mut recall, mut f1) = (0., 0., 0.);

    for c in counts.values() {
        let p = ratio(c.tp, c.tp + c.fp);
        let r = ratio(c.tp, c.support);
        let f = if p + r > 0. { 2. * p * r / (p + r) } else { 0. };

        let weight = c.support as f64;
        precision += weight * p;
        recall += weight * r;
        f1 += weight * f;
    }

    let total = y_true.len() as f64;

    Ok(ClassificationMetrics {
        accuracy: (correct as f64 / total) as f32,
        precision: (precision / total) as f32,
        recall: (recall / total) as f32,
        f1: (f1 / total) as f32,
    })
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        return 0.;
    }

    num as f64 / den as f64
}

/// Ranks the classes of a score row from highest to lowest score.
///
/// Ties keep the lower class index first. NaN scores rank above every other score.
///
/// # Arguments
/// * `scores` - One score per class.
/// * `k` - The maximum amount of classes to return.
///
/// # Returns
/// The indices of the `min(k, scores.len())` highest scoring classes.
pub fn top_k(scores: ArrayView1<f32>, k: usize) -> Vec<usize> {
    let mut ranked: Vec<usize> = (0..scores.len()).collect();
    ranked.sort_by(|&a, &b| descending(scores[a], scores[b]));
    ranked.truncate(k);
    ranked
}

/// The index of the highest score, the lowest index on ties.
pub fn argmax(scores: ArrayView1<f32>) -> Option<usize> {
    scores
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (i, &s)| match best {
            Some((_, b)) if descending(s, b) != Ordering::Less => best,
            _ => Some((i, s)),
        })
        .map(|(i, _)| i)
}

fn descending(a: f32, b: f32) -> Ordering {
    b.total_cmp(&a)
}
