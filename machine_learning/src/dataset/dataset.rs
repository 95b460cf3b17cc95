use ndarray::{Array2, Axis};

use crate::{Device, MlErr, Result};

/// An in-memory labelled dataset: one example per row of `x` and one class index per example.
#[derive(Debug, Clone)]
pub struct Dataset {
    x: Array2<f32>,
    labels: Vec<usize>,
    num_classes: usize,
}

impl Dataset {
    /// Creates a new `Dataset`.
    ///
    /// # Errors
    /// Returns an error if the amount of rows and labels differ or a label is not lower than
    /// `num_classes`.
    pub fn new(x: Array2<f32>, labels: Vec<usize>, num_classes: usize) -> Result<Self> {
        if x.nrows() != labels.len() {
            return Err(MlErr::SizeMismatch {
                what: "dataset labels",
                got: labels.len(),
                expected: x.nrows(),
            });
        }

        if let Some(&label) = labels.iter().find(|&&label| label >= num_classes) {
            return Err(MlErr::InvalidLabel { label, num_classes });
        }

        Ok(Self {
            x,
            labels,
            num_classes,
        })
    }

    /// Creates a new `Dataset` from flat rows of `x_size` features followed by the label.
    ///
    /// # Errors
    /// Returns an error if `data` doesn't split evenly in rows or a label is not a valid class.
    pub fn from_rows(data: &[f32], x_size: usize, num_classes: usize) -> Result<Self> {
        let row_size = x_size + 1;

        if data.len() % row_size != 0 {
            return Err(MlErr::SizeMismatch {
                what: "dataset rows",
                got: data.len() % row_size,
                expected: 0,
            });
        }

        let nrows = data.len() / row_size;
        let mut features = Vec::with_capacity(nrows * x_size);
        let mut labels = Vec::with_capacity(nrows);

        for (line, row) in data.chunks_exact(row_size).enumerate() {
            let (x, y) = row.split_at(x_size);
            features.extend_from_slice(x);
            labels.push(parse_label(y[0], line)?);
        }

        let x = Array2::from_shape_vec((nrows, x_size), features)?;
        Self::new(x, labels, num_classes)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn num_features(&self) -> usize {
        self.x.ncols()
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn x(&self) -> &Array2<f32> {
        &self.x
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Gathers the examples at `indices`, in that order, into a new batch.
    pub fn batch(&self, indices: &[usize]) -> Batch {
        Batch {
            x: self.x.select(Axis(0), indices),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }
}

pub(super) fn parse_label(value: f32, line: usize) -> Result<usize> {
    if value < 0. || value.fract() != 0. || !value.is_finite() {
        return Err(MlErr::Parse {
            line,
            reason: format!("label must be a non negative integer, got {value}"),
        });
    }

    Ok(value as usize)
}

/// A batch of examples: the inputs, one per row, and their labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub x: Array2<f32>,
    pub labels: Vec<usize>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Moves this batch to `device`.
    pub fn to(self, device: Device) -> Self {
        Self {
            x: device.place(self.x),
            labels: self.labels,
        }
    }
}
