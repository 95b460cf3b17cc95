use ndarray::{Array1, Array2};
use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};

use super::Dataset;
use crate::Result;

/// A generator of Gaussian blobs: every class has a center and its examples are normally
/// distributed around it with unit variance.
#[derive(Debug, Clone)]
pub struct Blobs {
    centers: Array2<f32>,
}

impl Blobs {
    /// Samples `classes` centers uniformly in `[-spread, spread]` on each of `features` axes.
    ///
    /// # Errors
    /// Returns `MlErr::Init` if `spread` is negative or not finite.
    pub fn new<R: Rng>(features: usize, classes: usize, spread: f32, rng: &mut R) -> Result<Self> {
        let uniform = Uniform::new_inclusive(-spread, spread)?;
        let centers = Array2::from_shape_simple_fn((classes, features), || uniform.sample(rng));

        Ok(Self { centers })
    }

    pub fn num_classes(&self) -> usize {
        self.centers.nrows()
    }

    /// Draws `samples` examples, cycling through the classes so they are balanced.
    pub fn sample<R: Rng>(&self, samples: usize, rng: &mut R) -> Result<Dataset> {
        let normal = Normal::new(0., 1.)?;
        let classes = self.num_classes();
        let labels: Vec<usize> = (0..samples).map(|i| i % classes.max(1)).collect();

        let mut x = Array2::zeros((samples, self.centers.ncols()));
        for (mut row, &label) in x.rows_mut().into_iter().zip(&labels) {
            let noise: Array1<f32> = (0..row.len()).map(|_| normal.sample(rng)).collect();
            row.assign(&(&self.centers.row(label) + &noise));
        }

        Dataset::new(x, labels, classes)
    }
}
