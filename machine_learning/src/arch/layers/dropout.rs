use ndarray::{Array2, ArrayView2};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::arch::{Mode, Pass};

/// Inverted dropout: while training each activation is zeroed with probability `p` and the
/// survivors are scaled by `1 / (1 - p)`, while evaluating the layer is the identity.
#[derive(Debug, Clone)]
pub struct Dropout {
    p: f32,
    rng: StdRng,
    mask: Option<Array2<f32>>,
}

impl Dropout {
    /// Creates a new `Dropout` layer.
    ///
    /// # Arguments
    /// * `p` - The drop probability, expected in `[0, 1)`.
    /// * `seed` - The seed of the mask generator.
    pub fn new(p: f32, seed: u64) -> Self {
        Self {
            p,
            rng: StdRng::seed_from_u64(seed),
            mask: None,
        }
    }

    /// Returns the drop probability.
    pub fn p(&self) -> f32 {
        self.p
    }

    pub fn forward(&mut self, x: ArrayView2<f32>, pass: Pass) -> Array2<f32> {
        self.mask = None;

        if pass.mode == Mode::Eval || self.p == 0. {
            return x.to_owned();
        }

        let p = self.p;
        let scale = 1. / (1. - p);
        let rng = &mut self.rng;
        let mask = Array2::from_shape_simple_fn(x.raw_dim(), || {
            if rng.random::<f32>() < p { 0. } else { scale }
        });

        let out = &x * &mask;
        if pass.track {
            self.mask = Some(mask);
        }

        out
    }

    pub fn backward(&mut self, d: Array2<f32>) -> Array2<f32> {
        match self.mask.take() {
            Some(mask) => d * mask,
            None => d,
        }
    }
}
