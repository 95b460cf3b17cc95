use ndarray::{Array2, ArrayView2};
use rand::Rng;

use super::{Dense, Dropout};
use crate::{
    Result,
    arch::{Pass, activations::ActFn},
};

#[derive(Debug, Clone)]
pub enum Layer {
    Dense(Dense),
    Dropout(Dropout),
}

impl Layer {
    pub fn dense(dim: (usize, usize), act_fn: Option<ActFn>) -> Self {
        Self::Dense(Dense::new(dim, act_fn))
    }

    pub fn dropout(p: f32, seed: u64) -> Self {
        Self::Dropout(Dropout::new(p, seed))
    }

    /// Returns the amount of parameters this layer has.
    pub fn size(&self) -> usize {
        match self {
            Self::Dense(l) => l.size(),
            Self::Dropout(_) => 0,
        }
    }

    pub fn init<R: Rng>(&self, params: &mut [f32], rng: &mut R) -> Result<()> {
        match self {
            Self::Dense(l) => l.init(params, rng),
            Self::Dropout(_) => Ok(()),
        }
    }

    pub fn forward(&mut self, params: &[f32], x: ArrayView2<f32>, pass: Pass) -> Result<Array2<f32>> {
        match self {
            Self::Dense(l) => l.forward(params, x, pass),
            Self::Dropout(l) => Ok(l.forward(x, pass)),
        }
    }

    pub fn backward(
        &mut self,
        params: &[f32],
        grad: &mut [f32],
        d: Array2<f32>,
    ) -> Result<Array2<f32>> {
        match self {
            Self::Dense(l) => l.backward(params, grad, d),
            Self::Dropout(l) => Ok(l.backward(d)),
        }
    }
}
