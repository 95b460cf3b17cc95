use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};

use super::ParamGen;
use crate::Result;

/// Draws the parameters from a probability distribution.
pub struct RandParamGen<'r, R: Rng, D: Distribution<f32>> {
    rng: &'r mut R,
    distribution: D,
}

impl<'r, R: Rng, D: Distribution<f32>> RandParamGen<'r, R, D> {
    pub fn new(rng: &'r mut R, distribution: D) -> Self {
        Self { rng, distribution }
    }
}

impl<'r, R: Rng> RandParamGen<'r, R, Uniform<f32>> {
    /// A uniform distribution over `[low, high)`.
    ///
    /// # Errors
    /// Returns `MlErr::Init` if `low >= high` or a bound is not finite.
    pub fn uniform(rng: &'r mut R, low: f32, high: f32) -> Result<Self> {
        Ok(Self::new(rng, Uniform::new(low, high)?))
    }

    /// Xavier (Glorot) uniform initialization for a layer with the given fans: a uniform
    /// distribution over `[-l, l]` with `l = sqrt(6 / (fan_in + fan_out))`.
    ///
    /// # Errors
    /// Returns `MlErr::Init` if both fans are zero.
    pub fn xavier_uniform(rng: &'r mut R, fan_in: usize, fan_out: usize) -> Result<Self> {
        let l = (6. / (fan_in + fan_out) as f32).sqrt();
        Ok(Self::new(rng, Uniform::new_inclusive(-l, l)?))
    }
}

impl<'r, R: Rng> RandParamGen<'r, R, Normal<f32>> {
    /// # Errors
    /// Returns `MlErr::Init` if `std_dev` is negative or not finite.
    pub fn normal(rng: &'r mut R, mean: f32, std_dev: f32) -> Result<Self> {
        Ok(Self::new(rng, Normal::new(mean, std_dev)?))
    }
}

impl<R: Rng, D: Distribution<f32>> ParamGen for RandParamGen<'_, R, D> {
    fn fill(&mut self, params: &mut [f32]) {
        let samples = (&self.distribution).sample_iter(&mut *self.rng);

        for (param, sample) in params.iter_mut().zip(samples) {
            *param = sample;
        }
    }
}
