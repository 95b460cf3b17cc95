use log::debug;
use ndarray::{Array2, ArrayView2};
use rand::Rng;

use super::{Mode, Model, Pass, layers::Layer};
use crate::{Device, MlErr, Result};

/// A sequential model: information flows forward when computing an output and backward when
/// computing the *deltas* of its layers.
///
/// The model owns a flat parameter buffer and a gradient buffer of the same length, each layer
/// takes a contiguous slice of both in order.
#[derive(Debug, Clone)]
pub struct Sequential {
    layers: Vec<Layer>,
    params: Vec<f32>,
    grad: Vec<f32>,
    mode: Mode,
    grad_enabled: bool,
    device: Device,
}

impl Sequential {
    /// Creates a new `Sequential` with freshly initialized parameters.
    ///
    /// # Arguments
    /// * `layers` - The layers the sequential is composed of.
    /// * `rng` - The random number generator used to initialize the parameters.
    ///
    /// # Returns
    /// A new `Sequential` instance or an error if the layers don't chain.
    pub fn new<I, R>(layers: I, rng: &mut R) -> Result<Self>
    where
        I: IntoIterator<Item = Layer>,
        R: Rng,
    {
        let layers: Vec<Layer> = layers.into_iter().collect();
        Self::validate(&layers)?;

        let size: usize = layers.iter().map(Layer::size).sum();
        let mut params = vec![0.; size];

        let mut offset = 0;
        for layer in &layers {
            let end = offset + layer.size();
            layer.init(&mut params[offset..end], rng)?;
            offset = end;
        }

        debug!(layers = layers.len(), size = size; "initialized sequential model");
        Ok(Self::assemble(layers, params))
    }

    /// Creates a new `Sequential` with the given parameters.
    ///
    /// # Errors
    /// Returns an error if the layers don't chain or `params` doesn't match their size.
    pub fn with_params<I>(layers: I, params: Vec<f32>) -> Result<Self>
    where
        I: IntoIterator<Item = Layer>,
    {
        let layers: Vec<Layer> = layers.into_iter().collect();
        Self::validate(&layers)?;

        let size: usize = layers.iter().map(Layer::size).sum();
        if params.len() != size {
            return Err(MlErr::SizeMismatch {
                what: "sequential parameters",
                got: params.len(),
                expected: size,
            });
        }

        Ok(Self::assemble(layers, params))
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn params(&self) -> &[f32] {
        &self.params
    }

    pub fn grad(&self) -> &[f32] {
        &self.grad
    }

    /// Returns the output width of the model, that is, the amount of classes it scores.
    pub fn out_dim(&self) -> usize {
        Self::last_dense_out(&self.layers).unwrap_or_default()
    }

    fn assemble(layers: Vec<Layer>, params: Vec<f32>) -> Self {
        Self {
            grad: vec![0.; params.len()],
            layers,
            params,
            mode: Mode::Train,
            grad_enabled: true,
            device: Device::Cpu,
        }
    }

    fn last_dense_out(layers: &[Layer]) -> Option<usize> {
        layers.iter().rev().find_map(|layer| match layer {
            Layer::Dense(dense) => Some(dense.dim().1),
            Layer::Dropout(_) => None,
        })
    }

    fn validate(layers: &[Layer]) -> Result<()> {
        if Self::last_dense_out(layers).is_none() {
            return Err(MlErr::InvalidLayer {
                index: 0,
                reason: "a model needs at least one dense layer".into(),
            });
        }

        let mut width = None;

        for (index, layer) in layers.iter().enumerate() {
            match layer {
                Layer::Dense(dense) => {
                    let (n, m) = dense.dim();

                    if n == 0 || m == 0 {
                        return Err(MlErr::InvalidLayer {
                            index,
                            reason: format!("dimensions must be non zero, got ({n}, {m})"),
                        });
                    }

                    if let Some(prev) = width.filter(|&prev| prev != n) {
                        return Err(MlErr::InvalidLayer {
                            index,
                            reason: format!(
                                "input size ({n}) does not match previous layer output size ({prev})"
                            ),
                        });
                    }

                    width = Some(m);
                }
                Layer::Dropout(dropout) => {
                    let p = dropout.p();

                    if !(0. ..1.).contains(&p) {
                        return Err(MlErr::InvalidLayer {
                            index,
                            reason: format!("dropout probability must be in [0, 1), got {p}"),
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

impl Model for Sequential {
    fn size(&self) -> usize {
        self.params.len()
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    fn grad_enabled(&self) -> bool {
        self.grad_enabled
    }

    fn set_grad_enabled(&mut self, enabled: bool) {
        self.grad_enabled = enabled;
    }

    fn device(&self) -> Device {
        self.device
    }

    fn to_device(&mut self, device: Device) {
        self.device = device;
    }

    fn forward(&mut self, x: ArrayView2<f32>) -> Result<Array2<f32>> {
        let pass = Pass {
            mode: self.mode,
            track: self.grad_enabled,
            device: self.device,
        };

        let mut offset = 0;
        let mut out = x.to_owned();

        for layer in &mut self.layers {
            let end = offset + layer.size();
            out = layer.forward(&self.params[offset..end], out.view(), pass)?;
            offset = end;
        }

        Ok(out)
    }

    fn backward(&mut self, mut d: Array2<f32>) -> Result<()> {
        if !self.grad_enabled {
            return Err(MlErr::GradDisabled);
        }

        let mut end = self.params.len();

        for layer in self.layers.iter_mut().rev() {
            let start = end - layer.size();
            d = layer.backward(&self.params[start..end], &mut self.grad[start..end], d)?;
            end = start;
        }

        Ok(())
    }

    fn zero_grad(&mut self) {
        self.grad.fill(0.);
    }

    fn params_and_grad(&mut self) -> (&mut [f32], &[f32]) {
        (&mut self.params, &self.grad)
    }
}
