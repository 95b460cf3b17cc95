use ndarray::{linalg, prelude::*};
use rand::Rng;

use crate::{
    MlErr, Result,
    arch::{Pass, activations::ActFn},
    initialization::{ConstParamGen, ParamGen, RandParamGen},
};

/// A fully connected layer: `a = act_fn(x · W + b)`.
///
/// The parameters are laid out in row-major order as the `(dim.0, dim.1)` weights followed by the
/// `dim.1` biases.
#[derive(Debug, Clone)]
pub struct Dense {
    dim: (usize, usize),
    act_fn: Option<ActFn>,
    size: usize,

    // Forward metadata, only kept while tracking gradients
    x: Option<Array2<f32>>,
    z: Option<Array2<f32>>,
}

impl Dense {
    /// Creates a new `Dense` layer.
    ///
    /// # Arguments
    /// * `dim` - The input and output widths.
    /// * `act_fn` - An optional activation applied to the affine output.
    pub fn new(dim: (usize, usize), act_fn: Option<ActFn>) -> Self {
        Self {
            dim,
            size: (dim.0 + 1) * dim.1,
            act_fn,
            x: None,
            z: None,
        }
    }

    /// Returns the size of this layer.
    ///
    /// # Returns
    /// The amount of parameters this layer has.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the input and output widths of this layer.
    pub fn dim(&self) -> (usize, usize) {
        self.dim
    }

    /// Writes the initial parameters: Xavier uniform weights and zero biases.
    ///
    /// # Errors
    /// Returns `MlErr::Init` if the distribution can't be built for this layer's fans.
    pub fn init<R: Rng>(&self, params: &mut [f32], rng: &mut R) -> Result<()> {
        let (fan_in, fan_out) = self.dim;
        let w_size = fan_in * fan_out;
        let (w, b) = params.split_at_mut(w_size);

        RandParamGen::xavier_uniform(rng, fan_in, fan_out)?.fill(w);
        ConstParamGen::zeros().fill(b);
        Ok(())
    }

    pub fn forward(&mut self, params: &[f32], x: ArrayView2<f32>, pass: Pass) -> Result<Array2<f32>> {
        if x.ncols() != self.dim.0 {
            return Err(MlErr::SizeMismatch {
                what: "dense layer input width",
                got: x.ncols(),
                expected: self.dim.0,
            });
        }

        let (w, b) = self.view_params(params)?;
        let mut z = Array2::zeros((x.nrows(), self.dim.1));
        linalg::general_mat_mul(1.0, &x, &w, 0.0, &mut z);
        z += &b;

        self.x = pass.track.then(|| x.to_owned());
        self.z = None;

        let Some(ref act_fn) = self.act_fn else {
            return Ok(z);
        };

        let mut a = z.clone();
        if pass.device.is_parallel() {
            a.par_mapv_inplace(|z| act_fn.f(z));
        } else {
            a.mapv_inplace(|z| act_fn.f(z));
        }

        if pass.track {
            self.z = Some(z);
        }

        Ok(a)
    }

    /// Accumulates this layer's gradient and propagates the delta to the previous layer.
    ///
    /// # Arguments
    /// * `params` - This layer's parameters.
    /// * `grad` - This layer's slice of the gradient buffer.
    /// * `d` - The derivative of the loss with respect to this layer's output.
    ///
    /// # Returns
    /// The derivative of the loss with respect to this layer's input.
    pub fn backward(
        &mut self,
        params: &[f32],
        grad: &mut [f32],
        mut d: Array2<f32>,
    ) -> Result<Array2<f32>> {
        let x = self.x.take().ok_or(MlErr::MissingForward)?;

        if d.dim() != (x.nrows(), self.dim.1) {
            return Err(MlErr::SizeMismatch {
                what: "dense layer delta width",
                got: d.ncols(),
                expected: self.dim.1,
            });
        }

        if let Some(act_fn) = &self.act_fn {
            let z = self.z.take().ok_or(MlErr::MissingForward)?;
            d.zip_mut_with(&z, |d, &z| *d *= act_fn.df(z));
        }

        let (mut dw, mut db) = self.view_grad(grad)?;
        linalg::general_mat_mul(1.0, &x.t(), &d, 1.0, &mut dw);
        db += &d.sum_axis(Axis(0));

        let (w, _) = self.view_params(params)?;
        Ok(d.dot(&w.t()))
    }

    /// Gives a view of the raw gradient slice as the delta weights and delta biases of this layer.
    fn view_grad<'a>(
        &self,
        grad: &'a mut [f32],
    ) -> Result<(ArrayViewMut2<'a, f32>, ArrayViewMut1<'a, f32>)> {
        self.check_len("dense layer gradient", grad.len())?;

        let w_size = self.size - self.dim.1;
        let (dw_raw, db_raw) = grad.split_at_mut(w_size);
        let dw = ArrayViewMut2::from_shape(self.dim, dw_raw)?;
        let db = ArrayViewMut1::from_shape(self.dim.1, db_raw)?;
        Ok((dw, db))
    }

    /// Gives a view of the raw parameter slice as the weights and biases of this layer.
    fn view_params<'a>(&self, params: &'a [f32]) -> Result<(ArrayView2<'a, f32>, ArrayView1<'a, f32>)> {
        self.check_len("dense layer parameters", params.len())?;

        let w_size = self.size - self.dim.1;
        let weights = ArrayView2::from_shape(self.dim, &params[..w_size])?;
        let biases = ArrayView1::from_shape(self.dim.1, &params[w_size..])?;
        Ok((weights, biases))
    }

    fn check_len(&self, what: &'static str, got: usize) -> Result<()> {
        if got != self.size {
            return Err(MlErr::SizeMismatch {
                what,
                got,
                expected: self.size,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Device, arch::Mode};

    const TRACK: Pass = Pass {
        mode: Mode::Train,
        track: true,
        device: Device::Cpu,
    };

    // w = [[1, 2], [3, 4], [5, 6]], b = [0.5, -0.5]
    const PARAMS: [f32; 8] = [1., 2., 3., 4., 5., 6., 0.5, -0.5];

    #[test]
    fn forward_is_affine() {
        let mut dense = Dense::new((3, 2), None);
        let x = array![[1., 0., 0.], [1., 1., 1.]];

        let y = dense.forward(&PARAMS, x.view(), TRACK).unwrap();

        assert_eq!(y, array![[1.5, 1.5], [9.5, 11.5]]);
    }

    #[test]
    fn backward_accumulates_gradients() {
        let mut dense = Dense::new((3, 2), None);
        let x = array![[1., 2., 3.]];
        let mut grad = [0.; 8];

        for _ in 0..2 {
            dense.forward(&PARAMS, x.view(), TRACK).unwrap();
            let d = array![[1., 1.]];
            let d_prev = dense.backward(&PARAMS, &mut grad, d).unwrap();
            assert_eq!(d_prev, array![[3., 7., 11.]]);
        }

        assert_eq!(grad, [2., 2., 4., 4., 6., 6., 2., 2.]);
    }

    #[test]
    fn backward_matches_finite_differences() {
        let mut dense = Dense::new((3, 2), Some(ActFn::sigmoid(1.)));
        let params: Vec<f32> = PARAMS.iter().map(|p| p * 0.1).collect();
        let x = array![[0.3, -0.2, 0.1], [0.5, 0.4, -0.6]];

        // loss = sum of outputs, so dL/da = 1
        let mut grad = vec![0.; dense.size()];
        let y = dense.forward(&params, x.view(), TRACK).unwrap();
        dense.backward(&params, &mut grad, Array2::ones(y.raw_dim())).unwrap();

        let eps = 1e-3;
        for i in 0..params.len() {
            let mut plus = params.clone();
            let mut minus = params.clone();
            plus[i] += eps;
            minus[i] -= eps;

            let l_plus = dense.forward(&plus, x.view(), TRACK).unwrap().sum();
            let l_minus = dense.forward(&minus, x.view(), TRACK).unwrap().sum();
            let numeric = (l_plus - l_minus) / (2. * eps);

            assert!(
                (numeric - grad[i]).abs() < 1e-2,
                "param {i}: numeric {numeric} analytic {}",
                grad[i]
            );
        }
    }

    #[test]
    fn untracked_forward_cannot_be_backpropagated() {
        let mut dense = Dense::new((3, 2), None);
        let x = array![[1., 2., 3.]];
        let pass = Pass { track: false, ..TRACK };

        dense.forward(&PARAMS, x.view(), pass).unwrap();
        let mut grad = [0.; 8];

        assert!(matches!(
            dense.backward(&PARAMS, &mut grad, array![[1., 1.]]),
            Err(MlErr::MissingForward)
        ));
    }

    #[test]
    fn wrong_input_width_fails() {
        let mut dense = Dense::new((3, 2), None);
        let x = array![[1., 2.]];

        assert!(matches!(
            dense.forward(&PARAMS, x.view(), TRACK),
            Err(MlErr::SizeMismatch { got: 2, expected: 3, .. })
        ));
    }

    #[test]
    fn parallel_device_gives_same_activations() {
        let mut dense = Dense::new((3, 2), Some(ActFn::relu()));
        let x = array![[1., -2., 0.5], [-1., -1., -1.]];
        let parallel = Pass {
            device: Device::Parallel { threads: 2 },
            ..TRACK
        };

        let serial = dense.forward(&PARAMS, x.view(), TRACK).unwrap();
        let par = dense.forward(&PARAMS, x.view(), parallel).unwrap();

        assert_eq!(serial, par);
        assert!(par.iter().all(|&a| a >= 0.));
    }

    #[test]
    fn init_zeroes_biases() {
        let dense = Dense::new((4, 3), None);
        let mut params = vec![1.; dense.size()];
        let mut rng = rand::rng();

        dense.init(&mut params, &mut rng).unwrap();

        assert!(params[12..].iter().all(|&b| b == 0.));
        assert!(params[..12].iter().any(|&w| w != 1.));
    }
}
