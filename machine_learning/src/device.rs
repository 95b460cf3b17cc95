use std::fmt::{self, Display};

use ndarray::Array2;

/// The compute device tensors and models are placed on.
///
/// The backend is `ndarray`, so the "accelerator" is the rayon thread pool: element-wise
/// kernels run in parallel when the model is placed on `Parallel`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Device {
    #[default]
    Cpu,
    Parallel {
        threads: usize,
    },
}

impl Device {
    /// Selects the best device available for this process.
    ///
    /// # Returns
    /// `Parallel` if the global rayon pool has more than one thread, `Cpu` otherwise.
    pub fn select() -> Self {
        match rayon::current_num_threads() {
            threads if threads > 1 => Self::Parallel { threads },
            _ => Self::Cpu,
        }
    }

    /// Whether element-wise kernels should be run in parallel on this device.
    pub fn is_parallel(&self) -> bool {
        matches!(self, Self::Parallel { .. })
    }

    /// Places a batch of inputs on this device.
    ///
    /// Both devices share host memory, placing only guarantees the contiguous row-major
    /// layout the matmul kernels expect. Arrays already in that layout are not copied.
    ///
    /// # Arguments
    /// * `x` - The input data.
    ///
    /// # Returns
    /// `x` in standard layout.
    pub fn place(&self, x: Array2<f32>) -> Array2<f32> {
        if x.is_standard_layout() {
            return x;
        }

        x.as_standard_layout().into_owned()
    }
}

impl Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Parallel { threads } => write!(f, "parallel({threads} threads)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn placing_a_transposed_view_yields_standard_layout() {
        let x = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let transposed = x.clone().reversed_axes();
        assert!(!transposed.is_standard_layout());

        let placed = Device::Cpu.place(transposed);

        assert!(placed.is_standard_layout());
        assert_eq!(placed, x.t());
    }

    #[test]
    fn selected_device_matches_pool_size() {
        let device = Device::select();
        assert_eq!(device.is_parallel(), rayon::current_num_threads() > 1);
    }
}
