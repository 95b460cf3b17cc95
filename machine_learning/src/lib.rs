pub mod arch;
pub mod dataset;
pub mod device;
pub mod error;
pub mod initialization;
pub mod optimization;

pub use device::Device;
pub use error::{MlErr, Result};
