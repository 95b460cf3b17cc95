mod adapter;
mod model;
mod training;

pub use adapter::Adapter;
pub use model::{ActFnConfig, LayerConfig, ModelConfig};
pub use training::{DatasetConfig, TrainingConfig};
