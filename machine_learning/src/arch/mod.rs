pub mod activations;
pub mod layers;
pub mod loss;
mod model;
mod scope;
mod sequential;

pub use model::{Mode, Model, Pass};
pub use scope::Scope;
pub use sequential::Sequential;
