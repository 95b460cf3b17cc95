mod blobs;
mod csv;
mod dataset;
mod loader;

pub use blobs::Blobs;
pub use dataset::{Batch, Dataset};
pub use loader::{Batches, DataLoader};
