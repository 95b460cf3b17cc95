use std::num::NonZeroUsize;

use rand::{rngs::StdRng, seq::SliceRandom};

use super::{Batch, Dataset};

/// Splits a dataset in batches of `batch_size` examples, the last one may be shorter.
///
/// Every call to `iter` starts a new pass over the whole dataset, reshuffling the examples
/// first if the loader was built with `shuffled`.
#[derive(Debug, Clone)]
pub struct DataLoader {
    dataset: Dataset,
    batch_size: NonZeroUsize,
    order: Vec<usize>,
    rng: Option<StdRng>,
}

impl DataLoader {
    pub fn new(dataset: Dataset, batch_size: NonZeroUsize) -> Self {
        Self {
            order: (0..dataset.len()).collect(),
            dataset,
            batch_size,
            rng: None,
        }
    }

    /// Makes the loader reshuffle the examples at the start of every pass.
    pub fn shuffled(mut self, rng: StdRng) -> Self {
        self.rng = Some(rng);
        self
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn batch_size(&self) -> NonZeroUsize {
        self.batch_size
    }

    /// Returns the amount of batches a pass yields.
    pub fn num_batches(&self) -> usize {
        self.dataset.len().div_ceil(self.batch_size.get())
    }

    /// Starts a new pass over the dataset.
    pub fn iter(&mut self) -> Batches<'_> {
        if let Some(rng) = &mut self.rng {
            self.order.shuffle(rng);
        }

        Batches {
            dataset: &self.dataset,
            chunks: self.order.chunks(self.batch_size.get()),
        }
    }
}

/// A single pass of a `DataLoader`.
pub struct Batches<'a> {
    dataset: &'a Dataset,
    chunks: std::slice::Chunks<'a, usize>,
}

impl Iterator for Batches<'_> {
    type Item = Batch;

    fn next(&mut self) -> Option<Self::Item> {
        let indices = self.chunks.next()?;
        Some(self.dataset.batch(indices))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl ExactSizeIterator for Batches<'_> {}
