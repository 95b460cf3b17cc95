use std::{
    fs::File,
    io::BufReader,
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use super::{ActFnConfig, LayerConfig, ModelConfig};
use crate::{
    error::Result,
    training::{LEARNING_RATE, NUM_EPOCHS},
};

const BATCH_SIZE: NonZeroUsize = NonZeroUsize::new(32).unwrap();

/// Where the train and test examples come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetConfig {
    /// Gaussian blobs around random class centers.
    Blobs {
        features: usize,
        train_samples: usize,
        test_samples: usize,
        spread: f32,
    },
    /// CSV files, one example per line with its label last.
    Csv { train: PathBuf, test: PathBuf },
    /// Flat rows of `x_size` features followed by the label.
    Inline {
        train: Vec<f32>,
        test: Vec<f32>,
        x_size: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub model: ModelConfig,
    pub dataset: DatasetConfig,
    pub num_classes: usize,
    #[serde(default = "default_epochs")]
    pub epochs: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: NonZeroUsize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f32,
    #[serde(default)]
    pub shuffle: bool,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_color")]
    pub color: bool,
}

impl TrainingConfig {
    /// Reads a JSON config file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for TrainingConfig {
    /// Three well separated blobs in the plane and a small perceptron.
    fn default() -> Self {
        Self {
            model: ModelConfig::Sequential {
                layers: vec![
                    LayerConfig::Dense {
                        dim: (2, 16),
                        act_fn: Some(ActFnConfig::Relu),
                    },
                    LayerConfig::Dense {
                        dim: (16, 3),
                        act_fn: None,
                    },
                ],
            },
            dataset: DatasetConfig::Blobs {
                features: 2,
                train_samples: 600,
                test_samples: 150,
                spread: 4.,
            },
            num_classes: 3,
            epochs: default_epochs(),
            batch_size: default_batch_size(),
            learning_rate: default_learning_rate(),
            shuffle: true,
            seed: None,
            color: default_color(),
        }
    }
}

fn default_epochs() -> usize {
    NUM_EPOCHS
}

fn default_batch_size() -> NonZeroUsize {
    BATCH_SIZE
}

fn default_learning_rate() -> f32 {
    LEARNING_RATE
}

fn default_color() -> bool {
    true
}
