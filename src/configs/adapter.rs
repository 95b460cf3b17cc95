use log::info;
use machine_learning::{
    arch::{activations::ActFn, layers::Layer, Sequential},
    dataset::{Blobs, DataLoader, Dataset},
    MlErr,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

use super::{ActFnConfig, DatasetConfig, LayerConfig, ModelConfig, TrainingConfig};
use crate::error::{Result, TrainErr};

/// Turns configs into the pieces of a training run.
///
/// Every random choice (parameter initialization, dropout masks, shuffling and synthetic data) is
/// drawn from a single generator, so a seeded config trains the same way every time.
pub struct Adapter {
    rng: StdRng,
}

impl Adapter {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            rng: generate_rng(seed),
        }
    }

    /// Checks the config is consistent before anything is loaded or built.
    ///
    /// # Errors
    /// `TrainErr::InvalidConfig` describing the first problem found.
    pub fn validate(&self, config: &TrainingConfig) -> Result<()> {
        self.validate_model(&config.model, config.num_classes)?;
        self.validate_training(config)
    }

    // -------------------------------------------------------------------------
    // Validation
    // -------------------------------------------------------------------------

    fn validate_model(&self, model: &ModelConfig, num_classes: usize) -> Result<()> {
        let ModelConfig::Sequential { layers } = model;
        let mut width = None;

        for (i, layer) in layers.iter().enumerate() {
            match *layer {
                LayerConfig::Dense { dim: (n, m), .. } => {
                    if n == 0 || m == 0 {
                        return Err(invalid(format!(
                            "layer {i}: dimensions must be non zero, got ({n}, {m})"
                        )));
                    }

                    if let Some(prev) = width.filter(|&prev| prev != n) {
                        return Err(invalid(format!(
                            "layer {i}: input size ({n}) does not match \
                             previous layer output size ({prev})"
                        )));
                    }

                    width = Some(m);
                }
                LayerConfig::Dropout { p } => {
                    if !(0. ..1.).contains(&p) {
                        return Err(invalid(format!(
                            "layer {i}: dropout probability must be in [0, 1), got {p}"
                        )));
                    }
                }
            }
        }

        match width {
            None => Err(invalid("model must have at least one dense layer".into())),
            Some(m) if m != num_classes => Err(invalid(format!(
                "the last layer outputs {m} scores but there are {num_classes} classes"
            ))),
            Some(_) => Ok(()),
        }
    }

    fn validate_training(&self, config: &TrainingConfig) -> Result<()> {
        if config.num_classes == 0 {
            return Err(invalid("num_classes must be greater than 0".into()));
        }

        let lr = config.learning_rate;
        if !(lr.is_finite() && lr > 0.) {
            return Err(invalid(format!(
                "learning_rate must be finite and positive, got {lr}"
            )));
        }

        let input_width = input_width(&config.model);

        match &config.dataset {
            DatasetConfig::Blobs {
                features,
                train_samples,
                test_samples,
                spread,
            } => {
                if *train_samples == 0 || *test_samples == 0 {
                    return Err(invalid("blobs need train and test samples".into()));
                }

                if !(spread.is_finite() && *spread > 0.) {
                    return Err(invalid(format!(
                        "blobs spread must be finite and positive, got {spread}"
                    )));
                }

                self.validate_features(*features, input_width)
            }
            DatasetConfig::Inline {
                train,
                test,
                x_size,
            } => {
                let row_size = x_size + 1;

                for (what, data) in [("train", train), ("test", test)] {
                    if data.is_empty() {
                        return Err(invalid(format!("{what} dataset must have at least one sample")));
                    }

                    if data.len() % row_size != 0 {
                        return Err(invalid(format!(
                            "{what} dataset length ({}) is not divisible by x_size + 1 ({row_size})",
                            data.len()
                        )));
                    }
                }

                self.validate_features(*x_size, input_width)
            }
            // checked once loaded
            DatasetConfig::Csv { .. } => Ok(()),
        }
    }

    fn validate_features(&self, features: usize, input_width: Option<usize>) -> Result<()> {
        match input_width {
            Some(n) if n != features => Err(invalid(format!(
                "the dataset has {features} features but the model takes {n}"
            ))),
            _ if features == 0 => Err(invalid("the dataset must have at least one feature".into())),
            _ => Ok(()),
        }
    }

    // -------------------------------------------------------------------------
    // Building
    // -------------------------------------------------------------------------

    /// Builds a freshly initialized model scoring `num_classes` classes.
    ///
    /// # Errors
    /// Returns an error if the layers don't chain or the model's output width is not
    /// `num_classes`.
    pub fn adapt_model(
        &mut self,
        model: &ModelConfig,
        num_classes: usize,
    ) -> machine_learning::Result<Sequential> {
        let ModelConfig::Sequential { layers } = model;

        let layers: Vec<Layer> = layers.iter().map(|&l| self.resolve_layer(l)).collect();
        let model = Sequential::new(layers, &mut self.rng)?;

        if model.out_dim() != num_classes {
            return Err(MlErr::SizeMismatch {
                what: "model output classes",
                got: model.out_dim(),
                expected: num_classes,
            });
        }

        Ok(model)
    }

    fn resolve_layer(&mut self, config: LayerConfig) -> Layer {
        match config {
            LayerConfig::Dense { dim, act_fn } => Layer::dense(dim, act_fn.map(resolve_act_fn)),
            LayerConfig::Dropout { p } => Layer::dropout(p, self.rng.random()),
        }
    }

    /// Loads or samples the train and test datasets and wraps them in loaders.
    ///
    /// Only the training loader is shuffled, and only if the config asks for it.
    ///
    /// # Errors
    /// Returns an error if a dataset can't be loaded or its width doesn't fit the model.
    pub fn adapt_datasets(&mut self, config: &TrainingConfig) -> Result<(DataLoader, DataLoader)> {
        let num_classes = config.num_classes;

        let (train, test) = match &config.dataset {
            DatasetConfig::Blobs {
                features,
                train_samples,
                test_samples,
                spread,
            } => {
                let blobs = Blobs::new(*features, num_classes, *spread, &mut self.rng)?;
                let train = blobs.sample(*train_samples, &mut self.rng)?;
                let test = blobs.sample(*test_samples, &mut self.rng)?;
                (train, test)
            }
            DatasetConfig::Csv { train, test } => (
                Dataset::from_csv(train, num_classes)?,
                Dataset::from_csv(test, num_classes)?,
            ),
            DatasetConfig::Inline {
                train,
                test,
                x_size,
            } => (
                Dataset::from_rows(train, *x_size, num_classes)?,
                Dataset::from_rows(test, *x_size, num_classes)?,
            ),
        };

        let input_width = input_width(&config.model);
        self.validate_features(train.num_features(), input_width)?;
        self.validate_features(test.num_features(), input_width)?;

        info!(
            train = train.len(),
            test = test.len(),
            features = train.num_features();
            "datasets loaded"
        );

        let mut train = DataLoader::new(train, config.batch_size);
        if config.shuffle {
            train = train.shuffled(StdRng::seed_from_u64(self.rng.random()));
        }

        let test = DataLoader::new(test, config.batch_size);
        Ok((train, test))
    }
}

fn resolve_act_fn(config: ActFnConfig) -> ActFn {
    match config {
        ActFnConfig::Sigmoid { amp } => ActFn::sigmoid(amp),
        ActFnConfig::Relu => ActFn::relu(),
    }
}

fn input_width(model: &ModelConfig) -> Option<usize> {
    let ModelConfig::Sequential { layers } = model;

    layers.iter().find_map(|layer| match layer {
        LayerConfig::Dense { dim: (n, _), .. } => Some(*n),
        LayerConfig::Dropout { .. } => None,
    })
}

fn generate_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

fn invalid(msg: String) -> TrainErr {
    TrainErr::InvalidConfig(msg)
}
