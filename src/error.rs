use std::fmt;

use machine_learning::MlErr;

/// The result type used across the trainer.
pub type Result<T> = std::result::Result<T, TrainErr>;

/// All errors that can occur while training or evaluating a classifier.
#[derive(Debug)]
pub enum TrainErr {
    /// The model, loss function or optimizer failed.
    Ml(MlErr),
    /// A pass was requested over data that yielded no examples.
    EmptyDataset { what: &'static str },
    /// Invalid configuration, caught before training starts.
    InvalidConfig(String),
    /// The reporter or a config file failed.
    Io(std::io::Error),
    /// A config file is not valid JSON for a `TrainingConfig`.
    Json(serde_json::Error),
}

impl fmt::Display for TrainErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ml(e) => write!(f, "model error: {e}"),
            Self::EmptyDataset { what } => write!(f, "{what} yielded no examples"),
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Self::Io(e) => write!(f, "io error: {e}"),
            Self::Json(e) => write!(f, "malformed config: {e}"),
        }
    }
}

impl std::error::Error for TrainErr {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Ml(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MlErr> for TrainErr {
    fn from(e: MlErr) -> Self {
        Self::Ml(e)
    }
}

impl From<std::io::Error> for TrainErr {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for TrainErr {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}
