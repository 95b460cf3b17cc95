use std::{
    error::Error,
    fmt::{self, Display},
    io,
};

use ndarray::ShapeError;
use rand_distr::{NormalError, uniform::Error as UniformError};

/// The result type used in the entire machine learning module.
pub type Result<T> = std::result::Result<T, MlErr>;

/// The machine learning module's error type.
#[derive(Debug)]
pub enum MlErr {
    SizeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    InvalidLabel {
        label: usize,
        num_classes: usize,
    },
    InvalidLayer {
        index: usize,
        reason: String,
    },
    GradDisabled,
    MissingForward,
    Shape(ShapeError),
    Init(String),
    Parse {
        line: usize,
        reason: String,
    },
    Io(io::Error),
}

impl Display for MlErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MlErr::SizeMismatch {
                what,
                got,
                expected,
            } => write!(f, "size mismatch for {what}: got {got}, expected {expected}"),
            MlErr::InvalidLabel { label, num_classes } => write!(
                f,
                "label {label} is out of range for a model with {num_classes} classes"
            ),
            MlErr::InvalidLayer { index, reason } => write!(f, "layer {index}: {reason}"),
            MlErr::GradDisabled => {
                write!(f, "tried to run a backward pass while gradient tracking is disabled")
            }
            MlErr::MissingForward => {
                write!(f, "backward pass requested without a recorded forward pass")
            }
            MlErr::Shape(e) => write!(f, "shape error: {e}"),
            MlErr::Init(msg) => write!(f, "failed to initialize parameters: {msg}"),
            MlErr::Parse { line, reason } => write!(f, "dataset line {line}: {reason}"),
            MlErr::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl Error for MlErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MlErr::Io(e) => Some(e),
            MlErr::Shape(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for MlErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ShapeError> for MlErr {
    fn from(value: ShapeError) -> Self {
        Self::Shape(value)
    }
}

impl From<NormalError> for MlErr {
    fn from(value: NormalError) -> Self {
        Self::Init(value.to_string())
    }
}

impl From<UniformError> for MlErr {
    fn from(value: UniformError) -> Self {
        Self::Init(value.to_string())
    }
}
