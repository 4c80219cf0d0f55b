//! Error type shared by models, optimizers and snapshots.

use crate::preprocessing::PreprocessingError;
use std::fmt;

/// Error type for model construction, stepping and persistence.
#[derive(Debug)]
pub enum ModelError {
    /// A device string could not be parsed.
    InvalidDevice(String),
    /// The backend cannot place tensors on the requested device.
    DeviceUnavailable { device: String, backend: String },
    /// A preprocessing chain finished (or a step ran) on host data instead of a tensor.
    NotATensor(String),
    /// `train_step` produced a loss but no optimizer is configured.
    MissingOptimizer,
    /// A named parameter was expected but is absent.
    MissingParameter(String),
    /// A state dict carried a parameter the model does not know.
    UnexpectedParameter(String),
    /// Parameter, gradient or input dimensions disagree.
    ShapeMismatch {
        name: String,
        expected: Vec<usize>,
        got: Vec<usize>,
    },
    /// Input data rejected before reaching the backend.
    InvalidInput(String),
    /// Error raised by a preprocessing transformer.
    Preprocessing(PreprocessingError),
    /// Serialization or deserialization error.
    Serialization(String),
    /// I/O error during file operations.
    Io(String),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::InvalidDevice(raw) => write!(f, "Invalid device: {:?}", raw),
            ModelError::DeviceUnavailable { device, backend } => {
                write!(f, "Device {} is not available on backend {}", device, backend)
            }
            ModelError::NotATensor(msg) => write!(f, "Expected tensor input: {}", msg),
            ModelError::MissingOptimizer => {
                write!(f, "Missing optimizer: train_step needs an optimizer to apply gradients")
            }
            ModelError::MissingParameter(name) => write!(f, "Missing parameter: {}", name),
            ModelError::UnexpectedParameter(name) => {
                write!(f, "Unexpected parameter: {}", name)
            }
            ModelError::ShapeMismatch {
                name,
                expected,
                got,
            } => write!(
                f,
                "Shape mismatch for {}: expected {:?}, got {:?}",
                name, expected, got
            ),
            ModelError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            ModelError::Preprocessing(err) => write!(f, "Preprocessing failed: {}", err),
            ModelError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            ModelError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelError::Preprocessing(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PreprocessingError> for ModelError {
    fn from(err: PreprocessingError) -> Self {
        ModelError::Preprocessing(err)
    }
}

impl From<std::io::Error> for ModelError {
    fn from(err: std::io::Error) -> Self {
        ModelError::Io(err.to_string())
    }
}

impl From<bincode::Error> for ModelError {
    fn from(err: bincode::Error) -> Self {
        ModelError::Serialization(err.to_string())
    }
}
