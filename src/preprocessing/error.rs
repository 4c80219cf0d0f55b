//! Error types for preprocessing operations.

use std::fmt;

/// Error type for preprocessing operations.
#[derive(Debug)]
pub enum PreprocessingError {
    /// Shape mismatch between expected and actual tensor dimensions.
    InvalidShape { expected: String, got: String },
    /// Serialization or deserialization error.
    SerializationError(String),
    /// I/O error during file operations.
    IoError(String),
    /// Empty data provided where non-empty was required.
    EmptyData(String),
    /// Feature dimension mismatch.
    FeatureMismatch {
        expected_features: usize,
        got_features: usize,
    },
}

impl fmt::Display for PreprocessingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreprocessingError::InvalidShape { expected, got } => {
                write!(f, "Invalid shape: expected {}, got {}", expected, got)
            }
            PreprocessingError::SerializationError(msg) => {
                write!(f, "Serialization error: {}", msg)
            }
            PreprocessingError::IoError(msg) => write!(f, "I/O error: {}", msg),
            PreprocessingError::EmptyData(msg) => write!(f, "Empty data: {}", msg),
            PreprocessingError::FeatureMismatch {
                expected_features,
                got_features,
            } => write!(
                f,
                "Feature mismatch: expected {} features, got {}",
                expected_features, got_features
            ),
        }
    }
}

impl std::error::Error for PreprocessingError {}

impl From<std::io::Error> for PreprocessingError {
    fn from(err: std::io::Error) -> Self {
        PreprocessingError::IoError(err.to_string())
    }
}

impl From<bincode::Error> for PreprocessingError {
    fn from(err: bincode::Error) -> Self {
        PreprocessingError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_shape() {
        let err = PreprocessingError::InvalidShape {
            expected: "(2, 3)".to_string(),
            got: "(3, 2)".to_string(),
        };
        assert!(err.to_string().contains("Invalid shape"));
    }

    #[test]
    fn test_error_display_feature_mismatch() {
        let err = PreprocessingError::FeatureMismatch {
            expected_features: 5,
            got_features: 3,
        };
        assert_eq!(
            err.to_string(),
            "Feature mismatch: expected 5 features, got 3"
        );
    }

    #[test]
    fn test_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "scaler.bin");
        let err: PreprocessingError = io_err.into();
        assert!(matches!(err, PreprocessingError::IoError(_)));
    }

    #[test]
    fn test_error_from_bincode_error() {
        let bad_bytes: &[u8] = &[0xff, 0xff, 0xff, 0xff];
        let result: Result<String, bincode::Error> = bincode::deserialize(bad_bytes);
        if let Err(e) = result {
            let err: PreprocessingError = e.into();
            assert!(matches!(err, PreprocessingError::SerializationError(_)));
        }
    }
}
