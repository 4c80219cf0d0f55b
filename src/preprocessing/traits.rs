//! Core traits for preprocessing transformers.
//!
//! - [`Transformer`]: unfitted, holds hyperparameters and learns from data.
//! - [`FittedTransformer`]: learned state, ready to transform batches and to
//!   be persisted.

use crate::backend::Backend;
use crate::preprocessing::error::PreprocessingError;
use crate::serialization::SerializableParams;

/// Unfitted transformer with hyperparameters.
///
/// # Example
/// ```
/// use detector_models::backend::{CpuBackend, Tensor2D};
/// use detector_models::preprocessing::{FittedTransformer, StandardScaler, Transformer};
///
/// let data = Tensor2D::<CpuBackend>::new(vec![0.0, 2.0, 2.0, 4.0], 2, 2);
/// let fitted = StandardScaler::<CpuBackend>::new().fit(&data).unwrap();
/// assert_eq!(fitted.transform(&data).unwrap().to_vec(), vec![-1.0, -1.0, 1.0, 1.0]);
/// ```
pub trait Transformer<B: Backend>: Clone {
    type Input;
    type Output;
    /// Serializable representation of learned parameters.
    type Params: SerializableParams;
    type Fitted: FittedTransformer<
        B,
        Params = Self::Params,
        Input = Self::Input,
        Output = Self::Output,
    >;

    /// Learns parameters from `data`.
    ///
    /// # Errors
    /// [`PreprocessingError::EmptyData`] when `data` has no rows.
    fn fit(&self, data: &Self::Input) -> Result<Self::Fitted, PreprocessingError>;

    fn fit_transform(&self, data: &Self::Input) -> Result<Self::Output, PreprocessingError> {
        self.fit(data)?.transform(data)
    }
}

/// Fitted transformer ready for inference.
///
/// `extract_params` followed by `from_params` reproduces the transformer.
pub trait FittedTransformer<B: Backend>: Clone {
    type Input;
    type Output;
    type Params: SerializableParams;

    /// Transforms data with the learned parameters.
    ///
    /// # Errors
    /// [`PreprocessingError::FeatureMismatch`] when the column count differs
    /// from the one seen during fit.
    fn transform(&self, data: &Self::Input) -> Result<Self::Output, PreprocessingError>;

    /// Reverses [`transform`](FittedTransformer::transform).
    fn inverse_transform(&self, data: &Self::Output) -> Result<Self::Input, PreprocessingError>;

    fn extract_params(&self) -> Self::Params;

    fn from_params(params: Self::Params) -> Result<Self, PreprocessingError>
    where
        Self: Sized;

    /// Writes the learned parameters to `path`.
    fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), PreprocessingError> {
        let bytes = self
            .extract_params()
            .to_bytes()
            .map_err(|e| PreprocessingError::SerializationError(e.to_string()))?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Reads a transformer previously written by `save_to_file`.
    fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, PreprocessingError>
    where
        Self: Sized,
    {
        let bytes = std::fs::read(path)?;
        let params = Self::Params::from_bytes(&bytes)
            .map_err(|e| PreprocessingError::SerializationError(e.to_string()))?;
        Self::from_params(params)
    }

    /// Number of features seen during fit.
    fn n_features_in(&self) -> usize;
}
