//! Fitted data transformers that can sit in a model's preprocessing chain.
//!
//! Transformers follow a fit-then-transform split: a [`Transformer`] carries
//! hyperparameters, [`Transformer::fit`] returns a [`FittedTransformer`] that
//! holds learned state and can be saved, loaded and plugged into
//! [`BaseModel::push_preprocessor`](crate::model::BaseModel::push_preprocessor).
//!
//! # Example
//!
//! ```
//! use detector_models::backend::{CpuBackend, Tensor2D};
//! use detector_models::preprocessing::{FittedTransformer, StandardScaler, Transformer};
//!
//! let train = Tensor2D::<CpuBackend>::new(vec![1.0, 10.0, 3.0, 30.0], 2, 2);
//! let scaler = StandardScaler::<CpuBackend>::new().fit(&train).unwrap();
//! assert_eq!(scaler.n_features_in(), 2);
//! ```

pub mod error;
pub mod scaling;
pub mod traits;

pub use error::PreprocessingError;
pub use scaling::{
    FittedStandardScaler, StandardScaler, StandardScalerConfig, StandardScalerParams,
};
pub use traits::{FittedTransformer, Transformer};
