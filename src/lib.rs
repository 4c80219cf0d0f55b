//! # detector-models
//!
//! Backend-agnostic base layer for trainable anomaly-detection models.
//!
//! A concrete detector implements [`model::TrainableModel`] (build the
//! parameters, run the forward pass, return gradients) and gets the rest from
//! [`model::BaseModel`]:
//!
//! - a preprocessing chain turning host batches into device tensors,
//! - device placement with CPU fallback,
//! - `predict_step` returning per-sample anomaly scores (the loss),
//! - `train_step` running one optimizer update and returning the mean loss,
//! - trainable parameter counting,
//! - snapshots of context and parameters, on disk via bincode.
//!
//! ## Quick Start
//!
//! ```rust
//! use detector_models::backend::{CpuBackend, Device};
//! use detector_models::config::ModelConfig;
//!
//! let config = ModelConfig::default().with_device("cuda");
//! // No GPU on the CPU backend: falls back with a warning.
//! assert_eq!(config.resolve_device::<CpuBackend>().unwrap(), Device::Cpu);
//! ```
//!
//! See [`model::BaseModel`] for a complete model.
//!
//! ## Module Structure
//!
//! - `backend`: tensor abstractions, devices and the CPU / ndarray backends
//! - `model`: the model contract, parameter store, preprocessing chain and base model
//! - `optimizer`: parameter update rules (SGD, Adam)
//! - `preprocessing`: fitted transformers that can join a model's chain
//! - `config`: construction-time settings
//! - `serialization`: byte-level persistence of parameter records
//! - `error`: the crate error type

pub mod backend;

/// Construction-time settings for models and optimizers.
pub mod config;

/// Error type shared by models, optimizers and snapshots.
pub mod error;

/// Trainable model contract and base implementation.
pub mod model;

/// Optimization algorithms for parameter updates.
pub mod optimizer;

/// Data preprocessing transformers.
pub mod preprocessing;

/// Persistence of parameter records.
pub mod serialization;

pub use backend::{Backend, Device, ScalarOps};
#[cfg(feature = "cpu")]
pub use backend::CpuBackend;
#[cfg(feature = "ndarray-backend")]
pub use backend::NdarrayBackend;
pub use config::{ModelConfig, OptimizerConfig};
pub use error::ModelError;
pub use model::{BaseModel, ForwardOutput, ModelContext, ModelSnapshot, TrainableModel};
