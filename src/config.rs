//! Construction-time settings for [`BaseModel`](crate::model::BaseModel).

use crate::backend::{Backend, Device};
use crate::error::ModelError;
use crate::optimizer::{Adam, Optimizer, SGD};
use serde::{Deserialize, Serialize};

/// Settings applied when a model is built or restored.
///
/// # Example
/// ```
/// use detector_models::config::{ModelConfig, OptimizerConfig};
///
/// let config = ModelConfig::default()
///     .with_device("cuda:0")
///     .with_fallback_to_cpu(true)
///     .with_optimizer(OptimizerConfig::adam(1e-3));
/// assert_eq!(config.device, "cuda:0");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Device string: `"cpu"`, `"cuda"` or `"cuda:N"`.
    pub device: String,
    /// Place the model on the CPU when `device` is not available instead of
    /// failing.
    pub fallback_to_cpu: bool,
    /// Optimizer to attach. `None` defers to the model's own
    /// [`init_optimizer`](crate::model::TrainableModel::init_optimizer).
    pub optimizer: Option<OptimizerConfig>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            device: "cpu".to_string(),
            fallback_to_cpu: true,
            optimizer: None,
        }
    }
}

impl ModelConfig {
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = device.into();
        self
    }

    pub fn with_fallback_to_cpu(mut self, fallback: bool) -> Self {
        self.fallback_to_cpu = fallback;
        self
    }

    pub fn with_optimizer(mut self, optimizer: OptimizerConfig) -> Self {
        self.optimizer = Some(optimizer);
        self
    }

    /// Parses the device string.
    ///
    /// # Errors
    /// [`ModelError::InvalidDevice`] for an unrecognized string.
    pub fn parsed_device(&self) -> Result<Device, ModelError> {
        self.device.parse()
    }

    /// Picks the device the model will live on.
    ///
    /// # Errors
    /// - [`ModelError::InvalidDevice`] for an unrecognized string
    /// - [`ModelError::DeviceUnavailable`] when the backend cannot reach the
    ///   device and `fallback_to_cpu` is off
    pub fn resolve_device<B: Backend>(&self) -> Result<Device, ModelError> {
        let requested = self.parsed_device()?;
        if B::is_available(requested) {
            log::info!("Using device {} on {}", requested, B::name());
            return Ok(requested);
        }
        if self.fallback_to_cpu && B::is_available(Device::Cpu) {
            log::warn!(
                "Device {} not available on {}, falling back to cpu",
                requested,
                B::name()
            );
            return Ok(Device::Cpu);
        }
        Err(ModelError::DeviceUnavailable {
            device: requested.to_string(),
            backend: B::name().to_string(),
        })
    }
}

/// Optimizer choice and hyperparameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum OptimizerConfig {
    Sgd {
        lr: f64,
    },
    Adam {
        lr: f64,
        beta1: f64,
        beta2: f64,
        eps: f64,
        weight_decay: f64,
    },
}

impl OptimizerConfig {
    pub fn sgd(lr: f64) -> Self {
        OptimizerConfig::Sgd { lr }
    }

    /// Adam with `β₁ = 0.9`, `β₂ = 0.999`, `ε = 1e-8` and no weight decay.
    pub fn adam(lr: f64) -> Self {
        OptimizerConfig::Adam {
            lr,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
            weight_decay: 0.0,
        }
    }

    pub fn learning_rate(&self) -> f64 {
        match self {
            OptimizerConfig::Sgd { lr } | OptimizerConfig::Adam { lr, .. } => *lr,
        }
    }

    /// Instantiates the optimizer for backend `B`.
    pub fn build<B: Backend>(&self) -> Box<dyn Optimizer<B>> {
        match *self {
            OptimizerConfig::Sgd { lr } => Box::new(SGD::<B>::new(lr)),
            OptimizerConfig::Adam {
                lr,
                beta1,
                beta2,
                eps,
                weight_decay,
            } => Box::new(
                Adam::<B>::new(lr)
                    .with_betas(beta1, beta2)
                    .with_eps(eps)
                    .with_weight_decay(weight_decay),
            ),
        }
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig::adam(1e-3)
    }
}
