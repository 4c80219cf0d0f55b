use super::context::ModelContext;
use super::params::StateDict;
use super::preprocess::{default_preprocessors, run_chain, Batch, Preprocessor};
use super::TrainableModel;
use crate::backend::{Backend, Device, Tensor1D, Tensor2D};
use crate::config::ModelConfig;
use crate::error::ModelError;
use crate::optimizer::Optimizer;
use crate::serialization::SerializableParams;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Everything needed to rebuild a model: its architecture inputs and its
/// learned parameters.
///
/// Optimizer state and the preprocessing chain are not captured; a restored
/// model gets the optimizer its configuration names and the default chain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    /// Display name of the model type that produced the snapshot.
    pub name: String,
    pub context: ModelContext,
    /// Device string the model lived on.
    pub device: String,
    pub model_state_dict: StateDict,
}

/// A trainable model together with its context, device, optimizer and
/// preprocessing chain.
///
/// # Example
/// ```
/// use detector_models::backend::{CpuBackend, Device, Scalar, Tensor1D, Tensor2D};
/// use detector_models::config::{ModelConfig, OptimizerConfig};
/// use detector_models::error::ModelError;
/// use detector_models::model::{
///     BaseModel, ForwardOutput, ModelContext, Param, ParamStore, TrainableModel,
/// };
/// use ndarray::array;
///
/// /// Squared distance of each sample to a learned offset.
/// struct Offset {
///     params: ParamStore<CpuBackend>,
/// }
///
/// impl TrainableModel<CpuBackend> for Offset {
///     fn init_model(ctx: &ModelContext, _device: Device) -> Result<Self, ModelError> {
///         let mut params = ParamStore::new();
///         params.insert("offset", Param::new(Tensor1D::zeros(ctx.n_features)));
///         Ok(Self { params })
///     }
///
///     fn forward(
///         &self,
///         x: &Tensor2D<CpuBackend>,
///         _inference: bool,
///     ) -> Result<ForwardOutput<CpuBackend>, ModelError> {
///         let diff = x.broadcast_sub_row(self.params.tensor("offset")?);
///         let loss = diff.mul(&diff).row_sum();
///         Ok(ForwardOutput::new(diff, loss))
///     }
///
///     fn backward(
///         &self,
///         x: &Tensor2D<CpuBackend>,
///         grad_loss: &Tensor1D<CpuBackend>,
///     ) -> Result<ParamStore<CpuBackend>, ModelError> {
///         let diff = x.broadcast_sub_row(self.params.tensor("offset")?);
///         let mut grads = ParamStore::new();
///         grads.insert_tensor("offset", diff.tdot(grad_loss).scale(&Scalar::new(-2.0)));
///         Ok(grads)
///     }
///
///     fn params(&self) -> &ParamStore<CpuBackend> {
///         &self.params
///     }
///
///     fn params_mut(&mut self) -> &mut ParamStore<CpuBackend> {
///         &mut self.params
///     }
/// }
///
/// let config = ModelConfig::default().with_optimizer(OptimizerConfig::sgd(0.1));
/// let mut model = BaseModel::<CpuBackend, Offset>::new(ModelContext::new(2), &config).unwrap();
/// assert_eq!(model.to_string(), "Offset");
/// assert_eq!(model.total_params(), 2);
///
/// let loss = model.train_step(array![[1.0, 1.0], [1.0, 1.0]]).unwrap();
/// assert_eq!(loss, Some(2.0));
/// ```
pub struct BaseModel<B: Backend, M: TrainableModel<B>> {
    network: M,
    context: ModelContext,
    device: Device,
    optimizer: Option<Box<dyn Optimizer<B>>>,
    preprocessors: Vec<Preprocessor<B>>,
}

impl<B: Backend, M: TrainableModel<B>> BaseModel<B, M> {
    /// Resolves the device, builds the network and attaches the optimizer.
    ///
    /// The optimizer comes from `config.optimizer` when set, otherwise from
    /// [`TrainableModel::init_optimizer`]. The preprocessing chain starts as
    /// `[ToTensor, ToDevice]`.
    ///
    /// # Errors
    /// Device resolution errors (see [`ModelConfig::resolve_device`]) and any
    /// error from `init_model`.
    pub fn new(context: ModelContext, config: &ModelConfig) -> Result<Self, ModelError> {
        let device = config.resolve_device::<B>()?;
        let mut network = M::init_model(&context, device)?;
        let placed = network.params().to_device(device)?;
        *network.params_mut() = placed;

        let optimizer = match &config.optimizer {
            Some(opt) => Some(opt.build::<B>()),
            None => network.init_optimizer(&context),
        };

        log::info!(
            "Initialized {} ({} trainable parameters) on {} with optimizer {}",
            network.name(),
            network.params().trainable_numel(),
            device,
            optimizer.as_ref().map_or("none", |o| o.name()),
        );

        Ok(Self {
            network,
            context,
            device,
            optimizer,
            preprocessors: default_preprocessors(),
        })
    }

    /// Runs `x` through the preprocessing chain. An empty chain returns the
    /// batch unchanged.
    pub fn preprocess(&self, x: impl Into<Batch<B>>) -> Result<Batch<B>, ModelError> {
        run_chain(&self.preprocessors, x.into(), self.device)
    }

    /// Host array to backend tensor at `f32` precision.
    pub fn to_tensor(&self, x: &Array2<f64>) -> Tensor2D<B> {
        Tensor2D::from_array(x)
    }

    /// Copy of `x` on this model's device.
    pub fn to_device(&self, x: &Tensor2D<B>) -> Result<Tensor2D<B>, ModelError> {
        x.to_device(self.device)
    }

    /// Per-sample values back on the host.
    pub fn to_host(&self, t: &Tensor1D<B>) -> Array1<f64> {
        Array1::from(t.to_vec())
    }

    pub fn to_host_2d(&self, t: &Tensor2D<B>) -> Array2<f64> {
        t.to_array()
    }

    fn prepare(&self, x: impl Into<Batch<B>>) -> Result<Tensor2D<B>, ModelError> {
        self.preprocess(x)?.into_tensor()
    }

    /// Per-sample loss of `x` in inference mode, or `None` when the model
    /// produces no loss. Never updates parameters.
    pub fn predict_step(&self, x: impl Into<Batch<B>>) -> Result<Option<Array1<f64>>, ModelError> {
        let x = self.prepare(x)?;
        let out = self.network.forward(&x, true)?;
        Ok(out.loss.map(|loss| self.to_host(&loss)))
    }

    /// One optimization step on `x`.
    ///
    /// Returns the mean loss before the update, or `None` (and leaves the
    /// parameters untouched) when the forward pass produces no loss.
    ///
    /// # Errors
    /// - [`ModelError::MissingOptimizer`] when a loss is produced but no
    ///   optimizer is attached
    /// - [`ModelError::InvalidInput`] for an empty loss
    /// - [`ModelError::ShapeMismatch`] when the loss length differs from the
    ///   batch size
    /// - anything raised by preprocessing, `forward`, `backward` or the
    ///   optimizer
    pub fn train_step(&mut self, x: impl Into<Batch<B>>) -> Result<Option<f64>, ModelError> {
        let x = self.prepare(x)?;
        let out = self.network.forward(&x, false)?;
        let Some(loss) = out.loss else {
            log::debug!("{} produced no loss, skipping update", self.network.name());
            return Ok(None);
        };

        let n = loss.len();
        if n == 0 {
            return Err(ModelError::InvalidInput(
                "forward returned an empty loss".to_string(),
            ));
        }
        if n != x.rows() {
            return Err(ModelError::ShapeMismatch {
                name: "loss".to_string(),
                expected: vec![x.rows()],
                got: vec![n],
            });
        }
        let optimizer = self.optimizer.as_mut().ok_or(ModelError::MissingOptimizer)?;

        let mean = loss.mean().to_f64();
        let grad_loss = Tensor1D::full(n, 1.0 / n as f64);
        let grads = self.network.backward(&x, &grad_loss)?;
        optimizer.step(self.network.params_mut(), &grads)?;

        log::debug!("{} train loss {:.6} over {} samples", self.network.name(), mean, n);
        Ok(Some(mean))
    }

    /// Number of scalar elements across trainable parameters.
    pub fn total_params(&self) -> usize {
        self.network.params().trainable_numel()
    }

    pub fn state_dict(&self) -> StateDict {
        self.network.params().state_dict()
    }

    /// Strictly loads `dict` into the network, placing values on this
    /// model's device. Nothing changes on error.
    pub fn load_state_dict(&mut self, dict: &StateDict) -> Result<(), ModelError> {
        let device = self.device;
        self.network.params_mut().load_state_dict(dict, device)
    }

    pub fn snapshot(&self) -> ModelSnapshot {
        ModelSnapshot {
            name: self.network.name().to_string(),
            context: self.context.clone(),
            device: self.device.to_string(),
            model_state_dict: self.state_dict(),
        }
    }

    /// Rebuilds a model from a snapshot.
    ///
    /// The snapshot's device is requested again; `config` supplies the CPU
    /// fallback policy and the optimizer.
    ///
    /// # Errors
    /// - [`ModelError::InvalidInput`] if the snapshot came from another model type
    /// - device resolution errors, `init_model` errors
    /// - strict state dict loading errors
    pub fn from_snapshot(snapshot: ModelSnapshot, config: &ModelConfig) -> Result<Self, ModelError> {
        let config = config.clone().with_device(snapshot.device.clone());
        let mut model = Self::new(snapshot.context, &config)?;
        if model.network.name() != snapshot.name {
            return Err(ModelError::InvalidInput(format!(
                "snapshot of {} cannot restore {}",
                snapshot.name,
                model.network.name()
            )));
        }
        model.load_state_dict(&snapshot.model_state_dict)?;
        Ok(model)
    }

    /// Writes [`snapshot`](Self::snapshot) to `path` with bincode.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ModelError> {
        let bytes = self.snapshot().to_bytes()?;
        std::fs::write(path.as_ref(), bytes)?;
        log::info!("Saved {} to {}", self.network.name(), path.as_ref().display());
        Ok(())
    }

    /// Reads a file written by [`save_to_file`](Self::save_to_file).
    pub fn load_from_file<P: AsRef<Path>>(path: P, config: &ModelConfig) -> Result<Self, ModelError> {
        let bytes = std::fs::read(path.as_ref())?;
        let snapshot = ModelSnapshot::from_bytes(&bytes)?;
        let model = Self::from_snapshot(snapshot, config)?;
        log::info!("Loaded {} from {}", model.network.name(), path.as_ref().display());
        Ok(model)
    }

    pub fn network(&self) -> &M {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut M {
        &mut self.network
    }

    pub fn context(&self) -> &ModelContext {
        &self.context
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn optimizer(&self) -> Option<&dyn Optimizer<B>> {
        self.optimizer.as_deref()
    }

    pub fn set_optimizer(&mut self, optimizer: Box<dyn Optimizer<B>>) {
        self.optimizer = Some(optimizer);
    }

    pub fn preprocessors(&self) -> &[Preprocessor<B>] {
        &self.preprocessors
    }

    pub fn preprocessors_mut(&mut self) -> &mut Vec<Preprocessor<B>> {
        &mut self.preprocessors
    }

    /// Appends a step to the end of the chain.
    pub fn push_preprocessor(&mut self, step: Preprocessor<B>) {
        self.preprocessors.push(step);
    }
}

impl<B: Backend, M: TrainableModel<B>> fmt::Display for BaseModel<B, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.network.name())
    }
}
