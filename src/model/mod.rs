//! Trainable model contract and the shared base that drives it.
//!
//! A concrete model implements [`TrainableModel`]: it builds its parameters
//! in [`init_model`](TrainableModel::init_model), computes outputs and a
//! per-sample loss in [`forward`](TrainableModel::forward), and returns
//! parameter gradients from [`backward`](TrainableModel::backward).
//! [`BaseModel`] wraps it with everything models have in common:
//! preprocessing, device placement, the predict/train step, parameter
//! counting and snapshots.

use crate::backend::{Backend, Device, Tensor1D, Tensor2D};
use crate::error::ModelError;
use crate::optimizer::Optimizer;

pub mod base;
pub mod context;
pub mod params;
pub mod preprocess;

pub use base::{BaseModel, ModelSnapshot};
pub use context::ModelContext;
pub use params::{Param, ParamStore, StateDict, TensorRecord};
pub use preprocess::{default_preprocessors, run_chain, Batch, Preprocessor, TensorTransform};

/// Result of one forward pass.
#[derive(Clone, Debug)]
pub struct ForwardOutput<B: Backend> {
    /// Model output, one row per sample.
    pub output: Tensor2D<B>,
    /// Per-sample loss. `None` when this pass produces no loss (for example
    /// while a model is still warming up), in which case no update happens.
    pub loss: Option<Tensor1D<B>>,
}

impl<B: Backend> ForwardOutput<B> {
    pub fn new(output: Tensor2D<B>, loss: Tensor1D<B>) -> Self {
        Self {
            output,
            loss: Some(loss),
        }
    }

    pub fn without_loss(output: Tensor2D<B>) -> Self {
        Self { output, loss: None }
    }
}

/// Hooks a concrete model provides to [`BaseModel`].
pub trait TrainableModel<B: Backend>: Sized + Send {
    /// Builds the network for `context` with parameters placed on `device`.
    fn init_model(context: &ModelContext, device: Device) -> Result<Self, ModelError>;

    /// Runs the network on a preprocessed batch.
    ///
    /// `inference` is `true` from `predict_step` and `false` from `train_step`.
    fn forward(&self, x: &Tensor2D<B>, inference: bool) -> Result<ForwardOutput<B>, ModelError>;

    /// Gradient of `Σᵢ grad_loss[i] · loss[i]` with respect to each parameter,
    /// keyed by parameter name. Parameters without an entry are not updated.
    fn backward(&self, x: &Tensor2D<B>, grad_loss: &Tensor1D<B>) -> Result<ParamStore<B>, ModelError>;

    fn params(&self) -> &ParamStore<B>;

    fn params_mut(&mut self) -> &mut ParamStore<B>;

    /// Optimizer used when the configuration does not name one.
    fn init_optimizer(&self, _context: &ModelContext) -> Option<Box<dyn Optimizer<B>>> {
        None
    }

    /// Display name; the unqualified type name unless overridden.
    fn name(&self) -> &'static str {
        let full = std::any::type_name::<Self>();
        let base = full.split('<').next().unwrap_or(full);
        base.rsplit("::").next().unwrap_or(base)
    }
}
