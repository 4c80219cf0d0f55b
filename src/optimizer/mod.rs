//! Parameter update rules.
//!
//! An optimizer receives the model's [`ParamStore`] and a gradient store keyed
//! by the same names, and updates trainable parameters in place. Frozen
//! parameters are never touched.

use crate::backend::Backend;
use crate::error::ModelError;
use crate::model::ParamStore;

pub mod adam;
pub mod sgd;

pub use adam::Adam;
pub use sgd::SGD;

/// Gradient-based optimizer.
///
/// Gradients are fresh values produced by the model's `backward`, so there
/// is no accumulated buffer to clear between steps.
///
/// # Example
/// ```
/// use detector_models::backend::{CpuBackend, Tensor1D};
/// use detector_models::model::{Param, ParamStore};
/// use detector_models::optimizer::{Optimizer, SGD};
///
/// let mut params = ParamStore::<CpuBackend>::new();
/// params.insert("w", Param::new(Tensor1D::new(vec![1.0, 2.0])));
/// let mut grads = ParamStore::<CpuBackend>::new();
/// grads.insert_tensor("w", Tensor1D::new(vec![1.0, -1.0]));
///
/// let mut sgd = SGD::<CpuBackend>::new(0.5);
/// sgd.step(&mut params, &grads).unwrap();
/// assert_eq!(params.tensor("w").unwrap().to_vec(), vec![0.5, 2.5]);
/// ```
pub trait Optimizer<B: Backend>: Send {
    /// Applies one update.
    ///
    /// # Errors
    /// - [`ModelError::MissingParameter`] for a gradient with no parameter
    /// - [`ModelError::ShapeMismatch`] for a gradient of the wrong length
    ///
    /// Validation happens before any parameter is written.
    fn step(&mut self, params: &mut ParamStore<B>, grads: &ParamStore<B>) -> Result<(), ModelError>;

    fn learning_rate(&self) -> f64;

    /// Short name used in logs and `Display` output.
    fn name(&self) -> &'static str;
}

/// Checks that every gradient names an existing parameter of the same length.
pub(crate) fn check_gradients<B: Backend>(
    params: &ParamStore<B>,
    grads: &ParamStore<B>,
) -> Result<(), ModelError> {
    for (name, grad) in grads.iter() {
        let param = params
            .get(name)
            .ok_or_else(|| ModelError::MissingParameter(name.to_string()))?;
        if param.numel() != grad.numel() {
            return Err(ModelError::ShapeMismatch {
                name: name.to_string(),
                expected: param.shape().to_vec(),
                got: vec![grad.numel()],
            });
        }
    }
    Ok(())
}
