use super::{check_gradients, Optimizer};
use crate::backend::{Backend, Scalar};
use crate::error::ModelError;
use crate::model::ParamStore;

/// Stochastic gradient descent.
///
/// ```text
/// θ ← θ - η · ∇L(θ)
/// ```
#[derive(Clone, Debug)]
pub struct SGD<B: Backend> {
    lr: Scalar<B>,
}

impl<B: Backend> SGD<B> {
    pub fn new(lr: f64) -> Self {
        Self {
            lr: Scalar::new(lr),
        }
    }
}

impl<B: Backend> Optimizer<B> for SGD<B> {
    fn step(&mut self, params: &mut ParamStore<B>, grads: &ParamStore<B>) -> Result<(), ModelError> {
        check_gradients(params, grads)?;
        for (name, grad) in grads.iter() {
            let Some(param) = params.get_mut(name) else {
                continue;
            };
            if !param.is_trainable() {
                continue;
            }
            let updated = param.value().sub(&grad.value().scale(&self.lr));
            param.set_value(updated)?;
        }
        Ok(())
    }

    fn learning_rate(&self) -> f64 {
        self.lr.to_f64()
    }

    fn name(&self) -> &'static str {
        "SGD"
    }
}
