//! Small detectors used to drive `BaseModel` in integration tests.

#![allow(dead_code)]

use detector_models::backend::{Backend, Device, Scalar, Tensor1D, Tensor2D};
use detector_models::model::{ForwardOutput, ModelContext, Param, ParamStore, TrainableModel};
use detector_models::optimizer::{Optimizer, SGD};
use detector_models::ModelError;

/// Scores each sample by its scaled mean squared distance to a learned center:
///
/// ```text
/// loss_i = s / d · Σ_j (x_ij - c_j)²
/// ```
///
/// `c` is trainable, `s` is a frozen scale read from the `scale` attribute.
pub struct CenterNet<B: Backend> {
    params: ParamStore<B>,
    n_features: usize,
}

impl<B: Backend> CenterNet<B> {
    fn diff(&self, x: &Tensor2D<B>) -> Result<Tensor2D<B>, ModelError> {
        if x.cols() != self.n_features {
            return Err(ModelError::ShapeMismatch {
                name: "input".to_string(),
                expected: vec![self.n_features],
                got: vec![x.cols()],
            });
        }
        Ok(x.broadcast_sub_row(self.params.tensor("center")?))
    }

    fn scale(&self) -> Result<f64, ModelError> {
        Ok(self.params.tensor("scale")?.to_vec()[0])
    }

    pub fn center(&self) -> Vec<f64> {
        self.params.tensor("center").map(|t| t.to_vec()).unwrap_or_default()
    }
}

impl<B: Backend> TrainableModel<B> for CenterNet<B> {
    fn init_model(context: &ModelContext, _device: Device) -> Result<Self, ModelError> {
        let scale = context.attr_parsed::<f32>("scale")?.unwrap_or(1.0);
        let mut params = ParamStore::new();
        params.insert("center", Param::new(Tensor1D::zeros(context.n_features)));
        params.insert("scale", Param::new(Tensor1D::new(vec![scale])).frozen());
        Ok(Self {
            params,
            n_features: context.n_features,
        })
    }

    fn forward(&self, x: &Tensor2D<B>, _inference: bool) -> Result<ForwardOutput<B>, ModelError> {
        let diff = self.diff(x)?;
        let factor = Scalar::new(self.scale()? / self.n_features as f64);
        let loss = diff.mul(&diff).row_sum().scale(&factor);
        Ok(ForwardOutput::new(diff, loss))
    }

    fn backward(&self, x: &Tensor2D<B>, grad_loss: &Tensor1D<B>) -> Result<ParamStore<B>, ModelError> {
        let diff = self.diff(x)?;
        let factor = Scalar::new(-2.0 * self.scale()? / self.n_features as f64);
        let mut grads = ParamStore::new();
        grads.insert_tensor("center", diff.tdot(grad_loss).scale(&factor));
        Ok(grads)
    }

    fn params(&self) -> &ParamStore<B> {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamStore<B> {
        &mut self.params
    }

    fn init_optimizer(&self, context: &ModelContext) -> Option<Box<dyn Optimizer<B>>> {
        let lr = context.attr_parsed::<f64>("lr").ok().flatten()?;
        Some(Box::new(SGD::<B>::new(lr)))
    }
}

/// Never produces a loss.
pub struct SilentNet<B: Backend> {
    params: ParamStore<B>,
}

impl<B: Backend> TrainableModel<B> for SilentNet<B> {
    fn init_model(context: &ModelContext, _device: Device) -> Result<Self, ModelError> {
        let mut params = ParamStore::new();
        params.insert("weight", Param::new(Tensor1D::full(context.n_features, 0.5)));
        Ok(Self { params })
    }

    fn forward(&self, x: &Tensor2D<B>, _inference: bool) -> Result<ForwardOutput<B>, ModelError> {
        Ok(ForwardOutput::without_loss(x.clone()))
    }

    fn backward(&self, _x: &Tensor2D<B>, _grad_loss: &Tensor1D<B>) -> Result<ParamStore<B>, ModelError> {
        Err(ModelError::InvalidInput("SilentNet has no loss to differentiate".to_string()))
    }

    fn params(&self) -> &ParamStore<B> {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamStore<B> {
        &mut self.params
    }

    fn name(&self) -> &'static str {
        "silent"
    }
}

/// Returns a single loss value whatever the batch size.
pub struct PooledNet<B: Backend> {
    params: ParamStore<B>,
}

impl<B: Backend> TrainableModel<B> for PooledNet<B> {
    fn init_model(context: &ModelContext, _device: Device) -> Result<Self, ModelError> {
        let mut params = ParamStore::new();
        params.insert("weight", Param::new(Tensor1D::zeros(context.n_features)));
        Ok(Self { params })
    }

    fn forward(&self, x: &Tensor2D<B>, _inference: bool) -> Result<ForwardOutput<B>, ModelError> {
        Ok(ForwardOutput::new(x.clone(), Tensor1D::full(1, x.mean().to_f64())))
    }

    fn backward(&self, _x: &Tensor2D<B>, _grad_loss: &Tensor1D<B>) -> Result<ParamStore<B>, ModelError> {
        Ok(ParamStore::new())
    }

    fn params(&self) -> &ParamStore<B> {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamStore<B> {
        &mut self.params
    }
}
