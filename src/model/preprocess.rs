//! The preprocessing chain every batch passes through before `forward`.

use crate::backend::{Backend, Device, Tensor2D};
use crate::error::ModelError;
use crate::preprocessing::{FittedTransformer, PreprocessingError};
use ndarray::Array2;
use std::fmt;

/// A batch at some point of the preprocessing chain.
///
/// Pipelines hand models host arrays of shape `(samples, features)`; after
/// `ToTensor` the batch is a backend tensor.
#[derive(Clone, Debug)]
pub enum Batch<B: Backend> {
    Host(Array2<f64>),
    Tensor(Tensor2D<B>),
}

impl<B: Backend> Batch<B> {
    pub fn is_tensor(&self) -> bool {
        matches!(self, Batch::Tensor(_))
    }

    /// `(samples, features)`.
    pub fn shape(&self) -> (usize, usize) {
        match self {
            Batch::Host(x) => x.dim(),
            Batch::Tensor(t) => t.shape(),
        }
    }

    /// Unwraps a tensor batch.
    ///
    /// # Errors
    /// [`ModelError::NotATensor`] for a host batch.
    pub fn into_tensor(self) -> Result<Tensor2D<B>, ModelError> {
        match self {
            Batch::Tensor(t) => Ok(t),
            Batch::Host(x) => Err(ModelError::NotATensor(format!(
                "batch of shape {:?} is still host data",
                x.dim()
            ))),
        }
    }
}

impl<B: Backend> From<Array2<f64>> for Batch<B> {
    fn from(x: Array2<f64>) -> Self {
        Batch::Host(x)
    }
}

impl<B: Backend> From<Tensor2D<B>> for Batch<B> {
    fn from(t: Tensor2D<B>) -> Self {
        Batch::Tensor(t)
    }
}

/// Object-safe view of a fitted transformer over tensors.
///
/// Implemented for every [`FittedTransformer`] mapping `Tensor2D<B>` to
/// `Tensor2D<B>`, so any fitted scaler can be pushed onto a model's chain.
pub trait TensorTransform<B: Backend>: Send + Sync {
    fn apply(&self, x: &Tensor2D<B>) -> Result<Tensor2D<B>, PreprocessingError>;

    fn name(&self) -> &'static str {
        let full = std::any::type_name::<Self>();
        let base = full.split('<').next().unwrap_or(full);
        base.rsplit("::").next().unwrap_or(base)
    }
}

impl<B, T> TensorTransform<B> for T
where
    B: Backend,
    T: FittedTransformer<B, Input = Tensor2D<B>, Output = Tensor2D<B>> + Send + Sync,
{
    fn apply(&self, x: &Tensor2D<B>) -> Result<Tensor2D<B>, PreprocessingError> {
        self.transform(x)
    }
}

/// One step of a model's preprocessing chain.
pub enum Preprocessor<B: Backend> {
    /// Host array to backend tensor (`f32` precision). No-op on tensors.
    ToTensor,
    /// Moves the tensor to the model's device, converting host data first.
    ToDevice,
    /// Applies a fitted transformer. Needs a tensor batch.
    Transform(Box<dyn TensorTransform<B>>),
}

impl<B: Backend> Preprocessor<B> {
    /// Wraps a fitted transformer.
    pub fn transform<T: TensorTransform<B> + 'static>(transform: T) -> Self {
        Preprocessor::Transform(Box::new(transform))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Preprocessor::ToTensor => "to_tensor",
            Preprocessor::ToDevice => "to_device",
            Preprocessor::Transform(t) => t.name(),
        }
    }

    /// Runs this step on `batch` for a model living on `device`.
    ///
    /// # Errors
    /// - [`ModelError::NotATensor`] when a transform receives host data
    /// - [`ModelError::DeviceUnavailable`] from device placement
    /// - [`ModelError::Preprocessing`] from the wrapped transformer
    pub fn apply(&self, batch: Batch<B>, device: Device) -> Result<Batch<B>, ModelError> {
        log::trace!("preprocess step {} on {:?} batch", self.name(), batch.shape());
        match (self, batch) {
            (Preprocessor::ToTensor, Batch::Host(x)) => Ok(Batch::Tensor(Tensor2D::from_array(&x))),
            (Preprocessor::ToTensor, tensor @ Batch::Tensor(_)) => Ok(tensor),
            (Preprocessor::ToDevice, Batch::Host(x)) => {
                Ok(Batch::Tensor(Tensor2D::from_array(&x).to_device(device)?))
            }
            (Preprocessor::ToDevice, Batch::Tensor(t)) => Ok(Batch::Tensor(t.to_device(device)?)),
            (Preprocessor::Transform(t), Batch::Tensor(x)) => Ok(Batch::Tensor(t.apply(&x)?)),
            (Preprocessor::Transform(t), Batch::Host(x)) => Err(ModelError::NotATensor(format!(
                "{} received host data of shape {:?}; add to_tensor before it",
                t.name(),
                x.dim()
            ))),
        }
    }
}

impl<B: Backend> fmt::Debug for Preprocessor<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `[ToTensor, ToDevice]`.
pub fn default_preprocessors<B: Backend>() -> Vec<Preprocessor<B>> {
    vec![Preprocessor::ToTensor, Preprocessor::ToDevice]
}

/// Runs `batch` through `chain` in order. An empty chain returns the batch
/// unchanged.
pub fn run_chain<B: Backend>(
    chain: &[Preprocessor<B>],
    batch: Batch<B>,
    device: Device,
) -> Result<Batch<B>, ModelError> {
    chain
        .iter()
        .try_fold(batch, |batch, step| step.apply(batch, device))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CpuBackend;
    use crate::preprocessing::{StandardScaler, Transformer};
    use ndarray::array;

    type B = CpuBackend;

    #[test]
    fn test_empty_chain_is_identity() {
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        let out = run_chain::<B>(&[], Batch::Host(x.clone()), Device::Cpu).unwrap();
        match out {
            Batch::Host(h) => assert_eq!(h, x),
            Batch::Tensor(_) => panic!("empty chain must not convert"),
        }
    }

    #[test]
    fn test_default_chain_converts() {
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        let out = run_chain::<B>(&default_preprocessors(), x.into(), Device::Cpu).unwrap();
        let t = out.into_tensor().unwrap();
        assert_eq!(t.to_vec(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_to_tensor_is_noop_on_tensor() {
        let t = Tensor2D::<B>::new(vec![5.0], 1, 1);
        let out = Preprocessor::<B>::ToTensor.apply(t.into(), Device::Cpu).unwrap();
        assert_eq!(out.into_tensor().unwrap().to_vec(), vec![5.0]);
    }

    #[test]
    fn test_to_tensor_casts_to_f32() {
        let x = array![[0.1]];
        let t = Preprocessor::<B>::ToTensor
            .apply(x.into(), Device::Cpu)
            .unwrap()
            .into_tensor()
            .unwrap();
        assert_eq!(t.to_vec()[0], 0.1f32 as f64);
    }

    #[test]
    fn test_to_device_unavailable() {
        let x = array![[1.0]];
        assert!(matches!(
            Preprocessor::<B>::ToDevice.apply(x.into(), Device::Cuda(0)),
            Err(ModelError::DeviceUnavailable { .. })
        ));
    }

    #[test]
    fn test_transform_needs_tensor() {
        let fit_data = Tensor2D::<B>::new(vec![0.0, 2.0], 2, 1);
        let scaler = StandardScaler::<B>::new().fit(&fit_data).unwrap();
        let step = Preprocessor::<B>::transform(scaler);
        assert_eq!(step.name(), "FittedStandardScaler");

        let err = step.apply(array![[1.0]].into(), Device::Cpu).unwrap_err();
        assert!(matches!(err, ModelError::NotATensor(_)));
    }

    #[test]
    fn test_transform_in_chain() {
        let fit_data = Tensor2D::<B>::new(vec![0.0, 2.0], 2, 1);
        let scaler = StandardScaler::<B>::new().fit(&fit_data).unwrap();
        let mut chain = default_preprocessors::<B>();
        chain.push(Preprocessor::transform(scaler));

        let out = run_chain(&chain, array![[0.0], [2.0]].into(), Device::Cpu)
            .unwrap()
            .into_tensor()
            .unwrap();
        assert_eq!(out.to_vec(), vec![-1.0, 1.0]);
    }

    #[test]
    fn test_transform_feature_mismatch_propagates() {
        let fit_data = Tensor2D::<B>::new(vec![0.0, 2.0], 2, 1);
        let scaler = StandardScaler::<B>::new().fit(&fit_data).unwrap();
        let step = Preprocessor::<B>::transform(scaler);
        let wide = Tensor2D::<B>::zeros(1, 3);
        assert!(matches!(
            step.apply(wide.into(), Device::Cpu),
            Err(ModelError::Preprocessing(_))
        ));
    }
}
