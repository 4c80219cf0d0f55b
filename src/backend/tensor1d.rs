use super::scalar::Scalar;
use crate::backend::{Backend, Device};
use crate::error::ModelError;
use std::fmt;
use std::marker::PhantomData;

/// Backend-typed 1D tensor.
///
/// Used for parameter vectors, gradients and per-sample losses. `new` takes
/// `f32` and `from_f64` keeps full precision; every operation runs in the
/// backend's native precision and `to_vec` returns `f64`.
///
/// ```compile_fail
/// use detector_models::backend::{CpuBackend, NdarrayBackend, Tensor1D};
///
/// let a: Tensor1D<CpuBackend> = Tensor1D::zeros(3);
/// let b: Tensor1D<NdarrayBackend> = Tensor1D::zeros(3);
/// let _ = a.sub(&b);
/// ```
///
/// # Example
/// ```
/// use detector_models::backend::{CpuBackend, Scalar, Tensor1D};
///
/// let x: Tensor1D<CpuBackend> = Tensor1D::new(vec![1.0f32, 2.0, 3.0]);
/// let y = x.scale(&Scalar::new(2.0));
/// assert_eq!(y.to_vec(), vec![2.0, 4.0, 6.0]);
/// ```
#[derive(Clone)]
pub struct Tensor1D<B: Backend> {
    pub(crate) data: B::Tensor1D,
    pub(crate) backend: PhantomData<B>,
}

impl<B: Backend> Tensor1D<B> {
    /// Creates a tensor from `f32` host values.
    pub fn new(data: Vec<f32>) -> Self {
        Self::from_raw(B::from_vec_1d(data))
    }

    /// Creates a tensor from `f64` host values at full precision.
    pub fn from_f64(data: Vec<f64>) -> Self {
        Self::from_raw(B::from_f64_1d(data))
    }

    /// Creates a tensor of `len` zeros.
    pub fn zeros(len: usize) -> Self {
        Self::from_raw(B::zeros_1d(len))
    }

    /// Creates a tensor of `len` copies of `value`.
    pub fn full(len: usize, value: f64) -> Self {
        Self::zeros(len).add_scalar(&Scalar::new(value))
    }

    pub(crate) fn from_raw(data: B::Tensor1D) -> Self {
        Self {
            data,
            backend: PhantomData,
        }
    }

    /// Element-wise `self + other`.
    pub fn add(&self, other: &Self) -> Self {
        Self::from_raw(B::add_1d(&self.data, &other.data))
    }

    /// Element-wise `self - other`.
    pub fn sub(&self, other: &Self) -> Self {
        Self::from_raw(B::sub_1d(&self.data, &other.data))
    }

    /// Element-wise `self * other`.
    pub fn mul(&self, other: &Self) -> Self {
        Self::from_raw(B::mul_1d(&self.data, &other.data))
    }

    /// Element-wise `self / other`.
    pub fn div(&self, other: &Self) -> Self {
        Self::from_raw(B::div_1d(&self.data, &other.data))
    }

    /// Multiplies every element by `a`.
    pub fn scale(&self, a: &Scalar<B>) -> Self {
        Self::from_raw(B::mul_scalar_1d(&self.data, &a.data))
    }

    /// Adds `a` to every element.
    pub fn add_scalar(&self, a: &Scalar<B>) -> Self {
        Self::from_raw(B::add_scalar_1d(&self.data, &a.data))
    }

    /// Element-wise square root.
    pub fn sqrt(&self) -> Self {
        Self::from_raw(B::sqrt_1d(&self.data))
    }

    /// Mean of all elements. NaN for an empty tensor.
    ///
    /// ```
    /// use detector_models::backend::{CpuBackend, Tensor1D};
    ///
    /// let t = Tensor1D::<CpuBackend>::new(vec![1.0f32, 2.0, 3.0, 4.0]);
    /// assert!((t.mean().to_f64() - 2.5).abs() < 1e-12);
    /// ```
    pub fn mean(&self) -> Scalar<B> {
        Scalar::from_raw(B::mean_all_1d(&self.data))
    }

    /// Sum of all elements.
    pub fn sum(&self) -> Scalar<B> {
        Scalar::from_raw(B::sum_all_1d(&self.data))
    }

    /// Inner product `Σᵢ aᵢ * bᵢ`.
    pub fn dot(&self, other: &Self) -> Scalar<B> {
        let prod = B::mul_1d(&self.data, &other.data);
        Scalar::from_raw(B::sum_all_1d(&prod))
    }

    /// Copies the tensor to host memory.
    pub fn to_vec(&self) -> Vec<f64> {
        B::to_vec_1d(&self.data)
    }

    pub fn len(&self) -> usize {
        B::len_1d(&self.data)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Places a copy of this tensor on `device`.
    ///
    /// # Errors
    /// [`ModelError::DeviceUnavailable`] if the backend cannot reach `device`.
    pub fn to_device(&self, device: Device) -> Result<Self, ModelError> {
        Ok(Self::from_raw(B::to_device_1d(&self.data, device)?))
    }
}

impl<B: Backend> fmt::Debug for Tensor1D<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor1D")
            .field("backend", &B::name())
            .field("data", &self.to_vec())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CpuBackend;

    type T = Tensor1D<CpuBackend>;

    #[test]
    fn test_elementwise_ops() {
        let a = T::new(vec![6.0, 8.0]);
        let b = T::new(vec![2.0, 4.0]);

        assert_eq!(a.add(&b).to_vec(), vec![8.0, 12.0]);
        assert_eq!(a.sub(&b).to_vec(), vec![4.0, 4.0]);
        assert_eq!(a.mul(&b).to_vec(), vec![12.0, 32.0]);
        assert_eq!(a.div(&b).to_vec(), vec![3.0, 2.0]);
    }

    #[test]
    fn test_scalar_ops() {
        let a = T::new(vec![4.0, 9.0]);
        assert_eq!(a.sqrt().to_vec(), vec![2.0, 3.0]);
        assert_eq!(a.add_scalar(&Scalar::new(1.0)).to_vec(), vec![5.0, 10.0]);
        assert_eq!(T::full(3, 0.5).to_vec(), vec![0.5, 0.5, 0.5]);
    }

    #[test]
    fn test_reductions() {
        let a = T::new(vec![1.0, 2.0, 3.0]);
        let b = T::new(vec![4.0, 5.0, 6.0]);
        assert_eq!(a.sum().to_f64(), 6.0);
        assert_eq!(a.dot(&b).to_f64(), 32.0);
        assert!(T::zeros(0).mean().to_f64().is_nan());
    }

    #[test]
    fn test_from_f64_keeps_precision() {
        let third = 1.0 / 3.0;
        assert_eq!(T::from_f64(vec![third]).to_vec(), vec![third]);
        assert_ne!(T::new(vec![third as f32]).to_vec(), vec![third]);
    }

    #[test]
    fn test_len_and_empty() {
        assert_eq!(T::zeros(4).len(), 4);
        assert!(T::zeros(0).is_empty());
    }

    #[test]
    fn test_to_device() {
        let a = T::new(vec![1.0]);
        assert_eq!(a.to_device(Device::Cpu).unwrap().to_vec(), vec![1.0]);
        assert!(matches!(
            a.to_device(Device::Cuda(0)),
            Err(ModelError::DeviceUnavailable { .. })
        ));
    }

    #[test]
    fn test_debug_shows_values() {
        let dbg = format!("{:?}", T::new(vec![1.5]));
        assert!(dbg.contains("1.5"));
        assert!(dbg.contains("CpuBackend"));
    }
}
