use super::scalar::Scalar;
use super::tensor1d::Tensor1D;
use crate::backend::{Backend, Device};
use crate::error::ModelError;
use ndarray::Array2;
use std::fmt;
use std::marker::PhantomData;

/// Backend-typed 2D tensor, laid out as `(samples, features)`.
///
/// # Example
/// ```
/// use detector_models::backend::{CpuBackend, Tensor1D, Tensor2D};
///
/// // [[1, 2],
/// //  [3, 4]]
/// let a = Tensor2D::<CpuBackend>::new(vec![1.0f32, 2.0, 3.0, 4.0], 2, 2);
/// let x = Tensor1D::<CpuBackend>::new(vec![1.0f32, 0.0]);
/// assert_eq!(a.dot(&x).to_vec(), vec![1.0, 3.0]);
/// assert_eq!(a.tdot(&x).to_vec(), vec![1.0, 2.0]);
/// ```
#[derive(Clone)]
pub struct Tensor2D<B: Backend> {
    pub(crate) data: B::Tensor2D,
    pub(crate) backend: PhantomData<B>,
}

impl<B: Backend> Tensor2D<B> {
    /// Creates a tensor from row-major `f32` values.
    ///
    /// # Panics
    /// If `data.len() != rows * cols`.
    pub fn new(data: Vec<f32>, rows: usize, cols: usize) -> Self {
        Self::from_raw(B::from_vec_2d(data, rows, cols))
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::from_raw(B::zeros_2d(rows, cols))
    }

    /// Converts a host array to a tensor, casting to `f32`.
    pub fn from_array(array: &Array2<f64>) -> Self {
        let (rows, cols) = array.dim();
        let data: Vec<f32> = array.iter().map(|&v| v as f32).collect();
        Self::new(data, rows, cols)
    }

    pub(crate) fn from_raw(data: B::Tensor2D) -> Self {
        Self {
            data,
            backend: PhantomData,
        }
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        B::shape(&self.data)
    }

    pub fn rows(&self) -> usize {
        self.shape().0
    }

    pub fn cols(&self) -> usize {
        self.shape().1
    }

    /// Total number of elements.
    pub fn numel(&self) -> usize {
        let (r, c) = self.shape();
        r * c
    }

    /// Element-wise `self - other`.
    pub fn sub(&self, other: &Self) -> Self {
        Self::from_raw(B::sub_2d(&self.data, &other.data))
    }

    /// Element-wise `self * other`.
    pub fn mul(&self, other: &Self) -> Self {
        Self::from_raw(B::mul_2d(&self.data, &other.data))
    }

    pub fn scale(&self, a: &Scalar<B>) -> Self {
        Self::from_raw(B::mul_scalar_2d(&self.data, &a.data))
    }

    /// Mean of all elements.
    pub fn mean(&self) -> Scalar<B> {
        Scalar::from_raw(B::mean_all_2d(&self.data))
    }

    /// `A · x`, one value per row.
    pub fn dot(&self, other: &Tensor1D<B>) -> Tensor1D<B> {
        Tensor1D::from_raw(B::matvec(&self.data, &other.data))
    }

    /// `Aᵀ · x`, one value per column.
    pub fn tdot(&self, other: &Tensor1D<B>) -> Tensor1D<B> {
        Tensor1D::from_raw(B::matvec_transposed(&self.data, &other.data))
    }

    /// Sum of each row.
    pub fn row_sum(&self) -> Tensor1D<B> {
        Tensor1D::from_raw(B::row_sum_2d(&self.data))
    }

    /// Mean of each column.
    pub fn col_mean(&self) -> Tensor1D<B> {
        Tensor1D::from_raw(B::col_mean_2d(&self.data))
    }

    /// Standard deviation of each column with `ddof` delta degrees of freedom.
    pub fn col_std(&self, ddof: usize) -> Tensor1D<B> {
        Tensor1D::from_raw(B::col_std_2d(&self.data, ddof))
    }

    /// Subtracts `v` from every row.
    pub fn broadcast_sub_row(&self, v: &Tensor1D<B>) -> Self {
        Self::from_raw(B::broadcast_sub_1d_to_2d_rows(&self.data, &v.data))
    }

    /// Divides every row by `v`.
    pub fn broadcast_div_row(&self, v: &Tensor1D<B>) -> Self {
        Self::from_raw(B::broadcast_div_1d_to_2d_rows(&self.data, &v.data))
    }

    /// Multiplies every row by `v`.
    pub fn broadcast_mul_row(&self, v: &Tensor1D<B>) -> Self {
        Self::from_raw(B::broadcast_mul_1d_to_2d_rows(&self.data, &v.data))
    }

    /// Adds `v` to every row.
    pub fn broadcast_add_row(&self, v: &Tensor1D<B>) -> Self {
        Self::from_raw(B::broadcast_add_1d_to_2d_rows(&self.data, &v.data))
    }

    /// Row-major copy in host memory.
    pub fn to_vec(&self) -> Vec<f64> {
        B::to_vec_2d(&self.data)
    }

    /// Copies the tensor back to a host array.
    pub fn to_array(&self) -> Array2<f64> {
        let (rows, cols) = self.shape();
        let mut out = Array2::zeros((rows, cols));
        for (dst, src) in out.iter_mut().zip(self.to_vec()) {
            *dst = src;
        }
        out
    }

    /// Places a copy of this tensor on `device`.
    ///
    /// # Errors
    /// [`ModelError::DeviceUnavailable`] if the backend cannot reach `device`.
    pub fn to_device(&self, device: Device) -> Result<Self, ModelError> {
        Ok(Self::from_raw(B::to_device_2d(&self.data, device)?))
    }
}

impl<B: Backend> fmt::Debug for Tensor2D<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor2D")
            .field("backend", &B::name())
            .field("shape", &self.shape())
            .finish()
    }
}
