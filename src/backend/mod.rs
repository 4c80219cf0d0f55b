//! # Backend Abstraction
//!
//! Trait-based abstraction over the tensor framework that models run on.
//! Models never touch storage directly: every numeric primitive (element-wise
//! math, reductions, matrix-vector products, device transfers) goes through
//! a [`Backend`] implementation selected at compile time.
//!
//! ## Available Backends
//!
//! | Backend          | Feature           | Use Case                          |
//! |------------------|-------------------|-----------------------------------|
//! | `CpuBackend`     | `cpu`             | Default, pure-Rust implementation |
//! | `NdarrayBackend` | `ndarray-backend` | Interop with `ndarray` ecosystem  |
//!
//! Both shipped backends live in host memory, so [`Device::Cpu`] is the only
//! device they accept. A GPU backend reports its devices through
//! [`Backend::is_available`] and overrides the `to_device_*` transfers.
//!
//! ## Example
//!
//! ```rust
//! use detector_models::backend::{CpuBackend, Tensor1D, Tensor2D};
//!
//! let x: Tensor1D<CpuBackend> = Tensor1D::new(vec![1.0, 2.0]);
//! let w: Tensor2D<CpuBackend> = Tensor2D::new(vec![0.5, 0.5, 0.5, 0.5], 2, 2);
//! let y = w.dot(&x);
//! assert_eq!(y.to_vec(), vec![1.5, 1.5]);
//! ```

use crate::error::ModelError;

#[cfg(feature = "cpu")]
mod cpu;
#[cfg(feature = "cpu")]
/// Pure-Rust CPU backend implementation with zero external dependencies.
pub use cpu::{CpuBackend, CpuTensor2D};

#[cfg(feature = "ndarray-backend")]
mod ndarray_backend;
#[cfg(feature = "ndarray-backend")]
/// Backend backed by the `ndarray` crate for ecosystem interoperability.
pub use ndarray_backend::{NdarrayBackend, NdarrayTensor2D};

/// Device identifiers and parsing.
pub mod device;
/// Scalar value representation and arithmetic operations.
pub mod scalar;
/// One-dimensional tensor abstraction.
pub mod tensor1d;
/// Two-dimensional tensor abstraction.
pub mod tensor2d;

pub use device::Device;
pub use scalar::{Scalar, ScalarOps};
pub use tensor1d::Tensor1D;
pub use tensor2d::Tensor2D;

/// Abstraction over computation devices and tensor operations.
///
/// Shape contracts are documented per method. Callers in this crate validate
/// dimensions before calling in, so implementations may panic on mismatch.
pub trait Backend: Clone + Copy + Send + Sync + 'static {
    /// Scalar type supporting arithmetic operations.
    type Scalar: ScalarOps + Clone;

    /// One-dimensional tensor type.
    type Tensor1D: Clone + Send + Sync;

    /// Two-dimensional tensor type.
    type Tensor2D: Clone + Send + Sync;

    /// Human-readable backend name, used in logs and errors.
    fn name() -> &'static str;

    /// Whether tensors can be placed on `device`.
    fn is_available(device: Device) -> bool {
        device.is_cpu()
    }

    /// Moves a 1D tensor onto `device`.
    fn to_device_1d(t: &Self::Tensor1D, device: Device) -> Result<Self::Tensor1D, ModelError> {
        if Self::is_available(device) {
            Ok(t.clone())
        } else {
            Err(unavailable::<Self>(device))
        }
    }

    /// Moves a 2D tensor onto `device`.
    fn to_device_2d(t: &Self::Tensor2D, device: Device) -> Result<Self::Tensor2D, ModelError> {
        if Self::is_available(device) {
            Ok(t.clone())
        } else {
            Err(unavailable::<Self>(device))
        }
    }

    // --- Constructors ---

    /// Creates a 1D tensor filled with zeros of given length.
    fn zeros_1d(len: usize) -> Self::Tensor1D;

    /// Creates a 2D tensor filled with zeros of given dimensions.
    fn zeros_2d(rows: usize, cols: usize) -> Self::Tensor2D;

    /// Constructs a 1D tensor from owned data.
    fn from_vec_1d(data: Vec<f32>) -> Self::Tensor1D;

    /// Constructs a 1D tensor from `f64` values without narrowing.
    fn from_f64_1d(data: Vec<f64>) -> Self::Tensor1D;

    /// Constructs a 2D tensor from row-major ordered data.
    ///
    /// # Panics
    /// If `data.len() != rows * cols`.
    fn from_vec_2d(data: Vec<f32>, rows: usize, cols: usize) -> Self::Tensor2D;

    // --- Element-wise operations (1D) ---

    /// Element-wise addition. Lengths must match.
    fn add_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D;

    /// Element-wise subtraction. Lengths must match.
    fn sub_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D;

    /// Element-wise multiplication. Lengths must match.
    fn mul_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D;

    /// Element-wise division. Lengths must match.
    fn div_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D;

    /// Multiplies each element of tensor by a scalar.
    fn mul_scalar_1d(t: &Self::Tensor1D, s: &Self::Scalar) -> Self::Tensor1D;

    /// Adds a scalar to each element of tensor.
    fn add_scalar_1d(t: &Self::Tensor1D, s: &Self::Scalar) -> Self::Tensor1D;

    /// Element-wise square root.
    fn sqrt_1d(t: &Self::Tensor1D) -> Self::Tensor1D;

    // --- Element-wise operations (2D) ---

    /// Multiplies each element of 2D tensor by a scalar.
    fn mul_scalar_2d(t: &Self::Tensor2D, s: &Self::Scalar) -> Self::Tensor2D;

    /// Element-wise subtraction of two 2D tensors. Shapes must match.
    fn sub_2d(a: &Self::Tensor2D, b: &Self::Tensor2D) -> Self::Tensor2D;

    /// Element-wise multiplication of two 2D tensors. Shapes must match.
    fn mul_2d(a: &Self::Tensor2D, b: &Self::Tensor2D) -> Self::Tensor2D;

    // --- Reduction operations ---

    /// Arithmetic mean of all elements in a 1D tensor (NaN when empty).
    fn mean_all_1d(t: &Self::Tensor1D) -> Self::Scalar;

    /// Sum of all elements in a 1D tensor.
    fn sum_all_1d(t: &Self::Tensor1D) -> Self::Scalar;

    /// Arithmetic mean of all elements in a 2D tensor (NaN when empty).
    fn mean_all_2d(t: &Self::Tensor2D) -> Self::Scalar;

    // --- Scalar operations ---

    /// Creates a backend-specific scalar from an f64 value.
    fn scalar_f64(value: f64) -> Self::Scalar;

    // --- Data access ---

    /// Copies a 1D tensor to host memory.
    fn to_vec_1d(t: &Self::Tensor1D) -> Vec<f64>;

    /// Copies a 2D tensor to host memory in row-major order.
    fn to_vec_2d(t: &Self::Tensor2D) -> Vec<f64>;

    /// Returns the number of elements in a 1D tensor.
    fn len_1d(t: &Self::Tensor1D) -> usize;

    /// Returns the shape of a 2D tensor as (rows, cols).
    fn shape(t: &Self::Tensor2D) -> (usize, usize);

    // --- Linear algebra ---

    /// Computes `y = A * x` where `A` is (m × n) and `x` is (n,).
    fn matvec(a: &Self::Tensor2D, x: &Self::Tensor1D) -> Self::Tensor1D;

    /// Computes `y = A^T * x` where `A` is (m × n) and `x` is (m,).
    fn matvec_transposed(a: &Self::Tensor2D, x: &Self::Tensor1D) -> Self::Tensor1D;

    // --- Column/row reductions ---

    /// Mean of each column, length `cols`.
    fn col_mean_2d(t: &Self::Tensor2D) -> Self::Tensor1D;

    /// Standard deviation of each column with `ddof` delta degrees of freedom.
    fn col_std_2d(t: &Self::Tensor2D, ddof: usize) -> Self::Tensor1D;

    /// Sum of each row, length `rows`.
    fn row_sum_2d(t: &Self::Tensor2D) -> Self::Tensor1D;

    // --- Broadcasting operations ---

    /// `Result[i, j] = t[i, j] - v[j]`
    fn broadcast_sub_1d_to_2d_rows(t: &Self::Tensor2D, v: &Self::Tensor1D) -> Self::Tensor2D;

    /// `Result[i, j] = t[i, j] / v[j]`
    fn broadcast_div_1d_to_2d_rows(t: &Self::Tensor2D, v: &Self::Tensor1D) -> Self::Tensor2D;

    /// `Result[i, j] = t[i, j] * v[j]`
    fn broadcast_mul_1d_to_2d_rows(t: &Self::Tensor2D, v: &Self::Tensor1D) -> Self::Tensor2D;

    /// `Result[i, j] = t[i, j] + v[j]`
    fn broadcast_add_1d_to_2d_rows(t: &Self::Tensor2D, v: &Self::Tensor1D) -> Self::Tensor2D;
}

fn unavailable<B: Backend>(device: Device) -> ModelError {
    ModelError::DeviceUnavailable {
        device: device.to_string(),
        backend: B::name().to_string(),
    }
}
