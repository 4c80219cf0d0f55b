use crate::backend::Backend;
use std::marker::PhantomData;

/// Arithmetic required of a backend's native scalar type.
///
/// # Example
/// ```
/// use detector_models::backend::ScalarOps;
///
/// let x = 4.0f64;
/// assert_eq!(ScalarOps::sqrt(x), 2.0);
/// assert_eq!(f64::zero(), 0.0);
/// assert_eq!(f64::one(), 1.0);
/// ```
pub trait ScalarOps:
    Clone
    + Copy
    + Send
    + Sync
    + std::fmt::Debug
    + std::ops::Add<Output = Self>
    + std::ops::Mul<Output = Self>
    + std::ops::Sub<Output = Self>
    + std::ops::Div<Output = Self>
{
    /// Square root. NaN for negative inputs on real implementations.
    fn sqrt(self) -> Self;

    /// Absolute value.
    fn abs(self) -> Self;

    /// Additive identity.
    fn zero() -> Self;

    /// Multiplicative identity.
    fn one() -> Self;

    /// Converts a host `f64` into this scalar type.
    fn from_f64(v: f64) -> Self;

    /// Converts this scalar to a host `f64`.
    fn to_f64(self) -> f64;
}

impl ScalarOps for f64 {
    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }

    fn abs(self) -> Self {
        f64::abs(self)
    }

    fn zero() -> Self {
        0.0
    }

    fn one() -> Self {
        1.0
    }

    fn from_f64(v: f64) -> Self {
        v
    }

    fn to_f64(self) -> f64 {
        self
    }
}

/// Backend-typed scalar.
///
/// Carries the originating backend as a phantom type so a loss computed on one
/// backend cannot be combined with a scalar from another.
///
/// ```compile_fail
/// use detector_models::backend::{CpuBackend, NdarrayBackend, Scalar};
///
/// let a: Scalar<CpuBackend> = Scalar::new(1.0);
/// let b: Scalar<NdarrayBackend> = Scalar::new(2.0);
/// let _ = a + b;
/// ```
///
/// # Example
/// ```
/// use detector_models::backend::{CpuBackend, Scalar};
///
/// let lr: Scalar<CpuBackend> = Scalar::new(0.5);
/// assert_eq!((lr * lr).to_f64(), 0.25);
/// ```
#[derive(Clone, Debug, Copy)]
pub struct Scalar<B: Backend> {
    pub(crate) data: B::Scalar,
    pub(crate) backend: PhantomData<B>,
}

impl<B: Backend> Scalar<B> {
    /// Creates a scalar from a host value.
    pub fn new(f: f64) -> Self {
        Self {
            data: B::scalar_f64(f),
            backend: PhantomData,
        }
    }

    pub(crate) fn from_raw(data: B::Scalar) -> Self {
        Self {
            data,
            backend: PhantomData,
        }
    }

    /// Copies the value back to the host.
    pub fn to_f64(&self) -> f64 {
        self.data.to_f64()
    }

    pub fn sqrt(&self) -> Self {
        Self::from_raw(self.data.sqrt())
    }
}

impl<B: Backend> std::ops::Add for Scalar<B> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::from_raw(self.data + rhs.data)
    }
}

impl<B: Backend> std::ops::Sub for Scalar<B> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::from_raw(self.data - rhs.data)
    }
}

impl<B: Backend> std::ops::Mul for Scalar<B> {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::from_raw(self.data * rhs.data)
    }
}

impl<B: Backend> std::ops::Div for Scalar<B> {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        Self::from_raw(self.data / rhs.data)
    }
}
