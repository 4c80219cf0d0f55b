use super::Backend;
use ndarray::{Array1, Array2, Axis};

/// CPU tensor backend built on the `ndarray` crate.
///
/// # Type mappings
/// - `Scalar`: `f64`
/// - `Tensor1D`: `ndarray::Array1<f64>`
/// - `Tensor2D`: [`NdarrayTensor2D`] wrapper around `ndarray::Array2<f64>`
///
/// Host batches handed to a model are already `ndarray` arrays, so with this
/// backend `to_tensor` is a cast and a copy.
#[derive(Clone, Debug, Copy)]
pub struct NdarrayBackend;

/// Wrapper type for 2D tensors using ndarray's `Array2<f64>`.
///
/// # Example
/// ```
/// use detector_models::backend::NdarrayTensor2D;
///
/// let tensor = NdarrayTensor2D::from(&[
///     vec![1.0f64, 2.0f64, 3.0f64],
///     vec![4.0f64, 5.0f64, 6.0f64],
/// ][..]);
/// assert_eq!(tensor.0.shape(), &[2, 3]);
/// ```
#[derive(Debug, Clone)]
pub struct NdarrayTensor2D(pub Array2<f64>);

impl From<&[Vec<f64>]> for NdarrayTensor2D {
    /// Converts a slice of row vectors into a 2D tensor.
    ///
    /// # Panics
    /// Panics if rows have inconsistent lengths.
    fn from(x: &[Vec<f64>]) -> Self {
        let rows = x.len();
        let cols = x.first().map_or(0, Vec::len);
        assert!(
            x.iter().all(|r| r.len() == cols),
            "All rows must have same length"
        );
        let mut out = Array2::zeros((rows, cols));
        for (mut dst, src) in out.rows_mut().into_iter().zip(x.iter()) {
            dst.assign(&Array1::from(src.clone()));
        }
        NdarrayTensor2D(out)
    }
}

impl Backend for NdarrayBackend {
    type Scalar = f64;
    type Tensor1D = Array1<f64>;
    type Tensor2D = NdarrayTensor2D;

    fn name() -> &'static str {
        "NdarrayBackend"
    }

    fn zeros_1d(len: usize) -> Self::Tensor1D {
        Array1::zeros(len)
    }

    fn zeros_2d(rows: usize, cols: usize) -> Self::Tensor2D {
        NdarrayTensor2D(Array2::zeros((rows, cols)))
    }

    fn from_vec_1d(data: Vec<f32>) -> Self::Tensor1D {
        Array1::from_iter(data.into_iter().map(|x| x as f64))
    }

    fn from_f64_1d(data: Vec<f64>) -> Self::Tensor1D {
        Array1::from(data)
    }

    /// # Panics
    /// Panics if `data.len() != rows * cols`.
    fn from_vec_2d(data: Vec<f32>, rows: usize, cols: usize) -> Self::Tensor2D {
        let data_f64: Vec<f64> = data.into_iter().map(|x| x as f64).collect();
        NdarrayTensor2D(
            Array2::from_shape_vec((rows, cols), data_f64)
                .expect("data length must equal rows * cols"),
        )
    }

    // --- Element-wise (1D) ---

    fn add_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D {
        a + b
    }

    fn sub_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D {
        a - b
    }

    fn mul_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D {
        a * b
    }

    fn div_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D {
        a / b
    }

    fn mul_scalar_1d(t: &Self::Tensor1D, s: &Self::Scalar) -> Self::Tensor1D {
        t.mapv(|x| x * *s)
    }

    fn add_scalar_1d(t: &Self::Tensor1D, s: &Self::Scalar) -> Self::Tensor1D {
        t.mapv(|x| x + *s)
    }

    fn sqrt_1d(t: &Self::Tensor1D) -> Self::Tensor1D {
        t.mapv(f64::sqrt)
    }

    // --- Element-wise (2D) ---

    fn mul_scalar_2d(t: &Self::Tensor2D, s: &Self::Scalar) -> Self::Tensor2D {
        NdarrayTensor2D(&t.0 * *s)
    }

    fn sub_2d(a: &Self::Tensor2D, b: &Self::Tensor2D) -> Self::Tensor2D {
        NdarrayTensor2D(&a.0 - &b.0)
    }

    /// Hadamard product.
    fn mul_2d(a: &Self::Tensor2D, b: &Self::Tensor2D) -> Self::Tensor2D {
        NdarrayTensor2D(&a.0 * &b.0)
    }

    // --- Reductions ---

    fn mean_all_1d(t: &Self::Tensor1D) -> Self::Scalar {
        t.mean().unwrap_or(f64::NAN)
    }

    fn sum_all_1d(t: &Self::Tensor1D) -> Self::Scalar {
        t.sum()
    }

    fn mean_all_2d(t: &Self::Tensor2D) -> Self::Scalar {
        t.0.mean().unwrap_or(f64::NAN)
    }

    fn scalar_f64(value: f64) -> Self::Scalar {
        value
    }

    // --- Access ---

    fn to_vec_1d(t: &Self::Tensor1D) -> Vec<f64> {
        t.to_vec()
    }

    fn to_vec_2d(t: &Self::Tensor2D) -> Vec<f64> {
        t.0.iter().copied().collect()
    }

    fn len_1d(t: &Self::Tensor1D) -> usize {
        t.len()
    }

    fn shape(t: &Self::Tensor2D) -> (usize, usize) {
        t.0.dim()
    }

    // --- Linear algebra ---

    fn matvec(a: &Self::Tensor2D, x: &Self::Tensor1D) -> Self::Tensor1D {
        a.0.dot(x)
    }

    fn matvec_transposed(a: &Self::Tensor2D, x: &Self::Tensor1D) -> Self::Tensor1D {
        a.0.t().dot(x)
    }

    // --- Column/row reductions ---

    fn col_mean_2d(t: &Self::Tensor2D) -> Self::Tensor1D {
        t.0.mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(t.0.ncols()))
    }

    fn col_std_2d(t: &Self::Tensor2D, ddof: usize) -> Self::Tensor1D {
        if t.0.ncols() == 0 {
            return Array1::zeros(0);
        }
        t.0.std_axis(Axis(0), ddof as f64)
    }

    fn row_sum_2d(t: &Self::Tensor2D) -> Self::Tensor1D {
        t.0.sum_axis(Axis(1))
    }

    // --- Broadcasting ---

    fn broadcast_sub_1d_to_2d_rows(t: &Self::Tensor2D, v: &Self::Tensor1D) -> Self::Tensor2D {
        NdarrayTensor2D(&t.0 - &v.view().insert_axis(Axis(0)))
    }

    fn broadcast_div_1d_to_2d_rows(t: &Self::Tensor2D, v: &Self::Tensor1D) -> Self::Tensor2D {
        NdarrayTensor2D(&t.0 / &v.view().insert_axis(Axis(0)))
    }

    fn broadcast_mul_1d_to_2d_rows(t: &Self::Tensor2D, v: &Self::Tensor1D) -> Self::Tensor2D {
        NdarrayTensor2D(&t.0 * &v.view().insert_axis(Axis(0)))
    }

    fn broadcast_add_1d_to_2d_rows(t: &Self::Tensor2D, v: &Self::Tensor1D) -> Self::Tensor2D {
        NdarrayTensor2D(&t.0 + &v.view().insert_axis(Axis(0)))
    }
}
