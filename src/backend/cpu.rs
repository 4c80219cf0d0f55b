use super::Backend;

/// Pure-Rust backend storing tensors as flat `Vec<f64>` buffers.
#[derive(Clone, Debug, Copy)]
pub struct CpuBackend;

/// Row-major 2D buffer: `(data, rows, cols)`.
#[derive(Debug, Clone)]
pub struct CpuTensor2D(pub Vec<f64>, pub usize, pub usize);

impl CpuTensor2D {
    pub fn new(data: Vec<f64>, rows: usize, cols: usize) -> Self {
        assert_eq!(data.len(), rows * cols, "Inconsistent shape");
        Self(data, rows, cols)
    }

    fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self(self.0.iter().map(|&x| f(x)).collect(), self.1, self.2)
    }

    fn zip_with(&self, other: &Self, f: impl Fn(f64, f64) -> f64) -> Self {
        assert_eq!((self.1, self.2), (other.1, other.2), "Shapes must match");
        Self(
            self.0.iter().zip(other.0.iter()).map(|(&a, &b)| f(a, b)).collect(),
            self.1,
            self.2,
        )
    }

    fn broadcast_rows(&self, v: &[f64], f: impl Fn(f64, f64) -> f64) -> Self {
        assert_eq!(self.2, v.len(), "Row vector length must equal column count");
        let data = self
            .0
            .chunks(self.2.max(1))
            .flat_map(|row| row.iter().zip(v.iter()).map(|(&x, &y)| f(x, y)))
            .collect();
        Self(data, self.1, self.2)
    }

    fn rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks(0) panics; a zero-column tensor has no row data anyway
        self.0.chunks(self.2.max(1))
    }
}

impl Backend for CpuBackend {
    type Scalar = f64;
    type Tensor1D = Vec<f64>;
    type Tensor2D = CpuTensor2D;

    fn name() -> &'static str {
        "CpuBackend"
    }

    // --- Constructors ---
    fn zeros_1d(len: usize) -> Self::Tensor1D {
        vec![0.; len]
    }

    fn zeros_2d(rows: usize, cols: usize) -> Self::Tensor2D {
        CpuTensor2D::new(vec![0.; rows * cols], rows, cols)
    }

    fn from_vec_1d(data: Vec<f32>) -> Self::Tensor1D {
        data.into_iter().map(|x| x as f64).collect()
    }

    fn from_f64_1d(data: Vec<f64>) -> Self::Tensor1D {
        data
    }

    fn from_vec_2d(data: Vec<f32>, rows: usize, cols: usize) -> Self::Tensor2D {
        CpuTensor2D::new(data.into_iter().map(|x| x as f64).collect(), rows, cols)
    }

    // --- Element-wise ops ---
    fn add_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D {
        assert_eq!(a.len(), b.len(), "Shapes must match");
        a.iter().zip(b.iter()).map(|(a, b)| a + b).collect()
    }

    fn sub_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D {
        assert_eq!(a.len(), b.len(), "Shapes must match");
        a.iter().zip(b.iter()).map(|(a, b)| a - b).collect()
    }

    fn mul_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D {
        assert_eq!(a.len(), b.len(), "Shapes must match");
        a.iter().zip(b.iter()).map(|(a, b)| a * b).collect()
    }

    fn div_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D {
        assert_eq!(a.len(), b.len(), "Shapes must match");
        a.iter().zip(b.iter()).map(|(a, b)| a / b).collect()
    }

    fn mul_scalar_1d(t: &Self::Tensor1D, s: &Self::Scalar) -> Self::Tensor1D {
        t.iter().map(|x| x * s).collect()
    }

    fn add_scalar_1d(t: &Self::Tensor1D, s: &Self::Scalar) -> Self::Tensor1D {
        t.iter().map(|x| x + s).collect()
    }

    fn sqrt_1d(t: &Self::Tensor1D) -> Self::Tensor1D {
        t.iter().map(|x| x.sqrt()).collect()
    }

    fn mul_scalar_2d(t: &Self::Tensor2D, s: &Self::Scalar) -> Self::Tensor2D {
        t.map(|x| x * s)
    }

    fn sub_2d(a: &Self::Tensor2D, b: &Self::Tensor2D) -> Self::Tensor2D {
        a.zip_with(b, |x, y| x - y)
    }

    fn mul_2d(a: &Self::Tensor2D, b: &Self::Tensor2D) -> Self::Tensor2D {
        a.zip_with(b, |x, y| x * y)
    }

    // --- Reductions ---
    fn mean_all_1d(t: &Self::Tensor1D) -> Self::Scalar {
        t.iter().sum::<f64>() / t.len() as f64
    }

    fn sum_all_1d(t: &Self::Tensor1D) -> Self::Scalar {
        t.iter().sum::<f64>()
    }

    fn mean_all_2d(t: &Self::Tensor2D) -> Self::Scalar {
        t.0.iter().sum::<f64>() / t.0.len() as f64
    }

    fn scalar_f64(value: f64) -> Self::Scalar {
        value
    }

    // --- Access ---
    fn to_vec_1d(t: &Self::Tensor1D) -> Vec<f64> {
        t.clone()
    }

    fn to_vec_2d(t: &Self::Tensor2D) -> Vec<f64> {
        t.0.clone()
    }

    fn len_1d(t: &Self::Tensor1D) -> usize {
        t.len()
    }

    fn shape(t: &Self::Tensor2D) -> (usize, usize) {
        (t.1, t.2)
    }

    // --- Linear algebra ---
    fn matvec(a: &CpuTensor2D, x: &Vec<f64>) -> Vec<f64> {
        assert_eq!(a.2, x.len(), "Matrix columns must equal vector length");
        let mut result = Vec::with_capacity(a.1);
        for i in 0..a.1 {
            let row = &a.0[i * a.2..(i + 1) * a.2];
            result.push(row.iter().zip(x.iter()).map(|(w, v)| w * v).sum());
        }
        result
    }

    fn matvec_transposed(a: &CpuTensor2D, x: &Vec<f64>) -> Vec<f64> {
        assert_eq!(a.1, x.len(), "Matrix rows must equal vector length");
        let mut result = vec![0.0; a.2];
        for (row, &xi) in a.rows().zip(x.iter()) {
            for (acc, &v) in result.iter_mut().zip(row.iter()) {
                *acc += v * xi;
            }
        }
        result
    }

    // --- Column/row reductions ---
    fn col_mean_2d(t: &Self::Tensor2D) -> Self::Tensor1D {
        let sums = Self::matvec_transposed(t, &vec![1.0; t.1]);
        sums.into_iter().map(|s| s / t.1 as f64).collect()
    }

    fn col_std_2d(t: &Self::Tensor2D, ddof: usize) -> Self::Tensor1D {
        let mean = Self::col_mean_2d(t);
        let mut var = vec![0.0; t.2];
        for row in t.rows() {
            for ((acc, &x), &m) in var.iter_mut().zip(row.iter()).zip(mean.iter()) {
                *acc += (x - m) * (x - m);
            }
        }
        let denom = t.1.saturating_sub(ddof) as f64;
        var.into_iter().map(|v| (v / denom).sqrt()).collect()
    }

    fn row_sum_2d(t: &Self::Tensor2D) -> Self::Tensor1D {
        if t.2 == 0 {
            return vec![0.0; t.1];
        }
        t.rows().map(|row| row.iter().sum()).collect()
    }

    // --- Broadcasting ---
    fn broadcast_sub_1d_to_2d_rows(t: &Self::Tensor2D, v: &Self::Tensor1D) -> Self::Tensor2D {
        t.broadcast_rows(v, |x, y| x - y)
    }

    fn broadcast_div_1d_to_2d_rows(t: &Self::Tensor2D, v: &Self::Tensor1D) -> Self::Tensor2D {
        t.broadcast_rows(v, |x, y| x / y)
    }

    fn broadcast_mul_1d_to_2d_rows(t: &Self::Tensor2D, v: &Self::Tensor1D) -> Self::Tensor2D {
        t.broadcast_rows(v, |x, y| x * y)
    }

    fn broadcast_add_1d_to_2d_rows(t: &Self::Tensor2D, v: &Self::Tensor1D) -> Self::Tensor2D {
        t.broadcast_rows(v, |x, y| x + y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Device;

    #[test]
    fn test_matvec_transposed() {
        // X = [[1, 2], [3, 4], [5, 6]], v = [1, 0, 2]
        // Xᵀ @ v = [1 + 10, 2 + 12] = [11, 14]
        let x = CpuTensor2D::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3, 2);
        let v = vec![1.0, 0.0, 2.0];
        assert_eq!(CpuBackend::matvec_transposed(&x, &v), vec![11.0, 14.0]);
    }

    #[test]
    fn test_matvec() {
        let a = CpuTensor2D::new(vec![1.0, 2.0, 3.0, 4.0], 2, 2);
        assert_eq!(CpuBackend::matvec(&a, &vec![1.0, 2.0]), vec![5.0, 11.0]);
    }

    #[test]
    fn test_col_mean_and_std() {
        let t = CpuTensor2D::new(vec![0.0, 1.0, 0.0, 1.0, 1.0, 3.0], 3, 2);
        let mean = CpuBackend::col_mean_2d(&t);
        assert!((mean[0] - 1.0 / 3.0).abs() < 1e-12);
        assert!((mean[1] - 5.0 / 3.0).abs() < 1e-12);

        let std = CpuBackend::col_std_2d(&t, 0);
        // population variance of [0, 0, 1] = 2/9
        assert!((std[0] - (2.0f64 / 9.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_row_sum() {
        let t = CpuTensor2D::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3);
        assert_eq!(CpuBackend::row_sum_2d(&t), vec![6.0, 15.0]);
    }

    #[test]
    fn test_row_sum_zero_columns() {
        let t = CpuBackend::zeros_2d(3, 0);
        assert_eq!(CpuBackend::row_sum_2d(&t), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_broadcast_rows() {
        let t = CpuTensor2D::new(vec![1.0, 2.0, 3.0, 4.0], 2, 2);
        let v = vec![1.0, 2.0];
        assert_eq!(
            CpuBackend::broadcast_sub_1d_to_2d_rows(&t, &v).0,
            vec![0.0, 0.0, 2.0, 2.0]
        );
        assert_eq!(
            CpuBackend::broadcast_div_1d_to_2d_rows(&t, &v).0,
            vec![1.0, 1.0, 3.0, 2.0]
        );
    }

    #[test]
    fn test_sqrt_and_scalar_ops() {
        let t = vec![4.0, 9.0];
        assert_eq!(CpuBackend::sqrt_1d(&t), vec![2.0, 3.0]);
        assert_eq!(CpuBackend::add_scalar_1d(&t, &1.0), vec![5.0, 10.0]);
        assert_eq!(CpuBackend::mul_scalar_1d(&t, &0.5), vec![2.0, 4.5]);
    }

    #[test]
    fn test_to_device_cpu_is_identity() {
        let t = vec![1.0, 2.0];
        assert_eq!(CpuBackend::to_device_1d(&t, Device::Cpu).unwrap(), t);
    }

    #[test]
    fn test_to_device_cuda_unavailable() {
        let t = CpuBackend::zeros_2d(1, 1);
        assert!(!CpuBackend::is_available(Device::Cuda(0)));
        assert!(CpuBackend::to_device_2d(&t, Device::Cuda(0)).is_err());
    }

    #[test]
    #[should_panic]
    fn test_inconsistent_shape_panics() {
        let _ = CpuTensor2D::new(vec![1.0, 2.0, 3.0], 2, 2);
    }
}
