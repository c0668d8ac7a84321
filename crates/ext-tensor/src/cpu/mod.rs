pub mod matmul;

use crate::backend::ComputeBackend;
use crate::dtype::DType;
use crate::error::{Result, TensorError};
use crate::tensor::Tensor;

/// Pure-Rust CPU compute backend.
///
/// Implements all operations with straightforward loops optimized for
/// correctness rather than peak performance. Intended as a reference
/// implementation.
#[derive(Debug, Clone)]
pub struct CpuBackend;

impl CpuBackend {
    pub fn new() -> Self {
        CpuBackend
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ComputeBackend for CpuBackend {
    fn name(&self) -> &str {
        "cpu"
    }

    fn matmul(&self, a: &[f32], b: &[f32], m: usize, k: usize, n: usize) -> Result<Vec<f32>> {
        if a.len() != m * k {
            return Err(TensorError::Other(format!(
                "matmul: a.len()={} but expected m*k={}",
                a.len(),
                m * k
            )));
        }
        if b.len() != k * n {
            return Err(TensorError::Other(format!(
                "matmul: b.len()={} but expected k*n={}",
                b.len(),
                k * n
            )));
        }

        let mut c = vec![0.0f32; m * n];
        for i in 0..m {
            for j in 0..n {
                let mut sum = 0.0f32;
                for p in 0..k {
                    sum += a[i * k + p] * b[p * n + j];
                }
                c[i * n + j] = sum;
            }
        }
        Ok(c)
    }

    fn times(&self, left: &Tensor, right: &Tensor, out: &mut Tensor) -> Result<()> {
        let operands = [
            ("left", left.dtype()),
            ("right", right.dtype()),
            ("out", out.dtype()),
        ];
        for (which, dtype) in operands {
            if dtype != DType::F32 {
                return Err(TensorError::UnsupportedDType(format!(
                    "times: {} operand is {}, only f32 is supported",
                    which, dtype
                )));
            }
        }
        let out_shape = out.shape().clone();
        matmul::times_column_major(
            left.data_f32()?,
            left.shape(),
            right.data_f32()?,
            right.shape(),
            out.data_f32_mut()?,
            &out_shape,
        )
    }
}
