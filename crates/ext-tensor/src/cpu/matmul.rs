//! Naive dense kernels over column-major buffers.

use log::trace;

use crate::error::{Result, TensorError};
use crate::shape::Shape;

/// Computes `out = left x right` for column-major buffers.
///
/// `left` is viewed as `[m, k]`, `right` as `[k, n]` and `out` as `[m, n]`,
/// each through its own shape. The output is zeroed and then accumulated in
/// column, contraction, row order.
pub fn times_column_major(
    left: &[f32],
    left_shape: &Shape,
    right: &[f32],
    right_shape: &Shape,
    out: &mut [f32],
    out_shape: &Shape,
) -> Result<()> {
    let (m, k) = left_shape.as_matrix()?;
    let (k2, n) = right_shape.as_matrix()?;
    if k != k2 {
        return Err(TensorError::ContractionMismatch { m, k, k2, n });
    }
    if out_shape.as_matrix()? != (m, n) {
        return Err(TensorError::ShapeMismatch {
            expected: vec![m, n],
            got: out_shape.dims().to_vec(),
        });
    }
    check_len("left", left, left_shape)?;
    check_len("right", right, right_shape)?;
    check_len("out", out, out_shape)?;

    trace!("times: [{}x{}] x [{}x{}]", m, k, k2, n);

    out.fill(0.0);
    for j in 0..n {
        for p in 0..k {
            let r = right[right_shape.flattened_index(p, j)];
            for i in 0..m {
                out[out_shape.flattened_index(i, j)] += left[left_shape.flattened_index(i, p)] * r;
            }
        }
    }
    Ok(())
}

fn check_len(which: &str, data: &[f32], shape: &Shape) -> Result<()> {
    if data.len() != shape.numel() {
        return Err(TensorError::Other(format!(
            "times: {}.len()={} but shape {} has {} elements",
            which,
            data.len(),
            shape,
            shape.numel()
        )));
    }
    Ok(())
}
