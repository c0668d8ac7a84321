use std::fmt::Debug;

use crate::error::Result;
use crate::tensor::Tensor;

/// Trait for pluggable compute backends.
///
/// Graph nodes never touch raw loops themselves; they hand their bound
/// buffers to the backend serving the device they were asked to run on.
pub trait ComputeBackend: Send + Sync + Debug {
    /// Returns the name of this backend (e.g., "cpu").
    fn name(&self) -> &str;

    /// Row-major matrix multiplication: C = A @ B.
    ///
    /// - `a`: row-major data of shape [m, k]
    /// - `b`: row-major data of shape [k, n]
    /// - Returns: row-major data of shape [m, n]
    fn matmul(&self, a: &[f32], b: &[f32], m: usize, k: usize, n: usize) -> Result<Vec<f32>>;

    /// Column-major product `out = left x right`, written in place.
    ///
    /// - `left`: shape [m, k]
    /// - `right`: shape [k] or [k, ...], trailing dims are columns
    /// - `out`: shape [m] followed by the trailing dims of `right`
    ///
    /// `out` is fully overwritten; its previous contents never leak into
    /// the result.
    fn times(&self, left: &Tensor, right: &Tensor, out: &mut Tensor) -> Result<()>;
}
