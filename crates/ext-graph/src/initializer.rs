use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ext_tensor::{CpuStorage, DType, DeviceDescriptor, Shape, Tensor};

use crate::error::{GraphError, Result};

/// How a parameter's initial value is produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Initializer {
    /// Every element set to the same value.
    Constant(f64),
    /// Uniform in `[-scale, scale]`.
    Uniform { scale: f64, seed: Option<u64> },
    /// Uniform in `[-s, s]` with `s = sqrt(6 / (fan_in + fan_out))`.
    ///
    /// `fan_out` is the first dimension, `fan_in` the product of the rest.
    GlorotUniform { seed: Option<u64> },
}

impl Initializer {
    /// Glorot uniform with a fresh entropy seed.
    pub fn glorot_uniform() -> Self {
        Initializer::GlorotUniform { seed: None }
    }

    /// Materialize a tensor of `shape` and `dtype` on `device`.
    ///
    /// # Errors
    /// Returns an error when a uniform scale is NaN or infinite. A scale of
    /// zero or below yields all zeros.
    pub fn initialize(&self, shape: &Shape, dtype: DType, device: DeviceDescriptor) -> Result<Tensor> {
        let values = self.generate(shape)?;
        let storage = match dtype {
            DType::F32 => CpuStorage::from_f32_vec(values.iter().map(|&v| v as f32).collect()),
            DType::F64 => CpuStorage::from_f64_vec(values),
        };
        Ok(Tensor::from_storage(storage, shape.clone(), device)?)
    }

    fn generate(&self, shape: &Shape) -> Result<Vec<f64>> {
        let n = shape.numel();
        match *self {
            Initializer::Constant(v) => Ok(vec![v; n]),
            Initializer::Uniform { scale, seed } => uniform(n, scale, seed),
            Initializer::GlorotUniform { seed } => {
                let (fan_out, fan_in) = match shape.dims().split_first() {
                    Some((&out, rest)) => (out, rest.iter().product::<usize>()),
                    None => (1, 1),
                };
                let scale = (6.0 / (fan_in + fan_out) as f64).sqrt();
                uniform(n, scale, seed)
            }
        }
    }
}

fn uniform(n: usize, scale: f64, seed: Option<u64>) -> Result<Vec<f64>> {
    if !scale.is_finite() {
        return Err(GraphError::Other(format!(
            "uniform initializer scale must be finite, got {}",
            scale
        )));
    }
    if scale <= 0.0 {
        return Ok(vec![0.0; n]);
    }
    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    Ok((0..n).map(|_| rng.gen_range(-scale..=scale)).collect())
}
