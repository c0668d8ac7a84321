use ext_tensor::{DType, DeviceDescriptor, Shape, Tensor};

use crate::error::{GraphError, Result};

/// Concrete data bound to a variable for one forward call.
///
/// The tensor's shape is the variable's static shape followed by one extent
/// per dynamic axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    data: Tensor,
}

impl Value {
    /// Wrap a tensor as a value.
    pub fn new(data: Tensor) -> Self {
        Value { data }
    }

    /// Build a batch of samples along the batch axis.
    ///
    /// `data` holds the samples back to back, each in column-major order
    /// with `sample_shape`. The resulting shape is `sample_shape` followed by
    /// the batch size.
    pub fn create_batch(sample_shape: &Shape, data: &[f32], device: DeviceDescriptor) -> Result<Self> {
        let sample_len = sample_shape.numel();
        if sample_len == 0 || data.is_empty() || data.len() % sample_len != 0 {
            return Err(GraphError::Other(format!(
                "batch data of length {} is not a whole number of samples of shape {}",
                data.len(),
                sample_shape
            )));
        }
        let batch = data.len() / sample_len;
        let tensor = Tensor::from_vec(data.to_vec(), sample_shape.append(&[batch]), device)?;
        Ok(Value::new(tensor))
    }

    /// The underlying tensor.
    pub fn data(&self) -> &Tensor {
        &self.data
    }

    /// Writable access to the underlying tensor.
    pub fn data_mut(&mut self) -> &mut Tensor {
        &mut self.data
    }

    /// Full shape, including dynamic-axis extents.
    pub fn shape(&self) -> &Shape {
        self.data.shape()
    }

    /// Element type of the data.
    pub fn dtype(&self) -> DType {
        self.data.dtype()
    }

    /// Device the data lives on.
    pub fn device(&self) -> DeviceDescriptor {
        self.data.device()
    }
}
