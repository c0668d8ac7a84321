use crate::device::DeviceDescriptor;
use crate::dtype::DType;
use crate::error::{Result, TensorError};
use crate::shape::Shape;
use crate::storage::CpuStorage;

/// A dense tensor backed by CPU storage.
///
/// Holds contiguous, column-major data with an associated shape and the
/// device it was allocated for. Computation on tensors is performed by a
/// `ComputeBackend`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    storage: CpuStorage,
    shape: Shape,
    device: DeviceDescriptor,
}

impl Tensor {
    /// Create a new f32 tensor on the CPU from column-major data and a shape.
    ///
    /// # Panics
    /// Panics if `data.len() != shape.numel()`.
    pub fn new(data: Vec<f32>, shape: Shape) -> Self {
        assert_eq!(
            data.len(),
            shape.numel(),
            "data length {} does not match shape {} (numel={})",
            data.len(),
            shape,
            shape.numel()
        );
        Tensor {
            storage: CpuStorage::from_f32_vec(data),
            shape,
            device: DeviceDescriptor::cpu(),
        }
    }

    /// Create an f32 tensor on `device`, checking the element count.
    pub fn from_vec(data: Vec<f32>, shape: Shape, device: DeviceDescriptor) -> Result<Self> {
        if data.len() != shape.numel() {
            return Err(TensorError::Other(format!(
                "data length {} does not match shape {} (numel={})",
                data.len(),
                shape,
                shape.numel()
            )));
        }
        Ok(Tensor {
            storage: CpuStorage::from_f32_vec(data),
            shape,
            device,
        })
    }

    /// Wrap existing storage on `device`, checking the element count.
    pub fn from_storage(storage: CpuStorage, shape: Shape, device: DeviceDescriptor) -> Result<Self> {
        if storage.len() != shape.numel() {
            return Err(TensorError::Other(format!(
                "storage length {} does not match shape {} (numel={})",
                storage.len(),
                shape,
                shape.numel()
            )));
        }
        Ok(Tensor {
            storage,
            shape,
            device,
        })
    }

    /// Create a zero-filled tensor with the given shape and dtype on `device`.
    pub fn zeros(shape: Shape, dtype: DType, device: DeviceDescriptor) -> Self {
        let n = shape.numel();
        Tensor {
            storage: CpuStorage::zeros(dtype, n),
            shape,
            device,
        }
    }

    /// Returns a reference to the tensor's shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the tensor's data type.
    pub fn dtype(&self) -> DType {
        self.storage.dtype()
    }

    /// Returns the device the tensor was allocated for.
    pub fn device(&self) -> DeviceDescriptor {
        self.device
    }

    /// Returns the underlying data as an f32 slice.
    pub fn data_f32(&self) -> Result<&[f32]> {
        self.storage.as_f32_slice()
    }

    /// Returns the underlying data as a writable f32 slice.
    pub fn data_f32_mut(&mut self) -> Result<&mut [f32]> {
        self.storage.as_f32_slice_mut()
    }
}
