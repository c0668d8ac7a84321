//! `ext-tensor` - Column-major tensors and compute backends for user-defined graph operations.
//!
//! This crate provides:
//! - A `Tensor` type holding contiguous column-major data
//! - A `ComputeBackend` trait for pluggable compute
//! - A reference `CpuBackend` with the naive dense Times kernel
//! - A `DeviceDescriptor` naming the compute target
//! - Shape utilities and data type definitions

pub mod backend;
pub mod cpu;
pub mod device;
pub mod dtype;
pub mod error;
pub mod shape;
pub mod storage;
pub mod tensor;

// Re-export primary types at the crate root for convenience.
pub use backend::ComputeBackend;
pub use cpu::CpuBackend;
pub use device::DeviceDescriptor;
pub use dtype::DType;
pub use error::{Result, TensorError};
pub use shape::{flattened_index, Shape};
pub use storage::CpuStorage;
pub use tensor::Tensor;
