use std::fmt;

use crate::backend::ComputeBackend;
use crate::cpu::CpuBackend;

static CPU_BACKEND: CpuBackend = CpuBackend;

/// The kinds of compute target a tensor can live on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    Cpu,
}

/// Opaque handle naming the compute target of an allocation or a forward call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceDescriptor {
    kind: DeviceKind,
    id: u32,
}

impl DeviceDescriptor {
    /// The host CPU.
    pub fn cpu() -> Self {
        DeviceDescriptor {
            kind: DeviceKind::Cpu,
            id: 0,
        }
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Returns the compute backend serving this device.
    pub fn backend(&self) -> &'static dyn ComputeBackend {
        match self.kind {
            DeviceKind::Cpu => &CPU_BACKEND,
        }
    }
}

impl Default for DeviceDescriptor {
    fn default() -> Self {
        Self::cpu()
    }
}

impl fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DeviceKind::Cpu => write!(f, "cpu:{}", self.id),
        }
    }
}
