//! Graph variables: inputs, parameters and node outputs.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ext_tensor::{DType, DeviceDescriptor, Shape};

use crate::axis::Axis;
use crate::error::Result;
use crate::initializer::Initializer;
use crate::value::Value;

/// Global counter for unique variable IDs.
static VARIABLE_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_variable_id() -> u64 {
    VARIABLE_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    /// Placeholder bound to data at forward time.
    Input,
    /// Fixed-size learnable tensor owning its value.
    Parameter,
    /// Produced by a node.
    Output,
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableKind::Input => write!(f, "Input"),
            VariableKind::Parameter => write!(f, "Parameter"),
            VariableKind::Output => write!(f, "Output"),
        }
    }
}

#[derive(Debug)]
struct VariableInner {
    id: u64,
    kind: VariableKind,
    shape: Shape,
    dtype: DType,
    dynamic_axes: Vec<Axis>,
    name: String,
    owner: Option<String>,
    value: Option<Arc<Value>>,
}

/// A handle to a graph variable.
///
/// Clones share the same variable; equality and hashing go by identity, so
/// a `Variable` can key the argument and output maps of a forward call.
#[derive(Clone)]
pub struct Variable {
    inner: Arc<VariableInner>,
}

impl Variable {
    /// A placeholder for per-call data such as a minibatch.
    pub fn input(shape: Shape, dtype: DType, dynamic_axes: Vec<Axis>, name: impl Into<String>) -> Self {
        Self::build(VariableKind::Input, shape, dtype, dynamic_axes, name.into(), None, None)
    }

    /// A parameter with a value produced by `initializer` on `device`.
    ///
    /// Parameters never carry dynamic axes.
    pub fn parameter(
        shape: Shape,
        dtype: DType,
        initializer: &Initializer,
        device: DeviceDescriptor,
        name: impl Into<String>,
    ) -> Result<Self> {
        let value = Value::new(initializer.initialize(&shape, dtype, device)?);
        Ok(Self::build(
            VariableKind::Parameter,
            shape,
            dtype,
            Vec::new(),
            name.into(),
            None,
            Some(Arc::new(value)),
        ))
    }

    /// The output of the node named `owner`.
    pub(crate) fn output(shape: Shape, dtype: DType, dynamic_axes: Vec<Axis>, owner: &str) -> Self {
        Self::build(
            VariableKind::Output,
            shape,
            dtype,
            dynamic_axes,
            String::new(),
            Some(owner.to_string()),
            None,
        )
    }

    fn build(
        kind: VariableKind,
        shape: Shape,
        dtype: DType,
        dynamic_axes: Vec<Axis>,
        name: String,
        owner: Option<String>,
        value: Option<Arc<Value>>,
    ) -> Self {
        Variable {
            inner: Arc::new(VariableInner {
                id: next_variable_id(),
                kind,
                shape,
                dtype,
                dynamic_axes,
                name,
                owner,
                value,
            }),
        }
    }

    /// Whether this is an input, parameter or output.
    pub fn kind(&self) -> VariableKind {
        self.inner.kind
    }

    /// True for parameters, which carry their own value.
    pub fn is_parameter(&self) -> bool {
        self.inner.kind == VariableKind::Parameter
    }

    /// Static shape, excluding dynamic axes.
    pub fn shape(&self) -> &Shape {
        &self.inner.shape
    }

    /// Element type.
    pub fn dtype(&self) -> DType {
        self.inner.dtype
    }

    /// Axes whose extent is only known when a value is bound.
    pub fn dynamic_axes(&self) -> &[Axis] {
        &self.inner.dynamic_axes
    }

    /// User-facing name; may be empty.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Name of the node producing this variable, for outputs.
    pub fn owner(&self) -> Option<&str> {
        self.inner.owner.as_deref()
    }

    /// Value of a parameter.
    pub fn value(&self) -> Option<&Arc<Value>> {
        self.inner.value.as_ref()
    }

    /// Unique identifier, e.g. `Parameter3`.
    pub fn uid(&self) -> String {
        format!("{}{}", self.inner.kind, self.inner.id)
    }

    /// Whether a bound value's shape fits this variable: the static shape
    /// followed by exactly one extent per dynamic axis.
    pub fn accepts_shape(&self, shape: &Shape) -> bool {
        let rank = self.inner.shape.rank();
        shape.rank() == rank + self.inner.dynamic_axes.len() && shape.dims()[..rank] == *self.inner.shape.dims()
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Variable {}

impl Hash for Variable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variable")
            .field("uid", &self.uid())
            .field("name", &self.inner.name)
            .field("shape", &self.inner.shape)
            .field("dtype", &self.inner.dtype)
            .field("dynamic_axes", &self.inner.dynamic_axes)
            .finish()
    }
}
