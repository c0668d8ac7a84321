use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::sync::OnceLock;

use ext_tensor::DeviceDescriptor;

use crate::dictionary::Dictionary;
use crate::error::{GraphError, Result};
use crate::value::Value;
use crate::variable::Variable;

/// Output slots of a forward call.
///
/// An empty slot asks the node to allocate its output; a filled slot may be
/// reused when its shape still fits.
pub type OutputMap = HashMap<Variable, Option<Value>>;

/// State a node hands back from forward for a later backward pass.
#[derive(Debug, Clone, PartialEq)]
pub struct BackPropState {
    op_name: String,
    device: DeviceDescriptor,
}

impl BackPropState {
    pub fn new(op_name: impl Into<String>, device: DeviceDescriptor) -> Self {
        BackPropState {
            op_name: op_name.into(),
            device,
        }
    }

    pub fn op_name(&self) -> &str {
        &self.op_name
    }

    pub fn device(&self) -> DeviceDescriptor {
        self.device
    }
}

/// Input storage and output registration shared by every node.
#[derive(Debug)]
pub struct FunctionBase {
    name: String,
    inputs: Vec<Variable>,
    outputs: OnceLock<Vec<Variable>>,
}

impl FunctionBase {
    pub fn new(inputs: Vec<Variable>, name: impl Into<String>) -> Self {
        FunctionBase {
            name: name.into(),
            inputs,
            outputs: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inputs(&self) -> &[Variable] {
        &self.inputs
    }

    /// Record the inferred outputs. Only the first registration sticks.
    pub(crate) fn register_outputs(&self, outputs: Vec<Variable>) -> &[Variable] {
        self.outputs.get_or_init(|| outputs)
    }

    /// Outputs recorded by shape inference.
    pub fn outputs(&self) -> Result<&[Variable]> {
        self.outputs
            .get()
            .map(Vec::as_slice)
            .ok_or_else(|| GraphError::Other(format!("outputs of '{}' have not been inferred", self.name)))
    }

    /// The single output of a one-output node.
    pub fn output(&self) -> Result<&Variable> {
        match self.outputs()? {
            [only] => Ok(only),
            many => Err(GraphError::Other(format!(
                "'{}' has {} outputs, expected exactly one",
                self.name,
                many.len()
            ))),
        }
    }
}

/// The contract a graph node implements.
///
/// The engine calls [`infer_outputs`](Function::infer_outputs) once when the
/// node is wrapped into a [`CompositeFunction`](crate::CompositeFunction) and
/// [`forward`](Function::forward) any number of times afterwards.
pub trait Function: Send + Sync + Debug {
    /// Shared input and output bookkeeping.
    fn base(&self) -> &FunctionBase;

    /// Constant identifier of the node type.
    fn op_name(&self) -> &str;

    /// Derive the output variables from the input variables.
    fn infer_outputs(&self) -> Result<Vec<Variable>>;

    /// Evaluate the node.
    ///
    /// `input_values` follow the order of [`inputs`](Function::inputs).
    /// The result is written into the slot of each output in `outputs`.
    fn forward(
        &self,
        input_values: &[&Value],
        outputs: &mut OutputMap,
        device: &DeviceDescriptor,
        retain_backward_state_for: &HashSet<Variable>,
    ) -> Result<Option<BackPropState>>;

    /// Describe the node for checkpointing.
    fn serialize(&self) -> Result<Dictionary>;

    /// Version of the format produced by [`serialize`](Function::serialize).
    fn current_version(&self) -> Result<usize>;

    fn name(&self) -> &str {
        self.base().name()
    }

    fn inputs(&self) -> &[Variable] {
        self.base().inputs()
    }
}
