use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::debug;

use ext_tensor::DeviceDescriptor;

use crate::error::{GraphError, Result};
use crate::function::{BackPropState, Function, OutputMap};
use crate::value::Value;
use crate::variable::Variable;

/// A callable graph rooted at one node.
///
/// Construction runs the root's shape inference, so a node with invalid
/// operands never becomes callable.
#[derive(Debug, Clone)]
pub struct CompositeFunction {
    root: Arc<dyn Function>,
    output: Variable,
}

impl CompositeFunction {
    /// Infer `root`'s output and wrap it as a callable graph.
    pub fn new(root: Arc<dyn Function>) -> Result<Self> {
        let inferred = root.infer_outputs()?;
        let output = match root.base().register_outputs(inferred) {
            [only] => only.clone(),
            many => {
                return Err(GraphError::Other(format!(
                    "'{}' inferred {} outputs, expected exactly one",
                    root.name(),
                    many.len()
                )))
            }
        };
        debug!(
            "{} '{}': inferred output {} {} over {:?}",
            root.op_name(),
            root.name(),
            output.shape(),
            output.dtype(),
            output.dynamic_axes()
        );
        Ok(CompositeFunction { root, output })
    }

    /// The node this graph is rooted at.
    pub fn root(&self) -> &Arc<dyn Function> {
        &self.root
    }

    /// Name of the root node.
    pub fn name(&self) -> &str {
        self.root.name()
    }

    /// Operation name of the root node.
    pub fn op_name(&self) -> &str {
        self.root.op_name()
    }

    /// The single output inferred at construction.
    pub fn output(&self) -> &Variable {
        &self.output
    }

    /// Inputs that must be bound at forward time.
    pub fn arguments(&self) -> Vec<Variable> {
        self.root
            .inputs()
            .iter()
            .filter(|v| !v.is_parameter())
            .cloned()
            .collect()
    }

    /// Inputs that carry their own value.
    pub fn parameters(&self) -> Vec<Variable> {
        self.root
            .inputs()
            .iter()
            .filter(|v| v.is_parameter())
            .cloned()
            .collect()
    }

    /// Bind `arguments`, check their shapes and evaluate the root.
    pub fn forward(
        &self,
        arguments: &HashMap<Variable, Value>,
        outputs: &mut OutputMap,
        device: &DeviceDescriptor,
        retain_backward_state_for: &HashSet<Variable>,
    ) -> Result<Option<BackPropState>> {
        let mut input_values: Vec<&Value> = Vec::with_capacity(self.root.inputs().len());
        for input in self.root.inputs() {
            let value: &Value = match input.value() {
                Some(v) => v.as_ref(),
                None => arguments
                    .get(input)
                    .ok_or_else(|| GraphError::MissingArgument(input.uid()))?,
            };
            if !input.accepts_shape(value.shape()) {
                return Err(GraphError::ValueShapeMismatch {
                    variable: input.uid(),
                    expected: input.shape().dims().to_vec(),
                    got: value.shape().dims().to_vec(),
                });
            }
            input_values.push(value);
        }
        outputs.entry(self.output.clone()).or_insert(None);
        self.root
            .forward(&input_values, outputs, device, retain_backward_state_for)
    }

    /// Evaluate with fresh output slots and no retained state, returning the
    /// output value.
    pub fn evaluate(&self, arguments: &HashMap<Variable, Value>, device: &DeviceDescriptor) -> Result<Value> {
        let mut outputs = OutputMap::new();
        self.forward(arguments, &mut outputs, device, &HashSet::new())?;
        outputs
            .remove(&self.output)
            .flatten()
            .ok_or_else(|| GraphError::Other(format!("'{}' produced no output value", self.name())))
    }
}
