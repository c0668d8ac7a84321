//! A user-defined Times node: `Y = W x` for a fixed weight matrix `W` and a
//! possibly batched vector input `x`.
//!
//! The node is forward-only. It never returns backward state and offers no
//! gradient; training through it is not supported.

use std::collections::HashSet;
use std::sync::Arc;

use log::debug;

use ext_tensor::{DeviceDescriptor, Shape, Tensor};

use crate::composite::CompositeFunction;
use crate::dictionary::Dictionary;
use crate::error::{GraphError, Result};
use crate::function::{BackPropState, Function, FunctionBase, OutputMap};
use crate::value::Value;
use crate::variable::Variable;

pub const USER_TIMES_OP_NAME: &str = "UserTimesOp";

#[derive(Debug)]
pub struct UserTimesFunction {
    base: FunctionBase,
}

impl UserTimesFunction {
    /// Build the node over `left` (the weight matrix) and `right` (the input
    /// vector) and wrap it into a callable composite.
    ///
    /// Operand checks run during shape inference, which happens here, so an
    /// invalid operand fails this call.
    pub fn create(left: &Variable, right: &Variable, name: &str) -> Result<CompositeFunction> {
        CompositeFunction::new(Arc::new(UserTimesFunction::new(left, right, name)))
    }

    fn new(left: &Variable, right: &Variable, name: &str) -> Self {
        UserTimesFunction {
            base: FunctionBase::new(vec![left.clone(), right.clone()], name),
        }
    }

    fn operands(&self) -> Result<(&Variable, &Variable)> {
        match self.base.inputs() {
            [left, right] => Ok((left, right)),
            other => Err(GraphError::Other(format!(
                "{} expects 2 inputs, has {}",
                USER_TIMES_OP_NAME,
                other.len()
            ))),
        }
    }

    fn invalid(&self, reason: &str) -> GraphError {
        GraphError::InvalidOperand {
            function: format!("{} '{}'", USER_TIMES_OP_NAME, self.base.name()),
            reason: reason.to_string(),
        }
    }
}

impl Function for UserTimesFunction {
    fn base(&self) -> &FunctionBase {
        &self.base
    }

    fn op_name(&self) -> &str {
        USER_TIMES_OP_NAME
    }

    fn infer_outputs(&self) -> Result<Vec<Variable>> {
        let (left, right) = self.operands()?;

        if left.shape().rank() != 2 {
            return Err(self.invalid("left operand must be 2D"));
        }
        if right.shape().rank() != 1 {
            return Err(self.invalid("right operand must be 1D"));
        }
        if !left.dynamic_axes().is_empty() {
            return Err(self.invalid(
                "left operand must not have dynamic axes (it must be a fixed-size parameter, not minibatch data)",
            ));
        }

        Ok(vec![Variable::output(
            Shape::new(vec![left.shape().dim(0)]),
            left.dtype(),
            right.dynamic_axes().to_vec(),
            self.base.name(),
        )])
    }

    fn forward(
        &self,
        input_values: &[&Value],
        outputs: &mut OutputMap,
        device: &DeviceDescriptor,
        _retain_backward_state_for: &HashSet<Variable>,
    ) -> Result<Option<BackPropState>> {
        let (left, right) = match input_values {
            [left, right] => (left.data(), right.data()),
            other => {
                return Err(GraphError::Other(format!(
                    "{} expects 2 input values, got {}",
                    USER_TIMES_OP_NAME,
                    other.len()
                )))
            }
        };

        let (rows, _) = left.shape().as_matrix()?;
        let out_shape = Shape::new(vec![rows]).append(right.shape().trailing(1));
        let dtype = left.dtype();

        // The kernel validates before writing, so a reused value is left
        // untouched on error and a fresh one is only stored on success.
        let slot = outputs.entry(self.base.output()?.clone()).or_insert(None);
        match slot {
            Some(out) if out.shape() == &out_shape && out.dtype() == dtype => {
                device.backend().times(left, right, out.data_mut())?;
            }
            _ => {
                debug!(
                    "{} '{}': allocating output {} on {}",
                    USER_TIMES_OP_NAME,
                    self.base.name(),
                    out_shape,
                    device
                );
                let mut out = Value::new(Tensor::zeros(out_shape, dtype, *device));
                device.backend().times(left, right, out.data_mut())?;
                *slot = Some(out);
            }
        }
        Ok(None)
    }

    fn serialize(&self) -> Result<Dictionary> {
        Err(GraphError::NotImplemented("UserTimesFunction::serialize"))
    }

    fn current_version(&self) -> Result<usize> {
        Err(GraphError::NotImplemented("UserTimesFunction::current_version"))
    }
}
