//! The built-in Times node, kept as the reference the user-defined op is
//! checked against.

use std::collections::HashSet;
use std::sync::Arc;

use log::debug;

use ext_tensor::{DeviceDescriptor, Shape, Tensor, TensorError};

use crate::composite::CompositeFunction;
use crate::dictionary::{Dictionary, DictionaryValue};
use crate::error::{GraphError, Result};
use crate::function::{BackPropState, Function, FunctionBase, OutputMap};
use crate::value::Value;
use crate::variable::Variable;

pub const TIMES_OP_NAME: &str = "Times";

const TIMES_VERSION: usize = 1;

#[derive(Debug)]
pub struct TimesFunction {
    base: FunctionBase,
}

impl TimesFunction {
    /// `left x right` for a `[m, k]` left operand and a `[k, ...]` right
    /// operand.
    pub fn create(left: &Variable, right: &Variable, name: &str) -> Result<CompositeFunction> {
        CompositeFunction::new(Arc::new(TimesFunction {
            base: FunctionBase::new(vec![left.clone(), right.clone()], name),
        }))
    }

    fn invalid(&self, reason: String) -> GraphError {
        GraphError::InvalidOperand {
            function: format!("{} '{}'", TIMES_OP_NAME, self.base.name()),
            reason,
        }
    }
}

impl Function for TimesFunction {
    fn base(&self) -> &FunctionBase {
        &self.base
    }

    fn op_name(&self) -> &str {
        TIMES_OP_NAME
    }

    fn infer_outputs(&self) -> Result<Vec<Variable>> {
        let (left, right) = match self.base.inputs() {
            [left, right] => (left, right),
            other => return Err(self.invalid(format!("expected 2 inputs, got {}", other.len()))),
        };
        if left.shape().rank() != 2 {
            return Err(self.invalid(format!("left operand must be 2D, got {}", left.shape())));
        }
        if !left.dynamic_axes().is_empty() {
            return Err(self.invalid("left operand must not have dynamic axes".to_string()));
        }
        if right.shape().rank() == 0 || right.shape().dim(0) != left.shape().dim(1) {
            return Err(self.invalid(format!(
                "cannot multiply {} by {}",
                left.shape(),
                right.shape()
            )));
        }

        let out_shape = Shape::new(vec![left.shape().dim(0)]).append(right.shape().trailing(1));
        Ok(vec![Variable::output(
            out_shape,
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
        retain_backward_state_for: &HashSet<Variable>,
    ) -> Result<Option<BackPropState>> {
        let (left, right) = match input_values {
            [left, right] => (left.data(), right.data()),
            other => {
                return Err(GraphError::Other(format!(
                    "{} expects 2 input values, got {}",
                    TIMES_OP_NAME,
                    other.len()
                )))
            }
        };
        let (m, k) = left.shape().as_matrix()?;
        let (k2, n) = right.shape().as_matrix()?;
        if k != k2 {
            return Err(TensorError::ContractionMismatch { m, k, k2, n }.into());
        }

        // A column-major [m, k] buffer is a row-major [k, m] buffer, so the
        // column-major product A x B is the row-major product B^T A^T.
        let data = device
            .backend()
            .matmul(right.data_f32()?, left.data_f32()?, n, k, m)?;
        let out_shape = Shape::new(vec![m]).append(right.shape().trailing(1));
        debug!("{} '{}': output {}", TIMES_OP_NAME, self.base.name(), out_shape);

        let output = self.base.output()?;
        outputs.insert(
            output.clone(),
            Some(Value::new(Tensor::from_vec(data, out_shape, *device)?)),
        );

        if retain_backward_state_for.contains(output) {
            Ok(Some(BackPropState::new(TIMES_OP_NAME, *device)))
        } else {
            Ok(None)
        }
    }

    fn serialize(&self) -> Result<Dictionary> {
        let mut dict = Dictionary::new();
        dict.insert("op", TIMES_OP_NAME);
        dict.insert("name", self.base.name());
        dict.insert("version", TIMES_VERSION);
        dict.insert(
            "inputs",
            DictionaryValue::Vector(
                self.base
                    .inputs()
                    .iter()
                    .map(|v| DictionaryValue::String(v.uid()))
                    .collect(),
            ),
        );
        Ok(dict)
    }

    fn current_version(&self) -> Result<usize> {
        Ok(TIMES_VERSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::Axis;
    use crate::initializer::Initializer;
    use ext_tensor::DType;
    use std::collections::HashMap;

    fn operands() -> (Variable, Variable) {
        let w = Variable::parameter(
            Shape::new(vec![3, 2]),
            DType::F32,
            &Initializer::Constant(1.0),
            DeviceDescriptor::cpu(),
            "W",
        )
        .unwrap();
        let x = Variable::input(Shape::new(vec![2]), DType::F32, vec![Axis::default_batch_axis()], "x");
        (w, x)
    }

    #[test]
    fn test_static_contraction_check() {
        let (w, _) = operands();
        let x = Variable::input(Shape::new(vec![5]), DType::F32, vec![], "x");
        assert!(matches!(
            TimesFunction::create(&w, &x, "t"),
            Err(GraphError::InvalidOperand { .. })
        ));
    }

    #[test]
    fn test_forward_and_backprop_state() {
        let (w, x) = operands();
        let f = TimesFunction::create(&w, &x, "BuiltInTimes").unwrap();
        let device = DeviceDescriptor::cpu();
        let mut args = HashMap::new();
        args.insert(x.clone(), Value::create_batch(x.shape(), &[1.0, 2.0, 3.0, 4.0], device).unwrap());

        let mut outputs = OutputMap::new();
        let retain: HashSet<Variable> = [f.output().clone()].into_iter().collect();
        let state = f.forward(&args, &mut outputs, &device, &retain).unwrap();
        assert_eq!(state.unwrap().op_name(), "Times");

        let y = outputs[f.output()].as_ref().unwrap();
        assert_eq!(y.shape().dims(), &[3, 2]);
        assert_eq!(y.data().data_f32().unwrap(), &[3.0, 3.0, 3.0, 7.0, 7.0, 7.0]);

        let state = f.forward(&args, &mut outputs, &device, &HashSet::new()).unwrap();
        assert!(state.is_none());
    }

    #[test]
    fn test_serialize() {
        let (w, x) = operands();
        let f = TimesFunction::create(&w, &x, "BuiltInTimes").unwrap();
        let dict = f.root().serialize().unwrap();
        assert_eq!(dict.get("op"), Some(&DictionaryValue::from("Times")));
        assert_eq!(dict.get("name"), Some(&DictionaryValue::from("BuiltInTimes")));
        assert_eq!(f.root().current_version().unwrap(), 1);
        match dict.get("inputs") {
            Some(DictionaryValue::Vector(uids)) => {
                assert_eq!(uids, &vec![DictionaryValue::String(w.uid()), DictionaryValue::String(x.uid())])
            }
            other => panic!("unexpected inputs entry: {:?}", other),
        }
    }
}
