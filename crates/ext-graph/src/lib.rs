//! `ext-graph` - Graph node contract and a user-defined Times operation.
//!
//! A node implements [`Function`]: it infers its outputs once from its input
//! variables and later evaluates them from bound [`Value`]s. A
//! [`CompositeFunction`] wraps a node, runs shape inference and binds
//! arguments for a forward call.

pub mod axis;
pub mod composite;
pub mod dictionary;
pub mod error;
pub mod function;
pub mod initializer;
pub mod times;
pub mod user_times;
pub mod value;
pub mod variable;

pub use axis::Axis;
pub use composite::CompositeFunction;
pub use dictionary::{Dictionary, DictionaryValue};
pub use error::{GraphError, Result};
pub use function::{BackPropState, Function, FunctionBase, OutputMap};
pub use initializer::Initializer;
pub use times::TimesFunction;
pub use user_times::UserTimesFunction;
pub use value::Value;
pub use variable::{Variable, VariableKind};
