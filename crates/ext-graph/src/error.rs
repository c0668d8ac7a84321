use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("invalid operand for {function}: {reason}")]
    InvalidOperand { function: String, reason: String },
    #[error("no value bound for argument {0}")]
    MissingArgument(String),
    #[error("value bound to {variable} has shape {got:?}, expected {expected:?} followed by one extent per dynamic axis")]
    ValueShapeMismatch {
        variable: String,
        expected: Vec<usize>,
        got: Vec<usize>,
    },
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),
    #[error("tensor error: {0}")]
    Tensor(#[from] ext_tensor::TensorError),
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, GraphError>;
