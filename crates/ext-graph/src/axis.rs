use std::fmt;

const DEFAULT_BATCH_AXIS_NAME: &str = "defaultBatchAxis";

/// A dynamic axis: a dimension whose extent is only known when values are
/// bound, such as the batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Axis {
    name: String,
}

impl Axis {
    /// A named dynamic axis.
    pub fn new_dynamic(name: impl Into<String>) -> Self {
        Axis { name: name.into() }
    }

    /// The batch axis shared by every minibatch input.
    pub fn default_batch_axis() -> Self {
        Axis::new_dynamic(DEFAULT_BATCH_AXIS_NAME)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_batch_axis(&self) -> bool {
        self.name == DEFAULT_BATCH_AXIS_NAME
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
