use std::collections::BTreeMap;

use ext_tensor::Shape;

/// A single entry of a serialized node description.
#[derive(Debug, Clone, PartialEq)]
pub enum DictionaryValue {
    Bool(bool),
    SizeT(usize),
    String(String),
    Shape(Shape),
    Vector(Vec<DictionaryValue>),
}

impl From<bool> for DictionaryValue {
    fn from(v: bool) -> Self {
        DictionaryValue::Bool(v)
    }
}

impl From<usize> for DictionaryValue {
    fn from(v: usize) -> Self {
        DictionaryValue::SizeT(v)
    }
}

impl From<&str> for DictionaryValue {
    fn from(v: &str) -> Self {
        DictionaryValue::String(v.to_string())
    }
}

impl From<String> for DictionaryValue {
    fn from(v: String) -> Self {
        DictionaryValue::String(v)
    }
}

impl From<Shape> for DictionaryValue {
    fn from(v: Shape) -> Self {
        DictionaryValue::Shape(v)
    }
}

/// Ordered, string-keyed description of a node, as produced by
/// [`Function::serialize`](crate::Function::serialize).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary {
    entries: BTreeMap<String, DictionaryValue>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, returning the previous value under `key` if any.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<DictionaryValue>,
    ) -> Option<DictionaryValue> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&DictionaryValue> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DictionaryValue)> {
        self.entries.iter()
    }
}
