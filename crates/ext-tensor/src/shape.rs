use crate::error::{Result, TensorError};
use std::fmt;

/// Flattened offset of element `(row, col)` in a column-major matrix with
/// `rows` rows.
///
/// Every buffer taking part in a computation has its own row count, so the
/// caller always passes the row count of the buffer being indexed.
#[inline]
pub fn flattened_index(row: usize, col: usize, rows: usize) -> usize {
    col * rows + row
}

/// A tensor shape, wrapping a vector of dimension sizes.
///
/// Dimension 0 varies fastest in memory (column-major layout).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Create a new shape from a vector of dimensions.
    pub fn new(dims: Vec<usize>) -> Self {
        Shape { dims }
    }

    /// Create a shape from a slice of dimensions.
    pub fn from_slice(dims: &[usize]) -> Self {
        Shape {
            dims: dims.to_vec(),
        }
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Total number of elements (product of all dimension sizes).
    pub fn numel(&self) -> usize {
        self.dims.iter().product()
    }

    /// Returns the size of dimension `i`.
    ///
    /// # Panics
    /// Panics if `i >= rank()`.
    pub fn dim(&self, i: usize) -> usize {
        self.dims[i]
    }

    /// Returns a reference to the underlying dimension sizes.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Returns a new shape with `trailing` appended after this shape's
    /// dimensions.
    pub fn append(&self, trailing: &[usize]) -> Shape {
        let mut dims = self.dims.clone();
        dims.extend_from_slice(trailing);
        Shape::new(dims)
    }

    /// Returns the dimensions after the first `n`.
    pub fn trailing(&self, n: usize) -> &[usize] {
        &self.dims[n.min(self.dims.len())..]
    }

    /// Views this shape as a column-major matrix `(rows, cols)`.
    ///
    /// The first dimension is the row count and all remaining dimensions
    /// collapse into the column count, so `[k]` is `(k, 1)` and
    /// `[k, 1, n]` is `(k, n)`.
    ///
    /// # Errors
    /// Returns an error for rank-0 shapes.
    pub fn as_matrix(&self) -> Result<(usize, usize)> {
        match self.dims.split_first() {
            Some((&rows, rest)) => Ok((rows, rest.iter().product())),
            None => Err(TensorError::RankMismatch {
                expected: 1,
                got: 0,
            }),
        }
    }

    /// Column-major offset of `(row, col)` in this shape viewed as a matrix.
    ///
    /// # Panics
    /// Panics on rank-0 shapes.
    #[inline]
    pub fn flattened_index(&self, row: usize, col: usize) -> usize {
        flattened_index(row, col, self.dims[0])
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, " x ")?;
            }
            write!(f, "{}", d)?;
        }
        write!(f, "]")
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Shape::new(dims)
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Shape::from_slice(dims)
    }
}
