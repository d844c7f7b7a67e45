//! Sparse matrix storage in coordinate and compressed-row formats.

use std::fmt;
use std::ops::{AddAssign, Mul, Neg};

use indexmap::IndexMap;
use itertools::{izip, Itertools};
use ndarray::Array2;
use num_complex::Complex;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_config, ensure_index, AoNormError, AoNormResult};


/// Trait for the element types that matrices and tensors in orbital space may hold.
pub trait Scalar:
    Copy
    + Send
    + Sync
    + Zero
    + AddAssign
    + Neg<Output = Self>
    + Mul<f64, Output = Self>
    + fmt::Debug
{
}

impl Scalar for f64 {}
impl Scalar for Complex<f64> {}

// ---------
// CooMatrix
// ---------

/// A sparse matrix stored as an explicit list of (row, column, value) entries. Entries with
/// identical (row, column) are allowed and are understood to be summed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "CooMatrixRaw<T>",
    bound(deserialize = "T: Scalar + Deserialize<'de>")
)]
pub struct CooMatrix<T> {
    /// The number of rows and columns.
    shape: (usize, usize),

    rows: Vec<usize>,

    cols: Vec<usize>,

    values: Vec<T>,
}

/// Unvalidated form of [`CooMatrix`] as read from serialised data.
#[derive(Deserialize)]
struct CooMatrixRaw<T> {
    shape: (usize, usize),
    rows: Vec<usize>,
    cols: Vec<usize>,
    values: Vec<T>,
}

impl<T: Scalar> TryFrom<CooMatrixRaw<T>> for CooMatrix<T> {
    type Error = AoNormError;

    fn try_from(raw: CooMatrixRaw<T>) -> Result<Self, Self::Error> {
        Self::new(raw.shape, raw.rows, raw.cols, raw.values)
    }
}

impl<T: Scalar> CooMatrix<T> {
    /// Constructs a coordinate matrix.
    ///
    /// # Errors
    ///
    /// Errors with [`crate::error::AoNormError::Configuration`] if the three arrays have different
    /// lengths, and with [`crate::error::AoNormError::Index`] if an entry lies outside `shape`.
    pub fn new(
        shape: (usize, usize),
        rows: Vec<usize>,
        cols: Vec<usize>,
        values: Vec<T>,
    ) -> AoNormResult<Self> {
        ensure_config!(
            rows.len() == cols.len() && cols.len() == values.len(),
            "Mismatched lengths of rows ({}), columns ({}) and values ({}).",
            rows.len(),
            cols.len(),
            values.len()
        );
        if let Some((r, c)) = rows
            .iter()
            .zip(cols.iter())
            .find(|&(&r, &c)| r >= shape.0 || c >= shape.1)
        {
            return Err(AoNormError::Index(format!(
                "Entry ({r}, {c}) lies outside of a {} x {} matrix.",
                shape.0, shape.1
            )));
        }
        Ok(Self {
            shape,
            rows,
            cols,
            values,
        })
    }

    /// Constructs a coordinate matrix from (row, column, value) triplets.
    pub fn from_triplets(shape: (usize, usize), triplets: &[(usize, usize, T)]) -> AoNormResult<Self> {
        let (rows, cols, values) = triplets.iter().copied().multiunzip();
        Self::new(shape, rows, cols, values)
    }

    /// Constructs a coordinate matrix holding the non-zero elements of a dense matrix.
    pub fn from_dense(dense: &Array2<T>) -> Self {
        let (rows, cols, values) = dense
            .indexed_iter()
            .filter(|(_, v)| !v.is_zero())
            .map(|((r, c), v)| (r, c, *v))
            .multiunzip();
        Self {
            shape: dense.dim(),
            rows,
            cols,
            values,
        }
    }

    /// Constructs an empty matrix of a given shape.
    pub fn zeros(shape: (usize, usize)) -> Self {
        Self {
            shape,
            rows: vec![],
            cols: vec![],
            values: vec![],
        }
    }

    /// The shape of the matrix.
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// The number of stored entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// The row index of each stored entry.
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    /// The column index of each stored entry.
    pub fn cols(&self) -> &[usize] {
        &self.cols
    }

    /// The value of each stored entry.
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Iterates over the stored (row, column, value) triplets.
    pub fn triplets(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        izip!(
            self.rows.iter().copied(),
            self.cols.iter().copied(),
            self.values.iter().copied()
        )
    }

    /// Returns the value at (`row`, `col`), summing duplicate entries. Unstored entries are zero.
    pub fn get(&self, row: usize, col: usize) -> T {
        self.triplets()
            .filter(|(r, c, _)| *r == row && *c == col)
            .fold(T::zero(), |mut acc, (_, _, v)| {
                acc += v;
                acc
            })
    }

    /// Returns the matrix with duplicate entries summed and entries in row-major order.
    pub fn sum_duplicates(&self) -> Self {
        accumulate(self.shape, self.triplets())
    }

    /// The transposed matrix.
    pub fn transpose(&self) -> Self {
        Self {
            shape: (self.shape.1, self.shape.0),
            rows: self.cols.clone(),
            cols: self.rows.clone(),
            values: self.values.clone(),
        }
    }

    /// The sum of all entries.
    pub fn sum(&self) -> T {
        self.values.iter().fold(T::zero(), |mut acc, v| {
            acc += *v;
            acc
        })
    }

    /// Expands the matrix into a dense array.
    pub fn to_dense(&self) -> Array2<T> {
        let mut dense = Array2::<T>::zeros(self.shape);
        self.triplets().for_each(|(r, c, v)| dense[(r, c)] += v);
        dense
    }
}

impl CooMatrix<f64> {
    /// Returns `true` if the matrix is square and symmetric within an absolute tolerance.
    pub fn is_symmetric(&self, tol: f64) -> bool {
        self.max_asymmetry().map_or(false, |asym| asym <= tol)
    }

    /// The largest $`|A_{ij}|`$ after summing duplicate entries, or `0` for an empty matrix.
    pub fn max_abs(&self) -> f64 {
        self.sum_duplicates()
            .values()
            .iter()
            .map(|v| v.abs())
            .fold(0.0, f64::max)
    }

    /// The largest $`|A_{ij} - A_{ji}|`$, or `None` if the matrix is not square.
    pub fn max_asymmetry(&self) -> Option<f64> {
        if self.shape.0 != self.shape.1 {
            return None;
        }
        let summed = self.sum_duplicates();
        let lookup = summed
            .triplets()
            .map(|(r, c, v)| ((r, c), v))
            .collect::<IndexMap<_, _>>();
        Some(
            lookup
                .iter()
                .map(|(&(r, c), &v)| (v - lookup.get(&(c, r)).copied().unwrap_or(0.0)).abs())
                .fold(0.0, f64::max),
        )
    }
}

/// Sums (row, column, value) entries sharing the same (row, column) and returns them in
/// row-major order.
pub(crate) fn accumulate<T, I>(shape: (usize, usize), entries: I) -> CooMatrix<T>
where
    T: Scalar,
    I: IntoIterator<Item = (usize, usize, T)>,
{
    let mut summed: IndexMap<(usize, usize), T> = IndexMap::new();
    for (r, c, v) in entries {
        *summed.entry((r, c)).or_insert_with(T::zero) += v;
    }
    summed.sort_unstable_keys();
    let (rows, cols, values) = summed
        .into_iter()
        .map(|((r, c), v)| (r, c, v))
        .multiunzip();
    CooMatrix {
        shape,
        rows,
        cols,
        values,
    }
}

// ---------
// CsrMatrix
// ---------

/// A sparse matrix in compressed-row format.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "CsrMatrixRaw<T>",
    bound(deserialize = "T: Scalar + Deserialize<'de>")
)]
pub struct CsrMatrix<T> {
    shape: (usize, usize),

    /// Row `r` occupies `indptr[r]..indptr[r + 1]` of `indices` and `data`.
    indptr: Vec<usize>,

    indices: Vec<usize>,

    data: Vec<T>,
}

/// Unvalidated form of [`CsrMatrix`] as read from serialised data.
#[derive(Deserialize)]
struct CsrMatrixRaw<T> {
    shape: (usize, usize),
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<T>,
}

impl<T: Scalar> TryFrom<CsrMatrixRaw<T>> for CsrMatrix<T> {
    type Error = AoNormError;

    fn try_from(raw: CsrMatrixRaw<T>) -> Result<Self, Self::Error> {
        Self::new(raw.shape, raw.indptr, raw.indices, raw.data)
    }
}

impl<T: Scalar> CsrMatrix<T> {
    /// Constructs a compressed-row matrix from its raw arrays.
    ///
    /// # Errors
    ///
    /// Errors with [`crate::error::AoNormError::Configuration`] if the arrays are inconsistent and
    /// with [`crate::error::AoNormError::Index`] if a column index is out of range.
    pub fn new(
        shape: (usize, usize),
        indptr: Vec<usize>,
        indices: Vec<usize>,
        data: Vec<T>,
    ) -> AoNormResult<Self> {
        ensure_config!(
            indptr.len() == shape.0 + 1,
            "`indptr` has length {} for {} rows.",
            indptr.len(),
            shape.0
        );
        ensure_config!(
            indptr.first() == Some(&0)
                && indptr.windows(2).all(|w| w[0] <= w[1])
                && indptr.last() == Some(&indices.len())
                && indices.len() == data.len(),
            "Inconsistent compressed-row arrays."
        );
        ensure_index!(
            indices.iter().all(|&c| c < shape.1),
            "A column index is out of range for {} columns.",
            shape.1
        );
        Ok(Self {
            shape,
            indptr,
            indices,
            data,
        })
    }

    /// Converts a coordinate matrix into compressed-row format, keeping the order of entries
    /// within each row.
    pub fn from_coo(coo: &CooMatrix<T>) -> Self {
        let nrows = coo.shape.0;
        let mut indptr = vec![0; nrows + 1];
        coo.rows.iter().for_each(|&r| indptr[r + 1] += 1);
        for r in 0..nrows {
            indptr[r + 1] += indptr[r];
        }
        let mut next = indptr.clone();
        let mut indices = vec![0; coo.nnz()];
        let mut data = vec![T::zero(); coo.nnz()];
        coo.triplets().for_each(|(r, c, v)| {
            indices[next[r]] = c;
            data[next[r]] = v;
            next[r] += 1;
        });
        Self {
            shape: coo.shape,
            indptr,
            indices,
            data,
        }
    }

    /// Converts this matrix into coordinate format.
    pub fn to_coo(&self) -> CooMatrix<T> {
        let rows = (0..self.shape.0)
            .flat_map(|r| std::iter::repeat(r).take(self.indptr[r + 1] - self.indptr[r]))
            .collect_vec();
        CooMatrix {
            shape: self.shape,
            rows,
            cols: self.indices.clone(),
            values: self.data.clone(),
        }
    }

    /// The shape of the matrix.
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// The row pointers.
    pub fn indptr(&self) -> &[usize] {
        &self.indptr
    }

    /// The column index of each stored entry.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// The value of each stored entry.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Mutable access to the values, for in-place transforms that keep the sparsity pattern.
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }
}
