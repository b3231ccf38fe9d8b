//! # Dense Matrix
//!
//! A row-major, exclusively owned matrix with the primitives every
//! decomposition in this crate is built from: checked arithmetic,
//! structural extraction, elementary row/column operations and the
//! matrix-relative epsilon.
//!
//! ## Epsilon policy
//! Every "is this zero?" decision in the engine compares against
//! [`Matrix::epsilon`], the largest absolute entry scaled by
//! [`EPSILON_SCALE`]. No routine uses an absolute tolerance.

use std::ops::{Index, IndexMut, Range};

use anyhow::bail;
use ndarray::{Array2, ArrayView2};

use crate::error::LinalgError;
use crate::{Direction, NumericOps};

mod ops;

/// Scale applied to the largest absolute entry to obtain a matrix's epsilon.
pub const EPSILON_SCALE: f64 = 1e-13;

pub(crate) fn as_f64<T: NumericOps>(value: T) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}

/// `true` when `value` is within `epsilon` of zero.
pub(crate) fn is_negligible(value: f64, epsilon: f64) -> bool {
    value.abs() <= epsilon
}

/// Dense matrix stored row-major: `data[row * cols + col]`.
///
/// A matrix with a zero dimension is valid and empty; it is never used to
/// signal failure.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Matrix<T> {
    data: Vec<T>,
    rows: usize,
    cols: usize,
}

impl<T: NumericOps> Matrix<T> {
    /// Zero-filled `rows x cols` matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Matrix {
            data: vec![T::zero(); rows * cols],
            rows,
            cols,
        }
    }

    /// Alias of [`Matrix::zeros`].
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::zeros(rows, cols)
    }

    pub fn identity(size: usize) -> Self {
        let mut mat = Self::zeros(size, size);
        for i in 0..size {
            mat.data[i * size + i] = T::one();
        }
        mat
    }

    /// Takes ownership of a row-major buffer.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> anyhow::Result<Self> {
        if data.len() != rows * cols {
            bail!(LinalgError::InvalidData {
                expected: rows * cols,
                got: data.len(),
            });
        }
        Ok(Matrix { data, rows, cols })
    }

    pub fn from_row_slice(rows: usize, cols: usize, values: &[T]) -> anyhow::Result<Self> {
        Self::from_vec(rows, cols, values.to_vec())
    }

    /// Builds a matrix from equally long rows.
    pub fn from_rows(rows: &[&[T]]) -> anyhow::Result<Self> {
        let cols = rows.first().map_or(0, |row| row.len());
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            if row.len() != cols {
                bail!(LinalgError::InvalidData {
                    expected: cols,
                    got: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Matrix {
            data,
            rows: rows.len(),
            cols,
        })
    }

    /// `n x 1` matrix holding `values`.
    pub fn column_vector(values: &[T]) -> Self {
        Matrix {
            data: values.to_vec(),
            rows: values.len(),
            cols: 1,
        }
    }

    /// Overwrites every element from a row-major slice of the same size.
    pub fn assign(&mut self, values: &[T]) -> anyhow::Result<()> {
        if values.len() != self.data.len() {
            bail!(LinalgError::InvalidData {
                expected: self.data.len(),
                got: values.len(),
            });
        }
        self.data.copy_from_slice(values);
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    pub fn dim(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    fn check_index(&self, row: usize, col: usize) -> anyhow::Result<usize> {
        if row >= self.rows || col >= self.cols {
            bail!(LinalgError::IndexOutOfBounds {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(row * self.cols + col)
    }

    pub fn get(&self, row: usize, col: usize) -> anyhow::Result<T> {
        let idx = self.check_index(row, col)?;
        Ok(self.data[idx])
    }

    pub fn set(&mut self, row: usize, col: usize, value: T) -> anyhow::Result<()> {
        let idx = self.check_index(row, col)?;
        self.data[idx] = value;
        Ok(())
    }

    /// Borrows one row as a slice.
    pub fn row(&self, row: usize) -> anyhow::Result<&[T]> {
        if row >= self.rows {
            bail!(LinalgError::IndexOutOfBounds {
                row,
                col: 0,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(&self.data[row * self.cols..(row + 1) * self.cols])
    }

    pub fn transpose(&self) -> Self {
        let mut mat = Self::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                mat.data[j * self.rows + i] = self.data[i * self.cols + j];
            }
        }
        mat
    }

    /// Main diagonal of a square matrix as an `n x 1` column vector.
    pub fn diag(&self) -> anyhow::Result<Self> {
        if !self.is_square() {
            bail!(LinalgError::NonSquareInput {
                rows: self.rows,
                cols: self.cols,
            });
        }
        let values: Vec<T> = (0..self.rows)
            .map(|i| self.data[i * self.cols + i])
            .collect();
        Ok(Self::column_vector(&values))
    }

    /// Copies the block selected by half-open row and column ranges.
    pub fn sub_mat(&self, rows: Range<usize>, cols: Range<usize>) -> anyhow::Result<Self> {
        if rows.start > rows.end || rows.end > self.rows {
            bail!(LinalgError::InvalidRange {
                axis: "row",
                from: rows.start,
                to: rows.end,
                extent: self.rows,
            });
        }
        if cols.start > cols.end || cols.end > self.cols {
            bail!(LinalgError::InvalidRange {
                axis: "column",
                from: cols.start,
                to: cols.end,
                extent: self.cols,
            });
        }

        let mut mat = Self::zeros(rows.len(), cols.len());
        for (i, src_row) in rows.enumerate() {
            let src = &self.data[src_row * self.cols + cols.start..src_row * self.cols + cols.end];
            mat.data[i * mat.cols..(i + 1) * mat.cols].copy_from_slice(src);
        }
        Ok(mat)
    }

    /// Elementary row or column operation.
    ///
    /// With `from != to` this adds `weight` times line `from` onto line `to`;
    /// with `from == to` it scales line `to` by `weight`.
    pub fn element_op(
        &mut self,
        direction: Direction,
        from: usize,
        to: usize,
        weight: T,
    ) -> anyhow::Result<()> {
        let extent = if direction.is_row() { self.rows } else { self.cols };
        if from >= extent || to >= extent {
            let (row, col) = match direction {
                Direction::ROW => (from.max(to), 0),
                Direction::COLUMN => (0, from.max(to)),
            };
            bail!(LinalgError::IndexOutOfBounds {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }

        let cols = self.cols;
        match direction {
            Direction::ROW => {
                if from != to {
                    for k in 0..cols {
                        let source = self.data[from * cols + k];
                        self.data[to * cols + k] += source * weight;
                    }
                } else {
                    for value in &mut self.data[to * cols..(to + 1) * cols] {
                        *value *= weight;
                    }
                }
            }
            Direction::COLUMN => {
                if from != to {
                    for k in 0..self.rows {
                        let source = self.data[k * cols + from];
                        self.data[k * cols + to] += source * weight;
                    }
                } else {
                    for k in 0..self.rows {
                        self.data[k * cols + to] *= weight;
                    }
                }
            }
        }
        Ok(())
    }

    /// Largest absolute entry, `0.0` for an empty matrix.
    pub fn max_abs(&self) -> f64 {
        self.data
            .iter()
            .fold(0.0f64, |acc, &value| acc.max(as_f64(value).abs()))
    }

    /// Matrix-relative zero threshold: `max_abs() * EPSILON_SCALE`.
    pub fn epsilon(&self) -> f64 {
        self.max_abs() * EPSILON_SCALE
    }

    /// Frobenius norm.
    pub fn norm(&self) -> f64 {
        self.data
            .iter()
            .map(|&value| {
                let v = as_f64(value);
                v * v
            })
            .sum::<f64>()
            .sqrt()
    }

    pub fn convert<U: NumericOps>(&self) -> anyhow::Result<Matrix<U>> {
        let data = self
            .data
            .iter()
            .map(|&value| {
                <U as num_traits::NumCast>::from(value).ok_or_else(|| {
                    LinalgError::NumericConversion {
                        value: format!("{:?}", value),
                    }
                })
            })
            .collect::<Result<Vec<U>, LinalgError>>()?;
        Ok(Matrix {
            data,
            rows: self.rows,
            cols: self.cols,
        })
    }

    /// Double-precision copy; every decomposition starts from one.
    pub fn to_f64(&self) -> anyhow::Result<Matrix<f64>> {
        self.convert::<f64>()
    }

    pub fn to_array2(&self) -> Array2<T> {
        Array2::from_shape_fn((self.rows, self.cols), |(i, j)| {
            self.data[i * self.cols + j]
        })
    }
}

impl Matrix<f64> {
    pub(crate) fn row_slice(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub(crate) fn row_norm(&self, row: usize) -> f64 {
        self.row_slice(row).iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Copy scaled to unit Frobenius norm.
    ///
    /// Fails with [`LinalgError::DegenerateVector`] when the norm is within
    /// the matrix's own epsilon of zero.
    pub fn normalized(&self) -> anyhow::Result<Self> {
        let norm = self.norm();
        let epsilon = self.epsilon();
        if is_negligible(norm, epsilon) {
            bail!(LinalgError::DegenerateVector { norm, epsilon });
        }
        Ok(self.clone() / norm)
    }
}

impl<T> Index<(usize, usize)> for Matrix<T> {
    type Output = T;

    fn index(&self, (row, col): (usize, usize)) -> &T {
        assert!(
            row < self.rows && col < self.cols,
            "index ({}, {}) out of bounds for {}x{} matrix",
            row,
            col,
            self.rows,
            self.cols
        );
        &self.data[row * self.cols + col]
    }
}

impl<T> IndexMut<(usize, usize)> for Matrix<T> {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut T {
        assert!(
            row < self.rows && col < self.cols,
            "index ({}, {}) out of bounds for {}x{} matrix",
            row,
            col,
            self.rows,
            self.cols
        );
        &mut self.data[row * self.cols + col]
    }
}

impl<T: Clone> From<ArrayView2<'_, T>> for Matrix<T> {
    fn from(array: ArrayView2<'_, T>) -> Self {
        let (rows, cols) = array.dim();
        Matrix {
            data: array.iter().cloned().collect(),
            rows,
            cols,
        }
    }
}

impl<T: Clone> From<&Array2<T>> for Matrix<T> {
    fn from(array: &Array2<T>) -> Self {
        Matrix::from(array.view())
    }
}
