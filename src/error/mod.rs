//! Error taxonomy for the matrix engine and the spectral transform.
//!
//! Fallible operations return `anyhow::Result`; the payload is always a
//! [`LinalgError`], so callers can branch with
//! `err.downcast_ref::<LinalgError>()`.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LinalgError {
    /// Operands of a matrix-matrix operation are not conformant.
    #[error("Dimension mismatch in {op}: left is {}x{}, right is {}x{}", .left.0, .left.1, .right.0, .right.1)]
    DimensionMismatch {
        op: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },

    /// A square-only routine received a rectangular matrix.
    #[error("Matrix must be square, got {rows}x{cols}")]
    NonSquareInput { rows: usize, cols: usize },

    /// The QR iteration exhausted its budget before meeting the tolerance.
    #[error("Eigenvalue iteration did not converge within {iterations} iterations")]
    NonConvergence { iterations: usize },

    /// A vector's norm is within the matrix-relative epsilon of zero.
    #[error("Vector norm {norm:e} is below epsilon {epsilon:e}")]
    DegenerateVector { norm: f64, epsilon: f64 },

    #[error("Index ({row}, {col}) out of bounds for {rows}x{cols} matrix")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    /// A half-open index range is reversed or exceeds the matrix.
    #[error("Invalid {axis} range {from}..{to} for extent {extent}")]
    InvalidRange {
        axis: &'static str,
        from: usize,
        to: usize,
        extent: usize,
    },

    /// A flat buffer does not hold `rows * cols` elements.
    #[error("Data length mismatch: expected {expected}, got {got}")]
    InvalidData { expected: usize, got: usize },

    #[error("Transform size {size} is smaller than the signal length {len}")]
    InvalidTransformSize { size: usize, len: usize },

    #[error("Sequence length {len} is not a power of two")]
    NotPowerOfTwo { len: usize },

    #[error("Numeric conversion failed for value {value}")]
    NumericConversion { value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = LinalgError::DimensionMismatch {
            op: "add",
            left: (2, 3),
            right: (3, 2),
        };
        assert_eq!(
            err.to_string(),
            "Dimension mismatch in add: left is 2x3, right is 3x2"
        );

        let err = LinalgError::NonSquareInput { rows: 2, cols: 4 };
        assert_eq!(err.to_string(), "Matrix must be square, got 2x4");
    }

    #[test]
    fn test_downcast_through_anyhow() {
        let err: anyhow::Error = LinalgError::NotPowerOfTwo { len: 6 }.into();
        assert_eq!(
            err.downcast_ref::<LinalgError>(),
            Some(&LinalgError::NotPowerOfTwo { len: 6 })
        );
    }
}
