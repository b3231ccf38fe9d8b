//! # Triangular and Orthogonal Decompositions
//!
//! Gaussian row elimination and Gram-Schmidt orthogonalization, both built
//! only from [`Matrix::element_op`](crate::Matrix::element_op). Each routine
//! works on its own double-precision copy of the input and returns a pair
//! `(A, B)`: `B` is the reduced matrix, `A` accumulates the elementary
//! operations that produced it.
//!
//! - [`Matrix::lu_decompose`](crate::Matrix::lu_decompose) returns `(L, U)` with `L · U ≈ M`.
//! - [`Matrix::qr_decompose`](crate::Matrix::qr_decompose) returns `(Q, R)` with `Q · R ≈ M`
//!   and orthonormal columns in `Q` when `M` has full rank.

mod elimination;
mod orthogonal;

/// How [`Matrix::gaussian_row_elimination`](crate::Matrix::gaussian_row_elimination)
/// records its operations into the transform matrix `A`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EliminationMode {
    /// Mirror each row operation as the inverse column operation, keeping
    /// `A · B = M`. This is the LU factor pair.
    Factor,
    /// Repeat each row operation on `A`, keeping `A · M = B`. Rows of `A`
    /// paired with zero rows of `B` span the left null space of `M`.
    Inverse,
}
