//! # Eigen-decomposition
//!
//! Eigenvalues come from the unshifted QR algorithm with a bounded
//! iteration budget; eigenvectors are read off the null space of
//! `(M - λI)ᵀ` produced by inverse-mode Gaussian elimination.

use anyhow::bail;
use log::{debug, trace, warn};

use crate::decomposition::EliminationMode;
use crate::dense::is_negligible;
use crate::error::LinalgError;
use crate::{Matrix, NumericOps};

pub const DEFAULT_MAX_ITERATIONS: usize = 20;

/// Configured QR-iteration eigenvalue solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EigenSolver {
    max_iterations: usize,
}

impl EigenSolver {
    pub fn builder() -> EigenSolverBuilder {
        EigenSolverBuilder::new()
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Runs the unshifted QR algorithm on a square matrix.
    ///
    /// Each step factors `M = QR` and stops once the diagonal of `M - RQ`
    /// has norm within `M`'s epsilon; otherwise `M` becomes `RQ`. Running out
    /// of iterations is not an error: the result reports `converged == false`
    /// and keeps the last iterate.
    ///
    /// # Errors
    /// [`LinalgError::NonSquareInput`] for rectangular input.
    pub fn eigenvalues<T: NumericOps>(&self, mat: &Matrix<T>) -> anyhow::Result<Eigenvalues> {
        if !mat.is_square() {
            bail!(LinalgError::NonSquareInput {
                rows: mat.rows(),
                cols: mat.cols(),
            });
        }

        let mut current = mat.to_f64()?;
        for iteration in 1..=self.max_iterations {
            let (q, r) = current.qr_decompose()?;
            let next = r.mul_matrix(&q)?;
            let change = current.sub_matrix(&next)?.diag()?.norm();

            if is_negligible(change, current.epsilon()) {
                debug!("QR iteration converged after {} iterations", iteration);
                return Ok(Eigenvalues {
                    values: current.diag()?.into_vec(),
                    iterate: current,
                    converged: true,
                    iterations: iteration,
                });
            }
            current = next;
        }

        warn!(
            "QR iteration did not converge within {} iterations",
            self.max_iterations
        );
        Ok(Eigenvalues {
            values: current.diag()?.into_vec(),
            iterate: current,
            converged: false,
            iterations: self.max_iterations,
        })
    }
}

impl Default for EigenSolver {
    fn default() -> Self {
        EigenSolverBuilder::default().build()
    }
}

/// Builder for [`EigenSolver`].
///
/// # Example Usage
/// ```
/// use tone_algebra::eigen::EigenSolverBuilder;
///
/// let solver = EigenSolverBuilder::new().max_iterations(100).build();
/// assert_eq!(solver.max_iterations(), 100);
/// ```
#[derive(Debug, Clone)]
pub struct EigenSolverBuilder {
    max_iterations: usize,
}

impl Default for EigenSolverBuilder {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl EigenSolverBuilder {
    /// Default values:
    /// - `max_iterations`: 20
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn build(self) -> EigenSolver {
        EigenSolver {
            max_iterations: self.max_iterations,
        }
    }
}

/// Outcome of [`EigenSolver::eigenvalues`].
#[derive(Debug, Clone, PartialEq)]
pub struct Eigenvalues {
    values: Vec<f64>,
    iterate: Matrix<f64>,
    converged: bool,
    iterations: usize,
}

impl Eigenvalues {
    /// Diagonal of the final iterate. Trustworthy only when [`converged`](Self::converged).
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// The last QR iterate. For a non-converged run this is the degraded result.
    pub fn iterate(&self) -> &Matrix<f64> {
        &self.iterate
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    /// The eigenvalues, or [`LinalgError::NonConvergence`] if the budget ran out.
    pub fn into_converged(self) -> anyhow::Result<Vec<f64>> {
        if !self.converged {
            bail!(LinalgError::NonConvergence {
                iterations: self.iterations,
            });
        }
        Ok(self.values)
    }
}

/// Eigenvectors as columns, with the eigenvalue each column belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct Eigenvectors {
    vectors: Matrix<f64>,
    values: Vec<f64>,
}

impl Eigenvectors {
    /// `n x k` matrix, one unit eigenvector per column.
    pub fn vectors(&self) -> &Matrix<f64> {
        &self.vectors
    }

    /// Deduplicated eigenvalues, repeated once per returned column.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_parts(self) -> (Matrix<f64>, Vec<f64>) {
        (self.vectors, self.values)
    }
}

impl<T: NumericOps> Matrix<T> {
    /// Eigenvalues with the default 20-iteration budget.
    pub fn eigenvalues(&self) -> anyhow::Result<Eigenvalues> {
        EigenSolver::default().eigenvalues(self)
    }

    /// Eigenvectors for each distinct entry of `eigenvalues`.
    ///
    /// Values closer than the matrix epsilon count as one. For each distinct
    /// `λ`, `(M - λI)ᵀ` is eliminated in inverse mode; the bottom row of the
    /// transform is always taken, and further rows upward are taken while the
    /// matching row of the reduced factor stays within the transform's
    /// epsilon of zero. A repeated eigenvalue therefore yields one column per
    /// null-space dimension.
    pub fn eigenvectors(&self, eigenvalues: &[f64]) -> anyhow::Result<Eigenvectors> {
        if !self.is_square() {
            bail!(LinalgError::NonSquareInput {
                rows: self.rows(),
                cols: self.cols(),
            });
        }

        let size = self.rows();
        let mat = self.to_f64()?;
        let eps = mat.epsilon();
        let identity = Matrix::<f64>::identity(size);

        let mut vectors: Vec<Matrix<f64>> = Vec::new();
        let mut values: Vec<f64> = Vec::new();

        for &ev in eigenvalues {
            if values.iter().any(|&seen| is_negligible(seen - ev, eps)) {
                continue;
            }

            let shifted = mat.sub_matrix(&(&identity * ev))?.transpose();
            let (a, b) = shifted.gaussian_row_elimination(EliminationMode::Inverse)?;
            for vector in null_space_rows(&a, &b)? {
                vectors.push(vector);
                values.push(ev);
            }
        }

        let mut columns = Matrix::zeros(size, vectors.len());
        for (col, vector) in vectors.iter().enumerate() {
            for row in 0..size {
                columns[(row, col)] = vector[(row, 0)];
            }
        }

        Ok(Eigenvectors {
            vectors: columns,
            values,
        })
    }
}

/// Unit column vectors from the rows of the elimination transform `a` that
/// pair with zero rows of the reduced factor `b`, bottom-up. The bottom row
/// is always a candidate; candidates that normalize to nothing are skipped.
fn null_space_rows(a: &Matrix<f64>, b: &Matrix<f64>) -> anyhow::Result<Vec<Matrix<f64>>> {
    let size = a.rows();
    let null_eps = a.epsilon();
    let mut vectors = Vec::new();

    for idx in (0..size).rev() {
        if idx + 1 < size && !is_negligible(b.row_norm(idx), null_eps) {
            break;
        }
        match a.sub_mat(idx..idx + 1, 0..a.cols())?.transpose().normalized() {
            Ok(vector) => vectors.push(vector),
            Err(err) => trace!("skipping null-space candidate in row {}: {}", idx, err),
        }
    }
    Ok(vectors)
}
