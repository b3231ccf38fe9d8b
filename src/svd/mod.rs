//! # Singular Value Decomposition
//!
//! SVD assembled from the eigen-decompositions of the two Gram matrices:
//! `M·Mᵀ` gives the singular values and left vectors, `Mᵀ·M` the right
//! vectors. Singular values are reported in the order the QR iteration
//! produced them, followed by any recovered from the residual; they are not
//! sorted.

use anyhow::bail;
use log::{debug, trace, warn};

use crate::dense::is_negligible;
use crate::eigen::EigenSolver;
use crate::error::LinalgError;
use crate::{Direction, Matrix, NumericOps};

#[derive(Debug, Clone, PartialEq)]
pub struct Svd {
    u: Matrix<f64>,
    s: Vec<f64>,
    v: Matrix<f64>,
}

impl Svd {
    /// Decomposes `mat` with the default eigenvalue budget.
    pub fn new<T: NumericOps>(mat: &Matrix<T>) -> anyhow::Result<Self> {
        Self::with_solver(mat, &EigenSolver::default())
    }

    /// Decomposes `mat`, running the Gram eigen-problems with `solver`.
    ///
    /// Only eigenvalues of `M·Mᵀ` above that vector's epsilon become singular
    /// values, so the rank is detected relative to the largest one; negative
    /// round-off values are dropped with the negligible ones.
    ///
    /// When a repeated eigenvalue yields fewer eigenvectors than its
    /// multiplicity, the missing singular triplets are recovered from the
    /// residual `M - U·S·Vᵀ` and appended after the others.
    pub fn with_solver<T: NumericOps>(
        mat: &Matrix<T>,
        solver: &EigenSolver,
    ) -> anyhow::Result<Self> {
        let m = mat.to_f64()?;
        let (mut svd, floor) = Self::gram_pass(&m, solver, 0.0)?;

        let full_rank = m.rows().min(m.cols());
        while svd.rank() < full_rank {
            let residual = m.sub_matrix(&svd.reconstruct()?)?;
            let (extra, _) = Self::gram_pass(&residual, solver, floor)?;
            if extra.rank() == 0 {
                break;
            }
            debug!("recovered {} singular values from the residual", extra.rank());
            svd.append(extra)?;
        }

        Ok(svd)
    }

    /// One decomposition from the Gram matrices of `m`, keeping eigenvalues
    /// above `floor` as well as above their own epsilon. Returns the
    /// threshold used.
    ///
    /// `U` is re-orthonormalized, since the null space of a repeated
    /// eigenvalue comes back in no fixed basis. Each column of `V` is negated
    /// when that brings `M·vᵢ` closer to `uᵢ·sᵢ`, and rebuilt as `Mᵀ·uᵢ / sᵢ`
    /// when it still does not pair with `uᵢ`.
    fn gram_pass(m: &Matrix<f64>, solver: &EigenSolver, floor: f64) -> anyhow::Result<(Self, f64)> {
        let mt = m.transpose();

        let left_gram = m.mul_matrix(&mt)?;
        let eig = solver.eigenvalues(&left_gram)?;
        if !eig.converged() {
            warn!(
                "SVD of {}x{} matrix uses non-converged Gram eigenvalues",
                m.rows(),
                m.cols()
            );
        }

        let eps = Matrix::column_vector(eig.values()).epsilon().max(floor);
        let squared: Vec<f64> = eig
            .values()
            .iter()
            .copied()
            .filter(|&value| value > eps)
            .collect();
        debug!(
            "SVD keeps {} of {} Gram eigenvalues",
            squared.len(),
            eig.values().len()
        );

        let (u, squared) = left_gram.eigenvectors(&squared)?.into_parts();
        let (_, orthonormal) = u.transpose().gram_schmidt_process()?;
        let u = orthonormal.transpose();
        let s: Vec<f64> = squared.iter().map(|value| value.sqrt()).collect();

        let (right, _) = mt.mul_matrix(m)?.eigenvectors(&squared)?.into_parts();
        let mut v = if right.cols() == s.len() {
            right
        } else {
            debug!(
                "right Gram matrix gave {} eigenvectors for {} singular values",
                right.cols(),
                s.len()
            );
            Matrix::zeros(m.cols(), s.len())
        };

        let tolerance = m.epsilon();
        for (i, &sigma) in s.iter().enumerate() {
            let ui = u.sub_mat(0..u.rows(), i..i + 1)?;
            let target = &ui * sigma;
            let mv = m.mul_matrix(&v.sub_mat(0..v.rows(), i..i + 1)?)?;

            let mut residual = mv.sub_matrix(&target)?.norm();
            if residual >= mv.norm() {
                v.element_op(Direction::COLUMN, i, i, -1.0)?;
                residual = mv.add_matrix(&target)?.norm();
            }

            if !is_negligible(residual, tolerance) {
                trace!("rebuilding right singular vector {} (residual {:e})", i, residual);
                let rebuilt = mt.mul_matrix(&ui)? / sigma;
                for row in 0..v.rows() {
                    v[(row, i)] = rebuilt[(row, 0)];
                }
            }
        }

        Ok((Svd { u, s, v }, eps))
    }

    fn append(&mut self, other: Svd) -> anyhow::Result<()> {
        self.u = concat_columns(&self.u, &other.u)?;
        self.v = concat_columns(&self.v, &other.v)?;
        self.s.extend(other.s);
        Ok(())
    }

    /// Left singular vectors, one column per singular value.
    pub fn u(&self) -> &Matrix<f64> {
        &self.u
    }

    pub fn s(&self) -> &[f64] {
        &self.s
    }

    /// Singular values as a square diagonal matrix.
    pub fn s_matrix(&self) -> Matrix<f64> {
        let k = self.s.len();
        let mut mat = Matrix::zeros(k, k);
        for (i, &sigma) in self.s.iter().enumerate() {
            mat[(i, i)] = sigma;
        }
        mat
    }

    /// Right singular vectors, one column per singular value.
    pub fn v(&self) -> &Matrix<f64> {
        &self.v
    }

    pub fn rank(&self) -> usize {
        self.s.len()
    }

    /// `U · S · Vᵀ`
    pub fn reconstruct(&self) -> anyhow::Result<Matrix<f64>> {
        self.u
            .mul_matrix(&self.s_matrix())?
            .mul_matrix(&self.v.transpose())
    }

    /// Moore-Penrose pseudo-inverse `V · S⁻¹ · Uᵀ`.
    pub fn pinv(&self) -> anyhow::Result<Matrix<f64>> {
        let mut s_inv = self.s_matrix();
        for i in 0..self.s.len() {
            let sigma = s_inv[(i, i)];
            if sigma == 0.0 {
                trace!("zero singular value at {} left uninverted", i);
                continue;
            }
            s_inv[(i, i)] = 1.0 / sigma;
        }
        self.v.mul_matrix(&s_inv)?.mul_matrix(&self.u.transpose())
    }
}

fn concat_columns(left: &Matrix<f64>, right: &Matrix<f64>) -> anyhow::Result<Matrix<f64>> {
    if left.rows() != right.rows() {
        bail!(LinalgError::DimensionMismatch {
            op: "svd",
            left: left.dim(),
            right: right.dim(),
        });
    }
    let mut mat = Matrix::zeros(left.rows(), left.cols() + right.cols());
    for row in 0..left.rows() {
        for col in 0..left.cols() {
            mat[(row, col)] = left[(row, col)];
        }
        for col in 0..right.cols() {
            mat[(row, left.cols() + col)] = right[(row, col)];
        }
    }
    Ok(mat)
}

impl<T: NumericOps> Matrix<T> {
    pub fn svd(&self) -> anyhow::Result<Svd> {
        Svd::new(self)
    }

    /// Pseudo-inverse via [`Svd::pinv`]; `self` may be rectangular.
    pub fn pinv(&self) -> anyhow::Result<Matrix<f64>> {
        Svd::new(self)?.pinv()
    }
}
