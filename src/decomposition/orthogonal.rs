use log::trace;

use crate::dense::is_negligible;
use crate::{Direction, Matrix, NumericOps};

impl<T: NumericOps> Matrix<T> {
    /// Orthonormalizes the rows of a copy of `self` (classical Gram-Schmidt).
    ///
    /// Each row has its components along all earlier rows removed, then is
    /// scaled to unit length. Rows whose norm falls within epsilon of zero are
    /// neither projected against nor divided; they stay as zero directions.
    ///
    /// # Returns
    /// `(A, B)` with orthonormal (or zero) rows in `B` and `A · B ≈ self`.
    pub fn gram_schmidt_process(&self) -> anyhow::Result<(Matrix<f64>, Matrix<f64>)> {
        let rows = self.rows();
        let mut a = Matrix::<f64>::identity(rows);
        let mut b = self.to_f64()?;

        for i in 1..rows {
            for base in 0..i {
                let (dot, norm_sq) = b
                    .row_slice(i)
                    .iter()
                    .zip(b.row_slice(base))
                    .fold((0.0, 0.0), |(dot, norm_sq), (x, y)| {
                        (dot + x * y, norm_sq + y * y)
                    });

                if is_negligible(norm_sq.sqrt(), b.epsilon()) {
                    trace!("skipping projection onto degenerate row {}", base);
                    continue;
                }

                let weight = -dot / norm_sq;
                b.element_op(Direction::ROW, base, i, weight)?;
                a.element_op(Direction::COLUMN, i, base, -weight)?;
            }
        }

        for i in 0..rows {
            let norm = b.row_norm(i);
            if is_negligible(norm, b.epsilon()) {
                a.element_op(Direction::COLUMN, i, i, 0.0)?;
            } else {
                b.element_op(Direction::ROW, i, i, 1.0 / norm)?;
                a.element_op(Direction::COLUMN, i, i, norm)?;
            }
        }

        Ok((a, b))
    }

    /// QR factorization `(Q, R)` with `Q · R ≈ self`.
    ///
    /// Starts from the LU pair and re-orthogonalizes the columns of `L`:
    /// `Q = gs(Lᵀ).Bᵀ`, `R = gs(Lᵀ).Aᵀ · U`. `R` is upper triangular.
    pub fn qr_decompose(&self) -> anyhow::Result<(Matrix<f64>, Matrix<f64>)> {
        let (l, u) = self.lu_decompose()?;
        let (transform, orthonormal) = l.transpose().gram_schmidt_process()?;
        let q = orthonormal.transpose();
        let r = transform.transpose().mul_matrix(&u)?;
        Ok((q, r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn assert_matrix_eq(actual: &Matrix<f64>, expected: &Matrix<f64>, tol: f64) {
        assert_eq!(actual.dim(), expected.dim());
        for (a, e) in actual.as_slice().iter().zip(expected.as_slice()) {
            assert_abs_diff_eq!(*a, *e, epsilon = tol);
        }
    }

    fn assert_orthonormal_columns(q: &Matrix<f64>) {
        let gram = q.transpose().mul_matrix(q).unwrap();
        assert_matrix_eq(&gram, &Matrix::identity(q.cols()), 1e-12);
    }

    #[test]
    fn test_gram_schmidt_orthonormal_rows() {
        let m = Matrix::from_rows(&[
            &[1.0, 1.0, 0.0][..],
            &[1.0, 0.0, 1.0][..],
            &[0.0, 1.0, 1.0][..],
        ])
        .unwrap();
        let (a, b) = m.gram_schmidt_process().unwrap();

        let gram = b.mul_matrix(&b.transpose()).unwrap();
        assert_matrix_eq(&gram, &Matrix::identity(3), 1e-12);
        assert_matrix_eq(&a.mul_matrix(&b).unwrap(), &m, 1e-12);

        // First row is only normalized.
        let s = std::f64::consts::FRAC_1_SQRT_2;
        assert_abs_diff_eq!(b[(0, 0)], s, epsilon = 1e-15);
        assert_abs_diff_eq!(b[(0, 1)], s, epsilon = 1e-15);
    }

    #[test]
    fn test_gram_schmidt_dependent_rows_become_zero() {
        let m = Matrix::from_rows(&[&[3.0, 4.0][..], &[6.0, 8.0][..]]).unwrap();
        let (a, b) = m.gram_schmidt_process().unwrap();

        assert_abs_diff_eq!(b[(0, 0)], 0.6, epsilon = 1e-15);
        assert_abs_diff_eq!(b[(0, 1)], 0.8, epsilon = 1e-15);
        assert_abs_diff_eq!(b.row_norm(1), 0.0, epsilon = 1e-12);
        let expected = Matrix::from_rows(&[&[5.0, 0.0][..], &[10.0, 0.0][..]]).unwrap();
        assert_matrix_eq(&a, &expected, 1e-12);
        assert_matrix_eq(&a.mul_matrix(&b).unwrap(), &m, 1e-12);
    }

    #[test]
    fn test_gram_schmidt_skips_zero_row() {
        let m = Matrix::from_rows(&[&[0.0, 0.0][..], &[1.0, 1.0][..]]).unwrap();
        let (_, b) = m.gram_schmidt_process().unwrap();
        assert_eq!(b.row(0).unwrap(), &[0.0, 0.0]);
        let s = std::f64::consts::FRAC_1_SQRT_2;
        assert_abs_diff_eq!(b[(1, 0)], s, epsilon = 1e-15);
        assert_abs_diff_eq!(b[(1, 1)], s, epsilon = 1e-15);
    }

    #[test]
    fn test_qr_reconstructs_input() {
        let m = Matrix::from_rows(&[&[4.0, 3.0][..], &[6.0, 3.0][..]]).unwrap();
        let (q, r) = m.qr_decompose().unwrap();

        assert_matrix_eq(&q.mul_matrix(&r).unwrap(), &m, 1e-12);
        assert_orthonormal_columns(&q);
        assert_abs_diff_eq!(r[(1, 0)], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(r[(0, 0)], 52f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_qr_symmetric_tridiagonal() {
        let m = Matrix::from_rows(&[
            &[2.0, -1.0, 0.0][..],
            &[-1.0, 2.0, -1.0][..],
            &[0.0, -1.0, 2.0][..],
        ])
        .unwrap();
        let (q, r) = m.qr_decompose().unwrap();

        assert_matrix_eq(&q.mul_matrix(&r).unwrap(), &m, 1e-12);
        assert_orthonormal_columns(&q);
        for i in 0..3 {
            for j in 0..i {
                assert_abs_diff_eq!(r[(i, j)], 0.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_qr_with_zero_pivot() {
        let m = Matrix::from_rows(&[&[0.0, 1.0][..], &[1.0, 0.0][..]]).unwrap();
        let (q, r) = m.qr_decompose().unwrap();

        assert_matrix_eq(&q.mul_matrix(&r).unwrap(), &m, 1e-12);
        assert_orthonormal_columns(&q);
        let expected = Matrix::from_rows(&[&[1.0, 0.0][..], &[0.0, -1.0][..]]).unwrap();
        assert_matrix_eq(&r, &expected, 1e-12);
    }
}
