use log::trace;

use super::EliminationMode;
use crate::dense::is_negligible;
use crate::{Direction, Matrix, NumericOps};

impl<T: NumericOps> Matrix<T> {
    /// Triangularizes a copy of `self` by Gaussian row elimination.
    ///
    /// Sweeps pivot columns left to right. A pivot within epsilon of zero is
    /// replaced by adding the first lower row with a usable entry in that
    /// column; if none exists the column is skipped and the row pointer stays
    /// put, so rank deficiency leaves zero rows at the bottom of `B`.
    ///
    /// # Returns
    /// `(A, B)` where `B` is row-echelon and `A` follows `mode`.
    pub fn gaussian_row_elimination(
        &self,
        mode: EliminationMode,
    ) -> anyhow::Result<(Matrix<f64>, Matrix<f64>)> {
        let (rows, cols) = self.dim();
        let mut a = Matrix::<f64>::identity(rows);
        let mut b = self.to_f64()?;

        let record = |a: &mut Matrix<f64>, from: usize, to: usize, weight: f64| match mode {
            EliminationMode::Inverse => a.element_op(Direction::ROW, from, to, weight),
            EliminationMode::Factor => a.element_op(Direction::COLUMN, to, from, -weight),
        };

        let mut i = 0;
        let mut offset = 0;
        while i < rows && i + offset < cols {
            let k = i + offset;

            let eps = b.epsilon();
            if is_negligible(b[(i, k)], eps) {
                if let Some(j) = (i + 1..rows).find(|&j| b[(j, k)].abs() > eps) {
                    b.element_op(Direction::ROW, j, i, 1.0)?;
                    record(&mut a, j, i, 1.0)?;
                }
                if is_negligible(b[(i, k)], b.epsilon()) {
                    trace!("column {} has no usable pivot below row {}", k, i);
                    offset += 1;
                    continue;
                }
            }

            for j in i + 1..rows {
                let weight = -b[(j, k)] / b[(i, k)];
                b.element_op(Direction::ROW, i, j, weight)?;
                record(&mut a, i, j, weight)?;
            }
            i += 1;
        }

        Ok((a, b))
    }

    /// LU-style factorization `(L, U)` with `L · U ≈ self`.
    ///
    /// `U` is row-echelon. `L` is lower triangular unless a zero pivot forced
    /// a row addition, in which case it carries the compensating entries.
    pub fn lu_decompose(&self) -> anyhow::Result<(Matrix<f64>, Matrix<f64>)> {
        self.gaussian_row_elimination(EliminationMode::Factor)
    }
}
