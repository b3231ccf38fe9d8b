use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Sub, SubAssign};

use anyhow::bail;

use super::Matrix;
use crate::error::LinalgError;
use crate::NumericOps;

impl<T: NumericOps> Matrix<T> {
    fn check_same_shape(&self, other: &Matrix<T>, op: &'static str) -> anyhow::Result<()> {
        if self.dim() != other.dim() {
            bail!(LinalgError::DimensionMismatch {
                op,
                left: self.dim(),
                right: other.dim(),
            });
        }
        Ok(())
    }

    /// Elementwise sum of two equally shaped matrices.
    pub fn add_matrix(&self, other: &Matrix<T>) -> anyhow::Result<Matrix<T>> {
        let mut mat = self.clone();
        mat.add_assign_matrix(other)?;
        Ok(mat)
    }

    /// Elementwise difference of two equally shaped matrices.
    pub fn sub_matrix(&self, other: &Matrix<T>) -> anyhow::Result<Matrix<T>> {
        let mut mat = self.clone();
        mat.sub_assign_matrix(other)?;
        Ok(mat)
    }

    pub fn add_assign_matrix(&mut self, other: &Matrix<T>) -> anyhow::Result<()> {
        self.check_same_shape(other, "add")?;
        for (lhs, &rhs) in self.data.iter_mut().zip(other.data.iter()) {
            *lhs += rhs;
        }
        Ok(())
    }

    pub fn sub_assign_matrix(&mut self, other: &Matrix<T>) -> anyhow::Result<()> {
        self.check_same_shape(other, "subtract")?;
        for (lhs, &rhs) in self.data.iter_mut().zip(other.data.iter()) {
            *lhs -= rhs;
        }
        Ok(())
    }

    /// Matrix product; requires `self.cols() == other.rows()`.
    pub fn mul_matrix(&self, other: &Matrix<T>) -> anyhow::Result<Matrix<T>> {
        if self.cols != other.rows {
            bail!(LinalgError::DimensionMismatch {
                op: "multiply",
                left: self.dim(),
                right: other.dim(),
            });
        }

        let mut mat = Matrix::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            for j in 0..other.cols {
                let mut acc = T::zero();
                for k in 0..self.cols {
                    acc += self.data[i * self.cols + k] * other.data[k * other.cols + j];
                }
                mat.data[i * other.cols + j] = acc;
            }
        }
        Ok(mat)
    }

    fn map_scalar(mut self, f: impl Fn(&mut T)) -> Matrix<T> {
        self.data.iter_mut().for_each(f);
        self
    }
}

// Scalar arithmetic is total: it never changes the shape.
macro_rules! impl_scalar_op {
    ($op:ident, $method:ident, $op_assign:ident, $method_assign:ident, $sym:tt) => {
        impl<T: NumericOps> $op<T> for Matrix<T> {
            type Output = Matrix<T>;

            fn $method(self, rhs: T) -> Matrix<T> {
                self.map_scalar(|value| *value = *value $sym rhs)
            }
        }

        impl<T: NumericOps> $op<T> for &Matrix<T> {
            type Output = Matrix<T>;

            fn $method(self, rhs: T) -> Matrix<T> {
                self.clone().map_scalar(|value| *value = *value $sym rhs)
            }
        }

        impl<T: NumericOps> $op_assign<T> for Matrix<T> {
            fn $method_assign(&mut self, rhs: T) {
                for value in self.data.iter_mut() {
                    *value = *value $sym rhs;
                }
            }
        }
    };
}

impl_scalar_op!(Add, add, AddAssign, add_assign, +);
impl_scalar_op!(Sub, sub, SubAssign, sub_assign, -);
impl_scalar_op!(Mul, mul, MulAssign, mul_assign, *);
impl_scalar_op!(Div, div, DivAssign, div_assign, /);
