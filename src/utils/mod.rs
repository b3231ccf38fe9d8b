use std::fmt::Debug;

use num_traits::{Num, NumAssign, NumCast};

/// Selects whether an elementary operation acts on rows or on columns.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ROW,
    COLUMN,
}

impl Direction {
    pub fn is_row(&self) -> bool {
        matches!(self, Direction::ROW)
    }
}

/// Element types a [`Matrix`](crate::Matrix) or an FFT signal can hold.
///
/// Every element converts losslessly enough to `f64` for the decompositions,
/// which always run in double precision. `INTEGRAL` marks types whose results
/// are rounded to the nearest integer before narrowing back.
pub trait NumericOps:
    Num + NumAssign + NumCast + Copy + PartialOrd + Debug + Default + Send + Sync + 'static
{
    const INTEGRAL: bool;

    /// Narrows a double-precision value, rounding first for integral types.
    fn from_f64_rounded(value: f64) -> Option<Self> {
        if Self::INTEGRAL {
            <Self as NumCast>::from(value.round())
        } else {
            <Self as NumCast>::from(value)
        }
    }
}

macro_rules! impl_numeric_ops {
    ($integral:expr => $($t:ty),*) => {
        $(
            impl NumericOps for $t {
                const INTEGRAL: bool = $integral;
            }
        )*
    };
}

impl_numeric_ops!(true => i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
impl_numeric_ops!(false => f32, f64);
