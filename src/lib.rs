pub mod decomposition;
pub mod dense;
pub mod eigen;
pub mod error;
pub mod fft;
pub mod svd;
mod utils;

pub use decomposition::EliminationMode;
pub use dense::{Matrix, EPSILON_SCALE};
pub use eigen::{EigenSolver, EigenSolverBuilder, Eigenvalues, Eigenvectors};
pub use error::LinalgError;
pub use svd::Svd;

pub use utils::Direction;
pub use utils::NumericOps;
