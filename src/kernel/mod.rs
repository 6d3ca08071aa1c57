//! Kernel functions and kernel-derived matrices

pub mod gaussian;
pub mod kernel_type;
pub mod linear;
pub mod matrix;
pub mod polynomial;
pub mod traits;

pub use self::gaussian::*;
pub use self::kernel_type::*;
pub use self::linear::*;
pub use self::matrix::*;
pub use self::polynomial::*;
pub use self::traits::*;
