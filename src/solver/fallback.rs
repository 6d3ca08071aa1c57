//! Primary/fallback solver composition

use crate::core::{Decomposition, Result, SpectralSolver};
use log::warn;
use nalgebra::DMatrix;

/// Runs the primary solver and falls back to a second one on failure
///
/// A failure of the primary backend is recoverable: it is logged and the
/// same request is replayed on the fallback. Only when both fail does the
/// error reach the caller.
pub struct FallbackSolver {
    primary: Box<dyn SpectralSolver>,
    fallback: Box<dyn SpectralSolver>,
}

impl FallbackSolver {
    pub fn new(primary: Box<dyn SpectralSolver>, fallback: Box<dyn SpectralSolver>) -> Self {
        Self { primary, fallback }
    }
}

impl SpectralSolver for FallbackSolver {
    fn decompose(&self, matrix: &DMatrix<f64>, n_components: usize) -> Result<Decomposition> {
        match self.primary.decompose(matrix, n_components) {
            Ok(decomposition) => Ok(decomposition),
            Err(e) => {
                warn!(
                    "{} solver failed ({e}), retrying with {} solver",
                    self.primary.name(),
                    self.fallback.name()
                );
                self.fallback.decompose(matrix, n_components)
            }
        }
    }

    fn name(&self) -> &'static str {
        self.primary.name()
    }
}
