//! Kernel selection as a tagged union

use crate::core::{KdacError, Result};
use crate::kernel::{GaussianKernel, Kernel, LinearKernel, PolynomialKernel};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kernel selector with its per-variant parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum KernelType {
    /// exp(-||x - y||² / (2σ²))
    Gaussian { sigma: f64 },
    /// (<x, y> + 1)^order
    Polynomial { order: u32 },
    /// <x, y> + offset
    Linear { offset: f64 },
}

impl KernelType {
    /// Check the kernel parameter
    pub fn validate(&self) -> Result<()> {
        match *self {
            KernelType::Gaussian { sigma } if !(sigma.is_finite() && sigma > 0.0) => Err(
                KdacError::Configuration(format!("Gaussian sigma must be positive, got: {sigma}")),
            ),
            KernelType::Polynomial { order: 0 } => Err(KdacError::Configuration(
                "Polynomial order must be positive".to_string(),
            )),
            KernelType::Linear { offset } if !offset.is_finite() => Err(
                KdacError::Configuration(format!("Linear offset must be finite, got: {offset}")),
            ),
            _ => Ok(()),
        }
    }

    /// Instantiate the kernel function
    pub fn build(&self) -> Result<Box<dyn Kernel>> {
        self.validate()?;
        Ok(match *self {
            KernelType::Gaussian { sigma } => Box::new(GaussianKernel::new(sigma)),
            KernelType::Polynomial { order } => Box::new(PolynomialKernel::new(order)),
            KernelType::Linear { offset } => Box::new(LinearKernel::new(offset)),
        })
    }

    /// Build a kernel selector from a name and a scalar parameter
    ///
    /// The parameter is the bandwidth for `gaussian`, the order for
    /// `polynomial` and the offset for `linear`.
    pub fn from_name(name: &str, param: f64) -> Result<Self> {
        let kernel = match name.to_ascii_lowercase().as_str() {
            "gaussian" | "rbf" => KernelType::Gaussian { sigma: param },
            "polynomial" | "poly" => {
                if param.fract() != 0.0 || param < 1.0 || param > f64::from(u32::MAX) {
                    return Err(KdacError::Configuration(format!(
                        "Polynomial order must be a positive integer, got: {param}"
                    )));
                }
                KernelType::Polynomial {
                    order: param as u32,
                }
            }
            "linear" => KernelType::Linear { offset: param },
            other => {
                return Err(KdacError::Configuration(format!(
                    "Unknown kernel: {other}. Use 'gaussian', 'polynomial' or 'linear'"
                )))
            }
        };
        kernel.validate()?;
        Ok(kernel)
    }
}

impl fmt::Display for KernelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelType::Gaussian { sigma } => write!(f, "gaussian(sigma={sigma})"),
            KernelType::Polynomial { order } => write!(f, "polynomial(order={order})"),
            KernelType::Linear { offset } => write!(f, "linear(offset={offset})"),
        }
    }
}
