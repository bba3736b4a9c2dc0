//! Fixed-point circuits over a [`HomomorphicBackend`](crate::backend::HomomorphicBackend).
//!
//! Every circuit can be validated against a plaintext modulus and a depth
//! budget before any ciphertext is touched, so overflow of the centered
//! range shows up as a [`ConfigurationError`] instead of a wrong result.

pub mod convolution;
pub mod polynomial;
pub mod recurrence;
pub mod scaled;
pub mod taylor;

pub use convolution::{ShiftDirection, ShiftedConvolution};
pub use polynomial::PolynomialProduct;
pub use recurrence::{RecurrenceState, SinCosRecurrence};
pub use scaled::{ScaledCiphertext, ScaledEvaluator};
pub use taylor::{TaylorEvaluation, TaylorPlan, TaylorTerm};

use crate::codec::PlaintextModulus;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("circuit needs depth {required} but only {available} levels are available")]
    InsufficientDepth { required: usize, available: usize },

    #[error("magnitude {magnitude} at {stage} does not fit the centered range of modulus {modulus}")]
    ModulusTooSmall {
        magnitude: u128,
        modulus: u64,
        stage: String,
    },

    #[error("convolution kernel is empty")]
    EmptyKernel,

    #[error("width {width} exceeds the rotation row of {row_size} slots")]
    WidthExceedsRow { width: usize, row_size: usize },

    #[error("polynomial plan has no terms")]
    EmptyPlan,
}

/// Fails unless `magnitude <= floor(m/2)`.
pub(crate) fn check_magnitude(
    magnitude: u128,
    modulus: PlaintextModulus,
    stage: impl Into<String>,
) -> Result<u128, ConfigurationError> {
    if magnitude > modulus.half() as u128 {
        return Err(ConfigurationError::ModulusTooSmall {
            magnitude,
            modulus: modulus.value(),
            stage: stage.into(),
        });
    }
    Ok(magnitude)
}

pub(crate) fn check_depth(required: usize, available: usize) -> Result<(), ConfigurationError> {
    if required > available {
        return Err(ConfigurationError::InsufficientDepth {
            required,
            available,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magnitude_boundary_is_half_the_modulus() {
        let m = PlaintextModulus::new(101).unwrap();
        assert_eq!(check_magnitude(50, m, "x"), Ok(50));
        assert_eq!(
            check_magnitude(51, m, "x"),
            Err(ConfigurationError::ModulusTooSmall {
                magnitude: 51,
                modulus: 101,
                stage: "x".into()
            })
        );
    }

    #[test]
    fn depth_check() {
        assert!(check_depth(2, 2).is_ok());
        assert_eq!(
            check_depth(3, 2),
            Err(ConfigurationError::InsufficientDepth {
                required: 3,
                available: 2
            })
        );
    }
}
