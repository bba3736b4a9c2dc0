//! Fixed-point modular codec.
//!
//! Real numbers enter the plaintext space as `round(x * scale)` and leave it
//! as `center(residue) / scale`. Scales are exact rationals so that products
//! such as `denom * s^k` can be compared and aligned without float drift.

mod fixed_point;
mod modulus;
mod scale;

pub use fixed_point::{ModularResidue, ScaledInteger, decode, decode_integer, encode};
pub use modulus::{PlaintextModulus, center, to_modular};
pub use scale::Scale;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CodecError {
    #[error("value {value} does not fit the centered range of modulus {modulus}")]
    Range { value: i128, modulus: u64 },
    #[error("cannot encode non-finite input {0}")]
    NonFiniteInput(f64),
    #[error("plaintext modulus must be odd and greater than 2, got {0}")]
    InvalidModulus(u64),
    #[error("scale must be positive")]
    ZeroScale,
    #[error("scale mismatch: {left} vs {right}")]
    ScaleMismatch { left: Scale, right: Scale },
    #[error("scale {from} cannot be raised to {to} by an integer factor")]
    IncompatibleScale { from: Scale, to: Scale },
    #[error("scale product overflows 128 bits")]
    ScaleOverflow,
    #[error("scaled integer arithmetic overflows 128 bits")]
    IntegerOverflow,
}

pub type CodecResult<T> = Result<T, CodecError>;
