use super::{CodecError, CodecResult};
use std::fmt;

/// Reduces a signed integer into `[0, modulus)`.
///
/// For `-modulus < v < 0` this is `modulus + v`, the non-negative
/// representative every negative constant needs before it can be packed
/// into a plaintext. Idempotent on its output.
///
/// # Panics
///
/// Panics if `modulus == 0`.
#[inline]
pub fn to_modular(value: i128, modulus: u64) -> u64 {
    assert!(modulus > 0, "to_modular: modulus must be positive");
    value.rem_euclid(modulus as i128) as u64
}

/// Centers a residue: values above `modulus / 2` become `value - modulus`.
///
/// Values that are already centered are returned unchanged, so
/// `center(center(v)) == center(v)`.
#[inline]
pub fn center(value: i128, modulus: u64) -> i128 {
    if value > (modulus / 2) as i128 {
        value - modulus as i128
    } else {
        value
    }
}

/// The plaintext modulus `t` shared by an entire run.
///
/// Odd and greater than two, so the centered range
/// `[-(t-1)/2, (t-1)/2]` is symmetric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaintextModulus(u64);

impl PlaintextModulus {
    pub fn new(value: u64) -> CodecResult<Self> {
        if value <= 2 || value % 2 == 0 || value > i64::MAX as u64 {
            return Err(CodecError::InvalidModulus(value));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> u64 {
        self.0
    }

    /// Largest magnitude representable as a centered residue.
    pub fn half(self) -> u64 {
        self.0 / 2
    }

    pub fn bits(self) -> f64 {
        (self.0 as f64).log2()
    }

    pub fn contains(self, value: i128) -> bool {
        value.unsigned_abs() <= self.half() as u128
    }

    /// Returns `value` unchanged if it survives a trip through this modulus.
    pub fn check(self, value: i128) -> CodecResult<i128> {
        if self.contains(value) {
            Ok(value)
        } else {
            Err(CodecError::Range {
                value,
                modulus: self.0,
            })
        }
    }

    pub fn to_modular(self, value: i128) -> u64 {
        to_modular(value, self.0)
    }

    pub fn center(self, residue: u64) -> i128 {
        center(residue as i128, self.0)
    }
}

impl fmt::Display for PlaintextModulus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
