use super::{CodecError, CodecResult};
use crate::math::modular::gcd;
use std::fmt;

/// Positive rational scale factor `numerator / denominator`.
///
/// Kept in lowest terms so that equality is structural. Products such as
/// `denom * s^k` are accumulated with [`Scale::checked_mul`] and
/// [`Scale::pow`], which fail with [`CodecError::ScaleOverflow`] instead of
/// wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Scale {
    numerator: u128,
    denominator: u128,
}

impl Scale {
    pub const ONE: Scale = Scale {
        numerator: 1,
        denominator: 1,
    };

    pub fn integer(value: u128) -> CodecResult<Self> {
        Self::ratio(value, 1)
    }

    pub fn ratio(numerator: u128, denominator: u128) -> CodecResult<Self> {
        if numerator == 0 || denominator == 0 {
            return Err(CodecError::ZeroScale);
        }
        let divisor = gcd(numerator, denominator);
        Ok(Self {
            numerator: numerator / divisor,
            denominator: denominator / divisor,
        })
    }

    pub fn numerator(self) -> u128 {
        self.numerator
    }

    pub fn denominator(self) -> u128 {
        self.denominator
    }

    pub fn is_integer(self) -> bool {
        self.denominator == 1
    }

    pub fn as_f64(self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    pub fn checked_mul(self, rhs: Scale) -> CodecResult<Self> {
        // Cross-cancel first so reduced results never overflow spuriously.
        let g1 = gcd(self.numerator, rhs.denominator);
        let g2 = gcd(rhs.numerator, self.denominator);
        let numerator = (self.numerator / g1)
            .checked_mul(rhs.numerator / g2)
            .ok_or(CodecError::ScaleOverflow)?;
        let denominator = (self.denominator / g2)
            .checked_mul(rhs.denominator / g1)
            .ok_or(CodecError::ScaleOverflow)?;
        Ok(Self {
            numerator,
            denominator,
        })
    }

    pub fn pow(self, exponent: u32) -> CodecResult<Self> {
        let numerator = self
            .numerator
            .checked_pow(exponent)
            .ok_or(CodecError::ScaleOverflow)?;
        let denominator = self
            .denominator
            .checked_pow(exponent)
            .ok_or(CodecError::ScaleOverflow)?;
        Ok(Self {
            numerator,
            denominator,
        })
    }

    /// Returns the integer `k` with `self * k == target`.
    ///
    /// Fails with [`CodecError::IncompatibleScale`] when the ratio is not a
    /// positive integer, i.e. when `target` cannot be reached by multiplying
    /// a value at this scale by an integer constant.
    pub fn factor_to(self, target: Scale) -> CodecResult<u128> {
        let incompatible = CodecError::IncompatibleScale {
            from: self,
            to: target,
        };
        let g1 = gcd(target.numerator, self.numerator);
        let g2 = gcd(self.denominator, target.denominator);
        let numerator = (target.numerator / g1)
            .checked_mul(self.denominator / g2)
            .ok_or(CodecError::ScaleOverflow)?;
        let denominator = (self.numerator / g1)
            .checked_mul(target.denominator / g2)
            .ok_or(CodecError::ScaleOverflow)?;
        if numerator % denominator != 0 {
            return Err(incompatible);
        }
        Ok(numerator / denominator)
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_integer() {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_is_reduced() {
        let scale = Scale::ratio(120, 50).unwrap();
        assert_eq!((scale.numerator(), scale.denominator()), (12, 5));
        assert_eq!(scale.to_string(), "12/5");
        assert_eq!(Scale::integer(50).unwrap().to_string(), "50");
    }

    #[test]
    fn zero_scale_is_rejected() {
        assert_eq!(Scale::integer(0), Err(CodecError::ZeroScale));
        assert_eq!(Scale::ratio(3, 0), Err(CodecError::ZeroScale));
    }

    #[test]
    fn taylor_combined_scale() {
        let s = Scale::integer(50).unwrap();
        let denom = Scale::integer(120).unwrap();
        let combined = denom.checked_mul(s.pow(5).unwrap()).unwrap();
        assert_eq!(combined.numerator(), 37_500_000_000);
        assert!(combined.is_integer());
    }

    #[test]
    fn mul_cancels_rationals() {
        let half = Scale::ratio(1, 2).unwrap();
        let two = Scale::integer(2).unwrap();
        assert_eq!(half.checked_mul(two).unwrap(), Scale::ONE);
    }

    #[test]
    fn pow_overflow_is_reported() {
        let big = Scale::integer(1 << 40).unwrap();
        assert_eq!(big.pow(4), Err(CodecError::ScaleOverflow));
    }

    #[test]
    fn factor_to_integer_targets() {
        let s = Scale::integer(50).unwrap();
        let s3 = s.pow(3).unwrap();
        assert_eq!(s.factor_to(s3).unwrap(), 2500);
        assert_eq!(s3.factor_to(s3).unwrap(), 1);
        assert!(matches!(
            s3.factor_to(s),
            Err(CodecError::IncompatibleScale { .. })
        ));
        let third = Scale::ratio(1, 3).unwrap();
        assert_eq!(third.factor_to(Scale::ONE).unwrap(), 3);
    }
}
