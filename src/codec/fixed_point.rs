use super::{CodecError, CodecResult, PlaintextModulus, Scale, center};

/// Encodes `x` as the integer `round(x * scale)`.
///
/// Fails with [`CodecError::Range`] when the rounded value does not fit the
/// centered range of `modulus`; wraparound is never silent.
pub fn encode(x: f64, scale: Scale, modulus: PlaintextModulus) -> CodecResult<i128> {
    if !x.is_finite() {
        return Err(CodecError::NonFiniteInput(x));
    }
    let rounded = (x * scale.as_f64()).round();
    // `as` saturates, so huge inputs still surface as a range error.
    modulus.check(rounded as i128)
}

/// Centers `residue` and divides by `scale`.
pub fn decode(residue: u64, modulus: PlaintextModulus, scale: Scale) -> f64 {
    decode_integer(center(residue as i128, modulus.value()), scale)
}

pub fn decode_integer(value: i128, scale: Scale) -> f64 {
    value as f64 * scale.denominator() as f64 / scale.numerator() as f64
}

/// An integer `value` standing for `value / scale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaledInteger {
    value: i128,
    scale: Scale,
}

impl ScaledInteger {
    pub fn new(value: i128, scale: Scale) -> Self {
        Self { value, scale }
    }

    pub fn encode(x: f64, scale: Scale, modulus: PlaintextModulus) -> CodecResult<Self> {
        Ok(Self::new(encode(x, scale, modulus)?, scale))
    }

    pub fn value(&self) -> i128 {
        self.value
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    pub fn checked_add(&self, rhs: &Self) -> CodecResult<Self> {
        self.require_same_scale(rhs)?;
        let value = self
            .value
            .checked_add(rhs.value)
            .ok_or(CodecError::IntegerOverflow)?;
        Ok(Self::new(value, self.scale))
    }

    pub fn checked_sub(&self, rhs: &Self) -> CodecResult<Self> {
        self.require_same_scale(rhs)?;
        let value = self
            .value
            .checked_sub(rhs.value)
            .ok_or(CodecError::IntegerOverflow)?;
        Ok(Self::new(value, self.scale))
    }

    /// Multiplies values and scales.
    pub fn checked_mul(&self, rhs: &Self) -> CodecResult<Self> {
        let value = self
            .value
            .checked_mul(rhs.value)
            .ok_or(CodecError::IntegerOverflow)?;
        Ok(Self::new(value, self.scale.checked_mul(rhs.scale)?))
    }

    /// Re-expresses this value at `target` by an exact integer factor.
    pub fn rescale_to(&self, target: Scale) -> CodecResult<Self> {
        let factor = self.scale.factor_to(target)?;
        let factor = i128::try_from(factor).map_err(|_| CodecError::IntegerOverflow)?;
        let value = self
            .value
            .checked_mul(factor)
            .ok_or(CodecError::IntegerOverflow)?;
        Ok(Self::new(value, target))
    }

    pub fn to_residue(&self, modulus: PlaintextModulus) -> CodecResult<ModularResidue> {
        let value = modulus.check(self.value)?;
        Ok(ModularResidue {
            residue: modulus.to_modular(value),
            modulus,
            scale: self.scale,
        })
    }

    pub fn to_f64(&self) -> f64 {
        decode_integer(self.value, self.scale)
    }

    fn require_same_scale(&self, rhs: &Self) -> CodecResult<()> {
        if self.scale != rhs.scale {
            return Err(CodecError::ScaleMismatch {
                left: self.scale,
                right: rhs.scale,
            });
        }
        Ok(())
    }
}

/// A scaled integer reduced into `[0, m)`.
///
/// Residues above `m / 2` stand for `residue - m`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModularResidue {
    residue: u64,
    modulus: PlaintextModulus,
    scale: Scale,
}

impl ModularResidue {
    pub fn new(residue: u64, modulus: PlaintextModulus, scale: Scale) -> CodecResult<Self> {
        if residue >= modulus.value() {
            return Err(CodecError::Range {
                value: residue as i128,
                modulus: modulus.value(),
            });
        }
        Ok(Self {
            residue,
            modulus,
            scale,
        })
    }

    pub fn residue(&self) -> u64 {
        self.residue
    }

    pub fn modulus(&self) -> PlaintextModulus {
        self.modulus
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    pub fn centered(&self) -> i128 {
        self.modulus.center(self.residue)
    }

    pub fn to_scaled_integer(&self) -> ScaledInteger {
        ScaledInteger::new(self.centered(), self.scale)
    }

    pub fn decode(&self) -> f64 {
        decode(self.residue, self.modulus, self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn modulus(value: u64) -> PlaintextModulus {
        PlaintextModulus::new(value).unwrap()
    }

    #[test]
    fn encode_rounds_to_nearest() {
        let t = modulus(65537);
        let s = Scale::integer(50).unwrap();
        assert_eq!(encode(0.5236, s, t).unwrap(), 26);
        assert_eq!(encode(-0.5236, s, t).unwrap(), -26);
        assert_eq!(encode(0.0, s, t).unwrap(), 0);
    }

    #[test]
    fn encode_rejects_out_of_range() {
        let t = modulus(65537);
        assert_eq!(
            encode(40_000.0, Scale::ONE, t),
            Err(CodecError::Range {
                value: 40_000,
                modulus: 65537
            })
        );
        assert!(matches!(
            encode(1e300, Scale::ONE, t),
            Err(CodecError::Range { .. })
        ));
        assert!(matches!(
            encode(f64::NAN, Scale::ONE, t),
            Err(CodecError::NonFiniteInput(_))
        ));
    }

    #[test]
    fn decode_centers_before_descaling() {
        let t = modulus(65537);
        let s = Scale::integer(100).unwrap();
        assert_abs_diff_eq!(decode(65537 - 314, t, s), -3.14, epsilon = 1e-12);
        assert_abs_diff_eq!(decode(314, t, s), 3.14, epsilon = 1e-12);
    }

    #[test]
    fn negative_constant_circuit_in_the_clear() {
        let t = modulus(65537);
        let x = ScaledInteger::encode(-2344.0, Scale::ONE, t).unwrap();
        let minus_seven = ScaledInteger::new(-7, Scale::ONE);
        let three = ScaledInteger::new(3, Scale::ONE);
        let sum = minus_seven
            .checked_mul(&x)
            .unwrap()
            .checked_add(&three.checked_mul(&x).unwrap())
            .unwrap();
        let residue = sum.to_residue(t).unwrap();
        assert_eq!(residue.centered(), 9376);
        assert_eq!(residue.decode(), 9376.0);
    }

    #[test]
    fn addition_requires_equal_scales() {
        let a = ScaledInteger::new(3, Scale::integer(10).unwrap());
        let b = ScaledInteger::new(3, Scale::integer(100).unwrap());
        assert!(matches!(
            a.checked_add(&b),
            Err(CodecError::ScaleMismatch { .. })
        ));
        let aligned = a.rescale_to(b.scale()).unwrap();
        assert_eq!(aligned.value(), 30);
        assert_eq!(aligned.checked_add(&b).unwrap().value(), 33);
        assert_abs_diff_eq!(aligned.to_f64(), 0.3, epsilon = 1e-12);
    }

    #[test]
    fn residue_constructor_checks_reduction() {
        let t = modulus(17);
        assert!(ModularResidue::new(17, t, Scale::ONE).is_err());
        let r = ModularResidue::new(16, t, Scale::ONE).unwrap();
        assert_eq!(r.to_scaled_integer().value(), -1);
    }
}
