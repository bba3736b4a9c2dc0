use super::check_magnitude;
use crate::{
    Result,
    backend::HomomorphicBackend,
    codec::{CodecError, PlaintextModulus, Scale, center, decode_integer, encode, to_modular},
};

/// A ciphertext together with the fixed-point scale of its slots and a
/// worst-case bound on the magnitude of the integers they hold.
#[derive(Debug, Clone)]
pub struct ScaledCiphertext<C> {
    ciphertext: C,
    scale: Scale,
    bound: u128,
}

impl<C> ScaledCiphertext<C> {
    pub fn ciphertext(&self) -> &C {
        &self.ciphertext
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    pub fn bound(&self) -> u128 {
        self.bound
    }

    pub fn into_ciphertext(self) -> C {
        self.ciphertext
    }
}

/// Fixed-point arithmetic on top of a backend.
///
/// Each operation derives the scale and magnitude bound of its result and
/// rejects it before calling the backend when the bound leaves the centered
/// range of the plaintext modulus.
#[derive(Debug)]
pub struct ScaledEvaluator<B> {
    backend: B,
}

impl<B: HomomorphicBackend> ScaledEvaluator<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    pub fn modulus(&self) -> PlaintextModulus {
        self.backend.plaintext_modulus()
    }

    /// Levels still available to `value`.
    pub fn remaining_depth(&self, value: &ScaledCiphertext<B::Ciphertext>) -> usize {
        self.backend
            .max_depth()
            .saturating_sub(self.backend.depth(&value.ciphertext))
    }

    /// Encodes every real `values[i]` at `scale` into slot `i`.
    pub fn encrypt(&mut self, values: &[f64], scale: Scale) -> Result<ScaledCiphertext<B::Ciphertext>> {
        let modulus = self.modulus();
        let integers = values
            .iter()
            .map(|&x| encode(x, scale, modulus))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        self.encrypt_integers(&integers, scale)
    }

    /// Encrypts integers that already carry `scale`.
    pub fn encrypt_integers(
        &mut self,
        values: &[i128],
        scale: Scale,
    ) -> Result<ScaledCiphertext<B::Ciphertext>> {
        let modulus = self.modulus();
        let mut bound = 0u128;
        for &value in values {
            modulus.check(value)?;
            bound = bound.max(value.unsigned_abs());
        }
        let ciphertext = self.backend.encrypt_values(&self.residues(values))?;
        Ok(ScaledCiphertext {
            ciphertext,
            scale,
            bound,
        })
    }

    pub fn add(
        &self,
        lhs: &ScaledCiphertext<B::Ciphertext>,
        rhs: &ScaledCiphertext<B::Ciphertext>,
    ) -> Result<ScaledCiphertext<B::Ciphertext>> {
        let scale = same_scale(lhs, rhs)?;
        let bound = check_magnitude(lhs.bound.saturating_add(rhs.bound), self.modulus(), "add")?;
        Ok(ScaledCiphertext {
            ciphertext: self.backend.add(&lhs.ciphertext, &rhs.ciphertext)?,
            scale,
            bound,
        })
    }

    pub fn sub(
        &self,
        lhs: &ScaledCiphertext<B::Ciphertext>,
        rhs: &ScaledCiphertext<B::Ciphertext>,
    ) -> Result<ScaledCiphertext<B::Ciphertext>> {
        let scale = same_scale(lhs, rhs)?;
        let bound = check_magnitude(lhs.bound.saturating_add(rhs.bound), self.modulus(), "sub")?;
        Ok(ScaledCiphertext {
            ciphertext: self.backend.sub(&lhs.ciphertext, &rhs.ciphertext)?,
            scale,
            bound,
        })
    }

    pub fn negate(&self, value: &ScaledCiphertext<B::Ciphertext>) -> Result<ScaledCiphertext<B::Ciphertext>> {
        Ok(ScaledCiphertext {
            ciphertext: self.backend.negate(&value.ciphertext)?,
            scale: value.scale,
            bound: value.bound,
        })
    }

    /// Adds two values after raising the smaller scale to the larger one.
    ///
    /// The raise is a plaintext multiplication and costs a level on that
    /// operand.
    pub fn add_aligned(
        &self,
        lhs: &ScaledCiphertext<B::Ciphertext>,
        rhs: &ScaledCiphertext<B::Ciphertext>,
    ) -> Result<ScaledCiphertext<B::Ciphertext>> {
        if lhs.scale == rhs.scale {
            return self.add(lhs, rhs);
        }
        match lhs.scale.factor_to(rhs.scale) {
            Ok(_) => self.add(&self.rescale_to(lhs, rhs.scale)?, rhs),
            Err(_) => self.add(lhs, &self.rescale_to(rhs, lhs.scale)?),
        }
    }

    /// Adds `constant`, already at the scale of `value`, to every slot.
    pub fn add_integer(
        &self,
        value: &ScaledCiphertext<B::Ciphertext>,
        constant: i128,
    ) -> Result<ScaledCiphertext<B::Ciphertext>> {
        let modulus = self.modulus();
        let bound = check_magnitude(
            value.bound.saturating_add(constant.unsigned_abs()),
            modulus,
            "add_plain",
        )?;
        let plaintext = self
            .backend
            .encode_constant(to_modular(constant, modulus.value()))?;
        Ok(ScaledCiphertext {
            ciphertext: self.backend.add_plain(&value.ciphertext, &plaintext)?,
            scale: value.scale,
            bound,
        })
    }

    pub fn mul(
        &self,
        lhs: &ScaledCiphertext<B::Ciphertext>,
        rhs: &ScaledCiphertext<B::Ciphertext>,
    ) -> Result<ScaledCiphertext<B::Ciphertext>> {
        let scale = lhs.scale.checked_mul(rhs.scale)?;
        let bound = check_magnitude(lhs.bound.saturating_mul(rhs.bound), self.modulus(), "mul")?;
        Ok(ScaledCiphertext {
            ciphertext: self.backend.mul(&lhs.ciphertext, &rhs.ciphertext)?,
            scale,
            bound,
        })
    }

    /// Multiplies by the real constant `c`, encoded at `constant_scale`.
    pub fn mul_constant(
        &self,
        value: &ScaledCiphertext<B::Ciphertext>,
        c: f64,
        constant_scale: Scale,
    ) -> Result<ScaledCiphertext<B::Ciphertext>> {
        let constant = encode(c, constant_scale, self.modulus())?;
        self.mul_integers(value, &[constant], constant_scale, true)
    }

    /// Multiplies every slot by an integer that carries `constant_scale`.
    pub fn mul_scaled_integer(
        &self,
        value: &ScaledCiphertext<B::Ciphertext>,
        constant: i128,
        constant_scale: Scale,
    ) -> Result<ScaledCiphertext<B::Ciphertext>> {
        self.mul_integers(value, &[constant], constant_scale, true)
    }

    /// Multiplies every slot by the integer `constant`, keeping the scale.
    pub fn mul_integer(
        &self,
        value: &ScaledCiphertext<B::Ciphertext>,
        constant: i128,
    ) -> Result<ScaledCiphertext<B::Ciphertext>> {
        self.mul_integers(value, &[constant], Scale::ONE, true)
    }

    /// Slot-wise product with a plaintext vector of integers at
    /// `constant_scale`. Slots past `constants.len()` are multiplied by zero.
    pub fn mul_slots(
        &self,
        value: &ScaledCiphertext<B::Ciphertext>,
        constants: &[i128],
        constant_scale: Scale,
    ) -> Result<ScaledCiphertext<B::Ciphertext>> {
        self.mul_integers(value, constants, constant_scale, false)
    }

    /// Raises the scale of `value` to `target` by an exact integer factor.
    pub fn rescale_to(
        &self,
        value: &ScaledCiphertext<B::Ciphertext>,
        target: Scale,
    ) -> Result<ScaledCiphertext<B::Ciphertext>> {
        let factor = value.scale.factor_to(target)?;
        if factor == 1 {
            return Ok(value.clone());
        }
        let factor = i128::try_from(factor).map_err(|_| CodecError::IntegerOverflow)?;
        let mut rescaled = self.mul_integer(value, factor)?;
        rescaled.scale = target;
        Ok(rescaled)
    }

    pub fn rotate(
        &self,
        value: &ScaledCiphertext<B::Ciphertext>,
        offset: i64,
    ) -> Result<ScaledCiphertext<B::Ciphertext>> {
        Ok(ScaledCiphertext {
            ciphertext: self.backend.rotate(&value.ciphertext, offset)?,
            scale: value.scale,
            bound: value.bound,
        })
    }

    /// Centered slot integers, still at the scale of `value`.
    pub fn decrypt_integers(&self, value: &ScaledCiphertext<B::Ciphertext>) -> Result<Vec<i128>> {
        let modulus = self.modulus().value();
        Ok(self
            .backend
            .decrypt_values(&value.ciphertext)?
            .into_iter()
            .map(|residue| center(residue as i128, modulus))
            .collect())
    }

    pub fn decrypt(&self, value: &ScaledCiphertext<B::Ciphertext>) -> Result<Vec<f64>> {
        Ok(self
            .decrypt_integers(value)?
            .into_iter()
            .map(|v| decode_integer(v, value.scale))
            .collect())
    }

    fn mul_integers(
        &self,
        value: &ScaledCiphertext<B::Ciphertext>,
        constants: &[i128],
        constant_scale: Scale,
        broadcast: bool,
    ) -> Result<ScaledCiphertext<B::Ciphertext>> {
        let modulus = self.modulus();
        for &constant in constants {
            modulus.check(constant)?;
        }
        let largest = constants.iter().map(|c| c.unsigned_abs()).max().unwrap_or(0);
        let bound = check_magnitude(value.bound.saturating_mul(largest), modulus, "mul_plain")?;
        let scale = value.scale.checked_mul(constant_scale)?;
        let plaintext = match constants {
            [constant] if broadcast => self
                .backend
                .encode_constant(to_modular(*constant, modulus.value()))?,
            _ => self.backend.encode(&self.residues(constants))?,
        };
        Ok(ScaledCiphertext {
            ciphertext: self.backend.mul_plain(&value.ciphertext, &plaintext)?,
            scale,
            bound,
        })
    }

    fn residues(&self, values: &[i128]) -> Vec<u64> {
        let modulus = self.modulus().value();
        values.iter().map(|&v| to_modular(v, modulus)).collect()
    }
}

fn same_scale<C>(lhs: &ScaledCiphertext<C>, rhs: &ScaledCiphertext<C>) -> Result<Scale> {
    if lhs.scale != rhs.scale {
        return Err(CodecError::ScaleMismatch {
            left: lhs.scale,
            right: rhs.scale,
        }
        .into());
    }
    Ok(lhs.scale)
}
