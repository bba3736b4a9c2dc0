use super::{
    ciphertext::{Ciphertext, Plaintext},
    context::BgvContext,
    errors::{BgvError, BgvResult},
    keys::{RelinearizationKey, RotationKeys},
};
use tracing::trace;

/// Homomorphic operations. Every result keeps the maximum level of its
/// inputs, plus one for multiplications, and updates the noise estimate.
impl BgvContext {
    pub fn add(&self, lhs: &Ciphertext, rhs: &Ciphertext) -> BgvResult<Ciphertext> {
        self.check_operand(lhs)?;
        self.check_operand(rhs)?;
        let mut c0 = lhs.c0.clone();
        c0 += &rhs.c0;
        let mut c1 = lhs.c1.clone();
        c1 += &rhs.c1;
        let noise = self.noise_model().add(lhs.noise_bits(), rhs.noise_bits());
        Ok(Ciphertext::new(c0, c1, lhs.level().max(rhs.level()), noise))
    }

    pub fn sub(&self, lhs: &Ciphertext, rhs: &Ciphertext) -> BgvResult<Ciphertext> {
        self.check_operand(lhs)?;
        self.check_operand(rhs)?;
        let mut c0 = lhs.c0.clone();
        c0 -= &rhs.c0;
        let mut c1 = lhs.c1.clone();
        c1 -= &rhs.c1;
        let noise = self.noise_model().add(lhs.noise_bits(), rhs.noise_bits());
        Ok(Ciphertext::new(c0, c1, lhs.level().max(rhs.level()), noise))
    }

    pub fn negate(&self, ciphertext: &Ciphertext) -> BgvResult<Ciphertext> {
        self.check_operand(ciphertext)?;
        Ok(Ciphertext::new(
            -ciphertext.c0.clone(),
            -ciphertext.c1.clone(),
            ciphertext.level(),
            ciphertext.noise_bits(),
        ))
    }

    pub fn add_plain(&self, ciphertext: &Ciphertext, plaintext: &Plaintext) -> BgvResult<Ciphertext> {
        self.check_operand(ciphertext)?;
        let mut c0 = ciphertext.c0.clone();
        c0 += &self.lift_plaintext(plaintext);
        let noise = self.noise_model().add_plain(ciphertext.noise_bits());
        Ok(Ciphertext::new(
            c0,
            ciphertext.c1.clone(),
            ciphertext.level(),
            noise,
        ))
    }

    /// Slot-wise product with a plaintext. Consumes one level.
    pub fn mul_plain(&self, ciphertext: &Ciphertext, plaintext: &Plaintext) -> BgvResult<Ciphertext> {
        self.check_operand(ciphertext)?;
        let level = self.next_level(ciphertext.level())?;
        let lifted = self.lift_plaintext(plaintext);
        let mut c0 = ciphertext.c0.clone();
        c0 *= &lifted;
        let mut c1 = ciphertext.c1.clone();
        c1 *= &lifted;
        let noise = self.noise_model().mul_plain(ciphertext.noise_bits());
        Ok(Ciphertext::new(c0, c1, level, noise))
    }

    /// Tensor product followed by relinearization of the `s^2` term.
    pub fn mul(
        &self,
        lhs: &Ciphertext,
        rhs: &Ciphertext,
        relin_key: &RelinearizationKey,
    ) -> BgvResult<Ciphertext> {
        self.check_operand(lhs)?;
        self.check_operand(rhs)?;
        let level = self.next_level(lhs.level().max(rhs.level()))?;

        // (c0 + c1 s)(d0 + d1 s) = c0 d0 + (c0 d1 + c1 d0) s + c1 d1 s^2
        let mut d0 = lhs.c0.clone();
        d0 *= &rhs.c0;
        let mut d1 = lhs.c0.clone();
        d1 *= &rhs.c1;
        let mut cross = lhs.c1.clone();
        cross *= &rhs.c0;
        d1 += &cross;
        let mut d2 = lhs.c1.clone();
        d2 *= &rhs.c1;

        let (k0, k1) = relin_key.0.apply(&d2.into_coeff_domain());
        d0 += &k0;
        d1 += &k1;

        let model = self.noise_model();
        let noise = model.add(
            model.mul(lhs.noise_bits(), rhs.noise_bits()),
            self.key_switch_bits(),
        );
        trace!(level, noise_bits = noise, "ciphertext product");
        Ok(Ciphertext::new(d0, d1, level, noise))
    }

    /// Rotates both slot rows left by `offset` (right when negative).
    pub fn rotate(
        &self,
        ciphertext: &Ciphertext,
        offset: i64,
        keys: &RotationKeys,
    ) -> BgvResult<Ciphertext> {
        self.check_operand(ciphertext)?;
        let element = self.galois_element(offset);
        if element == 1 {
            return Ok(ciphertext.clone());
        }
        let key = keys
            .get(element)
            .ok_or(BgvError::MissingRotationKey { offset })?;

        let c0 = ciphertext
            .c0
            .clone()
            .into_coeff_domain()
            .automorphism(element)
            .into_ntt_domain();
        let c1 = ciphertext.c1.clone().into_coeff_domain().automorphism(element);

        let (mut k0, k1) = key.apply(&c1);
        k0 += &c0;
        let noise = self
            .noise_model()
            .add(ciphertext.noise_bits(), self.key_switch_bits());
        Ok(Ciphertext::new(k0, k1, ciphertext.level(), noise))
    }

    fn next_level(&self, level: usize) -> BgvResult<usize> {
        let required = level + 1;
        if required > self.max_depth() {
            return Err(BgvError::DepthExhausted {
                required,
                max_depth: self.max_depth(),
            });
        }
        Ok(required)
    }
}
