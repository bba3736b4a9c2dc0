use super::{
    ciphertext::{Ciphertext, Plaintext},
    encoder::{SlotEncoder, rotation_galois_element},
    errors::{BgvError, BgvResult},
    keys::{PublicKey, RelinearizationKey, RotationKeys, SecretKey},
    noise::NoiseModel,
    params::BgvParams,
    poly::RnsPoly,
    rns::{PlaintextReducer, RnsBasis},
};
use crate::math::ntt_prime_chain;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Remaining budget below which decryption logs a warning.
const LOW_BUDGET_WARNING_BITS: f64 = 8.0;

/// Shared state of one BGV instance: parameters, the sized RNS basis, the
/// slot encoder and the noise model.
#[derive(Debug, Clone)]
pub struct BgvContext {
    params: BgvParams,
    basis: Arc<RnsBasis>,
    encoder: SlotEncoder,
    reducer: PlaintextReducer,
    noise: NoiseModel,
    key_switch_bits: f64,
}

impl BgvContext {
    /// Sizes the ciphertext modulus for `params.depth()` and builds the
    /// context.
    ///
    /// Fails with [`BgvError::InsecureParameters`] when the requested
    /// security level caps `log2 Q` below what the depth needs.
    #[instrument(skip_all, fields(ring_degree = params.ring_degree(), depth = params.depth()))]
    pub fn create(params: BgvParams) -> BgvResult<Self> {
        let degree = params.ring_degree();
        let t = params.plaintext_modulus().value();
        let noise = NoiseModel::new(&params);

        let too_deep = || BgvError::InvalidParameter {
            message: format!(
                "depth {} needs more {}-bit primes than the toy backend supports",
                params.depth(),
                params.prime_bits()
            ),
        };
        let channels = noise
            .channels_for_depth(params.depth(), params.prime_bits())
            .ok_or_else(too_deep)?;
        let moduli =
            ntt_prime_chain(channels, params.prime_bits(), degree as u64, &[t]).ok_or_else(too_deep)?;
        let basis = Arc::new(RnsBasis::new(degree, moduli)?);

        let modulus_bits = basis.modulus_bits();
        if let Some(max_bits) = params.security().max_modulus_bits(degree) {
            let bits = modulus_bits.ceil() as u32;
            if bits > max_bits {
                return Err(BgvError::InsecureParameters {
                    ring_degree: degree,
                    modulus_bits: bits,
                    max_bits,
                });
            }
        }

        let encoder = SlotEncoder::new(params.plaintext_modulus(), degree)?;
        let reducer = basis.plaintext_reducer(t);
        let key_switch_bits = noise.key_switch(channels, (basis.max_modulus() as f64).log2());

        info!(
            channels,
            modulus_bits,
            plaintext_modulus = t,
            security = %params.security(),
            "created BGV context"
        );

        Ok(Self {
            params,
            basis,
            encoder,
            reducer,
            noise,
            key_switch_bits,
        })
    }

    pub fn params(&self) -> &BgvParams {
        &self.params
    }

    pub fn basis(&self) -> &Arc<RnsBasis> {
        &self.basis
    }

    pub fn slot_count(&self) -> usize {
        self.encoder.slot_count()
    }

    pub fn row_size(&self) -> usize {
        self.encoder.row_size()
    }

    pub fn max_depth(&self) -> usize {
        self.params.depth()
    }

    pub fn modulus_bits(&self) -> f64 {
        self.basis.modulus_bits()
    }

    /// Decryption succeeds while the noise stays below `Q/2`.
    pub fn noise_budget_bits(&self) -> f64 {
        self.modulus_bits() - 1.0
    }

    pub fn noise_model(&self) -> &NoiseModel {
        &self.noise
    }

    pub(crate) fn key_switch_bits(&self) -> f64 {
        self.key_switch_bits
    }

    /// Estimated bits left before `ciphertext` stops decrypting.
    pub fn remaining_budget(&self, ciphertext: &Ciphertext) -> f64 {
        self.noise_budget_bits() - ciphertext.noise_bits()
    }

    // ─── Encoding ────────────────────────────────────────────────────────────

    pub fn encode(&self, values: &[u64]) -> BgvResult<Plaintext> {
        Ok(Plaintext::new(self.encoder.encode(values)?))
    }

    pub fn decode(&self, plaintext: &Plaintext) -> Vec<u64> {
        self.encoder.decode(plaintext.coeffs())
    }

    /// Lifts a plaintext into `R_Q` (centered coefficients), NTT domain.
    pub(crate) fn lift_plaintext(&self, plaintext: &Plaintext) -> RnsPoly {
        let modulus = self.params.plaintext_modulus();
        let centered: Vec<i64> = plaintext
            .coeffs()
            .iter()
            .map(|&c| modulus.center(c) as i64)
            .collect();
        RnsPoly::from_signed(&centered, self.basis.clone()).into_ntt_domain()
    }

    // ─── Keys ────────────────────────────────────────────────────────────────

    #[instrument(skip_all)]
    pub fn generate_key_pair<R: Rng + ?Sized>(&self, rng: &mut R) -> (SecretKey, PublicKey) {
        let secret_key = SecretKey::generate(self.params.hamming_weight(), &self.basis, rng);
        let public_key = PublicKey::generate(
            &secret_key,
            self.params.plaintext_modulus().value(),
            self.params.error_std_dev(),
            rng,
        );
        debug!(hamming_weight = secret_key.hamming_weight(), "generated key pair");
        (secret_key, public_key)
    }

    #[instrument(skip_all)]
    pub fn generate_relinearization_key<R: Rng + ?Sized>(
        &self,
        secret_key: &SecretKey,
        rng: &mut R,
    ) -> RelinearizationKey {
        RelinearizationKey::generate(
            secret_key,
            self.params.plaintext_modulus().value(),
            self.params.error_std_dev(),
            rng,
        )
    }

    /// Adds Galois keys for every offset in `offsets` to `keys`.
    ///
    /// Offsets are reduced modulo the row size; zero needs no key.
    #[instrument(skip_all, fields(offsets = ?offsets))]
    pub fn generate_rotation_keys<R: Rng + ?Sized>(
        &self,
        secret_key: &SecretKey,
        offsets: &[i64],
        keys: &mut RotationKeys,
        rng: &mut R,
    ) {
        for &offset in offsets {
            let element = self.galois_element(offset);
            if element == 1 {
                continue;
            }
            keys.insert_generated(
                secret_key,
                element,
                self.params.plaintext_modulus().value(),
                self.params.error_std_dev(),
                rng,
            );
        }
        debug!(key_count = keys.len(), "rotation keys ready");
    }

    pub fn galois_element(&self, offset: i64) -> u64 {
        rotation_galois_element(offset, self.params.ring_degree())
    }

    // ─── Encryption ──────────────────────────────────────────────────────────

    /// `c0 = b*u + t*e1 + m`, `c1 = a*u + t*e2`.
    pub fn encrypt<R: Rng + ?Sized>(
        &self,
        plaintext: &Plaintext,
        public_key: &PublicKey,
        rng: &mut R,
    ) -> BgvResult<Ciphertext> {
        if !Arc::ptr_eq(public_key.a.basis(), &self.basis) {
            return Err(BgvError::ContextMismatch);
        }
        let t = self.params.plaintext_modulus().value() as i128;
        let std_dev = self.params.error_std_dev();

        let u = RnsPoly::sample_uniform_ternary(self.basis.clone(), rng).into_ntt_domain();
        let mut e1 = RnsPoly::sample_gaussian(std_dev, self.basis.clone(), rng);
        e1.scalar_mul(t);
        let mut e2 = RnsPoly::sample_gaussian(std_dev, self.basis.clone(), rng);
        e2.scalar_mul(t);

        let mut c0 = public_key.b.clone();
        c0 *= &u;
        c0 += &e1.into_ntt_domain();
        c0 += &self.lift_plaintext(plaintext);

        let mut c1 = public_key.a.clone();
        c1 *= &u;
        c1 += &e2.into_ntt_domain();

        Ok(Ciphertext::new(c0, c1, 0, self.noise.fresh()))
    }

    /// Computes `[[c0 + c1*s]_Q]_t`.
    ///
    /// Fails with [`BgvError::NoiseBudgetExhausted`] when the tracked noise
    /// bound no longer guarantees a correct result.
    pub fn decrypt(&self, ciphertext: &Ciphertext, secret_key: &SecretKey) -> BgvResult<Plaintext> {
        self.check_operand(ciphertext)?;
        let budget_bits = self.noise_budget_bits();
        if ciphertext.noise_bits() >= budget_bits {
            return Err(BgvError::NoiseBudgetExhausted {
                noise_bits: ciphertext.noise_bits(),
                budget_bits,
            });
        }
        let remaining = budget_bits - ciphertext.noise_bits();
        if remaining < LOW_BUDGET_WARNING_BITS {
            warn!(remaining_bits = remaining, "noise budget nearly exhausted");
        }

        let phase = self.phase(ciphertext, secret_key);
        Ok(Plaintext::new(self.reducer.reduce(&self.basis, phase.channels())))
    }

    /// Exact bit length of the largest coefficient of `c0 + c1*s mod Q`.
    pub fn measure_noise_bits(&self, ciphertext: &Ciphertext, secret_key: &SecretKey) -> BgvResult<u32> {
        self.check_operand(ciphertext)?;
        let phase = self.phase(ciphertext, secret_key);
        Ok(phase.max_centered_bits()?)
    }

    pub(crate) fn check_operand(&self, ciphertext: &Ciphertext) -> BgvResult<()> {
        if Arc::ptr_eq(ciphertext.c0.basis(), &self.basis) {
            Ok(())
        } else {
            Err(BgvError::ContextMismatch)
        }
    }

    fn phase(&self, ciphertext: &Ciphertext, secret_key: &SecretKey) -> RnsPoly {
        let mut phase = ciphertext.c1.clone();
        phase *= &secret_key.poly;
        phase += &ciphertext.c0;
        phase.into_coeff_domain()
    }
}
