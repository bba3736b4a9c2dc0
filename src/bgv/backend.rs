use super::{
    ciphertext::{Ciphertext, Plaintext},
    context::BgvContext,
    errors::{BgvError, BgvResult},
    keys::{PublicKey, RelinearizationKey, RotationKeys, SecretKey},
    params::BgvParams,
};
use crate::{Result, backend::HomomorphicBackend, codec::PlaintextModulus};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use tracing::instrument;

/// A [`BgvContext`] bundled with its keys and randomness.
///
/// The secret key never leaves the backend; evaluation keys are generated on
/// request and reused across calls.
#[derive(Debug, Clone)]
pub struct BgvBackend {
    context: BgvContext,
    secret_key: SecretKey,
    public_key: PublicKey,
    relin_key: Option<RelinearizationKey>,
    rotation_keys: RotationKeys,
    rng: ChaCha20Rng,
}

impl BgvBackend {
    /// Builds the context and a fresh key pair. A seed in `params` makes
    /// every key and ciphertext reproducible.
    #[instrument(skip_all)]
    pub fn create(params: BgvParams) -> BgvResult<Self> {
        let seed = params.seed().unwrap_or_else(rand::random);
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let context = BgvContext::create(params)?;
        let (secret_key, public_key) = context.generate_key_pair(&mut rng);
        Ok(Self {
            context,
            secret_key,
            public_key,
            relin_key: None,
            rotation_keys: RotationKeys::new(),
            rng,
        })
    }

    pub fn context(&self) -> &BgvContext {
        &self.context
    }

    pub fn secret_key(&self) -> &SecretKey {
        &self.secret_key
    }

    pub fn rotation_keys(&self) -> &RotationKeys {
        &self.rotation_keys
    }

    /// Exact noise of `ciphertext`, in bits.
    pub fn noise_bits(&self, ciphertext: &Ciphertext) -> BgvResult<u32> {
        self.context.measure_noise_bits(ciphertext, &self.secret_key)
    }
}

impl HomomorphicBackend for BgvBackend {
    type Plaintext = Plaintext;
    type Ciphertext = Ciphertext;

    fn slot_count(&self) -> usize {
        self.context.slot_count()
    }

    fn row_size(&self) -> usize {
        self.context.row_size()
    }

    fn max_depth(&self) -> usize {
        self.context.max_depth()
    }

    fn plaintext_modulus(&self) -> PlaintextModulus {
        self.context.params().plaintext_modulus()
    }

    fn encode(&self, values: &[u64]) -> Result<Plaintext> {
        Ok(self.context.encode(values)?)
    }

    fn decode(&self, plaintext: &Plaintext) -> Vec<u64> {
        self.context.decode(plaintext)
    }

    fn encrypt(&mut self, plaintext: &Plaintext) -> Result<Ciphertext> {
        Ok(self
            .context
            .encrypt(plaintext, &self.public_key, &mut self.rng)?)
    }

    fn decrypt(&self, ciphertext: &Ciphertext) -> Result<Plaintext> {
        Ok(self.context.decrypt(ciphertext, &self.secret_key)?)
    }

    fn add(&self, lhs: &Ciphertext, rhs: &Ciphertext) -> Result<Ciphertext> {
        Ok(self.context.add(lhs, rhs)?)
    }

    fn sub(&self, lhs: &Ciphertext, rhs: &Ciphertext) -> Result<Ciphertext> {
        Ok(self.context.sub(lhs, rhs)?)
    }

    fn negate(&self, ciphertext: &Ciphertext) -> Result<Ciphertext> {
        Ok(self.context.negate(ciphertext)?)
    }

    fn add_plain(&self, ciphertext: &Ciphertext, plaintext: &Plaintext) -> Result<Ciphertext> {
        Ok(self.context.add_plain(ciphertext, plaintext)?)
    }

    fn mul(&self, lhs: &Ciphertext, rhs: &Ciphertext) -> Result<Ciphertext> {
        let relin_key = self
            .relin_key
            .as_ref()
            .ok_or(BgvError::MissingRelinearizationKey)?;
        Ok(self.context.mul(lhs, rhs, relin_key)?)
    }

    fn mul_plain(&self, ciphertext: &Ciphertext, plaintext: &Plaintext) -> Result<Ciphertext> {
        Ok(self.context.mul_plain(ciphertext, plaintext)?)
    }

    fn rotate(&self, ciphertext: &Ciphertext, offset: i64) -> Result<Ciphertext> {
        Ok(self
            .context
            .rotate(ciphertext, offset, &self.rotation_keys)?)
    }

    fn depth(&self, ciphertext: &Ciphertext) -> usize {
        ciphertext.level()
    }

    fn generate_relinearization_key(&mut self) -> Result<()> {
        if self.relin_key.is_none() {
            let key = self
                .context
                .generate_relinearization_key(&self.secret_key, &mut self.rng);
            self.relin_key = Some(key);
        }
        Ok(())
    }

    fn generate_rotation_keys(&mut self, offsets: &[i64]) -> Result<()> {
        self.context.generate_rotation_keys(
            &self.secret_key,
            offsets,
            &mut self.rotation_keys,
            &mut self.rng,
        );
        Ok(())
    }
}
