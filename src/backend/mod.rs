//! The seam between circuits and the encryption scheme.
//!
//! Circuits are written once against [`HomomorphicBackend`] and run either on
//! real BGV ciphertexts ([`crate::bgv::BgvBackend`]) or on the cleartext
//! [`SlotSimulator`], which applies the same slot layout, rotation rule and
//! depth accounting modulo `t`.

mod simulator;

pub use simulator::{SimulatedCiphertext, SimulatedPlaintext, SlotSimulator};

use crate::{Result, codec::PlaintextModulus};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("slot count must be an even power of two, got {0}")]
    InvalidSlotCount(usize),
    #[error("{given} values exceed the {slots} available slots")]
    TooManySlots { given: usize, slots: usize },
    #[error("slot value {value} is not reduced modulo {modulus}")]
    ValueNotReduced { value: u64, modulus: u64 },
    #[error("multiplicative depth exhausted: level {required} exceeds maximum {max_depth}")]
    DepthExhausted { required: usize, max_depth: usize },
    #[error("no relinearization key has been generated")]
    MissingRelinearizationKey,
    #[error("no rotation key for offset {offset}")]
    MissingRotationKey { offset: i64 },
}

/// Packed homomorphic arithmetic modulo a plaintext modulus `t`.
///
/// Slots are laid out in two rows of [`row_size`](Self::row_size); a
/// rotation by `k` moves every row left by `k` (right for negative `k`).
/// Multiplications by ciphertexts or plaintexts consume one level each.
pub trait HomomorphicBackend {
    type Plaintext: Clone + fmt::Debug;
    type Ciphertext: Clone + fmt::Debug;

    fn slot_count(&self) -> usize;

    fn row_size(&self) -> usize {
        self.slot_count() / 2
    }

    fn max_depth(&self) -> usize;

    fn plaintext_modulus(&self) -> PlaintextModulus;

    /// Packs reduced values (`< t`) into slots; missing slots are zero.
    fn encode(&self, values: &[u64]) -> Result<Self::Plaintext>;

    fn decode(&self, plaintext: &Self::Plaintext) -> Vec<u64>;

    fn encrypt(&mut self, plaintext: &Self::Plaintext) -> Result<Self::Ciphertext>;

    fn decrypt(&self, ciphertext: &Self::Ciphertext) -> Result<Self::Plaintext>;

    fn add(&self, lhs: &Self::Ciphertext, rhs: &Self::Ciphertext) -> Result<Self::Ciphertext>;

    fn sub(&self, lhs: &Self::Ciphertext, rhs: &Self::Ciphertext) -> Result<Self::Ciphertext>;

    fn negate(&self, ciphertext: &Self::Ciphertext) -> Result<Self::Ciphertext>;

    fn add_plain(
        &self,
        ciphertext: &Self::Ciphertext,
        plaintext: &Self::Plaintext,
    ) -> Result<Self::Ciphertext>;

    fn mul(&self, lhs: &Self::Ciphertext, rhs: &Self::Ciphertext) -> Result<Self::Ciphertext>;

    fn mul_plain(
        &self,
        ciphertext: &Self::Ciphertext,
        plaintext: &Self::Plaintext,
    ) -> Result<Self::Ciphertext>;

    fn rotate(&self, ciphertext: &Self::Ciphertext, offset: i64) -> Result<Self::Ciphertext>;

    /// Levels consumed by `ciphertext`.
    fn depth(&self, ciphertext: &Self::Ciphertext) -> usize;

    fn generate_relinearization_key(&mut self) -> Result<()>;

    fn generate_rotation_keys(&mut self, offsets: &[i64]) -> Result<()>;

    fn encrypt_values(&mut self, values: &[u64]) -> Result<Self::Ciphertext> {
        let plaintext = self.encode(values)?;
        self.encrypt(&plaintext)
    }

    fn decrypt_values(&self, ciphertext: &Self::Ciphertext) -> Result<Vec<u64>> {
        Ok(self.decode(&self.decrypt(ciphertext)?))
    }

    /// Plaintext holding `value` in every slot.
    fn encode_constant(&self, value: u64) -> Result<Self::Plaintext> {
        self.encode(&vec![value; self.slot_count()])
    }
}
