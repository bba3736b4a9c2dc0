use super::{BackendError, HomomorphicBackend};
use crate::{
    Result,
    codec::PlaintextModulus,
    math::{add_mod, mul_mod, neg_mod, sub_mod},
};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedPlaintext(Vec<u64>);

impl SimulatedPlaintext {
    pub fn slots(&self) -> &[u64] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedCiphertext {
    slots: Vec<u64>,
    depth: usize,
}

impl SimulatedCiphertext {
    pub fn slots(&self) -> &[u64] {
        &self.slots
    }
}

/// Cleartext stand-in for an encrypted backend.
///
/// Holds slot vectors modulo `t` and enforces the same rules the real scheme
/// does: reduced inputs, a depth limit, and evaluation keys generated before
/// products and rotations.
#[derive(Debug, Clone)]
pub struct SlotSimulator {
    modulus: PlaintextModulus,
    slot_count: usize,
    max_depth: usize,
    relinearization_ready: bool,
    rotations: HashSet<i64>,
}

impl SlotSimulator {
    pub fn new(
        modulus: PlaintextModulus,
        slot_count: usize,
        max_depth: usize,
    ) -> std::result::Result<Self, BackendError> {
        if !slot_count.is_power_of_two() || slot_count < 2 {
            return Err(BackendError::InvalidSlotCount(slot_count));
        }
        Ok(Self {
            modulus,
            slot_count,
            max_depth,
            relinearization_ready: false,
            rotations: HashSet::new(),
        })
    }

    fn normalize_offset(&self, offset: i64) -> i64 {
        offset.rem_euclid(self.row_size() as i64)
    }

    fn next_depth(&self, depth: usize) -> std::result::Result<usize, BackendError> {
        let required = depth + 1;
        if required > self.max_depth {
            return Err(BackendError::DepthExhausted {
                required,
                max_depth: self.max_depth,
            });
        }
        Ok(required)
    }

    fn zip_with(
        &self,
        lhs: &[u64],
        rhs: &[u64],
        op: impl Fn(u64, u64, u64) -> u64,
    ) -> Vec<u64> {
        let t = self.modulus.value();
        lhs.iter().zip(rhs).map(|(&a, &b)| op(a, b, t)).collect()
    }
}

impl HomomorphicBackend for SlotSimulator {
    type Plaintext = SimulatedPlaintext;
    type Ciphertext = SimulatedCiphertext;

    fn slot_count(&self) -> usize {
        self.slot_count
    }

    fn max_depth(&self) -> usize {
        self.max_depth
    }

    fn plaintext_modulus(&self) -> PlaintextModulus {
        self.modulus
    }

    fn encode(&self, values: &[u64]) -> Result<SimulatedPlaintext> {
        if values.len() > self.slot_count {
            return Err(BackendError::TooManySlots {
                given: values.len(),
                slots: self.slot_count,
            }
            .into());
        }
        let t = self.modulus.value();
        if let Some(&value) = values.iter().find(|&&v| v >= t) {
            return Err(BackendError::ValueNotReduced { value, modulus: t }.into());
        }
        let mut slots = values.to_vec();
        slots.resize(self.slot_count, 0);
        Ok(SimulatedPlaintext(slots))
    }

    fn decode(&self, plaintext: &SimulatedPlaintext) -> Vec<u64> {
        plaintext.0.clone()
    }

    fn encrypt(&mut self, plaintext: &SimulatedPlaintext) -> Result<SimulatedCiphertext> {
        Ok(SimulatedCiphertext {
            slots: plaintext.0.clone(),
            depth: 0,
        })
    }

    fn decrypt(&self, ciphertext: &SimulatedCiphertext) -> Result<SimulatedPlaintext> {
        Ok(SimulatedPlaintext(ciphertext.slots.clone()))
    }

    fn add(&self, lhs: &SimulatedCiphertext, rhs: &SimulatedCiphertext) -> Result<SimulatedCiphertext> {
        Ok(SimulatedCiphertext {
            slots: self.zip_with(&lhs.slots, &rhs.slots, add_mod),
            depth: lhs.depth.max(rhs.depth),
        })
    }

    fn sub(&self, lhs: &SimulatedCiphertext, rhs: &SimulatedCiphertext) -> Result<SimulatedCiphertext> {
        Ok(SimulatedCiphertext {
            slots: self.zip_with(&lhs.slots, &rhs.slots, sub_mod),
            depth: lhs.depth.max(rhs.depth),
        })
    }

    fn negate(&self, ciphertext: &SimulatedCiphertext) -> Result<SimulatedCiphertext> {
        let t = self.modulus.value();
        Ok(SimulatedCiphertext {
            slots: ciphertext.slots.iter().map(|&v| neg_mod(v, t)).collect(),
            depth: ciphertext.depth,
        })
    }

    fn add_plain(
        &self,
        ciphertext: &SimulatedCiphertext,
        plaintext: &SimulatedPlaintext,
    ) -> Result<SimulatedCiphertext> {
        Ok(SimulatedCiphertext {
            slots: self.zip_with(&ciphertext.slots, &plaintext.0, add_mod),
            depth: ciphertext.depth,
        })
    }

    fn mul(&self, lhs: &SimulatedCiphertext, rhs: &SimulatedCiphertext) -> Result<SimulatedCiphertext> {
        if !self.relinearization_ready {
            return Err(BackendError::MissingRelinearizationKey.into());
        }
        let depth = self.next_depth(lhs.depth.max(rhs.depth))?;
        Ok(SimulatedCiphertext {
            slots: self.zip_with(&lhs.slots, &rhs.slots, mul_mod),
            depth,
        })
    }

    fn mul_plain(
        &self,
        ciphertext: &SimulatedCiphertext,
        plaintext: &SimulatedPlaintext,
    ) -> Result<SimulatedCiphertext> {
        let depth = self.next_depth(ciphertext.depth)?;
        Ok(SimulatedCiphertext {
            slots: self.zip_with(&ciphertext.slots, &plaintext.0, mul_mod),
            depth,
        })
    }

    fn rotate(&self, ciphertext: &SimulatedCiphertext, offset: i64) -> Result<SimulatedCiphertext> {
        let steps = self.normalize_offset(offset);
        if steps == 0 {
            return Ok(ciphertext.clone());
        }
        if !self.rotations.contains(&steps) {
            return Err(BackendError::MissingRotationKey { offset }.into());
        }
        let row = self.row_size();
        let steps = steps as usize;
        let slots = ciphertext
            .slots
            .chunks(row)
            .flat_map(|chunk| (0..row).map(move |j| chunk[(j + steps) % row]))
            .collect();
        Ok(SimulatedCiphertext {
            slots,
            depth: ciphertext.depth,
        })
    }

    fn depth(&self, ciphertext: &SimulatedCiphertext) -> usize {
        ciphertext.depth
    }

    fn generate_relinearization_key(&mut self) -> Result<()> {
        self.relinearization_ready = true;
        Ok(())
    }

    fn generate_rotation_keys(&mut self, offsets: &[i64]) -> Result<()> {
        for &offset in offsets {
            let steps = self.normalize_offset(offset);
            if steps != 0 {
                self.rotations.insert(steps);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    const T: u64 = 65537;

    fn simulator(depth: usize) -> SlotSimulator {
        SlotSimulator::new(PlaintextModulus::new(T).unwrap(), 8, depth).unwrap()
    }

    #[test]
    fn rejects_odd_slot_counts() {
        assert_eq!(
            SlotSimulator::new(PlaintextModulus::new(T).unwrap(), 6, 1).unwrap_err(),
            BackendError::InvalidSlotCount(6)
        );
    }

    #[test]
    fn arithmetic_wraps_modulo_t() {
        let mut sim = simulator(1);
        sim.generate_relinearization_key().unwrap();
        let a = sim.encrypt_values(&[T - 1, 2, 3]).unwrap();
        let b = sim.encrypt_values(&[2, 2, 2]).unwrap();
        assert_eq!(sim.decrypt_values(&sim.add(&a, &b).unwrap()).unwrap()[..3], [1, 4, 5]);
        assert_eq!(sim.decrypt_values(&sim.sub(&b, &a).unwrap()).unwrap()[..3], [3, 0, T - 1]);
        let product = sim.mul(&a, &b).unwrap();
        assert_eq!(sim.depth(&product), 1);
        assert_eq!(sim.decrypt_values(&product).unwrap()[..3], [T - 2, 4, 6]);
    }

    #[test]
    fn rotation_is_per_row() {
        let mut sim = simulator(0);
        sim.generate_rotation_keys(&[1, -1]).unwrap();
        let ct = sim.encrypt_values(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        let left = sim.decrypt_values(&sim.rotate(&ct, 1).unwrap()).unwrap();
        assert_eq!(left, vec![2, 3, 4, 1, 6, 7, 8, 5]);
        let right = sim.decrypt_values(&sim.rotate(&ct, -1).unwrap()).unwrap();
        assert_eq!(right, vec![4, 1, 2, 3, 8, 5, 6, 7]);
    }

    #[test]
    fn keys_and_depth_are_enforced() {
        let mut sim = simulator(1);
        let ct = sim.encrypt_values(&[1]).unwrap();
        assert_eq!(
            sim.mul(&ct, &ct).unwrap_err(),
            Error::Backend(BackendError::MissingRelinearizationKey)
        );
        assert_eq!(
            sim.rotate(&ct, 2).unwrap_err(),
            Error::Backend(BackendError::MissingRotationKey { offset: 2 })
        );
        let one = sim.encode_constant(1).unwrap();
        let once = sim.mul_plain(&ct, &one).unwrap();
        assert_eq!(
            sim.mul_plain(&once, &one).unwrap_err(),
            Error::Backend(BackendError::DepthExhausted {
                required: 2,
                max_depth: 1
            })
        );
    }

    #[test]
    fn encode_validates_input() {
        let sim = simulator(1);
        assert_eq!(
            sim.encode(&[T]).unwrap_err(),
            Error::Backend(BackendError::ValueNotReduced {
                value: T,
                modulus: T
            })
        );
        assert!(sim.encode(&[0; 9]).is_err());
    }
}
