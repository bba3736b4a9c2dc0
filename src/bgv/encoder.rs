use super::errors::{BgvError, BgvResult};
use crate::{
    codec::PlaintextModulus,
    math::{mod_inverse, mod_pow, mul_mod, primitive_power_of_two_root},
};

/// Galois element generating slot rotations.
const ROTATION_GENERATOR: u64 = 5;

/// Packs `N` values modulo `t` into one plaintext polynomial.
///
/// Slots form two rows of `N/2`. Slot `j` of row 0 is the evaluation at
/// `psi^(5^j)` and slot `j` of row 1 at `psi^(-5^j)`, where `psi` is a
/// primitive `2N`-th root of unity modulo `t`. With this layout the
/// automorphism `X -> X^(5^k)` rotates both rows left by `k`.
#[derive(Debug, Clone)]
pub struct SlotEncoder {
    modulus: PlaintextModulus,
    degree: usize,
    // psi^j for j < 2N
    psi_powers: Vec<u64>,
    // odd exponent e_i of slot i
    slot_exponents: Vec<usize>,
    degree_inverse: u64,
}

impl SlotEncoder {
    pub fn new(modulus: PlaintextModulus, degree: usize) -> BgvResult<Self> {
        let t = modulus.value();
        let not_friendly = BgvError::NotBatchFriendly {
            modulus: t,
            ring_degree: degree,
        };
        if !degree.is_power_of_two() || degree < 2 {
            return Err(BgvError::InvalidRingDimension(degree));
        }
        let two_n = 2 * degree;
        let psi = primitive_power_of_two_root(two_n as u64, t).ok_or_else(|| not_friendly.clone())?;
        let degree_inverse = mod_inverse(degree as u64, t).ok_or(not_friendly)?;

        let mut psi_powers = Vec::with_capacity(two_n);
        let mut power = 1u64;
        for _ in 0..two_n {
            psi_powers.push(power);
            power = mul_mod(power, psi, t);
        }

        let row = degree / 2;
        let mut slot_exponents = vec![0usize; degree];
        let mut exponent = 1usize;
        for j in 0..row {
            slot_exponents[j] = exponent;
            slot_exponents[row + j] = two_n - exponent;
            exponent = exponent * ROTATION_GENERATOR as usize % two_n;
        }

        Ok(Self {
            modulus,
            degree,
            psi_powers,
            slot_exponents,
            degree_inverse,
        })
    }

    pub fn slot_count(&self) -> usize {
        self.degree
    }

    pub fn row_size(&self) -> usize {
        self.degree / 2
    }

    pub fn modulus(&self) -> PlaintextModulus {
        self.modulus
    }

    /// Interpolates slot values into polynomial coefficients modulo `t`.
    ///
    /// Missing trailing slots are zero. Values must already be reduced.
    pub fn encode(&self, values: &[u64]) -> BgvResult<Vec<u64>> {
        let t = self.modulus.value();
        if values.len() > self.degree {
            return Err(BgvError::TooManySlots {
                given: values.len(),
                slots: self.degree,
            });
        }
        if let Some(&value) = values.iter().find(|&&v| v >= t) {
            return Err(BgvError::ValueNotReduced { value, modulus: t });
        }

        let two_n = 2 * self.degree;
        let coeffs = (0..self.degree)
            .map(|k| {
                // c_k = N^-1 * sum_i v_i * psi^(-e_i * k)
                let sum = values
                    .iter()
                    .zip(&self.slot_exponents)
                    .fold(0u128, |acc, (&value, &exponent)| {
                        let index = (two_n - exponent * k % two_n) % two_n;
                        (acc + value as u128 * self.psi_powers[index] as u128) % t as u128
                    });
                mul_mod(sum as u64, self.degree_inverse, t)
            })
            .collect();
        Ok(coeffs)
    }

    /// Evaluates polynomial coefficients at every slot point.
    pub fn decode(&self, coeffs: &[u64]) -> Vec<u64> {
        let t = self.modulus.value() as u128;
        let two_n = 2 * self.degree;
        self.slot_exponents
            .iter()
            .map(|&exponent| {
                coeffs.iter().enumerate().fold(0u128, |acc, (k, &coeff)| {
                    let index = exponent * k % two_n;
                    (acc + coeff as u128 * self.psi_powers[index] as u128) % t
                }) as u64
            })
            .collect()
    }
}

/// Galois element for rotating rows of a degree-`degree` ring left by
/// `offset` slots. Negative offsets rotate right.
pub fn rotation_galois_element(offset: i64, degree: usize) -> u64 {
    let row = (degree / 2) as i64;
    let steps = offset.rem_euclid(row) as u64;
    mod_pow(ROTATION_GENERATOR, steps, 2 * degree as u64)
}
