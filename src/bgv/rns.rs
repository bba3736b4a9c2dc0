use super::errors::{RnsError, RnsResult};
use crate::math::{
    add_mod, is_ntt_friendly_prime, mod_inverse, mul_mod, primitive_power_of_two_root, sub_mod,
};
use crypto_bigint::U8192;

/// Width used for exact CRT reconstruction in noise measurement.
type WideUint = U8192;

/// Largest ciphertext modulus (in bits) [`RnsBasis::centered_magnitude_bits`]
/// can reconstruct without overflowing [`WideUint`].
pub const RECONSTRUCTION_LIMIT_BITS: u32 = 8000;

/// Precomputed tables for the negacyclic NTT modulo one prime.
///
/// The forward transform twists by `psi^i`, where `psi` is a primitive
/// `2N`-th root of unity, then runs a cyclic Cooley-Tukey transform with
/// `omega = psi^2`. Pointwise products in this domain are products in
/// `Z_q[X] / (X^N + 1)`.
#[derive(Debug, Clone)]
pub struct NttTable {
    modulus: u64,
    degree: usize,
    twist: Vec<u64>,
    // psi^-i * N^-1, so the inverse transform needs a single pass.
    untwist: Vec<u64>,
    roots: Vec<u64>,
    inverse_roots: Vec<u64>,
}

impl NttTable {
    pub fn new(modulus: u64, degree: usize) -> RnsResult<Self> {
        if !degree.is_power_of_two() || degree < 2 {
            return Err(RnsError::InvalidDegree { degree });
        }
        let not_friendly = RnsError::NonNttFriendlyModulus { modulus, degree };
        if !is_ntt_friendly_prime(modulus, degree as u64) {
            return Err(not_friendly);
        }

        let psi = primitive_power_of_two_root(2 * degree as u64, modulus)
            .ok_or_else(|| not_friendly.clone())?;
        let psi_inverse = mod_inverse(psi, modulus).ok_or_else(|| not_friendly.clone())?;
        let n_inverse = mod_inverse(degree as u64, modulus).ok_or(not_friendly)?;

        let omega = mul_mod(psi, psi, modulus);
        let omega_inverse = mul_mod(psi_inverse, psi_inverse, modulus);

        let untwist = powers(psi_inverse, degree, modulus)
            .into_iter()
            .map(|power| mul_mod(power, n_inverse, modulus))
            .collect();

        Ok(Self {
            modulus,
            degree,
            twist: powers(psi, degree, modulus),
            untwist,
            roots: powers(omega, degree / 2, modulus),
            inverse_roots: powers(omega_inverse, degree / 2, modulus),
        })
    }

    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn forward(&self, values: &mut [u64]) {
        debug_assert_eq!(values.len(), self.degree, "forward: length mismatch");
        for (value, &factor) in values.iter_mut().zip(&self.twist) {
            *value = mul_mod(*value, factor, self.modulus);
        }
        cyclic_transform(values, &self.roots, self.modulus);
    }

    pub fn inverse(&self, values: &mut [u64]) {
        debug_assert_eq!(values.len(), self.degree, "inverse: length mismatch");
        cyclic_transform(values, &self.inverse_roots, self.modulus);
        for (value, &factor) in values.iter_mut().zip(&self.untwist) {
            *value = mul_mod(*value, factor, self.modulus);
        }
    }
}

/// RNS basis: distinct NTT-friendly primes `q_0, …, q_{L-1}` with their NTT
/// tables and the CRT constants `[(Q / q_j)^-1]_{q_j}`.
///
/// Invariant: `moduli.len() == ntt_tables.len() == punctured_inverses.len()`
/// and `ntt_tables[i].modulus() == moduli[i]`.
#[derive(Debug, Clone)]
pub struct RnsBasis {
    degree: usize,
    moduli: Vec<u64>,
    ntt_tables: Vec<NttTable>,
    punctured_inverses: Vec<u64>,
}

impl RnsBasis {
    pub fn new(degree: usize, moduli: Vec<u64>) -> RnsResult<Self> {
        if moduli.is_empty() {
            return Err(RnsError::EmptyBasis);
        }
        for (index, &modulus) in moduli.iter().enumerate() {
            if moduli[..index].contains(&modulus) {
                return Err(RnsError::DuplicateModulus { modulus });
            }
        }

        let ntt_tables = moduli
            .iter()
            .map(|&modulus| NttTable::new(modulus, degree))
            .collect::<RnsResult<Vec<_>>>()?;

        let mut punctured_inverses = Vec::with_capacity(moduli.len());
        for (j, &modulus) in moduli.iter().enumerate() {
            let punctured = punctured_product_mod(&moduli, j, modulus);
            // Distinct primes are coprime, so the inverse exists.
            let inverse = mod_inverse(punctured, modulus)
                .ok_or(RnsError::DuplicateModulus { modulus })?;
            punctured_inverses.push(inverse);
        }

        Ok(Self {
            degree,
            moduli,
            ntt_tables,
            punctured_inverses,
        })
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn moduli(&self) -> &[u64] {
        &self.moduli
    }

    pub fn ntt_table(&self, channel: usize) -> &NttTable {
        &self.ntt_tables[channel]
    }

    pub fn channel_count(&self) -> usize {
        self.moduli.len()
    }

    pub fn max_modulus(&self) -> u64 {
        self.moduli.iter().copied().max().unwrap_or(0)
    }

    /// `log2(Q)` for `Q = q_0 * … * q_{L-1}`.
    pub fn modulus_bits(&self) -> f64 {
        self.moduli.iter().map(|&q| (q as f64).log2()).sum()
    }

    /// `(Q / q_j) mod q_j`.
    pub fn punctured_residue(&self, channel: usize) -> u64 {
        punctured_product_mod(&self.moduli, channel, self.moduli[channel])
    }

    /// CRT digit of channel `j`: `[x_j * (Q / q_j)^-1]_{q_j}`.
    ///
    /// Satisfies `x = sum_j digit_j * (Q / q_j) (mod Q)`.
    #[inline]
    pub fn crt_digit(&self, channel: usize, residue: u64) -> u64 {
        mul_mod(
            residue,
            self.punctured_inverses[channel],
            self.moduli[channel],
        )
    }

    /// Returns `round(sum_j digit_j / q_j)`, the multiple of `Q` to subtract
    /// from `sum_j digit_j * (Q / q_j)` to land in `(-Q/2, Q/2]`.
    fn crt_quotient(&self, digits: &[u64]) -> u64 {
        digits
            .iter()
            .zip(&self.moduli)
            .map(|(&digit, &q)| digit as f64 / q as f64)
            .sum::<f64>()
            .round() as u64
    }

    /// Precomputes the constants that map centered CRT values to `Z_t`.
    pub fn plaintext_reducer(&self, plaintext_modulus: u64) -> PlaintextReducer {
        let punctured_mod_t = (0..self.channel_count())
            .map(|j| punctured_product_mod(&self.moduli, j, plaintext_modulus))
            .collect();
        let modulus_mod_t = self
            .moduli
            .iter()
            .fold(1 % plaintext_modulus, |acc, &q| {
                mul_mod(acc, q % plaintext_modulus, plaintext_modulus)
            });
        PlaintextReducer {
            plaintext_modulus,
            punctured_mod_t,
            modulus_mod_t,
        }
    }

    /// Largest bit length of the centered lift of any coefficient.
    ///
    /// `channels` must be in coefficient domain. Reconstruction is exact up
    /// to the rounding of the CRT quotient, which only matters for values
    /// within a hair of `Q/2`.
    pub fn centered_magnitude_bits(&self, channels: &[Vec<u64>]) -> RnsResult<u32> {
        if channels.len() != self.channel_count() {
            return Err(RnsError::ChannelCountMismatch {
                expected: self.channel_count(),
                actual: channels.len(),
            });
        }
        let bits = self.modulus_bits().ceil() as u32;
        if bits > RECONSTRUCTION_LIMIT_BITS {
            return Err(RnsError::ModulusTooLarge {
                bits,
                limit: RECONSTRUCTION_LIMIT_BITS,
            });
        }

        let modulus = self
            .moduli
            .iter()
            .fold(WideUint::ONE, |acc, &q| acc.wrapping_mul(&WideUint::from_u64(q)));
        let punctured: Vec<WideUint> = (0..self.channel_count())
            .map(|j| {
                self.moduli
                    .iter()
                    .enumerate()
                    .filter(|&(i, _)| i != j)
                    .fold(WideUint::ONE, |acc, (_, &q)| {
                        acc.wrapping_mul(&WideUint::from_u64(q))
                    })
            })
            .collect();

        let mut digits = vec![0u64; self.channel_count()];
        let mut max_bits = 0u32;
        for index in 0..self.degree {
            let mut sum = WideUint::ZERO;
            for (j, channel) in channels.iter().enumerate() {
                digits[j] = self.crt_digit(j, channel[index]);
                sum = sum.wrapping_add(&punctured[j].wrapping_mul(&WideUint::from_u64(digits[j])));
            }
            let offset = modulus.wrapping_mul(&WideUint::from_u64(self.crt_quotient(&digits)));
            let magnitude = if sum >= offset {
                sum.wrapping_sub(&offset)
            } else {
                offset.wrapping_sub(&sum)
            };
            max_bits = max_bits.max(magnitude.bits());
        }
        Ok(max_bits)
    }
}

/// Maps RNS residues of `x` to `[x]_Q mod t`, with `[x]_Q` centered.
///
/// Uses `x = sum_j y_j * (Q/q_j) - v * Q`, reduced modulo `t` term by term,
/// so no multi-word arithmetic is needed.
#[derive(Debug, Clone)]
pub struct PlaintextReducer {
    plaintext_modulus: u64,
    punctured_mod_t: Vec<u64>,
    modulus_mod_t: u64,
}

impl PlaintextReducer {
    pub fn reduce(&self, basis: &RnsBasis, channels: &[Vec<u64>]) -> Vec<u64> {
        let t = self.plaintext_modulus;
        let mut digits = vec![0u64; basis.channel_count()];
        (0..basis.degree())
            .map(|index| {
                let mut acc = 0u64;
                for (j, channel) in channels.iter().enumerate() {
                    digits[j] = basis.crt_digit(j, channel[index]);
                    acc = add_mod(acc, mul_mod(digits[j], self.punctured_mod_t[j], t), t);
                }
                let quotient = basis.crt_quotient(&digits) % t;
                sub_mod(acc, mul_mod(quotient, self.modulus_mod_t, t), t)
            })
            .collect()
    }
}

// ─── Private helpers ─────────────────────────────────────────────────────────

fn punctured_product_mod(moduli: &[u64], skip: usize, modulus: u64) -> u64 {
    moduli
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != skip)
        .fold(1 % modulus, |acc, (_, &q)| mul_mod(acc, q % modulus, modulus))
}

fn powers(base: u64, count: usize, modulus: u64) -> Vec<u64> {
    let mut out = Vec::with_capacity(count);
    let mut current = 1u64;
    for _ in 0..count {
        out.push(current);
        current = mul_mod(current, base, modulus);
    }
    out
}

fn cyclic_transform(values: &mut [u64], roots: &[u64], modulus: u64) {
    let n = values.len();
    bit_reverse_permute(values);
    let mut len = 2;
    while len <= n {
        let half = len / 2;
        let step = n / len;
        for start in (0..n).step_by(len) {
            for offset in 0..half {
                let left = start + offset;
                let right = left + half;
                let t = mul_mod(values[right], roots[offset * step], modulus);
                let u = values[left];
                values[left] = add_mod(u, t, modulus);
                values[right] = sub_mod(u, t, modulus);
            }
        }
        len *= 2;
    }
}

fn bit_reverse_permute(values: &mut [u64]) {
    let bits = values.len().trailing_zeros();
    for i in 0..values.len() {
        let j = reverse_bits(i, bits);
        if i < j {
            values.swap(i, j);
        }
    }
}

pub(crate) fn reverse_bits(value: usize, bit_count: u32) -> usize {
    if bit_count == 0 {
        return 0;
    }
    value.reverse_bits() >> (usize::BITS - bit_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::ntt_prime_chain;

    fn negacyclic_schoolbook(a: &[u64], b: &[u64], q: u64) -> Vec<u64> {
        let n = a.len();
        let mut out = vec![0u64; n];
        for i in 0..n {
            for j in 0..n {
                let product = mul_mod(a[i], b[j], q);
                if i + j < n {
                    out[i + j] = add_mod(out[i + j], product, q);
                } else {
                    out[i + j - n] = sub_mod(out[i + j - n], product, q);
                }
            }
        }
        out
    }

    #[test]
    fn reverse_bits_matches_manual() {
        assert_eq!(reverse_bits(0b001, 3), 0b100);
        assert_eq!(reverse_bits(0b110, 3), 0b011);
        assert_eq!(reverse_bits(5, 0), 0);
    }

    #[test]
    fn ntt_roundtrip_is_identity() {
        let q = ntt_prime_chain(1, 60, 16, &[]).unwrap()[0];
        let table = NttTable::new(q, 16).unwrap();
        let original: Vec<u64> = (0..16u64).map(|i| (i * 7919 + 3) % q).collect();
        let mut values = original.clone();
        table.forward(&mut values);
        assert_ne!(values, original);
        table.inverse(&mut values);
        assert_eq!(values, original);
    }

    #[test]
    fn ntt_product_is_negacyclic() {
        let q = 65537;
        let table = NttTable::new(q, 8).unwrap();
        let a: Vec<u64> = vec![3, 1, 4, 1, 5, 9, 2, 6];
        let b: Vec<u64> = vec![2, 7, 1, 8, 2, 8, 1, 8];
        let expected = negacyclic_schoolbook(&a, &b, q);

        let (mut fa, mut fb) = (a.clone(), b.clone());
        table.forward(&mut fa);
        table.forward(&mut fb);
        let mut product: Vec<u64> = fa.iter().zip(&fb).map(|(&x, &y)| mul_mod(x, y, q)).collect();
        table.inverse(&mut product);
        assert_eq!(product, expected);
    }

    #[test]
    fn x_to_the_n_is_minus_one() {
        let q = 65537;
        let table = NttTable::new(q, 4).unwrap();
        // X^3 * X = X^4 = -1
        let mut x3 = vec![0, 0, 0, 1];
        let mut x1 = vec![0, 1, 0, 0];
        table.forward(&mut x3);
        table.forward(&mut x1);
        let mut product: Vec<u64> = x3.iter().zip(&x1).map(|(&a, &b)| mul_mod(a, b, q)).collect();
        table.inverse(&mut product);
        assert_eq!(product, vec![q - 1, 0, 0, 0]);
    }

    #[test]
    fn basis_rejects_bad_input() {
        assert_eq!(RnsBasis::new(8, vec![]).unwrap_err(), RnsError::EmptyBasis);
        assert_eq!(
            RnsBasis::new(8, vec![65537, 65537]).unwrap_err(),
            RnsError::DuplicateModulus { modulus: 65537 }
        );
        assert_eq!(
            RnsBasis::new(6, vec![65537]).unwrap_err(),
            RnsError::InvalidDegree { degree: 6 }
        );
        assert_eq!(
            RnsBasis::new(8, vec![65539]).unwrap_err(),
            RnsError::NonNttFriendlyModulus {
                modulus: 65539,
                degree: 8
            }
        );
    }

    #[test]
    fn crt_digits_recompose() {
        let moduli = ntt_prime_chain(3, 60, 8, &[]).unwrap();
        let basis = RnsBasis::new(8, moduli.clone()).unwrap();
        let value = -123_456_789_i128;
        let residues: Vec<u64> = moduli
            .iter()
            .map(|&q| value.rem_euclid(q as i128) as u64)
            .collect();
        let digits: Vec<u64> = residues
            .iter()
            .enumerate()
            .map(|(j, &r)| basis.crt_digit(j, r))
            .collect();
        // Every channel sees the same value after recomposition.
        for (i, &q) in moduli.iter().enumerate() {
            let recomposed = digits.iter().enumerate().fold(0u64, |acc, (j, &d)| {
                let punctured = punctured_product_mod(&moduli, j, q);
                add_mod(acc, mul_mod(d % q, punctured, q), q)
            });
            assert_eq!(recomposed, residues[i]);
        }
    }

    #[test]
    fn plaintext_reducer_handles_signs() {
        let moduli = ntt_prime_chain(3, 60, 8, &[]).unwrap();
        let basis = RnsBasis::new(8, moduli.clone()).unwrap();
        let t = 65537u64;
        let reducer = basis.plaintext_reducer(t);
        let values: [i128; 8] = [0, 1, -1, 65537 * 3 + 5, -(65537 * 1000) - 7, 42, -42, 1 << 100];
        let channels: Vec<Vec<u64>> = moduli
            .iter()
            .map(|&q| values.iter().map(|v| v.rem_euclid(q as i128) as u64).collect())
            .collect();
        let reduced = reducer.reduce(&basis, &channels);
        let expected: Vec<u64> = values
            .iter()
            .map(|v| v.rem_euclid(t as i128) as u64)
            .collect();
        assert_eq!(reduced, expected);
    }

    #[test]
    fn centered_magnitude_matches_values() {
        let moduli = ntt_prime_chain(2, 60, 8, &[]).unwrap();
        let basis = RnsBasis::new(8, moduli.clone()).unwrap();
        let values: [i128; 8] = [0, 1, -1, 255, -256, 1 << 70, -(1 << 90), 3];
        let channels: Vec<Vec<u64>> = moduli
            .iter()
            .map(|&q| values.iter().map(|v| v.rem_euclid(q as i128) as u64).collect())
            .collect();
        assert_eq!(basis.centered_magnitude_bits(&channels).unwrap(), 91);
    }
}
