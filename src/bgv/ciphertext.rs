use super::poly::RnsPoly;

/// Packed plaintext: polynomial coefficients modulo `t`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plaintext {
    coeffs: Vec<u64>,
}

impl Plaintext {
    pub(crate) fn new(coeffs: Vec<u64>) -> Self {
        Self { coeffs }
    }

    pub fn coeffs(&self) -> &[u64] {
        &self.coeffs
    }
}

/// Degree-one BGV ciphertext `(c0, c1)` with `c0 + c1*s = m + t*e (mod Q)`.
///
/// Both components are kept in NTT domain. `level` counts the
/// multiplications already consumed and `noise_bits` is the worst-case
/// `log2` bound on `|m + t*e|`.
#[derive(Debug, Clone)]
pub struct Ciphertext {
    pub(crate) c0: RnsPoly,
    pub(crate) c1: RnsPoly,
    level: usize,
    noise_bits: f64,
}

impl Ciphertext {
    pub(crate) fn new(c0: RnsPoly, c1: RnsPoly, level: usize, noise_bits: f64) -> Self {
        debug_assert!(c0.is_ntt_domain() && c1.is_ntt_domain());
        Self {
            c0,
            c1,
            level,
            noise_bits,
        }
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn noise_bits(&self) -> f64 {
        self.noise_bits
    }
}
