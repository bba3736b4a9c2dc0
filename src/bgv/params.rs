use super::errors::{BgvError, BgvResult};
use crate::{
    codec::PlaintextModulus,
    math::{is_ntt_friendly_prime, is_prime},
};
use std::fmt;

const DEFAULT_RING_DEGREE: usize = 64;
const DEFAULT_PLAINTEXT_MODULUS: u64 = 65537;
const DEFAULT_ERROR_STD_DEV: f64 = 3.2;
const DEFAULT_PRIME_BITS: u32 = 60;
const MIN_RING_DEGREE: usize = 8;

/// Target security level for the ciphertext modulus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecurityLevel {
    /// No bound on `log2 Q`. Toy parameters only.
    #[default]
    NotSet,
    /// HE-standard bound for 128-bit classical security, ternary secrets.
    Classic128,
}

impl SecurityLevel {
    /// Largest allowed `log2 Q` for the ring degree, or `None` when unbounded.
    pub fn max_modulus_bits(self, ring_degree: usize) -> Option<u32> {
        match self {
            SecurityLevel::NotSet => None,
            SecurityLevel::Classic128 => Some(match ring_degree {
                1024 => 27,
                2048 => 54,
                4096 => 109,
                8192 => 218,
                16384 => 438,
                32768 => 881,
                n if n > 32768 => 881 * (n / 32768) as u32,
                _ => 0,
            }),
        }
    }
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecurityLevel::NotSet => write!(f, "not set"),
            SecurityLevel::Classic128 => write!(f, "classic-128"),
        }
    }
}

/// Validated BGV parameters. Build with [`BgvParams::builder`].
#[derive(Debug, Clone, PartialEq)]
pub struct BgvParams {
    ring_degree: usize,
    plaintext_modulus: PlaintextModulus,
    depth: usize,
    security: SecurityLevel,
    error_std_dev: f64,
    hamming_weight: usize,
    prime_bits: u32,
    seed: Option<u64>,
}

impl BgvParams {
    pub fn builder() -> BgvParamsBuilder {
        BgvParamsBuilder::new()
    }

    pub fn ring_degree(&self) -> usize {
        self.ring_degree
    }

    pub fn plaintext_modulus(&self) -> PlaintextModulus {
        self.plaintext_modulus
    }

    /// Multiplicative depth the modulus is sized for.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn security(&self) -> SecurityLevel {
        self.security
    }

    pub fn error_std_dev(&self) -> f64 {
        self.error_std_dev
    }

    pub fn hamming_weight(&self) -> usize {
        self.hamming_weight
    }

    pub fn prime_bits(&self) -> u32 {
        self.prime_bits
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

#[derive(Debug, Clone, Default)]
pub struct BgvParamsBuilder {
    ring_degree: Option<usize>,
    plaintext_modulus: Option<u64>,
    depth: Option<usize>,
    security: Option<SecurityLevel>,
    error_std_dev: Option<f64>,
    hamming_weight: Option<usize>,
    prime_bits: Option<u32>,
    seed: Option<u64>,
}

impl BgvParamsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ring_degree(mut self, degree: usize) -> Self {
        self.ring_degree = Some(degree);
        self
    }

    pub fn plaintext_modulus(mut self, modulus: u64) -> Self {
        self.plaintext_modulus = Some(modulus);
        self
    }

    pub fn depth(mut self, depth: usize) -> Self {
        self.depth = Some(depth);
        self
    }

    pub fn security(mut self, security: SecurityLevel) -> Self {
        self.security = Some(security);
        self
    }

    pub fn error_std_dev(mut self, std_dev: f64) -> Self {
        self.error_std_dev = Some(std_dev);
        self
    }

    pub fn hamming_weight(mut self, weight: usize) -> Self {
        self.hamming_weight = Some(weight);
        self
    }

    pub fn prime_bits(mut self, bits: u32) -> Self {
        self.prime_bits = Some(bits);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> BgvResult<BgvParams> {
        let ring_degree = self.ring_degree.unwrap_or(DEFAULT_RING_DEGREE);
        if !ring_degree.is_power_of_two() || ring_degree < MIN_RING_DEGREE {
            return Err(BgvError::InvalidRingDimension(ring_degree));
        }

        let t = self.plaintext_modulus.unwrap_or(DEFAULT_PLAINTEXT_MODULUS);
        let plaintext_modulus =
            PlaintextModulus::new(t).map_err(|_| BgvError::InvalidPlaintextModulus(t))?;
        if !is_prime(t) {
            return Err(BgvError::InvalidPlaintextModulus(t));
        }
        if !is_ntt_friendly_prime(t, ring_degree as u64) {
            return Err(BgvError::NotBatchFriendly {
                modulus: t,
                ring_degree,
            });
        }

        let error_std_dev = self.error_std_dev.unwrap_or(DEFAULT_ERROR_STD_DEV);
        if !error_std_dev.is_finite() || error_std_dev <= 0.0 {
            return Err(BgvError::InvalidParameter {
                message: format!("error std-dev must be finite and positive, got {error_std_dev}"),
            });
        }

        let hamming_weight = self.hamming_weight.unwrap_or(ring_degree / 2);
        if hamming_weight == 0 || hamming_weight > ring_degree {
            return Err(BgvError::InvalidParameter {
                message: format!(
                    "hamming weight must be in 1..={ring_degree}, got {hamming_weight}"
                ),
            });
        }

        let prime_bits = self.prime_bits.unwrap_or(DEFAULT_PRIME_BITS);
        if !(30..=61).contains(&prime_bits) {
            return Err(BgvError::InvalidParameter {
                message: format!("prime bits must be in 30..=61, got {prime_bits}"),
            });
        }

        Ok(BgvParams {
            ring_degree,
            plaintext_modulus,
            depth: self.depth.unwrap_or(1),
            security: self.security.unwrap_or_default(),
            error_std_dev,
            hamming_weight,
            prime_bits,
            seed: self.seed,
        })
    }
}
