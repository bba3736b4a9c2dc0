use super::{
    errors::{RnsError, RnsResult},
    rns::RnsBasis,
};
use crate::math::{
    add_mod, gaussian_coefficients, mul_mod, neg_mod, reduce_signed, sub_mod,
    ternary_coefficients, uniform_coefficients, uniform_ternary_coefficients,
};
use rand::Rng;
use std::{
    ops::{AddAssign, MulAssign, Neg, SubAssign},
    sync::Arc,
};

/// A polynomial in `Z_{q_0} x … x Z_{q_{L-1}}[X] / (X^N + 1)`.
///
/// Stores one length-`N` vector per RNS channel. The `in_ntt_domain` flag
/// tracks whether the vectors hold coefficient-domain or NTT-domain values.
///
/// # Invariants
/// - `channels.len() == basis.channel_count()`
/// - `channels[i].len() == basis.degree()`
/// - Every `channels[i][j] < basis.moduli()[i]`
#[derive(Clone, Debug)]
pub struct RnsPoly {
    channels: Vec<Vec<u64>>,
    basis: Arc<RnsBasis>,
    in_ntt_domain: bool,
}

// ─── Constructors ─────────────────────────────────────────────────────────────

impl RnsPoly {
    /// Creates the zero polynomial in coefficient domain.
    pub fn zero(basis: Arc<RnsBasis>) -> Self {
        let channels = vec![vec![0u64; basis.degree()]; basis.channel_count()];
        Self {
            channels,
            basis,
            in_ntt_domain: false,
        }
    }

    /// Creates a polynomial from signed coefficients, reduced per channel.
    ///
    /// Missing trailing coefficients are zero; extra ones are ignored.
    pub fn from_signed(coeffs: &[i64], basis: Arc<RnsBasis>) -> Self {
        let degree = basis.degree();
        let channels = basis
            .moduli()
            .iter()
            .map(|&q| {
                let mut channel = vec![0u64; degree];
                for (slot, &coeff) in channel.iter_mut().zip(coeffs) {
                    *slot = reduce_signed(coeff as i128, q);
                }
                channel
            })
            .collect();
        Self::new_unchecked(channels, basis, false)
    }

    /// Creates a polynomial from pre-built channel vectors.
    ///
    /// Returns an error if the shape doesn't match the basis, or if any
    /// coefficient is not reduced.
    pub fn from_channels(
        channels: Vec<Vec<u64>>,
        basis: Arc<RnsBasis>,
        in_ntt_domain: bool,
    ) -> RnsResult<Self> {
        let expected = basis.channel_count();
        let actual = channels.len();
        if actual != expected {
            return Err(RnsError::ChannelCountMismatch { expected, actual });
        }
        for (ch, channel) in channels.iter().enumerate() {
            if channel.len() != basis.degree() {
                return Err(RnsError::ChannelLengthMismatch {
                    expected: basis.degree(),
                    actual: channel.len(),
                });
            }
            let q = basis.moduli()[ch];
            if let Some(&coefficient) = channel.iter().find(|&&c| c >= q) {
                return Err(RnsError::NonReducedCoefficient {
                    coefficient,
                    modulus: q,
                });
            }
        }
        Ok(Self::new_unchecked(channels, basis, in_ntt_domain))
    }

    // Skips the O(N·L) reducedness check; callers build reduced channels.
    pub(super) fn new_unchecked(channels: Vec<Vec<u64>>, basis: Arc<RnsBasis>, in_ntt_domain: bool) -> Self {
        Self {
            channels,
            basis,
            in_ntt_domain,
        }
    }
}

// ─── Sampling ────────────────────────────────────────────────────────────────

impl RnsPoly {
    /// Coefficients uniform in `[0, q_i)` per channel. The result is valid
    /// in either domain; it is tagged as NTT domain.
    pub fn sample_uniform<R: Rng + ?Sized>(basis: Arc<RnsBasis>, rng: &mut R) -> Self {
        let channels = basis
            .moduli()
            .iter()
            .map(|&q| uniform_coefficients(basis.degree(), q, rng))
            .collect();
        Self::new_unchecked(channels, basis, true)
    }

    /// Rounded Gaussian noise, CRT-encoded per channel.
    pub fn sample_gaussian<R: Rng + ?Sized>(std_dev: f64, basis: Arc<RnsBasis>, rng: &mut R) -> Self {
        let noise = gaussian_coefficients(basis.degree(), std_dev, rng);
        Self::from_signed(&noise, basis)
    }

    /// Ternary polynomial with exactly `hamming_weight` non-zero coefficients.
    pub fn sample_ternary<R: Rng + ?Sized>(
        hamming_weight: usize,
        basis: Arc<RnsBasis>,
        rng: &mut R,
    ) -> Self {
        let ternary = ternary_coefficients(basis.degree(), hamming_weight, rng);
        Self::from_signed(&ternary, basis)
    }

    /// Dense ternary polynomial, each coefficient uniform in `{-1, 0, 1}`.
    pub fn sample_uniform_ternary<R: Rng + ?Sized>(basis: Arc<RnsBasis>, rng: &mut R) -> Self {
        let ternary = uniform_ternary_coefficients(basis.degree(), rng);
        Self::from_signed(&ternary, basis)
    }
}

// ─── Accessors & domain conversion ───────────────────────────────────────────

impl RnsPoly {
    pub fn channels(&self) -> &[Vec<u64>] {
        &self.channels
    }

    pub fn basis(&self) -> &Arc<RnsBasis> {
        &self.basis
    }

    pub fn is_ntt_domain(&self) -> bool {
        self.in_ntt_domain
    }

    pub fn shares_basis(&self, other: &RnsPoly) -> bool {
        Arc::ptr_eq(&self.basis, &other.basis)
    }

    /// Converts to NTT domain in-place (no-op if already there).
    pub fn to_ntt_domain(&mut self) {
        if self.in_ntt_domain {
            return;
        }
        for (ch, channel) in self.channels.iter_mut().enumerate() {
            self.basis.ntt_table(ch).forward(channel);
        }
        self.in_ntt_domain = true;
    }

    /// Converts to coefficient domain in-place (no-op if already there).
    pub fn to_coeff_domain(&mut self) {
        if !self.in_ntt_domain {
            return;
        }
        for (ch, channel) in self.channels.iter_mut().enumerate() {
            self.basis.ntt_table(ch).inverse(channel);
        }
        self.in_ntt_domain = false;
    }

    pub fn into_ntt_domain(mut self) -> Self {
        self.to_ntt_domain();
        self
    }

    pub fn into_coeff_domain(mut self) -> Self {
        self.to_coeff_domain();
        self
    }

    /// Multiplies every coefficient by a signed integer constant.
    /// Works in both domains.
    pub fn scalar_mul(&mut self, factor: i128) {
        for (ch, channel) in self.channels.iter_mut().enumerate() {
            let q = self.basis.moduli()[ch];
            let factor = reduce_signed(factor, q);
            for c in channel.iter_mut() {
                *c = mul_mod(*c, factor, q);
            }
        }
    }

    /// Applies `X -> X^galois_element`, an automorphism of `Z[X]/(X^N + 1)`
    /// for odd `galois_element`.
    ///
    /// Coefficient `i` moves to `i * g mod 2N`, negated when that index
    /// wraps past `N`.
    pub fn automorphism(&self, galois_element: u64) -> Self {
        debug_assert!(
            !self.in_ntt_domain,
            "automorphism: requires coefficient domain"
        );
        debug_assert!(galois_element % 2 == 1, "automorphism: element must be odd");
        let degree = self.basis.degree();
        let two_n = 2 * degree as u64;
        let g = galois_element % two_n;
        let channels = self
            .channels
            .iter()
            .zip(self.basis.moduli())
            .map(|(channel, &q)| {
                let mut out = vec![0u64; degree];
                for (i, &c) in channel.iter().enumerate() {
                    let target = (i as u64 * g % two_n) as usize;
                    if target < degree {
                        out[target] = c;
                    } else {
                        out[target - degree] = neg_mod(c, q);
                    }
                }
                out
            })
            .collect();
        Self::new_unchecked(channels, self.basis.clone(), false)
    }

    /// Negacyclic schoolbook product, per channel. Coefficient domain only.
    pub fn schoolbook_mul(&self, rhs: &RnsPoly) -> Self {
        debug_assert!(
            !self.in_ntt_domain && !rhs.in_ntt_domain,
            "schoolbook_mul: requires coefficient domain"
        );
        debug_assert!(self.shares_basis(rhs), "schoolbook_mul: basis mismatch");
        let degree = self.basis.degree();
        let channels = self
            .channels
            .iter()
            .zip(&rhs.channels)
            .zip(self.basis.moduli())
            .map(|((lhs, rhs), &q)| {
                let mut result = vec![0u64; degree];
                for i in 0..degree {
                    for j in 0..degree {
                        let prod = mul_mod(lhs[i], rhs[j], q);
                        if i + j < degree {
                            result[i + j] = add_mod(result[i + j], prod, q);
                        } else {
                            // X^N = -1 in Z[X]/(X^N + 1)
                            result[i + j - degree] = sub_mod(result[i + j - degree], prod, q);
                        }
                    }
                }
                result
            })
            .collect();
        Self::new_unchecked(channels, self.basis.clone(), false)
    }

    /// Largest bit length of a centered coefficient.
    pub fn max_centered_bits(&self) -> RnsResult<u32> {
        let coeff = if self.in_ntt_domain {
            self.clone().into_coeff_domain()
        } else {
            self.clone()
        };
        self.basis.centered_magnitude_bits(&coeff.channels)
    }
}

// ─── Arithmetic ───────────────────────────────────────────────────────────────

impl AddAssign<&RnsPoly> for RnsPoly {
    /// Coefficient-wise addition modulo each `q_i`. Works in both domains;
    /// operands must share basis and domain.
    fn add_assign(&mut self, rhs: &RnsPoly) {
        debug_assert!(self.shares_basis(rhs), "add_assign: basis mismatch");
        debug_assert_eq!(
            self.in_ntt_domain, rhs.in_ntt_domain,
            "add_assign: domain mismatch"
        );
        for (ch, channel) in self.channels.iter_mut().enumerate() {
            let q = self.basis.moduli()[ch];
            for (a, &b) in channel.iter_mut().zip(&rhs.channels[ch]) {
                *a = add_mod(*a, b, q);
            }
        }
    }
}

impl SubAssign<&RnsPoly> for RnsPoly {
    fn sub_assign(&mut self, rhs: &RnsPoly) {
        debug_assert!(self.shares_basis(rhs), "sub_assign: basis mismatch");
        debug_assert_eq!(
            self.in_ntt_domain, rhs.in_ntt_domain,
            "sub_assign: domain mismatch"
        );
        for (ch, channel) in self.channels.iter_mut().enumerate() {
            let q = self.basis.moduli()[ch];
            for (a, &b) in channel.iter_mut().zip(&rhs.channels[ch]) {
                *a = sub_mod(*a, b, q);
            }
        }
    }
}

impl MulAssign<&RnsPoly> for RnsPoly {
    /// Pointwise product; both operands must be in NTT domain, where this is
    /// multiplication in `Z_q[X]/(X^N + 1)`.
    fn mul_assign(&mut self, rhs: &RnsPoly) {
        debug_assert!(
            self.in_ntt_domain && rhs.in_ntt_domain,
            "mul_assign: requires NTT domain; call to_ntt_domain first"
        );
        debug_assert!(self.shares_basis(rhs), "mul_assign: basis mismatch");
        for (ch, channel) in self.channels.iter_mut().enumerate() {
            let q = self.basis.moduli()[ch];
            for (a, &b) in channel.iter_mut().zip(&rhs.channels[ch]) {
                *a = mul_mod(*a, b, q);
            }
        }
    }
}

impl Neg for RnsPoly {
    type Output = Self;

    /// Coefficient-wise negation modulo each `q_i`. Works in both domains.
    fn neg(mut self) -> Self {
        for (ch, channel) in self.channels.iter_mut().enumerate() {
            let q = self.basis.moduli()[ch];
            for c in channel.iter_mut() {
                *c = neg_mod(*c, q);
            }
        }
        self
    }
}
