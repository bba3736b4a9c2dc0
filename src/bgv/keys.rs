use super::{poly::RnsPoly, rns::RnsBasis};
use crate::math::{centered, mul_mod, ternary_coefficients};
use rand::Rng;
use std::{collections::HashMap, sync::Arc};

/// Ternary secret `s`, held in NTT domain alongside its signed coefficients
/// (needed to build Galois keys for `s(X^g)`).
#[derive(Debug, Clone)]
pub struct SecretKey {
    pub(crate) poly: RnsPoly,
    coeffs: Vec<i64>,
}

impl SecretKey {
    pub fn generate<R: Rng + ?Sized>(hamming_weight: usize, basis: &Arc<RnsBasis>, rng: &mut R) -> Self {
        let coeffs = ternary_coefficients(basis.degree(), hamming_weight, rng);
        let poly = RnsPoly::from_signed(&coeffs, basis.clone()).into_ntt_domain();
        Self { poly, coeffs }
    }

    pub fn coeffs(&self) -> &[i64] {
        &self.coeffs
    }

    pub fn hamming_weight(&self) -> usize {
        self.coeffs.iter().filter(|&&c| c != 0).count()
    }

    /// `s(X^g)` in NTT domain.
    pub(crate) fn automorphism(&self, galois_element: u64) -> RnsPoly {
        RnsPoly::from_signed(&self.coeffs, self.poly.basis().clone())
            .automorphism(galois_element)
            .into_ntt_domain()
    }
}

/// RLWE public key `(b, a)` with `b = -a*s + t*e`.
#[derive(Debug, Clone)]
pub struct PublicKey {
    pub(crate) b: RnsPoly,
    pub(crate) a: RnsPoly,
}

impl PublicKey {
    pub fn generate<R: Rng + ?Sized>(
        secret_key: &SecretKey,
        plaintext_modulus: u64,
        error_std_dev: f64,
        rng: &mut R,
    ) -> Self {
        let basis = secret_key.poly.basis().clone();
        let a = RnsPoly::sample_uniform(basis.clone(), rng);
        let mut error = RnsPoly::sample_gaussian(error_std_dev, basis, rng);
        error.scalar_mul(plaintext_modulus as i128);
        error.to_ntt_domain();

        let mut a_s = a.clone();
        a_s *= &secret_key.poly;
        let mut b = -a_s;
        b += &error;
        Self { b, a }
    }
}

/// Key switching key from `s'` to `s` over the RNS digit gadget.
///
/// Component `j` is `(b_j, a_j)` with `b_j = -a_j*s + t*e_j + (Q/q_j)*s'`.
/// Since `Q/q_j` vanishes modulo every `q_i` with `i != j`, the gadget term
/// only touches channel `j`.
#[derive(Debug, Clone)]
pub struct KeySwitchKey {
    components: Vec<(RnsPoly, RnsPoly)>,
}

impl KeySwitchKey {
    pub fn generate<R: Rng + ?Sized>(
        secret_key: &SecretKey,
        target: &RnsPoly,
        plaintext_modulus: u64,
        error_std_dev: f64,
        rng: &mut R,
    ) -> Self {
        let basis = secret_key.poly.basis().clone();
        debug_assert!(target.is_ntt_domain(), "KeySwitchKey: target must be in NTT domain");

        let components = (0..basis.channel_count())
            .map(|j| {
                let a = RnsPoly::sample_uniform(basis.clone(), rng);
                let mut error = RnsPoly::sample_gaussian(error_std_dev, basis.clone(), rng);
                error.scalar_mul(plaintext_modulus as i128);
                error.to_ntt_domain();

                let mut a_s = a.clone();
                a_s *= &secret_key.poly;
                let mut b = -a_s;
                b += &error;
                b += &gadget_term(target, j);
                (b, a)
            })
            .collect();
        Self { components }
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Returns `(d0, d1)` in NTT domain with `d0 + d1*s = x*s' + t*small`.
    ///
    /// `poly` must be in coefficient domain.
    pub fn apply(&self, poly: &RnsPoly) -> (RnsPoly, RnsPoly) {
        debug_assert!(!poly.is_ntt_domain(), "apply: requires coefficient domain");
        let basis = poly.basis().clone();
        let mut acc0 = RnsPoly::zero(basis.clone()).into_ntt_domain();
        let mut acc1 = acc0.clone();

        for (j, (b, a)) in self.components.iter().enumerate() {
            let q = basis.moduli()[j];
            let digit: Vec<i64> = poly.channels()[j]
                .iter()
                .map(|&x| centered(basis.crt_digit(j, x), q))
                .collect();
            let digit = RnsPoly::from_signed(&digit, basis.clone()).into_ntt_domain();

            let mut term = digit.clone();
            term *= b;
            acc0 += &term;
            let mut term = digit;
            term *= a;
            acc1 += &term;
        }
        (acc0, acc1)
    }
}

fn gadget_term(target: &RnsPoly, channel: usize) -> RnsPoly {
    let basis = target.basis();
    let factor = basis.punctured_residue(channel);
    let q = basis.moduli()[channel];
    let channels = target
        .channels()
        .iter()
        .enumerate()
        .map(|(i, values)| {
            if i == channel {
                values.iter().map(|&v| mul_mod(v, factor, q)).collect()
            } else {
                vec![0u64; values.len()]
            }
        })
        .collect();
    RnsPoly::new_unchecked(channels, basis.clone(), true)
}

/// Relinearization key: switches `s^2` back to `s`.
#[derive(Debug, Clone)]
pub struct RelinearizationKey(pub(crate) KeySwitchKey);

impl RelinearizationKey {
    pub fn generate<R: Rng + ?Sized>(
        secret_key: &SecretKey,
        plaintext_modulus: u64,
        error_std_dev: f64,
        rng: &mut R,
    ) -> Self {
        let mut s_squared = secret_key.poly.clone();
        s_squared *= &secret_key.poly;
        Self(KeySwitchKey::generate(
            secret_key,
            &s_squared,
            plaintext_modulus,
            error_std_dev,
            rng,
        ))
    }
}

/// Galois keys indexed by Galois element.
#[derive(Debug, Clone, Default)]
pub struct RotationKeys {
    keys: HashMap<u64, KeySwitchKey>,
}

impl RotationKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_generated<R: Rng + ?Sized>(
        &mut self,
        secret_key: &SecretKey,
        galois_element: u64,
        plaintext_modulus: u64,
        error_std_dev: f64,
        rng: &mut R,
    ) {
        if self.keys.contains_key(&galois_element) {
            return;
        }
        let target = secret_key.automorphism(galois_element);
        let key = KeySwitchKey::generate(secret_key, &target, plaintext_modulus, error_std_dev, rng);
        self.keys.insert(galois_element, key);
    }

    pub fn get(&self, galois_element: u64) -> Option<&KeySwitchKey> {
        self.keys.get(&galois_element)
    }

    pub fn contains(&self, galois_element: u64) -> bool {
        self.keys.contains_key(&galois_element)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
