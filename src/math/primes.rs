//! Prime utilities for building the ciphertext modulus chain and for
//! checking that a plaintext modulus supports slot packing.
//!
//! Primality uses deterministic Miller-Rabin over `u64`: `n - 1` is written
//! as `d * 2^r` and every fixed base must either hit `1`/`n - 1` directly or
//! reach `n - 1` by repeated squaring.

use super::modular::{mod_pow, mul_mod};

// Deterministic for every n < 3.3 * 10^24, which covers all of u64.
const MILLER_RABIN_BASES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

/// Returns `(odd_part, power_of_two)` such that `n = odd_part * 2^power_of_two`.
fn decompose(n: u64) -> (u64, u32) {
    assert!(n > 0, "decompose: n must be positive");
    let r = n.trailing_zeros();
    (n >> r, r)
}

/// Returns `true` if `n` is prime using deterministic Miller-Rabin on `u64`.
pub fn is_prime(n: u64) -> bool {
    match n {
        0 | 1 => return false,
        2 | 3 => return true,
        _ if n & 1 == 0 => return false,
        _ => {}
    }

    let (d, r) = decompose(n - 1);
    'bases: for &a in MILLER_RABIN_BASES.iter() {
        if a >= n {
            continue;
        }
        let mut x = mod_pow(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..r {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'bases;
            }
        }
        return false;
    }
    true
}

/// Returns `true` when `p` is prime and `p = 1 (mod 2n)`.
///
/// That congruence guarantees a primitive `2n`-th root of unity in `Z_p`,
/// which both the negacyclic NTT and slot packing over `X^n + 1` need.
#[inline]
pub fn is_ntt_friendly_prime(p: u64, n: u64) -> bool {
    n > 0 && n.checked_mul(2).is_some_and(|step| p % step == 1) && is_prime(p)
}

/// Candidates `k * 2n + 1` strictly below `bound`, largest first.
fn friendly_candidates_below(bound: u64, n: u64) -> impl Iterator<Item = u64> {
    let step = n.saturating_mul(2).max(1);
    let top = bound.saturating_sub(2) / step;
    (1..=top).rev().map(move |k| k * step + 1)
}

/// Finds a primitive `order`-th root of unity modulo the prime `modulus`,
/// where `order` is a power of two dividing `modulus - 1`.
///
/// Returns `None` when no such root exists.
pub fn primitive_power_of_two_root(order: u64, modulus: u64) -> Option<u64> {
    if !order.is_power_of_two() || order < 2 || (modulus - 1) % order != 0 {
        return None;
    }
    let exponent = (modulus - 1) / order;
    // A candidate of exact order `order` has `root^(order/2) == -1`.
    (2..modulus)
        .map(|candidate| mod_pow(candidate, exponent, modulus))
        .find(|&root| mod_pow(root, order / 2, modulus) == modulus - 1)
}

/// Collects `count` distinct NTT-friendly primes below `2^bits`, largest
/// first, skipping any value listed in `exclude`.
///
/// Returns `None` if the search space runs out first.
pub fn ntt_prime_chain(count: usize, bits: u32, n: u64, exclude: &[u64]) -> Option<Vec<u64>> {
    let bound = 1u64.checked_shl(bits).filter(|_| bits < 63)?;
    let primes: Vec<u64> = friendly_candidates_below(bound, n)
        .filter(|p| !exclude.contains(p) && is_prime(*p))
        .take(count)
        .collect();
    (primes.len() == count).then_some(primes)
}
