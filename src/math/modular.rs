//! Word-sized modular arithmetic shared by the prime search, the RNS
//! polynomial kernels and the packed slot encoder.
//!
//! All helpers take operands already reduced into `[0, modulus)` unless
//! stated otherwise and use `u128` intermediates, so any modulus below
//! `2^63` is safe.

#[inline]
pub fn add_mod(a: u64, b: u64, modulus: u64) -> u64 {
    let sum = a + b;
    if sum >= modulus { sum - modulus } else { sum }
}

#[inline]
pub fn sub_mod(a: u64, b: u64, modulus: u64) -> u64 {
    if a >= b { a - b } else { a + modulus - b }
}

#[inline]
pub fn neg_mod(a: u64, modulus: u64) -> u64 {
    if a == 0 { 0 } else { modulus - a }
}

/// Computes `(a * b) mod modulus` using `u128` intermediate arithmetic.
#[inline]
pub fn mul_mod(a: u64, b: u64, modulus: u64) -> u64 {
    assert!(modulus > 0, "mul_mod: modulus must be positive");
    ((a as u128 * b as u128) % modulus as u128) as u64
}

/// Computes `base^exp mod modulus` via binary exponentiation.
pub fn mod_pow(mut base: u64, mut exp: u64, modulus: u64) -> u64 {
    assert!(modulus > 0, "mod_pow: modulus must be positive");
    if modulus == 1 {
        return 0;
    }
    let mut acc = 1u64;
    base %= modulus;
    while exp > 0 {
        if exp & 1 == 1 {
            acc = mul_mod(acc, base, modulus);
        }
        base = mul_mod(base, base, modulus);
        exp >>= 1;
    }
    acc
}

/// Returns the inverse of `value` modulo `modulus`, or `None` when the two
/// are not coprime.
pub fn mod_inverse(value: u64, modulus: u64) -> Option<u64> {
    let (mut old_r, mut r) = ((value % modulus) as i128, modulus as i128);
    let (mut old_s, mut s) = (1i128, 0i128);
    while r != 0 {
        let quotient = old_r / r;
        (old_r, r) = (r, old_r - quotient * r);
        (old_s, s) = (s, old_s - quotient * s);
    }
    if old_r != 1 {
        return None;
    }
    Some(old_s.rem_euclid(modulus as i128) as u64)
}

/// Reduces a signed value into `[0, modulus)`.
#[inline]
pub fn reduce_signed(value: i128, modulus: u64) -> u64 {
    value.rem_euclid(modulus as i128) as u64
}

/// Maps a residue in `[0, modulus)` to the centered range
/// `(-modulus/2, modulus/2]`.
#[inline]
pub fn centered(value: u64, modulus: u64) -> i64 {
    if value > modulus / 2 {
        value as i64 - modulus as i64
    } else {
        value as i64
    }
}

pub fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}
