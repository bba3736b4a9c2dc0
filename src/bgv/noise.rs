//! Worst-case noise bookkeeping in `log2` units.
//!
//! Every ciphertext carries a bound `B` on `|c0 + c1*s mod Q|` (the message
//! plus `t` times the error). Decryption is correct while `B < Q/2`. Without
//! modulus switching a ciphertext product roughly squares `B`, so the
//! modulus is sized from the recursion in [`NoiseModel::channels_for_depth`].

use super::params::BgvParams;

/// Extra bits granted per level for additions and rotations between products.
const LEVEL_SLACK_BITS: f64 = 3.0;
const DECRYPTION_MARGIN_BITS: f64 = 2.0;
/// Gaussian samples are bounded by this many standard deviations.
const ERROR_TAIL_FACTOR: f64 = 6.0;
const MAX_CHANNELS: usize = 256;

/// `log2(2^a + 2^b)`.
pub fn log2_sum(a: f64, b: f64) -> f64 {
    let (hi, lo) = if a >= b { (a, b) } else { (b, a) };
    hi + (1.0 + (lo - hi).exp2()).log2()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseModel {
    log_degree: f64,
    log_plaintext: f64,
    log_error: f64,
    fresh: f64,
}

impl NoiseModel {
    pub fn new(params: &BgvParams) -> Self {
        let degree = params.ring_degree() as f64;
        let t = params.plaintext_modulus().value() as f64;
        let error_bound = ERROR_TAIL_FACTOR * params.error_std_dev();
        // t * (e*u + e1 + e2*s) + m with dense ternary u and weight-h s.
        let spread = degree + params.hamming_weight() as f64 + 1.0;
        let fresh = log2_sum((t * spread * error_bound).log2(), (t / 2.0).log2());
        Self {
            log_degree: degree.log2(),
            log_plaintext: t.log2(),
            log_error: error_bound.log2(),
            fresh,
        }
    }

    pub fn fresh(&self) -> f64 {
        self.fresh
    }

    pub fn add(&self, lhs: f64, rhs: f64) -> f64 {
        log2_sum(lhs, rhs)
    }

    pub fn add_plain(&self, noise: f64) -> f64 {
        log2_sum(noise, self.log_plaintext - 1.0)
    }

    /// Tensor product bound `N * B1 * B2`, before relinearization.
    pub fn mul(&self, lhs: f64, rhs: f64) -> f64 {
        self.log_degree + lhs + rhs
    }

    pub fn mul_plain(&self, noise: f64) -> f64 {
        noise + self.log_degree + self.log_plaintext - 1.0
    }

    /// Noise added by one key switch over `channels` centered RNS digits:
    /// `t * L * N * (q_max / 2) * B_e`.
    pub fn key_switch(&self, channels: usize, max_prime_bits: f64) -> f64 {
        self.log_plaintext
            + (channels as f64).log2()
            + self.log_degree
            + (max_prime_bits - 1.0)
            + self.log_error
    }

    /// Bits of `Q` needed to decrypt after `depth` levels, assuming a basis
    /// of `channels` primes of `prime_bits` bits.
    pub fn required_modulus_bits(&self, depth: usize, channels: usize, prime_bits: u32) -> f64 {
        let switching = self.key_switch(channels, prime_bits as f64);
        let mut bound = log2_sum(self.fresh, switching) + LEVEL_SLACK_BITS;
        for _ in 0..depth {
            let product = self.mul(bound, bound).max(self.mul_plain(bound));
            bound = log2_sum(product, switching) + LEVEL_SLACK_BITS;
        }
        bound + 1.0 + DECRYPTION_MARGIN_BITS
    }

    /// Smallest prime count whose product covers
    /// [`required_modulus_bits`](Self::required_modulus_bits), or `None`
    /// past a sanity cap.
    pub fn channels_for_depth(&self, depth: usize, prime_bits: u32) -> Option<usize> {
        // Chain primes sit in (2^(bits-1), 2^bits).
        let bits_per_prime = prime_bits as f64 - 1.0;
        let mut channels = 1usize;
        loop {
            let needed = self.required_modulus_bits(depth, channels, prime_bits);
            let fit = (needed / bits_per_prime).ceil() as usize;
            if fit > MAX_CHANNELS {
                return None;
            }
            if fit <= channels {
                return Some(channels);
            }
            channels = fit;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn model(degree: usize, t: u64) -> NoiseModel {
        let params = BgvParams::builder()
            .ring_degree(degree)
            .plaintext_modulus(t)
            .build()
            .unwrap();
        NoiseModel::new(&params)
    }

    #[test]
    fn log2_sum_of_equal_terms_adds_a_bit() {
        assert_abs_diff_eq!(log2_sum(10.0, 10.0), 11.0, epsilon = 1e-12);
        assert_abs_diff_eq!(log2_sum(0.0, -1000.0), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn fresh_noise_exceeds_plaintext() {
        let model = model(64, 65537);
        assert!(model.fresh() > 16.0);
        assert!(model.fresh() < 40.0);
    }

    #[test]
    fn products_roughly_double_the_bound() {
        let model = model(64, 65537);
        let b = model.fresh();
        assert_abs_diff_eq!(model.mul(b, b), 2.0 * b + 6.0, epsilon = 1e-9);
        assert!(model.mul_plain(b) > b + 6.0);
    }

    #[test]
    fn channel_count_grows_with_depth() {
        let model = model(64, 65537);
        let mut previous = 0;
        for depth in 0..5 {
            let channels = model.channels_for_depth(depth, 60).unwrap();
            assert!(channels >= previous);
            let covered = channels as f64 * 59.0;
            assert!(covered >= model.required_modulus_bits(depth, channels, 60));
            previous = channels;
        }
        assert!(previous > 2);
    }

    #[test]
    fn absurd_depth_is_rejected() {
        let model = model(64, 65537);
        assert_eq!(model.channels_for_depth(40, 60), None);
    }
}
