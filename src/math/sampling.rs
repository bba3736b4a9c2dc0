use rand::{Rng, distr::Uniform, seq::SliceRandom};
use rand_distr::{Distribution, Normal};

/// Samples `len` uniform integer coefficients in `[0, max_value)`.
///
/// # Panics
///
/// Panics if `max_value == 0`.
pub fn uniform_coefficients<R: Rng + ?Sized>(len: usize, max_value: u64, rng: &mut R) -> Vec<u64> {
    let distribution = Uniform::new(0, max_value).unwrap_or_else(|_| {
        panic!(
            "uniform_coefficients: invalid range [0, {max_value}), \
            max_value must be positive"
        )
    });
    (0..len).map(|_| distribution.sample(rng)).collect()
}

/// Samples `len` rounded Gaussian integers with the given standard deviation.
///
/// # Panics
///
/// Panics if `std_dev` is not finite and positive.
pub fn gaussian_coefficients<R: Rng + ?Sized>(len: usize, std_dev: f64, rng: &mut R) -> Vec<i64> {
    assert!(
        std_dev.is_finite() && std_dev > 0.0,
        "gaussian_coefficients: std_dev must be finite and positive"
    );
    let normal = Normal::new(0.0, std_dev)
        .expect("gaussian_coefficients: failed to create Normal distribution");
    (0..len).map(|_| normal.sample(rng).round() as i64).collect()
}

/// Samples a ternary vector with coefficients in `{-1, 0, 1}`.
///
/// Exactly `hamming_weight` entries are non-zero.
///
/// # Panics
///
/// Panics if `hamming_weight > len`.
pub fn ternary_coefficients<R: Rng + ?Sized>(len: usize, hamming_weight: usize, rng: &mut R) -> Vec<i64> {
    assert!(
        hamming_weight <= len,
        "ternary_coefficients: hamming_weight must be <= len"
    );
    let mut out = vec![0i64; len];
    let mut indices: Vec<usize> = (0..len).collect();
    indices.shuffle(rng);
    for &idx in indices.iter().take(hamming_weight) {
        out[idx] = if rng.random_bool(0.5) { 1 } else { -1 };
    }
    out
}

/// Samples a dense ternary vector, each entry uniform in `{-1, 0, 1}`.
pub fn uniform_ternary_coefficients<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Vec<i64> {
    (0..len).map(|_| rng.random_range(-1i64..=1)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn uniform_coefficients_stay_in_range() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let coeffs = uniform_coefficients(128, 17, &mut rng);
        assert_eq!(coeffs.len(), 128);
        assert!(coeffs.iter().all(|&c| c < 17));
    }

    #[test]
    #[should_panic(
        expected = "uniform_coefficients: invalid range [0, 0), max_value must be positive"
    )]
    fn uniform_coefficients_panics_on_zero_max_value() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let _ = uniform_coefficients(8, 0, &mut rng);
    }

    #[test]
    fn uniform_coefficients_are_roughly_balanced() {
        const LEN: usize = 8192;
        const MODULUS: usize = 8;
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let coeffs = uniform_coefficients(LEN, MODULUS as u64, &mut rng);

        let mut buckets = [0usize; MODULUS];
        for &coeff in &coeffs {
            buckets[coeff as usize] += 1;
        }

        let expected = LEN as f64 / MODULUS as f64;
        for &count in &buckets {
            let deviation = (count as f64 - expected).abs();
            assert!(
                deviation <= expected * 0.30,
                "bucket count {count} too far from expected {expected}"
            );
        }
    }

    #[test]
    #[should_panic(expected = "gaussian_coefficients: std_dev must be finite and positive")]
    fn gaussian_coefficients_panics_on_non_positive_std_dev() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let _ = gaussian_coefficients(8, 0.0, &mut rng);
    }

    #[test]
    fn gaussian_coefficients_have_reasonable_mean_and_variance() {
        const LEN: usize = 16_384;
        let std_dev = 3.2;
        let mut rng = ChaCha20Rng::seed_from_u64(99);
        let coeffs = gaussian_coefficients(LEN, std_dev, &mut rng);

        let mean = coeffs.iter().map(|&x| x as f64).sum::<f64>() / LEN as f64;
        let variance = coeffs
            .iter()
            .map(|&x| (x as f64 - mean).powi(2))
            .sum::<f64>()
            / LEN as f64;

        let expected_variance = std_dev * std_dev;
        assert!(mean.abs() <= 0.25, "mean too far from 0: {mean}");
        assert!(
            (variance - expected_variance).abs() <= expected_variance * 0.35,
            "variance {variance} too far from expected {expected_variance}"
        );
    }

    #[test]
    fn ternary_coefficients_have_exact_hamming_weight() {
        let mut rng = ChaCha20Rng::seed_from_u64(123);
        let coeffs = ternary_coefficients(256, 31, &mut rng);
        assert_eq!(coeffs.iter().filter(|&&x| x != 0).count(), 31);
        assert!(coeffs.iter().all(|&x| (-1..=1).contains(&x)));
    }

    #[test]
    #[should_panic(expected = "ternary_coefficients: hamming_weight must be <= len")]
    fn ternary_coefficients_panics_on_oversized_hamming_weight() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let _ = ternary_coefficients(8, 9, &mut rng);
    }

    #[test]
    fn uniform_ternary_covers_all_values() {
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let coeffs = uniform_ternary_coefficients(512, &mut rng);
        for value in -1..=1 {
            assert!(coeffs.contains(&value));
        }
    }
}
