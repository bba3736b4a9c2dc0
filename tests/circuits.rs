//! Every circuit runs on the cleartext simulator and on real BGV ciphertexts
//! and must produce identical integers on both.

use approx::assert_abs_diff_eq;
use paste::paste;
use toy_bgv_fixed::{
    Error,
    backend::{HomomorphicBackend, SlotSimulator},
    bgv::{BgvBackend, BgvParams},
    circuit::{
        ConfigurationError, PolynomialProduct, ScaledEvaluator, ShiftDirection, ShiftedConvolution,
        SinCosRecurrence, TaylorPlan,
    },
    codec::{PlaintextModulus, Scale, encode},
};
use std::f64::consts::PI;

const SMALL_T: u64 = 65537;
const BIG_T: u64 = 1_099_512_004_609;
const RING_DEGREE: usize = 16;

fn simulator(t: u64, depth: usize) -> SlotSimulator {
    SlotSimulator::new(PlaintextModulus::new(t).unwrap(), RING_DEGREE, depth).unwrap()
}

fn bgv(t: u64, depth: usize) -> BgvBackend {
    let params = BgvParams::builder()
        .ring_degree(RING_DEGREE)
        .plaintext_modulus(t)
        .depth(depth)
        .seed(2024)
        .build()
        .unwrap();
    BgvBackend::create(params).unwrap()
}

macro_rules! on_both_backends {
    ($($case:ident),* $(,)?) => {
        paste! {
            $(
                #[test]
                fn [<$case _on_simulator>]() {
                    $case(simulator);
                }

                #[test]
                fn [<$case _on_bgv>]() {
                    $case(bgv);
                }
            )*
        }
    };
}

on_both_backends!(
    negative_constants,
    taylor_sine,
    taylor_sweep_to_pi,
    convolution_matches_plain_loop,
    unmasked_rotation_wraps,
    polynomial_product,
    sin_cos_recurrence,
    shallow_backends_are_rejected,
);

fn negative_constants<B: HomomorphicBackend>(make: fn(u64, usize) -> B) {
    let mut ev = ScaledEvaluator::new(make(SMALL_T, 1));
    let x = ev.encrypt_integers(&[-2344], Scale::ONE).unwrap();
    let lhs = ev.mul_integer(&x, -7).unwrap();
    let rhs = ev.mul_integer(&x, 3).unwrap();
    let sum = ev.add(&lhs, &rhs).unwrap();
    assert_eq!(ev.decrypt_integers(&sum).unwrap()[0], 9376);
}

fn taylor_sine<B: HomomorphicBackend>(make: fn(u64, usize) -> B) {
    let mut backend = make(BIG_T, 4);
    backend.generate_relinearization_key().unwrap();
    let mut ev = ScaledEvaluator::new(backend);

    let plan = TaylorPlan::sine(5, 50).unwrap();
    plan.validate(ev.modulus(), 4, 0.5236).unwrap();
    let x = ev.encrypt(&[0.5236, 0.1, -0.3], plan.input_scale()).unwrap();
    let result = plan.evaluate(&ev, &x).unwrap();

    let integers = ev.decrypt_integers(&result.sum).unwrap();
    assert_eq!(integers[0], 18_633_081_376);
    assert_eq!(integers[1], plan.evaluate_integer(5).unwrap());
    assert_eq!(integers[2], plan.evaluate_integer(-15).unwrap());
    assert_eq!(integers[3], 0);

    let decoded = ev.decrypt(&result.sum).unwrap();
    // The input itself is quantized to a multiple of 1/50.
    assert_abs_diff_eq!(decoded[0], (26.0f64 / 50.0).sin(), epsilon = 1e-3);
    assert_abs_diff_eq!(decoded[0], 0.5236f64.sin(), epsilon = 1e-3 + 0.5 / 50.0);
    assert_abs_diff_eq!(decoded[2], (-0.3f64).sin(), epsilon = 1e-3);
}

/// Every 10° step from -180° to 180°, spread over as many ciphertexts as the
/// ring needs.
fn taylor_sweep_to_pi<B: HomomorphicBackend>(make: fn(u64, usize) -> B) {
    let mut backend = make(BIG_T, 4);
    backend.generate_relinearization_key().unwrap();
    let mut ev = ScaledEvaluator::new(backend);

    let plan = TaylorPlan::sine(5, 50).unwrap();
    plan.validate(ev.modulus(), 4, PI).unwrap();

    let angles: Vec<f64> = (-18..=18).map(|step| (step as f64 * 10.0).to_radians()).collect();
    assert_eq!(angles.len(), 37);
    let slots = ev.backend().slot_count();
    let mut decoded = Vec::with_capacity(angles.len());
    for chunk in angles.chunks(slots) {
        let x = ev.encrypt(chunk, plan.input_scale()).unwrap();
        let result = plan.evaluate(&ev, &x).unwrap();
        let integers = ev.decrypt_integers(&result.sum).unwrap();
        for (slot, &angle) in chunk.iter().enumerate() {
            let quantized = encode(angle, plan.input_scale(), ev.modulus()).unwrap();
            assert_eq!(
                integers[slot],
                plan.evaluate_integer(quantized).unwrap(),
                "angle {angle}"
            );
            decoded.push(plan.decode(integers[slot]).unwrap());
        }
    }

    // The series is accurate near zero and drifts to about 0.52 at ±π.
    assert_abs_diff_eq!(decoded[18], 0.0);
    assert_abs_diff_eq!(decoded[27], 1.0, epsilon = 1e-2);
    assert_abs_diff_eq!(decoded[36], 0.5238, epsilon = 1e-3);
    assert_abs_diff_eq!(decoded[0], -decoded[36]);
}

const SIGNAL: [i64; 8] = [0, 5, 2, 4, 0, 0, 0, 0];
const KERNEL: [i64; 3] = [5, 2, 4];

fn convolution_matches_plain_loop<B: HomomorphicBackend>(make: fn(u64, usize) -> B) {
    let expected = [
        (ShiftDirection::Convolution, [0, 25, 20, 44, 16, 16, 0, 0]),
        (ShiftDirection::Correlation, [0, 29, 18, 20, 0, 0, 0, 0]),
    ];
    for (direction, values) in expected {
        let conv = ShiftedConvolution::new(KERNEL.to_vec(), 8, direction).unwrap();
        let mut backend = make(SMALL_T, 2);
        backend.generate_rotation_keys(&conv.rotation_offsets()).unwrap();
        let mut ev = ScaledEvaluator::new(backend);

        let signal: Vec<i128> = SIGNAL.iter().map(|&v| v.into()).collect();
        let x = ev.encrypt_integers(&signal, Scale::ONE).unwrap();
        let out = ev.decrypt_integers(&conv.evaluate(&ev, &x).unwrap()).unwrap();
        assert_eq!(out[..8], conv.plain_reference(&SIGNAL)[..]);
        assert_eq!(out[..8], values);
    }
}

fn unmasked_rotation_wraps<B: HomomorphicBackend>(make: fn(u64, usize) -> B) {
    let signal = [3i64, 5, 2, 4, 0, 0, 0, 7];
    let conv = ShiftedConvolution::new(KERNEL.to_vec(), 8, ShiftDirection::Convolution).unwrap();
    let mut backend = make(SMALL_T, 2);
    backend.generate_rotation_keys(&conv.rotation_offsets()).unwrap();
    let mut ev = ScaledEvaluator::new(backend);

    let values: Vec<i128> = signal.iter().map(|&v| v.into()).collect();
    let x = ev.encrypt_integers(&values, Scale::ONE).unwrap();

    let mut unmasked = ev.mul_integer(&x, KERNEL[0].into()).unwrap();
    for (tap, &weight) in KERNEL.iter().enumerate().skip(1) {
        let shifted = ev.rotate(&x, -(tap as i64)).unwrap();
        unmasked = ev
            .add(&unmasked, &ev.mul_integer(&shifted, weight.into()).unwrap())
            .unwrap();
    }
    let unmasked = ev.decrypt_integers(&unmasked).unwrap();
    let masked = ev.decrypt_integers(&conv.evaluate(&ev, &x).unwrap()).unwrap();

    assert_eq!(masked[..8], conv.plain_reference(&signal)[..]);
    // Slot 0 picks up x[7] and x[6] from the far end of the row.
    assert_eq!(unmasked[0], 5 * 3 + 2 * 7);
    assert_ne!(unmasked[..8], masked[..8]);
}

fn polynomial_product<B: HomomorphicBackend>(make: fn(u64, usize) -> B) {
    let plan = PolynomialProduct::new(2, 2).unwrap();
    let mut backend = make(SMALL_T, 2);
    backend.generate_relinearization_key().unwrap();
    backend.generate_rotation_keys(&plan.rotation_offsets()).unwrap();
    let mut ev = ScaledEvaluator::new(backend);

    let a = ev.encrypt_integers(&[3, 2], Scale::ONE).unwrap();
    let b = ev.encrypt_integers(&[5, 6], Scale::ONE).unwrap();
    let coefficients: Vec<i128> = plan
        .evaluate(&ev, &a, &b)
        .unwrap()
        .iter()
        .map(|ct| ev.decrypt_integers(ct).unwrap()[0])
        .collect();
    assert_eq!(coefficients, vec![15, 28, 12]);
    assert_eq!(coefficients, PolynomialProduct::plain_reference(&[3, 2], &[5, 6]));
}

fn sin_cos_recurrence<B: HomomorphicBackend>(make: fn(u64, usize) -> B) {
    let mut ev = ScaledEvaluator::new(make(BIG_T, 3));
    let rec = SinCosRecurrence::new(0.1, 100, ev.modulus()).unwrap();
    let state = rec.initial(&mut ev, 0.5).unwrap();
    let sin0 = ev.decrypt_integers(&state.sin).unwrap()[0];
    let cos0 = ev.decrypt_integers(&state.cos).unwrap()[0];

    let out = rec.run(&ev, state, 3).unwrap();
    let (sin_ref, cos_ref) = rec.integer_reference(sin0, cos0, 3).unwrap();
    assert_eq!(ev.decrypt_integers(&out.sin).unwrap()[0], sin_ref);
    assert_eq!(ev.decrypt_integers(&out.cos).unwrap()[0], cos_ref);

    let (sin_plain, cos_plain) = rec.plain_reference(0.5, 3);
    assert_abs_diff_eq!(ev.decrypt(&out.sin).unwrap()[0], sin_plain, epsilon = 1e-2);
    assert_abs_diff_eq!(ev.decrypt(&out.cos).unwrap()[0], cos_plain, epsilon = 1e-2);
}

fn shallow_backends_are_rejected<B: HomomorphicBackend>(make: fn(u64, usize) -> B) {
    let mut backend = make(BIG_T, 3);
    backend.generate_relinearization_key().unwrap();
    let mut ev = ScaledEvaluator::new(backend);
    let plan = TaylorPlan::sine(5, 50).unwrap();
    let x = ev.encrypt(&[0.25], plan.input_scale()).unwrap();
    assert_eq!(
        plan.evaluate(&ev, &x).unwrap_err(),
        Error::Configuration(ConfigurationError::InsufficientDepth {
            required: 4,
            available: 3
        })
    );
}

#[test]
fn small_modulus_is_caught_before_evaluation() {
    let plan = TaylorPlan::sine(5, 50).unwrap();
    let modulus = PlaintextModulus::new(SMALL_T).unwrap();
    assert!(matches!(
        plan.validate(modulus, 4, 0.5236),
        Err(Error::Configuration(ConfigurationError::ModulusTooSmall { .. }))
    ));

    let mut backend = simulator(SMALL_T, 4);
    backend.generate_relinearization_key().unwrap();
    let mut ev = ScaledEvaluator::new(backend);
    let x = ev.encrypt(&[0.5236], plan.input_scale()).unwrap();
    assert!(matches!(
        plan.evaluate(&ev, &x),
        Err(Error::Configuration(ConfigurationError::ModulusTooSmall { .. }))
    ));
}
