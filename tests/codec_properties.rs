use proptest::prelude::*;
use toy_bgv_fixed::codec::{
    CodecError, ModularResidue, PlaintextModulus, Scale, ScaledInteger, center, decode, encode,
    to_modular,
};

const T: u64 = 65537;

fn modulus_strategy() -> impl Strategy<Value = PlaintextModulus> {
    (1u64..(1 << 40)).prop_map(|v| PlaintextModulus::new(2 * v + 1).unwrap())
}

proptest! {
    #[test]
    fn to_modular_lands_in_range_and_is_idempotent(
        value in any::<i64>(),
        modulus in modulus_strategy(),
    ) {
        let m = modulus.value();
        let reduced = to_modular(value as i128, m);
        prop_assert!(reduced < m);
        prop_assert_eq!(to_modular(reduced as i128, m), reduced);
        prop_assert_eq!((reduced as i128 - value as i128).rem_euclid(m as i128), 0);
    }

    #[test]
    fn negative_constants_map_to_m_plus_v(v in 1i128..(T as i128)) {
        prop_assert_eq!(to_modular(-v, T) as i128, T as i128 - v);
    }

    #[test]
    fn center_inverts_to_modular_on_the_centered_range(
        modulus in modulus_strategy(),
        fraction in -1.0f64..=1.0,
    ) {
        let half = modulus.half() as i128;
        let value = (fraction * half as f64) as i128;
        let residue = to_modular(value, modulus.value());
        prop_assert_eq!(center(residue as i128, modulus.value()), value);
        prop_assert_eq!(center(value, modulus.value()), value);
    }

    #[test]
    fn encode_decode_error_is_half_a_step(
        x in -100.0f64..100.0,
        scale in 1u128..10_000,
    ) {
        let modulus = PlaintextModulus::new(T * 65539 * 3 + 2).unwrap();
        let scale = Scale::integer(scale).unwrap();
        let value = encode(x, scale, modulus).unwrap();
        let decoded = decode(modulus.to_modular(value), modulus, scale);
        prop_assert!((decoded - x).abs() <= 0.5 / scale.as_f64() + 1e-12);
    }

    #[test]
    fn encode_never_wraps(x in -1.0e6f64..1.0e6) {
        let modulus = PlaintextModulus::new(T).unwrap();
        let scale = Scale::integer(100).unwrap();
        match encode(x, scale, modulus) {
            Ok(value) => prop_assert!(value.unsigned_abs() <= modulus.half() as u128),
            Err(CodecError::Range { value, .. }) => {
                prop_assert!(value.unsigned_abs() > modulus.half() as u128)
            }
            Err(other) => prop_assert!(false, "unexpected error {other}"),
        }
    }

    #[test]
    fn scaled_products_track_scales(
        a in -1000i128..1000,
        b in -1000i128..1000,
        s in 1u128..1000,
        k in 1u32..4,
    ) {
        let scale = Scale::integer(s).unwrap();
        let x = ScaledInteger::new(a, scale);
        let y = ScaledInteger::new(b, scale.pow(k).unwrap());
        let product = x.checked_mul(&y).unwrap();
        prop_assert_eq!(product.value(), a * b);
        prop_assert_eq!(product.scale(), scale.pow(k + 1).unwrap());

        let raised = x.rescale_to(product.scale()).unwrap();
        prop_assert_eq!(raised.value(), a * (s.pow(k) as i128));
        prop_assert!(raised.checked_add(&product).is_ok());
    }

    #[test]
    fn residues_roundtrip_through_scaled_integers(
        value in -30_000i128..30_000,
        s in 1u128..64,
    ) {
        let modulus = PlaintextModulus::new(T).unwrap();
        let scaled = ScaledInteger::new(value, Scale::integer(s).unwrap());
        let residue = scaled.to_residue(modulus).unwrap();
        prop_assert_eq!(residue.centered(), value);
        prop_assert_eq!(residue.to_scaled_integer(), scaled);
        let again = ModularResidue::new(residue.residue(), modulus, residue.scale()).unwrap();
        prop_assert_eq!(again.decode(), scaled.to_f64());
    }
}

#[test]
fn mismatched_scales_are_rejected() {
    let a = ScaledInteger::new(5, Scale::integer(10).unwrap());
    let b = ScaledInteger::new(5, Scale::integer(100).unwrap());
    assert!(matches!(a.checked_add(&b), Err(CodecError::ScaleMismatch { .. })));
    assert!(matches!(
        b.rescale_to(Scale::integer(10).unwrap()),
        Err(CodecError::IncompatibleScale { .. })
    ));
}

#[test]
fn non_finite_inputs_are_rejected() {
    let modulus = PlaintextModulus::new(T).unwrap();
    assert!(matches!(
        encode(f64::NAN, Scale::ONE, modulus),
        Err(CodecError::NonFiniteInput(_))
    ));
}
