//! Multiplies two encrypted polynomials packed one coefficient per slot.

use toy_bgv_fixed::{
    backend::HomomorphicBackend,
    bgv::{BgvBackend, BgvParams},
    circuit::{PolynomialProduct, ScaledEvaluator},
    codec::Scale,
    timing::TimingReport,
};
use tracing_subscriber::EnvFilter;

const RING_DEGREE: usize = 1024;
const PLAINTEXT_MODULUS: u64 = 65537;
const SEED: u64 = 7;

const LHS: [i64; 4] = [3, -2, 0, 7];
const RHS: [i64; 3] = [5, 6, -1];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("🔐 Packed polynomial multiplication");
    let plan = PolynomialProduct::new(LHS.len(), RHS.len())?;
    let mut timings = TimingReport::new();

    let params = BgvParams::builder()
        .ring_degree(RING_DEGREE)
        .plaintext_modulus(PLAINTEXT_MODULUS)
        .depth(plan.required_depth())
        .seed(SEED)
        .build()?;
    let mut backend = timings.time("context + keygen", || BgvBackend::create(params))?;
    timings.time("relinearization key", || backend.generate_relinearization_key())?;
    timings.time("rotation keys", || {
        backend.generate_rotation_keys(&plan.rotation_offsets())
    })?;
    let mut ev = ScaledEvaluator::new(backend);

    println!("\n📊 a(x) = {LHS:?}\n   b(x) = {RHS:?}");
    let (a, b) = timings.time("encrypt", || {
        let widen = |p: &[i64]| p.iter().map(|&c| c.into()).collect::<Vec<i128>>();
        Ok::<_, toy_bgv_fixed::Error>((
            ev.encrypt_integers(&widen(&LHS), Scale::ONE)?,
            ev.encrypt_integers(&widen(&RHS), Scale::ONE)?,
        ))
    })?;

    let product = timings.time("evaluate", || plan.evaluate(&ev, &a, &b))?;
    let coefficients = timings.time("decrypt", || {
        product
            .iter()
            .map(|ct| Ok(ev.decrypt_integers(ct)?[0]))
            .collect::<toy_bgv_fixed::Result<Vec<i128>>>()
    })?;

    let expected = PolynomialProduct::plain_reference(&LHS, &RHS);
    println!("\n🔢 a(x) * b(x)");
    println!("   decrypted: {coefficients:?}");
    println!("   expected:  {expected:?}");
    println!("   match:     {}", coefficients == expected);

    println!("\n⏱️  timings\n{timings}");
    Ok(())
}
