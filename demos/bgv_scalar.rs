//! Scalar arithmetic with negative constants on real BGV ciphertexts.
//!
//! Run with `RUST_LOG=debug` to see per-phase timings as they happen.

use toy_bgv_fixed::{
    backend::HomomorphicBackend,
    bgv::{BgvBackend, BgvParams},
    circuit::ScaledEvaluator,
    codec::Scale,
    timing::TimingReport,
};
use tracing_subscriber::EnvFilter;

const RING_DEGREE: usize = 1024;
const PLAINTEXT_MODULUS: u64 = 65537;
const DEPTH: usize = 1;
const SEED: u64 = 42;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("🔐 BGV scalar demo");
    let mut timings = TimingReport::new();

    let params = BgvParams::builder()
        .ring_degree(RING_DEGREE)
        .plaintext_modulus(PLAINTEXT_MODULUS)
        .depth(DEPTH)
        .seed(SEED)
        .build()?;
    let backend = timings.time("context + keygen", || BgvBackend::create(params))?;
    println!(
        "   N = {}, t = {}, log2 Q = {:.1}",
        backend.slot_count(),
        backend.plaintext_modulus(),
        backend.context().modulus_bits()
    );
    let mut ev = ScaledEvaluator::new(backend);

    // Integers first: constants go in as centered values, never as raw residues.
    let x = -2344i128;
    let ct = timings.time("encrypt", || ev.encrypt_integers(&[x], Scale::ONE))?;
    let result = {
        let _eval = timings.scoped("evaluate");
        let lhs = ev.mul_integer(&ct, -7)?;
        let rhs = ev.mul_integer(&ct, 3)?;
        ev.add(&lhs, &rhs)?
    };
    let decrypted = timings.time("decrypt", || ev.decrypt_integers(&result))?;
    println!("\n🔢 (-7 * x) + (3 * x) with x = {x}");
    println!("   decrypted: {}", decrypted[0]);
    println!("   expected:  {}", -4 * x);

    // Fixed point: 1.25 at scale 100 times -0.5 at scale 10.
    let value = ev.encrypt(&[1.25, -3.5], Scale::integer(100)?)?;
    let scaled = ev.mul_constant(&value, -0.5, Scale::integer(10)?)?;
    let decoded = ev.decrypt(&scaled)?;
    println!("\n📊 fixed point at scale {}", scaled.scale());
    println!("   decoded:  {:?}", &decoded[..2]);
    println!("   expected: {:?}", [1.25 * -0.5, -3.5 * -0.5]);
    println!(
        "   noise:    {} of {:.0} bits",
        ev.backend().noise_bits(scaled.ciphertext())?,
        ev.backend().context().noise_budget_bits()
    );

    println!("\n⏱️  timings\n{timings}");
    Ok(())
}
