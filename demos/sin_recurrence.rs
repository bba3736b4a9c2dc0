//! Walks `(sin θ, cos θ)` forward by a fixed angle under BGV.

use toy_bgv_fixed::{
    bgv::{BgvBackend, BgvParams},
    circuit::{ScaledEvaluator, SinCosRecurrence},
    timing::TimingReport,
};
use tracing_subscriber::EnvFilter;

const RING_DEGREE: usize = 1024;
const PLAINTEXT_MODULUS: u64 = 1_099_512_004_609;
const STEP_SCALE: u128 = 100;
const STEP: f64 = 0.05;
const THETA: f64 = 0.3;
const STEPS: usize = 4;
const SEED: u64 = 99;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("🔐 sin/cos recurrence under BGV");
    let mut timings = TimingReport::new();

    let params = BgvParams::builder()
        .ring_degree(RING_DEGREE)
        .plaintext_modulus(PLAINTEXT_MODULUS)
        .depth(STEPS)
        .seed(SEED)
        .build()?;
    let rec = SinCosRecurrence::new(STEP, STEP_SCALE, params.plaintext_modulus())?;
    rec.validate(params.plaintext_modulus(), STEPS, STEPS)?;
    println!(
        "   step d = {STEP} encoded as {} at scale {}",
        rec.step_integer(),
        rec.scale()
    );

    let backend = timings.time("context + keygen", || BgvBackend::create(params))?;
    let mut ev = ScaledEvaluator::new(backend);

    let mut state = timings.time("encrypt", || rec.initial(&mut ev, THETA))?;
    println!("\n📊 {:>4}  {:>10}  {:>10}  {:>10}  {:>10}  {:>14}", "step", "sin", "plain", "cos", "plain", "scale");
    for step in 0..=STEPS {
        if step > 0 {
            state = timings.time(format!("step {step}"), || rec.advance(&ev, &state))?;
        }
        let sin = ev.decrypt(&state.sin)?[0];
        let cos = ev.decrypt(&state.cos)?[0];
        let (sin_plain, cos_plain) = rec.plain_reference(THETA, step);
        println!(
            "   {step:>4}  {sin:>10.6}  {sin_plain:>10.6}  {cos:>10.6}  {cos_plain:>10.6}  {:>14}",
            state.sin.scale()
        );
    }
    println!(
        "\n   exact angle {:.4}: sin {:.6}, cos {:.6}",
        THETA + STEP * STEPS as f64,
        (THETA + STEP * STEPS as f64).sin(),
        (THETA + STEP * STEPS as f64).cos()
    );
    println!(
        "   noise: {} of {:.0} bits",
        ev.backend().noise_bits(state.sin.ciphertext())?,
        ev.backend().context().noise_budget_bits()
    );

    println!("\n⏱️  timings\n{timings}");
    Ok(())
}
