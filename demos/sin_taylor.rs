//! Fifth-order Taylor approximation of `sin` evaluated under BGV.
//!
//! Every angle from -180° to 180° in 10° steps goes into its own slot.
//! Inputs are encoded at scale 50, so the result lands at scale
//! `5! * 50^5`. At `|x| = π` the largest power is `157^5`, which is what
//! the 41-bit plaintext modulus has to hold.

use std::f64::consts::PI;
use toy_bgv_fixed::{
    backend::HomomorphicBackend,
    bgv::{BgvBackend, BgvParams},
    circuit::{ScaledEvaluator, TaylorPlan},
    codec::to_modular,
    timing::TimingReport,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const RING_DEGREE: usize = 1024;
const PLAINTEXT_MODULUS: u64 = 1_099_512_004_609;
const ORDER: u32 = 5;
const INPUT_SCALE: u128 = 50;
const SEED: u64 = 2024;
const STEP_DEGREES: i32 = 10;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("🔐 sin(x) by Taylor series under BGV, -180° to 180°");
    let plan = TaylorPlan::sine(ORDER, INPUT_SCALE)?;
    let mut timings = TimingReport::new();

    let degrees: Vec<i32> = (-180..=180).step_by(STEP_DEGREES as usize).collect();
    let angles: Vec<f64> = degrees.iter().map(|&d| (d as f64).to_radians()).collect();

    let params = BgvParams::builder()
        .ring_degree(RING_DEGREE)
        .plaintext_modulus(PLAINTEXT_MODULUS)
        .depth(plan.required_depth())
        .seed(SEED)
        .build()?;

    plan.validate(params.plaintext_modulus(), params.depth(), PI)?;
    info!(
        depth = plan.required_depth(),
        scale = %plan.combined_scale()?,
        "plan fits |x| <= pi"
    );

    let mut backend = timings.time("context + keygen", || BgvBackend::create(params))?;
    timings.time("relinearization key", || backend.generate_relinearization_key())?;
    let mut ev = ScaledEvaluator::new(backend);

    let x = timings.time("encrypt", || ev.encrypt(&angles, plan.input_scale()))?;
    let result = timings.time("evaluate", || plan.evaluate(&ev, &x))?;
    let integers = timings.time("decrypt", || ev.decrypt_integers(&result.sum))?;
    let terms = result
        .terms
        .iter()
        .map(|term| ev.decrypt_integers(term))
        .collect::<toy_bgv_fixed::Result<Vec<_>>>()?;

    println!("\n🔢 coefficients at scale {}", plan.combined_scale()?);
    for (term, coefficient) in plan.terms().iter().zip(plan.integer_coefficients()?) {
        println!("   x^{}: {:>14}  ({:+.6})", term.degree, coefficient, term.coefficient);
    }

    let t = PLAINTEXT_MODULUS;
    let mut worst = 0.0f64;
    println!(
        "\n📊 {:>5}  {:>15}  {:>15}  {:>15}  {:>10}  {:>10}  {:>9}",
        "deg", "x^1 term", "x^3 term", "x^5 term", "decoded", "sin(x)", "error"
    );
    for (i, (&deg, &angle)) in degrees.iter().zip(&angles).enumerate() {
        let decoded = plan.decode(integers[i])?;
        let error = (decoded - angle.sin()).abs();
        worst = worst.max(error);
        let term_columns: Vec<String> = terms.iter().map(|term| format!("{:>15}", term[i])).collect();
        println!(
            "   {deg:>5}  {}  {decoded:>10.6}  {:>10.6}  {error:>9.2e}",
            term_columns.join("  "),
            angle.sin()
        );
        if deg == 180 {
            let raw: Vec<u64> = terms.iter().map(|term| to_modular(term[i], t)).collect();
            println!("          raw residues at 180°: {raw:?}");
        }
    }
    println!("\n   worst error: {worst:.4}");

    let reference_matches = angles.iter().enumerate().try_fold(true, |ok, (i, &angle)| {
        let quantized = (angle * INPUT_SCALE as f64).round() as i128;
        Ok::<_, toy_bgv_fixed::Error>(ok && plan.evaluate_integer(quantized)? == integers[i])
    })?;
    println!("   matches integer reference: {reference_matches}");
    println!(
        "   noise: {} of {:.0} bits",
        ev.backend().noise_bits(result.sum.ciphertext())?,
        ev.backend().context().noise_budget_bits()
    );

    println!("\n⏱️  timings\n{timings}");
    Ok(())
}
