//! The Taylor circuit on the cleartext slot simulator.
//!
//! Sweeps input scales to show where the modulus stops fitting, then runs
//! the circuit for every scale that passed validation.

use toy_bgv_fixed::{
    backend::{HomomorphicBackend, SlotSimulator},
    circuit::{ScaledEvaluator, TaylorPlan},
    codec::PlaintextModulus,
    timing::TimingReport,
};
use tracing_subscriber::EnvFilter;

const SLOT_COUNT: usize = 64;
const PLAINTEXT_MODULUS: u64 = 1_099_512_004_609;
const ORDER: u32 = 5;
const INPUT_SCALES: [u128; 5] = [10, 50, 100, 200, 400];
const INPUT: f64 = 0.5236;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("🧮 sin(x) Taylor circuit, cleartext simulator");
    let modulus = PlaintextModulus::new(PLAINTEXT_MODULUS)?;
    let mut timings = TimingReport::new();

    for input_scale in INPUT_SCALES {
        let plan = TaylorPlan::sine(ORDER, input_scale)?;
        println!("\n📐 input scale {input_scale}, combined scale {}", plan.combined_scale()?);
        if let Err(err) = plan.validate(modulus, plan.required_depth(), INPUT) {
            println!("   rejected: {err}");
            continue;
        }

        let mut backend = SlotSimulator::new(modulus, SLOT_COUNT, plan.required_depth())?;
        backend.generate_relinearization_key()?;
        let mut ev = ScaledEvaluator::new(backend);

        let x = ev.encrypt(&[INPUT], plan.input_scale())?;
        let result = timings.time(format!("evaluate s={input_scale}"), || plan.evaluate(&ev, &x))?;
        let integer = ev.decrypt_integers(&result.sum)?[0];

        let quantized = (INPUT * input_scale as f64).round() as i128;
        let reference = plan.evaluate_integer(quantized)?;
        let decoded = plan.decode(integer)?;
        println!("   integer:   {integer} (reference {reference})");
        println!("   decoded:   {decoded:.8}");
        println!("   series:    {:.8}", plan.evaluate_real(INPUT));
        println!("   sin(x):    {:.8}", INPUT.sin());
        println!("   error:     {:.2e}", (decoded - INPUT.sin()).abs());
    }

    println!("\n⏱️  timings\n{timings}");
    Ok(())
}
