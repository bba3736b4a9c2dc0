//! Masked slot-wise convolution and correlation with rotations under BGV.

use toy_bgv_fixed::{
    backend::HomomorphicBackend,
    bgv::{BgvBackend, BgvParams},
    circuit::{ScaledEvaluator, ShiftDirection, ShiftedConvolution},
    codec::Scale,
    timing::TimingReport,
};
use tracing_subscriber::EnvFilter;

const RING_DEGREE: usize = 1024;
const PLAINTEXT_MODULUS: u64 = 65537;
const WIDTH: usize = 8;
const SEED: u64 = 5;

const SIGNAL: [i64; WIDTH] = [0, 5, 2, 4, 0, 0, 0, 0];
const KERNEL: [i64; 3] = [5, 2, 4];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("🔐 Slot-wise convolution under BGV");
    println!("   signal: {SIGNAL:?}\n   kernel: {KERNEL:?}");
    let mut timings = TimingReport::new();

    let plans = [ShiftDirection::Convolution, ShiftDirection::Correlation]
        .into_iter()
        .map(|direction| ShiftedConvolution::new(KERNEL.to_vec(), WIDTH, direction))
        .collect::<toy_bgv_fixed::Result<Vec<_>>>()?;
    let offsets: Vec<i64> = plans.iter().flat_map(|plan| plan.rotation_offsets()).collect();

    let params = BgvParams::builder()
        .ring_degree(RING_DEGREE)
        .plaintext_modulus(PLAINTEXT_MODULUS)
        .depth(2)
        .seed(SEED)
        .build()?;
    let mut backend = timings.time("context + keygen", || BgvBackend::create(params))?;
    timings.time("rotation keys", || backend.generate_rotation_keys(&offsets))?;
    println!("   rotation keys: {} for offsets {offsets:?}", backend.rotation_keys().len());
    let mut ev = ScaledEvaluator::new(backend);

    let values: Vec<i128> = SIGNAL.iter().map(|&v| v.into()).collect();
    let x = timings.time("encrypt", || ev.encrypt_integers(&values, Scale::ONE))?;

    for plan in &plans {
        let label = format!("{:?}", plan.direction()).to_lowercase();
        let out = timings.time(label.clone(), || plan.evaluate(&ev, &x))?;
        let decrypted = ev.decrypt_integers(&out)?;
        let expected = plan.plain_reference(&SIGNAL);
        println!("\n🔢 {label}");
        println!("   decrypted: {:?}", &decrypted[..WIDTH]);
        println!("   expected:  {expected:?}");
        println!("   match:     {}", decrypted[..WIDTH] == expected[..]);
        for tap in 0..KERNEL.len() {
            println!("   mask {tap}:    {:?}", plan.mask(tap));
        }
    }

    println!("\n⏱️  timings\n{timings}");
    Ok(())
}
