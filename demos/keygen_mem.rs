#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use toy_bgv_fixed::{
    backend::HomomorphicBackend,
    bgv::{BgvBackend, BgvParams, SecurityLevel},
    timing::TimingReport,
};
use tracing_subscriber::EnvFilter;

const RING_DEGREE: usize = 8192 * 2;
const PLAINTEXT_MODULUS: u64 = 65537;
const DEPTH: usize = 1;
const ROTATIONS: [i64; 4] = [1, 2, -1, -2];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(feature = "dhat-heap")]
    let _dhat = dhat::Profiler::new_heap();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("Beginning memory profiling for key generation");
    let mut timings = TimingReport::new();

    let params = BgvParams::builder()
        .ring_degree(RING_DEGREE)
        .plaintext_modulus(PLAINTEXT_MODULUS)
        .depth(DEPTH)
        .security(SecurityLevel::Classic128)
        .seed(123)
        .build()?;

    println!("Generating context and key pair...");
    let mut backend = timings.time("context + keygen", || BgvBackend::create(params))?;
    println!(
        "   {} primes, log2 Q = {:.1}",
        backend.context().basis().channel_count(),
        backend.context().modulus_bits()
    );

    println!("Generating relinearization key...");
    timings.time("relinearization key", || backend.generate_relinearization_key())?;

    println!("Generating {} rotation keys...", ROTATIONS.len());
    timings.time("rotation keys", || backend.generate_rotation_keys(&ROTATIONS))?;

    println!("Encrypting a full batch...");
    let values: Vec<u64> = (0..backend.slot_count() as u64).collect();
    let ct = timings.time("encrypt", || backend.encrypt_values(&values))?;
    let decrypted = timings.time("decrypt", || backend.decrypt_values(&ct))?;
    println!("   roundtrip ok: {}", decrypted == values);

    println!("\n{timings}");
    println!("Memory profiling completed");
    Ok(())
}
