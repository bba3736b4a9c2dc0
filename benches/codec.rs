use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use toy_bgv_fixed::{
    codec::{PlaintextModulus, Scale, decode, encode, to_modular},
    math::{is_prime, ntt_prime_chain},
};

const BIG_T: u64 = 1_099_512_004_609;

fn bench_fixed_point(c: &mut Criterion) {
    let modulus = PlaintextModulus::new(BIG_T).unwrap();
    let values: Vec<f64> = (0..4096).map(|i| (i as f64 - 2048.0) * 0.013).collect();
    let mut group = c.benchmark_group("fixed_point");

    for scale in [50u128, 1 << 20] {
        let scale = Scale::integer(scale).unwrap();
        group.bench_with_input(BenchmarkId::new("encode", scale), &scale, |b, &scale| {
            b.iter(|| {
                for &x in &values {
                    black_box(encode(black_box(x), scale, modulus).unwrap());
                }
            });
        });

        let residues: Vec<u64> = values
            .iter()
            .map(|&x| modulus.to_modular(encode(x, scale, modulus).unwrap()))
            .collect();
        group.bench_with_input(BenchmarkId::new("decode", scale), &scale, |b, &scale| {
            b.iter(|| {
                for &r in &residues {
                    black_box(decode(black_box(r), modulus, scale));
                }
            });
        });
    }

    group.finish();
}

fn bench_to_modular(c: &mut Criterion) {
    let inputs: Vec<i128> = (-2048..2048).map(|i| i * 1_000_003).collect();
    c.bench_function("to_modular_4096", |b| {
        b.iter(|| {
            for &v in &inputs {
                black_box(to_modular(black_box(v), BIG_T));
            }
        });
    });
}

fn bench_primes(c: &mut Criterion) {
    let mut group = c.benchmark_group("primes");
    group.bench_function("is_prime_big_t", |b| b.iter(|| black_box(is_prime(black_box(BIG_T)))));
    for degree in [1024u64, 8192] {
        group.bench_with_input(BenchmarkId::new("chain_4x60", degree), &degree, |b, &degree| {
            b.iter(|| black_box(ntt_prime_chain(4, 60, degree, &[BIG_T])));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_fixed_point, bench_to_modular, bench_primes);
criterion_main!(benches);
