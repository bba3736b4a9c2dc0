pub mod modular;
pub mod primes;
pub mod sampling;

pub use modular::{add_mod, centered, mod_inverse, mod_pow, mul_mod, neg_mod, reduce_signed, sub_mod};
pub use primes::{
    is_ntt_friendly_prime, is_prime, ntt_prime_chain, primitive_power_of_two_root,
};
pub use sampling::{gaussian_coefficients, ternary_coefficients, uniform_coefficients, uniform_ternary_coefficients};
